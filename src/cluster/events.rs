//! Cluster membership events, observable through the same
//! [`crate::monitoring::Monitor`] system used for supervision and actor
//! lifecycle events.

// Layer 1: Standard library
use std::collections::HashMap;
use std::net::SocketAddr;

// Layer 2: Third-party
use chrono::{DateTime, Utc};
use serde::Serialize;

// Layer 3: Internal
use crate::monitoring::{EventSeverity, MonitoringEvent};
use crate::util::NodeId;

/// A membership transition for one node.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterEvent {
    /// When the transition was observed.
    pub timestamp: DateTime<Utc>,
    /// The node the event concerns.
    pub node_id: NodeId,
    /// The node's address, when known (absent once a node is fully gone).
    pub address: Option<SocketAddr>,
    /// The node's incarnation at the time of the event.
    pub incarnation: u64,
    /// The specific transition.
    pub event_kind: ClusterEventKind,
    /// Additional metadata.
    pub metadata: HashMap<String, String>,
}

impl ClusterEvent {
    /// Build an event stamped with the current time.
    pub fn new(
        node_id: NodeId,
        address: Option<SocketAddr>,
        incarnation: u64,
        event_kind: ClusterEventKind,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id,
            address,
            incarnation,
            event_kind,
            metadata: HashMap::new(),
        }
    }
}

impl MonitoringEvent for ClusterEvent {
    const EVENT_TYPE: &'static str = "cluster";

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn severity(&self) -> EventSeverity {
        match self.event_kind {
            ClusterEventKind::NodeJoined | ClusterEventKind::NodeActive => EventSeverity::Info,
            ClusterEventKind::NodeRecovered => EventSeverity::Info,
            ClusterEventKind::NodeSuspected => EventSeverity::Warning,
            ClusterEventKind::NodeLeft => EventSeverity::Error,
        }
    }
}

/// The membership transitions the cluster event bus emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClusterEventKind {
    /// A node registered itself (or was registered via a seed/gossip
    /// introduction).
    NodeJoined,
    /// A node is heartbeating normally.
    NodeActive,
    /// A node's heartbeat has lagged past `failure_detection_threshold`.
    NodeSuspected,
    /// A `Suspected` node resumed heartbeating before being declared dead.
    NodeRecovered,
    /// A node's heartbeat lagged past `2 * failure_detection_threshold`;
    /// removed from the registry.
    NodeLeft,
}
