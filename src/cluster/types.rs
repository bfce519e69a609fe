//! Node identity and membership state.

// Layer 1: Standard library
use std::collections::HashMap;
use std::net::SocketAddr;

// Layer 2: Third-party
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal
use crate::util::NodeId;

/// A node's position in the membership state machine: `Joining → Active →
/// Suspected → Dead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Registered but not yet confirmed reachable.
    Joining,
    /// Heartbeating within `failure_detection_threshold`.
    Active,
    /// Heartbeat lagging beyond `failure_detection_threshold`.
    Suspected,
    /// Heartbeat lagging beyond `2 * failure_detection_threshold`; removed
    /// from the registry once reached.
    Dead,
}

impl NodeStatus {
    /// Gossip conflict resolution precedence: `Dead > Suspected > Active >
    /// Joining`, used when two incarnations tie.
    pub fn precedence(self) -> u8 {
        match self {
            NodeStatus::Joining => 0,
            NodeStatus::Active => 1,
            NodeStatus::Suspected => 2,
            NodeStatus::Dead => 3,
        }
    }
}

/// Everything the cluster knows about one member node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    /// The node's identity.
    pub id: NodeId,
    /// Network address peers should use to reach it.
    pub address: SocketAddr,
    /// Free-form tags (region, role, ...).
    pub metadata: HashMap<String, String>,
    /// Current membership state.
    pub status: NodeStatus,
    /// Last time a heartbeat was received from this node.
    pub last_heartbeat: DateTime<Utc>,
    /// Monotonically increasing generation number for this node's identity;
    /// bumped on rejoin, used to resolve gossip conflicts.
    pub incarnation: u64,
}

impl NodeInfo {
    /// Register a node joining with a fresh incarnation.
    pub fn joining(id: NodeId, address: SocketAddr) -> Self {
        Self {
            id,
            address,
            metadata: HashMap::new(),
            status: NodeStatus::Joining,
            last_heartbeat: Utc::now(),
            incarnation: 0,
        }
    }
}

/// A compact `(incarnation, status)` pair exchanged between gossiping peers.
pub type GossipDigest = HashMap<NodeId, (u64, NodeStatus)>;
