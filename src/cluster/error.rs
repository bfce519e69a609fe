//! Cluster-level error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use crate::util::NodeId;

/// Errors raised by [`super::ClusterManager`] operations.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// A heartbeat or lookup referenced a node not in the registry.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    /// `join` was called for a node id already registered and not `Dead`.
    #[error("node already joined: {0}")]
    AlreadyJoined(NodeId),

    /// The cluster manager's background sweeper is not running.
    #[error("cluster manager has not been started")]
    NotStarted,

    /// The cluster manager's background sweeper is already running.
    #[error("cluster manager is already started")]
    AlreadyStarted,
}
