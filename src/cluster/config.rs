//! Cluster membership configuration.

// Layer 1: Standard library
use std::net::SocketAddr;
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default interval between outbound heartbeats.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Default staleness threshold before a node is marked `Suspected`.
pub const DEFAULT_FAILURE_DETECTION_THRESHOLD: Duration = Duration::from_millis(300);

/// Default gossip fan-out (peers contacted per tick).
pub const DEFAULT_GOSSIP_FANOUT: usize = 3;

/// How a node re-establishes contact with a peer it has lost heartbeats
/// from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconnectionStrategy {
    /// Retry immediately, every tick.
    Immediate,
    /// Back off geometrically between `initial` and `max`.
    ExponentialBackoff {
        /// First retry delay.
        initial: Duration,
        /// Ceiling on the retry delay.
        max: Duration,
    },
    /// Back off by a fixed `step` up to `max`.
    Linear {
        /// Amount added to the delay after each failed attempt.
        step: Duration,
        /// Ceiling on the retry delay.
        max: Duration,
    },
}

/// How membership information propagates between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MembershipProtocol {
    /// Each tick, exchange digests with `fanout` random peers.
    Gossip {
        /// Peers contacted per tick.
        fanout: usize,
    },
    /// Rely on a multicast transport to broadcast membership changes.
    Multicast,
    /// A fixed, externally supplied member list; no propagation.
    Static,
}

/// Configuration for a [`super::ClusterManager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// How often this node sends a heartbeat.
    #[serde(with = "crate::util::duration_serde")]
    pub heartbeat_interval: Duration,

    /// Staleness threshold for `Active -> Suspected` (and `2x` for
    /// `Suspected -> Dead`).
    #[serde(with = "crate::util::duration_serde")]
    pub failure_detection_threshold: Duration,

    /// Reconnection behavior toward a suspected peer.
    pub reconnection_strategy: ReconnectionStrategy,

    /// Membership propagation mechanism.
    pub membership_protocol: MembershipProtocol,

    /// Known-good addresses to join through at startup.
    pub seed_nodes: Vec<SocketAddr>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            failure_detection_threshold: DEFAULT_FAILURE_DETECTION_THRESHOLD,
            reconnection_strategy: ReconnectionStrategy::ExponentialBackoff {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(10),
            },
            membership_protocol: MembershipProtocol::Gossip {
                fanout: DEFAULT_GOSSIP_FANOUT,
            },
            seed_nodes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_heartbeat_interval_is_well_under_the_detection_threshold() {
        let config = ClusterConfig::default();
        assert!(config.heartbeat_interval < config.failure_detection_threshold);
    }
}
