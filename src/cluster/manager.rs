//! Cluster membership tracking: heartbeats, failure detection, and gossip
//! conflict resolution.

// Layer 1: Standard library imports
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

// Layer 2: Third-party crate imports
use chrono::Utc;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::{oneshot, Mutex};
use tokio::time::interval;
use tracing::debug;

// Layer 3: Internal module imports
use super::config::ClusterConfig;
use super::error::ClusterError;
use super::events::{ClusterEvent, ClusterEventKind};
use super::types::{GossipDigest, NodeInfo, NodeStatus};
use crate::monitoring::Monitor;
use crate::util::NodeId;

/// Point-in-time counts of members by status: active, suspected, dead.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ClusterMetricsSnapshot {
    /// Members currently `Active`.
    pub active: usize,
    /// Members currently `Suspected`.
    pub suspected: usize,
    /// Members currently `Dead` (transient; removed from the registry
    /// immediately after the event fires, so normally zero at rest).
    pub dead: usize,
}

struct RunningSweeper {
    shutdown: oneshot::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

/// Tracks the membership state of every known peer node and drives the
/// failure-detection state machine.
///
/// Generic over a [`Monitor<ClusterEvent>`] the same way
/// `supervisor::SupervisorNode` is generic over `Monitor<SupervisionEvent>`,
/// so membership events flow into whatever monitor the rest of the system
/// already uses.
pub struct ClusterManager<M: Monitor<ClusterEvent>> {
    local_node: NodeId,
    config: ClusterConfig,
    nodes: Arc<DashMap<NodeId, NodeInfo>>,
    monitor: M,
    sweeper: Mutex<Option<RunningSweeper>>,
}

impl<M: Monitor<ClusterEvent> + 'static> ClusterManager<M> {
    /// Build a cluster manager for `local_node`.
    pub fn new(local_node: NodeId, config: ClusterConfig, monitor: M) -> Self {
        Self {
            local_node,
            config,
            nodes: Arc::new(DashMap::new()),
            monitor,
            sweeper: Mutex::new(None),
        }
    }

    /// Current membership snapshot, local node excluded.
    pub fn members(&self) -> Vec<NodeInfo> {
        self.nodes.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Look up one node's current state.
    pub fn node_info(&self, node: NodeId) -> Option<NodeInfo> {
        self.nodes.get(&node).map(|entry| entry.value().clone())
    }

    /// Counts of members by status.
    pub fn metrics(&self) -> ClusterMetricsSnapshot {
        let mut snapshot = ClusterMetricsSnapshot::default();
        for entry in self.nodes.iter() {
            match entry.value().status {
                NodeStatus::Active | NodeStatus::Joining => snapshot.active += 1,
                NodeStatus::Suspected => snapshot.suspected += 1,
                NodeStatus::Dead => snapshot.dead += 1,
            }
        }
        snapshot
    }

    /// Register a new peer as `Active` and emit `NodeJoined` + `NodeActive`.
    pub async fn join(&self, node: NodeId, address: SocketAddr) -> Result<(), ClusterError> {
        if let Some(existing) = self.nodes.get(&node) {
            if existing.status != NodeStatus::Dead {
                return Err(ClusterError::AlreadyJoined(node));
            }
        }

        let mut info = NodeInfo::joining(node, address);
        info.status = NodeStatus::Active;
        let incarnation = info.incarnation;
        self.nodes.insert(node, info);

        let _ = self
            .monitor
            .record(ClusterEvent::new(
                node,
                Some(address),
                incarnation,
                ClusterEventKind::NodeJoined,
            ))
            .await;
        let _ = self
            .monitor
            .record(ClusterEvent::new(
                node,
                Some(address),
                incarnation,
                ClusterEventKind::NodeActive,
            ))
            .await;
        Ok(())
    }

    /// Record a heartbeat from `node`. Returning it to `Active` from
    /// `Suspected` emits `NodeRecovered`.
    pub async fn heartbeat(&self, node: NodeId) -> Result<(), ClusterError> {
        let (address, incarnation, was_suspected) = {
            let mut entry = self.nodes.get_mut(&node).ok_or(ClusterError::UnknownNode(node))?;
            entry.last_heartbeat = Utc::now();
            let was_suspected = entry.status == NodeStatus::Suspected;
            if was_suspected {
                entry.status = NodeStatus::Active;
            }
            (entry.address, entry.incarnation, was_suspected)
        };

        if was_suspected {
            let _ = self
                .monitor
                .record(ClusterEvent::new(
                    node,
                    Some(address),
                    incarnation,
                    ClusterEventKind::NodeRecovered,
                ))
                .await;
        }
        Ok(())
    }

    /// Run one pass of the failure detector over every non-local node.
    ///
    /// Decisions are collected from a synchronous pass over the registry
    /// first, then applied and reported afterward — `DashMap`'s guards are
    /// ordinary (non-async) locks, so none may be held across an `.await`.
    pub async fn sweep(&self) {
        debug!(local_node = %self.local_node, "cluster sweep tick");
        let now = Utc::now();
        let threshold = chrono::Duration::from_std(self.config.failure_detection_threshold)
            .unwrap_or(chrono::Duration::zero());
        let double_threshold = threshold * 2;

        let mut newly_suspected = Vec::new();
        let mut newly_dead = Vec::new();

        for entry in self.nodes.iter() {
            if entry.id == self.local_node {
                continue;
            }
            let elapsed = now - entry.last_heartbeat;
            match entry.status {
                NodeStatus::Active if elapsed > threshold => {
                    newly_suspected.push((entry.id, entry.address, entry.incarnation));
                }
                NodeStatus::Suspected if elapsed > double_threshold => {
                    newly_dead.push((entry.id, entry.address, entry.incarnation));
                }
                _ => {}
            }
        }

        for (node, address, incarnation) in newly_suspected {
            debug!(%node, "node suspected after missed heartbeats");
            if let Some(mut entry) = self.nodes.get_mut(&node) {
                entry.status = NodeStatus::Suspected;
            }
            let _ = self
                .monitor
                .record(ClusterEvent::new(
                    node,
                    Some(address),
                    incarnation,
                    ClusterEventKind::NodeSuspected,
                ))
                .await;
        }

        for (node, address, incarnation) in newly_dead {
            debug!(%node, "node declared dead, removing from registry");
            self.nodes.remove(&node);
            let _ = self
                .monitor
                .record(ClusterEvent::new(
                    node,
                    Some(address),
                    incarnation,
                    ClusterEventKind::NodeLeft,
                ))
                .await;
        }
    }

    /// This node's current view of membership as a gossip digest of
    /// `(nodeId → lastKnownIncarnation, status)`.
    pub fn local_digest(&self) -> GossipDigest {
        self.nodes
            .iter()
            .map(|entry| (entry.id, (entry.incarnation, entry.status)))
            .collect()
    }

    /// Merge a peer's digest into this node's view, resolving conflicts by
    /// higher incarnation, then by status precedence (`Dead > Suspected >
    /// Active > Joining`).
    pub fn merge_digest(&self, remote: GossipDigest) {
        for (node, (incarnation, status)) in remote {
            if node == self.local_node {
                continue;
            }
            match self.nodes.get_mut(&node) {
                Some(mut entry) => {
                    let adopt = incarnation > entry.incarnation
                        || (incarnation == entry.incarnation
                            && status.precedence() > entry.status.precedence());
                    if adopt {
                        entry.incarnation = incarnation;
                        entry.status = status;
                    }
                }
                None => {
                    // Unknown peer learned about second-hand; address is
                    // not carried in the digest, so it can only be tracked
                    // once a direct join/heartbeat supplies one.
                }
            }
        }
    }

    /// One gossip round: pick up to `fanout` random peers and hand each to
    /// `exchange`, merging back whatever digest it returns.
    ///
    /// `exchange` is a plain async closure rather than a stored trait
    /// object — the network call happens once per invocation, so there is
    /// no reason to pay for dynamic dispatch here.
    pub async fn gossip_tick<F, Fut>(&self, fanout: usize, exchange: F)
    where
        F: Fn(NodeId, GossipDigest) -> Fut,
        Fut: Future<Output = Option<GossipDigest>>,
    {
        let mut peers: Vec<NodeId> = self
            .nodes
            .iter()
            .map(|entry| entry.id)
            .filter(|id| *id != self.local_node)
            .collect();
        peers.shuffle(&mut rand::thread_rng());
        peers.truncate(fanout);

        let digest = self.local_digest();
        for peer in peers {
            if let Some(reply) = exchange(peer, digest.clone()).await {
                self.merge_digest(reply);
            }
        }
    }

    /// Start the periodic failure-detection sweep (and, for
    /// `MembershipProtocol::Gossip`, the gossip tick is left to the caller
    /// to drive via [`Self::gossip_tick`], since it requires a network
    /// hook this manager does not own).
    pub async fn start(self: &Arc<Self>) -> Result<(), ClusterError> {
        let mut guard = self.sweeper.lock().await;
        if guard.is_some() {
            return Err(ClusterError::AlreadyStarted);
        }

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let manager = Arc::clone(self);
        let mut ticker = interval(self.config.heartbeat_interval);

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => manager.sweep().await,
                }
            }
        });

        *guard = Some(RunningSweeper {
            shutdown: shutdown_tx,
            join,
        });
        Ok(())
    }

    /// Stop the periodic sweep started by [`Self::start`].
    pub async fn stop(&self) -> Result<(), ClusterError> {
        let mut guard = self.sweeper.lock().await;
        match guard.take() {
            Some(sweeper) => {
                let _ = sweeper.shutdown.send(());
                let _ = sweeper.join.await;
                Ok(())
            }
            None => Err(ClusterError::NotStarted),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::monitoring::{InMemoryMonitor, MonitoringConfig};
    use std::time::Duration as StdDuration;

    fn test_manager() -> ClusterManager<InMemoryMonitor<ClusterEvent>> {
        let config = ClusterConfig {
            heartbeat_interval: StdDuration::from_millis(10),
            failure_detection_threshold: StdDuration::from_millis(30),
            ..ClusterConfig::default()
        };
        let monitor = InMemoryMonitor::new(MonitoringConfig::default());
        ClusterManager::new(NodeId::local(), config, monitor)
    }

    #[tokio::test]
    async fn join_registers_node_as_active() {
        let manager = test_manager();
        let node = NodeId::new();
        manager.join(node, "127.0.0.1:9001".parse().unwrap()).await.unwrap();
        assert_eq!(manager.node_info(node).unwrap().status, NodeStatus::Active);
        assert_eq!(manager.metrics().active, 1);
    }

    #[tokio::test]
    async fn joining_twice_without_death_errors() {
        let manager = test_manager();
        let node = NodeId::new();
        let addr = "127.0.0.1:9001".parse().unwrap();
        manager.join(node, addr).await.unwrap();
        assert!(manager.join(node, addr).await.is_err());
    }

    #[tokio::test]
    async fn sweep_demotes_stale_node_to_suspected_then_dead() {
        let manager = test_manager();
        let node = NodeId::new();
        manager.join(node, "127.0.0.1:9001".parse().unwrap()).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(40)).await;
        manager.sweep().await;
        assert_eq!(manager.node_info(node).unwrap().status, NodeStatus::Suspected);

        tokio::time::sleep(StdDuration::from_millis(40)).await;
        manager.sweep().await;
        assert!(manager.node_info(node).is_none());
        assert_eq!(manager.metrics().suspected, 0);
    }

    #[tokio::test]
    async fn heartbeat_recovers_a_suspected_node() {
        let manager = test_manager();
        let node = NodeId::new();
        manager.join(node, "127.0.0.1:9001".parse().unwrap()).await.unwrap();

        tokio::time::sleep(StdDuration::from_millis(40)).await;
        manager.sweep().await;
        assert_eq!(manager.node_info(node).unwrap().status, NodeStatus::Suspected);

        manager.heartbeat(node).await.unwrap();
        assert_eq!(manager.node_info(node).unwrap().status, NodeStatus::Active);
    }

    #[test]
    fn merge_digest_adopts_higher_incarnation() {
        let manager = test_manager();
        let node = NodeId::new();
        let addr = "127.0.0.1:9001".parse().unwrap();
        manager.nodes.insert(node, NodeInfo::joining(node, addr));

        let mut remote = GossipDigest::new();
        remote.insert(node, (5, NodeStatus::Suspected));
        manager.merge_digest(remote);

        let info = manager.node_info(node).unwrap();
        assert_eq!(info.incarnation, 5);
        assert_eq!(info.status, NodeStatus::Suspected);
    }

    #[test]
    fn merge_digest_breaks_incarnation_ties_by_status_precedence() {
        let manager = test_manager();
        let node = NodeId::new();
        let addr = "127.0.0.1:9001".parse().unwrap();
        let mut info = NodeInfo::joining(node, addr);
        info.status = NodeStatus::Active;
        manager.nodes.insert(node, info);

        let mut remote = GossipDigest::new();
        remote.insert(node, (0, NodeStatus::Dead));
        manager.merge_digest(remote);

        assert_eq!(manager.node_info(node).unwrap().status, NodeStatus::Dead);
    }

    #[tokio::test]
    async fn gossip_tick_merges_replies_from_contacted_peers() {
        let manager = test_manager();
        let peer = NodeId::new();
        manager.join(peer, "127.0.0.1:9002".parse().unwrap()).await.unwrap();

        let learned = NodeId::new();
        manager
            .gossip_tick(1, |_peer, _digest| async move {
                let mut reply = GossipDigest::new();
                reply.insert(learned, (0, NodeStatus::Active));
                Some(reply)
            })
            .await;

        // `learned` cannot be materialized without an address; merge_digest
        // is a no-op for nodes it has never seen directly.
        assert!(manager.node_info(learned).is_none());
    }

    #[tokio::test]
    async fn start_then_stop_does_not_error() {
        let manager = Arc::new(test_manager());
        manager.start().await.unwrap();
        manager.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_errors() {
        let manager = test_manager();
        assert!(matches!(manager.stop().await, Err(ClusterError::NotStarted)));
    }
}
