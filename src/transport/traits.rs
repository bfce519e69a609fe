//! Transport provider contract and the node-local host it delivers into.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Layer 3: Internal
use super::envelope::WireEnvelope;
use super::error::TransportError;
use crate::util::{ActorId, NodeId, RemoteActorAddress};

/// A pluggable point-to-point message carrier between nodes.
///
/// Providers are chosen at system-boot config time rather than per message,
/// and at least two variants need to be swappable behind one interface —
/// the one place in this crate where a `dyn Transport` trait object is the
/// right tool rather than a generic parameter, mirroring `BehaviorStack`'s
/// runtime-polymorphism exception.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Start accepting inbound traffic (e.g. bind a listener).
    async fn start(&self) -> Result<(), TransportError>;

    /// Stop accepting inbound traffic and release any bound resources.
    async fn stop(&self) -> Result<(), TransportError>;

    /// Deliver `envelope` to the actor addressed by `target` on its node.
    async fn send(
        &self,
        target: &RemoteActorAddress,
        envelope: WireEnvelope,
    ) -> Result<(), TransportError>;

    /// This transport's own address, as peers should address it.
    fn local_address(&self) -> NodeId;
}

/// The actor-hosting side of a node: what a [`Transport`] provider's inbound
/// RPC handlers delegate to once a request has been decoded off the wire.
///
/// Kept as its own trait (rather than requiring `Transport` implementors to
/// know about `ActorSystem`) so a transport provider stays agnostic to what
/// is actually hosting actors locally; any `RemoteActorHost` implementation
/// can be plugged underneath it.
#[async_trait]
pub trait RemoteActorHost: Send + Sync + 'static {
    /// Spawn a new actor from a registered template name, returning its
    /// location-transparent address.
    async fn spawn_from_template(
        &self,
        template: &str,
    ) -> Result<RemoteActorAddress, TransportError>;

    /// Stop a locally hosted actor.
    async fn stop_actor(&self, actor_id: ActorId) -> Result<(), TransportError>;

    /// Deliver an already-decoded envelope to a locally hosted actor.
    async fn deliver(&self, envelope: WireEnvelope) -> Result<(), TransportError>;

    /// Subscribe to lifecycle events for a locally hosted actor, for the
    /// `WatchActor` streaming RPC (§6).
    fn watch(&self, actor_id: ActorId) -> Result<broadcast::Receiver<LifecycleEvent>, TransportError>;
}

/// A lifecycle transition pushed to remote watchers (§6 `WatchActor` stream).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// The actor this event is about.
    pub actor_id: ActorId,
    /// What happened.
    pub kind: LifecycleEventKind,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    /// Build a lifecycle event stamped with the current time.
    pub fn new(actor_id: ActorId, kind: LifecycleEventKind) -> Self {
        Self {
            actor_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// The kinds of lifecycle transition a remote watcher can observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEventKind {
    /// The actor finished starting and is accepting messages.
    Started,
    /// The actor stopped normally.
    Stopped,
    /// The actor terminated due to an unhandled error.
    Failed,
}
