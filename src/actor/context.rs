//! Actor execution context: identity, timing, and the broker-backed
//! messaging surface (`send`/`request`) an actor uses during a turn.

// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc}; // §3.2 MANDATORY
use serde::Deserialize;

// Layer 3: Internal module imports
use super::behavior::{Behavior, BehaviorStack};
use crate::broker::MessageBroker;
use crate::message::{Message, MessageEnvelope};
use crate::util::{ActorAddress, ActorId};

/// Per-actor execution context, generic over the broker implementation
/// (ADR-006 dependency injection) so actors can be exercised in tests against
/// a lightweight broker without pulling in the full `ActorSystem`.
pub struct ActorContext<M: Message, B: MessageBroker<M>> {
    address: ActorAddress,
    id: ActorId,
    created_at: DateTime<Utc>,
    broker: B,
    behaviors: BehaviorStack<M>,
}

impl<M: Message, B: MessageBroker<M>> ActorContext<M, B> {
    /// Create a new context for an actor at `address`, wired to `broker`.
    pub fn new(address: ActorAddress, broker: B) -> Self {
        Self {
            id: *address.id(),
            address,
            created_at: Utc::now(), // §3.2
            broker,
            behaviors: BehaviorStack::new(),
        }
    }

    /// The actor's own address.
    pub fn address(&self) -> &ActorAddress {
        &self.address
    }

    /// The actor's ID.
    pub fn id(&self) -> &ActorId {
        &self.id
    }

    /// When this context (and therefore the actor's current incarnation)
    /// was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Direct access to the underlying broker, for advanced use (e.g.
    /// building a [`crate::router::Router`] over it).
    pub fn broker(&self) -> &B {
        &self.broker
    }

    /// Send a fire-and-forget message to `target`.
    pub async fn send(&self, target: ActorAddress, message: M) -> Result<(), B::Error> {
        let envelope = MessageEnvelope::new(message)
            .with_sender(self.address.clone())
            .with_reply_to(target);
        self.broker.send(envelope).await
    }

    /// Send a message to `target` and wait up to `timeout` for a reply of
    /// type `R`. Uses the broker's correlation-id based request/response path.
    pub async fn request<R>(
        &self,
        target: ActorAddress,
        message: M,
        timeout: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, B::Error>
    where
        R: Message + for<'de> Deserialize<'de>,
    {
        let envelope = MessageEnvelope::new(message)
            .with_sender(self.address.clone())
            .with_reply_to(target);
        self.broker.request(envelope, timeout).await
    }

    /// Replace the current top behavior frame (a permanent `become`).
    pub fn become_behavior(&mut self, behavior: Arc<dyn Behavior<M>>) {
        self.behaviors.become_(behavior);
    }

    /// Push a temporary behavior frame on top of the stack.
    pub fn push_behavior(&mut self, behavior: Arc<dyn Behavior<M>>) {
        self.behaviors.push(behavior);
    }

    /// Pop the top behavior frame, restoring the one below it.
    pub fn pop_behavior(&mut self) -> Option<Arc<dyn Behavior<M>>> {
        self.behaviors.pop()
    }

    /// The currently active behavior frame, if any has been installed.
    pub fn current_behavior(&self) -> Option<&Arc<dyn Behavior<M>>> {
        self.behaviors.current()
    }

    /// Depth of the behavior stack.
    pub fn behavior_depth(&self) -> usize {
        self.behaviors.depth()
    }
}
