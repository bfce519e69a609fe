//! Process-wide hook registries for `ActorSystem`.
//!
//! Hooks are global and invoked in registration order, serialized per
//! hook-kind (§6's "Shared-resource policy"). Each hook returns a boolean
//! `continue` flag; a `false` from a `messageInterceptor` suppresses
//! delivery of that message. Storing callbacks as `Arc<dyn Fn>` is the same
//! deliberate runtime-polymorphism tradeoff as [`crate::actor::BehaviorStack`]
//! (§6.2): hooks are registered dynamically at runtime by application code,
//! not known at compile time, so there is no generic parameter to abstract
//! over.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;

// Layer 3: Internal module imports
use crate::message::{Message, MessageEnvelope};
use crate::util::ActorAddress;

type HookList<F> = RwLock<Vec<Arc<F>>>;

/// The eight process-wide hook registries.
///
/// Held as a field on `ActorSystem`, not a module-level singleton, so each
/// system instance has its own independent hook list (§6: "If a single
/// process must have multiple isolated systems (tests), each gets its own
/// registry and hook list").
pub struct SystemHooks<M: Message> {
    message_interceptors: HookList<dyn Fn(&MessageEnvelope<M>) -> bool + Send + Sync>,
    message_processing_hooks: HookList<dyn Fn(&MessageEnvelope<M>) -> bool + Send + Sync>,
    actor_creation_hooks: HookList<dyn Fn(&ActorAddress) -> bool + Send + Sync>,
    actor_termination_hooks: HookList<dyn Fn(&ActorAddress) -> bool + Send + Sync>,
    error_hooks: HookList<dyn Fn(&ActorAddress, &str) -> bool + Send + Sync>,
    dead_letter_hooks: HookList<dyn Fn(&MessageEnvelope<M>) -> bool + Send + Sync>,
    restart_hooks: HookList<dyn Fn(&ActorAddress, u32) -> bool + Send + Sync>,
    state_update_hooks: HookList<dyn Fn(&ActorAddress, &str) -> bool + Send + Sync>,
}

impl<M: Message> SystemHooks<M> {
    /// Construct an empty set of hook registries.
    pub fn new() -> Self {
        Self {
            message_interceptors: RwLock::new(Vec::new()),
            message_processing_hooks: RwLock::new(Vec::new()),
            actor_creation_hooks: RwLock::new(Vec::new()),
            actor_termination_hooks: RwLock::new(Vec::new()),
            error_hooks: RwLock::new(Vec::new()),
            dead_letter_hooks: RwLock::new(Vec::new()),
            restart_hooks: RwLock::new(Vec::new()),
            state_update_hooks: RwLock::new(Vec::new()),
        }
    }

    /// Register a `messageInterceptor`, run before a message is handed to
    /// the broker for delivery.
    pub fn add_message_interceptor(
        &self,
        hook: impl Fn(&MessageEnvelope<M>) -> bool + Send + Sync + 'static,
    ) {
        self.message_interceptors.write().push(Arc::new(hook));
    }

    /// Register a `messageProcessingHook`, run after a cell receives a
    /// message but before `handle_message` runs.
    pub fn add_message_processing_hook(
        &self,
        hook: impl Fn(&MessageEnvelope<M>) -> bool + Send + Sync + 'static,
    ) {
        self.message_processing_hooks.write().push(Arc::new(hook));
    }

    /// Register an `actorCreationHook`, run once a cell has been spawned.
    pub fn add_actor_creation_hook(
        &self,
        hook: impl Fn(&ActorAddress) -> bool + Send + Sync + 'static,
    ) {
        self.actor_creation_hooks.write().push(Arc::new(hook));
    }

    /// Register an `actorTerminationHook`, run once a cell has stopped.
    pub fn add_actor_termination_hook(
        &self,
        hook: impl Fn(&ActorAddress) -> bool + Send + Sync + 'static,
    ) {
        self.actor_termination_hooks.write().push(Arc::new(hook));
    }

    /// Register an `errorHook`, run when an actor's `handle_message` errors.
    pub fn add_error_hook(&self, hook: impl Fn(&ActorAddress, &str) -> bool + Send + Sync + 'static) {
        self.error_hooks.write().push(Arc::new(hook));
    }

    /// Register a `deadLetterHook` (§5, §7: "each dead letter invokes the
    /// hook exactly once").
    pub fn add_dead_letter_hook(
        &self,
        hook: impl Fn(&MessageEnvelope<M>) -> bool + Send + Sync + 'static,
    ) {
        self.dead_letter_hooks.write().push(Arc::new(hook));
    }

    /// Register a `restartHook`, run when a supervisor restarts a cell.
    pub fn add_restart_hook(
        &self,
        hook: impl Fn(&ActorAddress, u32) -> bool + Send + Sync + 'static,
    ) {
        self.restart_hooks.write().push(Arc::new(hook));
    }

    /// Register a `stateUpdateHook`, run on every cell lifecycle transition.
    pub fn add_state_update_hook(
        &self,
        hook: impl Fn(&ActorAddress, &str) -> bool + Send + Sync + 'static,
    ) {
        self.state_update_hooks.write().push(Arc::new(hook));
    }

    /// Invoke every `messageInterceptor` in order; `false` suppresses
    /// delivery of `envelope`. Every registered interceptor runs regardless
    /// of earlier results, matching "invoked in registration order".
    pub fn run_message_interceptors(&self, envelope: &MessageEnvelope<M>) -> bool {
        self.message_interceptors
            .read()
            .iter()
            .fold(true, |acc, hook| hook(envelope) && acc)
    }

    /// Invoke every `messageProcessingHook` in order.
    pub fn run_message_processing_hooks(&self, envelope: &MessageEnvelope<M>) -> bool {
        self.message_processing_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(envelope) && acc)
    }

    /// Invoke every `actorCreationHook` in order.
    pub fn run_actor_creation_hooks(&self, address: &ActorAddress) -> bool {
        self.actor_creation_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(address) && acc)
    }

    /// Invoke every `actorTerminationHook` in order.
    pub fn run_actor_termination_hooks(&self, address: &ActorAddress) -> bool {
        self.actor_termination_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(address) && acc)
    }

    /// Invoke every `errorHook` in order.
    pub fn run_error_hooks(&self, address: &ActorAddress, error: &str) -> bool {
        self.error_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(address, error) && acc)
    }

    /// Invoke every `deadLetterHook` in order.
    pub fn run_dead_letter_hooks(&self, envelope: &MessageEnvelope<M>) -> bool {
        self.dead_letter_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(envelope) && acc)
    }

    /// Invoke every `restartHook` in order.
    pub fn run_restart_hooks(&self, address: &ActorAddress, restart_count: u32) -> bool {
        self.restart_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(address, restart_count) && acc)
    }

    /// Invoke every `stateUpdateHook` in order.
    pub fn run_state_update_hooks(&self, address: &ActorAddress, state: &str) -> bool {
        self.state_update_hooks
            .read()
            .iter()
            .fold(true, |acc, hook| hook(address, state) && acc)
    }
}

impl<M: Message> Default for SystemHooks<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessagePriority;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone)]
    struct TestMessage;

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "hooks_test";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    #[test]
    fn message_interceptor_false_suppresses_delivery() {
        let hooks: SystemHooks<TestMessage> = SystemHooks::new();
        hooks.add_message_interceptor(|_| true);
        hooks.add_message_interceptor(|_| false);

        let envelope = MessageEnvelope::new(TestMessage);
        assert!(!hooks.run_message_interceptors(&envelope));
    }

    #[test]
    fn hooks_run_in_registration_order() {
        let hooks: SystemHooks<TestMessage> = SystemHooks::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let order_a = Arc::clone(&order);
        hooks.add_actor_creation_hook(move |_| {
            order_a.lock().push(1);
            true
        });
        let order_b = Arc::clone(&order);
        hooks.add_actor_creation_hook(move |_| {
            order_b.lock().push(2);
            true
        });

        let address = ActorAddress::anonymous();
        assert!(hooks.run_actor_creation_hooks(&address));
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn all_hooks_run_even_after_one_returns_false() {
        let hooks: SystemHooks<TestMessage> = SystemHooks::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_a = Arc::clone(&calls);
        hooks.add_error_hook(move |_, _| {
            calls_a.fetch_add(1, Ordering::SeqCst);
            false
        });
        let calls_b = Arc::clone(&calls);
        hooks.add_error_hook(move |_, _| {
            calls_b.fetch_add(1, Ordering::SeqCst);
            true
        });

        let address = ActorAddress::anonymous();
        assert!(!hooks.run_error_hooks(&address, "boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_registered_hooks_defaults_to_continue() {
        let hooks: SystemHooks<TestMessage> = SystemHooks::new();
        let address = ActorAddress::anonymous();
        assert!(hooks.run_actor_termination_hooks(&address));
        assert!(hooks.run_restart_hooks(&address, 1));
        assert!(hooks.run_state_update_hooks(&address, "Running"));
    }
}
