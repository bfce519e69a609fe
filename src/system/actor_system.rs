//! Main actor system implementation.
//!
//! Owns the spawn/dispatch/stop lifecycle for every local actor cell: each
//! spawned actor runs as its own task over a [`CellInbox`] (system lane +
//! user lane), registered with the injected [`MessageBroker`] so other
//! actors can address it, and bounded by a per-cell [`RestartBackoff`] so a
//! cell that keeps failing is stopped rather than restarted forever.

// Layer 1: Standard library
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

// Layer 3: Internal
use super::{builder::ActorSpawnBuilder, hooks::SystemHooks, SystemConfig, SystemError};
use crate::actor::{Actor, ActorContext, BehaviorDirective, ErrorAction};
use crate::broker::MessageBroker;
use crate::dispatcher::{Dispatcher, SharedPoolDispatcher};
use crate::mailbox::{
    AtomicMetrics, CellInbox, CellMessage, SystemMailboxSender, SystemMessage, UnboundedMailbox,
    UnboundedMailboxSender,
};
use crate::message::{Message, MessageEnvelope};
use crate::monitoring::{SpanKind, TraceSpan};
use crate::supervisor::RestartBackoff;
use crate::transport::{Transport, WireEnvelope};
use crate::util::{ActorAddress, ActorId, RemoteActorAddress};

/// System state enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SystemState {
    /// System is running normally
    Running,
    /// Graceful shutdown in progress
    ShuttingDown,
    /// System has stopped
    Stopped,
}

/// Internal actor metadata.
struct ActorMetadata {
    #[allow(dead_code)] // carried for future introspection (e.g. `system.actor_info`)
    id: ActorId,
    #[allow(dead_code)]
    address: ActorAddress,
    #[allow(dead_code)]
    name: Option<String>,
    #[allow(dead_code)]
    spawned_at: DateTime<Utc>,
    system_sender: SystemMailboxSender,
    task_handle: JoinHandle<()>,
}

/// Main actor system managing actor lifecycle.
///
/// Generic over the message type and the injected broker implementation
/// (ADR-006 dependency injection).
///
/// # Type Parameters
///
/// * `M` - The message type used by all actors in this system
/// * `B` - The message broker implementation
///
/// # Examples
///
/// ```rust,ignore
/// use airssys_rt::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), SystemError> {
///     let broker = InMemoryMessageBroker::new();
///     let system = ActorSystem::new(SystemConfig::default(), broker);
///
///     let addr = system.spawn()
///         .with_name("worker")
///         .spawn(my_actor)
///         .await?;
///
///     system.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct ActorSystem<M: Message, B: MessageBroker<M>, D: Dispatcher = SharedPoolDispatcher> {
    pub(crate) inner: Arc<ActorSystemInner<M, B, D>>,
}

pub(crate) struct ActorSystemInner<M: Message, B: MessageBroker<M>, D: Dispatcher> {
    pub(crate) config: SystemConfig,
    pub(crate) broker: B, // Dependency injection (ADR-006 §6.2 compliance)
    actors: RwLock<HashMap<ActorAddress, ActorMetadata>>,
    /// Watchers registered per watched address (§4.1's `Watch`/`Terminated`).
    /// Mutated only from within the watched cell's own task, via the
    /// `SystemMessage::Watch`/`Unwatch` it receives on its system lane, so
    /// there is no cross-task race on a given entry.
    watchers: DashMap<ActorAddress, Vec<ActorAddress>>,
    pub(crate) hooks: SystemHooks<M>,
    pub(crate) state: RwLock<SystemState>,
    dispatcher: D,
    /// Carrier used by [`ActorSystem::send_remote`] for non-local targets.
    /// `None` until [`ActorSystem::set_transport`] installs one.
    transport: RwLock<Option<Arc<dyn Transport>>>,
}

impl<M, B> ActorSystem<M, B, SharedPoolDispatcher>
where
    M: Message + serde::Serialize,
    B: MessageBroker<M, Sender = UnboundedMailboxSender<M, AtomicMetrics>>
        + Clone
        + Send
        + Sync
        + 'static,
{
    /// Create a new actor system with dependency injection, placing every
    /// cell's task onto the ambient shared runtime pool.
    ///
    /// # Arguments
    ///
    /// * `config` - System configuration
    /// * `broker` - Message broker implementation (injected)
    pub fn new(config: SystemConfig, broker: B) -> Self {
        Self::with_dispatcher(config, broker, SharedPoolDispatcher::new())
    }

    /// Create a builder for spawning actors.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let address = system.spawn()
    ///     .with_name("worker")
    ///     .with_mailbox_capacity(1000)
    ///     .spawn(my_actor)
    ///     .await?;
    /// ```
    pub fn spawn(&self) -> ActorSpawnBuilder<M, B> {
        ActorSpawnBuilder::new(self.clone())
    }
}

impl<M, B, D> ActorSystem<M, B, D>
where
    M: Message + serde::Serialize,
    B: MessageBroker<M, Sender = UnboundedMailboxSender<M, AtomicMetrics>>
        + Clone
        + Send
        + Sync
        + 'static,
    D: Dispatcher,
{
    /// Create a new actor system whose cells are placed through `dispatcher`
    /// rather than the default shared pool — e.g. [`crate::dispatcher::PinnedDispatcher`]
    /// for affinity-sensitive actors.
    pub fn with_dispatcher(config: SystemConfig, broker: B, dispatcher: D) -> Self {
        let inner = Arc::new(ActorSystemInner {
            config,
            broker,
            actors: RwLock::new(HashMap::new()),
            watchers: DashMap::new(),
            hooks: SystemHooks::new(),
            state: RwLock::new(SystemState::Running),
            dispatcher,
            transport: RwLock::new(None),
        });

        Self { inner }
    }

    /// Get the system configuration.
    pub fn config(&self) -> &SystemConfig {
        &self.inner.config
    }

    /// Access the process-wide hook registries to register interceptors,
    /// creation/termination/error/restart/state-update hooks.
    pub fn hooks(&self) -> &SystemHooks<M> {
        &self.inner.hooks
    }

    /// Install the transport used by [`Self::send_remote`] to reach
    /// non-local targets.
    pub fn set_transport(&self, transport: Arc<dyn Transport>) {
        *self.inner.transport.write() = Some(transport);
    }

    /// Get the number of active actors.
    pub fn actor_count(&self) -> usize {
        self.inner.actors.read().len()
    }

    /// Check if system is shutting down.
    pub fn is_shutting_down(&self) -> bool {
        *self.inner.state.read() != SystemState::Running
    }

    /// Send a fire-and-forget message to `target`.
    ///
    /// Runs every registered `messageInterceptor` first; if any of them
    /// returns `false`, delivery is suppressed and `Ok(())` is still
    /// returned (the message is simply dropped, matching an interceptor's
    /// purpose of vetoing delivery rather than signalling an error).
    pub async fn send(&self, target: ActorAddress, message: M) -> Result<(), SystemError> {
        let envelope = MessageEnvelope::new(message).with_reply_to(target);
        if !self.inner.hooks.run_message_interceptors(&envelope) {
            return Ok(());
        }
        self.inner
            .broker
            .send(envelope)
            .await
            .map_err(|error| SystemError::ActorOperationFailed(error.to_string()))
    }

    /// Send a fire-and-forget message to a possibly-remote `target`.
    ///
    /// A local target (`target.is_local()`) is delivered the same way as
    /// [`Self::send`]. A remote one is serialized into a [`WireEnvelope`]
    /// and handed to the [`Transport`] installed via [`Self::set_transport`].
    ///
    /// There is no remote counterpart to [`Self::ask`]: resolving a reply
    /// that arrives back over the wire needs a correlation registry shared
    /// with the transport's inbound RPC handler, which is a larger piece of
    /// plumbing than this method's fire-and-forget path — see `DESIGN.md`'s
    /// Transport section.
    pub async fn send_remote(
        &self,
        target: &RemoteActorAddress,
        message: M,
    ) -> Result<(), SystemError> {
        if target.is_local() {
            return self.send(target.local_address().clone(), message).await;
        }

        let transport = self.inner.transport.read().clone().ok_or_else(|| {
            SystemError::ActorOperationFailed("no transport configured".to_string())
        })?;

        let payload = serde_json::to_vec(&message)
            .map_err(|error| SystemError::ActorOperationFailed(error.to_string()))?;
        let envelope = WireEnvelope::new(*target.local_address().id(), M::MESSAGE_TYPE, payload);

        transport
            .send(target, envelope)
            .await
            .map_err(|error| SystemError::ActorOperationFailed(error.to_string()))
    }

    /// Send `message` to `target` and wait up to `timeout_duration` for a
    /// reply of type `R`, delegating correlation-id bookkeeping to the
    /// broker's own request/response path rather than duplicating it at the
    /// system level (see [`crate::system::RequestResponseManager`]'s doc
    /// comment for why a second registry isn't kept here).
    pub async fn ask<R>(
        &self,
        target: ActorAddress,
        message: M,
        timeout_duration: Duration,
    ) -> Result<Option<MessageEnvelope<R>>, SystemError>
    where
        R: Message + for<'de> serde::Deserialize<'de>,
    {
        let envelope = MessageEnvelope::new(message).with_reply_to(target);
        if !self.inner.hooks.run_message_interceptors(&envelope) {
            return Ok(None);
        }
        self.inner
            .broker
            .request(envelope, timeout_duration)
            .await
            .map_err(|error| SystemError::ActorOperationFailed(error.to_string()))
    }

    /// Register `watcher` to receive a `Terminated` system message exactly
    /// once, when the actor at `target` reaches `Stopped` (§4.1).
    ///
    /// The registration itself travels on `target`'s system lane so it is
    /// serialized with respect to any `Stop` already queued for that cell.
    pub fn watch(&self, target: &ActorAddress, watcher: ActorAddress) -> Result<(), SystemError> {
        self.send_system_message(target, SystemMessage::Watch(watcher))
    }

    /// Remove a previously registered watch.
    pub fn unwatch(&self, target: &ActorAddress, watcher: ActorAddress) -> Result<(), SystemError> {
        self.send_system_message(target, SystemMessage::Unwatch(watcher))
    }

    /// Stop an actor by enqueuing `SystemMessage::Stop` on its system lane.
    pub fn stop(&self, target: &ActorAddress) -> Result<(), SystemError> {
        self.send_system_message(target, SystemMessage::Stop)
    }

    fn send_system_message(
        &self,
        target: &ActorAddress,
        message: SystemMessage,
    ) -> Result<(), SystemError> {
        let actors = self.inner.actors.read();
        let metadata = actors
            .get(target)
            .ok_or_else(|| SystemError::ActorNotFound(*target.id()))?;
        metadata
            .system_sender
            .send(message)
            .map_err(|_| SystemError::ActorOperationFailed("target mailbox closed".to_string()))
    }

    /// Gracefully shutdown the system.
    ///
    /// Asks every actor to stop over its system lane, then waits for all
    /// actors to finish, up to `shutdown_timeout`. If the grace period
    /// elapses with cells still running, they are force-terminated (aborted,
    /// same as [`Self::force_shutdown`]) rather than left running past the
    /// deadline; the timeout is still reported so callers can tell a clean
    /// shutdown from a forced one.
    pub async fn shutdown(&self) -> Result<(), SystemError> {
        {
            let mut state = self.inner.state.write();
            if *state != SystemState::Running {
                return Err(SystemError::ShuttingDown);
            }
            *state = SystemState::ShuttingDown;
        }

        {
            let actors = self.inner.actors.read();
            for metadata in actors.values() {
                let _ = metadata.system_sender.send(SystemMessage::Stop);
            }
        }

        let timeout_duration = self.inner.config.shutdown_timeout;
        let result = timeout(timeout_duration, self.wait_for_actors()).await;

        match result {
            Ok(()) => {
                *self.inner.state.write() = SystemState::Stopped;
                Ok(())
            }
            Err(_) => {
                self.force_terminate_remaining();
                Err(SystemError::ShutdownTimeout(timeout_duration))
            }
        }
    }

    /// Wait for all actors to finish.
    async fn wait_for_actors(&self) {
        loop {
            if self.inner.actors.read().is_empty() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    /// Force immediate shutdown without waiting for cells to drain.
    pub async fn force_shutdown(&self) {
        self.force_terminate_remaining();
    }

    /// Abort every still-registered cell's task and clear the registry.
    fn force_terminate_remaining(&self) {
        *self.inner.state.write() = SystemState::Stopped;

        let mut actors = self.inner.actors.write();
        for metadata in actors.values() {
            metadata.task_handle.abort();
        }
        actors.clear();
    }

    /// Internal: Spawn actor with full configuration.
    ///
    /// Called by `ActorSpawnBuilder`.
    pub(crate) async fn spawn_actor_internal<A>(
        &self,
        actor: A,
        name: Option<String>,
        _mailbox_capacity: usize,
    ) -> Result<ActorAddress, SystemError>
    where
        A: Actor<Message = M> + Send + 'static,
    {
        if self.is_shutting_down() {
            return Err(SystemError::ShuttingDown);
        }

        if self.inner.config.max_actors > 0 {
            let current = self.actor_count();
            if current >= self.inner.config.max_actors {
                return Err(SystemError::ActorLimitExceeded {
                    current,
                    max: self.inner.config.max_actors,
                });
            }
        }

        let address = match name {
            Some(ref n) => ActorAddress::named(n),
            None => ActorAddress::anonymous(),
        };
        let actor_id = *address.id();

        // Bounded mailboxes are a future enhancement (`_mailbox_capacity` is
        // reserved for it); every cell currently uses an unbounded user lane
        // paired with its own system lane via `CellInbox`.
        let (user_mailbox, user_sender) = UnboundedMailbox::<M, AtomicMetrics>::new();
        let (inbox, system_sender) = CellInbox::new(user_mailbox);

        self.inner
            .broker
            .register_actor(address.clone(), user_sender)
            .map_err(|error| SystemError::ActorOperationFailed(error.to_string()))?;

        let context = ActorContext::new(address.clone(), self.inner.broker.clone());
        let task_handle = self.spawn_actor_task(actor, inbox, context, address.clone());

        let metadata = ActorMetadata {
            id: actor_id,
            address: address.clone(),
            name,
            spawned_at: Utc::now(),
            system_sender,
            task_handle,
        };

        self.inner.actors.write().insert(address.clone(), metadata);
        self.inner.hooks.run_actor_creation_hooks(&address);

        Ok(address)
    }

    /// Spawn the actor task: drains `inbox` up to `config.throughput` user
    /// messages per turn before yielding back to the executor, dispatching
    /// system-lane control traffic internally and user messages to the
    /// installed [`crate::actor::Behavior`] (falling back to
    /// `actor.handle_message` once the behavior stack is empty or the
    /// current frame declines the message), bounding automatic restarts with
    /// `RestartBackoff`. Placed onto its execution substrate through
    /// `config`'s [`Dispatcher`] rather than a bare `tokio::spawn`.
    fn spawn_actor_task<A>(
        &self,
        mut actor: A,
        mut inbox: CellInbox<M, UnboundedMailbox<M, AtomicMetrics>>,
        mut context: ActorContext<M, B>,
        address: ActorAddress,
    ) -> JoinHandle<()>
    where
        A: Actor<Message = M> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let task_inner = Arc::clone(&inner);

        inner.dispatcher.spawn(async move {
            let inner = task_inner;
            let mut backoff = RestartBackoff::with_delays(
                inner.config.max_restarts,
                inner.config.restart_window,
                inner.config.restart_base_delay,
                inner.config.restart_max_delay,
            );
            let mut turns_this_cycle: usize = 0;

            if let Err(error) = actor.pre_start(&mut context).await {
                inner.hooks.run_error_hooks(&address, &error.to_string());
                let action = actor.on_error(error, &mut context).await;
                if !matches!(action, ErrorAction::Resume) {
                    Self::finish_cell(&inner, &address).await;
                    return;
                }
            }

            inner.hooks.run_state_update_hooks(&address, "Running");

            'cell: loop {
                match inbox.recv_next().await {
                    Some(CellMessage::System(SystemMessage::Stop)) | None => break 'cell,
                    Some(CellMessage::System(SystemMessage::Restart)) => {
                        if actor.pre_start(&mut context).await.is_err() {
                            break 'cell;
                        }
                        inner
                            .hooks
                            .run_restart_hooks(&address, backoff.restart_count());
                    }
                    Some(CellMessage::System(SystemMessage::Watch(watcher))) => {
                        inner.watchers.entry(address.clone()).or_default().push(watcher);
                    }
                    Some(CellMessage::System(SystemMessage::Unwatch(watcher))) => {
                        if let Some(mut list) = inner.watchers.get_mut(&address) {
                            list.retain(|w| w != &watcher);
                        }
                    }
                    Some(CellMessage::System(SystemMessage::Terminated(watched))) => {
                        inner.hooks.run_state_update_hooks(
                            &address,
                            &format!("watched {watched} terminated"),
                        );
                    }
                    Some(CellMessage::System(
                        SystemMessage::AddRoutee(_) | SystemMessage::RemoveRoutee(_),
                    )) => {
                        // Router management traffic is handled by `Router`
                        // itself, not a plain actor cell; ignore if it
                        // somehow reaches one directly.
                    }
                    Some(CellMessage::User(envelope)) => {
                        if !inner.hooks.run_message_processing_hooks(&envelope) {
                            continue 'cell;
                        }

                        let span = envelope
                            .trace_context
                            .clone()
                            .map(|ctx| TraceSpan::start(ctx, "actor.turn", SpanKind::Consumer));
                        let behavior_frame = context.current_behavior().cloned();
                        let message = envelope.payload;

                        let mut handled_by_behavior = false;
                        if let Some(behavior) = behavior_frame {
                            if matches!(
                                behavior.handle(&message).await,
                                BehaviorDirective::Handled
                            ) {
                                handled_by_behavior = true;
                            }
                        }

                        let outcome = if handled_by_behavior {
                            Ok(())
                        } else {
                            actor.handle_message(message, &mut context).await
                        };

                        match outcome {
                            Ok(()) => {
                                if let Some(mut span) = span {
                                    span.finish();
                                }
                            }
                            Err(error) => {
                                if let Some(mut span) = span {
                                    span.fail(error.to_string());
                                }
                                inner.hooks.run_error_hooks(&address, &error.to_string());
                                match actor.on_error(error, &mut context).await {
                                    ErrorAction::Resume => continue 'cell,
                                    ErrorAction::Stop => break 'cell,
                                    ErrorAction::Restart => {
                                        if backoff.is_limit_exceeded() {
                                            break 'cell;
                                        }
                                        backoff.record_restart();
                                        sleep(backoff.calculate_delay()).await;
                                        if actor.pre_start(&mut context).await.is_err() {
                                            break 'cell;
                                        }
                                        inner.hooks.run_restart_hooks(
                                            &address,
                                            backoff.restart_count(),
                                        );
                                    }
                                    ErrorAction::Escalate => {
                                        inner
                                            .hooks
                                            .run_error_hooks(&address, "escalated to supervisor");
                                        break 'cell;
                                    }
                                }
                            }
                        }

                        turns_this_cycle += 1;
                        if turns_this_cycle >= inner.config.throughput {
                            turns_this_cycle = 0;
                            tokio::task::yield_now().await;
                        }
                    }
                }
            }

            let _ = actor.post_stop(&mut context).await;
            Self::finish_cell(&inner, &address).await;
        })
    }

    /// Deregister a cell once its loop ends: remove it from the registry and
    /// broker, run termination hooks, and notify its watchers exactly once.
    async fn finish_cell(inner: &Arc<ActorSystemInner<M, B, D>>, address: &ActorAddress) {
        inner.actors.write().remove(address);
        let _ = inner.broker.unregister_actor(address);
        inner.hooks.run_actor_termination_hooks(address);
        inner.hooks.run_state_update_hooks(address, "Stopped");

        if let Some((_, watchers)) = inner.watchers.remove(address) {
            let actors = inner.actors.read();
            for watcher in watchers {
                if let Some(metadata) = actors.get(&watcher) {
                    let _ = metadata
                        .system_sender
                        .send(SystemMessage::Terminated(address.clone()));
                }
            }
        }
    }
}

impl<M: Message, B: MessageBroker<M>, D: Dispatcher> Clone for ActorSystem<M, B, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::broker::in_memory::InMemoryMessageBroker;
    use crate::message::MessagePriority;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    struct TestMessage {
        data: String,
    }

    impl Message for TestMessage {
        const MESSAGE_TYPE: &'static str = "test";

        fn priority(&self) -> MessagePriority {
            MessagePriority::Normal
        }
    }

    struct TestActor;

    #[async_trait::async_trait]
    impl Actor for TestActor {
        type Message = TestMessage;
        type Error = std::io::Error;

        async fn handle_message<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct CountingActor(Arc<AtomicU32>);

    #[async_trait::async_trait]
    impl Actor for CountingActor {
        type Message = TestMessage;
        type Error = std::io::Error;

        async fn handle_message<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_actor_system_creation() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);
        assert_eq!(system.actor_count(), 0);
        assert!(!system.is_shutting_down());
    }

    #[tokio::test]
    async fn test_actor_spawn() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let address = system
            .spawn_actor_internal(TestActor, Some("test".to_string()), 100)
            .await
            .unwrap();

        assert_eq!(system.actor_count(), 1);

        if let ActorAddress::Named { name, .. } = address {
            assert_eq!(name, "test");
        } else {
            panic!("Expected named address");
        }
    }

    #[tokio::test]
    async fn test_system_shutdown() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        assert!(system.shutdown().await.is_ok());
        assert!(system.is_shutting_down());
    }

    #[tokio::test]
    async fn test_force_shutdown() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let _addr = system
            .spawn_actor_internal(TestActor, None, 100)
            .await
            .unwrap();

        system.force_shutdown().await;
        assert_eq!(system.actor_count(), 0);
    }

    #[tokio::test]
    async fn test_system_send_delivers_to_spawned_actor() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);
        let counter = Arc::new(AtomicU32::new(0));

        let address = system
            .spawn_actor_internal(CountingActor(Arc::clone(&counter)), None, 100)
            .await
            .unwrap();

        system
            .send(
                address,
                TestMessage {
                    data: "hi".to_string(),
                },
            )
            .await
            .unwrap();

        sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ask_times_out_without_a_responder() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let address = system.spawn_actor_internal(TestActor, None, 100).await.unwrap();

        let result = system
            .ask::<TestMessage>(
                address,
                TestMessage {
                    data: "ping".to_string(),
                },
                Duration::from_millis(20),
            )
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stop_unknown_actor_returns_not_found() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let result = system.stop(&ActorAddress::anonymous());
        assert!(matches!(result, Err(SystemError::ActorNotFound(_))));
    }

    #[tokio::test]
    async fn test_watch_delivers_terminated_on_stop() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let watcher = system.spawn_actor_internal(TestActor, None, 100).await.unwrap();
        let target = system.spawn_actor_internal(TestActor, None, 100).await.unwrap();

        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_clone = Arc::clone(&observed);
        system.hooks().add_state_update_hook(move |_address, state| {
            observed_clone.lock().unwrap().push(state.to_string());
            true
        });

        system.watch(&target, watcher).unwrap();
        system.stop(&target).unwrap();

        sleep(Duration::from_millis(50)).await;

        let states = observed.lock().unwrap();
        assert!(states.iter().any(|s| s.contains("terminated")));
    }

    struct CountingBehavior(Arc<AtomicU32>);

    impl crate::actor::Behavior<TestMessage> for CountingBehavior {
        fn name(&self) -> &str {
            "counting"
        }

        fn handle<'a>(
            &'a self,
            _message: &'a TestMessage,
        ) -> futures::future::BoxFuture<'a, BehaviorDirective> {
            let counter = Arc::clone(&self.0);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                BehaviorDirective::Handled
            })
        }
    }

    struct BehaviorSwitchingActor {
        behavior_hits: Arc<AtomicU32>,
        base_hits: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl Actor for BehaviorSwitchingActor {
        type Message = TestMessage;
        type Error = std::io::Error;

        async fn pre_start<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            context.become_behavior(Arc::new(CountingBehavior(Arc::clone(&self.behavior_hits))));
            Ok(())
        }

        async fn handle_message<B: crate::broker::MessageBroker<Self::Message>>(
            &mut self,
            _message: Self::Message,
            _context: &mut ActorContext<Self::Message, B>,
        ) -> Result<(), Self::Error> {
            self.base_hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn installed_behavior_handles_messages_instead_of_base_handler() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);
        let behavior_hits = Arc::new(AtomicU32::new(0));
        let base_hits = Arc::new(AtomicU32::new(0));

        let address = system
            .spawn_actor_internal(
                BehaviorSwitchingActor {
                    behavior_hits: Arc::clone(&behavior_hits),
                    base_hits: Arc::clone(&base_hits),
                },
                None,
                100,
            )
            .await
            .unwrap();

        system
            .send(
                address,
                TestMessage {
                    data: "hi".to_string(),
                },
            )
            .await
            .unwrap();

        sleep(Duration::from_millis(50)).await;
        assert_eq!(behavior_hits.load(Ordering::SeqCst), 1);
        assert_eq!(base_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn throughput_cap_still_drains_every_message() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let config = SystemConfig::builder().with_throughput(4).build().unwrap();
        let system = ActorSystem::new(config, broker);
        let counter = Arc::new(AtomicU32::new(0));

        let address = system
            .spawn_actor_internal(CountingActor(Arc::clone(&counter)), None, 100)
            .await
            .unwrap();

        for i in 0..20 {
            system
                .send(
                    address.clone(),
                    TestMessage {
                        data: format!("msg-{i}"),
                    },
                )
                .await
                .unwrap();
        }

        sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn shutdown_force_terminates_cells_that_outlive_the_grace_period() {
        struct SlowStopActor;

        #[async_trait::async_trait]
        impl Actor for SlowStopActor {
            type Message = TestMessage;
            type Error = std::io::Error;

            async fn handle_message<B: crate::broker::MessageBroker<Self::Message>>(
                &mut self,
                _message: Self::Message,
                _context: &mut ActorContext<Self::Message, B>,
            ) -> Result<(), Self::Error> {
                Ok(())
            }

            async fn post_stop<B: crate::broker::MessageBroker<Self::Message>>(
                &mut self,
                _context: &mut ActorContext<Self::Message, B>,
            ) -> Result<(), Self::Error> {
                sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }

        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let config = SystemConfig::builder()
            .with_shutdown_timeout(Duration::from_millis(50))
            .build()
            .unwrap();
        let system = ActorSystem::new(config, broker);

        let _address = system.spawn_actor_internal(SlowStopActor, None, 100).await.unwrap();

        let result = system.shutdown().await;
        assert!(matches!(result, Err(SystemError::ShutdownTimeout(_))));
        assert_eq!(system.actor_count(), 0);
    }

    #[derive(Clone)]
    struct CountingDispatcher {
        spawned: Arc<AtomicU32>,
        inner: SharedPoolDispatcher,
    }

    impl Dispatcher for CountingDispatcher {
        fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
        where
            Fut: std::future::Future<Output = ()> + Send + 'static,
        {
            self.spawned.fetch_add(1, Ordering::SeqCst);
            self.inner.spawn(future)
        }
    }

    #[tokio::test]
    async fn with_dispatcher_routes_cell_spawns_through_the_given_dispatcher() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let spawned = Arc::new(AtomicU32::new(0));
        let dispatcher = CountingDispatcher {
            spawned: Arc::clone(&spawned),
            inner: SharedPoolDispatcher::new(),
        };
        let system = ActorSystem::with_dispatcher(SystemConfig::default(), broker, dispatcher);

        let _address = system.spawn_actor_internal(TestActor, None, 100).await.unwrap();
        let _address2 = system.spawn_actor_internal(TestActor, None, 100).await.unwrap();

        assert_eq!(spawned.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn send_remote_to_a_local_address_delivers_like_send() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);
        let counter = Arc::new(AtomicU32::new(0));

        let address = system
            .spawn_actor_internal(CountingActor(Arc::clone(&counter)), None, 100)
            .await
            .unwrap();

        let remote = RemoteActorAddress::local(address);
        system
            .send_remote(
                &remote,
                TestMessage {
                    data: "hi".to_string(),
                },
            )
            .await
            .unwrap();

        sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_remote_without_a_transport_configured_errors() {
        let broker = InMemoryMessageBroker::<TestMessage>::new();
        let system = ActorSystem::new(SystemConfig::default(), broker);

        let remote = RemoteActorAddress::new(
            crate::util::NodeId::new(),
            ActorAddress::anonymous(),
        );

        let result = system
            .send_remote(
                &remote,
                TestMessage {
                    data: "hi".to_string(),
                },
            )
            .await;

        assert!(result.is_err());
    }
}
