//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for building
//! actor systems with airssys-rt. Import this module to get started quickly:
//!
//! ```rust
//! use airssys_rt::prelude::*;
//! ```
//!
//! # What's Included
//!
//! ## Core Actor System
//! - [`Actor`] - Core trait for actors
//! - [`ActorContext`] - Actor execution context
//! - [`ActorLifecycle`] - Actor lifecycle tracking
//! - [`ActorState`] - Lifecycle state enum
//! - [`ErrorAction`] - Supervision decision enum
//!
//! ## Messaging
//! - [`Message`] - Core trait for messages
//! - [`MessageEnvelope`] - Message wrapper with metadata
//! - [`MessagePriority`] - Priority levels (High, Normal, Low)
//!
//! ## Mailbox
//! - [`BoundedMailbox`] - Capacity-limited mailbox
//! - [`UnboundedMailbox`] - Unlimited capacity mailbox
//! - [`BackpressureStrategy`] - Flow control strategies
//! - [`MailboxReceiver`] - Trait for receiving messages
//! - [`MailboxSender`] - Trait for sending messages
//!
//! ## Message Broker
//! - [`MessageBroker`] - Core routing trait
//! - [`InMemoryMessageBroker`] - Default broker implementation
//!
//! ## Supervision
//! - [`Child`] - Trait for supervised entities
//! - [`Supervisor`] - Supervisor trait
//! - [`SupervisorNode`] - Supervisor implementation
//! - [`OneForOne`] - Independent child strategy
//! - [`OneForAll`] - Restart all strategy
//! - [`RestForOne`] - Restart following strategy
//! - [`RestartPolicy`] - When to restart (Permanent, Transient, Temporary)
//! - [`ShutdownPolicy`] - How to stop (Graceful, Immediate, Infinity)
//! - [`ChildSpec`] - Child specification
//! - [`ChildHealth`] - Health status enum
//! - [`ChildState`] - Child lifecycle state
//!
//! ## Monitoring
//! - [`Monitor`] - Core monitoring trait
//! - [`InMemoryMonitor`] - Production monitor
//! - [`NoopMonitor`] - Zero-overhead no-op monitor
//! - [`MonitoringEvent`] - Trait for events
//! - [`EventSeverity`] - Event severity levels
//! - [`ActorEvent`] - Actor lifecycle events
//! - [`SupervisionEvent`] - Supervision events
//! - [`MailboxEvent`] - Mailbox events
//! - [`BrokerEvent`] - Broker events
//!
//! ## Tracing & Logging
//! - [`TraceContext`] - Correlates a causal chain across hops
//! - [`TraceSpan`] - A single recorded hop, with kind/status
//! - [`SpanExporter`] - Pluggable destination for finished spans
//! - [`LogRecord`] - A structured, trace-correlated log line
//! - [`LogSink`] - Pluggable destination for log records
//!
//! ## System
//! - [`SystemConfig`] - Actor system configuration
//!
//! ## Utilities
//! - [`ActorAddress`] - Actor address type
//! - [`ActorId`] - Actor identifier
//! - [`MessageId`] - Message identifier
//!
//! ## Worker Pool
//! - [`WorkerPool`] - CPU-bound worker pool with priority scheduling
//! - [`SubmitOptions`] - Per-submission priority and timeout
//! - [`TaskId`] - Submitted task identifier
//!
//! ## Transport & Cluster
//! - [`Transport`] - Pluggable remote message carrier
//! - [`HttpTransport`] - HTTP/SSE transport provider
//! - [`ClusterManager`] - Node membership and failure detection
//! - [`NodeStatus`] - `Joining`/`Active`/`Suspected`/`Dead`
//!
//! # Example
//!
//! ```rust,ignore
//! use airssys_rt::prelude::*;
//! use async_trait::async_trait;
//!
//! #[derive(Debug, Clone)]
//! struct MyMessage {
//!     data: String,
//! }
//!
//! impl Message for MyMessage {
//!     const MESSAGE_TYPE: &'static str = "my_message";
//! }
//!
//! struct MyActor {
//!     count: u64,
//! }
//!
//! #[async_trait]
//! impl Actor for MyActor {
//!     type Message = MyMessage;
//!     type Error = std::io::Error;
//!     
//!     async fn handle_message<B: MessageBroker<Self::Message>>(
//!         &mut self,
//!         msg: Self::Message,
//!         ctx: &mut ActorContext<Self::Message, B>,
//!     ) -> Result<(), Self::Error> {
//!         self.count += 1;
//!         println!("Received: {}", msg.data);
//!         Ok(())
//!     }
//! }
//! ```

// Core actor system
pub use crate::actor::{Actor, ActorContext, ActorLifecycle, ActorState, ErrorAction};

// Messaging
pub use crate::message::{Message, MessageEnvelope, MessagePriority};

// Mailbox
pub use crate::mailbox::{
    BackpressureStrategy, BoundedMailbox, BoundedMailboxSender, MailboxReceiver, MailboxSender,
    UnboundedMailbox, UnboundedMailboxSender,
};

// Message broker
pub use crate::broker::{InMemoryMessageBroker, MessageBroker};

// Supervision
pub use crate::supervisor::{
    Child, ChildHealth, ChildId, ChildSpec, ChildState, OneForAll, OneForOne, RestForOne,
    RestartPolicy, ShutdownPolicy, Supervisor, SupervisorNode,
};

// Monitoring
pub use crate::monitoring::{
    ActorEvent, BrokerEvent, EventSeverity, InMemoryMonitor, MailboxEvent, Monitor,
    MonitoringEvent, NoopMonitor, SupervisionEvent,
};

// Tracing & logging
pub use crate::monitoring::{LogRecord, LogSink, SpanExporter, TraceContext, TraceSpan};

// Routing
pub use crate::router::{Router, RoutingPolicy};

// System
pub use crate::system::SystemConfig;

// Utilities
pub use crate::util::{ActorAddress, ActorId, MessageId, NodeId, RemoteActorAddress};

// Worker pool
pub use crate::worker::{SubmitOptions, TaskId, WorkerId, WorkerPool, WorkerPoolConfig, WorkerPoolError};

// Transport & cluster
pub use crate::cluster::{ClusterConfig, ClusterManager, NodeInfo, NodeStatus};
pub use crate::transport::{HttpTransport, Transport, TransportConfig};
