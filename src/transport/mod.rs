//! Remote transport and wire-level RPCs: `SpawnActor`, `StopActor`,
//! `SendMessage`, `WatchActor`.
//!
//! The local actor system never talks to the network directly; a
//! [`Transport`] implementation, chosen at system-boot time, carries
//! envelopes between nodes and a [`RemoteActorHost`] answers the inbound
//! side of the RPCs on behalf of whatever is actually hosting actors
//! locally.

// Module declarations
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod traits;

// Re-exports for convenient access
pub use config::TransportConfig;
pub use envelope::WireEnvelope;
pub use error::TransportError;
pub use http::HttpTransport;
pub use traits::{LifecycleEvent, LifecycleEventKind, RemoteActorHost, Transport};
