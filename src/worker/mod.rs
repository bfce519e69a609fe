//! CPU-bound worker pool with priority scheduling, backpressure, and
//! autoscaling.
//!
//! A [`WorkerPool`] runs a single CPU-bound function `F: Fn(In) -> Out`
//! across a bounded or unbounded set of workers (`spawn_blocking` tasks),
//! scheduling submissions from a priority-ordered queue. It exists alongside
//! the actor system's async dispatch (see [`crate::actor`]) for work that
//! would otherwise block a cell's message loop.

// Module declarations
pub mod config;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod task;
pub mod types;

// Re-exports for convenient access
pub use config::{WorkerPoolConfig, WorkerPoolConfigBuilder};
pub use error::WorkerPoolError;
pub use metrics::{WorkerPoolMetrics, WorkerPoolMetricsSnapshot};
pub use pool::WorkerPool;
pub use task::SubmitOptions;
pub use types::{TaskId, WorkerId, WorkerState};
