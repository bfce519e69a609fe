//! Worker pool error types.

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use thiserror::Error;

// Layer 3: Internal
use super::types::TaskId;

/// Errors produced by worker pool operations.
///
/// Follows the canonical structured-error pattern used throughout the
/// crate (see [`crate::supervisor::SupervisorError`]).
#[derive(Error, Debug)]
pub enum WorkerPoolError {
    /// A task's timeout elapsed before a worker produced a result.
    #[error("task {0} timed out")]
    TaskTimeout(TaskId),

    /// The worker executing a task failed (panicked or returned an error);
    /// all of its in-flight tasks are rejected with this variant.
    #[error("worker failed while executing task {0}")]
    WorkerFailed(TaskId),

    /// A bounded queue rejected a submission because it is at capacity.
    #[error("task queue is full (capacity {capacity})")]
    QueueFull {
        /// Configured queue capacity.
        capacity: usize,
    },

    /// `cancelTask` was called with an id that is not queued or in flight.
    #[error("task {0} not found")]
    TaskNotFound(TaskId),

    /// The task was cancelled via `cancelTask` (or an expired `submitTask`
    /// timeout abandoning it) before it produced a result.
    #[error("task {0} was cancelled")]
    Cancelled(TaskId),

    /// The pool is shutting down and no longer accepts new tasks.
    #[error("worker pool is shutting down")]
    ShuttingDown,

    /// Waiting for the pool's graceful shutdown exceeded its timeout.
    #[error("worker pool shutdown timed out")]
    ShutdownTimeout,
}

impl WorkerPoolError {
    /// Whether retrying the same submission might succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerPoolError::TaskTimeout(_) | WorkerPoolError::QueueFull { .. }
        )
    }

    /// Whether the pool itself is unusable after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            WorkerPoolError::ShuttingDown | WorkerPoolError::ShutdownTimeout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_full_display() {
        let err = WorkerPoolError::QueueFull { capacity: 10 };
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn task_timeout_is_retryable() {
        let err = WorkerPoolError::TaskTimeout(TaskId::new());
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
    }

    #[test]
    fn shutting_down_is_fatal() {
        let err = WorkerPoolError::ShuttingDown;
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
    }

    #[test]
    fn worker_failed_display_contains_task_id() {
        let id = TaskId::new();
        let err = WorkerPoolError::WorkerFailed(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
