//! Identifiers and state types for the worker pool.

// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a submitted task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new unique task id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a pool worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkerId(Uuid);

impl WorkerId {
    /// Creates a new unique worker id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WorkerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a single pool worker.
///
/// # State Transitions
///
/// ```text
/// Starting -> Idle -> Busy -> Idle
///                       |
///                       +--> Error --> Terminated
///              Idle -----------------> Terminated (idle timeout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerState {
    /// Worker task has been spawned but has not yet entered its run loop.
    Starting,
    /// Worker is waiting for an assigned task.
    Idle,
    /// Worker is currently executing a task.
    Busy,
    /// Worker's last task ended in an error; it is being replaced.
    Error,
    /// Worker has exited and is no longer tracked by the pool.
    Terminated,
}

impl WorkerState {
    /// Whether a worker in this state may be assigned a new task.
    pub fn is_assignable(&self) -> bool {
        matches!(self, WorkerState::Idle)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkerState::Terminated)
    }
}
