//! Internal task representation and the priority-ordered queue ordering.

// Layer 1: Standard library imports
use std::cmp::Ordering;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

// Layer 3: Internal module imports
use crate::message::MessagePriority;

use super::error::WorkerPoolError;
use super::types::{TaskId, WorkerId};

/// Caller-supplied options for [`super::WorkerPool::submit`].
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Priority used for queue ordering; higher priority tasks are placed
    /// ahead of lower-priority ones.
    pub priority: MessagePriority,

    /// Per-task timeout; defaults to the pool's
    /// [`crate::worker::WorkerPoolConfig::default_task_timeout`] when `None`.
    pub timeout: Option<Duration>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            priority: MessagePriority::Normal,
            timeout: None,
        }
    }
}

/// A task sitting in the pool's priority queue, or being run by a worker.
pub(super) struct QueuedTask<In, Out> {
    pub(super) id: TaskId,
    pub(super) input: In,
    pub(super) priority: MessagePriority,
    pub(super) seq: u64,
    pub(super) queued_at: DateTime<Utc>,
    pub(super) reply_tx: oneshot::Sender<Result<Out, WorkerPoolError>>,
}

impl<In, Out> PartialEq for QueuedTask<In, Out> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<In, Out> Eq for QueuedTask<In, Out> {}

impl<In, Out> PartialOrd for QueuedTask<In, Out> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<In, Out> Ord for QueuedTask<In, Out> {
    /// Higher priority sorts greater (so `BinaryHeap::pop` returns it
    /// first); within equal priority, the lower sequence number (earlier
    /// submission) sorts greater, giving FIFO ordering among equal
    /// priorities.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Where a live task currently lives, tracked so `cancelTask` can find it.
pub(super) enum PendingLocation {
    Queued,
    Dispatched(WorkerId),
}

/// Commands sent from the pool's scheduler to a worker's run loop.
pub(super) enum WorkerCommand<In, Out> {
    Run(QueuedTask<In, Out>),
    Cancel(TaskId),
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(id: TaskId, priority: MessagePriority, seq: u64) -> QueuedTask<(), ()> {
        let (tx, _rx) = oneshot::channel();
        QueuedTask {
            id,
            input: (),
            priority,
            seq,
            queued_at: Utc::now(),
            reply_tx: tx,
        }
    }

    #[test]
    fn higher_priority_sorts_greater() {
        let low = queued(TaskId::new(), MessagePriority::Low, 0);
        let high = queued(TaskId::new(), MessagePriority::High, 1);
        assert!(high > low);
    }

    #[test]
    fn equal_priority_is_fifo_by_sequence() {
        let first = queued(TaskId::new(), MessagePriority::Normal, 0);
        let second = queued(TaskId::new(), MessagePriority::Normal, 1);
        // Earlier sequence number must sort greater so it pops first.
        assert!(first > second);
    }

    #[test]
    fn binary_heap_pops_priority_then_fifo() {
        use std::collections::BinaryHeap;

        let mut heap = BinaryHeap::new();
        heap.push(queued(TaskId::new(), MessagePriority::Normal, 0));
        heap.push(queued(TaskId::new(), MessagePriority::Critical, 1));
        heap.push(queued(TaskId::new(), MessagePriority::Normal, 2));

        assert_eq!(heap.pop().unwrap().priority, MessagePriority::Critical);
        let next = heap.pop().unwrap();
        assert_eq!(next.priority, MessagePriority::Normal);
        assert_eq!(next.seq, 0);
    }
}
