//! The [`Dispatcher`] trait: a strategy for where a cell's message loop runs.

// Layer 1: Standard library imports
use std::future::Future;

// Layer 2: Third-party crate imports
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
// (none)

/// Places a cell's (or any long-running task's) message loop onto an
/// execution substrate (§4.2).
///
/// The crate's actor cells are already modeled as one `tokio::task` per cell
/// draining its mailbox in a loop; `Dispatcher` abstracts *where* that task
/// runs, not *how* it drains its mailbox. Both provided implementations
/// return a plain `tokio::task::JoinHandle<()>`, so callers abort or await a
/// dispatched task the same way regardless of strategy.
pub trait Dispatcher: Clone + Send + Sync + 'static {
    /// Place `future` onto this dispatcher's execution substrate.
    fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static;
}
