//! Shared-pool dispatcher: places tasks onto the ambient multi-thread Tokio
//! runtime, the same strategy the actor cell loop already uses directly via
//! `tokio::spawn`.

// Layer 1: Standard library imports
use std::future::Future;

// Layer 2: Third-party crate imports
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::traits::Dispatcher;

/// A fixed number of executor threads (the Tokio runtime's own worker pool)
/// claim dispatch turns from any ready mailbox (§4.2 "Shared pool").
#[derive(Debug, Clone, Copy, Default)]
pub struct SharedPoolDispatcher;

impl SharedPoolDispatcher {
    /// Create a new shared-pool dispatcher. Zero-sized; spawning through it
    /// is exactly `tokio::spawn`.
    pub fn new() -> Self {
        Self
    }
}

impl Dispatcher for SharedPoolDispatcher {
    fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::task::spawn(future)
    }
}
