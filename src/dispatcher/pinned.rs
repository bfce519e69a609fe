//! Pinned dispatcher: every task placed through a given instance runs on one
//! dedicated OS thread, useful for UI or other affinity-sensitive workloads
//! (§4.2 "Pinned").

// Layer 1: Standard library imports
use std::future::Future;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

// Layer 2: Third-party crate imports
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use super::traits::Dispatcher;

struct PinnedDispatcherInner {
    handle: Handle,
    // Kept alive for the dispatcher's lifetime; the thread itself runs
    // `block_on(pending())` forever, so this is never joined during normal
    // operation. Dropping the dispatcher drops this, but the detached OS
    // thread outlives it (mirrors `spawn_blocking`'s abandon-on-drop shape
    // used by the worker pool).
    _thread: thread::JoinHandle<()>,
}

/// Dedicates a single-threaded Tokio runtime, running on its own OS thread,
/// to every task spawned through this dispatcher instance.
#[derive(Clone)]
pub struct PinnedDispatcher {
    inner: Arc<PinnedDispatcherInner>,
}

impl PinnedDispatcher {
    /// Spawn the dedicated OS thread and its single-threaded runtime.
    ///
    /// # Panics
    ///
    /// Panics if the runtime fails to build or the thread fails to start —
    /// both are process-setup failures, not recoverable request-time errors.
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let (ready_tx, ready_rx) = mpsc::channel::<Handle>();

        let thread = thread::Builder::new()
            .name("airssys-rt-pinned".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed to build pinned dispatcher runtime");
                ready_tx
                    .send(runtime.handle().clone())
                    .expect("pinned dispatcher handshake receiver dropped");
                runtime.block_on(std::future::pending::<()>());
            })
            .expect("failed to spawn pinned dispatcher thread");

        let handle = ready_rx
            .recv()
            .expect("pinned dispatcher thread exited before handshake");

        Self {
            inner: Arc::new(PinnedDispatcherInner {
                handle,
                _thread: thread,
            }),
        }
    }
}

impl Default for PinnedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher for PinnedDispatcher {
    fn spawn<Fut>(&self, future: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.inner.handle.spawn(future)
    }
}
