//! CPU-bound worker pool with a priority task queue and autoscaling.
//!
//! Generic over a single work function `F: Fn(In) -> Out`, in keeping with
//! the crate's preference for generic constraints over `dyn` dispatch
//! (§6.2): a pool executes one homogeneous kind of CPU-bound work.
//! Heterogeneous task types are modeled by making `In` an enum and matching
//! inside `F`, or by running one pool per task kind.

// Layer 1: Standard library imports
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

// Layer 3: Internal module imports
use super::config::WorkerPoolConfig;
use super::error::WorkerPoolError;
use super::metrics::{WorkerPoolMetrics, WorkerPoolMetricsSnapshot};
use super::task::{PendingLocation, QueuedTask, SubmitOptions, WorkerCommand};
use super::types::{TaskId, WorkerId, WorkerState};

struct WorkerHandle<In, Out> {
    state: Arc<RwLock<WorkerState>>,
    command_tx: mpsc::UnboundedSender<WorkerCommand<In, Out>>,
    last_active_at: Arc<RwLock<chrono::DateTime<Utc>>>,
    join_handle: JoinHandle<()>,
}

/// Whether the pool accepts new submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PoolState {
    Running,
    ShuttingDown,
}

struct PoolInner<F, In, Out> {
    config: WorkerPoolConfig,
    work_fn: F,
    state: RwLock<PoolState>,
    queue: Mutex<BinaryHeap<QueuedTask<In, Out>>>,
    pending: DashMap<TaskId, PendingLocation>,
    workers: DashMap<WorkerId, WorkerHandle<In, Out>>,
    metrics: WorkerPoolMetrics,
    seq: AtomicU64,
}

/// A pool of workers executing a single CPU-bound function, fed by a
/// priority-ordered task queue with autoscaling and backpressure.
///
/// # Examples
///
/// ```rust
/// use airssys_rt::worker::{WorkerPool, WorkerPoolConfig, SubmitOptions};
///
/// # #[tokio::main]
/// # async fn main() {
/// let pool = WorkerPool::new(WorkerPoolConfig::default(), |n: u64| n * n);
///
/// let result = pool.submit(7, SubmitOptions::default()).await.unwrap();
/// assert_eq!(result, 49);
///
/// pool.shutdown().await;
/// # }
/// ```
pub struct WorkerPool<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    inner: Arc<PoolInner<F, In, Out>>,
    maintenance_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
    maintenance_shutdown: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl<F, In, Out> Clone for WorkerPool<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            maintenance_handle: Arc::clone(&self.maintenance_handle),
            maintenance_shutdown: Arc::clone(&self.maintenance_shutdown),
        }
    }
}

impl<F, In, Out> WorkerPool<F, In, Out>
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    /// Create a new pool. No workers are spawned until the first task is
    /// submitted or the maintenance sweep decides to scale up.
    pub fn new(config: WorkerPoolConfig, work_fn: F) -> Self {
        let inner = Arc::new(PoolInner {
            config,
            work_fn,
            state: RwLock::new(PoolState::Running),
            queue: Mutex::new(BinaryHeap::new()),
            pending: DashMap::new(),
            workers: DashMap::new(),
            metrics: WorkerPoolMetrics::new(),
            seq: AtomicU64::new(0),
        });

        let pool = Self {
            inner,
            maintenance_handle: Arc::new(Mutex::new(None)),
            maintenance_shutdown: Arc::new(Mutex::new(None)),
        };
        pool.spawn_maintenance();
        pool
    }

    /// Current metrics snapshot: totals, current counts, peaks, running
    /// averages.
    pub fn get_metrics(&self) -> WorkerPoolMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Number of workers currently tracked by the pool (any state).
    pub fn worker_count(&self) -> usize {
        self.inner.workers.len()
    }

    /// Submit a task; never blocks the caller. Resolves once a worker
    /// produces a result, the timeout elapses (`TaskTimeout`), or the task
    /// is cancelled (`Cancelled`).
    ///
    /// # Errors
    ///
    /// Returns `ShuttingDown` if the pool is no longer accepting work, or
    /// `QueueFull` if a bounded queue is saturated.
    pub async fn submit(&self, input: In, opts: SubmitOptions) -> Result<Out, WorkerPoolError> {
        if *self.inner.state.read() == PoolState::ShuttingDown {
            return Err(WorkerPoolError::ShuttingDown);
        }

        if let Some(capacity) = self.inner.config.queue_capacity {
            if self.inner.metrics.snapshot().current_queue_depth >= capacity {
                return Err(WorkerPoolError::QueueFull { capacity });
            }
        }

        let id = TaskId::new();
        let timeout = opts.timeout.unwrap_or(self.inner.config.default_task_timeout);
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();

        {
            let mut queue = self.inner.queue.lock();
            queue.push(QueuedTask {
                id,
                input,
                priority: opts.priority,
                seq,
                queued_at: Utc::now(),
                reply_tx,
            });
        }
        self.inner.pending.insert(id, PendingLocation::Queued);
        self.inner.metrics.record_queued();
        self.try_dispatch();

        match tokio::time::timeout(timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_recv_dropped)) => Err(WorkerPoolError::Cancelled(id)),
            Err(_elapsed) => {
                let _ = self.cancel_task(id).await;
                self.inner.metrics.record_failed();
                Err(WorkerPoolError::TaskTimeout(id))
            }
        }
    }

    /// Remove a task from the queue if still pending, or notify its worker
    /// to abandon it if already dispatched.
    pub async fn cancel_task(&self, task_id: TaskId) -> Result<(), WorkerPoolError> {
        match self.inner.pending.remove(&task_id) {
            None => Err(WorkerPoolError::TaskNotFound(task_id)),
            Some((_, PendingLocation::Queued)) => {
                let mut queue = self.inner.queue.lock();
                queue.retain(|task| task.id != task_id);
                Ok(())
            }
            Some((_, PendingLocation::Dispatched(worker_id))) => {
                if let Some(handle) = self.inner.workers.get(&worker_id) {
                    let _ = handle.command_tx.send(WorkerCommand::Cancel(task_id));
                }
                Ok(())
            }
        }
    }

    /// Stop accepting new tasks and terminate all workers. In-flight tasks
    /// are abandoned (their futures resolve with `Cancelled` or
    /// `WorkerFailed`).
    pub async fn shutdown(&self) {
        *self.inner.state.write() = PoolState::ShuttingDown;

        if let Some(tx) = self.maintenance_shutdown.lock().take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.maintenance_handle.lock().take() {
            let _ = handle.await;
        }

        let worker_ids: Vec<WorkerId> = self.inner.workers.iter().map(|e| *e.key()).collect();
        for worker_id in worker_ids {
            if let Some((_, handle)) = self.inner.workers.remove(&worker_id) {
                let _ = handle.command_tx.send(WorkerCommand::Shutdown);
                handle.join_handle.abort();
            }
        }
        self.inner.metrics.set_worker_count(0);

        let stranded: Vec<_> = self.inner.queue.lock().drain().collect();
        for task in stranded {
            self.inner.pending.remove(&task.id);
            let _ = task.reply_tx.send(Err(WorkerPoolError::Cancelled(task.id)));
        }
    }

    fn spawn_maintenance(&self) {
        let inner = Arc::clone(&self.inner);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
        let interval_duration = inner.config.maintenance_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval_duration);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        run_maintenance_sweep(&inner);
                    }
                }
            }
        });

        *self.maintenance_handle.lock() = Some(handle);
        *self.maintenance_shutdown.lock() = Some(shutdown_tx);
    }

    /// Claim an `Idle` worker (flipping it to `Busy` under its own lock so
    /// concurrent dispatchers cannot double-assign it), spawn a fresh one
    /// if below `max_workers`, or give up if at capacity.
    fn try_dispatch(&self) {
        try_dispatch_inner(&self.inner);
    }
}

fn claim_idle_worker<In, Out>(workers: &DashMap<WorkerId, WorkerHandle<In, Out>>) -> Option<WorkerId> {
    for entry in workers.iter() {
        let mut state = entry.value().state.write();
        if *state == WorkerState::Idle {
            *state = WorkerState::Busy;
            return Some(*entry.key());
        }
    }
    None
}

fn try_dispatch_inner<F, In, Out>(inner: &Arc<PoolInner<F, In, Out>>)
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    loop {
        if inner.queue.lock().is_empty() {
            break;
        }

        let worker_id = match claim_idle_worker(&inner.workers) {
            Some(id) => id,
            None if inner.workers.len() < inner.config.max_workers => {
                spawn_worker(inner);
                continue;
            }
            None => break,
        };

        let task = match inner.queue.lock().pop() {
            Some(task) => task,
            None => {
                if let Some(handle) = inner.workers.get(&worker_id) {
                    *handle.state.write() = WorkerState::Idle;
                }
                break;
            }
        };

        let wait_micros = (Utc::now() - task.queued_at)
            .num_microseconds()
            .unwrap_or(0)
            .max(0) as u64;
        inner.metrics.record_dequeued(wait_micros);
        inner.pending.insert(task.id, PendingLocation::Dispatched(worker_id));

        if let Some(handle) = inner.workers.get(&worker_id) {
            let _ = handle.command_tx.send(WorkerCommand::Run(task));
        }
    }
}

fn spawn_worker<F, In, Out>(inner: &Arc<PoolInner<F, In, Out>>) -> WorkerId
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    let worker_id = WorkerId::new();
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let state = Arc::new(RwLock::new(WorkerState::Idle));
    let last_active_at = Arc::new(RwLock::new(Utc::now()));

    let join_handle = tokio::spawn(run_worker(
        worker_id,
        Arc::clone(inner),
        command_rx,
        Arc::clone(&state),
        Arc::clone(&last_active_at),
    ));

    inner.workers.insert(
        worker_id,
        WorkerHandle {
            state,
            command_tx,
            last_active_at,
            join_handle,
        },
    );
    inner.metrics.set_worker_count(inner.workers.len());
    worker_id
}

fn terminate_worker<F, In, Out>(inner: &Arc<PoolInner<F, In, Out>>, worker_id: WorkerId)
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    if let Some((_, handle)) = inner.workers.remove(&worker_id) {
        handle.join_handle.abort();
        inner.metrics.set_worker_count(inner.workers.len());
    }
}

/// A worker's run loop: waits for `Run`/`Cancel`/`Shutdown` commands,
/// executes CPU-bound work via `spawn_blocking`, and reports back through
/// each task's reply channel.
async fn run_worker<F, In, Out>(
    worker_id: WorkerId,
    inner: Arc<PoolInner<F, In, Out>>,
    mut commands: mpsc::UnboundedReceiver<WorkerCommand<In, Out>>,
    state: Arc<RwLock<WorkerState>>,
    last_active_at: Arc<RwLock<chrono::DateTime<Utc>>>,
) where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    while let Some(command) = commands.recv().await {
        match command {
            WorkerCommand::Shutdown => break,
            WorkerCommand::Cancel(_) => {
                // Nothing in flight while idle; ignore a stray cancel.
            }
            WorkerCommand::Run(task) => {
                let task_id = task.id;
                let reply_tx = task.reply_tx;
                let input = task.input;
                let work_fn = inner.work_fn.clone();
                let started_at = Utc::now();
                debug!(%worker_id, %task_id, "worker task started");
                let join = tokio::task::spawn_blocking(move || work_fn(input));
                tokio::pin!(join);

                let outcome = tokio::select! {
                    biased;
                    cmd = commands.recv() => {
                        match cmd {
                            Some(WorkerCommand::Cancel(_)) | None => {
                                join.abort();
                                let grace = tokio::time::sleep(inner.config.cancel_grace);
                                tokio::pin!(grace);
                                tokio::select! {
                                    _ = &mut join => RunOutcome::Cancelled,
                                    _ = &mut grace => RunOutcome::Unresponsive,
                                }
                            }
                            Some(WorkerCommand::Shutdown) => {
                                join.abort();
                                RunOutcome::Cancelled
                            }
                            Some(WorkerCommand::Run(_)) => RunOutcome::Cancelled,
                        }
                    }
                    result = &mut join => RunOutcome::from(result),
                };

                inner.pending.remove(&task_id);
                *last_active_at.write() = Utc::now();

                let elapsed_us = (Utc::now() - started_at).num_microseconds().unwrap_or(0).max(0);
                match outcome {
                    RunOutcome::Completed(value) => {
                        debug!(%worker_id, %task_id, elapsed_us, "worker task completed");
                        inner.metrics.record_processed(elapsed_us as u64);
                        let _ = reply_tx.send(Ok(value));
                        *state.write() = WorkerState::Idle;
                        try_dispatch_inner(&inner);
                    }
                    RunOutcome::Failed => {
                        debug!(%worker_id, %task_id, "worker task failed");
                        inner.metrics.record_failed();
                        let _ = reply_tx.send(Err(WorkerPoolError::WorkerFailed(task_id)));
                        *state.write() = WorkerState::Error;
                        terminate_worker(&inner, worker_id);
                        return;
                    }
                    RunOutcome::Cancelled => {
                        debug!(%worker_id, %task_id, "worker task cancelled");
                        inner.metrics.record_failed();
                        let _ = reply_tx.send(Err(WorkerPoolError::Cancelled(task_id)));
                        *state.write() = WorkerState::Idle;
                        try_dispatch_inner(&inner);
                    }
                    RunOutcome::Unresponsive => {
                        debug!(%worker_id, %task_id, "worker task unresponsive, terminating worker");
                        inner.metrics.record_failed();
                        let _ = reply_tx.send(Err(WorkerPoolError::Cancelled(task_id)));
                        *state.write() = WorkerState::Terminated;
                        terminate_worker(&inner, worker_id);
                        return;
                    }
                }
            }
        }
    }

    *state.write() = WorkerState::Terminated;
    terminate_worker(&inner, worker_id);
}

enum RunOutcome<Out> {
    Completed(Out),
    Failed,
    Cancelled,
    Unresponsive,
}

impl<Out> From<Result<Out, tokio::task::JoinError>> for RunOutcome<Out> {
    fn from(result: Result<Out, tokio::task::JoinError>) -> Self {
        match result {
            Ok(value) => RunOutcome::Completed(value),
            Err(_join_error) => RunOutcome::Failed,
        }
    }
}

/// Periodic maintenance: reclaim idle-timed-out workers above
/// `min_workers`, then scale up toward `ceil(1.5 * active)` while the queue
/// is non-empty.
fn run_maintenance_sweep<F, In, Out>(inner: &Arc<PoolInner<F, In, Out>>)
where
    F: Fn(In) -> Out + Send + Sync + Clone + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    let now = Utc::now();
    let idle_timeout = inner.config.idle_timeout;

    let idle_too_long: Vec<WorkerId> = inner
        .workers
        .iter()
        .filter(|entry| {
            *entry.value().state.read() == WorkerState::Idle
                && now
                    .signed_duration_since(*entry.value().last_active_at.read())
                    .to_std()
                    .map(|elapsed| elapsed > idle_timeout)
                    .unwrap_or(false)
        })
        .map(|entry| *entry.key())
        .collect();

    for worker_id in idle_too_long {
        if inner.workers.len() <= inner.config.min_workers {
            break;
        }
        terminate_worker(inner, worker_id);
    }

    if !inner.queue.lock().is_empty() {
        let active = inner.workers.len();
        let target = inner.config.scale_up_target(active);
        while inner.workers.len() < target && inner.workers.len() < inner.config.max_workers {
            spawn_worker(inner);
        }
        try_dispatch_inner(inner);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::message::MessagePriority;

    #[tokio::test]
    async fn submit_runs_task_and_returns_result() {
        let pool = WorkerPool::new(WorkerPoolConfig::default(), |n: u64| n * 2);
        let result = pool.submit(21, SubmitOptions::default()).await.unwrap();
        assert_eq!(result, 42);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn pool_spawns_workers_up_to_max() {
        let config = WorkerPoolConfig::builder()
            .with_min_workers(0)
            .with_max_workers(4)
            .build()
            .unwrap();
        let pool = WorkerPool::new(config, |_: ()| {
            std::thread::sleep(Duration::from_millis(20));
        });

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = pool.clone();
            handles.push(tokio::spawn(
                async move { pool.submit((), SubmitOptions::default()).await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(pool.worker_count() <= 4);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn submit_times_out_when_queue_never_drains() {
        let config = WorkerPoolConfig::builder()
            .with_min_workers(0)
            .with_max_workers(1)
            .build()
            .unwrap();
        let pool = WorkerPool::new(config, |_: ()| {
            std::thread::sleep(Duration::from_millis(200));
        });

        // Occupy the single worker.
        let pool2 = pool.clone();
        let _occupier = tokio::spawn(async move {
            let _ = pool2.submit((), SubmitOptions::default()).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let opts = SubmitOptions {
            priority: MessagePriority::Normal,
            timeout: Some(Duration::from_millis(10)),
        };
        let result = pool.submit((), opts).await;
        assert!(matches!(result, Err(WorkerPoolError::TaskTimeout(_))));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn cancel_task_removes_queued_task() {
        let config = WorkerPoolConfig::builder()
            .with_min_workers(0)
            .with_max_workers(1)
            .build()
            .unwrap();
        let pool = WorkerPool::new(config, |_: ()| {
            std::thread::sleep(Duration::from_millis(100));
        });

        let pool2 = pool.clone();
        let _occupier = tokio::spawn(async move {
            let _ = pool2.submit((), SubmitOptions::default()).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // This second task sits in queue (single worker is busy).
        let pool3 = pool.clone();
        let queued = tokio::spawn(async move {
            pool3
                .submit(
                    (),
                    SubmitOptions {
                        priority: MessagePriority::Normal,
                        timeout: Some(Duration::from_secs(5)),
                    },
                )
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.get_metrics().current_queue_depth, 1);

        pool.shutdown().await;
        let result = queued.await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn submit_rejects_with_queue_full_when_bounded_and_saturated() {
        let config = WorkerPoolConfig::builder()
            .with_min_workers(0)
            .with_max_workers(1)
            .with_queue_capacity(1)
            .build()
            .unwrap();
        let pool = WorkerPool::new(config, |_: ()| {
            std::thread::sleep(Duration::from_millis(100));
        });

        let pool2 = pool.clone();
        let _occupier = tokio::spawn(async move {
            let _ = pool2.submit((), SubmitOptions::default()).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let pool3 = pool.clone();
        let _queued = tokio::spawn(async move {
            let _ = pool3
                .submit(
                    (),
                    SubmitOptions {
                        priority: MessagePriority::Normal,
                        timeout: Some(Duration::from_secs(5)),
                    },
                )
                .await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let result = pool.submit((), SubmitOptions::default()).await;
        assert!(matches!(
            result,
            Err(WorkerPoolError::QueueFull { capacity: 1 })
        ));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_rejects_further_submissions() {
        let pool = WorkerPool::new(WorkerPoolConfig::default(), |n: u64| n);
        pool.shutdown().await;

        let result = pool.submit(1, SubmitOptions::default()).await;
        assert!(matches!(result, Err(WorkerPoolError::ShuttingDown)));
    }

    #[tokio::test]
    async fn worker_failure_rejects_with_worker_failed_and_pool_recovers() {
        let config = WorkerPoolConfig::builder()
            .with_min_workers(0)
            .with_max_workers(2)
            .build()
            .unwrap();
        let pool = WorkerPool::new(config, |should_panic: bool| -> bool {
            if should_panic {
                panic!("boom");
            }
            should_panic
        });

        let failed = pool.submit(true, SubmitOptions::default()).await;
        assert!(matches!(failed, Err(WorkerPoolError::WorkerFailed(_))));

        let recovered = pool.submit(false, SubmitOptions::default()).await;
        assert_eq!(recovered.unwrap(), false);
        pool.shutdown().await;
    }
}
