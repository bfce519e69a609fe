//! Lock-free worker pool metrics: totals, current counts by state, peak
//! worker count, peak queue depth, running averages of wait/processing time.
//!
//! Mirrors [`crate::mailbox::metrics::AtomicMetrics`]'s lock-free counter
//! idiom, extended with running averages for wait and processing time.

// Layer 1: Standard library imports
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

// Layer 2: Third-party crate imports
use serde::Serialize;

// Layer 3: Internal module imports
// (none)

/// Point-in-time snapshot of [`WorkerPoolMetrics`], serializable for a pull
/// metrics API.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerPoolMetricsSnapshot {
    /// Total tasks ever placed on the queue.
    pub queued_total: u64,
    /// Total tasks that completed successfully.
    pub processed_total: u64,
    /// Total tasks that ended in `TaskTimeout` or `WorkerFailed`.
    pub failed_total: u64,
    /// Number of tasks currently waiting in the queue.
    pub current_queue_depth: usize,
    /// Number of workers currently tracked by the pool.
    pub current_worker_count: usize,
    /// Highest `current_worker_count` ever observed.
    pub peak_worker_count: usize,
    /// Highest `current_queue_depth` ever observed.
    pub peak_queue_depth: usize,
    /// Running average time a task spent queued before dispatch, in
    /// microseconds.
    pub avg_wait_micros: u64,
    /// Running average task execution time, in microseconds.
    pub avg_processing_micros: u64,
}

/// Lock-free atomic metrics recorder for a [`super::WorkerPool`].
#[derive(Debug, Default)]
pub struct WorkerPoolMetrics {
    queued_total: AtomicU64,
    processed_total: AtomicU64,
    failed_total: AtomicU64,
    current_queue_depth: AtomicUsize,
    current_worker_count: AtomicUsize,
    peak_worker_count: AtomicUsize,
    peak_queue_depth: AtomicUsize,
    wait_micros_sum: AtomicU64,
    wait_samples: AtomicU64,
    processing_micros_sum: AtomicU64,
    processing_samples: AtomicU64,
}

impl WorkerPoolMetrics {
    /// Create a new, zeroed metrics recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a task being placed on the queue.
    pub fn record_queued(&self) {
        self.queued_total.fetch_add(1, Ordering::Relaxed);
        let depth = self.current_queue_depth.fetch_add(1, Ordering::Relaxed) + 1;
        Self::raise_peak(&self.peak_queue_depth, depth);
    }

    /// Record a queued task being picked up for dispatch (leaving the
    /// queue), along with how long it waited.
    pub fn record_dequeued(&self, wait_micros: u64) {
        self.current_queue_depth.fetch_sub(1, Ordering::Relaxed);
        self.wait_micros_sum
            .fetch_add(wait_micros, Ordering::Relaxed);
        self.wait_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task completing successfully, with its processing duration.
    pub fn record_processed(&self, processing_micros: u64) {
        self.processed_total.fetch_add(1, Ordering::Relaxed);
        self.processing_micros_sum
            .fetch_add(processing_micros, Ordering::Relaxed);
        self.processing_samples.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a task failing (timeout or worker failure).
    pub fn record_failed(&self) {
        self.failed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the current worker count after a spawn or termination.
    pub fn set_worker_count(&self, count: usize) {
        self.current_worker_count.store(count, Ordering::Relaxed);
        Self::raise_peak(&self.peak_worker_count, count);
    }

    fn raise_peak(peak: &AtomicUsize, candidate: usize) {
        let mut current = peak.load(Ordering::Relaxed);
        while candidate > current {
            match peak.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> WorkerPoolMetricsSnapshot {
        let wait_samples = self.wait_samples.load(Ordering::Relaxed);
        let avg_wait_micros = if wait_samples == 0 {
            0
        } else {
            self.wait_micros_sum.load(Ordering::Relaxed) / wait_samples
        };

        let processing_samples = self.processing_samples.load(Ordering::Relaxed);
        let avg_processing_micros = if processing_samples == 0 {
            0
        } else {
            self.processing_micros_sum.load(Ordering::Relaxed) / processing_samples
        };

        WorkerPoolMetricsSnapshot {
            queued_total: self.queued_total.load(Ordering::Relaxed),
            processed_total: self.processed_total.load(Ordering::Relaxed),
            failed_total: self.failed_total.load(Ordering::Relaxed),
            current_queue_depth: self.current_queue_depth.load(Ordering::Relaxed),
            current_worker_count: self.current_worker_count.load(Ordering::Relaxed),
            peak_worker_count: self.peak_worker_count.load(Ordering::Relaxed),
            peak_queue_depth: self.peak_queue_depth.load(Ordering::Relaxed),
            avg_wait_micros,
            avg_processing_micros,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_metrics_are_zeroed() {
        let metrics = WorkerPoolMetrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.queued_total, 0);
        assert_eq!(snap.avg_wait_micros, 0);
        assert_eq!(snap.avg_processing_micros, 0);
    }

    #[test]
    fn queue_depth_tracks_enqueue_and_dequeue() {
        let metrics = WorkerPoolMetrics::new();
        metrics.record_queued();
        metrics.record_queued();
        assert_eq!(metrics.snapshot().current_queue_depth, 2);

        metrics.record_dequeued(500);
        assert_eq!(metrics.snapshot().current_queue_depth, 1);
        assert_eq!(metrics.snapshot().avg_wait_micros, 500);
    }

    #[test]
    fn peak_queue_depth_holds_historical_max() {
        let metrics = WorkerPoolMetrics::new();
        metrics.record_queued();
        metrics.record_queued();
        metrics.record_dequeued(0);
        metrics.record_dequeued(0);

        assert_eq!(metrics.snapshot().current_queue_depth, 0);
        assert_eq!(metrics.snapshot().peak_queue_depth, 2);
    }

    #[test]
    fn peak_worker_count_holds_historical_max() {
        let metrics = WorkerPoolMetrics::new();
        metrics.set_worker_count(4);
        metrics.set_worker_count(2);

        assert_eq!(metrics.snapshot().current_worker_count, 2);
        assert_eq!(metrics.snapshot().peak_worker_count, 4);
    }

    #[test]
    fn processing_average_updates_across_samples() {
        let metrics = WorkerPoolMetrics::new();
        metrics.record_processed(100);
        metrics.record_processed(300);
        assert_eq!(metrics.snapshot().avg_processing_micros, 200);
        assert_eq!(metrics.snapshot().processed_total, 2);
    }

    #[test]
    fn failed_total_increments() {
        let metrics = WorkerPoolMetrics::new();
        metrics.record_failed();
        metrics.record_failed();
        assert_eq!(metrics.snapshot().failed_total, 2);
    }
}
