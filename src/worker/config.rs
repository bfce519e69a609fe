//! Worker pool configuration with sensible defaults.

// Layer 1: Standard library
use std::time::Duration;

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default minimum number of workers kept alive even when idle.
pub const DEFAULT_MIN_WORKERS: usize = 1;

/// Default maximum number of workers the pool may spawn.
pub const DEFAULT_MAX_WORKERS: usize = 16;

/// Default duration a worker may sit `Idle` before being terminated
/// (while `workers > min_workers`).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval for the periodic maintenance sweep.
pub const DEFAULT_MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5);

/// Default per-task timeout applied when a submission does not specify one.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default grace window a cancelled worker has to acknowledge abandonment
/// before being forcefully terminated and replaced.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_millis(500);

/// Configuration for a [`WorkerPool`](super::WorkerPool).
///
/// Mirrors [`crate::system::SystemConfig`]'s builder-with-validation shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Minimum number of workers the pool keeps alive at all times.
    pub min_workers: usize,

    /// Maximum number of workers the pool may spawn.
    pub max_workers: usize,

    /// How long an idle worker survives before being terminated (subject to
    /// `min_workers`).
    #[serde(with = "crate::util::duration_serde")]
    pub idle_timeout: Duration,

    /// Interval between periodic maintenance sweeps (idle reclamation and
    /// autoscaling).
    #[serde(with = "crate::util::duration_serde")]
    pub maintenance_interval: Duration,

    /// Default per-task timeout used when a submission does not override it.
    #[serde(with = "crate::util::duration_serde")]
    pub default_task_timeout: Duration,

    /// Grace period given to a worker to acknowledge a cancellation request
    /// before it is terminated and replaced.
    #[serde(with = "crate::util::duration_serde")]
    pub cancel_grace: Duration,

    /// Bounded queue capacity; `None` means unbounded (`submitTask` never
    /// rejects with `QueueFull`).
    pub queue_capacity: Option<usize>,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            min_workers: DEFAULT_MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            maintenance_interval: DEFAULT_MAINTENANCE_INTERVAL,
            default_task_timeout: DEFAULT_TASK_TIMEOUT,
            cancel_grace: DEFAULT_CANCEL_GRACE,
            queue_capacity: None,
        }
    }
}

impl WorkerPoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WorkerPoolConfigBuilder {
        WorkerPoolConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 {
            return Err("max_workers must be > 0".to_string());
        }
        if self.min_workers > self.max_workers {
            return Err("min_workers must be <= max_workers".to_string());
        }
        if let Some(capacity) = self.queue_capacity {
            if capacity == 0 {
                return Err("queue_capacity must be > 0 when set".to_string());
            }
        }
        Ok(())
    }

    /// Target worker count for the autoscaling step: `ceil(1.5 * active)`,
    /// capped at `max_workers`.
    pub fn scale_up_target(&self, active: usize) -> usize {
        let scaled = active.saturating_mul(3).div_ceil(2);
        scaled.clamp(self.min_workers, self.max_workers)
    }
}

/// Builder for [`WorkerPoolConfig`] with a fluent API.
#[derive(Debug, Default)]
pub struct WorkerPoolConfigBuilder {
    config: WorkerPoolConfig,
}

impl WorkerPoolConfigBuilder {
    /// Set the minimum number of workers kept alive at all times.
    pub fn with_min_workers(mut self, min_workers: usize) -> Self {
        self.config.min_workers = min_workers;
        self
    }

    /// Set the maximum number of workers the pool may spawn.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.config.max_workers = max_workers;
        self
    }

    /// Set the idle timeout before an above-minimum worker is terminated.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Set the periodic maintenance sweep interval.
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.config.maintenance_interval = interval;
        self
    }

    /// Set the default per-task timeout.
    pub fn with_default_task_timeout(mut self, timeout: Duration) -> Self {
        self.config.default_task_timeout = timeout;
        self
    }

    /// Set the cancellation acknowledgement grace period.
    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.config.cancel_grace = grace;
        self
    }

    /// Bound the task queue to `capacity`, enabling `QueueFull` backpressure.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = Some(capacity);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<WorkerPoolConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
