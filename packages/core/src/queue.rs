//! Queue run-control, statistics and snapshot types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::job::{JobId, OwnerId};

/// Weight given to a new processing-time sample in the moving average.
pub const EMA_SAMPLE_WEIGHT: f64 = 0.3;

/// Seed for the average processing time before any job has finished.
pub const INITIAL_AVG_PROCESSING_SECS: f64 = 3.0;

/// Current run-control state of the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueState {
    /// Not processing. Jobs may still be enqueued.
    #[default]
    Idle,
    /// The processing loop pops and runs jobs.
    Running,
    /// Popping is suspended; the in-flight job (if any) still finishes.
    Paused,
}

impl QueueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueState::Idle => "idle",
            QueueState::Running => "running",
            QueueState::Paused => "paused",
        }
    }
}

impl std::fmt::Display for QueueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a start/pause/resume/stop request.
///
/// Redundant requests are not errors; they report the state the queue is
/// already in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlOutcome {
    Started,
    AlreadyRunning,
    Paused,
    AlreadyPaused,
    Resumed,
    Stopped,
    AlreadyStopped,
    /// Pause or resume was requested while the queue is idle.
    NotRunning,
}

impl ControlOutcome {
    /// Stable status code for API responses.
    pub fn status(&self) -> &'static str {
        match self {
            ControlOutcome::Started => "started",
            ControlOutcome::AlreadyRunning => "already_running",
            ControlOutcome::Paused => "paused",
            ControlOutcome::AlreadyPaused => "already_paused",
            ControlOutcome::Resumed => "resumed",
            ControlOutcome::Stopped => "stopped",
            ControlOutcome::AlreadyStopped => "already_stopped",
            ControlOutcome::NotRunning => "idle",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ControlOutcome::Started => "Queue processing started",
            ControlOutcome::AlreadyRunning => "Queue is already running",
            ControlOutcome::Paused => "Queue processing paused",
            ControlOutcome::AlreadyPaused => "Queue is already paused",
            ControlOutcome::Resumed => "Queue processing resumed",
            ControlOutcome::Stopped => "Queue processing stopped",
            ControlOutcome::AlreadyStopped => "Queue is already stopped",
            ControlOutcome::NotRunning => "Queue is idle, use start to begin processing",
        }
    }

    /// Whether the request changed the queue state.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            ControlOutcome::Started
                | ControlOutcome::Paused
                | ControlOutcome::Resumed
                | ControlOutcome::Stopped
        )
    }
}

impl std::fmt::Display for ControlOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status())
    }
}

/// Why `pop_next` did not hand out a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PopError {
    #[error("Queue is empty")]
    Empty,

    #[error("Queue is paused")]
    Paused,

    /// A previously popped job has not been marked complete yet.
    #[error("A job is already being processed")]
    Busy,
}

/// Configuration for queue and processing-loop behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Average processing time assumed before the first sample (seconds).
    pub initial_avg_secs: f64,
    /// Weight of a new sample in the processing-time moving average.
    pub ema_sample_weight: f64,
    /// How often the processing loop re-checks an idle or paused queue.
    pub poll_interval_ms: u64,
    /// Delay between two jobs, to go easy on the place-search provider.
    pub rate_limit_ms: u64,
    /// Timeout for calls into the queue actor.
    pub rpc_timeout_ms: u64,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            initial_avg_secs: INITIAL_AVG_PROCESSING_SECS,
            ema_sample_weight: EMA_SAMPLE_WEIGHT,
            poll_interval_ms: 1000,
            rate_limit_ms: 500,
            rpc_timeout_ms: 5000,
            event_capacity: 1024,
        }
    }
}

impl QueueConfig {
    /// Build a config from `QUARRY_*` environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_value::<u64>("QUARRY_POLL_INTERVAL_MS") {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = env_value::<u64>("QUARRY_RATE_LIMIT_MS") {
            config.rate_limit_ms = ms;
        }
        if let Some(ms) = env_value::<u64>("QUARRY_RPC_TIMEOUT_MS") {
            config.rpc_timeout_ms = ms;
        }
        if let Some(secs) = env_value::<f64>("QUARRY_INITIAL_AVG_SECS") {
            config.initial_avg_secs = secs;
        }
        config
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Set the delay between jobs.
    pub fn with_rate_limit(mut self, delay: Duration) -> Self {
        self.rate_limit_ms = delay.as_millis() as u64;
        self
    }

    /// Set the queue actor call timeout.
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Set the seed for the processing-time average.
    pub fn with_initial_avg_secs(mut self, secs: f64) -> Self {
        self.initial_avg_secs = secs;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}

/// Throughput statistics for the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs that finished successfully.
    pub processed: u64,
    /// Jobs whose extraction failed.
    pub errors: u64,
    /// Moving average of processing time in seconds.
    pub avg_processing_secs: f64,
}

impl Default for QueueStats {
    fn default() -> Self {
        Self::new(INITIAL_AVG_PROCESSING_SECS)
    }
}

impl QueueStats {
    pub fn new(initial_avg_secs: f64) -> Self {
        Self {
            processed: 0,
            errors: 0,
            avg_processing_secs: initial_avg_secs,
        }
    }

    /// Record a finished job.
    ///
    /// Non-positive durations count toward the totals but leave the average
    /// untouched.
    pub fn record(&mut self, success: bool, duration_secs: f64, sample_weight: f64) {
        if success {
            self.processed += 1;
        } else {
            self.errors += 1;
        }

        if duration_secs > 0.0 {
            self.avg_processing_secs =
                (1.0 - sample_weight) * self.avg_processing_secs + sample_weight * duration_secs;
        }
    }

    /// Estimated seconds until `queued` jobs are done, `None` for an empty queue.
    pub fn estimated_time_remaining(&self, queued: usize) -> Option<u64> {
        if queued == 0 {
            None
        } else {
            Some((queued as f64 * self.avg_processing_secs) as u64)
        }
    }

    /// Total jobs that reached completion either way.
    pub fn finished(&self) -> u64 {
        self.processed + self.errors
    }

    /// Clear counters and reseed the average.
    pub fn reset(&mut self, initial_avg_secs: f64) {
        *self = Self::new(initial_avg_secs);
    }
}

/// Point-in-time view of the queue, produced on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub state: QueueState,
    pub total_in_queue: usize,
    /// Entries owned by the requesting user; 0 when no owner was given.
    pub user_queue_count: usize,
    pub currently_processing: Option<JobId>,
    pub processing_user_id: Option<OwnerId>,
    pub processed_count: u64,
    pub error_count: u64,
    /// Average processing time in seconds, rounded to two decimals.
    pub avg_processing_time: f64,
    /// Seconds, `None` when the queue is empty.
    pub estimated_time_remaining: Option<u64>,
    pub is_paused: bool,
    pub is_running: bool,
}

/// Reply to an enqueue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueReceipt {
    pub queued: usize,
    pub total_in_queue: usize,
}

/// Reply to a remove-by-ids request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalReceipt {
    pub removed: usize,
    pub remaining: usize,
}
