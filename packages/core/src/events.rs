//! Event types for real-time queue updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, JobRef, OwnerId, QueueState};

/// Events emitted by the extraction queue for dashboards and logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QueueEvent {
    // Queue events
    /// Job ids were appended to the queue.
    JobsEnqueued {
        owner_id: OwnerId,
        queued: usize,
        total_in_queue: usize,
        timestamp: DateTime<Utc>,
    },
    /// Run-control state changed.
    StateChanged {
        old_state: QueueState,
        new_state: QueueState,
        timestamp: DateTime<Utc>,
    },
    /// Pending entries were dropped by a clear.
    QueueCleared {
        removed: usize,
        timestamp: DateTime<Utc>,
    },
    /// Specific entries were dropped.
    JobsRemoved {
        job_ids: Vec<JobId>,
        removed: usize,
        timestamp: DateTime<Utc>,
    },

    // Job events
    /// A job was popped for processing.
    JobStarted {
        job: JobRef,
        timestamp: DateTime<Utc>,
    },
    /// The in-flight job was marked complete.
    JobFinished {
        job: JobRef,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
    /// Extraction results were normalized and scored.
    BatchScored {
        job: JobRef,
        records: usize,
        average_score: f64,
        timestamp: DateTime<Utc>,
    },
    /// Extraction for a job failed.
    ExtractionFailed {
        job: JobRef,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl QueueEvent {
    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            QueueEvent::JobsEnqueued { timestamp, .. } => *timestamp,
            QueueEvent::StateChanged { timestamp, .. } => *timestamp,
            QueueEvent::QueueCleared { timestamp, .. } => *timestamp,
            QueueEvent::JobsRemoved { timestamp, .. } => *timestamp,
            QueueEvent::JobStarted { timestamp, .. } => *timestamp,
            QueueEvent::JobFinished { timestamp, .. } => *timestamp,
            QueueEvent::BatchScored { timestamp, .. } => *timestamp,
            QueueEvent::ExtractionFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Get the job this event is about, if any.
    pub fn job(&self) -> Option<&JobRef> {
        match self {
            QueueEvent::JobStarted { job, .. } => Some(job),
            QueueEvent::JobFinished { job, .. } => Some(job),
            QueueEvent::BatchScored { job, .. } => Some(job),
            QueueEvent::ExtractionFailed { job, .. } => Some(job),
            _ => None,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            QueueEvent::JobsEnqueued {
                owner_id,
                queued,
                total_in_queue,
                ..
            } => format!(
                "{} jobs enqueued for {} ({} in queue)",
                queued, owner_id, total_in_queue
            ),
            QueueEvent::StateChanged {
                old_state,
                new_state,
                ..
            } => format!("Queue {} -> {}", old_state, new_state),
            QueueEvent::QueueCleared { removed, .. } => {
                format!("Queue cleared ({} removed)", removed)
            }
            QueueEvent::JobsRemoved { removed, .. } => format!("{} jobs removed", removed),
            QueueEvent::JobStarted { job, .. } => format!("Job {} started", job.job_id),
            QueueEvent::JobFinished {
                job,
                success,
                duration_ms,
                ..
            } => {
                let outcome = if *success { "completed" } else { "failed" };
                format!("Job {} {} in {}ms", job.job_id, outcome, duration_ms)
            }
            QueueEvent::BatchScored {
                job,
                records,
                average_score,
                ..
            } => format!(
                "Job {} scored {} records (avg {:.1})",
                job.job_id, records, average_score
            ),
            QueueEvent::ExtractionFailed { job, error, .. } => {
                format!("Job {} extraction failed: {}", job.job_id, error)
            }
        }
    }
}
