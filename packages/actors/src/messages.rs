//! Message types for actor communication.

use std::time::Duration;

use quarry_core::{
    ControlOutcome, EnqueueReceipt, JobId, JobRef, OwnerId, PopError, QueueSnapshot,
    RemovalReceipt,
};
use ractor::{ActorRef, RpcReplyPort};

/// Messages for the QueueActor.
#[derive(Debug)]
pub enum QueueMessage {
    /// Append job ids for an owner.
    Enqueue {
        job_ids: Vec<JobId>,
        owner_id: OwnerId,
        reply: RpcReplyPort<EnqueueReceipt>,
    },

    /// Remove the head entry and mark it in flight.
    PopNext {
        reply: RpcReplyPort<Result<JobRef, PopError>>,
    },

    /// Look at the head entry without removing it.
    Peek { reply: RpcReplyPort<Option<JobRef>> },

    /// Report that the in-flight job finished.
    MarkComplete {
        success: bool,
        duration: Duration,
        reply: RpcReplyPort<Result<(), QueueError>>,
    },

    /// Re-enqueue an owner's failed jobs.
    RetryFailed {
        owner_id: OwnerId,
        reply: RpcReplyPort<EnqueueReceipt>,
    },

    /// Number of an owner's jobs waiting for a retry.
    FailedCount {
        owner_id: OwnerId,
        reply: RpcReplyPort<usize>,
    },

    /// Put the in-flight job back at the tail without counting it.
    RequeueInFlight {
        reply: RpcReplyPort<Result<JobRef, QueueError>>,
    },

    /// Idle/Paused -> Running.
    Start { reply: RpcReplyPort<ControlOutcome> },

    /// Running -> Paused.
    Pause { reply: RpcReplyPort<ControlOutcome> },

    /// Paused -> Running.
    Resume { reply: RpcReplyPort<ControlOutcome> },

    /// Any -> Idle.
    Stop { reply: RpcReplyPort<ControlOutcome> },

    /// Drop every pending entry.
    Clear { reply: RpcReplyPort<usize> },

    /// Drop pending entries with matching ids.
    RemoveByIds {
        job_ids: Vec<JobId>,
        reply: RpcReplyPort<RemovalReceipt>,
    },

    /// 1-based position of a job id.
    Position {
        job_id: JobId,
        reply: RpcReplyPort<Option<usize>>,
    },

    /// Get a snapshot, optionally with one owner's count.
    Status {
        owner_id: Option<OwnerId>,
        reply: RpcReplyPort<QueueSnapshot>,
    },

    /// Reset throughput statistics.
    ResetStats,

    /// Attach the processing loop so it can be woken on new work.
    RegisterWorker { worker: ActorRef<WorkerMessage> },

    /// Shutdown the queue.
    Shutdown,
}

/// Messages for the WorkerActor.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Periodic check for work.
    Poll,

    /// New work may be available (enqueue, start, resume).
    Wake,

    /// Shutdown the worker after the current job.
    Shutdown,
}

/// Error type for queue operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error(transparent)]
    Pop(#[from] PopError),

    /// `mark_complete` or a requeue without a preceding successful pop.
    #[error("No job is in flight")]
    NoJobInFlight,

    #[error("Actor error: {0}")]
    Actor(String),

    #[error("Timeout")]
    Timeout,
}

impl QueueError {
    /// Whether this is one of the expected "nothing to pop" conditions.
    pub fn is_pop(&self) -> bool {
        matches!(self, QueueError::Pop(_))
    }
}
