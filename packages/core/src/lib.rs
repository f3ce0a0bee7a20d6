//! Core domain types for the extraction queue.
//!
//! This crate contains shared types used across all packages:
//! - JobRef, JobId and OwnerId for queued work
//! - QueueState, QueueConfig, QueueStats and QueueSnapshot for run-control
//! - BusinessRecord and NormalizedRecord for extraction output
//! - QualityReport and friends for data-quality results
//! - Events for real-time updates

mod events;
mod job;
mod queue;
mod record;
mod report;

pub use events::QueueEvent;
pub use job::{JobId, JobRef, OwnerId};
pub use queue::{
    ControlOutcome, EMA_SAMPLE_WEIGHT, EnqueueReceipt, INITIAL_AVG_PROCESSING_SECS, PopError,
    QueueConfig, QueueSnapshot, QueueState, QueueStats, RemovalReceipt,
};
pub use record::{BusinessRecord, FieldValue, NormalizedRecord, RecordField};
pub use report::{
    Completeness, DuplicateGroup, FieldSummary, QualityReport, ScoreDistribution, TierSummary,
};
