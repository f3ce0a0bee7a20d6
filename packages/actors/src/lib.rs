//! Actor system for the extraction queue.
//!
//! This crate provides the Ractor-based queue and processing loop that
//! turn queued search jobs into scored business records.
//!
//! # Architecture
//!
//! - `QueueActor` - Owns the FIFO of pending jobs, run-control state and
//!   throughput statistics. Every queue operation is one message.
//! - `WorkerActor` - Single consumer that pops jobs, runs them through the
//!   collaborators and reports completion back to the queue.
//! - `JobQueue` - Cloneable typed handle over the queue actor.
//! - `QueueService` - Spawns and owns both actors.
//!
//! # Usage
//!
//! ```ignore
//! use actors::{Collaborators, start_service};
//! use quarry_core::QueueConfig;
//!
//! let service = start_service(QueueConfig::from_env(), collaborators).await?;
//! let queue = service.queue().clone();
//!
//! queue.enqueue(["q1", "q2"], "user-1").await?;
//! queue.start().await?;
//! ```

mod collaborators;
mod job_queue;
mod messages;
mod pipeline;
mod queue_actor;
mod service;
mod worker_actor;

pub use collaborators::{
    DeliverFuture, ExtractFuture, Extraction, Extractor, FnExtractor, FnResolver, JobOutcome,
    JobSummary, QueryResolver, ResolveFuture, ResultSink,
};
pub use job_queue::JobQueue;
pub use messages::{QueueError, QueueMessage, WorkerMessage};
pub use pipeline::Collaborators;
pub use queue_actor::{QueueActor, QueueActorState};
pub use service::{ProcessNext, QueueService, ServiceError, start_service};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort};
