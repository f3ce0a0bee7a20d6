//! Queue service lifecycle: one queue actor plus one worker actor.

use quarry_core::{JobId, OwnerId, PopError, QueueConfig};
use ractor::{Actor, ActorRef};
use tokio::task::JoinHandle;

use crate::collaborators::JobSummary;
use crate::job_queue::JobQueue;
use crate::messages::{QueueError, WorkerMessage};
use crate::pipeline::{Collaborators, Pipeline};
use crate::worker_actor::{WorkerActor, WorkerArgs};

/// Error type for service startup.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to spawn {actor} actor: {reason}")]
    Spawn { actor: &'static str, reason: String },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Result of an on-demand processing step.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessNext {
    Processed(JobSummary),
    /// Nothing was popped.
    NotAvailable(PopError),
    /// The head job belongs to someone else and went back to the tail.
    OwnerMismatch { job_id: JobId },
}

/// A running extraction queue with its processing loop.
pub struct QueueService {
    queue: JobQueue,
    pipeline: Pipeline,
    worker: ActorRef<WorkerMessage>,
    handles: Vec<JoinHandle<()>>,
}

impl QueueService {
    /// Handle for queue operations. Clone it into request handlers.
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Pop the head job and process it now if it belongs to `owner_id`.
    ///
    /// Runs regardless of the run-control state; only the single in-flight
    /// job limit and pause are honored.
    pub async fn process_next(&self, owner_id: &OwnerId) -> Result<ProcessNext, QueueError> {
        let job = match self.queue.pop_next().await {
            Ok(job) => job,
            Err(QueueError::Pop(reason)) => return Ok(ProcessNext::NotAvailable(reason)),
            Err(e) => return Err(e),
        };

        if !job.is_owned_by(owner_id) {
            let job = self.queue.requeue_in_flight().await?;
            tracing::debug!(
                "Job {} belongs to {}, not {}; moved to the tail",
                job.job_id,
                job.owner_id,
                owner_id
            );
            return Ok(ProcessNext::OwnerMismatch { job_id: job.job_id });
        }

        let summary = self.pipeline.run(&self.queue, job).await?;
        Ok(ProcessNext::Processed(summary))
    }

    /// Stop both actors and wait for them to exit.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down extraction queue service");
        let _ = self.worker.send_message(WorkerMessage::Shutdown);
        if let Err(e) = self.queue.shutdown() {
            tracing::warn!("Queue actor already gone: {}", e);
        }

        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Spawn the queue and worker actors and wire them together.
pub async fn start_service(
    config: QueueConfig,
    collaborators: Collaborators,
) -> Result<QueueService, ServiceError> {
    let (queue, queue_handle) =
        JobQueue::spawn(&config)
            .await
            .map_err(|e| ServiceError::Spawn {
                actor: "queue",
                reason: e.to_string(),
            })?;

    let pipeline = Pipeline::new(collaborators);
    let args = WorkerArgs {
        queue: queue.clone(),
        pipeline: pipeline.clone(),
        poll_interval: config.poll_interval(),
        rate_limit: config.rate_limit(),
    };

    let (worker, worker_handle) = match Actor::spawn(None, WorkerActor, args).await {
        Ok(spawned) => spawned,
        Err(e) => {
            let _ = queue.shutdown();
            return Err(ServiceError::Spawn {
                actor: "worker",
                reason: e.to_string(),
            });
        }
    };
    queue.register_worker(worker.clone())?;

    tracing::info!("Extraction queue service started");

    Ok(QueueService {
        queue,
        pipeline,
        worker,
        handles: vec![worker_handle, queue_handle],
    })
}
