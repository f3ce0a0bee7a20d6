//! Worker actor that drains the queue one job at a time.

use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::job_queue::JobQueue;
use crate::messages::WorkerMessage;
use crate::pipeline::Pipeline;

/// State for the worker actor.
pub struct WorkerActorState {
    /// Queue handle.
    queue: JobQueue,
    pipeline: Pipeline,
    /// Pause between consecutive jobs.
    rate_limit: Duration,
    /// Jobs this worker has taken off the queue.
    handled: u64,
}

impl WorkerActorState {
    /// Check the queue and process at most one job.
    ///
    /// Returns whether a job was taken.
    async fn poll_once(&mut self) -> bool {
        let snapshot = match self.queue.status(None).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Worker could not read queue status: {}", e);
                return false;
            }
        };
        if !snapshot.is_running || snapshot.total_in_queue == 0 {
            return false;
        }

        let job = match self.queue.pop_next().await {
            Ok(job) => job,
            Err(e) if e.is_pop() => {
                tracing::debug!("Nothing to pop: {}", e);
                return false;
            }
            Err(e) => {
                tracing::warn!("Worker could not pop from queue: {}", e);
                return false;
            }
        };

        self.handled += 1;
        let job_id = job.job_id.clone();
        match self.pipeline.run(&self.queue, job).await {
            Ok(summary) => tracing::debug!(
                "Job {} finished (success: {}, {} records)",
                job_id,
                summary.success,
                summary.records
            ),
            Err(e) => tracing::error!("Job {} could not be completed: {}", job_id, e),
        }

        true
    }
}

/// Worker actor arguments.
pub struct WorkerArgs {
    pub(crate) queue: JobQueue,
    pub(crate) pipeline: Pipeline,
    pub(crate) poll_interval: Duration,
    pub(crate) rate_limit: Duration,
}

/// Worker actor that runs the processing loop.
pub struct WorkerActor;

impl Actor for WorkerActor {
    type Msg = WorkerMessage;
    type State = WorkerActorState;
    type Arguments = WorkerArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!(
            "Starting extraction worker (poll every {:?}, rate limit {:?})",
            args.poll_interval,
            args.rate_limit
        );

        // Poll fallback for wake-ups that arrive while a job is running.
        let poll_interval = args.poll_interval.max(Duration::from_millis(1));
        let myself_clone = myself.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            loop {
                interval.tick().await;
                if myself_clone.send_message(WorkerMessage::Poll).is_err() {
                    break;
                }
            }
        });

        Ok(WorkerActorState {
            queue: args.queue,
            pipeline: args.pipeline,
            rate_limit: args.rate_limit,
            handled: 0,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            WorkerMessage::Poll | WorkerMessage::Wake => {
                if state.poll_once().await {
                    if !state.rate_limit.is_zero() {
                        tokio::time::sleep(state.rate_limit).await;
                    }
                    myself.send_message(WorkerMessage::Poll)?;
                }
            }

            WorkerMessage::Shutdown => {
                tracing::info!("Shutting down extraction worker ({} jobs handled)", state.handled);
                myself.stop(None);
            }
        }

        Ok(())
    }
}
