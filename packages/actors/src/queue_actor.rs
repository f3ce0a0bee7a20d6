//! Queue actor owning the pending job list and run-control state.
//!
//! Every queue operation is a message, so the actor's mailbox is the single
//! point of mutual exclusion. Handlers only touch memory; extraction never
//! runs here.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use quarry_core::{
    ControlOutcome, EnqueueReceipt, JobId, JobRef, OwnerId, PopError, QueueConfig, QueueEvent,
    QueueSnapshot, QueueState, QueueStats, RemovalReceipt,
};
use ractor::{Actor, ActorProcessingErr, ActorRef};
use tokio::sync::broadcast;

use crate::messages::{QueueError, QueueMessage, WorkerMessage};

/// State for the queue actor.
pub struct QueueActorState {
    config: QueueConfig,
    /// Current run-control state.
    state: QueueState,
    /// Pending jobs in arrival order.
    pending: VecDeque<JobRef>,
    /// Job shown as "currently processing"; cleared by stop.
    current: Option<JobRef>,
    /// Popped job awaiting `mark_complete`; survives stop.
    in_flight: Option<JobRef>,
    /// Jobs whose last run failed, in failure order.
    failed: Vec<JobRef>,
    stats: QueueStats,
    /// Event broadcaster.
    event_tx: Option<broadcast::Sender<QueueEvent>>,
    /// Processing loop to wake on new work.
    worker: Option<ActorRef<WorkerMessage>>,
}

impl QueueActorState {
    /// Create a new queue actor state.
    pub fn new(config: QueueConfig) -> Self {
        let stats = QueueStats::new(config.initial_avg_secs);
        Self {
            config,
            state: QueueState::Idle,
            pending: VecDeque::new(),
            current: None,
            in_flight: None,
            failed: Vec::new(),
            stats,
            event_tx: None,
            worker: None,
        }
    }

    /// Set the event broadcaster.
    pub fn with_event_tx(mut self, tx: broadcast::Sender<QueueEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// Broadcast an event.
    fn broadcast(&self, event: QueueEvent) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(event);
        }
    }

    fn wake_worker(&self) {
        if let Some(ref worker) = self.worker {
            let _ = worker.send_message(WorkerMessage::Wake);
        }
    }

    pub(crate) fn enqueue(&mut self, job_ids: Vec<JobId>, owner_id: OwnerId) -> EnqueueReceipt {
        let queued = job_ids.len();
        self.pending.extend(
            job_ids
                .into_iter()
                .map(|job_id| JobRef::new(job_id, owner_id.clone())),
        );

        let receipt = EnqueueReceipt {
            queued,
            total_in_queue: self.pending.len(),
        };

        tracing::debug!(
            "Enqueued {} jobs for {} ({} in queue)",
            queued,
            owner_id,
            receipt.total_in_queue
        );
        self.broadcast(QueueEvent::JobsEnqueued {
            owner_id,
            queued,
            total_in_queue: receipt.total_in_queue,
            timestamp: Utc::now(),
        });
        if queued > 0 {
            self.wake_worker();
        }

        receipt
    }

    pub(crate) fn pop_next(&mut self) -> Result<JobRef, PopError> {
        if self.pending.is_empty() {
            return Err(PopError::Empty);
        }
        if self.state == QueueState::Paused {
            return Err(PopError::Paused);
        }
        if self.in_flight.is_some() {
            return Err(PopError::Busy);
        }

        let job = self.pending.pop_front().ok_or(PopError::Empty)?;
        self.current = Some(job.clone());
        self.in_flight = Some(job.clone());

        self.broadcast(QueueEvent::JobStarted {
            job: job.clone(),
            timestamp: Utc::now(),
        });

        Ok(job)
    }

    pub(crate) fn peek(&self) -> Option<JobRef> {
        if self.state == QueueState::Paused {
            return None;
        }
        self.pending.front().cloned()
    }

    pub(crate) fn mark_complete(
        &mut self,
        success: bool,
        duration: Duration,
    ) -> Result<(), QueueError> {
        let Some(job) = self.in_flight.take() else {
            tracing::error!("mark_complete called with no job in flight");
            return Err(QueueError::NoJobInFlight);
        };
        self.current = None;

        self.stats
            .record(success, duration.as_secs_f64(), self.config.ema_sample_weight);

        if success {
            self.failed.retain(|failed| failed != &job);
        } else if !self.failed.contains(&job) {
            self.failed.push(job.clone());
        }

        self.broadcast(QueueEvent::JobFinished {
            job,
            success,
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        });

        Ok(())
    }

    /// Move an owner's failed jobs back onto the queue, oldest failure first.
    pub(crate) fn retry_failed(&mut self, owner_id: OwnerId) -> EnqueueReceipt {
        let (retry, keep): (Vec<JobRef>, Vec<JobRef>) = std::mem::take(&mut self.failed)
            .into_iter()
            .partition(|job| job.is_owned_by(&owner_id));
        self.failed = keep;

        if retry.is_empty() {
            tracing::debug!("No failed jobs to retry for {}", owner_id);
            return EnqueueReceipt {
                queued: 0,
                total_in_queue: self.pending.len(),
            };
        }

        tracing::info!("Retrying {} failed jobs for {}", retry.len(), owner_id);
        let job_ids = retry.into_iter().map(|job| job.job_id).collect();
        self.enqueue(job_ids, owner_id)
    }

    pub(crate) fn failed_count(&self, owner_id: &OwnerId) -> usize {
        self.failed.iter().filter(|job| job.is_owned_by(owner_id)).count()
    }

    pub(crate) fn requeue_in_flight(&mut self) -> Result<JobRef, QueueError> {
        let job = self.in_flight.take().ok_or(QueueError::NoJobInFlight)?;
        self.current = None;
        self.pending.push_back(job.clone());
        Ok(job)
    }

    pub(crate) fn start(&mut self) -> ControlOutcome {
        if self.state == QueueState::Running {
            return ControlOutcome::AlreadyRunning;
        }
        self.set_state(QueueState::Running);
        self.wake_worker();
        ControlOutcome::Started
    }

    pub(crate) fn pause(&mut self) -> ControlOutcome {
        match self.state {
            QueueState::Running => {
                self.set_state(QueueState::Paused);
                ControlOutcome::Paused
            }
            QueueState::Paused => ControlOutcome::AlreadyPaused,
            QueueState::Idle => ControlOutcome::NotRunning,
        }
    }

    pub(crate) fn resume(&mut self) -> ControlOutcome {
        match self.state {
            QueueState::Paused => {
                self.set_state(QueueState::Running);
                self.wake_worker();
                ControlOutcome::Resumed
            }
            QueueState::Running => ControlOutcome::AlreadyRunning,
            QueueState::Idle => ControlOutcome::NotRunning,
        }
    }

    pub(crate) fn stop(&mut self) -> ControlOutcome {
        if self.state == QueueState::Idle {
            return ControlOutcome::AlreadyStopped;
        }
        self.set_state(QueueState::Idle);
        self.current = None;
        ControlOutcome::Stopped
    }

    fn set_state(&mut self, new_state: QueueState) {
        let old_state = self.state;
        self.state = new_state;
        tracing::info!("Extraction queue {} -> {}", old_state, new_state);
        self.broadcast(QueueEvent::StateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        self.failed.clear();
        self.broadcast(QueueEvent::QueueCleared {
            removed,
            timestamp: Utc::now(),
        });
        removed
    }

    pub(crate) fn remove_by_ids(&mut self, job_ids: Vec<JobId>) -> RemovalReceipt {
        let before = self.pending.len();
        self.pending.retain(|job| !job_ids.contains(&job.job_id));
        let removed = before - self.pending.len();

        if removed > 0 {
            self.broadcast(QueueEvent::JobsRemoved {
                job_ids,
                removed,
                timestamp: Utc::now(),
            });
        }

        RemovalReceipt {
            removed,
            remaining: self.pending.len(),
        }
    }

    pub(crate) fn position(&self, job_id: &JobId) -> Option<usize> {
        self.pending
            .iter()
            .position(|job| &job.job_id == job_id)
            .map(|index| index + 1)
    }

    pub(crate) fn snapshot(&self, owner_id: Option<&OwnerId>) -> QueueSnapshot {
        let total_in_queue = self.pending.len();
        let user_queue_count = owner_id.map_or(0, |owner| {
            self.pending.iter().filter(|job| job.is_owned_by(owner)).count()
        });

        QueueSnapshot {
            state: self.state,
            total_in_queue,
            user_queue_count,
            currently_processing: self.current.as_ref().map(|job| job.job_id.clone()),
            processing_user_id: self.current.as_ref().map(|job| job.owner_id.clone()),
            processed_count: self.stats.processed,
            error_count: self.stats.errors,
            avg_processing_time: (self.stats.avg_processing_secs * 100.0).round_ties_even() / 100.0,
            estimated_time_remaining: self.stats.estimated_time_remaining(total_in_queue),
            is_paused: self.state == QueueState::Paused,
            is_running: self.state == QueueState::Running,
        }
    }

    pub(crate) fn reset_stats(&mut self) {
        self.stats.reset(self.config.initial_avg_secs);
        self.failed.clear();
    }
}

/// Queue actor that serializes all queue operations.
pub struct QueueActor;

impl Actor for QueueActor {
    type Msg = QueueMessage;
    type State = QueueActorState;
    type Arguments = QueueActorState;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::info!("Starting extraction queue actor");
        Ok(args)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            QueueMessage::Enqueue {
                job_ids,
                owner_id,
                reply,
            } => {
                let _ = reply.send(state.enqueue(job_ids, owner_id));
            }

            QueueMessage::PopNext { reply } => {
                let _ = reply.send(state.pop_next());
            }

            QueueMessage::Peek { reply } => {
                let _ = reply.send(state.peek());
            }

            QueueMessage::MarkComplete {
                success,
                duration,
                reply,
            } => {
                let _ = reply.send(state.mark_complete(success, duration));
            }

            QueueMessage::RetryFailed { owner_id, reply } => {
                let _ = reply.send(state.retry_failed(owner_id));
            }

            QueueMessage::FailedCount { owner_id, reply } => {
                let _ = reply.send(state.failed_count(&owner_id));
            }

            QueueMessage::RequeueInFlight { reply } => {
                let _ = reply.send(state.requeue_in_flight());
            }

            QueueMessage::Start { reply } => {
                let _ = reply.send(state.start());
            }

            QueueMessage::Pause { reply } => {
                let _ = reply.send(state.pause());
            }

            QueueMessage::Resume { reply } => {
                let _ = reply.send(state.resume());
            }

            QueueMessage::Stop { reply } => {
                let _ = reply.send(state.stop());
            }

            QueueMessage::Clear { reply } => {
                let _ = reply.send(state.clear());
            }

            QueueMessage::RemoveByIds { job_ids, reply } => {
                let _ = reply.send(state.remove_by_ids(job_ids));
            }

            QueueMessage::Position { job_id, reply } => {
                let _ = reply.send(state.position(&job_id));
            }

            QueueMessage::Status { owner_id, reply } => {
                let _ = reply.send(state.snapshot(owner_id.as_ref()));
            }

            QueueMessage::ResetStats => {
                state.reset_stats();
            }

            QueueMessage::RegisterWorker { worker } => {
                state.worker = Some(worker);
                if state.state == QueueState::Running && !state.pending.is_empty() {
                    state.wake_worker();
                }
            }

            QueueMessage::Shutdown => {
                tracing::info!(
                    "Shutting down extraction queue ({} jobs pending)",
                    state.pending.len()
                );
                myself.stop(None);
                return Ok(());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::disallowed_methods)]

    use super::*;

    fn ids(ids: &[&str]) -> Vec<JobId> {
        ids.iter().map(|id| JobId::from(*id)).collect()
    }

    fn running_queue() -> QueueActorState {
        let mut state = QueueActorState::new(QueueConfig::default());
        state.start();
        state
    }

    #[test]
    fn drains_in_fifo_order_with_shrinking_estimate() {
        let mut state = running_queue();
        let input = ["a", "b", "c", "d", "e"];
        state.enqueue(ids(&input), OwnerId::from("u1"));

        let mut popped = Vec::new();
        let mut last_estimate = state.snapshot(None).estimated_time_remaining;
        for _ in 0..input.len() {
            let job = state.pop_next().unwrap();
            popped.push(job.job_id.0.clone());
            state.mark_complete(true, Duration::ZERO).unwrap();

            let estimate = state.snapshot(None).estimated_time_remaining;
            match (last_estimate, estimate) {
                (Some(prev), Some(next)) => assert!(next < prev),
                (Some(_), None) => {}
                other => panic!("unexpected estimates {:?}", other),
            }
            last_estimate = estimate;
        }

        assert_eq!(popped, input);
        assert_eq!(state.pop_next(), Err(PopError::Empty));
    }

    #[test]
    fn pause_keeps_head_of_queue() {
        let mut state = running_queue();
        state.enqueue(ids(&["a", "b"]), OwnerId::from("u1"));

        assert_eq!(state.pause(), ControlOutcome::Paused);
        assert_eq!(state.pop_next(), Err(PopError::Paused));
        assert_eq!(state.peek(), None);

        assert_eq!(state.resume(), ControlOutcome::Resumed);
        assert_eq!(state.pop_next().unwrap().job_id, JobId::from("a"));
    }

    #[test]
    fn single_job_in_flight() {
        let mut state = running_queue();
        state.enqueue(ids(&["a", "b"]), OwnerId::from("u1"));

        state.pop_next().unwrap();
        assert_eq!(state.pop_next(), Err(PopError::Busy));

        // Stop hides the current job but the pop still has to be completed.
        state.stop();
        assert_eq!(state.snapshot(None).currently_processing, None);
        assert_eq!(state.pop_next(), Err(PopError::Busy));
        state.mark_complete(false, Duration::from_secs(1)).unwrap();
        assert_eq!(state.snapshot(None).error_count, 1);

        assert_eq!(
            state.mark_complete(true, Duration::ZERO),
            Err(QueueError::NoJobInFlight)
        );
    }

    #[test]
    fn retry_failed_requeues_in_failure_order() {
        let mut state = running_queue();
        state.enqueue(ids(&["a", "b", "c"]), OwnerId::from("u1"));
        state.enqueue(ids(&["d"]), OwnerId::from("u2"));

        for success in [false, true, false, false] {
            state.pop_next().unwrap();
            state.mark_complete(success, Duration::ZERO).unwrap();
        }
        assert_eq!(state.failed_count(&OwnerId::from("u1")), 2);

        let receipt = state.retry_failed(OwnerId::from("u1"));
        assert_eq!(receipt.queued, 2);
        assert_eq!(receipt.total_in_queue, 2);
        assert_eq!(state.pop_next().unwrap().job_id, JobId::from("a"));
        state.mark_complete(true, Duration::ZERO).unwrap();
        assert_eq!(state.pop_next().unwrap().job_id, JobId::from("c"));
        state.mark_complete(true, Duration::ZERO).unwrap();

        // Retries drain the list; u2's failure is untouched until reset.
        assert_eq!(state.retry_failed(OwnerId::from("u1")).queued, 0);
        assert_eq!(state.failed_count(&OwnerId::from("u2")), 1);
        state.reset_stats();
        assert_eq!(state.failed_count(&OwnerId::from("u2")), 0);
    }

    #[test]
    fn requeue_moves_job_to_tail() {
        let mut state = running_queue();
        state.enqueue(ids(&["a", "b"]), OwnerId::from("u1"));

        state.pop_next().unwrap();
        let job = state.requeue_in_flight().unwrap();
        assert_eq!(job.job_id, JobId::from("a"));
        assert_eq!(state.position(&JobId::from("a")), Some(2));
        assert_eq!(state.snapshot(None).processed_count, 0);
        assert_eq!(state.requeue_in_flight(), Err(QueueError::NoJobInFlight));
    }
}
