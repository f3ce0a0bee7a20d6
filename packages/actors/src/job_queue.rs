//! Cloneable async handle over the queue actor.

use std::time::Duration;

use quarry_core::{
    ControlOutcome, EnqueueReceipt, JobId, JobRef, OwnerId, QueueConfig, QueueEvent,
    QueueSnapshot, RemovalReceipt,
};
use ractor::rpc::CallResult;
use ractor::{Actor, ActorRef, RpcReplyPort};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::messages::{QueueError, QueueMessage, WorkerMessage};
use crate::queue_actor::{QueueActor, QueueActorState};

/// Typed front door to the extraction queue.
///
/// Every method is one round trip through the queue actor's mailbox, so
/// concurrent callers observe a single consistent order of operations.
#[derive(Clone)]
pub struct JobQueue {
    actor: ActorRef<QueueMessage>,
    events: broadcast::Sender<QueueEvent>,
    timeout: Duration,
}

impl JobQueue {
    /// Spawn a queue actor and return a handle to it.
    pub async fn spawn(
        config: &QueueConfig,
    ) -> Result<(Self, JoinHandle<()>), ractor::SpawnErr> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let state = QueueActorState::new(config.clone()).with_event_tx(events.clone());

        let (actor, handle) = Actor::spawn(None, QueueActor, state).await?;

        Ok((
            Self {
                actor,
                events,
                timeout: config.rpc_timeout(),
            },
            handle,
        ))
    }

    async fn call<T, F>(&self, build: F) -> Result<T, QueueError>
    where
        T: Send + 'static,
        F: FnOnce(RpcReplyPort<T>) -> QueueMessage,
    {
        let result = ractor::rpc::call(&self.actor, build, Some(self.timeout))
            .await
            .map_err(|e| QueueError::Actor(e.to_string()))?;

        match result {
            CallResult::Success(value) => Ok(value),
            CallResult::Timeout => Err(QueueError::Timeout),
            CallResult::SenderError => Err(QueueError::Actor("Reply channel dropped".into())),
        }
    }

    fn send(&self, message: QueueMessage) -> Result<(), QueueError> {
        self.actor
            .send_message(message)
            .map_err(|e| QueueError::Actor(e.to_string()))
    }

    /// Append jobs for an owner in the given order.
    pub async fn enqueue<I, J>(
        &self,
        job_ids: I,
        owner_id: impl Into<OwnerId>,
    ) -> Result<EnqueueReceipt, QueueError>
    where
        I: IntoIterator<Item = J>,
        J: Into<JobId>,
    {
        let job_ids: Vec<JobId> = job_ids.into_iter().map(Into::into).collect();
        let owner_id = owner_id.into();
        self.call(|reply| QueueMessage::Enqueue {
            job_ids,
            owner_id,
            reply,
        })
        .await
    }

    /// Take the head job and mark it in flight.
    pub async fn pop_next(&self) -> Result<JobRef, QueueError> {
        Ok(self.call(|reply| QueueMessage::PopNext { reply }).await??)
    }

    pub async fn peek(&self) -> Result<Option<JobRef>, QueueError> {
        self.call(|reply| QueueMessage::Peek { reply }).await
    }

    /// Record the outcome of the in-flight job.
    ///
    /// The message is in the actor's mailbox before the reply wait starts,
    /// so a [`QueueError::Timeout`] still clears the in-flight slot.
    pub async fn mark_complete(&self, success: bool, duration: Duration) -> Result<(), QueueError> {
        self.call(|reply| QueueMessage::MarkComplete {
            success,
            duration,
            reply,
        })
        .await?
    }

    /// Put an owner's failed jobs back on the queue in the order they failed.
    pub async fn retry_failed(
        &self,
        owner_id: impl Into<OwnerId>,
    ) -> Result<EnqueueReceipt, QueueError> {
        let owner_id = owner_id.into();
        self.call(|reply| QueueMessage::RetryFailed { owner_id, reply })
            .await
    }

    pub async fn failed_count(&self, owner_id: impl Into<OwnerId>) -> Result<usize, QueueError> {
        let owner_id = owner_id.into();
        self.call(|reply| QueueMessage::FailedCount { owner_id, reply })
            .await
    }

    pub(crate) async fn requeue_in_flight(&self) -> Result<JobRef, QueueError> {
        self.call(|reply| QueueMessage::RequeueInFlight { reply })
            .await?
    }

    pub async fn start(&self) -> Result<ControlOutcome, QueueError> {
        self.call(|reply| QueueMessage::Start { reply }).await
    }

    pub async fn pause(&self) -> Result<ControlOutcome, QueueError> {
        self.call(|reply| QueueMessage::Pause { reply }).await
    }

    pub async fn resume(&self) -> Result<ControlOutcome, QueueError> {
        self.call(|reply| QueueMessage::Resume { reply }).await
    }

    /// Return to idle. The in-flight job, if any, still runs to completion.
    pub async fn stop(&self) -> Result<ControlOutcome, QueueError> {
        self.call(|reply| QueueMessage::Stop { reply }).await
    }

    /// Drop all pending jobs, returning how many were removed.
    pub async fn clear(&self) -> Result<usize, QueueError> {
        self.call(|reply| QueueMessage::Clear { reply }).await
    }

    pub async fn remove_by_ids<I, J>(&self, job_ids: I) -> Result<RemovalReceipt, QueueError>
    where
        I: IntoIterator<Item = J>,
        J: Into<JobId>,
    {
        let job_ids: Vec<JobId> = job_ids.into_iter().map(Into::into).collect();
        self.call(|reply| QueueMessage::RemoveByIds { job_ids, reply })
            .await
    }

    /// 1-based position of a pending job.
    pub async fn position(&self, job_id: impl Into<JobId>) -> Result<Option<usize>, QueueError> {
        let job_id = job_id.into();
        self.call(|reply| QueueMessage::Position { job_id, reply })
            .await
    }

    /// Snapshot of the queue. `owner_id` fills in `userQueueCount`.
    pub async fn status(&self, owner_id: Option<&OwnerId>) -> Result<QueueSnapshot, QueueError> {
        let owner_id = owner_id.cloned();
        self.call(|reply| QueueMessage::Status { owner_id, reply })
            .await
    }

    pub fn reset_stats(&self) -> Result<(), QueueError> {
        self.send(QueueMessage::ResetStats)
    }

    /// Subscribe to queue and pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: QueueEvent) {
        let _ = self.events.send(event);
    }

    pub(crate) fn register_worker(&self, worker: ActorRef<WorkerMessage>) -> Result<(), QueueError> {
        self.send(QueueMessage::RegisterWorker { worker })
    }

    pub(crate) fn shutdown(&self) -> Result<(), QueueError> {
        self.send(QueueMessage::Shutdown)
    }
}
