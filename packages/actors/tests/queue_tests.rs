#![allow(clippy::disallowed_methods)]

use std::time::Duration;

use actors::{JobQueue, QueueError};
use quarry_core::{ControlOutcome, JobId, OwnerId, PopError, QueueConfig, QueueEvent, QueueState};

async fn spawn_queue() -> JobQueue {
    let (queue, _handle) = JobQueue::spawn(&QueueConfig::default()).await.unwrap();
    queue
}

#[tokio::test]
async fn test_status_after_enqueue() {
    let queue = spawn_queue().await;
    let owner = OwnerId::from("u1");

    let receipt = queue.enqueue(["q1", "q2"], owner.clone()).await.unwrap();
    assert_eq!(receipt.queued, 2);
    assert_eq!(receipt.total_in_queue, 2);

    let status = queue.status(Some(&owner)).await.unwrap();
    assert_eq!(status.total_in_queue, 2);
    assert_eq!(status.user_queue_count, 2);
    assert!(!status.is_running);
    assert_eq!(status.state, QueueState::Idle);
    assert_eq!(status.estimated_time_remaining, Some(6));
    assert_eq!(status.avg_processing_time, 3.0);

    let other = queue.status(Some(&OwnerId::from("u2"))).await.unwrap();
    assert_eq!(other.user_queue_count, 0);
    assert_eq!(queue.status(None).await.unwrap().user_queue_count, 0);
}

#[tokio::test]
async fn test_control_transitions() {
    let queue = spawn_queue().await;

    assert_eq!(queue.pause().await.unwrap(), ControlOutcome::NotRunning);
    assert_eq!(queue.resume().await.unwrap(), ControlOutcome::NotRunning);
    assert_eq!(queue.stop().await.unwrap(), ControlOutcome::AlreadyStopped);

    assert_eq!(queue.start().await.unwrap(), ControlOutcome::Started);
    assert_eq!(queue.start().await.unwrap(), ControlOutcome::AlreadyRunning);
    assert_eq!(queue.resume().await.unwrap(), ControlOutcome::AlreadyRunning);

    assert_eq!(queue.pause().await.unwrap(), ControlOutcome::Paused);
    assert_eq!(queue.pause().await.unwrap(), ControlOutcome::AlreadyPaused);
    let status = queue.status(None).await.unwrap();
    assert!(status.is_paused);
    assert!(!status.is_running);

    // Start from paused goes straight back to running.
    assert_eq!(queue.start().await.unwrap(), ControlOutcome::Started);
    assert!(queue.status(None).await.unwrap().is_running);

    assert_eq!(queue.stop().await.unwrap(), ControlOutcome::Stopped);
    assert_eq!(queue.status(None).await.unwrap().state, QueueState::Idle);
}

#[tokio::test]
async fn test_pop_and_complete() {
    let queue = spawn_queue().await;
    queue.enqueue(["q1", "q2"], "u1").await.unwrap();

    // Popping is allowed while idle.
    let job = queue.pop_next().await.unwrap();
    assert_eq!(job.job_id, JobId::from("q1"));
    assert_eq!(queue.pop_next().await, Err(QueueError::Pop(PopError::Busy)));

    let status = queue.status(None).await.unwrap();
    assert_eq!(status.currently_processing, Some(JobId::from("q1")));
    assert_eq!(status.processing_user_id, Some(OwnerId::from("u1")));
    assert_eq!(status.total_in_queue, 1);

    queue.mark_complete(true, Duration::from_secs(5)).await.unwrap();
    let status = queue.status(None).await.unwrap();
    assert_eq!(status.currently_processing, None);
    assert_eq!(status.processed_count, 1);
    // 0.7 * 3.0 + 0.3 * 5.0
    assert_eq!(status.avg_processing_time, 3.6);
    assert_eq!(status.estimated_time_remaining, Some(3));

    assert_eq!(
        queue.mark_complete(true, Duration::from_secs(1)).await,
        Err(QueueError::NoJobInFlight)
    );

    queue.start().await.unwrap();
    queue.pause().await.unwrap();
    assert_eq!(queue.pop_next().await, Err(QueueError::Pop(PopError::Paused)));
    assert_eq!(queue.peek().await.unwrap(), None);

    queue.resume().await.unwrap();
    assert_eq!(queue.peek().await.unwrap().map(|job| job.job_id), Some(JobId::from("q2")));
    queue.pop_next().await.unwrap();
    queue.mark_complete(false, Duration::ZERO).await.unwrap();

    let status = queue.status(None).await.unwrap();
    assert_eq!(status.error_count, 1);
    assert_eq!(status.avg_processing_time, 3.6);
    assert_eq!(queue.pop_next().await, Err(QueueError::Pop(PopError::Empty)));

    queue.reset_stats().unwrap();
    let status = queue.status(None).await.unwrap();
    assert_eq!(status.processed_count, 0);
    assert_eq!(status.error_count, 0);
    assert_eq!(status.avg_processing_time, 3.0);
}

#[tokio::test]
async fn test_clear_remove_and_position() {
    let queue = spawn_queue().await;
    queue.enqueue(["a", "b", "c", "b"], "u1").await.unwrap();
    queue.enqueue(["d"], "u2").await.unwrap();

    assert_eq!(queue.position("c").await.unwrap(), Some(3));
    assert_eq!(queue.position("b").await.unwrap(), Some(2));
    assert_eq!(queue.position("zz").await.unwrap(), None);

    let receipt = queue.remove_by_ids(["b", "zz"]).await.unwrap();
    assert_eq!(receipt.removed, 2);
    assert_eq!(receipt.remaining, 3);
    assert_eq!(queue.position("d").await.unwrap(), Some(3));

    assert_eq!(queue.clear().await.unwrap(), 3);
    let status = queue.status(None).await.unwrap();
    assert_eq!(status.total_in_queue, 0);
    assert_eq!(status.estimated_time_remaining, None);
    assert_eq!(queue.clear().await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_keeps_in_flight_job() {
    let queue = spawn_queue().await;
    queue.enqueue(["a", "b"], "u1").await.unwrap();
    queue.pop_next().await.unwrap();

    assert_eq!(queue.clear().await.unwrap(), 1);
    assert_eq!(
        queue.status(None).await.unwrap().currently_processing,
        Some(JobId::from("a"))
    );
    queue.mark_complete(true, Duration::from_millis(10)).await.unwrap();
}

#[tokio::test]
async fn test_events_are_broadcast() {
    let queue = spawn_queue().await;
    let mut events = queue.subscribe();

    queue.enqueue(["q1"], "u1").await.unwrap();
    queue.start().await.unwrap();
    queue.pop_next().await.unwrap();
    queue.mark_complete(true, Duration::from_millis(1500)).await.unwrap();

    match events.recv().await.unwrap() {
        QueueEvent::JobsEnqueued { queued, total_in_queue, .. } => {
            assert_eq!(queued, 1);
            assert_eq!(total_in_queue, 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
    match events.recv().await.unwrap() {
        QueueEvent::StateChanged { old_state, new_state, .. } => {
            assert_eq!(old_state, QueueState::Idle);
            assert_eq!(new_state, QueueState::Running);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(events.recv().await.unwrap(), QueueEvent::JobStarted { .. }));
    let finished = events.recv().await.unwrap();
    assert_eq!(finished.description(), "Job q1 completed in 1500ms");
}

#[tokio::test]
async fn test_retry_failed_requeues_in_failure_order() {
    let queue = spawn_queue().await;
    let owner = OwnerId::from("u1");
    queue.enqueue(["q1", "q2", "q3"], owner.clone()).await.unwrap();
    queue.enqueue(["q4"], "u2").await.unwrap();

    for success in [false, true, false, false] {
        queue.pop_next().await.unwrap();
        queue
            .mark_complete(success, Duration::from_millis(10))
            .await
            .unwrap();
    }
    assert_eq!(queue.failed_count(owner.clone()).await.unwrap(), 2);
    assert_eq!(queue.failed_count("u2").await.unwrap(), 1);

    let mut events = queue.subscribe();
    let receipt = queue.retry_failed(owner.clone()).await.unwrap();
    assert_eq!(receipt.queued, 2);
    assert_eq!(receipt.total_in_queue, 2);
    assert!(matches!(
        events.recv().await.unwrap(),
        QueueEvent::JobsEnqueued { queued: 2, .. }
    ));
    assert_eq!(queue.failed_count(owner.clone()).await.unwrap(), 0);

    assert_eq!(queue.pop_next().await.unwrap().job_id, JobId::from("q1"));
    queue.mark_complete(true, Duration::from_millis(10)).await.unwrap();
    assert_eq!(queue.pop_next().await.unwrap().job_id, JobId::from("q3"));
    queue.mark_complete(false, Duration::from_millis(10)).await.unwrap();

    // q3 failed again and is waiting for another retry; q1 is done.
    assert_eq!(queue.failed_count(owner.clone()).await.unwrap(), 1);
    assert_eq!(queue.failed_count("u2").await.unwrap(), 1);
}

#[tokio::test]
async fn test_retry_failed_with_nothing_failed() {
    let queue = spawn_queue().await;
    queue.enqueue(["q1"], "u1").await.unwrap();

    let receipt = queue.retry_failed("u1").await.unwrap();
    assert_eq!(receipt.queued, 0);
    assert_eq!(receipt.total_in_queue, 1);
    assert_eq!(queue.status(None).await.unwrap().total_in_queue, 1);
}

#[tokio::test]
async fn test_clear_and_reset_forget_failed_jobs() {
    let queue = spawn_queue().await;
    queue.enqueue(["q1", "q2"], "u1").await.unwrap();
    for _ in 0..2 {
        queue.pop_next().await.unwrap();
        queue.mark_complete(false, Duration::from_millis(10)).await.unwrap();
    }
    assert_eq!(queue.failed_count("u1").await.unwrap(), 2);

    queue.clear().await.unwrap();
    assert_eq!(queue.failed_count("u1").await.unwrap(), 0);
    assert_eq!(queue.retry_failed("u1").await.unwrap().queued, 0);

    queue.enqueue(["q3"], "u1").await.unwrap();
    queue.pop_next().await.unwrap();
    queue.mark_complete(false, Duration::from_millis(10)).await.unwrap();
    assert_eq!(queue.failed_count("u1").await.unwrap(), 1);

    queue.reset_stats().unwrap();
    assert_eq!(queue.failed_count("u1").await.unwrap(), 0);
}
