//! One pop-to-complete pass over a single job.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use quality::{generate_normalized_report, normalize_record};
use quarry_core::{JobRef, NormalizedRecord, QueueEvent};

use crate::collaborators::{Extractor, JobOutcome, JobSummary, QueryResolver, ResultSink};
use crate::job_queue::JobQueue;
use crate::messages::QueueError;

/// The collaborators a queue service processes jobs with.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn QueryResolver>,
    pub extractor: Arc<dyn Extractor>,
    pub sink: Arc<dyn ResultSink>,
}

impl Collaborators {
    pub fn new(
        resolver: impl QueryResolver,
        extractor: impl Extractor,
        sink: impl ResultSink,
    ) -> Self {
        Self {
            resolver: Arc::new(resolver),
            extractor: Arc::new(extractor),
            sink: Arc::new(sink),
        }
    }
}

/// Resolve, extract, score and deliver a popped job.
#[derive(Clone)]
pub(crate) struct Pipeline {
    collaborators: Collaborators,
}

impl Pipeline {
    pub(crate) fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Process `job`, which must be the queue's in-flight job, and report
    /// its completion back to the queue.
    pub(crate) async fn run(&self, queue: &JobQueue, job: JobRef) -> Result<JobSummary, QueueError> {
        let started = Instant::now();
        tracing::debug!("Processing job {} for {}", job.job_id, job.owner_id);

        let outcome = match self.collaborators.resolver.resolve(&job).await {
            Ok(query) => match self.collaborators.extractor.extract(&query).await {
                Ok(extraction) => {
                    let records: Vec<NormalizedRecord> =
                        extraction.records.iter().map(normalize_record).collect();
                    let report = generate_normalized_report(&records);

                    tracing::debug!(
                        "Job {} produced {} records (avg score {})",
                        job.job_id,
                        records.len(),
                        report.average_score
                    );
                    queue.publish(QueueEvent::BatchScored {
                        job: job.clone(),
                        records: records.len(),
                        average_score: report.average_score,
                        timestamp: Utc::now(),
                    });

                    JobOutcome::Succeeded {
                        job: job.clone(),
                        query,
                        records,
                        report,
                        extraction_time: extraction.elapsed,
                        elapsed: started.elapsed(),
                    }
                }
                Err(error) => self.failed(queue, &job, error, started),
            },
            Err(error) => self.failed(queue, &job, error, started),
        };

        let summary = outcome.summary();
        self.collaborators.sink.deliver(outcome).await;

        queue
            .mark_complete(summary.success, started.elapsed())
            .await?;

        Ok(summary)
    }

    fn failed(&self, queue: &JobQueue, job: &JobRef, error: String, started: Instant) -> JobOutcome {
        tracing::warn!("Job {} failed: {}", job.job_id, error);
        queue.publish(QueueEvent::ExtractionFailed {
            job: job.clone(),
            error: error.clone(),
            timestamp: Utc::now(),
        });

        JobOutcome::Failed {
            job: job.clone(),
            error,
            elapsed: started.elapsed(),
        }
    }
}
