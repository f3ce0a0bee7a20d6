//! Traits for the services the processing loop depends on.
//!
//! The loop never talks to a browser, database or HTTP client directly. It
//! resolves a job's query through a [`QueryResolver`], runs it through an
//! [`Extractor`], and hands the scored batch to a [`ResultSink`].

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use quarry_core::{BusinessRecord, JobId, JobRef, NormalizedRecord, QualityReport};
use tokio::sync::mpsc;

/// Raw output of one extraction run.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<BusinessRecord>,
    /// Time the extractor reports it spent.
    pub elapsed: Duration,
}

impl Extraction {
    pub fn new(records: Vec<BusinessRecord>, elapsed: Duration) -> Self {
        Self { records, elapsed }
    }
}

/// Future type for query resolution.
pub type ResolveFuture = Pin<Box<dyn Future<Output = Result<String, String>> + Send>>;

/// Future type for extraction.
pub type ExtractFuture = Pin<Box<dyn Future<Output = Result<Extraction, String>> + Send>>;

/// Future type for result delivery.
pub type DeliverFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Maps a queued job to the search query it stands for.
pub trait QueryResolver: Send + Sync + 'static {
    fn resolve(&self, job: &JobRef) -> ResolveFuture;
}

/// Runs a search query and returns raw business records.
///
/// Calls are never made concurrently for a single queue.
pub trait Extractor: Send + Sync + 'static {
    fn extract(&self, query: &str) -> ExtractFuture;
}

/// Receives the outcome of every processed job.
pub trait ResultSink: Send + Sync + 'static {
    fn deliver(&self, outcome: JobOutcome) -> DeliverFuture;
}

/// What happened to one job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded {
        job: JobRef,
        query: String,
        records: Vec<NormalizedRecord>,
        report: QualityReport,
        /// Extractor-reported time.
        extraction_time: Duration,
        /// Wall time from pop to delivery.
        elapsed: Duration,
    },
    Failed {
        job: JobRef,
        error: String,
        elapsed: Duration,
    },
}

impl JobOutcome {
    pub fn job(&self) -> &JobRef {
        match self {
            JobOutcome::Succeeded { job, .. } | JobOutcome::Failed { job, .. } => job,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            JobOutcome::Succeeded { elapsed, .. } | JobOutcome::Failed { elapsed, .. } => *elapsed,
        }
    }

    /// Record-free view of the outcome.
    pub fn summary(&self) -> JobSummary {
        match self {
            JobOutcome::Succeeded {
                job,
                records,
                report,
                elapsed,
                ..
            } => JobSummary {
                job: job.clone(),
                success: true,
                records: records.len(),
                report: Some(report.clone()),
                error: None,
                elapsed: *elapsed,
            },
            JobOutcome::Failed {
                job,
                error,
                elapsed,
            } => JobSummary {
                job: job.clone(),
                success: false,
                records: 0,
                report: None,
                error: Some(error.clone()),
                elapsed: *elapsed,
            },
        }
    }
}

/// Summary returned to callers of a single processing step.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub job: JobRef,
    pub success: bool,
    pub records: usize,
    pub report: Option<QualityReport>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Resolver backed by a fixed id-to-query table.
impl QueryResolver for HashMap<JobId, String> {
    fn resolve(&self, job: &JobRef) -> ResolveFuture {
        let query = self
            .get(&job.job_id)
            .cloned()
            .ok_or_else(|| "Query not found".to_string());
        Box::pin(async move { query })
    }
}

/// Sink that forwards outcomes over a channel.
impl ResultSink for mpsc::UnboundedSender<JobOutcome> {
    fn deliver(&self, outcome: JobOutcome) -> DeliverFuture {
        if self.send(outcome).is_err() {
            tracing::debug!("Result receiver dropped; outcome discarded");
        }
        Box::pin(async {})
    }
}

/// A closure-based resolver.
pub struct FnResolver<F>
where
    F: Fn(&JobRef) -> ResolveFuture + Send + Sync + 'static,
{
    resolver: F,
}

impl<F> FnResolver<F>
where
    F: Fn(&JobRef) -> ResolveFuture + Send + Sync + 'static,
{
    pub fn new(resolver: F) -> Self {
        Self { resolver }
    }
}

impl<F> QueryResolver for FnResolver<F>
where
    F: Fn(&JobRef) -> ResolveFuture + Send + Sync + 'static,
{
    fn resolve(&self, job: &JobRef) -> ResolveFuture {
        (self.resolver)(job)
    }
}

/// A closure-based extractor.
pub struct FnExtractor<F>
where
    F: Fn(&str) -> ExtractFuture + Send + Sync + 'static,
{
    extractor: F,
}

impl<F> FnExtractor<F>
where
    F: Fn(&str) -> ExtractFuture + Send + Sync + 'static,
{
    pub fn new(extractor: F) -> Self {
        Self { extractor }
    }
}

impl<F> Extractor for FnExtractor<F>
where
    F: Fn(&str) -> ExtractFuture + Send + Sync + 'static,
{
    fn extract(&self, query: &str) -> ExtractFuture {
        (self.extractor)(query)
    }
}

/// Build an [`FnExtractor`] from an async block over the owned query.
#[macro_export]
macro_rules! extractor {
    (|$query:ident| $body:expr) => {
        $crate::FnExtractor::new(|$query: &str| {
            let $query = $query.to_string();
            Box::pin(async move { $body })
        })
    };
}
