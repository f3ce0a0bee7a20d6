//! Recorded extraction results used in place of a live place-search session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use actors::{ExtractFuture, Extraction, Extractor};
use quarry_core::{BusinessRecord, JobId};
use serde::Deserialize;

/// Error type for fixture loading.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Failed to read fixture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Fixture contains no jobs")]
    NoJobs,
}

/// A queued search job.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureJob {
    pub id: JobId,
    pub query: String,
}

/// Jobs to enqueue plus the records each query returns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    pub jobs: Vec<FixtureJob>,
    /// Records keyed by query string. Queries without an entry fail.
    #[serde(default)]
    pub results: HashMap<String, Vec<BusinessRecord>>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| FixtureError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn job_ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(|job| job.id.clone()).collect()
    }

    /// Id-to-query table for the queue's resolver.
    pub fn queries(&self) -> HashMap<JobId, String> {
        self.jobs
            .iter()
            .map(|job| (job.id.clone(), job.query.clone()))
            .collect()
    }

    pub fn extractor(&self) -> FixtureExtractor {
        FixtureExtractor {
            results: Arc::new(self.results.clone()),
        }
    }
}

/// Extractor that replays recorded results.
#[derive(Clone)]
pub struct FixtureExtractor {
    results: Arc<HashMap<String, Vec<BusinessRecord>>>,
}

impl Extractor for FixtureExtractor {
    fn extract(&self, query: &str) -> ExtractFuture {
        let started = Instant::now();
        let result = match self.results.get(query) {
            Some(records) => {
                let records = records
                    .iter()
                    .cloned()
                    .map(|mut record| {
                        record.search_query.get_or_insert_with(|| query.to_string());
                        record
                    })
                    .collect();
                Ok(Extraction::new(records, started.elapsed().max(Duration::from_millis(1))))
            }
            None => Err(format!("No results recorded for \"{}\"", query)),
        };
        Box::pin(async move { result })
    }
}
