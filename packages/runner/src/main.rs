//! Quarry queue runner.
//!
//! Loads a fixture of search jobs and recorded results, pushes the jobs
//! through the extraction queue and prints each batch's quality report.

mod fixture;

use std::path::PathBuf;
use std::time::Duration;

use actors::{Collaborators, JobOutcome, start_service};
use anyhow::{Context, Result};
use clap::Parser;
use quarry_core::{OwnerId, QueueConfig};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::fixture::Fixture;

#[derive(Parser, Debug)]
#[command(name = "quarry-runner")]
#[command(version)]
#[command(about = "Run queued place-search jobs through quality scoring")]
struct Args {
    /// Fixture file with jobs and recorded extraction results
    #[arg(long, env = "QUARRY_FIXTURE")]
    fixture: PathBuf,

    /// Owner the jobs are enqueued for
    #[arg(long, env = "QUARRY_OWNER", default_value = "local")]
    owner: String,

    /// Delay between jobs in milliseconds (overrides QUARRY_RATE_LIMIT_MS)
    #[arg(long)]
    rate_limit_ms: Option<u64>,

    /// Print full reports as JSON
    #[arg(long)]
    json: bool,

    /// Seconds to wait for each job before giving up
    #[arg(long, default_value = "30")]
    job_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = QueueConfig::from_env();
    if let Some(ms) = args.rate_limit_ms {
        config = config.with_rate_limit(Duration::from_millis(ms));
    }

    let fixture = Fixture::load(&args.fixture)?;
    if fixture.jobs.is_empty() {
        return Err(fixture::FixtureError::NoJobs.into());
    }
    tracing::info!(
        "Loaded {} jobs from {}",
        fixture.jobs.len(),
        args.fixture.display()
    );

    let (sink, mut outcomes) = mpsc::unbounded_channel();
    let collaborators = Collaborators::new(fixture.queries(), fixture.extractor(), sink);
    let service = start_service(config, collaborators)
        .await
        .context("Failed to start extraction queue")?;
    let queue = service.queue().clone();

    let owner = OwnerId::new(args.owner);
    let receipt = queue.enqueue(fixture.job_ids(), owner.clone()).await?;
    tracing::info!("Enqueued {} jobs", receipt.queued);
    queue.start().await?;

    let per_job = Duration::from_secs(args.job_timeout_secs);
    for _ in 0..receipt.queued {
        let outcome = tokio::time::timeout(per_job, outcomes.recv())
            .await
            .context("Timed out waiting for a job to finish")?
            .context("Result channel closed")?;
        print_outcome(&outcome, args.json)?;
    }

    // Completion is recorded after delivery; give the last one a moment to land.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = queue.status(Some(&owner)).await?;
    println!(
        "Done: {} processed, {} failed, avg {:.2}s per job",
        status.processed_count, status.error_count, status.avg_processing_time
    );

    service.shutdown().await;
    Ok(())
}

fn print_outcome(outcome: &JobOutcome, json: bool) -> Result<()> {
    match outcome {
        JobOutcome::Succeeded {
            job,
            query,
            report,
            extraction_time,
            ..
        } => {
            println!(
                "{} \"{}\": {} records, avg score {:.1}, {} complete, {} duplicate groups ({:?} extracting)",
                job.job_id,
                query,
                report.total_records,
                report.average_score,
                report.complete,
                report.duplicates,
                extraction_time
            );
            if json {
                println!("{}", serde_json::to_string_pretty(report)?);
            }
        }
        JobOutcome::Failed { job, error, .. } => {
            println!("{} failed: {}", job.job_id, error);
        }
    }
    Ok(())
}
