use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

use crate::error::Result;
use crate::services::scrape_orchestrator::ScrapeOrchestrator;

/// Fires a cycle now and then every `interval`. A trigger that lands while
/// adapters are still busy skips them rather than queueing.
pub async fn start(orchestrator: Arc<ScrapeOrchestrator>, interval: Duration) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let repeating = orchestrator.clone();
    let job = Job::new_repeated_async(interval, move |_job_id, _scheduler| {
        let orchestrator = repeating.clone();
        Box::pin(async move {
            orchestrator.run_cycle().await;
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    tokio::spawn(async move {
        orchestrator.run_cycle().await;
    });

    info!(interval_secs = interval.as_secs(), "Scrape scheduler started");
    Ok(scheduler)
}
