use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::scraping::{AdapterStage, SiteAdapter};
use crate::services::ingest_service::{IngestReport, IngestService};

#[derive(Debug, Clone, Serialize)]
pub struct AdapterOutcome {
    pub company: String,
    pub stage: AdapterStage,
    pub report: IngestReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdapterOutcome {
    fn completed(company: String, report: IngestReport) -> Self {
        Self {
            company,
            stage: AdapterStage::Completed,
            report,
            error: None,
        }
    }

    fn failed(company: String, skipped: usize, error: String) -> Self {
        Self {
            company,
            stage: AdapterStage::Failed,
            report: IngestReport {
                skipped,
                ..IngestReport::default()
            },
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleOutcome {
    pub cycle: u64,
    pub per_adapter: Vec<AdapterOutcome>,
    pub inserted: u64,
    pub updated: u64,
    pub closed: u64,
    pub skipped_listings: usize,
    pub failed: Vec<String>,
    /// Adapters still busy with an earlier cycle.
    pub skipped_adapters: Vec<String>,
    pub elapsed_ms: u64,
}

impl CycleOutcome {
    fn record(&mut self, outcome: AdapterOutcome) {
        self.inserted += outcome.report.upsert.inserted;
        self.updated += outcome.report.upsert.updated;
        self.closed += outcome.report.upsert.closed;
        self.skipped_listings += outcome.report.skipped;
        if outcome.stage == AdapterStage::Failed {
            self.failed.push(outcome.company.clone());
        }
        self.per_adapter.push(outcome);
    }

    pub fn succeeded(&self) -> usize {
        self.per_adapter
            .iter()
            .filter(|o| o.stage == AdapterStage::Completed)
            .count()
    }
}

struct AdapterSlot {
    adapter: Arc<dyn SiteAdapter>,
    running: Arc<Mutex<()>>,
}

/// Drives one fetch-parse-upsert pass per registered adapter. Holds the fixed
/// adapter list for the life of the process.
pub struct ScrapeOrchestrator {
    slots: Vec<AdapterSlot>,
    ingest: IngestService,
    cycles: AtomicU64,
}

impl ScrapeOrchestrator {
    pub fn new(adapters: Vec<Arc<dyn SiteAdapter>>, ingest: IngestService) -> Self {
        let slots = adapters
            .into_iter()
            .map(|adapter| AdapterSlot {
                adapter,
                running: Arc::new(Mutex::new(())),
            })
            .collect();
        Self {
            slots,
            ingest,
            cycles: AtomicU64::new(0),
        }
    }

    pub fn companies(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.adapter.company()).collect()
    }

    /// Runs every idle adapter concurrently and returns once all of them have
    /// finished. Adapters still running from an earlier trigger are skipped,
    /// not queued. Never fails: errors are logged and reported in the outcome.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();
        let mut outcome = CycleOutcome {
            cycle,
            ..CycleOutcome::default()
        };

        info!(cycle, adapters = self.slots.len(), "Scrape cycle started");

        let mut tasks: Vec<(String, JoinHandle<AdapterOutcome>)> = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            let company = slot.adapter.company().to_string();
            let Ok(guard) = slot.running.clone().try_lock_owned() else {
                warn!(cycle, company = %company, "Previous cycle still running; skipping adapter");
                outcome.skipped_adapters.push(company);
                continue;
            };

            let adapter = slot.adapter.clone();
            let ingest = self.ingest.clone();
            let handle = tokio::spawn(async move {
                let _running = guard;
                run_adapter(adapter.as_ref(), &ingest).await
            });
            tasks.push((company, handle));
        }

        for (company, handle) in tasks {
            let adapter_outcome = match handle.await {
                Ok(adapter_outcome) => adapter_outcome,
                Err(join_err) => {
                    error!(cycle, company = %company, error = %join_err, "Adapter task aborted");
                    AdapterOutcome::failed(company, 0, format!("adapter task aborted: {}", join_err))
                }
            };
            outcome.record(adapter_outcome);
        }

        outcome.elapsed_ms = started.elapsed().as_millis() as u64;
        info!(
            cycle,
            inserted = outcome.inserted,
            updated = outcome.updated,
            closed = outcome.closed,
            skipped_listings = outcome.skipped_listings,
            succeeded = outcome.succeeded(),
            failed = ?outcome.failed,
            skipped_adapters = ?outcome.skipped_adapters,
            elapsed_ms = outcome.elapsed_ms,
            "Scrape cycle complete"
        );
        outcome
    }
}

async fn run_adapter(adapter: &dyn SiteAdapter, ingest: &IngestService) -> AdapterOutcome {
    let company = adapter.company().to_string();
    debug!(company = %company, stage = %AdapterStage::Idle, "Adapter stage");

    let batch = match adapter.fetch_postings().await {
        Ok(batch) => batch,
        Err(e) => {
            error!(company = %company, stage = %AdapterStage::Failed, error = %e, "Adapter fetch failed");
            return AdapterOutcome::failed(company, 0, e.to_string());
        }
    };

    debug!(company = %company, stage = %AdapterStage::Upserting, records = batch.records.len(), "Adapter stage");
    match ingest.ingest_scrape(&batch).await {
        Ok(report) => {
            info!(
                company = %company,
                inserted = report.upsert.inserted,
                updated = report.upsert.updated,
                closed = report.upsert.closed,
                skipped = report.skipped,
                "Adapter ingested"
            );
            AdapterOutcome::completed(company, report)
        }
        Err(e) => {
            error!(company = %company, stage = %AdapterStage::Failed, error = %e, "Batch rolled back");
            AdapterOutcome::failed(company, batch.skipped, e.to_string())
        }
    }
}
