use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::error::{ListingSkip, StorageError};
use crate::models::job_posting::{PostingKey, RawJobRecord};
use crate::scraping::ScrapeBatch;
use crate::storage::{BatchWrite, JobStore, UpsertResult};
use crate::utils::time;

/// Outcome of reconciling one adapter's scrape with storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub upsert: UpsertResult,
    pub skipped: usize,
}

/// Sole owner of the RawJobRecord -> JobPosting translation.
#[derive(Clone)]
pub struct IngestService {
    store: Arc<dyn JobStore>,
}

impl IngestService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn upsert_batch(&self, records: &[RawJobRecord]) -> Result<UpsertResult, StorageError> {
        self.upsert_batch_at(records, time::now()).await
    }

    /// Inserts unseen keys and refreshes known ones, all in one transaction.
    /// Later records win over earlier ones with the same key.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn upsert_batch_at(
        &self,
        records: &[RawJobRecord],
        now: DateTime<Utc>,
    ) -> Result<UpsertResult, StorageError> {
        if records.is_empty() {
            return Ok(UpsertResult::default());
        }

        let distinct = last_write_wins(records.iter());
        self.store
            .commit_batch(BatchWrite {
                records: &distinct,
                seen_at: now,
                close_missing_for: None,
                keep_open: &[],
            })
            .await
    }

    pub async fn ingest_scrape(&self, batch: &ScrapeBatch) -> Result<IngestReport, StorageError> {
        self.ingest_scrape_at(batch, time::now()).await
    }

    /// Upserts a successful scrape and closes the company's open postings that
    /// it no longer lists, in the same transaction. Listings that are on the
    /// page but failed to parse stay open.
    #[instrument(skip(self, batch), fields(company = %batch.company, records = batch.records.len()))]
    pub async fn ingest_scrape_at(
        &self,
        batch: &ScrapeBatch,
        now: DateTime<Utc>,
    ) -> Result<IngestReport, StorageError> {
        let mut skipped = batch.skipped;

        let (own, foreign): (Vec<&RawJobRecord>, Vec<&RawJobRecord>) = batch
            .records
            .iter()
            .partition(|r| r.company == batch.company);
        for record in &foreign {
            let reason = ListingSkip::ForeignCompany {
                expected: batch.company.clone(),
                found: record.company.clone(),
            };
            warn!(external_id = %record.external_id, %reason, "Dropping record");
        }
        skipped += foreign.len();

        // An empty page is more often a layout change than a company with no
        // openings, so it never closes anything.
        if own.is_empty() {
            debug!("Scrape returned no postings; leaving stored postings untouched");
            return Ok(IngestReport {
                upsert: UpsertResult::default(),
                skipped,
            });
        }

        let distinct = last_write_wins(own.into_iter());
        let upsert = self
            .store
            .commit_batch(BatchWrite {
                records: &distinct,
                seen_at: now,
                close_missing_for: Some(&batch.company),
                keep_open: &batch.unparsed_ids,
            })
            .await?;

        Ok(IngestReport { upsert, skipped })
    }
}

/// Collapses duplicate keys, keeping the last record's fields and the first
/// occurrence's position.
fn last_write_wins<'a>(records: impl Iterator<Item = &'a RawJobRecord>) -> Vec<RawJobRecord> {
    let mut positions: HashMap<PostingKey, usize> = HashMap::new();
    let mut distinct: Vec<RawJobRecord> = Vec::new();

    for record in records {
        match positions.get(&record.key()) {
            Some(&idx) => distinct[idx] = record.clone(),
            None => {
                positions.insert(record.key(), distinct.len());
                distinct.push(record.clone());
            }
        }
    }
    distinct
}
