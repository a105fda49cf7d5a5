pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::StorageError;
use crate::models::job_posting::{JobPosting, RawJobRecord};

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertResult {
    pub inserted: u64,
    pub updated: u64,
    pub closed: u64,
}

/// One adapter's worth of writes, committed as a single unit.
#[derive(Debug, Clone, Copy)]
pub struct BatchWrite<'a> {
    /// Distinct posting keys only.
    pub records: &'a [RawJobRecord],
    pub seen_at: DateTime<Utc>,
    /// When set, open postings of this company that are not in `records` are closed.
    pub close_missing_for: Option<&'a str>,
    /// External ids that count as seen for closing even though they have no record.
    pub keep_open: &'a [String],
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Applies every upsert (and the optional close) atomically.
    async fn commit_batch(&self, batch: BatchWrite<'_>) -> Result<UpsertResult, StorageError>;

    async fn find(
        &self,
        company: &str,
        external_id: &str,
    ) -> Result<Option<JobPosting>, StorageError>;

    /// Open postings, most recently seen first.
    async fn list_open(&self) -> Result<Vec<JobPosting>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;
}
