use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BatchWrite, JobStore, UpsertResult};
use crate::error::StorageError;
use crate::models::job_posting::{JobPosting, JobStatus, PostingKey};

/// Non-durable store with the same batch semantics as [`super::PgJobStore`].
/// Used for dry runs and tests.
#[derive(Default)]
pub struct MemoryJobStore {
    rows: RwLock<BTreeMap<PostingKey, JobPosting>>,
    reject_commits: AtomicBool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every `commit_batch` fails before touching any row.
    pub fn reject_commits(&self, reject: bool) {
        self.reject_commits.store(reject, Ordering::SeqCst);
    }

    pub async fn set_status(&self, company: &str, external_id: &str, status: JobStatus) -> bool {
        let key = PostingKey {
            company: company.to_string(),
            external_id: external_id.to_string(),
        };
        match self.rows.write().await.get_mut(&key) {
            Some(posting) => {
                posting.status = status;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn commit_batch(&self, batch: BatchWrite<'_>) -> Result<UpsertResult, StorageError> {
        // Holding the write lock for the whole batch keeps readers from
        // observing a half-applied batch.
        let mut rows = self.rows.write().await;

        if self.reject_commits.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "commit rejected by memory store".to_string(),
            ));
        }

        let mut result = UpsertResult::default();
        for record in batch.records {
            match rows.get_mut(&record.key()) {
                Some(existing) => {
                    existing.refresh_from(record, batch.seen_at);
                    result.updated += 1;
                }
                None => {
                    rows.insert(record.key(), JobPosting::from_record(record, batch.seen_at));
                    result.inserted += 1;
                }
            }
        }

        if let Some(company) = batch.close_missing_for {
            let seen: HashSet<&str> = batch
                .records
                .iter()
                .map(|r| r.external_id.as_str())
                .chain(batch.keep_open.iter().map(String::as_str))
                .collect();
            for posting in rows.values_mut() {
                if posting.company == company
                    && posting.status == JobStatus::Open
                    && !seen.contains(posting.external_id.as_str())
                {
                    posting.status = JobStatus::Closed;
                    result.closed += 1;
                }
            }
        }

        Ok(result)
    }

    async fn find(
        &self,
        company: &str,
        external_id: &str,
    ) -> Result<Option<JobPosting>, StorageError> {
        let key = PostingKey {
            company: company.to_string(),
            external_id: external_id.to_string(),
        };
        Ok(self.rows.read().await.get(&key).cloned())
    }

    async fn list_open(&self) -> Result<Vec<JobPosting>, StorageError> {
        let mut open: Vec<JobPosting> = self
            .rows
            .read()
            .await
            .values()
            .filter(|p| p.status == JobStatus::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then_with(|| a.key().cmp(&b.key())));
        Ok(open)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.rows.read().await.len() as u64)
    }
}
