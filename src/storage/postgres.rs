use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::{BatchWrite, JobStore, UpsertResult};
use crate::error::StorageError;
use crate::models::job_posting::JobPosting;

const POSTING_COLUMNS: &str = "id, company, external_id, title, url, location_raw, location_norm, \
     remote_flag, date_posted, first_seen, last_seen, status, salary_min, salary_max, currency, raw_html";

// `xmax = 0` only holds for a row created by this statement, which tells an
// insert apart from the DO UPDATE branch.
const UPSERT_POSTING: &str = r#"
    INSERT INTO job_postings (
        id, company, external_id, title, url,
        location_raw, location_norm, remote_flag, date_posted,
        first_seen, last_seen, status,
        salary_min, salary_max, currency, raw_html
    ) VALUES (
        $1, $2, $3, $4, $5,
        $6, $7, $8, $9,
        $10, $10, 'open',
        $11, $12, $13, $14
    )
    ON CONFLICT (company, external_id) DO UPDATE SET
        title = EXCLUDED.title,
        url = EXCLUDED.url,
        location_raw = EXCLUDED.location_raw,
        location_norm = EXCLUDED.location_norm,
        remote_flag = EXCLUDED.remote_flag,
        date_posted = EXCLUDED.date_posted,
        salary_min = EXCLUDED.salary_min,
        salary_max = EXCLUDED.salary_max,
        currency = EXCLUDED.currency,
        raw_html = EXCLUDED.raw_html,
        last_seen = GREATEST(job_postings.last_seen, EXCLUDED.last_seen),
        status = 'open'
    RETURNING (xmax = 0) AS inserted
"#;

const CLOSE_MISSING: &str = r#"
    UPDATE job_postings
    SET status = 'closed'
    WHERE company = $1
      AND status = 'open'
      AND NOT (external_id = ANY($2))
"#;

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, batch), fields(records = batch.records.len()))]
    async fn commit_batch(&self, batch: BatchWrite<'_>) -> Result<UpsertResult, StorageError> {
        let mut result = UpsertResult::default();
        let mut tx = self.pool.begin().await?;

        for record in batch.records {
            let inserted: bool = sqlx::query_scalar(UPSERT_POSTING)
                .bind(Uuid::new_v4())
                .bind(&record.company)
                .bind(&record.external_id)
                .bind(&record.title)
                .bind(&record.url)
                .bind(&record.location_raw)
                .bind(&record.location_norm)
                .bind(record.remote_flag)
                .bind(record.date_posted)
                .bind(batch.seen_at)
                .bind(record.salary_min)
                .bind(record.salary_max)
                .bind(&record.currency)
                .bind(&record.raw_html)
                .fetch_one(&mut *tx)
                .await?;

            if inserted {
                result.inserted += 1;
            } else {
                result.updated += 1;
            }
        }

        if let Some(company) = batch.close_missing_for {
            let seen: Vec<String> = batch
                .records
                .iter()
                .map(|r| r.external_id.clone())
                .chain(batch.keep_open.iter().cloned())
                .collect();
            let closed = sqlx::query(CLOSE_MISSING)
                .bind(company)
                .bind(&seen)
                .execute(&mut *tx)
                .await?;
            result.closed = closed.rows_affected();
        }

        // Dropping `tx` on any early return above rolls the whole batch back.
        tx.commit().await?;
        Ok(result)
    }

    async fn find(
        &self,
        company: &str,
        external_id: &str,
    ) -> Result<Option<JobPosting>, StorageError> {
        let query = format!(
            "SELECT {} FROM job_postings WHERE company = $1 AND external_id = $2",
            POSTING_COLUMNS
        );
        let posting = sqlx::query_as::<_, JobPosting>(&query)
            .bind(company)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(posting)
    }

    async fn list_open(&self) -> Result<Vec<JobPosting>, StorageError> {
        let query = format!(
            "SELECT {} FROM job_postings WHERE status = 'open' ORDER BY last_seen DESC, company, external_id",
            POSTING_COLUMNS
        );
        let items = sqlx::query_as::<_, JobPosting>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM job_postings")
            .fetch_one(&self.pool)
            .await?;
        Ok(total.max(0) as u64)
    }
}
