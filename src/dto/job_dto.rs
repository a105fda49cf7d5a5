use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job_posting::{JobPosting, JobStatus};

/// Public shape of a posting; audit fields stay internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRead {
    pub id: Uuid,
    pub external_id: String,
    pub company: String,
    pub title: String,
    pub location_raw: Option<String>,
    pub location_norm: Option<String>,
    pub remote_flag: bool,
    pub date_posted: Option<NaiveDate>,
    pub status: JobStatus,
    pub url: String,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: Option<String>,
}

impl From<JobPosting> for JobRead {
    fn from(posting: JobPosting) -> Self {
        Self {
            id: posting.id,
            external_id: posting.external_id,
            company: posting.company,
            title: posting.title,
            location_raw: posting.location_raw,
            location_norm: posting.location_norm,
            remote_flag: posting.remote_flag,
            date_posted: posting.date_posted,
            status: posting.status,
            url: posting.url,
            salary_min: posting.salary_min,
            salary_max: posting.salary_max,
            currency: posting.currency,
        }
    }
}
