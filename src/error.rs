use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match self {
            Error::Storage(err) => {
                tracing::error!(error = ?err, "Storage failure while serving request");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Job storage is unavailable".to_string(),
                )
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::Storage(StorageError::Database(err))
    }
}

/// Failure to retrieve a page. Recovered by retrying on the next cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} timed out")]
    Timeout { url: String },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AdapterCause {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("listing container `{0}` not found on page")]
    MissingRoot(String),

    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Whole-site failure for one adapter; the rest of the cycle is unaffected.
#[derive(Debug, thiserror::Error)]
#[error("adapter `{company}` failed: {cause}")]
pub struct AdapterError {
    pub company: String,
    #[source]
    pub cause: AdapterCause,
}

impl AdapterError {
    pub fn new(company: impl Into<String>, cause: impl Into<AdapterCause>) -> Self {
        Self {
            company: company.into(),
            cause: cause.into(),
        }
    }
}

/// Why a single listing element was dropped. Counted, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingSkip {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed external id {0:?}")]
    MalformedId(String),

    #[error("listing belongs to `{found}`, expected `{expected}`")]
    ForeignCompany { expected: String, found: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
