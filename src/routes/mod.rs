pub mod health;
pub mod jobs;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{middleware::cors::read_only_cors, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/jobs", get(jobs::list_jobs))
        .with_state(state)
        .layer(read_only_cors())
        .layer(TraceLayer::new_for_http())
}
