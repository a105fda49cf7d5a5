use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

use crate::{dto::job_dto::JobRead, error::Result, AppState};

#[axum::debug_handler]
pub async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let postings = state.store.list_open().await?;
    let items: Vec<JobRead> = postings.into_iter().map(JobRead::from).collect();
    Ok(Json(items))
}
