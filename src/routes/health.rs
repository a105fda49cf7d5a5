use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
}

/// Liveness only; it does not touch storage.
pub async fn health() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}
