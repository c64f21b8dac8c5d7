//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub result: &'static str,
}

/// GET /healthcheck
async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { result: "Success" })
}

/// Health routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/healthcheck", get(healthcheck))
}
