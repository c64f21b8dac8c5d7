//! File storage endpoints
//!
//! Objects are addressed by a single validated name. Every route answers
//! 503 when object storage is not configured.

use std::sync::Arc;

use agora_services::ObjectStorage;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::ValidFileName;
use crate::models::{UrlParams, ValidationError};
use crate::state::AppState;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Signed URL response
#[derive(Serialize)]
pub struct FileUrlResponse {
    pub name: String,
    pub url: String,
}

fn storage(state: &AppState) -> Result<&Arc<dyn ObjectStorage>, ApiError> {
    state.storage.as_ref().ok_or(ApiError::Unavailable {
        service: "object storage",
    })
}

/// PUT /v1/files/{name} - upload raw body
async fn upload_file(
    State(state): State<Arc<AppState>>,
    ValidFileName(name): ValidFileName,
    body: Bytes,
) -> Result<(StatusCode, Json<FileUrlResponse>), ApiError> {
    let storage = storage(&state)?;
    if body.is_empty() {
        return Err(ValidationError::Empty { field: "file" }.into());
    }

    let url = storage.upload(name.as_str(), body.to_vec()).await?;
    tracing::info!(file = name.as_str(), size = body.len(), "file uploaded");

    Ok((
        StatusCode::CREATED,
        Json(FileUrlResponse {
            name: name.as_str().to_owned(),
            url,
        }),
    ))
}

/// GET /v1/files/{name} - download bytes
async fn download_file(
    State(state): State<Arc<AppState>>,
    ValidFileName(name): ValidFileName,
) -> Result<impl IntoResponse, ApiError> {
    let object = storage(&state)?.download(name.as_str()).await?;
    Ok(([(header::CONTENT_TYPE, object.content_type)], object.bytes))
}

/// GET /v1/files/{name}/url - signed URL
async fn file_url(
    State(state): State<Arc<AppState>>,
    ValidFileName(name): ValidFileName,
    Query(params): Query<UrlParams>,
) -> Result<Json<FileUrlResponse>, ApiError> {
    let expires_in = params.expires_in()?;
    let url = storage(&state)?
        .signed_url(name.as_str(), expires_in)
        .await?;

    Ok(Json(FileUrlResponse {
        name: name.as_str().to_owned(),
        url,
    }))
}

/// DELETE /v1/files/{name}
async fn delete_file(
    State(state): State<Arc<AppState>>,
    ValidFileName(name): ValidFileName,
) -> Result<StatusCode, ApiError> {
    storage(&state)?.delete(name.as_str()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// File routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/v1/files/{name}",
            get(download_file).put(upload_file).delete(delete_file),
        )
        .route("/v1/files/{name}/url", get(file_url))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
