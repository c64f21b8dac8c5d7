//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use agora_db::DbError;
use agora_services::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::ValidationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed query, e.g. unknown field (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    Conflict { message: String },

    /// Optional service not configured (503)
    Unavailable { service: &'static str },

    /// Database error (500, logged)
    Database(DbError),

    /// Outbound service error (500, logged)
    Service(ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_request",
                    "message": message
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Unavailable { service } => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "unavailable",
                    "message": format!("{} is not configured", service)
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Service(e) => {
                tracing::error!("Service error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            DbError::InvalidField(message) => Self::BadRequest { message },
            DbError::MissingFilter => Self::BadRequest {
                message: e.to_string(),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotConfigured(service) => Self::Unavailable { service },
            ServiceError::ObjectNotFound(id) => Self::NotFound {
                resource: "file",
                id,
            },
            _ => Self::Service(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_db::SessionState;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "prompt" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn db_errors_map_to_status() {
        let cases = [
            (
                DbError::NotFound {
                    resource: "user",
                    id: "7".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (DbError::InvalidField("nope".into()), StatusCode::BAD_REQUEST),
            (DbError::MissingFilter, StatusCode::BAD_REQUEST),
            (DbError::Conflict("duplicate".into()), StatusCode::CONFLICT),
            (
                DbError::InvalidState {
                    state: SessionState::Closed,
                    operation: "commit",
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = ApiError::from(DbError::Configuration("postgres://secret@host".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("secret"));
    }

    #[tokio::test]
    async fn unconfigured_service_is_503() {
        let err = ApiError::from(ServiceError::NotConfigured("AWS_BUCKET_NAME"));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn missing_object_is_404() {
        let err = ApiError::from(ServiceError::ObjectNotFound("a.txt".into()));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
