//! User endpoints
//!
//! Every handler runs exactly one unit of work through
//! `SessionFactory::scope`, so the session is rolled back and closed on
//! every exit path before the response is built.

use std::collections::HashMap;
use std::sync::Arc;

use agora_db::models::UserFilter;
use agora_db::repos::UserRepo;
use agora_db::DbError;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::extractors::UserId;
use crate::models::{Pagination, PaginationParams, UserPatch, UserRequest, UserResponse};
use crate::state::AppState;

/// GET /v1/users - list users
async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let page = Pagination::from(params);
    let users = state
        .db
        .sessions()
        .scope(|session| {
            Box::pin(async move { UserRepo::new(session).get_all(page.limit, page.offset).await })
        })
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /v1/users/search?field=value - users matching every given field
async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let mut filters = params
        .iter()
        .map(|(field, value)| UserFilter::parse(field, value))
        .collect::<Result<Vec<_>, DbError>>()?;
    if filters.is_empty() {
        return Err(DbError::MissingFilter.into());
    }
    // HashMap order is arbitrary; keep generated SQL stable
    filters.sort_by_key(|f| f.field.column());

    let users = state
        .db
        .sessions()
        .scope(|session| Box::pin(async move { UserRepo::new(session).find_many(&filters).await }))
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /v1/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .sessions()
        .scope(|session| {
            Box::pin(async move {
                UserRepo::new(session)
                    .find_unique(&[UserFilter::id(id)])
                    .await
            })
        })
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// POST /v1/users/create
async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let new_user = req.validate()?;
    tracing::debug!(username = %new_user.username, "creating user");

    let user = state
        .db
        .sessions()
        .scope(|session| Box::pin(async move { UserRepo::new(session).create_one(new_user).await }))
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// PATCH /v1/users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    Json(patch): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let update = patch.validate()?;

    let user = state
        .db
        .sessions()
        .scope(|session| Box::pin(async move { UserRepo::new(session).update_one(id, update).await }))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /v1/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<StatusCode, ApiError> {
    state
        .db
        .sessions()
        .scope(|session| Box::pin(async move { UserRepo::new(session).delete_one(id).await }))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/users", get(list_users))
        .route("/v1/users/search", get(search_users))
        .route("/v1/users/create", post(create_user))
        .route(
            "/v1/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
