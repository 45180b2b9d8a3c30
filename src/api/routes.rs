//! API Routes
//!
//! HTTP endpoint definitions.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OperationContext, User};
use crate::error::{AppError, AppResult};
use crate::service::{CreateUserParams, UpdateUserParams};

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub nickname: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    /// Version the client last read
    pub version: u32,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub email: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
    pub version: u32,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
            nickname: user.nickname().to_string(),
            email: user.email().to_string(),
            country: user.country().to_string(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
            active: !user.is_disabled(),
            version: user.version(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Hand a committed user to the publisher; failures are only logged
async fn publish(state: &AppState, user: &User) {
    if let Err(e) = state.publisher.publish(user).await {
        tracing::warn!(user_id = user.id(), error = %e, "Failed to publish user change");
    }
}

// =========================================================================
// GET /users/:user_id
// =========================================================================

async fn get_user(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state.users.get_user(&context, user_id).await?;

    Ok(Json(UserResponse::from(&user)))
}

// =========================================================================
// GET /users?country=..&nickname=..
// =========================================================================

/// List users; empty query values are ignored
async fn list_users(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Query(mut terms): Query<HashMap<String, String>>,
) -> AppResult<Json<UsersResponse>> {
    terms.retain(|_, value| !value.is_empty());

    let users = state.users.list_users(&context, &terms).await?;

    Ok(Json(UsersResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

// =========================================================================
// POST /users
// =========================================================================

async fn create_user(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Json(request): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    if request.nickname.trim().is_empty() {
        return Err(AppError::InvalidRequest("nickname is required".to_string()));
    }

    let params = CreateUserParams {
        first_name: request.first_name,
        last_name: request.last_name,
        nickname: request.nickname,
        password: request.password,
        email: request.email,
        country: request.country,
    };

    let user = state.users.create_user(&context, params).await?;
    publish(&state, &user).await;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

// =========================================================================
// PUT /users/:user_id
// =========================================================================

async fn update_user(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let params = UpdateUserParams {
        id: user_id,
        version: request.version,
        first_name: request.first_name,
        last_name: request.last_name,
        nickname: request.nickname,
        password: request.password,
        email: request.email,
        country: request.country,
    };

    let user = state.users.update_user(&context, params).await?;
    publish(&state, &user).await;

    Ok(Json(UserResponse::from(&user)))
}

// =========================================================================
// DELETE /users/:user_id
// =========================================================================

/// Soft delete
async fn delete_user(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.users.delete_user(&context, user_id).await?;

    Ok(StatusCode::OK)
}

// =========================================================================
// GET /_/health
// =========================================================================

/// Health check endpoint (no context required)
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match crate::db::verify_connection(state.users.store().pool()).await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE")
        }
    }
}
