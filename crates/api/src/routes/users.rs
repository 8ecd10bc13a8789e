//! Profile endpoints for the authenticated user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};
use store::users::UserPatch;

use crate::AppState;
use crate::auth::AuthPrincipal;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub fullname: String,
    pub email: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<store::UserRow> for UserResponse {
    fn from(row: store::UserRow) -> Self {
        UserResponse {
            id: row.id,
            fullname: row.fullname,
            email: row.email,
            address: row.address,
            phone_number: row.phone_number,
            role: row.role,
            created_at: row.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub fullname: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

/// GET /users/me — the caller's profile.
#[tracing::instrument(skip(state), fields(user_id = %principal.id))]
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<UserResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let user = store::users::get(&mut conn, principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/me — partial profile update, returns the updated profile.
#[tracing::instrument(skip(state, req), fields(user_id = %principal.id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let patch = UserPatch {
        fullname: req.fullname,
        address: req.address,
        phone_number: req.phone_number,
    };

    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    store::users::update(&mut conn, principal.id, &patch).await?;

    let user = store::users::get(&mut conn, principal.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}
