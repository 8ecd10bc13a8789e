//! Registration and login endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{Principal, Role, UserId};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: UserId,
    pub email: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// -- Handlers --

/// POST /auth/register — create a customer account.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".to_string()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let id = store::users::insert(
        &mut conn,
        &req.fullname,
        &req.email,
        &password_hash,
        req.address.as_deref(),
        req.phone_number.as_deref(),
        Role::Customer,
    )
    .await
    .map_err(|err| {
        if err.is_unique_violation() {
            ApiError::Conflict("Email already registered".to_string())
        } else {
            ApiError::from(err)
        }
    })?;

    tracing::info!(user_id = %id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id,
            email: req.email,
        }),
    ))
}

/// POST /auth/login — verify credentials and issue a bearer token.
#[tracing::instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut conn = state.pool.acquire().await.map_err(store::StoreError::from)?;
    let user = store::users::get_by_email(&mut conn, &req.email).await?;

    // Same rejection whether the email is unknown or the password is wrong.
    let invalid = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let user = user.ok_or_else(invalid)?;
    if !verify_password(&user.password_hash, &req.password)? {
        return Err(invalid());
    }

    let role = Role::parse(&user.role)
        .ok_or_else(|| ApiError::Internal(format!("unknown stored role: {}", user.role)))?;
    let principal = Principal {
        id: user.id,
        email: user.email,
        role,
    };
    let access_token = state.auth.issue(&principal)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
