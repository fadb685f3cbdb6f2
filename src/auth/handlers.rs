use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::service::{self, LoginRequest, RegisterRequest};
use crate::core::error::ApiError;
use crate::core::extract::Json;
use crate::core::shared::models::User;
use crate::core::shared::state::AppState;
use crate::security::AuthenticatedUser;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn auth_response(state: &AppState, user: User, message: &str) -> Result<AuthResponse, ApiError> {
    let access_token = state
        .jwt
        .issue_token(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(AuthResponse {
        message: message.to_string(),
        user,
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expiry_seconds(),
    })
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let hasher = state.hasher.clone();
    let user = state
        .store
        .run(move |repo| service::register(repo, &hasher, &req))
        .await?;
    let response = auth_response(&state, user, "User registered successfully")?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let hasher = state.hasher.clone();
    let user = state
        .store
        .run(move |repo| service::login(repo, &hasher, &req))
        .await?;
    Ok(Json(auth_response(&state, user, "Logged in successfully")?))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<User>, ApiError> {
    let current = state
        .store
        .run(move |repo| service::current_user(repo, user.user_id))
        .await?;
    Ok(Json(current))
}
