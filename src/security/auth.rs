use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::state::AppState;
use crate::security::jwt::extract_bearer_token;

/// Caller identity taken from a valid `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = Arc::<AppState>::from_ref(state);

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(|| ApiError::Unauthenticated("Missing authentication token".into()))?;

        let user_id = app_state.jwt.verify_token(token).map_err(|e| {
            debug!("Rejected bearer token: {e}");
            ApiError::Unauthenticated("Invalid or expired token".into())
        })?;

        Ok(Self { user_id })
    }
}
