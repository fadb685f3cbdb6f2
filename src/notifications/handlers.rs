use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::service;
use crate::core::error::ApiError;
use crate::core::extract::{Json, Path};
use crate::core::shared::models::Notification;
use crate::core::shared::state::AppState;
use crate::security::AuthenticatedUser;

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub message: String,
    pub updated: usize,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = state
        .store
        .run(move |repo| service::list_notifications(repo, user.user_id))
        .await?;
    Ok(Json(notifications))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification = state
        .store
        .run(move |repo| service::mark_read(repo, notification_id, user.user_id))
        .await?;
    Ok(Json(notification))
}

pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = state
        .store
        .run(move |repo| service::mark_all_read(repo, user.user_id))
        .await?;
    Ok(Json(MarkAllReadResponse {
        message: "All notifications marked as read".to_string(),
        updated,
    }))
}
