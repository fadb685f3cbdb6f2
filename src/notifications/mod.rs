//! Per-user notifications.
//!
//! Other services create notifications as side effects; users poll, read and
//! acknowledge them through the routes below.

pub mod handlers;
pub mod service;

use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub use service::create_notification;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/mark_all_read", put(handlers::mark_all_read))
        .route("/notifications/:notification_id/read", put(handlers::mark_read))
}
