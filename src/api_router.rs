//! API Router
//!
//! Combines the endpoints of every module into one router, mounted under
//! `/api` by the server.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(crate::main_module::health_check))
        // ===== Identity =====
        .merge(crate::auth::configure())
        // ===== Projects & memberships =====
        .merge(crate::project::configure())
        // ===== Tasks, dependencies, comments, attachments =====
        .merge(crate::tasks::configure())
        // ===== Notifications =====
        .merge(crate::notifications::configure())
}
