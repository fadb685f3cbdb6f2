//! Projects and their memberships.
//!
//! The owner manages the project and its member list; members may read the
//! project and work on its tasks.

pub mod handlers;
pub mod service;
pub mod types;

use axum::{
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/:project_id",
            get(handlers::get_project)
                .put(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route(
            "/projects/:project_id/members",
            get(handlers::list_members).post(handlers::add_member),
        )
        .route(
            "/projects/:project_id/members/:user_id",
            delete(handlers::remove_member),
        )
}
