//! Tasks with subtasks, dependency edges, comments and attachments.
//!
//! Every operation first resolves the task and checks that the caller can
//! access its project: a missing task is 404, a task in someone else's
//! project is 403.

pub mod attachments;
pub mod comments;
pub mod dependencies;
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
            "/projects/:project_id/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route(
            "/tasks/:task_id",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route(
            "/tasks/:task_id/dependencies",
            get(handlers::list_dependencies).post(handlers::add_dependency),
        )
        .route(
            "/dependencies/:dependency_id",
            delete(handlers::delete_dependency),
        )
        .route(
            "/tasks/:task_id/comments",
            get(handlers::list_comments).post(handlers::add_comment),
        )
        .route("/comments/:comment_id", delete(handlers::delete_comment))
        .route(
            "/tasks/:task_id/attachments",
            get(handlers::list_attachments).post(handlers::add_attachment),
        )
        .route(
            "/attachments/:attachment_id",
            delete(handlers::delete_attachment),
        )
}
