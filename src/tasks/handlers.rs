use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    AddAttachmentRequest, AddCommentRequest, AddDependencyRequest, CreateTaskRequest,
    UpdateTaskRequest,
};
use super::{attachments, comments, dependencies, service};
use crate::core::error::ApiError;
use crate::core::extract::{Json, Path};
use crate::core::shared::models::{Comment, Dependency, Task, TaskAttachment};
use crate::core::shared::state::AppState;
use crate::security::AuthenticatedUser;

/// Handler for listing the tasks of a project
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state
        .store
        .run(move |repo| service::list_tasks(repo, project_id, user.user_id))
        .await?;
    Ok(Json(tasks))
}

/// Handler for creating a task inside a project
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state
        .store
        .run(move |repo| service::create_task(repo, project_id, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .store
        .run(move |repo| service::get_task(repo, task_id, user.user_id))
        .await?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .store
        .run(move |repo| service::update_task(repo, task_id, user.user_id, &req))
        .await?;
    Ok(Json(task))
}

/// Handler for deleting a task. Subtasks survive as top-level tasks.
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| service::delete_task(repo, task_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_dependencies(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Dependency>>, ApiError> {
    let edges = state
        .store
        .run(move |repo| dependencies::list_dependencies(repo, task_id, user.user_id))
        .await?;
    Ok(Json(edges))
}

/// Handler for adding a dependency; the path task is the successor
pub async fn add_dependency(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddDependencyRequest>,
) -> Result<(StatusCode, Json<Dependency>), ApiError> {
    let dependency = state
        .store
        .run(move |repo| dependencies::add_dependency(repo, task_id, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(dependency)))
}

pub async fn delete_dependency(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(dependency_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| dependencies::delete_dependency(repo, dependency_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let comments = state
        .store
        .run(move |repo| comments::list_comments(repo, task_id, user.user_id))
        .await?;
    Ok(Json(comments))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = state
        .store
        .run(move |repo| comments::add_comment(repo, task_id, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(comment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| comments::delete_comment(repo, comment_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Vec<TaskAttachment>>, ApiError> {
    let attachments = state
        .store
        .run(move |repo| attachments::list_attachments(repo, task_id, user.user_id))
        .await?;
    Ok(Json(attachments))
}

pub async fn add_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AddAttachmentRequest>,
) -> Result<(StatusCode, Json<TaskAttachment>), ApiError> {
    let attachment = state
        .store
        .run(move |repo| attachments::add_attachment(repo, task_id, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(attachment_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| attachments::delete_attachment(repo, attachment_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
