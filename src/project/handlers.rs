use axum::{extract::State, http::StatusCode};
use std::sync::Arc;
use uuid::Uuid;

use super::service;
use super::types::{AddMemberRequest, CreateProjectRequest, UpdateProjectRequest};
use crate::core::error::ApiError;
use crate::core::extract::{Json, Path};
use crate::core::shared::models::{Project, ProjectMember};
use crate::core::shared::state::AppState;
use crate::security::AuthenticatedUser;

pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Project>>, ApiError> {
    let projects = state
        .store
        .run(move |repo| service::list_projects(repo, user.user_id))
        .await?;
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .store
        .run(move |repo| service::create_project(repo, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .run(move |repo| service::get_project(repo, project_id, user.user_id))
        .await?;
    Ok(Json(project))
}

pub async fn update_project(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .store
        .run(move |repo| service::update_project(repo, project_id, user.user_id, &req))
        .await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| service::delete_project(repo, project_id, user.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<ProjectMember>>, ApiError> {
    let members = state
        .store
        .run(move |repo| service::list_members(repo, project_id, user.user_id))
        .await?;
    Ok(Json(members))
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<ProjectMember>), ApiError> {
    let member = state
        .store
        .run(move |repo| service::add_member(repo, project_id, user.user_id, &req))
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path((project_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .run(move |repo| service::remove_member(repo, project_id, user.user_id, member_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
