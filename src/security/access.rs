use tracing::debug;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::models::Project;
use crate::core::storage::Repository;

/// True when the project exists and the user owns it or holds a membership.
pub fn has_project_access(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, ApiError> {
    let Some(project) = repo.find_project(project_id)? else {
        return Ok(false);
    };
    if project.owner_id == user_id {
        return Ok(true);
    }
    Ok(repo.find_member(project_id, user_id)?.is_some())
}

pub fn is_owner(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<bool, ApiError> {
    Ok(repo
        .find_project(project_id)?
        .is_some_and(|project| project.owner_id == user_id))
}

pub fn require_project_access(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if has_project_access(repo, project_id, user_id)? {
        Ok(())
    } else {
        debug!("User {user_id} denied access to project {project_id}");
        Err(ApiError::forbidden("Access denied"))
    }
}

/// Loads the project, failing with NotFound first and Forbidden second.
pub fn require_owned_project(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Project, ApiError> {
    let project = repo
        .find_project(project_id)?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    if project.owner_id != user_id {
        debug!("User {user_id} is not the owner of project {project_id}");
        return Err(ApiError::forbidden("Only the project owner can do this"));
    }
    Ok(project)
}
