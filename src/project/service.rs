use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use super::types::{AddMemberRequest, CreateProjectRequest, UpdateProjectRequest};
use crate::core::error::ApiError;
use crate::core::shared::models::{MemberRole, NotificationType, Project, ProjectMember};
use crate::core::shared::utils::{ensure_date_order, parse_date, required};
use crate::core::storage::Repository;
use crate::notifications::create_notification;
use crate::security::access::{require_owned_project, require_project_access};

pub fn create_project(
    repo: &mut dyn Repository,
    owner_id: Uuid,
    req: &CreateProjectRequest,
) -> Result<Project, ApiError> {
    let message = "Project name, start date and end date are required";
    let name = required(req.name.as_deref(), message)?;
    let start_date = parse_date(required(req.start_date.as_deref(), message)?, "start_date")?;
    let end_date = parse_date(required(req.end_date.as_deref(), message)?, "end_date")?;
    ensure_date_order(start_date, end_date)?;

    let now = Utc::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: req.description.clone().unwrap_or_default(),
        start_date,
        end_date,
        owner_id,
        created_at: now,
        updated_at: now,
    };
    repo.insert_project(&project)?;
    log::info!("User {} created project {}", owner_id, project.id);
    Ok(project)
}

/// Projects the user owns plus those they are a member of, each once.
pub fn list_projects(repo: &mut dyn Repository, user_id: Uuid) -> Result<Vec<Project>, ApiError> {
    let mut projects = repo.list_owned_projects(user_id)?;
    projects.extend(repo.list_member_projects(user_id)?);

    let mut seen = HashSet::new();
    projects.retain(|project| seen.insert(project.id));
    projects.sort_by_key(|project| project.created_at);
    Ok(projects)
}

pub fn get_project(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Project, ApiError> {
    let project = repo
        .find_project(project_id)?
        .ok_or_else(|| ApiError::not_found("Project"))?;
    require_project_access(repo, project_id, user_id)?;
    Ok(project)
}

pub fn update_project(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
    req: &UpdateProjectRequest,
) -> Result<Project, ApiError> {
    let mut project = require_owned_project(repo, project_id, user_id)?;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Project name cannot be empty"));
        }
        project.name = name.clone();
    }
    if let Some(description) = &req.description {
        project.description = description.clone();
    }
    if let Some(start) = &req.start_date {
        project.start_date = parse_date(start, "start_date")?;
    }
    if let Some(end) = &req.end_date {
        project.end_date = parse_date(end, "end_date")?;
    }
    ensure_date_order(project.start_date, project.end_date)?;

    project.updated_at = Utc::now();
    repo.update_project(&project)?;
    Ok(project)
}

/// Removes the project and everything hanging off it, children first.
pub fn delete_project(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    require_owned_project(repo, project_id, user_id)?;

    let tasks = repo.list_tasks(project_id)?;
    for task in &tasks {
        repo.delete_comments_for_task(task.id)?;
        repo.delete_attachments_for_task(task.id)?;
        repo.delete_dependencies_for_task(task.id)?;
    }
    let removed_tasks = repo.delete_tasks_for_project(project_id)?;
    let removed_members = repo.delete_members_for_project(project_id)?;
    repo.delete_project(project_id)?;

    log::info!(
        "User {} deleted project {} ({} tasks, {} members)",
        user_id,
        project_id,
        removed_tasks,
        removed_members
    );
    Ok(())
}

pub fn list_members(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<ProjectMember>, ApiError> {
    get_project(repo, project_id, user_id)?;
    repo.list_members(project_id)
}

pub fn add_member(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
    req: &AddMemberRequest,
) -> Result<ProjectMember, ApiError> {
    let project = require_owned_project(repo, project_id, user_id)?;

    let raw_user_id = required(req.user_id.as_deref(), "user_id is required")?;
    let target_id = Uuid::parse_str(raw_user_id.trim())
        .map_err(|_| ApiError::validation("Invalid user_id"))?;
    let role = match req.role.as_deref() {
        Some(role) => role.parse::<MemberRole>().map_err(ApiError::Validation)?,
        None => MemberRole::default(),
    };

    if repo.find_user(target_id)?.is_none() {
        return Err(ApiError::not_found("User"));
    }
    if repo.find_member(project_id, target_id)?.is_some() {
        return Err(ApiError::conflict("User is already a member of this project"));
    }

    let member = ProjectMember {
        project_id,
        user_id: target_id,
        role,
        joined_at: Utc::now(),
    };
    repo.insert_member(&member)?;

    create_notification(
        repo,
        target_id,
        &format!("You have been added to project \"{}\"", project.name),
        NotificationType::ProjectInvite,
        Some(project_id),
    );
    Ok(member)
}

pub fn remove_member(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
    target_user_id: Uuid,
) -> Result<(), ApiError> {
    require_owned_project(repo, project_id, user_id)?;
    if !repo.delete_member(project_id, target_user_id)? {
        return Err(ApiError::not_found("Membership"));
    }
    Ok(())
}
