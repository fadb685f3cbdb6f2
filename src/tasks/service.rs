use chrono::Utc;
use std::collections::HashSet;
use uuid::Uuid;

use super::types::{CreateTaskRequest, UpdateTaskRequest};
use crate::core::error::ApiError;
use crate::core::shared::models::{NotificationType, Task, TaskStatus};
use crate::core::shared::utils::{ensure_date_order, parse_date, parse_id, required};
use crate::core::storage::Repository;
use crate::notifications::create_notification;
use crate::security::access::require_project_access;

/// Loads a task the caller may see: NotFound first, then Forbidden.
pub(crate) fn load_accessible_task(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Task, ApiError> {
    let task = repo
        .find_task(task_id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    require_project_access(repo, task.project_id, user_id)?;
    Ok(task)
}

fn parse_status(value: &str) -> Result<TaskStatus, ApiError> {
    value.parse().map_err(ApiError::Validation)
}

fn resolve_assignee(repo: &mut dyn Repository, raw: &str) -> Result<Uuid, ApiError> {
    let user_id = parse_id(raw, "assigned_to")?;
    if repo.find_user(user_id)?.is_none() {
        return Err(ApiError::validation("Assigned user does not exist"));
    }
    Ok(user_id)
}

fn resolve_parent(repo: &mut dyn Repository, raw: &str, project_id: Uuid) -> Result<Uuid, ApiError> {
    let parent_id = parse_id(raw, "parent_task_id")?;
    match repo.find_task(parent_id)? {
        Some(parent) if parent.project_id == project_id => Ok(parent_id),
        _ => Err(ApiError::validation("Invalid parent task")),
    }
}

/// Rejects moving `task_id` under itself or one of its own subtasks.
fn ensure_not_descendant(
    repo: &mut dyn Repository,
    task_id: Uuid,
    new_parent_id: Uuid,
) -> Result<(), ApiError> {
    let mut seen = HashSet::new();
    let mut cursor = Some(new_parent_id);
    while let Some(current) = cursor {
        if current == task_id {
            return Err(ApiError::validation(
                "A task cannot be placed under itself or one of its subtasks",
            ));
        }
        if !seen.insert(current) {
            break;
        }
        cursor = repo.find_task(current)?.and_then(|t| t.parent_task_id);
    }
    Ok(())
}

fn notify_assignment(repo: &mut dyn Repository, task: &Task, actor_id: Uuid) {
    if let Some(assignee) = task.assigned_to.filter(|assignee| *assignee != actor_id) {
        create_notification(
            repo,
            assignee,
            &format!("You have been assigned to task \"{}\"", task.name),
            NotificationType::TaskUpdated,
            Some(task.id),
        );
    }
}

pub fn list_tasks(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Task>, ApiError> {
    require_project_access(repo, project_id, user_id)?;
    repo.list_tasks(project_id)
}

pub fn get_task(repo: &mut dyn Repository, task_id: Uuid, user_id: Uuid) -> Result<Task, ApiError> {
    load_accessible_task(repo, task_id, user_id)
}

pub fn create_task(
    repo: &mut dyn Repository,
    project_id: Uuid,
    user_id: Uuid,
    req: &CreateTaskRequest,
) -> Result<Task, ApiError> {
    require_project_access(repo, project_id, user_id)?;

    let message = "Task name, start date and end date are required";
    let name = required(req.name.as_deref(), message)?;
    let start_date = parse_date(required(req.start_date.as_deref(), message)?, "start_date")?;
    let end_date = parse_date(required(req.end_date.as_deref(), message)?, "end_date")?;
    ensure_date_order(start_date, end_date)?;

    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => TaskStatus::default(),
    };
    let parent_task_id = match req.parent_task_id.as_deref() {
        Some(raw) => Some(resolve_parent(repo, raw, project_id)?),
        None => None,
    };
    let assigned_to = match req.assigned_to.as_deref() {
        Some(raw) => Some(resolve_assignee(repo, raw)?),
        None => None,
    };

    let now = Utc::now();
    let task = Task {
        id: Uuid::new_v4(),
        project_id,
        parent_task_id,
        name: name.to_string(),
        description: req.description.clone().unwrap_or_default(),
        start_date,
        end_date,
        assigned_to,
        status,
        created_at: now,
        updated_at: now,
    };
    repo.insert_task(&task)?;
    log::info!("User {} created task {} in project {}", user_id, task.id, project_id);

    notify_assignment(repo, &task, user_id);
    Ok(task)
}

pub fn update_task(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
    req: &UpdateTaskRequest,
) -> Result<Task, ApiError> {
    let mut task = load_accessible_task(repo, task_id, user_id)?;
    let previous_assignee = task.assigned_to;

    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Task name cannot be empty"));
        }
        task.name = name.clone();
    }
    if let Some(description) = &req.description {
        task.description = description.clone();
    }
    if let Some(start) = &req.start_date {
        task.start_date = parse_date(start, "start_date")?;
    }
    if let Some(end) = &req.end_date {
        task.end_date = parse_date(end, "end_date")?;
    }
    if let Some(status) = &req.status {
        task.status = parse_status(status)?;
    }
    if let Some(assignee) = &req.assigned_to {
        task.assigned_to = match assignee.as_deref() {
            Some(raw) => Some(resolve_assignee(repo, raw)?),
            None => None,
        };
    }
    if let Some(parent) = &req.parent_task_id {
        task.parent_task_id = match parent.as_deref() {
            Some(raw) => {
                let parent_id = resolve_parent(repo, raw, task.project_id)?;
                ensure_not_descendant(repo, task.id, parent_id)?;
                Some(parent_id)
            }
            None => None,
        };
    }
    ensure_date_order(task.start_date, task.end_date)?;

    task.updated_at = Utc::now();
    repo.update_task(&task)?;

    if task.assigned_to != previous_assignee {
        notify_assignment(repo, &task, user_id);
    }
    Ok(task)
}

/// Deletes the task with its comments, attachments and dependency edges.
/// Direct subtasks are kept and become top-level tasks.
pub fn delete_task(repo: &mut dyn Repository, task_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;

    let comments = repo.delete_comments_for_task(task.id)?;
    let attachments = repo.delete_attachments_for_task(task.id)?;
    let dependencies = repo.delete_dependencies_for_task(task.id)?;
    let detached = repo.detach_subtasks(task.id)?;
    repo.delete_task(task.id)?;

    log::info!(
        "User {} deleted task {} ({} comments, {} attachments, {} dependencies, {} subtasks detached)",
        user_id,
        task.id,
        comments,
        attachments,
        dependencies,
        detached
    );
    Ok(())
}
