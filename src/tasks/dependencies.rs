//! Dependency edges between tasks of one project.
//!
//! Edges point from predecessor to successor and the graph stays acyclic:
//! an insert that would let a task reach itself is rejected.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::service::load_accessible_task;
use super::types::AddDependencyRequest;
use crate::core::error::ApiError;
use crate::core::shared::models::{Dependency, DependencyType};
use crate::core::shared::utils::{parse_id, required};
use crate::core::storage::Repository;
use crate::security::access::require_project_access;

pub fn list_dependencies(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Dependency>, ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;
    repo.list_dependencies_for_task(task.id)
}

pub fn add_dependency(
    repo: &mut dyn Repository,
    successor_id: Uuid,
    user_id: Uuid,
    req: &AddDependencyRequest,
) -> Result<Dependency, ApiError> {
    let successor = load_accessible_task(repo, successor_id, user_id)?;

    let raw = required(
        req.predecessor_task_id.as_deref(),
        "Predecessor task ID is required",
    )?;
    let predecessor_id = parse_id(raw, "predecessor_task_id")?;
    let predecessor = repo
        .find_task(predecessor_id)?
        .ok_or_else(|| ApiError::not_found("Predecessor task"))?;

    if predecessor.id == successor.id {
        return Err(ApiError::validation("A task cannot depend on itself"));
    }
    if predecessor.project_id != successor.project_id {
        return Err(ApiError::validation(
            "Tasks must be in the same project to create a dependency",
        ));
    }

    let dependency_type = match req.dependency_type.as_deref() {
        Some(raw) => raw.parse::<DependencyType>().map_err(ApiError::Validation)?,
        None => DependencyType::default(),
    };

    if repo
        .find_dependency_between(predecessor.id, successor.id)?
        .is_some()
    {
        return Err(ApiError::conflict("Dependency already exists"));
    }

    let edges = repo.list_dependencies_for_project(successor.project_id)?;
    if creates_cycle(&edges, predecessor.id, successor.id) {
        return Err(ApiError::validation(
            "Dependency would create a circular dependency",
        ));
    }

    let dependency = Dependency {
        id: Uuid::new_v4(),
        predecessor_task_id: predecessor.id,
        successor_task_id: successor.id,
        dependency_type,
    };
    repo.insert_dependency(&dependency)?;
    log::info!(
        "User {} added {} dependency {} -> {}",
        user_id,
        dependency_type,
        predecessor.id,
        successor.id
    );
    Ok(dependency)
}

pub fn delete_dependency(
    repo: &mut dyn Repository,
    dependency_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let dependency = repo
        .find_dependency(dependency_id)?
        .ok_or_else(|| ApiError::not_found("Dependency"))?;
    let successor = repo
        .find_task(dependency.successor_task_id)?
        .ok_or_else(|| ApiError::not_found("Task"))?;
    require_project_access(repo, successor.project_id, user_id)?;

    repo.delete_dependency(dependency.id)?;
    Ok(())
}

/// True when adding `predecessor -> successor` closes a cycle, i.e. the
/// predecessor is already reachable from the successor.
fn creates_cycle(edges: &[Dependency], predecessor: Uuid, successor: Uuid) -> bool {
    let mut outgoing: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for edge in edges {
        outgoing
            .entry(edge.predecessor_task_id)
            .or_default()
            .push(edge.successor_task_id);
    }

    let mut visited = HashSet::new();
    let mut stack = vec![successor];
    while let Some(node) = stack.pop() {
        if node == predecessor {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        if let Some(next) = outgoing.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}
