use std::sync::{Arc, Mutex};

use uuid::Uuid;

use super::Repository;
use crate::core::error::{ApiError, DUPLICATE_MESSAGE};
use crate::core::shared::models::{
    Comment, Dependency, Notification, Project, ProjectMember, Task, TaskAttachment, User,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<Task>,
    dependencies: Vec<Dependency>,
    comments: Vec<Comment>,
    attachments: Vec<TaskAttachment>,
    notifications: Vec<Notification>,
}

/// Process-local store with the same constraint behavior as the Postgres
/// schema. Each transaction works on a copy of the tables that replaces the
/// shared state only when the closure succeeds.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn Repository) -> Result<T, ApiError>,
    {
        let mut guard = self
            .tables
            .lock()
            .map_err(|_| ApiError::Internal("memory store lock poisoned".to_string()))?;
        let mut working = guard.clone();
        let result = f(&mut MemoryRepository {
            tables: &mut working,
        });
        if result.is_ok() {
            *guard = working;
        }
        result
    }
}

struct MemoryRepository<'a> {
    tables: &'a mut Tables,
}

fn duplicate(what: &str) -> ApiError {
    log::debug!("Unique violation on {what}");
    ApiError::Conflict(DUPLICATE_MESSAGE.to_string())
}

fn foreign_key(detail: &str) -> ApiError {
    ApiError::Database(format!("foreign key violation: {detail}"))
}

/// Newest first; rows created in the same instant keep reverse insertion
/// order.
fn newest_first<T, K: Ord>(
    rows: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> K,
) -> Vec<T> {
    let mut out: Vec<T> = rows.rev().collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

impl MemoryRepository<'_> {
    fn user_exists(&self, id: Uuid) -> bool {
        self.tables.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: Uuid) -> bool {
        self.tables.projects.iter().any(|p| p.id == id)
    }

    fn task_exists(&self, id: Uuid) -> bool {
        self.tables.tasks.iter().any(|t| t.id == id)
    }

    fn check_task_references(&self, task: &Task) -> Result<(), ApiError> {
        if !self.project_exists(task.project_id) {
            return Err(foreign_key("tasks.project_id"));
        }
        if let Some(parent_id) = task.parent_task_id {
            if !self.task_exists(parent_id) {
                return Err(foreign_key("tasks.parent_task_id"));
            }
        }
        if let Some(user_id) = task.assigned_to {
            if !self.user_exists(user_id) {
                return Err(foreign_key("tasks.assigned_to"));
            }
        }
        Ok(())
    }
}

impl Repository for MemoryRepository<'_> {
    fn insert_user(&mut self, user: &User) -> Result<(), ApiError> {
        if self.tables.users.iter().any(|u| u.id == user.id) {
            return Err(duplicate("users.id"));
        }
        if self.tables.users.iter().any(|u| u.username == user.username) {
            return Err(duplicate("users.username"));
        }
        if self.tables.users.iter().any(|u| u.email == user.email) {
            return Err(duplicate("users.email"));
        }
        self.tables.users.push(user.clone());
        Ok(())
    }

    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, ApiError> {
        Ok(self.tables.users.iter().find(|u| u.id == id).cloned())
    }

    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn find_user_by_username_or_email(
        &mut self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, ApiError> {
        Ok(self
            .tables
            .users
            .iter()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    fn insert_project(&mut self, project: &Project) -> Result<(), ApiError> {
        if self.project_exists(project.id) {
            return Err(duplicate("projects.id"));
        }
        if !self.user_exists(project.owner_id) {
            return Err(foreign_key("projects.owner_id"));
        }
        self.tables.projects.push(project.clone());
        Ok(())
    }

    fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, ApiError> {
        Ok(self.tables.projects.iter().find(|p| p.id == id).cloned())
    }

    fn list_owned_projects(&mut self, owner_id: Uuid) -> Result<Vec<Project>, ApiError> {
        let mut rows: Vec<Project> = self
            .tables
            .projects
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.created_at);
        Ok(rows)
    }

    fn list_member_projects(&mut self, user_id: Uuid) -> Result<Vec<Project>, ApiError> {
        let member_of: Vec<Uuid> = self
            .tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.project_id)
            .collect();
        let mut rows: Vec<Project> = self
            .tables
            .projects
            .iter()
            .filter(|p| member_of.contains(&p.id))
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.created_at);
        Ok(rows)
    }

    fn update_project(&mut self, project: &Project) -> Result<(), ApiError> {
        if !self.user_exists(project.owner_id) {
            return Err(foreign_key("projects.owner_id"));
        }
        if let Some(row) = self.tables.projects.iter_mut().find(|p| p.id == project.id) {
            *row = project.clone();
        }
        Ok(())
    }

    fn delete_project(&mut self, id: Uuid) -> Result<bool, ApiError> {
        if self.tables.members.iter().any(|m| m.project_id == id) {
            return Err(foreign_key("project_members.project_id"));
        }
        if self.tables.tasks.iter().any(|t| t.project_id == id) {
            return Err(foreign_key("tasks.project_id"));
        }
        let before = self.tables.projects.len();
        self.tables.projects.retain(|p| p.id != id);
        Ok(self.tables.projects.len() < before)
    }

    fn insert_member(&mut self, member: &ProjectMember) -> Result<(), ApiError> {
        if !self.project_exists(member.project_id) {
            return Err(foreign_key("project_members.project_id"));
        }
        if !self.user_exists(member.user_id) {
            return Err(foreign_key("project_members.user_id"));
        }
        if self
            .tables
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(duplicate("project_members_pkey"));
        }
        self.tables.members.push(member.clone());
        Ok(())
    }

    fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, ApiError> {
        Ok(self
            .tables
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, ApiError> {
        let mut rows: Vec<ProjectMember> = self
            .tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.joined_at);
        Ok(rows)
    }

    fn delete_member(&mut self, project_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let before = self.tables.members.len();
        self.tables
            .members
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(self.tables.members.len() < before)
    }

    fn delete_members_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError> {
        let before = self.tables.members.len();
        self.tables.members.retain(|m| m.project_id != project_id);
        Ok(before - self.tables.members.len())
    }

    fn insert_task(&mut self, task: &Task) -> Result<(), ApiError> {
        if self.task_exists(task.id) {
            return Err(duplicate("tasks.id"));
        }
        self.check_task_references(task)?;
        self.tables.tasks.push(task.clone());
        Ok(())
    }

    fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, ApiError> {
        Ok(self.tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn list_tasks(&mut self, project_id: Uuid) -> Result<Vec<Task>, ApiError> {
        let mut rows: Vec<Task> = self
            .tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.created_at);
        Ok(rows)
    }

    fn update_task(&mut self, task: &Task) -> Result<(), ApiError> {
        self.check_task_references(task)?;
        if let Some(row) = self.tables.tasks.iter_mut().find(|t| t.id == task.id) {
            *row = task.clone();
        }
        Ok(())
    }

    fn detach_subtasks(&mut self, parent_id: Uuid) -> Result<usize, ApiError> {
        let mut updated = 0;
        for task in self
            .tables
            .tasks
            .iter_mut()
            .filter(|t| t.parent_task_id == Some(parent_id))
        {
            task.parent_task_id = None;
            updated += 1;
        }
        Ok(updated)
    }

    fn delete_task(&mut self, id: Uuid) -> Result<bool, ApiError> {
        if self.tables.tasks.iter().any(|t| t.parent_task_id == Some(id)) {
            return Err(foreign_key("tasks.parent_task_id"));
        }
        if self
            .tables
            .dependencies
            .iter()
            .any(|d| d.predecessor_task_id == id || d.successor_task_id == id)
        {
            return Err(foreign_key("dependencies"));
        }
        if self.tables.comments.iter().any(|c| c.task_id == id) {
            return Err(foreign_key("comments.task_id"));
        }
        if self.tables.attachments.iter().any(|a| a.task_id == id) {
            return Err(foreign_key("task_attachments.task_id"));
        }
        let before = self.tables.tasks.len();
        self.tables.tasks.retain(|t| t.id != id);
        Ok(self.tables.tasks.len() < before)
    }

    fn delete_tasks_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError> {
        let ids: Vec<Uuid> = self
            .tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id)
            .collect();
        let referenced = self.tables.dependencies.iter().any(|d| {
            ids.contains(&d.predecessor_task_id) || ids.contains(&d.successor_task_id)
        }) || self.tables.comments.iter().any(|c| ids.contains(&c.task_id))
            || self.tables.attachments.iter().any(|a| ids.contains(&a.task_id))
            || self.tables.tasks.iter().any(|t| {
                t.project_id != project_id
                    && t.parent_task_id.is_some_and(|p| ids.contains(&p))
            });
        if referenced {
            return Err(foreign_key("tasks"));
        }
        let before = self.tables.tasks.len();
        self.tables.tasks.retain(|t| t.project_id != project_id);
        Ok(before - self.tables.tasks.len())
    }

    fn insert_dependency(&mut self, dependency: &Dependency) -> Result<(), ApiError> {
        if !self.task_exists(dependency.predecessor_task_id) {
            return Err(foreign_key("dependencies.predecessor_task_id"));
        }
        if !self.task_exists(dependency.successor_task_id) {
            return Err(foreign_key("dependencies.successor_task_id"));
        }
        if self.tables.dependencies.iter().any(|d| {
            d.predecessor_task_id == dependency.predecessor_task_id
                && d.successor_task_id == dependency.successor_task_id
        }) {
            return Err(duplicate("unique_dependency"));
        }
        self.tables.dependencies.push(dependency.clone());
        Ok(())
    }

    fn find_dependency(&mut self, id: Uuid) -> Result<Option<Dependency>, ApiError> {
        Ok(self
            .tables
            .dependencies
            .iter()
            .find(|d| d.id == id)
            .cloned())
    }

    fn find_dependency_between(
        &mut self,
        predecessor_id: Uuid,
        successor_id: Uuid,
    ) -> Result<Option<Dependency>, ApiError> {
        Ok(self
            .tables
            .dependencies
            .iter()
            .find(|d| d.predecessor_task_id == predecessor_id && d.successor_task_id == successor_id)
            .cloned())
    }

    fn list_dependencies_for_task(&mut self, task_id: Uuid) -> Result<Vec<Dependency>, ApiError> {
        Ok(self
            .tables
            .dependencies
            .iter()
            .filter(|d| d.predecessor_task_id == task_id || d.successor_task_id == task_id)
            .cloned()
            .collect())
    }

    fn list_dependencies_for_project(
        &mut self,
        project_id: Uuid,
    ) -> Result<Vec<Dependency>, ApiError> {
        let ids: Vec<Uuid> = self
            .tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id)
            .collect();
        Ok(self
            .tables
            .dependencies
            .iter()
            .filter(|d| ids.contains(&d.successor_task_id))
            .cloned()
            .collect())
    }

    fn delete_dependency(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let before = self.tables.dependencies.len();
        self.tables.dependencies.retain(|d| d.id != id);
        Ok(self.tables.dependencies.len() < before)
    }

    fn delete_dependencies_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let before = self.tables.dependencies.len();
        self.tables
            .dependencies
            .retain(|d| d.predecessor_task_id != task_id && d.successor_task_id != task_id);
        Ok(before - self.tables.dependencies.len())
    }

    fn insert_comment(&mut self, comment: &Comment) -> Result<(), ApiError> {
        if !self.task_exists(comment.task_id) {
            return Err(foreign_key("comments.task_id"));
        }
        if !self.user_exists(comment.user_id) {
            return Err(foreign_key("comments.user_id"));
        }
        self.tables.comments.push(comment.clone());
        Ok(())
    }

    fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        Ok(self.tables.comments.iter().find(|c| c.id == id).cloned())
    }

    fn list_comments(&mut self, task_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        Ok(newest_first(
            self.tables
                .comments
                .iter()
                .filter(|c| c.task_id == task_id)
                .cloned(),
            |c| c.created_at,
        ))
    }

    fn delete_comment(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let before = self.tables.comments.len();
        self.tables.comments.retain(|c| c.id != id);
        Ok(self.tables.comments.len() < before)
    }

    fn delete_comments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let before = self.tables.comments.len();
        self.tables.comments.retain(|c| c.task_id != task_id);
        Ok(before - self.tables.comments.len())
    }

    fn insert_attachment(&mut self, attachment: &TaskAttachment) -> Result<(), ApiError> {
        if !self.task_exists(attachment.task_id) {
            return Err(foreign_key("task_attachments.task_id"));
        }
        if !self.user_exists(attachment.uploaded_by) {
            return Err(foreign_key("task_attachments.uploaded_by"));
        }
        self.tables.attachments.push(attachment.clone());
        Ok(())
    }

    fn find_attachment(&mut self, id: Uuid) -> Result<Option<TaskAttachment>, ApiError> {
        Ok(self.tables.attachments.iter().find(|a| a.id == id).cloned())
    }

    fn list_attachments(&mut self, task_id: Uuid) -> Result<Vec<TaskAttachment>, ApiError> {
        Ok(newest_first(
            self.tables
                .attachments
                .iter()
                .filter(|a| a.task_id == task_id)
                .cloned(),
            |a| a.uploaded_at,
        ))
    }

    fn delete_attachment(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let before = self.tables.attachments.len();
        self.tables.attachments.retain(|a| a.id != id);
        Ok(self.tables.attachments.len() < before)
    }

    fn delete_attachments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let before = self.tables.attachments.len();
        self.tables.attachments.retain(|a| a.task_id != task_id);
        Ok(before - self.tables.attachments.len())
    }

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), ApiError> {
        if !self.user_exists(notification.user_id) {
            return Err(foreign_key("notifications.user_id"));
        }
        self.tables.notifications.push(notification.clone());
        Ok(())
    }

    fn find_notification(&mut self, id: Uuid) -> Result<Option<Notification>, ApiError> {
        Ok(self
            .tables
            .notifications
            .iter()
            .find(|n| n.id == id)
            .cloned())
    }

    fn list_notifications(&mut self, user_id: Uuid) -> Result<Vec<Notification>, ApiError> {
        Ok(newest_first(
            self.tables
                .notifications
                .iter()
                .filter(|n| n.user_id == user_id)
                .cloned(),
            |n| n.created_at,
        ))
    }

    fn mark_notification_read(&mut self, id: Uuid) -> Result<bool, ApiError> {
        match self.tables.notifications.iter_mut().find(|n| n.id == id) {
            Some(row) => {
                row.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn mark_all_notifications_read(&mut self, user_id: Uuid) -> Result<usize, ApiError> {
        let mut updated = 0;
        for row in self
            .tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.is_read)
        {
            row.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    fn savepoint(
        &mut self,
        op: &mut dyn FnMut(&mut dyn Repository) -> Result<(), ApiError>,
    ) -> Result<(), ApiError> {
        let snapshot = self.tables.clone();
        let result = op(self);
        if result.is_err() {
            *self.tables = snapshot;
        }
        result
    }
}
