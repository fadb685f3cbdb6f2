//! Persistence context shared by every service.
//!
//! Services never touch a connection directly. They receive a
//! `&mut dyn Repository` that is only valid inside [`Store::transaction`], so
//! every write an operation performs commits or rolls back as one unit.

pub mod memory;
pub mod postgres;

use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::models::{
    Comment, Dependency, Notification, Project, ProjectMember, Task, TaskAttachment, User,
};
use crate::core::shared::utils::DbPool;

pub use memory::MemoryStore;
pub use postgres::PgRepository;

/// Row-level operations available inside a transaction.
///
/// Implementations do not cascade. Deleting a row that is still referenced
/// by another row fails, so callers must remove children first.
pub trait Repository {
    fn insert_user(&mut self, user: &User) -> Result<(), ApiError>;
    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, ApiError>;
    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, ApiError>;
    fn find_user_by_username_or_email(
        &mut self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, ApiError>;

    fn insert_project(&mut self, project: &Project) -> Result<(), ApiError>;
    fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, ApiError>;
    fn list_owned_projects(&mut self, owner_id: Uuid) -> Result<Vec<Project>, ApiError>;
    fn list_member_projects(&mut self, user_id: Uuid) -> Result<Vec<Project>, ApiError>;
    fn update_project(&mut self, project: &Project) -> Result<(), ApiError>;
    fn delete_project(&mut self, id: Uuid) -> Result<bool, ApiError>;

    fn insert_member(&mut self, member: &ProjectMember) -> Result<(), ApiError>;
    fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, ApiError>;
    fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, ApiError>;
    fn delete_member(&mut self, project_id: Uuid, user_id: Uuid) -> Result<bool, ApiError>;
    fn delete_members_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError>;

    fn insert_task(&mut self, task: &Task) -> Result<(), ApiError>;
    fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, ApiError>;
    fn list_tasks(&mut self, project_id: Uuid) -> Result<Vec<Task>, ApiError>;
    fn update_task(&mut self, task: &Task) -> Result<(), ApiError>;
    /// Clears `parent_task_id` on every direct child of `parent_id`.
    fn detach_subtasks(&mut self, parent_id: Uuid) -> Result<usize, ApiError>;
    fn delete_task(&mut self, id: Uuid) -> Result<bool, ApiError>;
    fn delete_tasks_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError>;

    fn insert_dependency(&mut self, dependency: &Dependency) -> Result<(), ApiError>;
    fn find_dependency(&mut self, id: Uuid) -> Result<Option<Dependency>, ApiError>;
    fn find_dependency_between(
        &mut self,
        predecessor_id: Uuid,
        successor_id: Uuid,
    ) -> Result<Option<Dependency>, ApiError>;
    /// Edges where the task is either predecessor or successor.
    fn list_dependencies_for_task(&mut self, task_id: Uuid) -> Result<Vec<Dependency>, ApiError>;
    fn list_dependencies_for_project(
        &mut self,
        project_id: Uuid,
    ) -> Result<Vec<Dependency>, ApiError>;
    fn delete_dependency(&mut self, id: Uuid) -> Result<bool, ApiError>;
    fn delete_dependencies_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError>;

    fn insert_comment(&mut self, comment: &Comment) -> Result<(), ApiError>;
    fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>, ApiError>;
    /// Newest first.
    fn list_comments(&mut self, task_id: Uuid) -> Result<Vec<Comment>, ApiError>;
    fn delete_comment(&mut self, id: Uuid) -> Result<bool, ApiError>;
    fn delete_comments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError>;

    fn insert_attachment(&mut self, attachment: &TaskAttachment) -> Result<(), ApiError>;
    fn find_attachment(&mut self, id: Uuid) -> Result<Option<TaskAttachment>, ApiError>;
    /// Newest first.
    fn list_attachments(&mut self, task_id: Uuid) -> Result<Vec<TaskAttachment>, ApiError>;
    fn delete_attachment(&mut self, id: Uuid) -> Result<bool, ApiError>;
    fn delete_attachments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError>;

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), ApiError>;
    fn find_notification(&mut self, id: Uuid) -> Result<Option<Notification>, ApiError>;
    /// Newest first.
    fn list_notifications(&mut self, user_id: Uuid) -> Result<Vec<Notification>, ApiError>;
    fn mark_notification_read(&mut self, id: Uuid) -> Result<bool, ApiError>;
    fn mark_all_notifications_read(&mut self, user_id: Uuid) -> Result<usize, ApiError>;

    /// Runs `op` in a nested transaction. A failure inside `op` undoes only
    /// the writes made by `op`; the enclosing transaction stays usable.
    fn savepoint(
        &mut self,
        op: &mut dyn FnMut(&mut dyn Repository) -> Result<(), ApiError>,
    ) -> Result<(), ApiError>;
}

#[derive(Clone)]
pub enum Store {
    Postgres(DbPool),
    Memory(MemoryStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Runs `f` inside one transaction. Any error returned by `f` rolls back
    /// every write it made.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut dyn Repository) -> Result<T, ApiError>,
    {
        match self {
            Self::Postgres(pool) => postgres::transaction(pool, f),
            Self::Memory(store) => store.transaction(f),
        }
    }

    /// Async entry point for handlers: the transaction runs on the blocking
    /// thread pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Repository) -> Result<T, ApiError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.transaction(f)).await?
    }

    pub fn is_healthy(&self) -> bool {
        match self {
            Self::Postgres(pool) => pool.get().is_ok(),
            Self::Memory(_) => true,
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend_name())
            .finish()
    }
}
