use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use std::str::FromStr;
use uuid::Uuid;

use super::Repository;
use crate::core::error::ApiError;
use crate::core::shared::models::{
    Comment, Dependency, Notification, Project, ProjectMember, Task, TaskAttachment, User,
};
use crate::core::shared::schema::{
    comments, dependencies, notifications, project_members, projects, task_attachments, tasks,
    users,
};
use crate::core::shared::utils::DbPool;

pub(super) fn transaction<T, F>(pool: &DbPool, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut dyn Repository) -> Result<T, ApiError>,
{
    let mut pooled = pool
        .get()
        .map_err(|e| ApiError::Database(format!("Failed to get database connection: {e}")))?;
    let conn: &mut PgConnection = &mut pooled;
    conn.transaction(|conn| {
        let mut repo = PgRepository::new(conn);
        f(&mut repo)
    })
}

fn parse_column<T: FromStr<Err = String>>(value: &str) -> Result<T, ApiError> {
    value.parse().map_err(ApiError::Database)
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = users)]
struct DbUser {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(row: DbUser) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&User> for DbUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = projects)]
struct DbProject {
    id: Uuid,
    name: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DbProject> for Project {
    fn from(row: DbProject) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Project> for DbProject {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            description: project.description.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            owner_id: project.owner_id,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = project_members)]
struct DbMember {
    project_id: Uuid,
    user_id: Uuid,
    role: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<DbMember> for ProjectMember {
    type Error = ApiError;

    fn try_from(row: DbMember) -> Result<Self, Self::Error> {
        Ok(Self {
            project_id: row.project_id,
            user_id: row.user_id,
            role: parse_column(&row.role)?,
            joined_at: row.joined_at,
        })
    }
}

impl From<&ProjectMember> for DbMember {
    fn from(member: &ProjectMember) -> Self {
        Self {
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role.as_str().to_string(),
            joined_at: member.joined_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable, AsChangeset)]
#[diesel(table_name = tasks, treat_none_as_null = true)]
struct DbTask {
    id: Uuid,
    project_id: Uuid,
    parent_task_id: Option<Uuid>,
    name: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    assigned_to: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DbTask> for Task {
    type Error = ApiError;

    fn try_from(row: DbTask) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            parent_task_id: row.parent_task_id,
            name: row.name,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            assigned_to: row.assigned_to,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Task> for DbTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            parent_task_id: task.parent_task_id,
            name: task.name.clone(),
            description: task.description.clone(),
            start_date: task.start_date,
            end_date: task.end_date,
            assigned_to: task.assigned_to,
            status: task.status.as_str().to_string(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = dependencies)]
struct DbDependency {
    id: Uuid,
    predecessor_task_id: Uuid,
    successor_task_id: Uuid,
    dependency_type: String,
}

impl TryFrom<DbDependency> for Dependency {
    type Error = ApiError;

    fn try_from(row: DbDependency) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            predecessor_task_id: row.predecessor_task_id,
            successor_task_id: row.successor_task_id,
            dependency_type: parse_column(&row.dependency_type)?,
        })
    }
}

impl From<&Dependency> for DbDependency {
    fn from(dependency: &Dependency) -> Self {
        Self {
            id: dependency.id,
            predecessor_task_id: dependency.predecessor_task_id,
            successor_task_id: dependency.successor_task_id,
            dependency_type: dependency.dependency_type.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = comments)]
struct DbComment {
    id: Uuid,
    task_id: Uuid,
    user_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<DbComment> for Comment {
    fn from(row: DbComment) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

impl From<&Comment> for DbComment {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            task_id: comment.task_id,
            user_id: comment.user_id,
            content: comment.content.clone(),
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = task_attachments)]
struct DbAttachment {
    id: Uuid,
    task_id: Uuid,
    file_name: String,
    file_path: String,
    uploaded_by: Uuid,
    uploaded_at: DateTime<Utc>,
}

impl From<DbAttachment> for TaskAttachment {
    fn from(row: DbAttachment) -> Self {
        Self {
            id: row.id,
            task_id: row.task_id,
            file_name: row.file_name,
            file_path: row.file_path,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
        }
    }
}

impl From<&TaskAttachment> for DbAttachment {
    fn from(attachment: &TaskAttachment) -> Self {
        Self {
            id: attachment.id,
            task_id: attachment.task_id,
            file_name: attachment.file_name.clone(),
            file_path: attachment.file_path.clone(),
            uploaded_by: attachment.uploaded_by,
            uploaded_at: attachment.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = notifications)]
struct DbNotification {
    id: Uuid,
    user_id: Uuid,
    message: String,
    notification_type: String,
    is_read: bool,
    created_at: DateTime<Utc>,
    related_entity_id: Option<Uuid>,
}

impl TryFrom<DbNotification> for Notification {
    type Error = ApiError;

    fn try_from(row: DbNotification) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            message: row.message,
            notification_type: parse_column(&row.notification_type)?,
            is_read: row.is_read,
            created_at: row.created_at,
            related_entity_id: row.related_entity_id,
        })
    }
}

impl From<&Notification> for DbNotification {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            user_id: notification.user_id,
            message: notification.message.clone(),
            notification_type: notification.notification_type.as_str().to_string(),
            is_read: notification.is_read,
            created_at: notification.created_at,
            related_entity_id: notification.related_entity_id,
        }
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, ApiError>
where
    T: TryFrom<R, Error = ApiError>,
{
    rows.into_iter().map(T::try_from).collect()
}

pub struct PgRepository<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgRepository<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    fn conn(&mut self) -> &mut PgConnection {
        self.conn
    }
}

impl Repository for PgRepository<'_> {
    fn insert_user(&mut self, user: &User) -> Result<(), ApiError> {
        diesel::insert_into(users::table)
            .values(DbUser::from(user))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_user(&mut self, id: Uuid) -> Result<Option<User>, ApiError> {
        let row = users::table
            .find(id)
            .first::<DbUser>(self.conn())
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, ApiError> {
        let row = users::table
            .filter(users::username.eq(username))
            .first::<DbUser>(self.conn())
            .optional()?;
        Ok(row.map(User::from))
    }

    fn find_user_by_username_or_email(
        &mut self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, ApiError> {
        let row = users::table
            .filter(users::username.eq(username).or(users::email.eq(email)))
            .first::<DbUser>(self.conn())
            .optional()?;
        Ok(row.map(User::from))
    }

    fn insert_project(&mut self, project: &Project) -> Result<(), ApiError> {
        diesel::insert_into(projects::table)
            .values(DbProject::from(project))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_project(&mut self, id: Uuid) -> Result<Option<Project>, ApiError> {
        let row = projects::table
            .find(id)
            .first::<DbProject>(self.conn())
            .optional()?;
        Ok(row.map(Project::from))
    }

    fn list_owned_projects(&mut self, owner_id: Uuid) -> Result<Vec<Project>, ApiError> {
        let rows: Vec<DbProject> = projects::table
            .filter(projects::owner_id.eq(owner_id))
            .order(projects::created_at.asc())
            .load(self.conn())?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    fn list_member_projects(&mut self, user_id: Uuid) -> Result<Vec<Project>, ApiError> {
        let project_ids: Vec<Uuid> = project_members::table
            .filter(project_members::user_id.eq(user_id))
            .select(project_members::project_id)
            .load(self.conn())?;
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<DbProject> = projects::table
            .filter(projects::id.eq_any(project_ids))
            .order(projects::created_at.asc())
            .load(self.conn())?;
        Ok(rows.into_iter().map(Project::from).collect())
    }

    fn update_project(&mut self, project: &Project) -> Result<(), ApiError> {
        diesel::update(projects::table.find(project.id))
            .set(&DbProject::from(project))
            .execute(self.conn())?;
        Ok(())
    }

    fn delete_project(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(projects::table.find(id)).execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn insert_member(&mut self, member: &ProjectMember) -> Result<(), ApiError> {
        diesel::insert_into(project_members::table)
            .values(DbMember::from(member))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, ApiError> {
        let row = project_members::table
            .find((project_id, user_id))
            .first::<DbMember>(self.conn())
            .optional()?;
        row.map(ProjectMember::try_from).transpose()
    }

    fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, ApiError> {
        let rows: Vec<DbMember> = project_members::table
            .filter(project_members::project_id.eq(project_id))
            .order(project_members::joined_at.asc())
            .load(self.conn())?;
        convert_all(rows)
    }

    fn delete_member(&mut self, project_id: Uuid, user_id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(project_members::table.find((project_id, user_id)))
            .execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn delete_members_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError> {
        let deleted = diesel::delete(
            project_members::table.filter(project_members::project_id.eq(project_id)),
        )
        .execute(self.conn())?;
        Ok(deleted)
    }

    fn insert_task(&mut self, task: &Task) -> Result<(), ApiError> {
        diesel::insert_into(tasks::table)
            .values(DbTask::from(task))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, ApiError> {
        let row = tasks::table
            .find(id)
            .first::<DbTask>(self.conn())
            .optional()?;
        row.map(Task::try_from).transpose()
    }

    fn list_tasks(&mut self, project_id: Uuid) -> Result<Vec<Task>, ApiError> {
        let rows: Vec<DbTask> = tasks::table
            .filter(tasks::project_id.eq(project_id))
            .order(tasks::created_at.asc())
            .load(self.conn())?;
        convert_all(rows)
    }

    fn update_task(&mut self, task: &Task) -> Result<(), ApiError> {
        diesel::update(tasks::table.find(task.id))
            .set(&DbTask::from(task))
            .execute(self.conn())?;
        Ok(())
    }

    fn detach_subtasks(&mut self, parent_id: Uuid) -> Result<usize, ApiError> {
        let updated = diesel::update(tasks::table.filter(tasks::parent_task_id.eq(parent_id)))
            .set(tasks::parent_task_id.eq(None::<Uuid>))
            .execute(self.conn())?;
        Ok(updated)
    }

    fn delete_task(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(tasks::table.find(id)).execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn delete_tasks_for_project(&mut self, project_id: Uuid) -> Result<usize, ApiError> {
        let deleted = diesel::delete(tasks::table.filter(tasks::project_id.eq(project_id)))
            .execute(self.conn())?;
        Ok(deleted)
    }

    fn insert_dependency(&mut self, dependency: &Dependency) -> Result<(), ApiError> {
        diesel::insert_into(dependencies::table)
            .values(DbDependency::from(dependency))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_dependency(&mut self, id: Uuid) -> Result<Option<Dependency>, ApiError> {
        let row = dependencies::table
            .find(id)
            .first::<DbDependency>(self.conn())
            .optional()?;
        row.map(Dependency::try_from).transpose()
    }

    fn find_dependency_between(
        &mut self,
        predecessor_id: Uuid,
        successor_id: Uuid,
    ) -> Result<Option<Dependency>, ApiError> {
        let row = dependencies::table
            .filter(dependencies::predecessor_task_id.eq(predecessor_id))
            .filter(dependencies::successor_task_id.eq(successor_id))
            .first::<DbDependency>(self.conn())
            .optional()?;
        row.map(Dependency::try_from).transpose()
    }

    fn list_dependencies_for_task(&mut self, task_id: Uuid) -> Result<Vec<Dependency>, ApiError> {
        let rows: Vec<DbDependency> = dependencies::table
            .filter(
                dependencies::predecessor_task_id
                    .eq(task_id)
                    .or(dependencies::successor_task_id.eq(task_id)),
            )
            .load(self.conn())?;
        convert_all(rows)
    }

    fn list_dependencies_for_project(
        &mut self,
        project_id: Uuid,
    ) -> Result<Vec<Dependency>, ApiError> {
        let task_ids: Vec<Uuid> = tasks::table
            .filter(tasks::project_id.eq(project_id))
            .select(tasks::id)
            .load(self.conn())?;
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<DbDependency> = dependencies::table
            .filter(dependencies::successor_task_id.eq_any(task_ids))
            .load(self.conn())?;
        convert_all(rows)
    }

    fn delete_dependency(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(dependencies::table.find(id)).execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn delete_dependencies_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let deleted = diesel::delete(
            dependencies::table.filter(
                dependencies::predecessor_task_id
                    .eq(task_id)
                    .or(dependencies::successor_task_id.eq(task_id)),
            ),
        )
        .execute(self.conn())?;
        Ok(deleted)
    }

    fn insert_comment(&mut self, comment: &Comment) -> Result<(), ApiError> {
        diesel::insert_into(comments::table)
            .values(DbComment::from(comment))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>, ApiError> {
        let row = comments::table
            .find(id)
            .first::<DbComment>(self.conn())
            .optional()?;
        Ok(row.map(Comment::from))
    }

    fn list_comments(&mut self, task_id: Uuid) -> Result<Vec<Comment>, ApiError> {
        let rows: Vec<DbComment> = comments::table
            .filter(comments::task_id.eq(task_id))
            .order(comments::created_at.desc())
            .load(self.conn())?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    fn delete_comment(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(comments::table.find(id)).execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn delete_comments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let deleted = diesel::delete(comments::table.filter(comments::task_id.eq(task_id)))
            .execute(self.conn())?;
        Ok(deleted)
    }

    fn insert_attachment(&mut self, attachment: &TaskAttachment) -> Result<(), ApiError> {
        diesel::insert_into(task_attachments::table)
            .values(DbAttachment::from(attachment))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_attachment(&mut self, id: Uuid) -> Result<Option<TaskAttachment>, ApiError> {
        let row = task_attachments::table
            .find(id)
            .first::<DbAttachment>(self.conn())
            .optional()?;
        Ok(row.map(TaskAttachment::from))
    }

    fn list_attachments(&mut self, task_id: Uuid) -> Result<Vec<TaskAttachment>, ApiError> {
        let rows: Vec<DbAttachment> = task_attachments::table
            .filter(task_attachments::task_id.eq(task_id))
            .order(task_attachments::uploaded_at.desc())
            .load(self.conn())?;
        Ok(rows.into_iter().map(TaskAttachment::from).collect())
    }

    fn delete_attachment(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let deleted = diesel::delete(task_attachments::table.find(id)).execute(self.conn())?;
        Ok(deleted > 0)
    }

    fn delete_attachments_for_task(&mut self, task_id: Uuid) -> Result<usize, ApiError> {
        let deleted =
            diesel::delete(task_attachments::table.filter(task_attachments::task_id.eq(task_id)))
                .execute(self.conn())?;
        Ok(deleted)
    }

    fn insert_notification(&mut self, notification: &Notification) -> Result<(), ApiError> {
        diesel::insert_into(notifications::table)
            .values(DbNotification::from(notification))
            .execute(self.conn())?;
        Ok(())
    }

    fn find_notification(&mut self, id: Uuid) -> Result<Option<Notification>, ApiError> {
        let row = notifications::table
            .find(id)
            .first::<DbNotification>(self.conn())
            .optional()?;
        row.map(Notification::try_from).transpose()
    }

    fn list_notifications(&mut self, user_id: Uuid) -> Result<Vec<Notification>, ApiError> {
        let rows: Vec<DbNotification> = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .order(notifications::created_at.desc())
            .load(self.conn())?;
        convert_all(rows)
    }

    fn mark_notification_read(&mut self, id: Uuid) -> Result<bool, ApiError> {
        let updated = diesel::update(notifications::table.find(id))
            .set(notifications::is_read.eq(true))
            .execute(self.conn())?;
        Ok(updated > 0)
    }

    fn mark_all_notifications_read(&mut self, user_id: Uuid) -> Result<usize, ApiError> {
        let updated = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(user_id))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .execute(self.conn())?;
        Ok(updated)
    }

    fn savepoint(
        &mut self,
        op: &mut dyn FnMut(&mut dyn Repository) -> Result<(), ApiError>,
    ) -> Result<(), ApiError> {
        self.conn().transaction(|conn| {
            let mut nested = PgRepository::new(conn);
            op(&mut nested)
        })
    }
}
