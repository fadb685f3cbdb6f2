use chrono::Utc;
use uuid::Uuid;

use super::service::load_accessible_task;
use super::types::AddCommentRequest;
use crate::core::error::ApiError;
use crate::core::shared::models::{Comment, NotificationType};
use crate::core::storage::Repository;
use crate::notifications::create_notification;

/// Newest first.
pub fn list_comments(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Comment>, ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;
    repo.list_comments(task.id)
}

pub fn add_comment(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
    req: &AddCommentRequest,
) -> Result<Comment, ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;

    let content = req
        .content
        .as_deref()
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| ApiError::validation("Comment content is required"))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        task_id: task.id,
        user_id,
        content: content.to_string(),
        created_at: Utc::now(),
    };
    repo.insert_comment(&comment)?;

    if let Some(assignee) = task.assigned_to.filter(|assignee| *assignee != user_id) {
        create_notification(
            repo,
            assignee,
            &format!("New comment on task \"{}\"", task.name),
            NotificationType::CommentAdded,
            Some(task.id),
        );
    }
    Ok(comment)
}

/// Only the author may delete a comment.
pub fn delete_comment(
    repo: &mut dyn Repository,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let comment = repo
        .find_comment(comment_id)?
        .ok_or_else(|| ApiError::not_found("Comment"))?;
    if comment.user_id != user_id {
        return Err(ApiError::forbidden("Only the author can delete this comment"));
    }
    repo.delete_comment(comment.id)?;
    Ok(())
}
