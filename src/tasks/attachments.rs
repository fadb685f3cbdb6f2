//! Attachment metadata. File contents are stored elsewhere; only the name
//! and path are recorded here.

use chrono::Utc;
use uuid::Uuid;

use super::service::load_accessible_task;
use super::types::AddAttachmentRequest;
use crate::core::error::ApiError;
use crate::core::shared::models::TaskAttachment;
use crate::core::storage::Repository;
use crate::security::access::is_owner;

pub fn list_attachments(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<TaskAttachment>, ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;
    repo.list_attachments(task.id)
}

pub fn add_attachment(
    repo: &mut dyn Repository,
    task_id: Uuid,
    user_id: Uuid,
    req: &AddAttachmentRequest,
) -> Result<TaskAttachment, ApiError> {
    let task = load_accessible_task(repo, task_id, user_id)?;

    let non_empty = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    let (Some(file_name), Some(file_path)) = (non_empty(&req.file_name), non_empty(&req.file_path))
    else {
        return Err(ApiError::validation("File name and file path are required"));
    };

    let attachment = TaskAttachment {
        id: Uuid::new_v4(),
        task_id: task.id,
        file_name,
        file_path,
        uploaded_by: user_id,
        uploaded_at: Utc::now(),
    };
    repo.insert_attachment(&attachment)?;
    log::info!("User {} attached {} to task {}", user_id, attachment.file_name, task.id);
    Ok(attachment)
}

/// The uploader or the owner of the task's project may delete.
pub fn delete_attachment(
    repo: &mut dyn Repository,
    attachment_id: Uuid,
    user_id: Uuid,
) -> Result<(), ApiError> {
    let attachment = repo
        .find_attachment(attachment_id)?
        .ok_or_else(|| ApiError::not_found("Attachment"))?;

    if attachment.uploaded_by != user_id {
        let project_id = repo
            .find_task(attachment.task_id)?
            .map(|task| task.project_id)
            .ok_or_else(|| ApiError::not_found("Task"))?;
        if !is_owner(repo, project_id, user_id)? {
            return Err(ApiError::forbidden(
                "Only the uploader or project owner can delete this attachment",
            ));
        }
    }

    repo.delete_attachment(attachment.id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::{seed_member, seed_project, seed_task, seed_user};
    use crate::core::storage::MemoryStore;

    fn file(name: &str) -> AddAttachmentRequest {
        AddAttachmentRequest {
            file_name: Some(name.to_string()),
            file_path: Some(format!("/uploads/{name}")),
        }
    }

    #[test]
    fn test_add_and_list_attachments() {
        MemoryStore::new()
            .transaction(|repo| {
                let alice = seed_user(repo, "alice");
                let bob = seed_user(repo, "bob");
                let project = seed_project(repo, alice.id, "Launch");
                let task = seed_task(repo, project.id, "Design");

                let brief = add_attachment(repo, task.id, alice.id, &file("brief.pdf"))?;
                let mock = add_attachment(repo, task.id, alice.id, &file("mock.png"))?;
                assert_eq!(brief.uploaded_by, alice.id);
                assert_eq!(list_attachments(repo, task.id, alice.id)?, vec![mock, brief]);

                let blank = AddAttachmentRequest {
                    file_path: Some(" ".into()),
                    ..file("x.txt")
                };
                let err = add_attachment(repo, task.id, alice.id, &blank).unwrap_err();
                assert!(matches!(err, ApiError::Validation(_)));

                let err = list_attachments(repo, task.id, bob.id).unwrap_err();
                assert!(matches!(err, ApiError::Forbidden(_)));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_delete_attachment_by_uploader_or_owner() {
        MemoryStore::new()
            .transaction(|repo| {
                let alice = seed_user(repo, "alice");
                let bob = seed_user(repo, "bob");
                let carol = seed_user(repo, "carol");
                let project = seed_project(repo, alice.id, "Launch");
                seed_member(repo, project.id, bob.id);
                seed_member(repo, project.id, carol.id);
                let task = seed_task(repo, project.id, "Design");

                let first = add_attachment(repo, task.id, bob.id, &file("a.txt"))?;
                let second = add_attachment(repo, task.id, bob.id, &file("b.txt"))?;

                let err = delete_attachment(repo, first.id, carol.id).unwrap_err();
                assert!(matches!(err, ApiError::Forbidden(_)));

                delete_attachment(repo, first.id, bob.id)?;
                delete_attachment(repo, second.id, alice.id)?;
                assert!(list_attachments(repo, task.id, bob.id)?.is_empty());

                let err = delete_attachment(repo, first.id, bob.id).unwrap_err();
                assert!(matches!(err, ApiError::NotFound(_)));
                Ok(())
            })
            .unwrap();
    }
}
