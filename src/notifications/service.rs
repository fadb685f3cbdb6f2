use chrono::Utc;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::models::{Notification, NotificationType};
use crate::core::storage::Repository;

/// Inserts a notification as a side effect of another operation.
///
/// The insert runs in a savepoint so a failure here never aborts the caller's
/// transaction. Failures are logged and reported as `None`.
pub fn create_notification(
    repo: &mut dyn Repository,
    user_id: Uuid,
    message: &str,
    notification_type: NotificationType,
    related_entity_id: Option<Uuid>,
) -> Option<Notification> {
    let notification = Notification {
        id: Uuid::new_v4(),
        user_id,
        message: message.to_string(),
        notification_type,
        is_read: false,
        created_at: Utc::now(),
        related_entity_id,
    };

    match repo.savepoint(&mut |nested| nested.insert_notification(&notification)) {
        Ok(()) => Some(notification),
        Err(e) => {
            log::warn!(
                "Failed to create {} notification for user {}: {}",
                notification_type,
                user_id,
                e
            );
            None
        }
    }
}

pub fn list_notifications(
    repo: &mut dyn Repository,
    user_id: Uuid,
) -> Result<Vec<Notification>, ApiError> {
    repo.list_notifications(user_id)
}

pub fn mark_read(
    repo: &mut dyn Repository,
    notification_id: Uuid,
    user_id: Uuid,
) -> Result<Notification, ApiError> {
    let mut notification = repo
        .find_notification(notification_id)?
        .ok_or_else(|| ApiError::not_found("Notification"))?;
    if notification.user_id != user_id {
        return Err(ApiError::forbidden(
            "You do not have permission to modify this notification",
        ));
    }
    if !notification.is_read {
        repo.mark_notification_read(notification_id)?;
        notification.is_read = true;
    }
    Ok(notification)
}

pub fn mark_all_read(repo: &mut dyn Repository, user_id: Uuid) -> Result<usize, ApiError> {
    let updated = repo.mark_all_notifications_read(user_id)?;
    log::debug!("Marked {updated} notifications read for user {user_id}");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shared::test_utils::seed_user;
    use crate::core::storage::MemoryStore;

    #[test]
    fn test_failed_notification_does_not_abort_caller() {
        let store = MemoryStore::new();
        let (alice, created) = store
            .transaction(|repo| {
                let alice = seed_user(repo, "alice");
                let missing = create_notification(
                    repo,
                    Uuid::new_v4(),
                    "nobody home",
                    NotificationType::TaskUpdated,
                    None,
                );
                assert!(missing.is_none());
                let created = create_notification(
                    repo,
                    alice.id,
                    "You were assigned",
                    NotificationType::TaskUpdated,
                    None,
                );
                Ok((alice, created))
            })
            .unwrap();

        assert!(created.is_some());
        let listed = store
            .transaction(|repo| list_notifications(repo, alice.id))
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_read);
    }

    #[test]
    fn test_mark_read_checks_recipient() {
        let store = MemoryStore::new();
        store
            .transaction(|repo| {
                let alice = seed_user(repo, "alice");
                let bob = seed_user(repo, "bob");
                let note = create_notification(
                    repo,
                    alice.id,
                    "hello",
                    NotificationType::ProjectInvite,
                    None,
                )
                .expect("notification");

                let err = mark_read(repo, note.id, bob.id).unwrap_err();
                assert!(matches!(err, ApiError::Forbidden(_)));

                let err = mark_read(repo, Uuid::new_v4(), alice.id).unwrap_err();
                assert!(matches!(err, ApiError::NotFound(_)));

                let read = mark_read(repo, note.id, alice.id)?;
                assert!(read.is_read);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_mark_all_read_is_idempotent() {
        let store = MemoryStore::new();
        let alice = store
            .transaction(|repo| {
                let alice = seed_user(repo, "alice");
                for message in ["one", "two", "three"] {
                    create_notification(repo, alice.id, message, NotificationType::TaskDue, None);
                }
                Ok(alice)
            })
            .unwrap();

        let first = store.transaction(|repo| mark_all_read(repo, alice.id)).unwrap();
        let second = store.transaction(|repo| mark_all_read(repo, alice.id)).unwrap();
        assert_eq!(first, 3);
        assert_eq!(second, 0);

        let unread = store
            .transaction(|repo| list_notifications(repo, alice.id))
            .unwrap()
            .into_iter()
            .filter(|n| !n.is_read)
            .count();
        assert_eq!(unread, 0);
    }
}
