use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::error::ApiError;
use crate::core::shared::models::User;
use crate::core::shared::utils::required;
use crate::core::storage::Repository;
use crate::security::password::PasswordHasher2;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn register(
    repo: &mut dyn Repository,
    hasher: &PasswordHasher2,
    req: &RegisterRequest,
) -> Result<User, ApiError> {
    let message = "Username, email and password are required";
    let username = required(req.username.as_deref(), message)?.trim();
    let email = required(req.email.as_deref(), message)?.trim();
    let password = required(req.password.as_deref(), message)?;

    if repo
        .find_user_by_username_or_email(username, email)?
        .is_some()
    {
        return Err(ApiError::conflict("Username or email already exists"));
    }

    let password_hash = hasher
        .hash(password)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        created_at: now,
        updated_at: now,
    };
    repo.insert_user(&user)?;
    log::info!("Registered user {} ({})", user.username, user.id);
    Ok(user)
}

/// Unknown users and wrong passwords fail with the same message.
pub fn login(
    repo: &mut dyn Repository,
    hasher: &PasswordHasher2,
    req: &LoginRequest,
) -> Result<User, ApiError> {
    let message = "Username and password are required";
    let username = required(req.username.as_deref(), message)?.trim();
    let password = required(req.password.as_deref(), message)?;

    let Some(user) = repo.find_user_by_username(username)? else {
        log::info!("Login failed for unknown user {username}");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
    };

    let valid = hasher
        .verify(password, &user.password_hash)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !valid {
        log::info!("Login failed for user {}", user.id);
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
    }
    Ok(user)
}

pub fn current_user(repo: &mut dyn Repository, user_id: Uuid) -> Result<User, ApiError> {
    repo.find_user(user_id)?
        .ok_or_else(|| ApiError::not_found("User"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStore;
    use crate::security::password::Argon2Config;

    fn hasher() -> PasswordHasher2 {
        PasswordHasher2::new(Argon2Config::fast()).expect("hasher")
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: Some("alice".into()),
            email: Some("alice@example.com".into()),
            password: Some("wonderland".into()),
        }
    }

    #[test]
    fn test_register_then_login() {
        let store = MemoryStore::new();
        let hasher = hasher();
        let registered = store
            .transaction(|repo| register(repo, &hasher, &alice()))
            .unwrap();
        assert_ne!(registered.password_hash, "wonderland");

        let logged_in = store
            .transaction(|repo| {
                login(
                    repo,
                    &hasher,
                    &LoginRequest {
                        username: Some("alice".into()),
                        password: Some("wonderland".into()),
                    },
                )
            })
            .unwrap();
        assert_eq!(logged_in.id, registered.id);
    }

    #[test]
    fn test_register_rejects_taken_username_and_email() {
        let store = MemoryStore::new();
        let hasher = hasher();
        store
            .transaction(|repo| register(repo, &hasher, &alice()))
            .unwrap();

        let same_email = RegisterRequest {
            username: Some("alice2".into()),
            ..alice()
        };
        for req in [alice(), same_email] {
            let err = store
                .transaction(|repo| register(repo, &hasher, &req))
                .unwrap_err();
            assert!(matches!(err, ApiError::Conflict(_)));
        }
    }

    #[test]
    fn test_register_requires_all_fields() {
        let store = MemoryStore::new();
        let hasher = hasher();
        let req = RegisterRequest {
            password: Some(String::new()),
            ..alice()
        };
        let err = store
            .transaction(|repo| register(repo, &hasher, &req))
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_login_failures_share_message() {
        let store = MemoryStore::new();
        let hasher = hasher();
        store
            .transaction(|repo| register(repo, &hasher, &alice()))
            .unwrap();

        let attempt = |username: &str, password: &str| {
            store
                .transaction(|repo| {
                    login(
                        repo,
                        &hasher,
                        &LoginRequest {
                            username: Some(username.into()),
                            password: Some(password.into()),
                        },
                    )
                })
                .unwrap_err()
        };

        let wrong_password = attempt("alice", "looking-glass");
        let unknown_user = attempt("mallory", "wonderland");
        match (wrong_password, unknown_user) {
            (ApiError::Unauthenticated(a), ApiError::Unauthenticated(b)) => assert_eq!(a, b),
            other => panic!("unexpected errors: {other:?}"),
        }
    }

    #[test]
    fn test_current_user_missing() {
        let store = MemoryStore::new();
        let err = store
            .transaction(|repo| current_user(repo, Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
