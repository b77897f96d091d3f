//! User commands
//!
//! Only what the task board depends on: provisioning assignees and removing
//! a user together with the tasks assigned to them.

use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{CommandError, CommandResult};
use crate::auth::password::hash_password;
use crate::models::{CreateUser, Role, UserSummary};
use crate::store::{RecordStore, StoreError};
use crate::views::{ViewCache, ViewKey};

/// New user as submitted by an administrator
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[serde(default)]
    pub role: Role,
}

fn user_not_found() -> CommandError {
    CommandError::NotFound("User not found".to_string())
}

/// Write-side service for users
#[derive(Clone)]
pub struct UserCommandService {
    store: Arc<dyn RecordStore>,
    views: Arc<ViewCache>,
}

impl UserCommandService {
    pub fn new(store: Arc<dyn RecordStore>, views: Arc<ViewCache>) -> Self {
        Self { store, views }
    }

    /// Creates a user with an Argon2id-hashed password
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input
    /// - `Conflict` if the email is already registered
    /// - `Store` for any store or hashing failure
    pub async fn create_user(&self, input: UserInput) -> CommandResult<UserSummary> {
        input.validate()?;

        let existing = self.store.find_user_by_email(&input.email).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to look up user by email");
            CommandError::Store("Failed to create user".to_string())
        })?;
        if existing.is_some() {
            return Err(CommandError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash password");
            CommandError::Store("Failed to create user".to_string())
        })?;

        let user = self
            .store
            .create_user(CreateUser {
                name: input.name,
                email: input.email,
                role: input.role,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // lost a race with another insert of the same email
                StoreError::Conflict(_) => {
                    CommandError::Conflict("User with this email already exists".to_string())
                }
                other => {
                    tracing::error!(error = %other, "Failed to create user");
                    CommandError::Store("Failed to create user".to_string())
                }
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "User created");
        self.views.invalidate(ViewKey::Users).await;

        Ok(UserSummary::from(user))
    }

    /// Deletes the user's tasks, then the user
    ///
    /// Returns the ids of the removed tasks. The two deletes are separate
    /// store calls; if the second fails the tasks stay deleted.
    pub async fn delete_user(&self, id: Uuid) -> CommandResult<Vec<Uuid>> {
        let fail = |e: StoreError| {
            tracing::error!(error = %e, user_id = %id, "Failed to delete user");
            CommandError::Store("Failed to delete user".to_string())
        };

        if self.store.find_user(id).await.map_err(fail)?.is_none() {
            return Err(user_not_found());
        }

        let removed = self.store.delete_tasks_assigned_to(id).await.map_err(fail)?;
        let deleted = self.store.delete_user(id).await.map_err(fail)?;

        let mut keys = vec![ViewKey::Users, ViewKey::User(id), ViewKey::Dashboard];
        keys.extend(removed.iter().copied().map(ViewKey::Task));
        self.views.invalidate_all(keys).await;

        if !deleted {
            return Err(user_not_found());
        }

        tracing::info!(user_id = %id, removed_tasks = removed.len(), "User deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTask, Priority, Status};
    use crate::store::InMemoryRecordStore;
    use chrono::Utc;

    fn input(email: &str) -> UserInput {
        UserInput {
            name: "Grace".to_string(),
            email: email.to_string(),
            password: "long-enough-password".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = UserCommandService::new(store, Arc::new(ViewCache::new()));

        service.create_user(input("grace@example.com")).await.unwrap();
        let err = service.create_user(input("grace@example.com")).await.unwrap_err();

        assert_eq!(err, CommandError::Conflict("User with this email already exists".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let service = UserCommandService::new(Arc::new(InMemoryRecordStore::new()), Arc::new(ViewCache::new()));

        let err = service.create_user(input("not-an-email")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format");
    }

    #[tokio::test]
    async fn test_stored_password_is_hashed() {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = UserCommandService::new(store.clone(), Arc::new(ViewCache::new()));

        let summary = service.create_user(input("grace@example.com")).await.unwrap();
        let stored = store.find_user(summary.id).await.unwrap().unwrap();

        assert!(stored.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_delete_user_cascades_tasks() {
        let store = Arc::new(InMemoryRecordStore::new());
        let views = Arc::new(ViewCache::new());
        let service = UserCommandService::new(store.clone(), views.clone());

        let user = service.create_user(input("grace@example.com")).await.unwrap();
        let task = store
            .create_task(CreateTask {
                title: "t".to_string(),
                description: String::new(),
                due_date: Utc::now(),
                priority: Priority::Low,
                status: Status::Pending,
                assigned_to_id: user.id,
            })
            .await
            .unwrap();

        let mut rx = views.subscribe();
        let removed = service.delete_user(user.id).await.unwrap();

        assert_eq!(removed, vec![task.id]);
        assert!(store.find_user(user.id).await.unwrap().is_none());
        assert!(store.find_task(task.id).await.unwrap().is_none());

        let mut seen = Vec::new();
        while let Ok(batch) = rx.try_recv() {
            seen.extend(batch);
        }
        assert!(seen.contains(&ViewKey::Users));
        assert!(seen.contains(&ViewKey::User(user.id)));
        assert!(seen.contains(&ViewKey::Dashboard));
        assert!(seen.contains(&ViewKey::Task(task.id)));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let service = UserCommandService::new(Arc::new(InMemoryRecordStore::new()), Arc::new(ViewCache::new()));

        assert!(matches!(
            service.delete_user(Uuid::new_v4()).await,
            Err(CommandError::NotFound(_))
        ));
    }
}
