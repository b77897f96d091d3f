//! Record store port
//!
//! Every read and write of task and user records goes through
//! [`RecordStore`]. Services hold it as `Arc<dyn RecordStore>` so the
//! Postgres adapter can be swapped for the in-memory one in tests.
//!
//! # Adapters
//!
//! - [`postgres::PgRecordStore`]: sqlx/PostgreSQL, used by the API server
//! - [`memory::InMemoryRecordStore`]: process-local, used by tests and demos
//!
//! # Consistency
//!
//! Each call is a single-record (or single-statement) operation and is atomic
//! on its own. Concurrent writes to the same record are last-write-wins.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{CreateTask, CreateUser, Task, TaskChanges, User};
use crate::query::filter::{PageWindow, TaskFilter, TaskSort};

pub use memory::InMemoryRecordStore;
pub use postgres::PgRecordStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by record store adapters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A referenced record does not exist (e.g. task assigned to unknown user)
    #[error("referenced record does not exist: {0}")]
    ForeignKey(String),

    /// A uniqueness rule was violated (e.g. duplicate email)
    #[error("conflicting record: {0}")]
    Conflict(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_foreign_key_violation() {
                    StoreError::ForeignKey(db_err.message().to_string())
                } else if db_err.is_unique_violation() {
                    StoreError::Conflict(db_err.message().to_string())
                } else {
                    StoreError::Database(db_err.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Persistence contract for tasks and users
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns tasks matching `filter`, ordered by `sort`, optionally windowed
    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        window: Option<PageWindow>,
        sort: TaskSort,
    ) -> StoreResult<Vec<Task>>;

    /// Finds a task by ID
    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Counts tasks matching `filter`, ignoring any window
    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64>;

    /// Stores a new task with server-assigned id and timestamps
    ///
    /// # Errors
    ///
    /// [`StoreError::ForeignKey`] if `assigned_to_id` does not name a user.
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    /// Applies a partial update; `None` if the task does not exist
    ///
    /// # Errors
    ///
    /// [`StoreError::ForeignKey`] if the change reassigns to an unknown user.
    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>>;

    /// Deletes a task; returns whether a row was removed
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Deletes every task assigned to `user_id`, returning the removed ids
    async fn delete_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    /// Returns all users, newest first
    async fn find_users(&self) -> StoreResult<Vec<User>>;

    /// Finds a user by ID
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Finds every user whose id is in `ids` (unknown ids are skipped)
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;

    /// Finds a user by email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Stores a new user
    ///
    /// # Errors
    ///
    /// [`StoreError::Conflict`] if the email is taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Deletes a user; returns whether a row was removed
    ///
    /// # Errors
    ///
    /// [`StoreError::ForeignKey`] while tasks are still assigned to the user.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Connectivity check for the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        assert!(matches!(
            StoreError::from(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
