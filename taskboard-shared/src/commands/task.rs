//! Task commands
//!
//! | Operation         | Writes                    | Invalidates             |
//! |-------------------|---------------------------|-------------------------|
//! | `create`          | new row                   | Dashboard               |
//! | `update`          | every mutable field       | Dashboard, Task(id)     |
//! | `update_status`   | status                    | Dashboard, Task(id)     |
//! | `update_priority` | priority                  | Dashboard, Task(id)     |
//! | `delete`          | removes row               | Dashboard, Task(id)     |
//!
//! `updated_at` is refreshed by every write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{CommandError, CommandResult};
use crate::board::PriorityUpdater;
use crate::models::{CreateTask, Priority, Status, Task, TaskChanges};
use crate::store::{RecordStore, StoreError};
use crate::views::{ViewCache, ViewKey};

/// Fields of a task as submitted by a form or API client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(required(message = "Due date is required"))]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: Status,

    pub assigned_to_id: Uuid,
}

impl TaskInput {
    /// Validates the input and converts it into store form
    pub fn into_create(self) -> CommandResult<CreateTask> {
        self.validate()?;

        if self.title.trim().is_empty() {
            return Err(CommandError::validation("title", "Title is required"));
        }
        let due_date = self
            .due_date
            .ok_or_else(|| CommandError::validation("dueDate", "Due date is required"))?;

        Ok(CreateTask {
            title: self.title,
            description: self.description,
            due_date,
            priority: self.priority,
            status: self.status,
            assigned_to_id: self.assigned_to_id,
        })
    }
}

/// Maps a store failure to the message shown to the user
fn store_failure(action: &'static str, err: StoreError) -> CommandError {
    match err {
        StoreError::ForeignKey(_) => {
            CommandError::validation("assignedToId", "Assigned user does not exist")
        }
        other => {
            tracing::error!(error = %other, "Failed to {}", action);
            CommandError::Store(format!("Failed to {action}"))
        }
    }
}

fn task_not_found() -> CommandError {
    CommandError::NotFound("Task not found".to_string())
}

/// Write-side service for tasks
#[derive(Clone)]
pub struct TaskCommandService {
    store: Arc<dyn RecordStore>,
    views: Arc<ViewCache>,
}

impl TaskCommandService {
    pub fn new(store: Arc<dyn RecordStore>, views: Arc<ViewCache>) -> Self {
        Self { store, views }
    }

    pub async fn create(&self, input: TaskInput) -> CommandResult<Task> {
        let data = input.into_create()?;

        let task = self
            .store
            .create_task(data)
            .await
            .map_err(|e| store_failure("create task", e))?;

        tracing::info!(task_id = %task.id, assigned_to = %task.assigned_to_id, "Task created");
        self.views.invalidate(ViewKey::Dashboard).await;

        Ok(task)
    }

    /// Replaces every mutable field of the task
    pub async fn update(&self, id: Uuid, input: TaskInput) -> CommandResult<Task> {
        let changes = TaskChanges::replace_all(input.into_create()?);
        self.apply(id, changes, "update task").await
    }

    pub async fn update_status(&self, id: Uuid, status: Status) -> CommandResult<Task> {
        self.apply(id, TaskChanges::status(status), "update task status")
            .await
    }

    pub async fn update_priority(&self, id: Uuid, priority: Priority) -> CommandResult<Task> {
        self.apply(id, TaskChanges::priority(priority), "update task priority")
            .await
    }

    pub async fn delete(&self, id: Uuid) -> CommandResult<()> {
        let deleted = self
            .store
            .delete_task(id)
            .await
            .map_err(|e| store_failure("delete task", e))?;

        if !deleted {
            return Err(task_not_found());
        }

        tracing::info!(task_id = %id, "Task deleted");
        self.views
            .invalidate_all([ViewKey::Dashboard, ViewKey::Task(id)])
            .await;

        Ok(())
    }

    async fn apply(&self, id: Uuid, changes: TaskChanges, action: &'static str) -> CommandResult<Task> {
        let task = self
            .store
            .update_task(id, changes)
            .await
            .map_err(|e| store_failure(action, e))?
            .ok_or_else(task_not_found)?;

        tracing::debug!(task_id = %id, priority = %task.priority, status = %task.status, "Task updated");
        self.views
            .invalidate_all([ViewKey::Dashboard, ViewKey::Task(id)])
            .await;

        Ok(task)
    }
}

#[async_trait]
impl PriorityUpdater for TaskCommandService {
    async fn change_priority(&self, task_id: Uuid, priority: Priority) -> CommandResult<()> {
        self.update_priority(task_id, priority).await.map(|_| ())
    }
}
