//! Task model
//!
//! Tasks are the core entity of the board. Each task is assigned to exactly
//! one user and sits in exactly one priority tier.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE task_priority AS ENUM ('HIGH', 'MEDIUM', 'LOW');
//! CREATE TYPE task_status AS ENUM ('PENDING', 'COMPLETED');
//!
//! CREATE TABLE tasks (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     title VARCHAR(255) NOT NULL,
//!     description TEXT NOT NULL DEFAULT '',
//!     due_date TIMESTAMPTZ NOT NULL,
//!     priority task_priority NOT NULL DEFAULT 'MEDIUM',
//!     status task_status NOT NULL DEFAULT 'PENDING',
//!     assigned_to_id UUID NOT NULL REFERENCES users(id),
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Persistence goes through [`crate::store::RecordStore`]; this module only
//! holds the data shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::User;

/// Priority tier of a task
///
/// Also used as the lane identifier on the board.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Urgent work
    High,

    /// Default tier for new tasks
    #[default]
    Medium,

    /// Can wait
    Low,
}

impl Priority {
    /// All tiers in board order (left to right)
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Converts priority to its wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            other => Err(ParseEnumError::new("priority", other)),
        }
    }
}

/// Completion status of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Not done yet
    #[default]
    Pending,

    /// Done
    Completed,
}

impl Status {
    /// Converts status to its wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "PENDING",
            Status::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Status::Pending),
            "COMPLETED" => Ok(Status::Completed),
            other => Err(ParseEnumError::new("status", other)),
        }
    }
}

/// Error returned when a string is not one of an enum's wire values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    /// Which enum was being parsed
    pub kind: &'static str,

    /// The rejected input
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Short title, never empty
    pub title: String,

    /// Free-form description
    pub description: String,

    /// When the task is due
    pub due_date: DateTime<Utc>,

    /// Priority tier
    pub priority: Priority,

    /// Completion status
    pub status: Status,

    /// User the task is assigned to
    pub assigned_to_id: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// Every field is required; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: Status,
    pub assigned_to_id: Uuid,
}

/// Partial update of a task
///
/// Only `Some` fields are written. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assigned_to_id: Option<Uuid>,
}

impl TaskChanges {
    /// Full replacement of every mutable field
    pub fn replace_all(data: CreateTask) -> Self {
        Self {
            title: Some(data.title),
            description: Some(data.description),
            due_date: Some(data.due_date),
            priority: Some(data.priority),
            status: Some(data.status),
            assigned_to_id: Some(data.assigned_to_id),
        }
    }

    /// Changes only the status
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Changes only the priority
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    /// Returns true if no field would be written
    pub fn is_empty(&self) -> bool {
        *self == TaskChanges::default()
    }

    /// Applies the changes to an in-memory task
    pub fn apply_to(self, task: &mut Task, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(assigned_to_id) = self.assigned_to_id {
            task.assigned_to_id = assigned_to_id;
        }
        task.updated_at = now;
    }
}

/// Minimal projection of the assigned user attached to listed tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for AssigneeSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Task augmented with its assignee, as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskWithAssignee {
    #[serde(flatten)]
    pub task: Task,

    /// None if the assignee row could not be resolved
    pub assigned_to: Option<AssigneeSummary>,
}
