//! Command services
//!
//! Every write to a task or user goes through one of these services. Each
//! operation validates its input, performs a single store write (or, for user
//! deletion, an explicit cascade), and on success invalidates the affected
//! [`ViewKey`](crate::views::ViewKey)s.
//!
//! Failures come back as [`CommandError`] values, never panics. Store errors
//! are logged with their detail and surfaced with a generic message.
//!
//! - [`task`]: create / update / status / priority / delete
//! - [`user`]: provision and delete users

pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

pub use task::{TaskCommandService, TaskInput};
pub use user::{UserCommandService, UserInput};

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Error type for command operations
///
/// `Display` yields the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Input rejected before any write
    #[error("{message}")]
    Validation { field: String, message: String },

    /// Target record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Write would violate a uniqueness rule
    #[error("{0}")]
    Conflict(String),

    /// Store failure; detail is in the logs only
    #[error("{0}")]
    Store(String),
}

impl CommandError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CommandError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// `due_date` -> `dueDate`, matching the JSON field names
fn wire_field_name(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<ValidationErrors> for CommandError {
    /// Keeps the first failing field (by name) and its first message
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first().and_then(|(field, errs)| errs.first().map(|e| (field, e))) {
            Some((field, err)) => CommandError::validation(
                wire_field_name(field),
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}")),
            ),
            None => CommandError::validation("input", "Invalid input"),
        }
    }
}

/// Wire shape of a command result: `{"success": true}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandOutcome {
    Success { success: bool },
    Failure { error: String },
}

impl CommandOutcome {
    pub fn success() -> Self {
        CommandOutcome::Success { success: true }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Success { success: true })
    }
}

impl<T> From<CommandResult<T>> for CommandOutcome {
    fn from(result: CommandResult<T>) -> Self {
        match result {
            Ok(_) => CommandOutcome::success(),
            Err(e) => CommandOutcome::Failure { error: e.to_string() },
        }
    }
}
