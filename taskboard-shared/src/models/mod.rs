//! Data models for the task board
//!
//! - `task`: Tasks, their priority/status enums and change sets
//! - `user`: Users and roles
//!
//! Models are plain data. Reads and writes go through
//! [`crate::store::RecordStore`].

pub mod task;
pub mod user;

pub use task::{AssigneeSummary, CreateTask, Priority, Status, Task, TaskChanges, TaskWithAssignee};
pub use user::{CreateUser, Role, User, UserSummary};
