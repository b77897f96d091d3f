//! Priority board presentation engine
//!
//! - [`state`]: lanes, paging and move reconciliation over a local task copy
//! - [`session`]: async driver that persists drags through a [`PriorityUpdater`]
//!
//! Board scoping is a rendering convenience. The listing and command paths
//! enforce access on their own.

pub mod session;
pub mod state;

use async_trait::async_trait;
use uuid::Uuid;

use crate::commands::CommandResult;
use crate::models::Priority;

pub use session::BoardSession;
pub use state::{
    BoardCard, BoardLanes, BoardSnapshot, BoardState, DragResult, MoveState, PageControl,
    PriorityChange, DEFAULT_PAGE_SIZE,
};

/// Persists a task's new priority
#[async_trait]
pub trait PriorityUpdater: Send + Sync {
    async fn change_priority(&self, task_id: Uuid, priority: Priority) -> CommandResult<()>;
}
