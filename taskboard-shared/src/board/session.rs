//! Drives drag gestures end to end
//!
//! A gesture is applied to the local state, persisted through the
//! [`PriorityUpdater`], then settled. The state lock is not held across the
//! write, so a second gesture can start while the first is in flight.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::state::{BoardSnapshot, BoardState, DragResult, MoveState};
use super::PriorityUpdater;
use crate::models::UserSummary;

#[derive(Clone)]
pub struct BoardSession {
    state: Arc<Mutex<BoardState>>,
    updater: Arc<dyn PriorityUpdater>,
}

impl BoardSession {
    pub fn new(state: BoardState, updater: Arc<dyn PriorityUpdater>) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            updater,
        }
    }

    /// Handles the end of a drag
    ///
    /// Returns `None` for no-op gestures, otherwise the task's state once
    /// this gesture's write has been acknowledged.
    pub async fn handle_drag_end(&self, drag: DragResult) -> Option<MoveState> {
        let change = self.state.lock().await.apply_drag(&drag)?;

        let result = self
            .updater
            .change_priority(change.task_id, change.priority)
            .await;
        if let Err(e) = &result {
            tracing::warn!(task_id = %change.task_id, error = %e, "Priority change failed");
        }

        Some(self.state.lock().await.settle(&change, result.is_ok()))
    }

    pub async fn snapshot(&self, users: &[UserSummary]) -> BoardSnapshot {
        self.state.lock().await.snapshot(users)
    }

    /// Runs `f` against the locked state (paging, reloads, inspection)
    pub async fn with_state<R>(&self, f: impl FnOnce(&mut BoardState) -> R) -> R {
        f(&mut *self.state.lock().await)
    }
}
