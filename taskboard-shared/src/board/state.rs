//! Board state: lanes, shared paging and move reconciliation
//!
//! The board holds a local copy of the task collection. Lanes are a pure
//! projection of that copy: filter by viewer, partition by priority, slice by
//! the shared page index. A drag between lanes rewrites the local copy at
//! once and yields a [`PriorityChange`] to persist; the result of that write
//! is fed back through [`BoardState::settle`].
//!
//! # Reconciliation
//!
//! ```text
//!            apply_drag                 settle(ok, latest)
//!   Clean ───────────────▶ Pending ─────────────────────────▶ Clean
//!     ▲                      │  ▲
//!     │                      │  └── apply_drag (new seq, same snapshot)
//!     │  apply_drag          │ settle(err, latest): revert to snapshot
//!     └──── Reverted ◀───────┘
//! ```
//!
//! Acknowledgements of superseded moves only move the snapshot forward
//! (success) or are dropped (failure).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::models::{Priority, Task, UserSummary};

/// Cards per lane per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// End of a drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragResult {
    pub task_id: Uuid,

    /// Lane the card was picked up from
    pub source: Priority,

    /// Lane the card was dropped on; `None` if dropped outside any lane
    pub destination: Option<Priority>,
}

/// Priority write produced by a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityChange {
    pub task_id: Uuid,
    pub priority: Priority,

    /// Monotonic per board; identifies the latest move of a task
    pub seq: u64,
}

/// Reconciliation state of a task on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    /// Local copy agrees with the last acknowledged write
    #[default]
    Clean,

    /// A move is awaiting acknowledgement
    Pending,

    /// The latest move failed and the card went back to its lane
    Reverted,
}

#[derive(Debug, Clone, Copy)]
struct MoveRecord {
    /// Last priority the store is known to hold
    acknowledged: Priority,
    latest_seq: u64,
    state: MoveState,
}

/// Pagination widget state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageControl {
    pub current_page: usize,
    pub total_pages: usize,
    pub has_previous: bool,
    pub has_next: bool,

    /// Hidden when everything fits on one page
    pub visible: bool,
}

/// A card as rendered in a lane
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardCard {
    #[serde(flatten)]
    pub task: Task,

    /// `None` if the assignee is not in the supplied user list
    pub assignee: Option<UserSummary>,

    pub move_state: MoveState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardLanes {
    #[serde(rename = "HIGH")]
    pub high: Vec<BoardCard>,

    #[serde(rename = "MEDIUM")]
    pub medium: Vec<BoardCard>,

    #[serde(rename = "LOW")]
    pub low: Vec<BoardCard>,
}

impl BoardLanes {
    pub fn lane(&self, priority: Priority) -> &[BoardCard] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }
}

/// Rendered board for the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub lanes: BoardLanes,
    pub pagination: PageControl,
}

/// Local board state for one viewer
#[derive(Debug, Clone)]
pub struct BoardState {
    tasks: Vec<Task>,
    viewer: AuthContext,
    page_size: usize,
    current_page: usize,
    moves: HashMap<Uuid, MoveRecord>,
    next_seq: u64,
}

impl BoardState {
    /// Creates a board on page 1; a zero page size is raised to 1
    pub fn new(tasks: Vec<Task>, viewer: AuthContext, page_size: usize) -> Self {
        Self {
            tasks,
            viewer,
            page_size: page_size.max(1),
            current_page: 1,
            moves: HashMap::new(),
            next_seq: 1,
        }
    }

    pub fn viewer(&self) -> &AuthContext {
        &self.viewer
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks the viewer may see, in collection order
    ///
    /// Mirrors the server's scoping rule for rendering only.
    pub fn visible_tasks(&self) -> impl Iterator<Item = &Task> {
        let viewer = self.viewer;
        self.tasks
            .iter()
            .filter(move |t| viewer.is_admin() || t.assigned_to_id == viewer.user_id)
    }

    /// Every visible task in a lane
    pub fn lane(&self, priority: Priority) -> Vec<&Task> {
        self.visible_tasks().filter(|t| t.priority == priority).collect()
    }

    /// The slice of a lane shown on the current page
    pub fn lane_window(&self, priority: Priority) -> Vec<&Task> {
        let start = (self.current_page - 1).saturating_mul(self.page_size);
        self.visible_tasks()
            .filter(|t| t.priority == priority)
            .skip(start)
            .take(self.page_size)
            .collect()
    }

    /// `ceil(longest lane / page size)`
    pub fn total_pages(&self) -> usize {
        let longest = Priority::ALL
            .iter()
            .map(|p| self.visible_tasks().filter(|t| t.priority == *p).count())
            .max()
            .unwrap_or(0);
        longest.div_ceil(self.page_size)
    }

    /// Moves to `page`, clamped to `[1, max(total_pages, 1)]`
    pub fn set_page(&mut self, page: usize) -> usize {
        let last = self.total_pages().max(1);
        self.current_page = page.clamp(1, last);
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_add(1))
    }

    pub fn previous_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_sub(1))
    }

    pub fn page_control(&self) -> PageControl {
        let total_pages = self.total_pages();
        PageControl {
            current_page: self.current_page,
            total_pages,
            has_previous: self.current_page > 1,
            has_next: self.current_page < total_pages,
            visible: total_pages > 1,
        }
    }

    /// Applies a drag optimistically
    ///
    /// Returns the write to persist, or `None` when the gesture is a no-op:
    /// dropped outside any lane, dropped on its own lane, not on this board,
    /// or started from a lane the card has since left.
    pub fn apply_drag(&mut self, drag: &DragResult) -> Option<PriorityChange> {
        let destination = drag.destination?;
        if destination == drag.source {
            return None;
        }

        let task = self.tasks.iter_mut().find(|t| t.id == drag.task_id)?;
        if task.priority != drag.source {
            return None;
        }

        let acknowledged = match self.moves.get(&drag.task_id) {
            Some(record) if record.state == MoveState::Pending => record.acknowledged,
            _ => task.priority,
        };
        task.priority = destination;

        let seq = self.next_seq;
        self.next_seq += 1;
        self.moves.insert(
            drag.task_id,
            MoveRecord {
                acknowledged,
                latest_seq: seq,
                state: MoveState::Pending,
            },
        );

        Some(PriorityChange {
            task_id: drag.task_id,
            priority: destination,
            seq,
        })
    }

    /// Feeds back the result of persisting `change`
    pub fn settle(&mut self, change: &PriorityChange, succeeded: bool) -> MoveState {
        let Some(record) = self.moves.get_mut(&change.task_id) else {
            // cleared by reload or already settled
            return MoveState::Clean;
        };

        if change.seq == record.latest_seq {
            if succeeded {
                self.moves.remove(&change.task_id);
                return MoveState::Clean;
            }

            let acknowledged = record.acknowledged;
            record.state = MoveState::Reverted;
            if let Some(task) = self.tasks.iter_mut().find(|t| t.id == change.task_id) {
                task.priority = acknowledged;
            }
            return MoveState::Reverted;
        }

        if change.seq < record.latest_seq && succeeded {
            record.acknowledged = change.priority;
            if record.state == MoveState::Reverted {
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == change.task_id) {
                    task.priority = change.priority;
                }
            }
        }
        record.state
    }

    pub fn move_state(&self, task_id: Uuid) -> MoveState {
        self.moves
            .get(&task_id)
            .map(|r| r.state)
            .unwrap_or_default()
    }

    /// Replaces the local collection and forgets every in-flight move
    pub fn reload(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.moves.clear();
        let page = self.current_page;
        self.set_page(page);
    }

    /// Renders the current page
    pub fn snapshot(&self, users: &[UserSummary]) -> BoardSnapshot {
        let users: HashMap<Uuid, &UserSummary> = users.iter().map(|u| (u.id, u)).collect();
        let cards = |priority| -> Vec<BoardCard> {
            self.lane_window(priority)
                .into_iter()
                .map(|task| BoardCard {
                    assignee: users.get(&task.assigned_to_id).map(|u| (*u).clone()),
                    move_state: self.move_state(task.id),
                    task: task.clone(),
                })
                .collect()
        };

        BoardSnapshot {
            lanes: BoardLanes {
                high: cards(Priority::High),
                medium: cards(Priority::Medium),
                low: cards(Priority::Low),
            },
            pagination: self.page_control(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, Status};
    use chrono::{Duration, Utc};

    fn task(assignee: Uuid, priority: Priority, n: i64) -> Task {
        let created = Utc::now() - Duration::minutes(n);
        Task {
            id: Uuid::new_v4(),
            title: format!("task {n}"),
            description: String::new(),
            due_date: created + Duration::days(1),
            priority,
            status: Status::Pending,
            assigned_to_id: assignee,
            created_at: created,
            updated_at: created,
        }
    }

    fn admin() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), Role::Admin)
    }

    fn drag(task_id: Uuid, source: Priority, destination: Option<Priority>) -> DragResult {
        DragResult {
            task_id,
            source,
            destination,
        }
    }

    #[test]
    fn test_user_sees_only_own_tasks() {
        let me = AuthContext::new(Uuid::new_v4(), Role::User);
        let other = Uuid::new_v4();
        let board = BoardState::new(
            vec![
                task(me.user_id, Priority::High, 1),
                task(other, Priority::High, 2),
                task(me.user_id, Priority::Low, 3),
            ],
            me,
            DEFAULT_PAGE_SIZE,
        );

        assert_eq!(board.visible_tasks().count(), 2);
        assert_eq!(board.lane(Priority::High).len(), 1);
        assert_eq!(board.lane(Priority::Medium).len(), 0);
    }

    #[test]
    fn test_every_task_in_exactly_one_lane() {
        let owner = Uuid::new_v4();
        let tasks: Vec<Task> = (0..9)
            .map(|n| task(owner, Priority::ALL[(n % 3) as usize], n))
            .collect();
        let board = BoardState::new(tasks, admin(), DEFAULT_PAGE_SIZE);

        let total: usize = Priority::ALL.iter().map(|p| board.lane(*p).len()).sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_shared_page_index() {
        let owner = Uuid::new_v4();
        let mut tasks: Vec<Task> = (0..12).map(|n| task(owner, Priority::High, n)).collect();
        tasks.extend((0..3).map(|n| task(owner, Priority::Low, 100 + n)));
        let mut board = BoardState::new(tasks, admin(), 5);

        assert_eq!(board.total_pages(), 3);

        board.set_page(3);
        assert_eq!(board.lane_window(Priority::High).len(), 2);
        assert!(board.lane_window(Priority::Low).is_empty());

        board.set_page(1);
        assert_eq!(board.lane_window(Priority::High).len(), 5);
        assert_eq!(board.lane_window(Priority::Low).len(), 3);
    }

    #[test]
    fn test_page_control() {
        let owner = Uuid::new_v4();
        let tasks: Vec<Task> = (0..11).map(|n| task(owner, Priority::Medium, n)).collect();
        let mut board = BoardState::new(tasks, admin(), 5);

        let control = board.page_control();
        assert!(control.visible);
        assert!(!control.has_previous);
        assert!(control.has_next);

        assert_eq!(board.next_page(), 2);
        assert_eq!(board.next_page(), 3);
        assert_eq!(board.next_page(), 3);
        assert!(!board.page_control().has_next);

        assert_eq!(board.set_page(0), 1);
        assert_eq!(board.set_page(99), 3);
    }

    #[test]
    fn test_single_page_hides_control() {
        let board = BoardState::new(vec![task(Uuid::new_v4(), Priority::High, 1)], admin(), 5);
        let control = board.page_control();

        assert_eq!(control.total_pages, 1);
        assert!(!control.visible);

        let empty = BoardState::new(vec![], admin(), 5);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.page_control().visible);
    }

    #[test]
    fn test_noop_drags() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        assert!(board.apply_drag(&drag(id, Priority::High, None)).is_none());
        assert!(board.apply_drag(&drag(id, Priority::High, Some(Priority::High))).is_none());
        assert!(board
            .apply_drag(&drag(Uuid::new_v4(), Priority::High, Some(Priority::Low)))
            .is_none());
        assert_eq!(board.move_state(id), MoveState::Clean);
    }

    #[test]
    fn test_stale_source_ignored() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        assert!(board
            .apply_drag(&drag(id, Priority::Medium, Some(Priority::Low)))
            .is_none());
        assert_eq!(board.task(id).unwrap().priority, Priority::High);
        assert_eq!(board.move_state(id), MoveState::Clean);

        // a second gesture replayed after the first landed
        let change = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        assert!(board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Medium)))
            .is_none());
        assert_eq!(board.task(id).unwrap().priority, Priority::Low);
        assert_eq!(board.settle(&change, true), MoveState::Clean);
    }

    #[test]
    fn test_successful_move() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        let change = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        assert_eq!(change.priority, Priority::Low);
        assert_eq!(board.task(id).unwrap().priority, Priority::Low);
        assert_eq!(board.move_state(id), MoveState::Pending);

        assert_eq!(board.settle(&change, true), MoveState::Clean);
        assert_eq!(board.task(id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_failed_move_reverts() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        let change = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Medium)))
            .unwrap();
        assert_eq!(board.settle(&change, false), MoveState::Reverted);
        assert_eq!(board.task(id).unwrap().priority, Priority::High);
        assert_eq!(board.lane(Priority::High).len(), 1);
    }

    #[test]
    fn test_superseded_failure_ignored() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        let first = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        let second = board
            .apply_drag(&drag(id, Priority::Low, Some(Priority::Medium)))
            .unwrap();

        assert_eq!(board.settle(&first, false), MoveState::Pending);
        assert_eq!(board.task(id).unwrap().priority, Priority::Medium);

        assert_eq!(board.settle(&second, true), MoveState::Clean);
        assert_eq!(board.task(id).unwrap().priority, Priority::Medium);
    }

    #[test]
    fn test_latest_failure_reverts_to_acknowledged() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        let first = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        let second = board
            .apply_drag(&drag(id, Priority::Low, Some(Priority::Medium)))
            .unwrap();

        // first write landed, second did not
        board.settle(&first, true);
        assert_eq!(board.settle(&second, false), MoveState::Reverted);
        assert_eq!(board.task(id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_late_success_after_revert_updates_card() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t], admin(), 5);

        let first = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        let second = board
            .apply_drag(&drag(id, Priority::Low, Some(Priority::Medium)))
            .unwrap();

        assert_eq!(board.settle(&second, false), MoveState::Reverted);
        assert_eq!(board.task(id).unwrap().priority, Priority::High);

        assert_eq!(board.settle(&first, true), MoveState::Reverted);
        assert_eq!(board.task(id).unwrap().priority, Priority::Low);
    }

    #[test]
    fn test_reload_clears_moves() {
        let t = task(Uuid::new_v4(), Priority::High, 1);
        let id = t.id;
        let mut board = BoardState::new(vec![t.clone()], admin(), 5);

        let change = board
            .apply_drag(&drag(id, Priority::High, Some(Priority::Low)))
            .unwrap();
        board.reload(vec![t]);

        assert_eq!(board.move_state(id), MoveState::Clean);
        assert_eq!(board.settle(&change, false), MoveState::Clean);
        assert_eq!(board.task(id).unwrap().priority, Priority::High);
    }

    #[test]
    fn test_snapshot_resolves_assignees() {
        let user = UserSummary {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let board = BoardState::new(
            vec![
                task(user.id, Priority::High, 1),
                task(Uuid::new_v4(), Priority::Low, 2),
            ],
            admin(),
            5,
        );

        let snapshot = board.snapshot(std::slice::from_ref(&user));
        assert_eq!(snapshot.lanes.high[0].assignee.as_ref().unwrap().name, "Ada");
        assert!(snapshot.lanes.low[0].assignee.is_none());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["lanes"]["HIGH"].is_array());
        assert_eq!(json["pagination"]["currentPage"], 1);
        assert_eq!(json["lanes"]["HIGH"][0]["moveState"], "clean");
    }
}
