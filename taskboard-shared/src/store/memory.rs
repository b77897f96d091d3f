//! In-memory record store
//!
//! Mirrors the Postgres adapter's observable behavior: the assignee foreign
//! key and the unique email are enforced, listings honor the same
//! filter/sort/window semantics. [`InMemoryRecordStore::set_available`]
//! simulates an outage so degraded read paths can be exercised.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{CreateTask, CreateUser, Task, TaskChanges, User};
use crate::query::filter::{PageWindow, TaskFilter, TaskSort};

#[derive(Debug, Default)]
struct State {
    tasks: HashMap<Uuid, Task>,
    users: HashMap<Uuid, User>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl State {
    /// Wall-clock time, bumped so that successive writes never share a timestamp
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Process-local record store
///
/// Title ordering compares UTF-8 bytes, which matches the Postgres adapter's
/// `COLLATE "C"` ordering. Case-insensitive search folds with
/// [`str::to_lowercase`] while Postgres `ILIKE` folds per the database
/// locale, so the two can disagree on non-ASCII letters outside the locale's
/// case mapping.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    state: RwLock<State>,
    available: AtomicBool,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Toggles the simulated outage; while unavailable every call fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store is offline".to_string()))
        }
    }
}

fn missing_assignee(user_id: Uuid) -> StoreError {
    StoreError::ForeignKey(format!("user {user_id} does not exist"))
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        window: Option<PageWindow>,
        sort: TaskSort,
    ) -> StoreResult<Vec<Task>> {
        self.check()?;
        let state = self.state.read().await;

        let mut tasks: Vec<Task> = state.tasks.values().filter(|t| filter.matches(t)).cloned().collect();
        tasks.sort_by(|a, b| sort.compare(a, b));

        Ok(match window {
            Some(w) => {
                let offset = usize::try_from(w.offset).unwrap_or(usize::MAX);
                let limit = usize::try_from(w.limit).unwrap_or(usize::MAX);
                tasks.into_iter().skip(offset).take(limit).collect()
            }
            None => tasks,
        })
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.check()?;
        Ok(self.state.read().await.tasks.get(&id).cloned())
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.tasks.values().filter(|t| filter.matches(t)).count() as u64)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.check()?;
        let mut state = self.state.write().await;

        if !state.users.contains_key(&data.assigned_to_id) {
            return Err(missing_assignee(data.assigned_to_id));
        }

        let now = state.now();
        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            priority: data.priority,
            status: data.status,
            assigned_to_id: data.assigned_to_id,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        self.check()?;
        let mut state = self.state.write().await;

        if let Some(user_id) = changes.assigned_to_id {
            if !state.users.contains_key(&user_id) {
                return Err(missing_assignee(user_id));
            }
        }

        if !state.tasks.contains_key(&id) {
            return Ok(None);
        }
        let now = state.now();

        Ok(state.tasks.get_mut(&id).map(|task| {
            changes.apply_to(task, now);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        Ok(self.state.write().await.tasks.remove(&id).is_some())
    }

    async fn delete_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.check()?;
        let mut state = self.state.write().await;

        let ids: Vec<Uuid> = state
            .tasks
            .values()
            .filter(|t| t.assigned_to_id == user_id)
            .map(|t| t.id)
            .collect();
        for id in &ids {
            state.tasks.remove(id);
        }

        Ok(ids)
    }

    async fn find_users(&self) -> StoreResult<Vec<User>> {
        self.check()?;
        let state = self.state.read().await;

        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.users.get(id).cloned()).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.check()?;
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.email == data.email) {
            return Err(StoreError::Conflict(format!("email {} already registered", data.email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            role: data.role,
            password_hash: data.password_hash,
            created_at: state.now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        let mut state = self.state.write().await;

        if state.tasks.values().any(|t| t.assigned_to_id == id) {
            return Err(StoreError::ForeignKey(format!("user {id} still has assigned tasks")));
        }

        Ok(state.users.remove(&id).is_some())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}
