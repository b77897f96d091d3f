//! Cached dashboard views stay fresh when a write lands mid-read

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use taskboard_shared::commands::{TaskCommandService, TaskInput, UserCommandService, UserInput};
use taskboard_shared::dashboard::DashboardData;
use taskboard_shared::models::{CreateTask, CreateUser, Priority, Role, Status, Task, TaskChanges, User};
use taskboard_shared::query::filter::{PageWindow, TaskFilter, TaskSort};
use taskboard_shared::store::{InMemoryRecordStore, RecordStore, StoreResult};
use taskboard_shared::views::ViewCache;
use tokio::sync::Notify;
use uuid::Uuid;

/// Store wrapper that can hold one listing read after it has hit the store
struct PausingStore {
    inner: Arc<InMemoryRecordStore>,
    armed: AtomicBool,
    reached: Notify,
    resume: Notify,
}

impl PausingStore {
    fn new(inner: Arc<InMemoryRecordStore>) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(false),
            reached: Notify::new(),
            resume: Notify::new(),
        }
    }

    /// Pauses the next `find_tasks` or `find_users` call
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    async fn hold_if_armed(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.resume.notified().await;
        }
    }
}

#[async_trait]
impl RecordStore for PausingStore {
    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        window: Option<PageWindow>,
        sort: TaskSort,
    ) -> StoreResult<Vec<Task>> {
        let tasks = self.inner.find_tasks(filter, window, sort).await;
        self.hold_if_armed().await;
        tasks
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.inner.find_task(id).await
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        self.inner.count_tasks(filter).await
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        self.inner.create_task(data).await
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        self.inner.update_task(id, changes).await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_task(id).await
    }

    async fn delete_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        self.inner.delete_tasks_assigned_to(user_id).await
    }

    async fn find_users(&self) -> StoreResult<Vec<User>> {
        let users = self.inner.find_users().await;
        self.hold_if_armed().await;
        users
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        self.inner.find_users_by_ids(ids).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_email(email).await
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.create_user(data).await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_user(id).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

#[tokio::test]
async fn test_task_created_during_dashboard_read_is_not_masked() {
    let env = common::seeded().await;
    let store = Arc::new(PausingStore::new(env.store.clone()));
    let views = Arc::new(ViewCache::new());
    let dashboard = DashboardData::new(store.clone(), views.clone());
    let commands = TaskCommandService::new(store.clone(), views.clone());

    store.arm();
    let reader = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.get_tasks().await }
    });
    store.reached.notified().await;

    commands
        .create(TaskInput {
            title: "Written mid-read".to_string(),
            description: String::new(),
            due_date: Some(Utc::now() + Duration::days(1)),
            priority: Priority::High,
            status: Status::Pending,
            assigned_to_id: env.alice.id,
        })
        .await
        .unwrap();

    store.resume.notify_one();
    let seen_by_reader = reader.await.unwrap();
    assert!(seen_by_reader.is_empty());

    let tasks = dashboard.get_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Written mid-read");
}

#[tokio::test]
async fn test_user_created_during_user_list_read_is_not_masked() {
    let env = common::seeded().await;
    let store = Arc::new(PausingStore::new(env.store.clone()));
    let views = Arc::new(ViewCache::new());
    let dashboard = DashboardData::new(store.clone(), views.clone());
    let users = UserCommandService::new(store.clone(), views.clone());

    store.arm();
    let reader = tokio::spawn({
        let dashboard = dashboard.clone();
        async move { dashboard.get_users().await }
    });
    store.reached.notified().await;

    users
        .create_user(UserInput {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            password: "correct horse battery".to_string(),
            role: Role::User,
        })
        .await
        .unwrap();

    store.resume.notify_one();
    assert_eq!(reader.await.unwrap().len(), 3);

    let listed = dashboard.get_users().await;
    assert_eq!(listed.len(), 4);
    assert!(listed.iter().any(|u| u.email == "carol@example.com"));
}

#[tokio::test]
async fn test_read_without_concurrent_write_is_cached() {
    let env = common::seeded().await;
    common::task(&env.store, "cached", "", Priority::Low, env.bob.id).await;
    let views = Arc::new(ViewCache::new());
    let dashboard = DashboardData::new(env.dyn_store(), views.clone());

    assert_eq!(dashboard.get_tasks().await.len(), 1);

    // a direct store write bypasses invalidation, so the cached view is served
    common::task(&env.store, "uncached", "", Priority::Low, env.bob.id).await;
    assert_eq!(dashboard.get_tasks().await.len(), 1);
}
