//! Dashboard read model
//!
//! Cached reads backing the dashboard screens. Unlike
//! [`crate::query::TaskQueryService`], these never fail: a store error is
//! logged and the caller gets an empty list or `None`. Failures are not
//! cached, so the next read retries the store.

use std::sync::Arc;

use uuid::Uuid;

use crate::models::{Task, UserSummary};
use crate::query::filter::{TaskFilter, TaskSort};
use crate::store::RecordStore;
use crate::views::{CachedView, ViewCache, ViewKey};

#[derive(Clone)]
pub struct DashboardData {
    store: Arc<dyn RecordStore>,
    views: Arc<ViewCache>,
}

impl DashboardData {
    pub fn new(store: Arc<dyn RecordStore>, views: Arc<ViewCache>) -> Self {
        Self { store, views }
    }

    /// All tasks, newest first
    pub async fn get_tasks(&self) -> Vec<Task> {
        if let Some(CachedView::Tasks(tasks)) = self.views.get(&ViewKey::Dashboard).await {
            return tasks;
        }
        let generation = self.views.generation(&ViewKey::Dashboard).await;

        match self
            .store
            .find_tasks(&TaskFilter::new(), None, TaskSort::default())
            .await
        {
            Ok(tasks) => {
                self.views
                    .put_if_current(ViewKey::Dashboard, generation, CachedView::Tasks(tasks.clone()))
                    .await;
                tasks
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch tasks");
                Vec::new()
            }
        }
    }

    pub async fn get_task_by_id(&self, id: Uuid) -> Option<Task> {
        let key = ViewKey::Task(id);
        if let Some(CachedView::Task(task)) = self.views.get(&key).await {
            return Some(task);
        }
        let generation = self.views.generation(&key).await;

        match self.store.find_task(id).await {
            Ok(Some(task)) => {
                self.views
                    .put_if_current(key, generation, CachedView::Task(task.clone()))
                    .await;
                Some(task)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, task_id = %id, "Failed to fetch task");
                None
            }
        }
    }

    /// All users, newest first, without credentials
    pub async fn get_users(&self) -> Vec<UserSummary> {
        if let Some(CachedView::Users(users)) = self.views.get(&ViewKey::Users).await {
            return users;
        }
        let generation = self.views.generation(&ViewKey::Users).await;

        match self.store.find_users().await {
            Ok(users) => {
                let users: Vec<UserSummary> = users.into_iter().map(UserSummary::from).collect();
                self.views
                    .put_if_current(ViewKey::Users, generation, CachedView::Users(users.clone()))
                    .await;
                users
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch users");
                Vec::new()
            }
        }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Option<UserSummary> {
        let key = ViewKey::User(id);
        if let Some(CachedView::User(user)) = self.views.get(&key).await {
            return Some(user);
        }
        let generation = self.views.generation(&key).await;

        match self.store.find_user(id).await {
            Ok(Some(user)) => {
                let user = UserSummary::from(user);
                self.views
                    .put_if_current(key, generation, CachedView::User(user.clone()))
                    .await;
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, user_id = %id, "Failed to fetch user");
                None
            }
        }
    }
}
