//! Task query service
//!
//! Turns a caller identity plus filter/sort/page parameters into a page of
//! tasks and the total match count.
//!
//! # Scoping
//!
//! Scoping is applied here and nowhere else: a non-admin caller's filter
//! always has `assigned_to_id` replaced by the caller's own id, whatever the
//! client asked for. Admins keep their filter as given.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use taskboard_shared::auth::AuthContext;
//! # use taskboard_shared::query::{PageRequest, TaskQueryService, filter::{TaskFilter, TaskSort}};
//! # use taskboard_shared::store::RecordStore;
//! # async fn example(store: Arc<dyn RecordStore>, me: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
//! let queries = TaskQueryService::new(store);
//! let page = queries
//!     .list_tasks(&me, TaskFilter::new().with_search("report"), PageRequest::new(1, 10)?, TaskSort::default())
//!     .await?;
//! println!("{} of {} tasks, {} pages", page.items.len(), page.total, page.total_pages());
//! # Ok(())
//! # }
//! ```

pub mod filter;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::auth::AuthContext;
use crate::models::{AssigneeSummary, Task, TaskWithAssignee};
use crate::store::{RecordStore, StoreError};
use filter::{PageWindow, TaskFilter, TaskSort};

/// Error type for query operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Page or page size out of range
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// The store failed; callers decide whether to degrade
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validated 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Creates a page request
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidPagination`] if `page` or `page_size` is zero.
    pub fn new(page: u32, page_size: u32) -> Result<Self, QueryError> {
        if page == 0 {
            return Err(QueryError::InvalidPagination("page must be at least 1".to_string()));
        }
        if page_size == 0 {
            return Err(QueryError::InvalidPagination(
                "page size must be at least 1".to_string(),
            ));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::for_page(self.page, self.page_size)
    }
}

/// One page of a task listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPage<T = Task> {
    /// Tasks on this page, in sort order
    pub items: Vec<T>,

    /// Matches across all pages
    pub total: u64,

    /// 1-indexed page number
    pub page: u32,

    pub page_size: u32,
}

impl<T> TaskPage<T> {
    /// `ceil(total / page_size)`, zero for an empty result
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.page_size.max(1)))
    }
}

/// Read-side service over the record store
#[derive(Clone)]
pub struct TaskQueryService {
    store: Arc<dyn RecordStore>,
}

impl TaskQueryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Applies role scoping to a client-supplied filter
    pub fn scope_filter(auth: &AuthContext, mut filter: TaskFilter) -> TaskFilter {
        if !auth.is_admin() {
            filter.assigned_to_id = Some(auth.user_id);
        }
        filter
    }

    /// Lists one page of tasks visible to `auth`
    ///
    /// The page query and the count run concurrently against the same
    /// scoped filter.
    pub async fn list_tasks(
        &self,
        auth: &AuthContext,
        filter: TaskFilter,
        page: PageRequest,
        sort: TaskSort,
    ) -> Result<TaskPage, QueryError> {
        let filter = Self::scope_filter(auth, filter);

        let (items, total) = tokio::try_join!(
            self.store.find_tasks(&filter, Some(page.window()), sort),
            self.store.count_tasks(&filter),
        )?;

        tracing::debug!(
            user_id = %auth.user_id,
            page = page.page(),
            returned = items.len(),
            total,
            "Listed tasks"
        );

        Ok(TaskPage {
            items,
            total,
            page: page.page(),
            page_size: page.page_size(),
        })
    }

    /// Attaches assignee summaries to tasks with one batched user lookup
    ///
    /// Tasks whose assignee cannot be found get `assigned_to: None`.
    pub async fn with_assignees(&self, tasks: Vec<Task>) -> Result<Vec<TaskWithAssignee>, QueryError> {
        let mut ids: Vec<_> = tasks.iter().map(|t| t.assigned_to_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let users = if ids.is_empty() {
            Vec::new()
        } else {
            self.store.find_users_by_ids(&ids).await?
        };
        let by_id: HashMap<_, _> = users.iter().map(|u| (u.id, AssigneeSummary::from(u))).collect();

        Ok(tasks
            .into_iter()
            .map(|task| TaskWithAssignee {
                assigned_to: by_id.get(&task.assigned_to_id).cloned(),
                task,
            })
            .collect())
    }
}
