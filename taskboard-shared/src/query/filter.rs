//! Filter, sort and window descriptions for task queries
//!
//! These are store-agnostic: the Postgres adapter turns them into SQL, the
//! in-memory adapter evaluates them directly via [`TaskFilter::matches`] and
//! [`TaskSort::compare`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::models::{Priority, Status, Task};

/// How the free-text search compares strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Exact substring match (`LIKE`)
    #[default]
    CaseSensitive,

    /// Substring match ignoring case (`ILIKE`)
    CaseInsensitive,
}

/// Task filter
///
/// Every field is optional; set fields are combined with AND. The search term
/// matches title OR description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Exact assignee match
    pub assigned_to_id: Option<Uuid>,

    /// Exact priority match
    pub priority: Option<Priority>,

    /// Exact status match
    pub status: Option<Status>,

    /// Substring searched in title or description
    pub search: Option<String>,

    /// Case rule for `search`
    pub search_mode: SearchMode,
}

impl TaskFilter {
    /// Creates an empty filter (matches every task)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assigned_to(mut self, user_id: Uuid) -> Self {
        self.assigned_to_id = Some(user_id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the search term; empty terms are ignored
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.is_empty() { None } else { Some(term) };
        self
    }

    pub fn with_search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = mode;
        self
    }

    /// Evaluates the filter against a task
    pub fn matches(&self, task: &Task) -> bool {
        if self.assigned_to_id.is_some_and(|id| task.assigned_to_id != id) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if self.status.is_some_and(|s| task.status != s) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => self.text_matches(&task.title, term) || self.text_matches(&task.description, term),
            None => true,
        }
    }

    fn text_matches(&self, haystack: &str, term: &str) -> bool {
        match self.search_mode {
            SearchMode::CaseSensitive => haystack.contains(term),
            SearchMode::CaseInsensitive => haystack.to_lowercase().contains(&term.to_lowercase()),
        }
    }
}

/// Column a task listing is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Title,
}

impl SortField {
    /// Database column for this field
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort order for task listings
///
/// Defaults to newest first. Ties are broken by id in the same direction so
/// consecutive pages never overlap or skip rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl TaskSort {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Compares two tasks under this ordering, id as tie-break
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let primary = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::Title => a.title.cmp(&b.title),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Offset/limit window into an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

impl PageWindow {
    /// Window for a 1-indexed page; callers guarantee `page >= 1`
    pub fn for_page(page: u32, page_size: u32) -> Self {
        Self {
            offset: u64::from(page.saturating_sub(1)) * u64::from(page_size),
            limit: u64::from(page_size),
        }
    }
}
