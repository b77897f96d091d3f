//! PostgreSQL record store
//!
//! Filters, sorts and windows are rendered with [`sqlx::QueryBuilder`] so
//! every user-supplied value is a bind parameter. Only column names from
//! [`SortField::column`](crate::query::filter::SortField::column) are pushed
//! as raw SQL.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{RecordStore, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{CreateTask, CreateUser, Task, TaskChanges, User};
use crate::query::filter::{PageWindow, SearchMode, SortField, TaskFilter, TaskSort};

const TASK_COLUMNS: &str =
    "id, title, description, due_date, priority, status, assigned_to_id, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";

/// Record store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escapes LIKE metacharacters so the term matches literally
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends `WHERE ...` for the filter
fn push_task_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    qb.push(" WHERE TRUE");

    if let Some(user_id) = filter.assigned_to_id {
        qb.push(" AND assigned_to_id = ").push_bind(user_id);
    }
    if let Some(priority) = filter.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(term) = filter.search.as_deref() {
        let op = match filter.search_mode {
            SearchMode::CaseSensitive => " LIKE ",
            SearchMode::CaseInsensitive => " ILIKE ",
        };
        let pattern = like_pattern(term);

        qb.push(" AND (title")
            .push(op)
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description")
            .push(op)
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// Titles order by code point so the in-memory adapter sorts identically
fn push_task_sort(qb: &mut QueryBuilder<'_, Postgres>, sort: TaskSort) {
    let dir = sort.direction.as_sql();
    let collation = match sort.field {
        SortField::Title => " COLLATE \"C\"",
        _ => "",
    };
    qb.push(format_args!(
        " ORDER BY {}{} {}, id {}",
        sort.field.column(),
        collation,
        dir,
        dir
    ));
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn find_tasks(
        &self,
        filter: &TaskFilter,
        window: Option<PageWindow>,
        sort: TaskSort,
    ) -> StoreResult<Vec<Task>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_task_filter(&mut qb, filter);
        push_task_sort(&mut qb, sort);

        if let Some(window) = window {
            qb.push(" LIMIT ")
                .push_bind(to_i64(window.limit))
                .push(" OFFSET ")
                .push_bind(to_i64(window.offset));
        }

        let tasks = qb.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filter(&mut qb, filter);

        let (count,) = qb.build_query_as::<(i64,)>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (title, description, due_date, priority, status, assigned_to_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.assigned_to_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> StoreResult<Option<Task>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(description) = changes.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(due_date) = changes.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(priority) = changes.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(assigned_to_id) = changes.assigned_to_id {
            qb.push(", assigned_to_id = ").push_bind(assigned_to_id);
        }

        qb.push(" WHERE id = ").push_bind(id);
        qb.push(format_args!(" RETURNING {TASK_COLUMNS}"));

        let task = qb.build_query_as::<Task>().fetch_optional(&self.pool).await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("DELETE FROM tasks WHERE assigned_to_id = $1 RETURNING id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn find_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.role)
        .bind(data.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await.map_err(StoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use crate::query::filter::SortDirection;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("report"), "%report%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\tmp"), "%c:\\\\tmp%");
    }

    #[test]
    fn test_filter_sql() {
        let filter = TaskFilter::new()
            .assigned_to(Uuid::new_v4())
            .with_priority(Priority::High)
            .with_status(Status::Pending)
            .with_search("x")
            .with_search_mode(SearchMode::CaseInsensitive);

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filter(&mut qb, &filter);
        let sql = qb.sql();

        assert!(sql.contains("assigned_to_id = $1"));
        assert!(sql.contains("priority = $2"));
        assert!(sql.contains("status = $3"));
        assert!(sql.contains("title ILIKE $4"));
        assert!(sql.contains("description ILIKE $5"));
    }

    #[test]
    fn test_empty_filter_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filter(&mut qb, &TaskFilter::new());

        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM tasks WHERE TRUE");
    }

    #[test]
    fn test_sort_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_task_sort(&mut qb, TaskSort::new(SortField::DueDate, SortDirection::Asc));

        assert_eq!(qb.sql(), "SELECT 1 ORDER BY due_date ASC, id ASC");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_task_sort(&mut qb, TaskSort::new(SortField::Title, SortDirection::Desc));
        assert_eq!(qb.sql(), "SELECT 1 ORDER BY title COLLATE \"C\" DESC, id DESC");
    }
}
