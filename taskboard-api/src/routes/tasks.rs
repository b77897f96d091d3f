/// Task endpoints
///
/// # Endpoints
///
/// - `GET    /api/tasks` - Filtered, paginated listing scoped to the caller
/// - `POST   /api/tasks` - Create a task
/// - `PUT    /api/tasks/:id` - Replace every mutable field
/// - `PATCH  /api/tasks/:id/status` - Change status only
/// - `PATCH  /api/tasks/:id/priority` - Change priority only
/// - `DELETE /api/tasks/:id` - Delete a task
///
/// Non-admins only see, create and mutate tasks assigned to themselves.
/// Command endpoints answer `{"success": true}` or an error body.
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::authorization::{require_assignment, require_task_access};
use taskboard_shared::auth::AuthContext;
use taskboard_shared::commands::{CommandOutcome, TaskInput};
use taskboard_shared::models::{Priority, Status, Task, TaskWithAssignee};
use taskboard_shared::query::filter::{TaskFilter, TaskSort};
use taskboard_shared::query::PageRequest;
use uuid::Uuid;

use super::{non_blank, parse_number};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Query string of `GET /api/tasks`
///
/// Everything arrives as text so malformed values can be answered with a
/// JSON 400 instead of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,

    /// Honored for admins only; users are always scoped to themselves
    pub assigned_to_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct ListTasksResponse {
    pub tasks: Vec<TaskWithAssignee>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: Status,
}

#[derive(Debug, Deserialize)]
pub struct PriorityBody {
    pub priority: Priority,
}

impl ListTasksParams {
    /// Turns the raw query string into a filter and page request
    fn parse(&self, state: &AppState) -> ApiResult<(TaskFilter, PageRequest)> {
        let listing = &state.config.listing;

        let page = parse_number("page", self.page.as_deref(), 1)?;
        let limit = parse_number("limit", self.limit.as_deref(), listing.default_limit)?;
        if limit > listing.max_limit {
            return Err(ApiError::BadRequest(format!(
                "limit must be at most {}",
                listing.max_limit
            )));
        }
        let request = PageRequest::new(page, limit)?;

        let mut filter = TaskFilter::new().with_search_mode(listing.search_mode);
        if let Some(raw) = non_blank(self.priority.as_deref()) {
            let priority = raw
                .parse::<Priority>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            filter = filter.with_priority(priority);
        }
        if let Some(raw) = non_blank(self.status.as_deref()) {
            let status = raw
                .parse::<Status>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            filter = filter.with_status(status);
        }
        if let Some(raw) = non_blank(self.assigned_to_id.as_deref()) {
            let user_id = Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("assignedToId must be a UUID".to_string()))?;
            filter = filter.assigned_to(user_id);
        }
        if let Some(term) = self.search.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_search(term);
        }

        Ok((filter, request))
    }
}

/// Lists tasks visible to the caller
///
/// ```text
/// GET /api/tasks?page=2&limit=10&priority=HIGH&status=PENDING&search=report
/// Authorization: Bearer <token>
/// ```
///
/// ```json
/// {
///   "tasks": [{ "id": "...", "title": "...", "assignedTo": { "id": "...", "name": "...", "email": "..." } }],
///   "pagination": { "total": 25, "page": 2, "limit": 10, "totalPages": 3 }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed page, limit, priority, status or assignee
/// - `401 Unauthorized`: missing or invalid token
/// - `500 Internal Server Error`: store failure
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<ListTasksParams>,
) -> ApiResult<Json<ListTasksResponse>> {
    let (filter, request) = params.parse(&state)?;

    let page = state
        .queries
        .list_tasks(&auth, filter, request, TaskSort::default())
        .await?;

    let pagination = Pagination {
        total: page.total,
        page: page.page,
        limit: page.page_size,
        total_pages: page.total_pages(),
    };
    let tasks = state.queries.with_assignees(page.items).await?;

    Ok(Json(ListTasksResponse { tasks, pagination }))
}

/// Loads a task and checks the caller may act on it
async fn authorized_task(state: &AppState, auth: &AuthContext, id: Uuid) -> ApiResult<Task> {
    let task = state
        .store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    require_task_access(auth, &task)?;
    Ok(task)
}

/// Creates a task
///
/// # Errors
///
/// - `403 Forbidden`: a non-admin assigning to someone else
/// - `422 Unprocessable Entity`: validation failure (e.g. "Due date is required")
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    let Json(input) = payload?;
    require_assignment(&auth, input.assigned_to_id)?;

    state.tasks.create(input).await?;
    Ok(Json(CommandOutcome::success()))
}

/// Replaces title, description, due date, priority, status and assignee
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<TaskInput>, JsonRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    let Path(id) = id?;
    let Json(input) = payload?;

    authorized_task(&state, &auth, id).await?;
    require_assignment(&auth, input.assigned_to_id)?;

    state.tasks.update(id, input).await?;
    Ok(Json(CommandOutcome::success()))
}

pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    let Path(id) = id?;
    let Json(body) = payload?;

    authorized_task(&state, &auth, id).await?;
    state.tasks.update_status(id, body.status).await?;
    Ok(Json(CommandOutcome::success()))
}

pub async fn update_task_priority(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<PriorityBody>, JsonRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    let Path(id) = id?;
    let Json(body) = payload?;

    authorized_task(&state, &auth, id).await?;
    state.tasks.update_priority(id, body.priority).await?;
    Ok(Json(CommandOutcome::success()))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    let Path(id) = id?;

    authorized_task(&state, &auth, id).await?;
    state.tasks.delete(id).await?;
    Ok(Json(CommandOutcome::success()))
}
