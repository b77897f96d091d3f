/// User endpoints (administrators only)
///
/// - `GET    /api/users` - All users, newest first, without credentials
/// - `POST   /api/users` - Provision a user
/// - `DELETE /api/users/:id` - Delete a user and every task assigned to them
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Extension, Json,
};
use taskboard_shared::auth::authorization::require_admin;
use taskboard_shared::auth::AuthContext;
use taskboard_shared::commands::{CommandOutcome, UserInput};
use taskboard_shared::models::UserSummary;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiResult;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    require_admin(&auth)?;

    let users = state.store.find_users().await?;
    Ok(Json(users.into_iter().map(UserSummary::from).collect()))
}

/// Creates a user
///
/// # Errors
///
/// - `403 Forbidden`: caller is not an admin
/// - `409 Conflict`: "User with this email already exists"
/// - `422 Unprocessable Entity`: invalid name, email or password
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    require_admin(&auth)?;
    let Json(input) = payload?;

    let user = state.users.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<CommandOutcome>> {
    require_admin(&auth)?;
    let Path(id) = id?;

    let removed = state.users.delete_user(id).await?;
    tracing::info!(user_id = %id, tasks_removed = removed.len(), "User deleted by admin");

    Ok(Json(CommandOutcome::success()))
}
