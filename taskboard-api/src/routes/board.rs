/// Board endpoint
///
/// ```text
/// GET /api/board?page=2
/// ```
///
/// ```json
/// {
///   "lanes": { "HIGH": [...], "MEDIUM": [...], "LOW": [...] },
///   "pagination": { "currentPage": 2, "totalPages": 3, "hasPrevious": true, "hasNext": true, "visible": true }
/// }
/// ```
///
/// The projection is computed from the cached dashboard reads, so a store
/// outage renders an empty board rather than an error. Pages past the end are
/// clamped to the last page.
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use taskboard_shared::auth::AuthContext;
use taskboard_shared::board::{BoardSnapshot, BoardState};

use super::parse_number;
use crate::app::AppState;
use crate::error::ApiResult;

#[derive(Debug, Default, Deserialize)]
pub struct BoardParams {
    pub page: Option<String>,
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<BoardParams>,
) -> ApiResult<Json<BoardSnapshot>> {
    let page = parse_number("page", params.page.as_deref(), 1)?;

    let (tasks, users) = tokio::join!(state.dashboard.get_tasks(), state.dashboard.get_users());

    let mut board = BoardState::new(tasks, auth, state.config.board.page_size);
    let current = board.set_page(page as usize);
    tracing::debug!(
        user_id = %auth.user_id,
        requested = page,
        current,
        total_pages = board.total_pages(),
        "Rendered board"
    );

    Ok(Json(board.snapshot(&users)))
}
