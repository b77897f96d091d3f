/// API route handlers
///
/// - `health`: Health check endpoint
/// - `tasks`: Task listing and task commands
/// - `board`: Priority board projection
/// - `users`: Admin-only user provisioning
pub mod board;
pub mod health;
pub mod tasks;
pub mod users;

use crate::error::{ApiError, ApiResult};

/// Parses an optional numeric query parameter
///
/// Absent or blank values fall back to `default`.
pub(crate) fn parse_number(name: &str, raw: Option<&str>, default: u32) -> ApiResult<u32> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<u32>()
            .map_err(|_| ApiError::BadRequest(format!("{name} must be a positive integer"))),
    }
}

/// Treats blank query parameters as absent
pub(crate) fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}
