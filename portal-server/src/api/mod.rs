pub mod auth;
pub mod error;
pub mod inbox;
pub mod jobs;
pub mod posts;
pub mod users;

pub use error::{ApiError, ApiResult};

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::state::AppState;

pub const SESSION_HEADER: &str = "X-Session-Token";

fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extract the authenticated user ID from the session token header
pub(crate) fn require_user(state: &AppState, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = session_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;

    state
        .session_manager
        .validate_session(token)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))
}

/// Like `require_user`, but anonymous requests are fine
pub(crate) fn optional_user(state: &AppState, headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    match session_token(headers) {
        Some(token) => Ok(state.session_manager.validate_session(token)?),
        None => Ok(None),
    }
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}
