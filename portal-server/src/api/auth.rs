use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use portal_types::{LoginRequest, LoginResponse, RegisterRequest};

use super::{session_token, ApiError, ApiResult};
use crate::db::repositories::UserRepository;
use crate::state::AppState;

/// POST /api/auth/register - Create an account and start a session
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<LoginResponse>)> {
    payload.validate()?;

    let repo = UserRepository::new(state.db.pool.clone());
    let username = payload.username.trim();
    if repo.is_taken(username, &payload.email)? {
        return Err(ApiError::BadRequest(
            "Username or email already registered".to_string(),
        ));
    }

    let bio = payload.bio.as_deref().map(str::trim).filter(|b| !b.is_empty());
    let user = repo.create(&payload.email, username, bio)?;
    let session_token = state.session_manager.create_session(user.id)?;

    tracing::info!("Registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(LoginResponse { user, session_token })))
}

/// POST /api/auth/login - Start a session for an existing username
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let repo = UserRepository::new(state.db.pool.clone());

    let user = repo
        .get_by_username(payload.username.trim())?
        .ok_or_else(|| ApiError::NotFound(format!("User '{}' not found", payload.username)))?;

    let session_token = state.session_manager.create_session(user.id)?;

    Ok(Json(LoginResponse {
        user,
        session_token,
    }))
}

/// POST /api/auth/logout - End the session named by the token header
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = session_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing session token".to_string()))?;
    state.session_manager.delete_session(token)?;

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}
