use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use portal_types::{
    CreateThreadRequest, FieldError, MarkReadRequest, Message, MessageThread, Notification,
    SendMessageRequest, ThreadSummary, UnreadCounts,
};

use super::{parse_id, require_user, ApiError, ApiResult};
use crate::db::repositories::{NotificationRepository, ThreadRepository, UserRepository};
use crate::state::AppState;

/// Load a thread the viewer takes part in: 404 when unknown, 403 for outsiders
fn load_thread(state: &AppState, thread_id: &Uuid, viewer: &Uuid) -> Result<MessageThread, ApiError> {
    let thread = ThreadRepository::new(state.db.pool.clone())
        .get_by_id(thread_id)?
        .ok_or_else(|| ApiError::NotFound("Thread not found".to_string()))?;
    if !thread.has_participant(viewer) {
        return Err(ApiError::Forbidden(
            "Not a participant of this thread".to_string(),
        ));
    }
    Ok(thread)
}

/// GET /api/inbox/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Notification>>> {
    let user_id = require_user(&state, &headers)?;
    let notifications = NotificationRepository::new(state.db.pool.clone()).list_for_user(&user_id)?;
    Ok(Json(notifications))
}

/// An empty body marks everything; anything else must be a valid request.
fn parse_mark_read(body: &[u8]) -> Result<MarkReadRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(MarkReadRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::Validation(vec![FieldError::new("id", format!("Invalid request body: {}", e))])
    })
}

/// POST /api/inbox/notifications/mark-read - One notification by `id`, or all of them
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let request = parse_mark_read(&body)?;

    let repo = NotificationRepository::new(state.db.pool.clone());
    let updated = match request.id {
        Some(id) => repo.mark_read(&user_id, &id)?,
        None => repo.mark_all_read(&user_id)?,
    };

    Ok(Json(json!({
        "message": "Notifications marked as read",
        "updated": updated,
    })))
}

/// GET /api/inbox/threads
pub async fn list_threads(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<ThreadSummary>>> {
    let user_id = require_user(&state, &headers)?;
    let threads = ThreadRepository::new(state.db.pool.clone()).summaries_for_user(&user_id)?;
    Ok(Json(threads))
}

/// POST /api/inbox/threads - Open (or reopen) a conversation with another user
pub async fn create_thread(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateThreadRequest>,
) -> ApiResult<(StatusCode, Json<MessageThread>)> {
    let user_id = require_user(&state, &headers)?;

    let other_user_id = payload
        .other_user_id
        .ok_or_else(|| ApiError::BadRequest("other_user_id is required".to_string()))?;
    if other_user_id == user_id {
        return Err(ApiError::BadRequest(
            "Cannot start a thread with yourself".to_string(),
        ));
    }

    UserRepository::new(state.db.pool.clone())
        .get_by_id(&other_user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let (thread, created) =
        ThreadRepository::new(state.db.pool.clone()).get_or_create(&user_id, &other_user_id)?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(thread)))
}

/// GET /api/inbox/threads/:id/messages - Read a thread, clearing the viewer's unread count
pub async fn get_messages(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(thread_id_str): Path<String>,
) -> ApiResult<Json<Vec<Message>>> {
    let user_id = require_user(&state, &headers)?;
    let thread_id = parse_id(&thread_id_str, "thread")?;
    let thread = load_thread(&state, &thread_id, &user_id)?;

    let messages = ThreadRepository::new(state.db.pool.clone()).read_messages(&thread, &user_id)?;
    Ok(Json(messages))
}

/// POST /api/inbox/threads/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(thread_id_str): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let user_id = require_user(&state, &headers)?;
    let thread_id = parse_id(&thread_id_str, "thread")?;
    payload.validate()?;
    let thread = load_thread(&state, &thread_id, &user_id)?;

    let message = ThreadRepository::new(state.db.pool.clone()).send(&thread, &user_id, &payload.body)?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/inbox/unread - Badge counts for the viewer
pub async fn get_unread_counts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<UnreadCounts>> {
    let user_id = require_user(&state, &headers)?;

    let notifications = NotificationRepository::new(state.db.pool.clone()).list_for_user(&user_id)?;
    let threads = ThreadRepository::new(state.db.pool.clone()).list_for_user(&user_id)?;
    let counts = UnreadCounts::aggregate(
        &user_id,
        &notifications,
        &threads,
        state.welcome.is_unread(&user_id),
    );

    Ok(Json(counts))
}

/// POST /api/inbox/welcome/read
pub async fn mark_welcome_read(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let user_id = require_user(&state, &headers)?;
    state.welcome.mark_read(user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/inbox/welcome/read
pub async fn mark_welcome_unread(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let user_id = require_user(&state, &headers)?;
    state.welcome.mark_unread(&user_id);
    Ok(StatusCode::NO_CONTENT)
}
