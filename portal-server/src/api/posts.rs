use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use portal_types::{
    CommentWithAuthor, CreateCommentRequest, CreatePostRequest, FeedPost, FieldError,
    NotificationType, Post, PostDetail, ToggleOutcome, ToggleResponse, UserSummary,
};

use super::{parse_id, require_user, ApiError, ApiResult};
use crate::db::repositories::{
    EngagementRepository, NotificationRepository, PostRepository, SystemRepository,
    UserRepository,
};
use crate::db::schema::PORTAL_USERNAME;
use crate::db::now;
use crate::feed::FeedQuery;
use crate::state::AppState;

/// Response header carrying the cursor for the next feed page
pub const NEXT_CURSOR_HEADER: &str = "X-Next-Cursor";

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    #[serde(default)]
    sort: Option<String>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

/// Parse the raw `limit` query value; range checks happen in `FeedQuery`
pub(crate) fn parse_limit(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(|_| {
            ApiError::Validation(vec![FieldError::new(
                "limit",
                "limit must be a positive integer",
            )])
        }),
    }
}

fn load_post(state: &AppState, post_id: &Uuid) -> Result<Post, ApiError> {
    PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// Record a notification for `owner`. The triggering write has already
/// committed, so a failure here is logged rather than returned.
pub(crate) fn notify(state: &AppState, owner: &Uuid, kind: NotificationType, data: serde_json::Value) {
    let repo = NotificationRepository::new(state.db.pool.clone());
    if let Err(e) = repo.create(owner, kind, data) {
        tracing::warn!("Failed to create {} notification for {}: {:#}", kind.as_str(), owner, e);
    }
}

fn actor_username(state: &AppState, user_id: &Uuid) -> Result<String, ApiError> {
    let user = UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Session user no longer exists".to_string()))?;
    Ok(user.username)
}

fn toggle_response(message: &str, outcome: ToggleOutcome) -> Json<ToggleResponse> {
    Json(ToggleResponse {
        message: message.to_string(),
        outcome,
    })
}

/// GET /api/posts - One page of the published feed
pub async fn get_feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> ApiResult<(HeaderMap, Json<Vec<FeedPost>>)> {
    let limit = parse_limit(params.limit.as_deref())?;
    let query = FeedQuery::from_params(
        params.sort.as_deref(),
        params.cursor.as_deref(),
        limit,
        &state.feed,
    )?;

    let posts = PostRepository::new(state.db.pool.clone()).feed(&query)?;

    let mut headers = HeaderMap::new();
    if let Some(cursor) = query.next_cursor(&posts) {
        let value = HeaderValue::from_str(&cursor.to_string())
            .map_err(|e| ApiError::InternalError(format!("Invalid cursor header: {}", e)))?;
        headers.insert(NEXT_CURSOR_HEADER, value);
    }

    Ok((headers, Json(posts)))
}

/// GET /api/posts/:id - A post with its author and comments
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<PostDetail>> {
    let post_id = parse_id(&post_id_str, "post")?;
    let post = load_post(&state, &post_id)?;

    let author = UserRepository::new(state.db.pool.clone())
        .get_by_id(&post.author_id)?
        .map(|u| UserSummary::from(&u));
    let comments = EngagementRepository::new(state.db.pool.clone()).comments(&post_id)?;

    Ok(Json(PostDetail {
        post,
        author,
        comments,
    }))
}

/// POST /api/posts - Create a post or draft
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    let author_id = require_user(&state, &headers)?;
    payload.validate()?;

    let created_at = now();
    let post = Post {
        id: Uuid::new_v4(),
        author_id,
        title: payload.title.trim().to_string(),
        description: payload
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        body: payload.body.trim().to_string(),
        tags: payload.tags.into_tags(),
        category: payload.category.unwrap_or_default().trim().to_string(),
        sponsored: payload.sponsored,
        is_draft: payload.is_draft,
        created_at,
        updated_at: created_at,
        likes_count: 0,
        comments_count: 0,
        saves_count: 0,
        shares_count: 0,
    };

    let post_repo = PostRepository::new(state.db.pool.clone());
    post_repo.create(&post)?;
    tracing::info!("User {} created post {}", author_id, post.id);

    if !post.is_draft && post_repo.published_count(&author_id)? == 1 {
        if let Err(e) = welcome_first_post(&state, &post) {
            tracing::warn!("First-post welcome failed for {}: {:?}", post.id, e);
        }
    }

    // Re-read so an automatic like shows up in the returned counters
    let post = post_repo.get_by_id(&post.id)?.unwrap_or(post);
    Ok((StatusCode::CREATED, Json(post)))
}

/// The official account likes each member's first published post, once per member.
fn welcome_first_post(state: &AppState, post: &Post) -> Result<(), ApiError> {
    let pool = state.db.pool.clone();
    let Some(portal) = UserRepository::new(pool.clone()).get_by_username(PORTAL_USERNAME)? else {
        return Ok(());
    };
    if portal.id == post.author_id {
        return Ok(());
    }

    let flag = format!("first-like-sent:{}", post.author_id);
    if !SystemRepository::new(pool.clone()).claim(&flag, &json!(true))? {
        return Ok(());
    }

    let outcome = EngagementRepository::new(pool).like(&portal.id, &post.id)?;
    if outcome.is_applied() {
        notify(
            state,
            &post.author_id,
            NotificationType::Like,
            json!({
                "username": "Portal Official",
                "postTitle": post.title,
                "postId": post.id,
            }),
        );
    }
    Ok(())
}

/// DELETE /api/posts/:id - Delete your own post
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;

    let post = load_post(&state, &post_id)?;
    if post.author_id != user_id {
        return Err(ApiError::Forbidden(
            "Not authorized to delete this post".to_string(),
        ));
    }

    PostRepository::new(state.db.pool.clone()).delete(&post_id)?;
    tracing::info!("User {} deleted post {}", user_id, post_id);

    Ok(Json(json!({ "message": "Post deleted" })))
}

/// POST /api/posts/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;
    let post = load_post(&state, &post_id)?;

    let outcome = EngagementRepository::new(state.db.pool.clone()).like(&user_id, &post_id)?;

    if outcome.is_applied() && post.author_id != user_id {
        let username = actor_username(&state, &user_id)?;
        notify(
            &state,
            &post.author_id,
            NotificationType::Like,
            json!({
                "username": username,
                "postTitle": post.title,
                "postId": post.id,
            }),
        );
    }

    Ok(toggle_response("Post liked", outcome))
}

/// DELETE /api/posts/:id/like
pub async fn unlike_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;
    load_post(&state, &post_id)?;

    let outcome = EngagementRepository::new(state.db.pool.clone()).unlike(&user_id, &post_id)?;
    Ok(toggle_response("Post unliked", outcome))
}

/// POST /api/posts/:id/save
pub async fn save_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;
    load_post(&state, &post_id)?;

    let outcome = EngagementRepository::new(state.db.pool.clone()).save(&user_id, &post_id)?;
    Ok(toggle_response("Post saved", outcome))
}

/// DELETE /api/posts/:id/save
pub async fn unsave_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;
    load_post(&state, &post_id)?;

    let outcome = EngagementRepository::new(state.db.pool.clone()).unsave(&user_id, &post_id)?;
    Ok(toggle_response("Post unsaved", outcome))
}

/// POST /api/posts/:id/comment
pub async fn create_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id_str): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentWithAuthor>)> {
    let user_id = require_user(&state, &headers)?;
    let post_id = parse_id(&post_id_str, "post")?;
    payload.validate()?;
    let post = load_post(&state, &post_id)?;

    let author = UserRepository::new(state.db.pool.clone())
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::Unauthorized("Session user no longer exists".to_string()))?;

    let body = payload.body.trim();
    let comment =
        EngagementRepository::new(state.db.pool.clone()).add_comment(&post_id, &user_id, body)?;

    if post.author_id != user_id {
        notify(
            &state,
            &post.author_id,
            NotificationType::Comment,
            json!({
                "username": author.username,
                "postTitle": post.title,
                "postId": post.id,
                "commentBody": comment.body,
            }),
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(CommentWithAuthor {
            comment,
            author: UserSummary::from(&author),
        }),
    ))
}

/// GET /api/posts/:id/comments
pub async fn get_comments(
    State(state): State<AppState>,
    Path(post_id_str): Path<String>,
) -> ApiResult<Json<Vec<CommentWithAuthor>>> {
    let post_id = parse_id(&post_id_str, "post")?;
    load_post(&state, &post_id)?;

    let comments = EngagementRepository::new(state.db.pool.clone()).comments(&post_id)?;
    Ok(Json(comments))
}
