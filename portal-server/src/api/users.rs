use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde_json::json;

use portal_types::{NotificationType, ToggleResponse, UserProfileResponse};

use super::posts::notify;
use super::{optional_user, parse_id, require_user, ApiError, ApiResult};
use crate::db::repositories::{FollowRepository, PostRepository, UserRepository};
use crate::state::AppState;

/// Posts shown on a profile page
const PROFILE_POST_LIMIT: u32 = 50;

/// GET /api/users/:username - Profile with published posts
pub async fn get_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> ApiResult<Json<UserProfileResponse>> {
    let viewer = optional_user(&state, &headers)?;
    let pool = state.db.pool.clone();

    let user = UserRepository::new(pool.clone())
        .get_by_username(username.trim())?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts = PostRepository::new(pool.clone()).published_by_author(&user.id, PROFILE_POST_LIMIT)?;

    let is_following = match viewer {
        Some(viewer_id) if viewer_id != user.id => {
            FollowRepository::new(pool).is_following(&viewer_id, &user.id)?
        }
        _ => false,
    };

    Ok(Json(UserProfileResponse {
        user,
        posts,
        is_following,
    }))
}

/// POST /api/users/:id/follow - Follow a user
pub async fn follow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let follower_id = require_user(&state, &headers)?;
    let following_id = parse_id(&user_id_str, "user")?;

    if follower_id == following_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".to_string()));
    }

    // Verify user exists
    let user_repo = UserRepository::new(state.db.pool.clone());
    user_repo
        .get_by_id(&following_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let outcome = FollowRepository::new(state.db.pool.clone()).follow(&follower_id, &following_id)?;

    if outcome.is_applied() {
        if let Some(follower) = user_repo.get_by_id(&follower_id)? {
            notify(
                &state,
                &following_id,
                NotificationType::Follow,
                json!({
                    "username": follower.username,
                    "userId": follower.id,
                }),
            );
        }
    }

    Ok(Json(ToggleResponse {
        message: "User followed".to_string(),
        outcome,
    }))
}

/// DELETE /api/users/:id/follow - Unfollow a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id_str): Path<String>,
) -> ApiResult<Json<ToggleResponse>> {
    let follower_id = require_user(&state, &headers)?;
    let following_id = parse_id(&user_id_str, "user")?;

    if follower_id == following_id {
        return Err(ApiError::BadRequest("Cannot unfollow yourself".to_string()));
    }

    UserRepository::new(state.db.pool.clone())
        .get_by_id(&following_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let outcome =
        FollowRepository::new(state.db.pool.clone()).unfollow(&follower_id, &following_id)?;

    Ok(Json(ToggleResponse {
        message: "User unfollowed".to_string(),
        outcome,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Feed;
    use crate::db::repositories::NotificationRepository;
    use crate::db::Database;
    use axum::http::HeaderValue;
    use portal_types::ToggleOutcome;
    use uuid::Uuid;

    fn setup_test_state() -> AppState {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        AppState::new(db, Feed::default())
    }

    fn login(state: &AppState, username: &str) -> (Uuid, HeaderMap) {
        let user = UserRepository::new(state.db.pool.clone())
            .get_by_username(username)
            .unwrap()
            .expect("seeded user");
        let token = state.session_manager.create_session(user.id).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("X-Session-Token", HeaderValue::from_str(&token).unwrap());
        (user.id, headers)
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let state = setup_test_state();
        let (alice, headers) = login(&state, "alice");
        let result = follow_user(State(state), headers, Path(alice.to_string())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let state = setup_test_state();
        let (_alice, headers) = login(&state, "alice");
        let result = follow_user(State(state), headers, Path(Uuid::new_v4().to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_follow_round_trip_and_profile_flag() {
        let state = setup_test_state();
        let (_diana, headers) = login(&state, "diana");
        let (charlie, _) = login(&state, "charlie");
        let before = UserRepository::new(state.db.pool.clone())
            .get_by_id(&charlie)
            .unwrap()
            .unwrap()
            .followers_count;

        let Json(followed) = follow_user(State(state.clone()), headers.clone(), Path(charlie.to_string()))
            .await
            .unwrap();
        assert_eq!(followed.outcome, ToggleOutcome::Applied);
        let Json(again) = follow_user(State(state.clone()), headers.clone(), Path(charlie.to_string()))
            .await
            .unwrap();
        assert_eq!(again.outcome, ToggleOutcome::Unchanged);

        let Json(profile) = get_profile(State(state.clone()), headers.clone(), Path("charlie".to_string()))
            .await
            .unwrap();
        assert!(profile.is_following);
        assert_eq!(profile.user.followers_count, before + 1);
        assert!(profile.posts.iter().all(|p| !p.is_draft));

        let follows = NotificationRepository::new(state.db.pool.clone())
            .list_for_user(&charlie)
            .unwrap()
            .into_iter()
            .filter(|n| n.kind == NotificationType::Follow)
            .count();
        assert_eq!(follows, 1);

        unfollow_user(State(state.clone()), headers, Path(charlie.to_string()))
            .await
            .unwrap();
        let charlie_after = UserRepository::new(state.db.pool.clone())
            .get_by_id(&charlie)
            .unwrap()
            .unwrap();
        assert_eq!(charlie_after.followers_count, before);
    }

    #[tokio::test]
    async fn test_profile_hides_drafts_for_anonymous_viewer() {
        let state = setup_test_state();
        let Json(profile) = get_profile(State(state), HeaderMap::new(), Path("alice".to_string()))
            .await
            .unwrap();
        assert!(!profile.is_following);
        assert_eq!(profile.posts.len(), 1);
    }
}
