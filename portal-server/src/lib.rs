// Library exports for portal-server
// The binary and the integration tests both build the router from here

pub mod api;
pub mod config;
pub mod db;
pub mod feed;
pub mod inbox;
pub mod session;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the HTTP router with all routes and middleware
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static("x-next-cursor")]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication routes
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/logout", post(api::auth::logout))
        // Post routes
        .route("/api/posts", get(api::posts::get_feed).post(api::posts::create_post))
        .route(
            "/api/posts/:id",
            get(api::posts::get_post).delete(api::posts::delete_post),
        )
        .route(
            "/api/posts/:id/like",
            post(api::posts::like_post).delete(api::posts::unlike_post),
        )
        .route(
            "/api/posts/:id/save",
            post(api::posts::save_post).delete(api::posts::unsave_post),
        )
        .route("/api/posts/:id/comment", post(api::posts::create_comment))
        .route("/api/posts/:id/comments", get(api::posts::get_comments))
        // User routes
        // `:user` is a username for profiles and a user ID for follows
        .route("/api/users/:user", get(api::users::get_profile))
        .route(
            "/api/users/:user/follow",
            post(api::users::follow_user).delete(api::users::unfollow_user),
        )
        // Job routes
        .route("/api/jobs", get(api::jobs::list_jobs).post(api::jobs::create_job))
        .route("/api/jobs/:id", get(api::jobs::get_job))
        .route("/api/jobs/:id/save", post(api::jobs::save_job))
        // Inbox routes
        .route("/api/inbox/notifications", get(api::inbox::get_notifications))
        .route(
            "/api/inbox/notifications/mark-read",
            post(api::inbox::mark_notifications_read),
        )
        .route(
            "/api/inbox/threads",
            get(api::inbox::list_threads).post(api::inbox::create_thread),
        )
        .route(
            "/api/inbox/threads/:id/messages",
            get(api::inbox::get_messages).post(api::inbox::send_message),
        )
        .route("/api/inbox/unread", get(api::inbox::get_unread_counts))
        .route(
            "/api/inbox/welcome/read",
            post(api::inbox::mark_welcome_read).delete(api::inbox::mark_welcome_unread),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
