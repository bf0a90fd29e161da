//! HTTP surface of the SharePost server: dialog submission, post creation
//! through the permalink expander, and read endpoints for posts and threads.

pub mod dialog;
pub mod info;
pub mod middleware;
pub mod platform;
pub mod posts;
pub mod state;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub use platform::LocalPlatform;
pub use state::{AppState, AppStateInner};

/// Every route except the WebSocket gateway, which the server mounts itself.
pub fn routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(info::handle_info))
        .route("/api/v1/users", post(users::register))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/api/v1/share", post(dialog::submit_share))
        .route("/api/v1/posts", post(posts::create_post))
        .route("/api/v1/posts/{post_id}", get(posts::get_post))
        .route("/api/v1/posts/{post_id}/thread", get(posts::get_thread))
        .route("/api/v1/channels/{channel_id}/posts", get(posts::get_channel_posts))
        .layer(axum_middleware::from_fn(middleware::require_user))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}
