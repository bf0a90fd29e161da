use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info};

use sharepost_core::{ChatPlatform, HookedPlatform, PlatformError};
use sharepost_types::api::{ChannelPostsResponse, CreatePostRequest, PostRejectedResponse};
use sharepost_types::models::Post;

use crate::middleware::UserId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChannelPostsQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    60
}

fn status_for(e: &PlatformError) -> StatusCode {
    match e {
        PlatformError::NotFound { .. } => StatusCode::NOT_FOUND,
        PlatformError::Invalid { .. } | PlatformError::Rejected(_) => StatusCode::BAD_REQUEST,
        PlatformError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn join_error(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Create a post as the calling user. Pasted permalinks are expanded into a
/// quote first; a link that cannot be expanded refuses the post.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(req): Json<CreatePostRequest>,
) -> Result<Response, StatusCode> {
    let mut post = Post::new(req.channel_id, user_id, req.message);
    post.parent_id = req.root_id.clone();
    post.root_id = req.root_id;
    post.file_ids = req.file_ids;

    let result = tokio::task::spawn_blocking(move || {
        let platform = state.platform();
        HookedPlatform::new(&platform, &state.config).create_post(post)
    })
    .await
    .map_err(join_error)?;

    match result {
        Ok(post) => Ok((StatusCode::CREATED, Json(post)).into_response()),
        Err(PlatformError::Rejected(reason)) => {
            info!("Post refused: {}", reason);
            Ok((StatusCode::BAD_REQUEST, Json(PostRejectedResponse { error: reason })).into_response())
        }
        Err(e @ PlatformError::Invalid { .. }) => {
            Ok((StatusCode::BAD_REQUEST, Json(PostRejectedResponse { error: e.to_string() })).into_response())
        }
        Err(e) => Err(status_for(&e)),
    }
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(_user): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let post = tokio::task::spawn_blocking(move || state.platform().get_post(&post_id))
        .await
        .map_err(join_error)?
        .map_err(|e| status_for(&e))?;

    Ok(Json(post))
}

/// The whole thread containing the post, newest first.
pub async fn get_thread(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Extension(_user): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let thread = tokio::task::spawn_blocking(move || state.platform().get_post_thread(&post_id))
        .await
        .map_err(join_error)?
        .map_err(|e| status_for(&e))?;

    Ok(Json(thread))
}

pub async fn get_channel_posts(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ChannelPostsQuery>,
    Extension(_user): Extension<UserId>,
) -> Result<impl IntoResponse, StatusCode> {
    let limit = query.limit.min(200);

    let response = tokio::task::spawn_blocking(move || {
        let channel = state.platform().get_channel(&channel_id).map_err(|e| status_for(&e))?;
        let posts = state.db.get_channel_posts(&channel_id, limit).map_err(|e| {
            error!("Failed to list posts in {}: {:#}", channel_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Ok::<_, StatusCode>(ChannelPostsResponse { channel, posts })
    })
    .await
    .map_err(join_error)??;

    Ok(Json(response))
}
