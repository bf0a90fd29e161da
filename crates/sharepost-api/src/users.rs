use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use sharepost_types::api::{RegisterUserRequest, RegisterUserResponse};
use sharepost_types::models::User;

use crate::platform::new_id;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let username = req.username.trim().to_string();
    if username.len() < 3 || username.len() > 64 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user = User {
        id: new_id(),
        username,
        nickname: req.nickname,
        first_name: req.first_name,
        last_name: req.last_name,
        is_bot: req.is_bot,
    };

    let user = tokio::task::spawn_blocking(move || {
        // Check if username is taken
        if state
            .db
            .get_user_by_username(&user.username)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some()
        {
            return Err(StatusCode::CONFLICT);
        }

        state.db.create_user(&user).map_err(|e| {
            error!("Failed to create user {}: {:#}", user.username, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Ok(user)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    info!("Registered {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(RegisterUserResponse { user })))
}
