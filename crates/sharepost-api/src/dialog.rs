use axum::{
    Extension,
    body::Bytes,
    extract::State,
    http::StatusCode,
};
use tracing::{error, info, warn};

use sharepost_core::redistribute::send_ephemeral_message;
use sharepost_core::{
    GENERIC_ERROR_MESSAGE, HookedPlatform, Outcome, RedistributionEngine, RedistributionRequest,
};
use sharepost_types::api::SubmitDialogRequest;

use crate::middleware::UserId;
use crate::state::AppState;

/// Share or move dialog submission. Once the caller is authenticated the
/// answer is always 200; how it went reaches the user as an ephemeral post.
pub async fn submit_share(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    body: Bytes,
) -> Result<StatusCode, StatusCode> {
    let dialog: SubmitDialogRequest = serde_json::from_slice(&body).map_err(|e| {
        warn!("Failed to decode dialog submission: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    if dialog.user_id != user_id {
        warn!("Dialog submitted for {} by {}", dialog.user_id, user_id);
        return Err(StatusCode::UNAUTHORIZED);
    }

    tokio::task::spawn_blocking(move || {
        let platform = state.platform();

        let request = match RedistributionRequest::from_dialog(&dialog) {
            Ok(request) => request,
            Err(e) => {
                warn!("Failed to handle dialog submission: {}", e);
                send_ephemeral_message(&platform, &dialog.channel_id, &dialog.user_id, GENERIC_ERROR_MESSAGE);
                return;
            }
        };

        let hooked = HookedPlatform::new(&platform, &state.config);
        let engine = RedistributionEngine::new(&hooked, &state.config);
        match engine.submit(&request) {
            Ok(Outcome::Shared(report)) => {
                info!("{} shared {} as {}", request.user_id, request.post_id, report.new_post.id)
            }
            Ok(Outcome::Moved(report)) => info!(
                "{} moved {} as {} with {} replies",
                request.user_id,
                request.post_id,
                report.new_root.id,
                report.moved_replies.len()
            ),
            Ok(Outcome::Rejected(reason)) => {
                info!(
                    "Refused to {} {} for {}: {}",
                    request.kind.as_str(),
                    request.post_id,
                    request.user_id,
                    reason
                )
            }
            // Already logged and reported to the user by the engine
            Err(_) => {}
        }
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(StatusCode::OK)
}
