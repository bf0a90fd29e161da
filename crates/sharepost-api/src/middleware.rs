use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

use sharepost_types::api::USER_ID_HEADER;

/// Acting user, as vouched for by the fronting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

/// Reject requests that arrive without the user id header.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    req.extensions_mut().insert(UserId(user_id));
    Ok(next.run(req).await)
}
