//! Bearer-token gate for the `/v2` surface, active only when
//! `API_ACCESS_TOKEN` is configured. Shaped after
//! `server/middleware/clerk_auth.rs`'s "extract header, compare, reject"
//! pattern, simplified to a single static credential rather than a JWT.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use super::state::AppState;

pub async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.config.api_access_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let supplied = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    if supplied == Some(expected) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
