use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use tracing::debug;

use crate::state::AppState;

/// Resolve the bearer token into a [`Session`](ozar_types::models::Session)
/// request extension.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(StatusCode::UNAUTHORIZED)?;

    let session = state
        .backend
        .session_from_token(bearer.token())
        .await
        .map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}
