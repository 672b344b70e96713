use axum::{
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ApiError;
use crate::state::AppState;

/// Public object URL. Objects in private buckets are reported missing.
pub async fn serve_object(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
    req: Request,
) -> Result<Response, ApiError> {
    let file = state.backend.public_object(&bucket, &path).await?;
    match ServeFile::new(file).oneshot(req).await {
        Ok(res) => Ok(res.into_response()),
        Err(never) => match never {},
    }
}
