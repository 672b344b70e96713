use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use ozar_types::api::ErrorBody;

use crate::state::AppState;

/// Scheduled trigger for the health-check job. The job itself never fails;
/// a 500 means the task running it died.
pub async fn daily_health_check(State(state): State<AppState>) -> Response {
    let job = state.health.clone();
    match tokio::spawn(async move { job.run().await }).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            error!("Health check critical error: {}", e);
            let body = ErrorBody {
                error: "Health check failed".into(),
                message: Some(e.to_string()),
                fields: Vec::new(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
