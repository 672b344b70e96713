use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use ozar_app::AppError;
use ozar_gateway::GatewayError;
use ozar_types::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{0}")]
    BadRequest(String),
}

fn gateway_status(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GatewayError::InvalidCredentials | GatewayError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        GatewayError::EmailNotConfirmed | GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::AlreadyRegistered | GatewayError::Duplicate => StatusCode::CONFLICT,
        GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        GatewayError::Storage(_) | GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(e) => gateway_status(e),
            ApiError::App(e) => match e {
                AppError::Validation(_) => StatusCode::BAD_REQUEST,
                AppError::Gateway(e) => gateway_status(e),
                AppError::EmailNotConfirmed => StatusCode::FORBIDDEN,
                AppError::NotSignedIn => StatusCode::UNAUTHORIZED,
                AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                AppError::Unavailable(_) => StatusCode::CONFLICT,
                AppError::Cancelled => StatusCode::PRECONDITION_REQUIRED,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let fields = match &self {
            ApiError::App(AppError::Validation(errors)) => errors.clone().into_vec(),
            _ => Vec::new(),
        };
        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: Some(self.to_string()),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
