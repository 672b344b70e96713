use thiserror::Error;

use ozar_gateway::GatewayError;

use crate::forms::FieldErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Please confirm your email address before logging in.")]
    EmailNotConfirmed,

    #[error("You need to sign in first")]
    NotSignedIn,

    #[error("Unsupported file type: {0}. Allowed types are PDF, images, documents, spreadsheets, and zip files.")]
    UnsupportedFileType(String),

    #[error("{0} is not available right now")]
    Unavailable(String),

    #[error("Cancelled")]
    Cancelled,
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}
