use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failure reported by the gateway. Callers branch on the variant; the
/// message is what a user-facing notification shows.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Permission denied: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("The resource already exists")]
    Duplicate,

    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(anyhow::anyhow!("blocking task failed: {err}"))
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
