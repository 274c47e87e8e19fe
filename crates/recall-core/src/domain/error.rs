//! Domain-level error taxonomy for Recall.

use recall_state::StorageError;

/// Coarse error classes surfaced to callers of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    InvalidInput,
    Internal,
}

/// Recall domain errors.
#[derive(Debug, thiserror::Error)]
pub enum RecallError {
    #[error("user must be logged in")]
    Unauthenticated,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecallError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RecallError::InvalidInput(msg.into())
    }

    /// Storage and serialization failures both classify as `Internal`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecallError::Unauthenticated => ErrorKind::Unauthenticated,
            RecallError::InvalidInput(_) => ErrorKind::InvalidInput,
            RecallError::Internal(_) | RecallError::Storage(_) | RecallError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type for Recall domain operations.
pub type Result<T> = std::result::Result<T, RecallError>;
