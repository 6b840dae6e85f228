use http::StatusCode;
use thiserror::Error;

use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum WaitlistError {
    /// A required field is missing or a value is out of range.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate entry identity, or version-conflict retries were exhausted.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An entry that was just written cannot be located in the reconciled list.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WaitlistError>;

impl WaitlistError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn inconsistency(message: impl Into<String>) -> Self {
        Self::InternalInconsistency(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InternalInconsistency(_) | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Short client-facing message. Detail, when there is any, goes to [`Self::detail`].
    pub fn message(&self) -> String {
        match self {
            Self::Validation(message) | Self::NotFound(message) | Self::Conflict(message) => {
                message.clone()
            }
            Self::InvalidBody(_) => "Invalid request body".to_string(),
            Self::InternalInconsistency(_) => "Failed to save entry".to_string(),
            Self::Store(_) => "Failed to access ambulance store".to_string(),
            Self::Cancelled => "Request cancelled".to_string(),
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InvalidBody(detail) | Self::InternalInconsistency(detail) => {
                Some(detail.clone())
            }
            Self::Store(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
