use thiserror::Error;
use tokio::io;

use crate::storage::StorageError;

pub type ServiceResult<T> = core::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No response reached the client.
    #[error("network error: {0}")]
    NetworkError(String),
    /// A response arrived but its body could not be parsed.
    #[error("malformed response from server (HTTP {status})")]
    MalformedResponse { status: u16 },
    /// Well-formed error response from the service.
    #[error("{message}")]
    ApiError { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("not logged in")]
    NotAuthenticated,
    #[error("{0}")]
    Storage(#[from] StorageError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("{0}")]
    IoError(#[from] io::Error),
    #[error("{0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::MalformedResponse { status } | ServiceError::ApiError { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::ApiError { status: 401, .. })
    }
}
