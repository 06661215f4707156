use serde::Serialize;
use thiserror::Error;

use crate::storage::{DatabaseError, StoreError};

/// Every failure a core operation can report.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Identity '{0}' is already registered")]
    AlreadyRegistered(String),
    #[error("File of {size} bytes exceeds the upload limit of {limit} bytes")]
    QuotaExceeded { size: u64, limit: u64 },
    #[error("Uploads are currently disabled")]
    UploadsDisabled,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("Invalid identity or password")]
    InvalidCredentials,
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable, serializable classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Conflict,
    AlreadyRegistered,
    QuotaExceeded,
    UploadsDisabled,
    InvalidInput,
    InvariantViolation,
    InvalidCredentials,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Unauthorized(_) => ErrorKind::Unauthorized,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            CoreError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            CoreError::UploadsDisabled => ErrorKind::UploadsDisabled,
            CoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            CoreError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            CoreError::InvalidCredentials => ErrorKind::InvalidCredentials,
            CoreError::Storage(_) | CoreError::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => CoreError::NotFound(format!("file '{id}' not found")),
            StoreError::Conflict(id) => CoreError::Conflict(format!("file id '{id}' already exists")),
            StoreError::Database(e) => CoreError::Storage(e),
        }
    }
}
