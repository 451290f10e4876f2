use anyhow::anyhow;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

use crate::interface::FileId;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UploadClientError {
    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("File not found for id: {0}")]
    FileNotFound(FileId),

    #[error("Server Error: {0}")]
    Server(String),

    #[error("Connection Error: {0}")]
    Connection(String),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Other Internal Error: {0}")]
    InternalError(#[from] anyhow::Error),
}

// Define our own result type here (this seems to be the standard).
pub type Result<T> = std::result::Result<T, UploadClientError>;

impl PartialEq for UploadClientError {
    fn eq(&self, other: &UploadClientError) -> bool {
        match (self, other) {
            (UploadClientError::FileNotFound(a), UploadClientError::FileNotFound(b)) => a == b,
            (e1, e2) => std::mem::discriminant(e1) == std::mem::discriminant(e2),
        }
    }
}

impl From<AcquireError> for UploadClientError {
    fn from(value: AcquireError) -> Self {
        UploadClientError::InternalError(anyhow!("{value:?}"))
    }
}

impl From<JoinError> for UploadClientError {
    fn from(value: JoinError) -> Self {
        UploadClientError::InternalError(anyhow!("{value:?}"))
    }
}
