use anyhow::anyhow;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BatchUploadError {
    #[error("Client Error: {0}")]
    Client(#[from] upload_client::UploadClientError),

    #[error("Archive Error: {0}")]
    Archive(#[from] archive_expand::ArchiveError),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("Upload task error: {0}")]
    UploadTaskError(String),

    #[error("Other Internal Error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BatchUploadError>;

impl From<JoinError> for BatchUploadError {
    fn from(value: JoinError) -> Self {
        BatchUploadError::UploadTaskError(value.to_string())
    }
}

impl From<AcquireError> for BatchUploadError {
    fn from(value: AcquireError) -> Self {
        BatchUploadError::InternalError(anyhow!("{value:?}"))
    }
}
