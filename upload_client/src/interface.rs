use bytes::Bytes;

use crate::error::Result;

/// Identifier the backend assigns to a registered file.
pub type FileId = u64;

/// Outcome of registering a file ahead of chunk transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRegistration {
    /// Newly registered; chunks should be transferred against this id.
    New(FileId),

    /// The backend already holds a file at this path; nothing to transfer.
    Existing,
}

/// A client to the document storage backend. The backend provides for
/// 1. registering a file ahead of transfer
/// 2. transferring one chunk of a registered file
#[async_trait::async_trait]
pub trait Client: Send + Sync {
    /// Registers a file for upload. Must complete successfully before any
    /// chunk for this file is transferred.
    async fn register_file(&self, name: &str, n_bytes: u64) -> Result<FileRegistration>;

    /// Transfers one chunk of a registered file. Chunks of a file arrive in
    /// ascending index order.
    async fn upload_chunk(&self, file_id: FileId, chunk_index: u32, data: Bytes) -> Result<()>;
}
