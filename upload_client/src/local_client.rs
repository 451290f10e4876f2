use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Result, UploadClientError};
use crate::interface::{Client, FileId, FileRegistration};

/// Bookkeeping for one registered file.
#[derive(Debug)]
struct StoredFile {
    name: Arc<str>,
    n_bytes: u64,
    chunks: Vec<Bytes>,
    bytes_received: u64,
    complete: bool,
}

#[derive(Debug, Default)]
struct LocalClientState {
    files: Vec<StoredFile>,
    ids_by_name: HashMap<String, FileId>,
}

/// In-memory reference backend. Holds registered files and their chunk data,
/// enforcing the contract the real service enforces: registration before
/// transfer, chunks strictly in ascending index order, received bytes adding
/// up to the registered size.
#[derive(Debug, Default)]
pub struct LocalClient {
    state: Mutex<LocalClientState>,
}

impl LocalClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inserts a file as already present, as if uploaded by an earlier batch.
    pub async fn preload_file(&self, name: &str, data: &[u8]) {
        let mut state = self.state.lock().await;

        let file_id = state.files.len() as FileId;
        state.files.push(StoredFile {
            name: name.into(),
            n_bytes: data.len() as u64,
            chunks: vec![Bytes::copy_from_slice(data)],
            bytes_received: data.len() as u64,
            complete: true,
        });
        state.ids_by_name.insert(name.to_owned(), file_id);
    }

    /// Reassembled contents of a fully received file, if present.
    pub async fn file_data(&self, name: &str) -> Option<Vec<u8>> {
        let state = self.state.lock().await;

        let file = &state.files[*state.ids_by_name.get(name)? as usize];
        if !file.complete {
            return None;
        }

        let mut data = Vec::with_capacity(file.n_bytes as usize);
        for chunk in &file.chunks {
            data.extend_from_slice(chunk);
        }
        Some(data)
    }

    /// Number of chunks received for a file.
    pub async fn chunk_count(&self, name: &str) -> Option<usize> {
        let state = self.state.lock().await;
        let file = &state.files[*state.ids_by_name.get(name)? as usize];
        Some(file.chunks.len())
    }

    pub async fn n_files(&self) -> usize {
        self.state.lock().await.files.len()
    }

    pub async fn n_complete_files(&self) -> usize {
        self.state.lock().await.files.iter().filter(|f| f.complete).count()
    }
}

#[async_trait::async_trait]
impl Client for LocalClient {
    async fn register_file(&self, name: &str, n_bytes: u64) -> Result<FileRegistration> {
        let mut state = self.state.lock().await;

        if state.ids_by_name.contains_key(name) {
            debug!("register_file: {name} already present");
            return Ok(FileRegistration::Existing);
        }

        let file_id = state.files.len() as FileId;
        state.files.push(StoredFile {
            name: name.into(),
            n_bytes,
            chunks: vec![],
            bytes_received: 0,
            complete: false,
        });
        state.ids_by_name.insert(name.to_owned(), file_id);

        debug!("register_file: {name} registered as {file_id} ({n_bytes} bytes)");
        Ok(FileRegistration::New(file_id))
    }

    async fn upload_chunk(&self, file_id: FileId, chunk_index: u32, data: Bytes) -> Result<()> {
        let mut state = self.state.lock().await;

        let file = state
            .files
            .get_mut(file_id as usize)
            .ok_or(UploadClientError::FileNotFound(file_id))?;

        if file.complete {
            return Err(UploadClientError::Validation(format!(
                "chunk {chunk_index} received for fully uploaded file {}",
                file.name
            )));
        }

        if chunk_index as usize != file.chunks.len() {
            return Err(UploadClientError::Validation(format!(
                "chunk {chunk_index} for file {} out of order; expected {}",
                file.name,
                file.chunks.len()
            )));
        }

        file.bytes_received += data.len() as u64;
        if file.bytes_received > file.n_bytes {
            return Err(UploadClientError::Validation(format!(
                "file {} overran its registered size: {} > {}",
                file.name, file.bytes_received, file.n_bytes
            )));
        }

        file.chunks.push(data);

        if file.bytes_received == file.n_bytes {
            file.complete = true;
            debug!("file {} fully received in {} chunks", file.name, file.chunks.len());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_register_and_upload() {
        let client = LocalClient::new();

        let FileRegistration::New(id) = client.register_file("report.pdf", 10).await.unwrap() else {
            panic!("expected new registration");
        };

        client.upload_chunk(id, 0, Bytes::from_static(b"01234")).await.unwrap();
        client.upload_chunk(id, 1, Bytes::from_static(b"56789")).await.unwrap();

        assert_eq!(client.file_data("report.pdf").await.unwrap(), b"0123456789");
        assert_eq!(client.chunk_count("report.pdf").await, Some(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_existing_file_detected() {
        let client = LocalClient::new();
        client.preload_file("notes.md", b"hello").await;

        assert_eq!(client.register_file("notes.md", 5).await.unwrap(), FileRegistration::Existing);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_out_of_order_chunk_rejected() {
        let client = LocalClient::new();

        let FileRegistration::New(id) = client.register_file("a.txt", 10).await.unwrap() else {
            panic!("expected new registration");
        };

        let err = client.upload_chunk(id, 1, Bytes::from_static(b"56789")).await.unwrap_err();
        assert_eq!(err, UploadClientError::Validation(String::new()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unknown_file_rejected() {
        let client = LocalClient::new();

        let err = client.upload_chunk(99, 0, Bytes::new()).await.unwrap_err();
        assert_eq!(err, UploadClientError::FileNotFound(99));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_empty_file_completes_on_sentinel_chunk() {
        let client = LocalClient::new();

        let FileRegistration::New(id) = client.register_file("empty.txt", 0).await.unwrap() else {
            panic!("expected new registration");
        };

        client.upload_chunk(id, 0, Bytes::new()).await.unwrap();

        assert_eq!(client.file_data("empty.txt").await.unwrap(), Vec::<u8>::new());
        assert_eq!(client.n_complete_files().await, 1);
    }
}
