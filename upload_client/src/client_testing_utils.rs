//! Failure-injection wrapper used to exercise the retry and
//! failure-isolation paths without a misbehaving backend.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::error::{Result, UploadClientError};
use crate::interface::{Client, FileId, FileRegistration};

/// The kinds of failure the wrapper can inject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Transient backend failure; the retry path should recover from it.
    Server,

    /// Fatal rejection; the retry path should give up immediately.
    Validation,
}

impl InjectedFailure {
    fn to_error(self) -> UploadClientError {
        match self {
            InjectedFailure::Server => UploadClientError::Server("injected server failure".to_owned()),
            InjectedFailure::Validation => UploadClientError::Validation("injected validation failure".to_owned()),
        }
    }
}

#[derive(Debug, Default)]
struct InjectionState {
    /// (file name, chunk index) -> (remaining failures to inject, kind).
    chunk_failures: HashMap<(String, u32), (usize, InjectedFailure)>,

    /// file name -> failure kind returned on registration.
    registration_failures: HashMap<String, InjectedFailure>,

    /// file id -> name, recorded on successful registration.
    names_by_id: HashMap<FileId, String>,

    /// (file name, chunk index) -> number of transfer attempts observed.
    chunk_attempts: HashMap<(String, u32), usize>,
}

/// Wraps a client and fails chosen calls a configured number of times before
/// delegating to the wrapped client. Also counts the transfer attempts per
/// chunk so tests can assert on retry behavior.
pub struct FailureInjectionClient {
    inner: Arc<dyn Client>,
    state: Mutex<InjectionState>,
}

impl FailureInjectionClient {
    pub fn new(inner: Arc<dyn Client>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            state: Mutex::new(InjectionState::default()),
        })
    }

    /// Fails the next `n_failures` transfers of the given chunk.
    pub async fn fail_chunk(&self, name: &str, chunk_index: u32, n_failures: usize, kind: InjectedFailure) {
        self.state
            .lock()
            .await
            .chunk_failures
            .insert((name.to_owned(), chunk_index), (n_failures, kind));
    }

    /// Fails every registration of the given file name.
    pub async fn fail_registration(&self, name: &str, kind: InjectedFailure) {
        self.state.lock().await.registration_failures.insert(name.to_owned(), kind);
    }

    /// Number of transfer attempts observed for the given chunk, injected
    /// failures included.
    pub async fn n_chunk_attempts(&self, name: &str, chunk_index: u32) -> usize {
        self.state
            .lock()
            .await
            .chunk_attempts
            .get(&(name.to_owned(), chunk_index))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Client for FailureInjectionClient {
    async fn register_file(&self, name: &str, n_bytes: u64) -> Result<FileRegistration> {
        {
            let state = self.state.lock().await;
            if let Some(kind) = state.registration_failures.get(name) {
                return Err(kind.to_error());
            }
        }

        let registration = self.inner.register_file(name, n_bytes).await?;

        if let FileRegistration::New(file_id) = registration {
            self.state.lock().await.names_by_id.insert(file_id, name.to_owned());
        }

        Ok(registration)
    }

    async fn upload_chunk(&self, file_id: FileId, chunk_index: u32, data: Bytes) -> Result<()> {
        {
            let mut state = self.state.lock().await;

            let name = state.names_by_id.get(&file_id).cloned().unwrap_or_default();
            let key = (name, chunk_index);

            *state.chunk_attempts.entry(key.clone()).or_default() += 1;

            if let Some((remaining, kind)) = state.chunk_failures.get_mut(&key) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(kind.to_error());
                }
            }
        }

        self.inner.upload_chunk(file_id, chunk_index, data).await
    }
}
