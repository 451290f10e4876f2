use std::sync::Arc;

use more_asserts::debug_assert_le;
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::{BatchProgressSnapshot, ItemProgressUpdate, ProgressUpdate, TrackingProgressUpdater};

/// A dense file id handed back on registration; the index into the tracker's
/// file table. Reporting is done by name, but this keeps the bookkeeping
/// correct across duplicate names and speeds up the updates.
pub type BatchFileId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileState {
    /// Registered; chunks may still be in transfer.
    InFlight,
    /// All chunks transferred.
    Uploaded,
    /// The backend already held this file; nothing was transferred.
    AlreadyExisted,
    /// Retries exhausted or registration rejected.
    Failed,
}

/// Bookkeeping for one file in the batch.
struct FileEntry {
    /// A unique id for when the name is not enough to identify a single file.
    tracking_id: Ulid,

    /// Human-readable name of the file.
    name: Arc<str>,

    /// Total size of this file in bytes.
    total_bytes: u64,

    /// Bytes confirmed transferred so far. Only ever increases.
    completed_bytes: u64,

    state: FileState,
}

/// Tracks all files of one upload batch: per-file byte completion plus the
/// uploaded / failed / already-existed tallies the UI reports.
#[derive(Default)]
struct BatchCompletionTrackerImpl {
    /// List of all files being tracked.
    files: Vec<FileEntry>,

    total_bytes: u64,
    total_bytes_completed: u64,

    n_uploaded: usize,
    n_already_existed: usize,
    failed_files: Vec<Arc<str>>,
}

/// The single-writer aggregate upload state of a batch.
///
/// The orchestrator is the only mutator; observers either subscribe through
/// the [`TrackingProgressUpdater`] handed in at construction or poll
/// [`snapshot`](BatchCompletionTracker::snapshot). All mutation goes through
/// one mutex, so the monotonicity of the byte counters holds under a
/// multi-threaded runtime.
pub struct BatchCompletionTracker {
    inner: Mutex<BatchCompletionTrackerImpl>,
    progress_reporter: Arc<dyn TrackingProgressUpdater>,
}

impl BatchCompletionTrackerImpl {
    /// Registers a new file for tracking and returns an id (its index in
    /// `files`) along with the update raising the batch byte total.
    fn register_new_file(&mut self, name: Arc<str>, n_bytes: u64) -> (ProgressUpdate, BatchFileId) {
        let file_id = self.files.len() as BatchFileId;

        self.files.push(FileEntry {
            tracking_id: Ulid::new(),
            name,
            total_bytes: n_bytes,
            completed_bytes: 0,
            state: FileState::InFlight,
        });

        self.total_bytes += n_bytes;

        (
            ProgressUpdate {
                item_updates: vec![],
                total_bytes: self.total_bytes,
                total_bytes_increment: n_bytes,
                total_bytes_completed: self.total_bytes_completed,
                total_bytes_completion_increment: 0,
            },
            file_id,
        )
    }

    /// Credits `n_bytes` of confirmed transfer to a file. Additive only;
    /// progress never moves backwards.
    fn register_chunk_completion(&mut self, file_id: BatchFileId, n_bytes: u64) -> ProgressUpdate {
        let file_entry = &mut self.files[file_id as usize];

        debug_assert_eq!(file_entry.state, FileState::InFlight);

        file_entry.completed_bytes += n_bytes;
        debug_assert_le!(file_entry.completed_bytes, file_entry.total_bytes);

        self.total_bytes_completed += n_bytes;
        debug_assert_le!(self.total_bytes_completed, self.total_bytes);

        let item_update = ItemProgressUpdate {
            tracking_id: file_entry.tracking_id,
            item_name: file_entry.name.clone(),
            total_bytes: file_entry.total_bytes,
            bytes_completed: file_entry.completed_bytes,
            bytes_completion_increment: n_bytes,
        };

        ProgressUpdate {
            item_updates: vec![item_update],
            total_bytes: self.total_bytes,
            total_bytes_increment: 0,
            total_bytes_completed: self.total_bytes_completed,
            total_bytes_completion_increment: n_bytes,
        }
    }

    /// Marks a file as fully uploaded. All of its bytes must have been
    /// credited through `register_chunk_completion` already.
    fn register_file_completion(&mut self, file_id: BatchFileId) -> ProgressUpdate {
        let file_entry = &mut self.files[file_id as usize];

        debug_assert_eq!(file_entry.state, FileState::InFlight);
        debug_assert_eq!(file_entry.completed_bytes, file_entry.total_bytes);

        file_entry.state = FileState::Uploaded;
        self.n_uploaded += 1;

        ProgressUpdate::default()
    }

    /// Marks a file as failed. Bytes already credited stay credited so the
    /// aggregate fraction never decreases; the file lands in the failed list
    /// exactly once.
    fn register_file_failure(&mut self, file_id: BatchFileId) -> ProgressUpdate {
        let file_entry = &mut self.files[file_id as usize];

        debug_assert_eq!(file_entry.state, FileState::InFlight);

        file_entry.state = FileState::Failed;
        self.failed_files.push(file_entry.name.clone());

        ProgressUpdate::default()
    }

    /// Marks a file the backend already held. Its bytes are credited as
    /// complete since there is nothing left to transfer.
    fn register_existing_file(&mut self, file_id: BatchFileId) -> ProgressUpdate {
        let file_entry = &mut self.files[file_id as usize];

        debug_assert_eq!(file_entry.state, FileState::InFlight);

        let completion_increment = file_entry.total_bytes - file_entry.completed_bytes;

        file_entry.completed_bytes = file_entry.total_bytes;
        file_entry.state = FileState::AlreadyExisted;
        self.n_already_existed += 1;

        self.total_bytes_completed += completion_increment;
        debug_assert_le!(self.total_bytes_completed, self.total_bytes);

        let item_update = ItemProgressUpdate {
            tracking_id: file_entry.tracking_id,
            item_name: file_entry.name.clone(),
            total_bytes: file_entry.total_bytes,
            bytes_completed: file_entry.completed_bytes,
            bytes_completion_increment: completion_increment,
        };

        ProgressUpdate {
            item_updates: vec![item_update],
            total_bytes: self.total_bytes,
            total_bytes_increment: 0,
            total_bytes_completed: self.total_bytes_completed,
            total_bytes_completion_increment: completion_increment,
        }
    }

    fn snapshot(&self) -> BatchProgressSnapshot {
        BatchProgressSnapshot {
            total_files: self.files.len(),
            total_bytes: self.total_bytes,
            completed_bytes: self.total_bytes_completed,
            uploaded_files: self.n_uploaded,
            already_existed_files: self.n_already_existed,
            failed_files: self.failed_files.clone(),
        }
    }

    fn status(&self) -> (u64, u64) {
        (self.total_bytes_completed, self.total_bytes)
    }

    fn is_complete(&self) -> bool {
        self.files.iter().all(|f| f.state != FileState::InFlight)
    }

    /// Checks that every file reached a terminal state and that successful
    /// files have all their bytes credited. Panics on inconsistency.
    fn assert_complete(&self) {
        for (idx, file) in self.files.iter().enumerate() {
            assert_ne!(file.state, FileState::InFlight, "File #{idx} ({}) still in flight", file.name);

            if file.state != FileState::Failed {
                assert_eq!(
                    file.completed_bytes, file.total_bytes,
                    "File #{idx} ({}) terminal but incomplete: {}/{} bytes",
                    file.name, file.completed_bytes, file.total_bytes
                );
            }
        }
    }
}

/// A wrapper around the above class to work with the locking and the reporting.
impl BatchCompletionTracker {
    pub fn new(progress_reporter: Arc<dyn TrackingProgressUpdater>) -> Self {
        BatchCompletionTracker {
            inner: Mutex::new(BatchCompletionTrackerImpl::default()),
            progress_reporter,
        }
    }

    pub async fn register_new_file(&self, name: impl Into<Arc<str>>, n_bytes: u64) -> BatchFileId {
        let mut update_lock = self.inner.lock().await;

        let (update, file_id) = update_lock.register_new_file(name.into(), n_bytes);

        if !update.is_empty() {
            self.progress_reporter.register_updates(update).await;
        }

        file_id
    }

    pub async fn register_chunk_completion(&self, file_id: BatchFileId, n_bytes: u64) {
        let mut update_lock = self.inner.lock().await;

        let update = update_lock.register_chunk_completion(file_id, n_bytes);

        if !update.is_empty() {
            self.progress_reporter.register_updates(update).await;
        }
    }

    pub async fn register_file_completion(&self, file_id: BatchFileId) {
        let mut update_lock = self.inner.lock().await;

        let update = update_lock.register_file_completion(file_id);

        if !update.is_empty() {
            self.progress_reporter.register_updates(update).await;
        }
    }

    pub async fn register_file_failure(&self, file_id: BatchFileId) {
        let mut update_lock = self.inner.lock().await;

        let update = update_lock.register_file_failure(file_id);

        if !update.is_empty() {
            self.progress_reporter.register_updates(update).await;
        }
    }

    pub async fn register_existing_file(&self, file_id: BatchFileId) {
        let mut update_lock = self.inner.lock().await;

        let update = update_lock.register_existing_file(file_id);

        if !update.is_empty() {
            self.progress_reporter.register_updates(update).await;
        }
    }

    /// Read-only projection for display.
    pub async fn snapshot(&self) -> BatchProgressSnapshot {
        self.inner.lock().await.snapshot()
    }

    /// (completed bytes, total bytes) of the batch.
    pub async fn status(&self) -> (u64, u64) {
        self.inner.lock().await.status()
    }

    pub async fn is_complete(&self) -> bool {
        self.inner.lock().await.is_complete()
    }

    pub async fn assert_complete(&self) {
        self.inner.lock().await.assert_complete();
    }

    /// Flush the progress reporter.
    pub async fn flush(&self) {
        self.progress_reporter.flush().await;
    }
}
