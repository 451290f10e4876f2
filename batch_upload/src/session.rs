use std::sync::Arc;
use std::time::{Duration, Instant};

use chunking::chunk_ranges;
use chunking::constants::TRANSFER_CHUNK_SIZE;
use progress_tracking::batch_tracking::{BatchCompletionTracker, BatchFileId};
use progress_tracking::{BatchProgressSnapshot, NoOpProgressUpdater, TrackingProgressUpdater};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument};
use upload_client::{retry_wrapper, Client, DefaultRetryableStrategy, FileRegistration, RetryConfig};
use utils::output_bytes;

use crate::constants::{CHUNK_RETRY_BASE_DELAY_MS, MAX_CHUNK_TRANSFER_ATTEMPTS, MAX_CONCURRENT_FILE_UPLOADS};
use crate::errors::Result;
use crate::intake::expand_selection;
use crate::source::UploadSource;

/// Named policy parameters for a batch session.
#[derive(Clone, Copy, Debug)]
pub struct BatchUploadConfig {
    /// Fixed chunk size files are split into for transfer.
    pub chunk_size: usize,

    /// Maximum number of files uploading concurrently.
    pub max_concurrent_files: usize,

    /// Per-chunk bounded retry with exponential backoff.
    pub retry: RetryConfig,
}

impl Default for BatchUploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: *TRANSFER_CHUNK_SIZE,
            max_concurrent_files: *MAX_CONCURRENT_FILE_UPLOADS,
            retry: RetryConfig {
                max_attempts: *MAX_CHUNK_TRANSFER_ATTEMPTS,
                base_delay: Duration::from_millis(*CHUNK_RETRY_BASE_DELAY_MS),
            },
        }
    }
}

/// Aggregate outcome of one batch, reported once the batch has run to
/// completion across all files.
#[derive(Clone, Debug)]
pub struct BatchSummary {
    pub n_files: usize,
    pub total_bytes: u64,

    pub uploaded_files: usize,
    pub already_existed_files: usize,
    pub failed_files: Vec<Arc<str>>,

    pub elapsed: Duration,
}

/// Coordinates one batch of file uploads against the backend client.
///
/// At most `max_concurrent_files` per-file tasks run at once, admitted in
/// submission order through a fair semaphore. Within a file, chunks are
/// transferred strictly in ascending index order, each one awaited before
/// the next begins. Failures are isolated per file and folded into the
/// shared tracker; a batch always runs to completion across all files.
///
/// The session is the single writer of the tracker state. Consumers observe
/// progress through the updater handed to [`new`](BatchUploadSession::new)
/// or by polling [`progress`](BatchUploadSession::progress).
pub struct BatchUploadSession {
    client: Arc<dyn Client>,
    tracker: Arc<BatchCompletionTracker>,
    file_upload_limiter: Arc<Semaphore>,
    config: BatchUploadConfig,
}

impl BatchUploadSession {
    pub fn new(
        client: Arc<dyn Client>,
        config: BatchUploadConfig,
        progress_reporter: Option<Arc<dyn TrackingProgressUpdater>>,
    ) -> Arc<Self> {
        let reporter = progress_reporter.unwrap_or_else(|| NoOpProgressUpdater::new());

        Arc::new(Self {
            client,
            tracker: Arc::new(BatchCompletionTracker::new(reporter)),
            file_upload_limiter: Arc::new(Semaphore::new(config.max_concurrent_files)),
            config,
        })
    }

    /// Read-only projection of the aggregate upload state.
    pub async fn progress(&self) -> BatchProgressSnapshot {
        self.tracker.snapshot().await
    }

    /// Runs one batch to completion and reports the aggregate outcome.
    pub async fn upload_batch(self: &Arc<Self>, inputs: Vec<UploadSource>) -> Result<BatchSummary> {
        let start_time = Instant::now();

        let (sources, skipped_archives) = expand_selection(inputs);

        // Register everything with the tracker up front so the batch byte
        // total is stable before the first chunk moves.
        let mut upload_queue = Vec::with_capacity(sources.len());
        for source in sources {
            let file_id = self.tracker.register_new_file(source.name.clone(), source.n_bytes()).await;
            upload_queue.push((file_id, source));
        }

        // Unparseable archives surface as failed items in the summary.
        for archive in skipped_archives {
            let file_id = self.tracker.register_new_file(archive.name, 0).await;
            self.tracker.register_file_failure(file_id).await;
        }

        let mut upload_tasks: JoinSet<()> = JoinSet::new();

        for (file_id, source) in upload_queue {
            // The semaphore is fair, so files are admitted in submission
            // order and at most max_concurrent_files are in flight.
            let permit = self.file_upload_limiter.clone().acquire_owned().await?;
            let session = self.clone();

            upload_tasks.spawn(
                async move {
                    let _permit = permit;
                    session.upload_single_file(file_id, source).await;
                }
                .in_current_span(),
            );
        }

        while let Some(task_result) = upload_tasks.join_next().await {
            task_result?;
        }
        self.tracker.flush().await;

        let snapshot = self.tracker.snapshot().await;
        let summary = BatchSummary {
            n_files: snapshot.total_files,
            total_bytes: snapshot.total_bytes,
            uploaded_files: snapshot.uploaded_files,
            already_existed_files: snapshot.already_existed_files,
            failed_files: snapshot.failed_files,
            elapsed: start_time.elapsed(),
        };

        info!(
            "Batch complete: {} uploaded, {} failed, {} already present ({} in {:?}).",
            summary.uploaded_files,
            summary.failed_files.len(),
            summary.already_existed_files,
            output_bytes(summary.total_bytes),
            summary.elapsed
        );

        Ok(summary)
    }

    /// Uploads one file: registration first, then its chunks in ascending
    /// index order. All failure handling is folded into the tracker; this
    /// never aborts the batch.
    async fn upload_single_file(&self, file_id: BatchFileId, source: UploadSource) {
        let registration = match self.client.register_file(&source.name, source.n_bytes()).await {
            Ok(registration) => registration,
            Err(e) => {
                // No retry at registration; the file fails before any chunk
                // moves.
                warn!("Registration of {} failed: {e}", source.name);
                self.tracker.register_file_failure(file_id).await;
                return;
            },
        };

        let backend_id = match registration {
            FileRegistration::New(backend_id) => backend_id,
            FileRegistration::Existing => {
                debug!("{} already present; nothing to transfer.", source.name);
                self.tracker.register_existing_file(file_id).await;
                return;
            },
        };

        for range in chunk_ranges(source.n_bytes(), self.config.chunk_size) {
            let data = source.data.slice(range.start as usize..range.end as usize);

            let transfer = retry_wrapper(
                || self.client.upload_chunk(backend_id, range.index, data.clone()),
                self.config.retry,
                &DefaultRetryableStrategy,
            )
            .await;

            match transfer {
                Ok(()) => {
                    self.tracker.register_chunk_completion(file_id, range.len()).await;
                },
                Err(e) => {
                    warn!("Upload of {} failed at chunk {}: {e}", source.name, range.index);
                    self.tracker.register_file_failure(file_id).await;
                    return;
                },
            }
        }

        self.tracker.register_file_completion(file_id).await;
        debug!("{} uploaded ({}).", source.name, output_bytes(source.n_bytes()));
    }
}
