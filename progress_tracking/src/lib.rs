#![cfg_attr(feature = "strict", deny(warnings))]

pub mod batch_tracking;
mod no_op_tracker;
mod progress_info;
pub mod verification_wrapper;

pub use no_op_tracker::NoOpProgressUpdater;
pub use progress_info::{BatchProgressSnapshot, ItemProgressUpdate, ProgressUpdate};

/// The trait a progress observer implements to receive aggregate updates
/// from the batch tracker.
#[async_trait::async_trait]
pub trait TrackingProgressUpdater: std::fmt::Debug + Send + Sync {
    /// Register one aggregate update, containing per-item progress
    /// information and the new byte totals.
    async fn register_updates(&self, update: ProgressUpdate);

    /// Flush any buffered reporting.
    async fn flush(&self) {}
}
