use std::sync::Arc;

use crate::{ProgressUpdate, TrackingProgressUpdater};

/// A progress updater that discards everything; used where no observer is
/// attached.
#[derive(Debug, Default)]
pub struct NoOpProgressUpdater;

impl NoOpProgressUpdater {
    pub fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait::async_trait]
impl TrackingProgressUpdater for NoOpProgressUpdater {
    async fn register_updates(&self, _update: ProgressUpdate) {}
}
