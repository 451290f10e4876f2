use std::sync::Arc;

use ulid::Ulid;

/// Progress on a single file within a batch.
#[derive(Clone, Debug)]
pub struct ItemProgressUpdate {
    pub tracking_id: Ulid,

    /// Human-readable name of the file.
    pub item_name: Arc<str>,

    /// Total size of this file in bytes.
    pub total_bytes: u64,

    /// Bytes completed for this file so far, after applying this update.
    pub bytes_completed: u64,

    /// The additive delta this update carries for the file.
    pub bytes_completion_increment: u64,
}

/// One aggregate update emitted by the batch tracker.
///
/// All `*_increment` values are additive deltas; the totals are the values
/// after the update is applied. Increments are never negative, so observers
/// see monotonically non-decreasing progress.
#[derive(Clone, Debug, Default)]
pub struct ProgressUpdate {
    pub item_updates: Vec<ItemProgressUpdate>,

    pub total_bytes: u64,
    pub total_bytes_increment: u64,

    pub total_bytes_completed: u64,
    pub total_bytes_completion_increment: u64,
}

impl ProgressUpdate {
    pub fn is_empty(&self) -> bool {
        self.item_updates.is_empty() && self.total_bytes_increment == 0 && self.total_bytes_completion_increment == 0
    }
}

/// Read-only projection of the aggregate upload state, computed on demand
/// for display. Eventually consistent with the tracker's last write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchProgressSnapshot {
    pub total_files: usize,
    pub total_bytes: u64,
    pub completed_bytes: u64,

    pub uploaded_files: usize,
    pub already_existed_files: usize,
    pub failed_files: Vec<Arc<str>>,
}

impl BatchProgressSnapshot {
    /// Fraction complete in [0, 1], by bytes. Batches whose files are all
    /// empty are measured by file count instead, so an all-empty batch still
    /// converges to 1.
    pub fn fraction_complete(&self) -> f64 {
        if self.total_bytes == 0 {
            if self.total_files == 0 {
                return 1.;
            }
            let files_done = self.uploaded_files + self.already_existed_files + self.failed_files.len();
            return (files_done as f64) / (self.total_files as f64);
        }

        (self.completed_bytes as f64) / (self.total_bytes as f64)
    }

    /// Percent complete in [0, 100].
    pub fn percent_complete(&self) -> f64 {
        100. * self.fraction_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_complete() {
        let snapshot = BatchProgressSnapshot::default();
        assert_eq!(snapshot.percent_complete(), 100.);
    }

    #[test]
    fn test_percent_by_bytes() {
        let snapshot = BatchProgressSnapshot {
            total_files: 2,
            total_bytes: 200,
            completed_bytes: 50,
            ..Default::default()
        };
        assert_eq!(snapshot.percent_complete(), 25.);
    }

    #[test]
    fn test_all_empty_files_measured_by_count() {
        let snapshot = BatchProgressSnapshot {
            total_files: 4,
            uploaded_files: 3,
            ..Default::default()
        };
        assert_eq!(snapshot.percent_complete(), 75.);
    }
}
