use std::collections::HashMap;
use std::sync::Arc;

use more_asserts::{assert_ge, assert_le};
use tokio::sync::Mutex;
use ulid::Ulid;

use crate::{ProgressUpdate, TrackingProgressUpdater};

#[derive(Default, Debug)]
struct VerificationState {
    total_bytes: u64,
    total_bytes_completed: u64,

    /// tracking_id -> (bytes completed, file total) as last reported.
    items: HashMap<Ulid, (u64, u64)>,
}

/// Wraps another updater and asserts that every update passing through is
/// internally consistent: totals never decrease, increments add up to the
/// reported totals, and per-item completion never exceeds the item total.
/// Test instrumentation only.
#[derive(Debug)]
pub struct ProgressVerificationWrapper {
    inner: Arc<dyn TrackingProgressUpdater>,
    state: Mutex<VerificationState>,
}

impl ProgressVerificationWrapper {
    pub fn new(inner: Arc<dyn TrackingProgressUpdater>) -> Arc<Self> {
        Arc::new(Self {
            inner,
            state: Mutex::new(VerificationState::default()),
        })
    }

    /// Asserts the invariants that must hold after the final update: totals
    /// consistent and no item reported beyond its size.
    pub async fn assert_monotonic_totals(&self) {
        let state = self.state.lock().await;

        assert_le!(state.total_bytes_completed, state.total_bytes);

        for (tracking_id, (completed, total)) in state.items.iter() {
            assert_le!(completed, total, "item {tracking_id} over-reported");
        }
    }
}

#[async_trait::async_trait]
impl TrackingProgressUpdater for ProgressVerificationWrapper {
    async fn register_updates(&self, update: ProgressUpdate) {
        {
            let mut state = self.state.lock().await;

            // Aggregate totals must move by exactly the stated increments,
            // and only forward.
            assert_eq!(update.total_bytes, state.total_bytes + update.total_bytes_increment);
            assert_eq!(
                update.total_bytes_completed,
                state.total_bytes_completed + update.total_bytes_completion_increment
            );
            assert_le!(update.total_bytes_completed, update.total_bytes);

            state.total_bytes = update.total_bytes;
            state.total_bytes_completed = update.total_bytes_completed;

            for item in &update.item_updates {
                let (completed, total) =
                    state.items.entry(item.tracking_id).or_insert((0, item.total_bytes));

                assert_eq!(*total, item.total_bytes, "item size changed mid-batch");
                assert_eq!(item.bytes_completed, *completed + item.bytes_completion_increment);
                assert_ge!(item.bytes_completed, *completed);
                assert_le!(item.bytes_completed, item.total_bytes);

                *completed = item.bytes_completed;
            }
        }

        self.inner.register_updates(update).await;
    }

    async fn flush(&self) {
        self.inner.flush().await;
    }
}
