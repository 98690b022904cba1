use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hl_core::ids::RecordId;
use hl_core::overlay::PendingOverlay;
use hl_core::ports::ClockPort;
use hl_core::record::Snapshot;
use tokio::sync::watch;
use tracing::debug;

use crate::observable::Observable;

/// Records hidden pending confirmed deletion.
///
/// Every effective change bumps [`subscribe_revision`](Self::subscribe_revision)
/// so dependent views recompute.
pub struct OptimisticOverlay {
    pending: Mutex<PendingOverlay>,
    ttl: Duration,
    clock: Arc<dyn ClockPort>,
    revision: Observable<u64>,
}

impl OptimisticOverlay {
    pub fn new(clock: Arc<dyn ClockPort>, ttl: Duration) -> Self {
        Self {
            pending: Mutex::new(PendingOverlay::new()),
            ttl,
            clock,
            revision: Observable::new(0),
        }
    }

    /// Hides `id` immediately. Call before issuing the remote delete.
    pub fn request_hide(&self, id: RecordId) {
        let now_ms = self.clock.now_ms();
        debug!(record_id = %id, ttl_ms = self.ttl.as_millis() as u64, "hiding record");
        self.lock().hide(id, now_ms, self.ttl);
        self.bump();
    }

    /// Makes `id` visible again. Used when the remote delete fails.
    pub fn cancel_hide(&self, id: &RecordId) -> bool {
        let removed = self.lock().cancel(id);
        if removed {
            debug!(record_id = %id, "record visible again");
            self.bump();
        }
        removed
    }

    /// Drops entries confirmed deleted by `snapshot`.
    pub fn reconcile(&self, snapshot: &Snapshot) -> usize {
        let removed = self.lock().reconcile(snapshot);
        if removed > 0 {
            debug!(removed, "overlay entries confirmed by snapshot");
            self.bump();
        }
        removed
    }

    /// Drops expired entries.
    pub fn sweep(&self) -> usize {
        let removed = self.lock().sweep(self.clock.now_ms());
        if removed > 0 {
            debug!(removed, "overlay entries expired");
            self.bump();
        }
        removed
    }

    pub fn clear(&self) {
        let mut pending = self.lock();
        if !pending.is_empty() {
            *pending = PendingOverlay::new();
            drop(pending);
            self.bump();
        }
    }

    pub fn is_hidden(&self, id: &RecordId) -> bool {
        self.lock().is_hidden(id, self.clock.now_ms())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Runs `f` against the current overlay. Keep `f` short; the overlay is locked.
    pub fn read<R>(&self, f: impl FnOnce(&PendingOverlay) -> R) -> R {
        f(&self.lock())
    }

    pub fn subscribe_revision(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.update(|rev| {
            *rev = rev.wrapping_add(1);
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, PendingOverlay> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
