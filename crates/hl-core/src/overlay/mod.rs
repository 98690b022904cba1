//! Pending-deletion overlay.
//!
//! Ids in the overlay are hidden from every derived view until the store
//! confirms the deletion (the id disappears from a snapshot) or the entry
//! expires. Time is expressed in unix milliseconds as reported by
//! [`ClockPort`](crate::ports::ClockPort).

use std::collections::HashMap;
use std::time::Duration;

use crate::ids::RecordId;
use crate::record::{Record, Snapshot};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingOverlay {
    entries: HashMap<RecordId, i64>,
}

impl PendingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides `id` until `now_ms + ttl`. Hiding an already hidden id refreshes its expiry.
    pub fn hide(&mut self, id: RecordId, now_ms: i64, ttl: Duration) {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.entries.insert(id, now_ms.saturating_add(ttl_ms));
    }

    /// Drops the entry for `id`. Returns whether one existed.
    pub fn cancel(&mut self, id: &RecordId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Drops entries whose id no longer appears in `snapshot`, i.e. confirmed deletions.
    /// Returns the number of removed entries.
    pub fn reconcile(&mut self, snapshot: &Snapshot) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let before = self.entries.len();
        let present: std::collections::HashSet<&RecordId> = snapshot.ids().collect();
        self.entries.retain(|id, _| present.contains(id));
        before - self.entries.len()
    }

    /// Drops entries that expired at or before `now_ms`. Returns the number of removed entries.
    pub fn sweep(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now_ms);
        before - self.entries.len()
    }

    pub fn is_hidden(&self, id: &RecordId, now_ms: i64) -> bool {
        self.entries
            .get(id)
            .is_some_and(|expires_at| *expires_at > now_ms)
    }

    pub fn expires_at(&self, id: &RecordId) -> Option<i64> {
        self.entries.get(id).copied()
    }

    /// Earliest pending expiry, if any.
    pub fn next_expiry(&self) -> Option<i64> {
        self.entries.values().copied().min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `snapshot` minus every id that is hidden at `now_ms`. Never mutates either side.
    ///
    /// Records without an id cannot be hidden and are always visible.
    pub fn apply<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        now_ms: i64,
    ) -> impl Iterator<Item = &'a Record> + 'a {
        snapshot.iter().filter(move |record| match &record.id {
            Some(id) => !self.is_hidden(id, now_ms),
            None => true,
        })
    }
}
