use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use hl_core::ids::{OwnerId, RecordId};
use hl_core::ports::{RecordStorePort, SnapshotEvent, SnapshotReceiver, StoreError};
use hl_core::record::{NewRecord, Record};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const SUBSCRIPTION_BUFFER: usize = 32;

#[derive(Default)]
struct StoreState {
    records: Vec<Record>,
    subscribers: Vec<(OwnerId, mpsc::Sender<SnapshotEvent>)>,
    fail_next_add: Option<StoreError>,
    fail_next_delete: Option<StoreError>,
    withhold_deletes: bool,
}

impl StoreState {
    fn snapshot_for(&self, owner: &OwnerId) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| &r.owner_id == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Pushes `owner`'s current list to every live subscriber of that owner.
    fn broadcast(&mut self, owner: &OwnerId) {
        let records = self.snapshot_for(owner);
        self.subscribers.retain(|(subscriber, tx)| {
            if subscriber != owner {
                return !tx.is_closed();
            }
            match tx.try_send(Ok(records.clone())) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(owner = %owner, "subscriber lagging, dropping snapshot");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

/// Process-local record store with push subscriptions.
///
/// Every mutation pushes the affected owner's complete list to that owner's
/// subscribers. Failure hooks let tests and demos exercise the error paths.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<StoreState>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as if another client had written it, assigning an id if missing.
    pub fn seed(&self, mut record: Record) -> RecordId {
        let id = record.id.get_or_insert_with(RecordId::generate).clone();
        let owner = record.owner_id.clone();
        let mut state = self.lock();
        state.records.push(record);
        state.broadcast(&owner);
        id
    }

    /// The next `add` fails with `error`.
    pub fn fail_next_add(&self, error: StoreError) {
        self.lock().fail_next_add = Some(error);
    }

    /// The next `delete` fails with `error`.
    pub fn fail_next_delete(&self, error: StoreError) {
        self.lock().fail_next_delete = Some(error);
    }

    /// While set, deletes are acknowledged but never applied, like a backend
    /// that has not caught up yet.
    pub fn withhold_deletes(&self, withhold: bool) {
        self.lock().withhold_deletes = withhold;
    }

    /// Delivers a listener error to `owner`'s subscribers.
    pub fn push_error(&self, owner: &OwnerId, error: StoreError) {
        let mut state = self.lock();
        state.subscribers.retain(|(subscriber, tx)| {
            if subscriber == owner {
                return tx.try_send(Err(error.clone())).is_ok() || !tx.is_closed();
            }
            !tx.is_closed()
        });
    }

    pub fn records_of(&self, owner: &OwnerId) -> Vec<Record> {
        self.lock().snapshot_for(owner)
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl RecordStorePort for InMemoryRecordStore {
    async fn subscribe(&self, owner: &OwnerId) -> Result<SnapshotReceiver, StoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut state = self.lock();
        let initial = state.snapshot_for(owner);
        tx.try_send(Ok(initial))
            .map_err(|err| StoreError::Other(err.to_string()))?;
        state.subscribers.push((owner.clone(), tx));
        debug!(owner = %owner, "subscriber registered");
        Ok(rx)
    }

    async fn add(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        let mut state = self.lock();
        if let Some(error) = state.fail_next_add.take() {
            return Err(error);
        }

        let id = RecordId::generate();
        let owner = record.owner_id.clone();
        state.records.push(record.into_record(id.clone()));
        state.broadcast(&owner);
        debug!(record_id = %id, "record stored");
        Ok(id)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError> {
        let mut state = self.lock();
        if let Some(error) = state.fail_next_delete.take() {
            return Err(error);
        }

        let position = state
            .records
            .iter()
            .position(|r| r.id.as_ref() == Some(id))
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if state.withhold_deletes {
            debug!(record_id = %id, "delete acknowledged but withheld");
            return Ok(());
        }

        let removed = state.records.remove(position);
        state.broadcast(&removed.owner_id);
        debug!(record_id = %id, "record removed");
        Ok(())
    }
}
