use async_trait::async_trait;
use tokio::sync::mpsc;

use super::errors::StoreError;
use crate::ids::{OwnerId, RecordId};
use crate::record::{NewRecord, Record};

/// One change notification: the owner's full record list, or a listener error.
pub type SnapshotEvent = Result<Vec<Record>, StoreError>;

/// Receiving half of a subscription. Dropping it cancels the subscription.
pub type SnapshotReceiver = mpsc::Receiver<SnapshotEvent>;

/// Remote collection store holding every owner's records.
#[async_trait]
pub trait RecordStorePort: Send + Sync {
    /// Opens a push subscription to `owner`'s records, ordered by `created_at` descending.
    ///
    /// Every event carries the complete current list; the store sends one as soon
    /// as the subscription is established.
    async fn subscribe(&self, owner: &OwnerId) -> Result<SnapshotReceiver, StoreError>;

    /// Persists a record and returns the id assigned by the store.
    async fn add(&self, record: NewRecord) -> Result<RecordId, StoreError>;

    async fn delete(&self, id: &RecordId) -> Result<(), StoreError>;
}
