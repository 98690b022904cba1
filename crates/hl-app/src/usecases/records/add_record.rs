use std::sync::Arc;

use hl_core::ids::{OwnerId, RecordId};
use hl_core::ports::{ClockPort, RecordStorePort, StoreError};
use hl_core::record::{RecordDraft, ValidationError};
use hl_core::time::from_unix_ms;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AddRecordError {
    #[error("invalid record: {0}")]
    Validation(#[from] ValidationError),

    #[error("store rejected the record: {0}")]
    Remote(#[source] StoreError),

    #[error("no record subscription is active")]
    NotStarted,
}

/// Validates a draft and persists it.
///
/// There is no optimistic insert: the record shows up once the store pushes a
/// snapshot containing it.
pub struct AddRecord {
    store: Arc<dyn RecordStorePort>,
    clock: Arc<dyn ClockPort>,
}

impl AddRecord {
    pub fn from_ports(store: Arc<dyn RecordStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { store, clock }
    }

    #[tracing::instrument(
        name = "usecase.add_record.execute",
        skip(self, owner, draft),
        fields(owner = %owner, category = %draft.category)
    )]
    pub async fn execute(
        &self,
        owner: OwnerId,
        draft: RecordDraft,
    ) -> Result<RecordId, AddRecordError> {
        let created_at = from_unix_ms(self.clock.now_ms());
        let record = draft.validate(owner, created_at)?;
        let magnitude = record.magnitude;

        let id = self
            .store
            .add(record)
            .await
            .map_err(AddRecordError::Remote)?;

        info!(record_id = %id, magnitude, "record added");
        Ok(id)
    }
}
