use std::sync::Arc;

use hl_core::ids::RecordId;
use hl_core::ports::{RecordStorePort, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use super::overlay::OptimisticOverlay;

#[derive(Debug, Error)]
pub enum DeleteRecordError {
    #[error("store failed to delete the record: {0}")]
    Remote(#[source] StoreError),
}

/// Hides a record right away and deletes it remotely.
///
/// On success the overlay entry stays until a snapshot confirms the deletion or
/// the entry expires. On failure it is rolled back so the record reappears.
pub struct DeleteRecord {
    store: Arc<dyn RecordStorePort>,
    overlay: Arc<OptimisticOverlay>,
}

impl DeleteRecord {
    pub fn from_ports(store: Arc<dyn RecordStorePort>, overlay: Arc<OptimisticOverlay>) -> Self {
        Self { store, overlay }
    }

    #[tracing::instrument(
        name = "usecase.delete_record.execute",
        skip(self, id),
        fields(record_id = %id)
    )]
    pub async fn execute(&self, id: &RecordId) -> Result<(), DeleteRecordError> {
        self.overlay.request_hide(id.clone());

        match self.store.delete(id).await {
            Ok(()) => {
                info!("record deleted, awaiting snapshot confirmation");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "delete failed, restoring record");
                self.overlay.cancel_hide(id);
                Err(DeleteRecordError::Remote(err))
            }
        }
    }
}
