use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Category, NewRecord};
use crate::ids::OwnerId;

/// Unvalidated user input for a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub label: String,
    pub magnitude: i64,
    pub category: Category,
    pub note: String,
    pub media_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("magnitude must be positive, got {0}")]
    NonPositiveMagnitude(i64),

    #[error("magnitude {0} is out of range")]
    MagnitudeOutOfRange(i64),

    #[error("label must not be empty")]
    EmptyLabel,
}

impl RecordDraft {
    pub fn new(label: impl Into<String>, magnitude: i64, category: Category) -> Self {
        Self {
            label: label.into(),
            magnitude,
            category,
            note: String::new(),
            media_ref: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn with_media_ref(mut self, media_ref: impl Into<String>) -> Self {
        self.media_ref = Some(media_ref.into());
        self
    }

    /// Checks the draft and turns it into a record ready to be sent to the store.
    ///
    /// Label and note are trimmed; the label must still be non-empty afterwards.
    pub fn validate(
        self,
        owner_id: OwnerId,
        created_at: DateTime<Utc>,
    ) -> Result<NewRecord, ValidationError> {
        if self.magnitude <= 0 {
            return Err(ValidationError::NonPositiveMagnitude(self.magnitude));
        }
        let magnitude = u32::try_from(self.magnitude)
            .map_err(|_| ValidationError::MagnitudeOutOfRange(self.magnitude))?;

        let label = self.label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }

        Ok(NewRecord {
            owner_id,
            category: self.category,
            magnitude,
            label: label.to_string(),
            note: self.note.trim().to_string(),
            media_ref: self.media_ref.filter(|r| !r.trim().is_empty()),
            created_at,
        })
    }
}
