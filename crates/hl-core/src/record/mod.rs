//! Record domain model.
//!
//! A record is one logged entry (typically a meal) that belongs to an
//! owner and carries a positive magnitude in one of four fixed categories.

mod draft;
mod snapshot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{OwnerId, RecordId};

pub use draft::{RecordDraft, ValidationError};
pub use snapshot::Snapshot;

/// Fixed category set a record is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 4] = [
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Snack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Breakfast => "Breakfast",
            Category::Lunch => "Lunch",
            Category::Dinner => "Dinner",
            Category::Snack => "Snack",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Breakfast => 0,
            Category::Lunch => 1,
            Category::Dinner => 2,
            Category::Snack => 3,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record as delivered by the remote store.
///
/// `id` is `None` only for records that were never persisted; everything that
/// arrives in a snapshot carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Option<RecordId>,
    pub owner_id: OwnerId,
    pub category: Category,
    pub magnitude: u32,
    pub label: String,
    pub note: String,
    pub media_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated record that has not been confirmed by the store yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub owner_id: OwnerId,
    pub category: Category,
    pub magnitude: u32,
    pub label: String,
    pub note: String,
    pub media_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewRecord {
    /// Materializes the record once the store has assigned an id.
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id: Some(id),
            owner_id: self.owner_id,
            category: self.category,
            magnitude: self.magnitude,
            label: self.label,
            note: self.note,
            media_ref: self.media_ref,
            created_at: self.created_at,
        }
    }
}
