use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Store-assigned identifier of a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl_id!(RecordId);
