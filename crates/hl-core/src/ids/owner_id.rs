use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifier of the user that owns a set of records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl_id!(OwnerId);
