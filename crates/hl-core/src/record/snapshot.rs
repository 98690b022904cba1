use std::sync::Arc;

use super::Record;
use crate::ids::RecordId;

/// Full, atomically replaced copy of one owner's records, newest-created first.
///
/// Cloning is cheap; the records are shared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    records: Arc<[Record]>,
}

impl Snapshot {
    /// Builds a snapshot, restoring newest-first order if the source did not deliver it.
    pub fn new(mut records: Vec<Record>) -> Self {
        if !records
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(records = records.len(), "snapshot out of order, resorting");
            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.iter().any(|r| r.id.as_ref() == Some(id))
    }

    /// Ids of all persisted records in the snapshot.
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.records.iter().filter_map(|r| r.id.as_ref())
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
