use chrono::{DateTime, NaiveDate, TimeZone};

use crate::overlay::PendingOverlay;
use crate::record::{Record, Snapshot};
use crate::time::local_date;

/// Visible records of one past local calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryGroup {
    pub day: NaiveDate,
    /// Newest first.
    pub records: Vec<Record>,
    pub total: u64,
}

/// Groups every visible record created before `now`'s local day, newest day first.
///
/// Relies on the snapshot being newest-first, which makes local dates
/// non-increasing and lets consecutive records share a group.
pub fn group_history<Tz: TimeZone>(
    snapshot: &Snapshot,
    overlay: &PendingOverlay,
    now: &DateTime<Tz>,
) -> Vec<HistoryGroup> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut groups: Vec<HistoryGroup> = Vec::new();

    for record in overlay.apply(snapshot, now.timestamp_millis()) {
        let day = local_date(&record.created_at, &tz);
        if day >= today {
            continue;
        }
        match groups.last_mut() {
            Some(group) if group.day == day => {
                group.total += u64::from(record.magnitude);
                group.records.push(record.clone());
            }
            _ => groups.push(HistoryGroup {
                day,
                total: u64::from(record.magnitude),
                records: vec![record.clone()],
            }),
        }
    }

    groups
}
