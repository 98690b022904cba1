//! Derived view engine.
//!
//! Pure functions of `(snapshot, overlay, now)`. Both views are computed in a
//! single pass over the snapshot.

mod history;

use chrono::{DateTime, TimeZone};

use crate::overlay::PendingOverlay;
use crate::record::{Category, Record, Snapshot};
use crate::time::local_date;

pub use history::{group_history, HistoryGroup};

/// Per-category magnitude sums. Every category is present, zero if unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryTotals([u64; 4]);

impl CategoryTotals {
    pub fn add(&mut self, category: Category, magnitude: u32) {
        self.0[category.index()] += u64::from(magnitude);
    }

    pub fn get(&self, category: Category) -> u64 {
        self.0[category.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::ALL.iter().map(|c| (*c, self.get(*c)))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

impl std::ops::Index<Category> for CategoryTotals {
    type Output = u64;

    fn index(&self, category: Category) -> &u64 {
        &self.0[category.index()]
    }
}

/// What the "today" screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DerivedView {
    pub todays_records: Vec<Record>,
    pub category_totals: CategoryTotals,
}

impl DerivedView {
    /// Sum of all of today's magnitudes.
    pub fn total(&self) -> u64 {
        self.category_totals.total()
    }
}

/// Today's visible records and their per-category totals.
///
/// "Today" is the local calendar date of `now` in `now`'s own time zone.
pub fn derive_view<Tz: TimeZone>(
    snapshot: &Snapshot,
    overlay: &PendingOverlay,
    now: &DateTime<Tz>,
) -> DerivedView {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut view = DerivedView::default();

    for record in overlay.apply(snapshot, now.timestamp_millis()) {
        if local_date(&record.created_at, &tz) != today {
            continue;
        }
        view.category_totals.add(record.category, record.magnitude);
        view.todays_records.push(record.clone());
    }

    view
}
