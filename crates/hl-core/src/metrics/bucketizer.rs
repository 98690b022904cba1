//! Partitions windowed query results into seven local calendar days.

use chrono::{DateTime, Days, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{truncate_total, DateRange, MetricBucket};
use crate::time::{local_date, start_of_day};

pub const WEEK_DAYS: usize = 7;

/// Seven daily totals, oldest (six days ago) first, today last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklySeries(pub [u64; WEEK_DAYS]);

impl WeeklySeries {
    pub fn as_slice(&self) -> &[u64] {
        &self.0
    }

    pub fn today(&self) -> u64 {
        self.0[WEEK_DAYS - 1]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// `[local start of today, now)`.
pub fn today_range<Tz: TimeZone>(now: &DateTime<Tz>) -> DateRange {
    let tz = now.timezone();
    DateRange::new(start_of_day(now.date_naive(), &tz), now.with_timezone(&Utc))
}

/// `[local start of the day six days ago, local start of tomorrow)`.
pub fn weekly_window<Tz: TimeZone>(now: &DateTime<Tz>) -> DateRange {
    let tz = now.timezone();
    let today = now.date_naive();
    let first = today
        .checked_sub_days(Days::new(WEEK_DAYS as u64 - 1))
        .unwrap_or(today);
    let after_last = today.checked_add_days(Days::new(1)).unwrap_or(today);
    DateRange::new(start_of_day(first, &tz), start_of_day(after_last, &tz))
}

/// Sums buckets into their local calendar day relative to `now`.
///
/// Buckets outside the trailing week are ignored and days without a bucket stay at zero.
pub fn bucketize<Tz: TimeZone>(buckets: &[MetricBucket], now: &DateTime<Tz>) -> WeeklySeries {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut sums = [0f64; WEEK_DAYS];

    for bucket in buckets {
        let age = (today - local_date(&bucket.start, &tz)).num_days();
        if (0..WEEK_DAYS as i64).contains(&age) {
            sums[WEEK_DAYS - 1 - age as usize] += bucket.value;
        }
    }

    WeeklySeries(sums.map(truncate_total))
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeDelta};

    use super::*;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 15, 30, 0)
            .unwrap()
    }

    fn day_bucket(days_ago: u64, value: f64) -> MetricBucket {
        let window = weekly_window(&now());
        let offset = WEEK_DAYS as i64 - 1 - days_ago as i64;
        MetricBucket {
            start: window.start + TimeDelta::days(offset),
            value,
        }
    }

    #[test]
    fn reproduces_per_day_totals_in_order() {
        let raw = [3.0, 0.0, 5.0, 2.0, 0.0, 0.0, 7.0];
        let buckets: Vec<_> = raw
            .iter()
            .enumerate()
            .map(|(i, v)| day_bucket(6 - i as u64, *v))
            .collect();

        assert_eq!(bucketize(&buckets, &now()).0, [3, 0, 5, 2, 0, 0, 7]);
    }

    #[test]
    fn missing_days_default_to_zero() {
        let buckets = vec![day_bucket(6, 11.0), day_bucket(0, 4.0)];
        let series = bucketize(&buckets, &now());
        assert_eq!(series.0, [11, 0, 0, 0, 0, 0, 4]);
        assert_eq!(series.today(), 4);
        assert_eq!(series.total(), 15);
    }

    #[test]
    fn ignores_buckets_outside_the_week() {
        let window = weekly_window(&now());
        let buckets = vec![
            MetricBucket {
                start: window.start - TimeDelta::days(1),
                value: 99.0,
            },
            MetricBucket {
                start: window.end,
                value: 42.0,
            },
        ];
        assert_eq!(bucketize(&buckets, &now()), WeeklySeries::default());
    }

    #[test]
    fn window_spans_seven_local_days() {
        let window = weekly_window(&now());
        // 2025-03-04 00:00 at UTC-4
        assert_eq!(window.start, Utc.with_ymd_and_hms(2025, 3, 4, 4, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2025, 3, 11, 4, 0, 0).unwrap());
    }

    #[test]
    fn today_range_starts_at_local_midnight() {
        let range = today_range(&now());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap());
        assert_eq!(range.end, now().with_timezone(&Utc));
    }
}
