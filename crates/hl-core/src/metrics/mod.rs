//! Metric model shared by the aggregator and provider adapters.

mod bucketizer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use bucketizer::{bucketize, today_range, weekly_window, WeeklySeries, WEEK_DAYS};

/// Metric kinds the provider is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Cumulative count metric (steps).
    StepCount,
    /// Cumulative energy metric (active kilocalories).
    ActiveEnergy,
}

/// Half-open `[start, end)` query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketSize {
    Day,
}

/// One bucket of a windowed query, keyed by the bucket's start instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBucket {
    pub start: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    Granted,
    Denied,
}

/// Aggregator lifecycle. `Unauthorized` is terminal until authorization is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorState {
    #[default]
    Unauthorized,
    Idle,
    Loading,
}

/// Joined result of today's cumulative queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrentMetrics {
    pub count: u64,
    pub energy: u64,
}

impl CurrentMetrics {
    /// Progress toward a daily energy target, clamped to `[0, 1]`.
    pub fn energy_progress(&self, target: u64) -> f64 {
        if target == 0 {
            return 1.0;
        }
        (self.energy as f64 / target as f64).min(1.0)
    }
}

/// Provider values are fractional; published totals truncate toward zero.
pub fn truncate_total(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn energy_progress_is_clamped() {
        let metrics = CurrentMetrics {
            count: 0,
            energy: 250,
        };
        assert_eq!(metrics.energy_progress(500), 0.5);
        assert_eq!(metrics.energy_progress(100), 1.0);
        assert_eq!(CurrentMetrics::default().energy_progress(500), 0.0);
    }

    #[test]
    fn truncates_fractional_and_invalid_values() {
        assert_eq!(truncate_total(4200.9), 4200);
        assert_eq!(truncate_total(-3.0), 0);
        assert_eq!(truncate_total(f64::NAN), 0);
    }

    #[test]
    fn date_range_is_half_open() {
        let start = DateTime::from_timestamp(0, 0).unwrap();
        let end = DateTime::from_timestamp(10, 0).unwrap();
        let range = DateRange::new(start, end);
        assert!(range.contains(&start));
        assert!(!range.contains(&end));
    }
}
