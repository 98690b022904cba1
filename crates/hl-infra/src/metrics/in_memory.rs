use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Days, Local, Utc};
use hl_core::metrics::{AuthorizationStatus, BucketSize, DateRange, MetricBucket, MetricKind};
use hl_core::ports::{MetricsProviderPort, ProviderError};
use hl_core::time::{local_date, start_of_day};
use tracing::debug;

struct Sample {
    kind: MetricKind,
    at: DateTime<Utc>,
    value: f64,
}

struct ProviderState {
    authorization: Result<AuthorizationStatus, ProviderError>,
    granted: bool,
    samples: Vec<Sample>,
    failures: HashMap<MetricKind, ProviderError>,
}

/// Sample-backed metrics provider.
///
/// Windowed queries bucket by local calendar day, the way a device health
/// store does.
pub struct InMemoryMetricsProvider {
    state: Mutex<ProviderState>,
    queries: AtomicUsize,
}

impl InMemoryMetricsProvider {
    /// A provider whose authorization prompt answers `status`.
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            state: Mutex::new(ProviderState {
                authorization: Ok(status),
                granted: false,
                samples: Vec::new(),
                failures: HashMap::new(),
            }),
            queries: AtomicUsize::new(0),
        }
    }

    /// A provider whose authorization prompt fails.
    pub fn failing_authorization(error: ProviderError) -> Self {
        let provider = Self::new(AuthorizationStatus::Denied);
        provider.lock().authorization = Err(error);
        provider
    }

    pub fn record_sample(&self, kind: MetricKind, at: DateTime<Utc>, value: f64) {
        self.lock().samples.push(Sample { kind, at, value });
    }

    /// Every query for `kind` fails with `error` until cleared.
    pub fn fail_queries(&self, kind: MetricKind, error: ProviderError) {
        self.lock().failures.insert(kind, error);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Number of data queries served, authorization requests excluded.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn begin_query(&self, kind: MetricKind) -> Result<MutexGuard<'_, ProviderState>, ProviderError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if !state.granted {
            return Err(ProviderError::Authorization("read access not granted".to_string()));
        }
        if let Some(error) = state.failures.get(&kind) {
            return Err(error.clone());
        }
        Ok(state)
    }

    fn lock(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sum_in(state: &ProviderState, kind: MetricKind, range: &DateRange) -> Option<f64> {
    state
        .samples
        .iter()
        .filter(|s| s.kind == kind && range.contains(&s.at))
        .map(|s| s.value)
        .reduce(|a, b| a + b)
}

#[async_trait]
impl MetricsProviderPort for InMemoryMetricsProvider {
    async fn request_authorization(&self) -> Result<AuthorizationStatus, ProviderError> {
        let mut state = self.lock();
        let status = state.authorization.clone()?;
        state.granted = status == AuthorizationStatus::Granted;
        Ok(status)
    }

    async fn query_cumulative(
        &self,
        kind: MetricKind,
        range: DateRange,
    ) -> Result<Option<f64>, ProviderError> {
        let state = self.begin_query(kind)?;
        let total = sum_in(&state, kind, &range);
        debug!(?kind, ?total, "cumulative query");
        Ok(total)
    }

    async fn query_windowed(
        &self,
        kind: MetricKind,
        range: DateRange,
        bucket: BucketSize,
    ) -> Result<Vec<MetricBucket>, ProviderError> {
        let state = self.begin_query(kind)?;
        let BucketSize::Day = bucket;

        let mut buckets = Vec::new();
        let mut day = local_date(&range.start, &Local);
        loop {
            let start = start_of_day(day, &Local).max(range.start);
            if start >= range.end {
                break;
            }
            let Some(next) = day.checked_add_days(Days::new(1)) else {
                break;
            };
            let end = start_of_day(next, &Local).min(range.end);
            let value = sum_in(&state, kind, &DateRange::new(start, end)).unwrap_or(0.0);
            buckets.push(MetricBucket { start, value });
            day = next;
        }
        debug!(?kind, buckets = buckets.len(), "windowed query");
        Ok(buckets)
    }
}
