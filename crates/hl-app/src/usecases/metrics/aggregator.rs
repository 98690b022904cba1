use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use hl_core::metrics::{
    bucketize, today_range, truncate_total, weekly_window, AggregatorState, AuthorizationStatus,
    BucketSize, CurrentMetrics, DateRange, MetricKind, WeeklySeries,
};
use hl_core::ports::{ClockPort, MetricsProviderPort, ProviderError};
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tracing::{debug, info, warn};

use crate::join::Countdown;
use crate::observable::Observable;

const ISSUE_CHANNEL_CAPACITY: usize = 16;

/// A metric query that failed and was zero-filled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricIssue {
    pub kind: MetricKind,
    pub error: ProviderError,
}

struct Inner {
    provider: Arc<dyn MetricsProviderPort>,
    clock: Arc<dyn ClockPort>,
    energy_target: u64,
    authorized: AtomicBool,
    authorizing: Mutex<()>,
    in_flight: StdMutex<usize>,
    state: Observable<AggregatorState>,
    current: Observable<CurrentMetrics>,
    weekly: Observable<WeeklySeries>,
    issues: broadcast::Sender<MetricIssue>,
}

impl Inner {
    fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::Acquire)
    }

    fn begin_loading(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight += 1;
        self.state.publish(AggregatorState::Loading);
    }

    fn end_loading(&self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.state.publish(AggregatorState::Idle);
        }
    }

    fn report(&self, kind: MetricKind, error: ProviderError) {
        warn!(?kind, error = %error, "metric query failed, using zero");
        let _ = self.issues.send(MetricIssue { kind, error });
    }

    async fn query_leaf(&self, kind: MetricKind, range: DateRange) -> u64 {
        match self.provider.query_cumulative(kind, range).await {
            Ok(Some(value)) => truncate_total(value),
            Ok(None) => 0,
            Err(error) => {
                self.report(kind, error);
                0
            }
        }
    }
}

/// Join point of the two `fetch_current` leaves.
struct CurrentJoin {
    countdown: Countdown,
    count: AtomicU64,
    energy: AtomicU64,
    done: StdMutex<Option<oneshot::Sender<CurrentMetrics>>>,
}

impl CurrentJoin {
    fn slot(&self, kind: MetricKind) -> &AtomicU64 {
        match kind {
            MetricKind::StepCount => &self.count,
            MetricKind::ActiveEnergy => &self.energy,
        }
    }

    /// Stores one leaf result; the last leaf publishes the joined value.
    fn complete(&self, inner: &Inner, kind: MetricKind, value: u64) {
        self.slot(kind).store(value, Ordering::Release);
        if !self.countdown.arrive() {
            return;
        }

        let metrics = CurrentMetrics {
            count: self.count.load(Ordering::Acquire),
            energy: self.energy.load(Ordering::Acquire),
        };
        debug!(count = metrics.count, energy = metrics.energy, "current metrics joined");
        inner.current.emit(metrics);
        inner.end_loading();

        let done = self
            .done
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(done) = done {
            let _ = done.send(metrics);
        }
    }
}

/// Today's step/energy totals and the trailing week of steps, gated on
/// provider authorization.
#[derive(Clone)]
pub struct MetricAggregator {
    inner: Arc<Inner>,
}

impl MetricAggregator {
    pub fn new(
        provider: Arc<dyn MetricsProviderPort>,
        clock: Arc<dyn ClockPort>,
        energy_target: u64,
    ) -> Self {
        let (issues, _) = broadcast::channel(ISSUE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                provider,
                clock,
                energy_target,
                authorized: AtomicBool::new(false),
                authorizing: Mutex::new(()),
                in_flight: StdMutex::new(0),
                state: Observable::new(AggregatorState::Unauthorized),
                current: Observable::default(),
                weekly: Observable::default(),
                issues,
            }),
        }
    }

    /// Asks the provider for access. On grant the aggregator becomes `Idle` and
    /// fetches today's totals and the weekly series. Repeating after a grant
    /// returns `Granted` without contacting the provider.
    #[tracing::instrument(name = "usecase.metrics.request_authorization", skip(self))]
    pub async fn request_authorization(&self) -> Result<AuthorizationStatus, ProviderError> {
        {
            let _guard = self.inner.authorizing.lock().await;
            if self.inner.is_authorized() {
                return Ok(AuthorizationStatus::Granted);
            }

            match self.inner.provider.request_authorization().await {
                Ok(AuthorizationStatus::Granted) => {
                    self.inner.authorized.store(true, Ordering::Release);
                    self.inner.state.publish(AggregatorState::Idle);
                    info!("metrics authorization granted");
                }
                Ok(AuthorizationStatus::Denied) => {
                    info!("metrics authorization denied");
                    return Ok(AuthorizationStatus::Denied);
                }
                Err(error) => {
                    warn!(error = %error, "metrics authorization request failed");
                    return Err(error);
                }
            }
        }

        tokio::join!(self.fetch_current(), self.fetch_weekly_series());
        Ok(AuthorizationStatus::Granted)
    }

    /// Queries today's step count and active energy concurrently and publishes
    /// the joined result once both have completed. Failed or empty leaves count
    /// as zero. Returns zeros without querying while unauthorized.
    #[tracing::instrument(name = "usecase.metrics.fetch_current", skip(self))]
    pub async fn fetch_current(&self) -> CurrentMetrics {
        if !self.inner.is_authorized() {
            debug!("not authorized, skipping current metrics");
            return CurrentMetrics::default();
        }

        let range = today_range(&self.inner.clock.now_local());
        let (done_tx, done_rx) = oneshot::channel();
        let join = Arc::new(CurrentJoin {
            countdown: Countdown::new(2),
            count: AtomicU64::new(0),
            energy: AtomicU64::new(0),
            done: StdMutex::new(Some(done_tx)),
        });

        self.inner.begin_loading();
        for kind in [MetricKind::StepCount, MetricKind::ActiveEnergy] {
            let inner = Arc::clone(&self.inner);
            let join = Arc::clone(&join);
            tokio::spawn(async move {
                let value = inner.query_leaf(kind, range).await;
                join.complete(&inner, kind, value);
            });
        }
        // leaves own the sender; a lost leaf closes `done_rx`
        drop(join);

        match done_rx.await {
            Ok(metrics) => metrics,
            Err(_) => {
                warn!("current metrics join lost a leaf, keeping last totals");
                self.inner.end_loading();
                self.inner.current.get()
            }
        }
    }

    /// Queries the trailing seven local days of steps in daily buckets.
    /// Keeps and returns the last series when the query fails.
    #[tracing::instrument(name = "usecase.metrics.fetch_weekly_series", skip(self))]
    pub async fn fetch_weekly_series(&self) -> WeeklySeries {
        if !self.inner.is_authorized() {
            debug!("not authorized, skipping weekly series");
            return WeeklySeries::default();
        }

        let now = self.inner.clock.now_local();
        let window = weekly_window(&now);

        self.inner.begin_loading();
        let result = self
            .inner
            .provider
            .query_windowed(MetricKind::StepCount, window, BucketSize::Day)
            .await;
        let series = match result {
            Ok(buckets) => {
                let series = bucketize(&buckets, &now);
                self.inner.weekly.publish(series);
                series
            }
            Err(error) => {
                self.inner.report(MetricKind::StepCount, error);
                self.inner.weekly.get()
            }
        };
        self.inner.end_loading();
        series
    }

    /// Progress toward the daily energy target in `[0, 1]`; zero while unauthorized.
    pub fn energy_progress(&self) -> f64 {
        if !self.inner.is_authorized() {
            return 0.0;
        }
        self.inner.current.get().energy_progress(self.inner.energy_target)
    }

    pub fn energy_target(&self) -> u64 {
        self.inner.energy_target
    }

    pub fn state(&self) -> AggregatorState {
        self.inner.state.get()
    }

    pub fn current(&self) -> CurrentMetrics {
        self.inner.current.get()
    }

    pub fn weekly_series(&self) -> WeeklySeries {
        self.inner.weekly.get()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AggregatorState> {
        self.inner.state.subscribe()
    }

    pub fn subscribe_current(&self) -> watch::Receiver<CurrentMetrics> {
        self.inner.current.subscribe()
    }

    pub fn subscribe_weekly(&self) -> watch::Receiver<WeeklySeries> {
        self.inner.weekly.subscribe()
    }

    pub fn subscribe_issues(&self) -> broadcast::Receiver<MetricIssue> {
        self.inner.issues.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use hl_core::metrics::MetricBucket;

    use super::*;

    struct FixedClock(i64);

    impl ClockPort for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0
        }
    }

    struct StaticProvider {
        status: AuthorizationStatus,
        steps: Option<f64>,
        energy: Result<Option<f64>, ProviderError>,
        history: Result<Vec<MetricBucket>, ProviderError>,
    }

    #[async_trait]
    impl MetricsProviderPort for StaticProvider {
        async fn request_authorization(&self) -> Result<AuthorizationStatus, ProviderError> {
            Ok(self.status)
        }

        async fn query_cumulative(
            &self,
            kind: MetricKind,
            _range: DateRange,
        ) -> Result<Option<f64>, ProviderError> {
            match kind {
                MetricKind::StepCount => Ok(self.steps),
                MetricKind::ActiveEnergy => self.energy.clone(),
            }
        }

        async fn query_windowed(
            &self,
            _kind: MetricKind,
            _range: DateRange,
            _bucket: BucketSize,
        ) -> Result<Vec<MetricBucket>, ProviderError> {
            self.history.clone()
        }
    }

    fn aggregator(provider: StaticProvider) -> MetricAggregator {
        MetricAggregator::new(
            Arc::new(provider),
            Arc::new(FixedClock(1_741_608_000_000)),
            500,
        )
    }

    #[tokio::test]
    async fn grant_fetches_and_settles_idle() {
        let aggregator = aggregator(StaticProvider {
            status: AuthorizationStatus::Granted,
            steps: Some(4200.7),
            energy: Ok(Some(125.0)),
            history: Ok(Vec::new()),
        });

        let status = aggregator.request_authorization().await.unwrap();

        assert_eq!(status, AuthorizationStatus::Granted);
        assert_eq!(
            aggregator.current(),
            CurrentMetrics {
                count: 4200,
                energy: 125
            }
        );
        assert_eq!(aggregator.state(), AggregatorState::Idle);
        assert_eq!(aggregator.energy_progress(), 0.25);
    }

    #[tokio::test]
    async fn failed_leaf_is_zero_filled_and_reported() {
        let aggregator = aggregator(StaticProvider {
            status: AuthorizationStatus::Granted,
            steps: None,
            energy: Err(ProviderError::Query("boom".to_string())),
            history: Ok(Vec::new()),
        });
        let mut issues = aggregator.subscribe_issues();
        aggregator.request_authorization().await.unwrap();

        assert_eq!(aggregator.current(), CurrentMetrics::default());
        assert_eq!(
            issues.recv().await.unwrap(),
            MetricIssue {
                kind: MetricKind::ActiveEnergy,
                error: ProviderError::Query("boom".to_string()),
            }
        );
        assert!(issues.try_recv().is_err());
    }

    #[tokio::test]
    async fn weekly_failure_keeps_last_series() {
        let aggregator = aggregator(StaticProvider {
            status: AuthorizationStatus::Granted,
            steps: Some(1.0),
            energy: Ok(Some(1.0)),
            history: Err(ProviderError::Query("no history".to_string())),
        });
        aggregator.request_authorization().await.unwrap();
        aggregator
            .inner
            .weekly
            .publish(WeeklySeries([1, 2, 3, 4, 5, 6, 7]));

        let series = aggregator.fetch_weekly_series().await;

        assert_eq!(series, WeeklySeries([1, 2, 3, 4, 5, 6, 7]));
        assert_eq!(aggregator.state(), AggregatorState::Idle);
    }

    #[tokio::test]
    async fn denied_stays_unauthorized() {
        let aggregator = aggregator(StaticProvider {
            status: AuthorizationStatus::Denied,
            steps: Some(10.0),
            energy: Ok(Some(10.0)),
            history: Ok(Vec::new()),
        });

        assert_eq!(
            aggregator.request_authorization().await.unwrap(),
            AuthorizationStatus::Denied
        );
        assert_eq!(aggregator.fetch_current().await, CurrentMetrics::default());
        assert_eq!(aggregator.state(), AggregatorState::Unauthorized);
        assert_eq!(aggregator.energy_progress(), 0.0);
    }
}
