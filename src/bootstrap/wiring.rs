//! Assembles the application from the in-process adapters.

use std::sync::Arc;

use chrono::{DateTime, Days, TimeZone};
use hl_app::{App, AppDeps};
use hl_core::config::AppConfig;
use hl_core::metrics::{AuthorizationStatus, MetricKind};
use hl_core::ports::ClockPort;
use hl_core::time::start_of_day;
use hl_infra::{InMemoryMetricsProvider, InMemoryRecordStore, SystemClock};

/// The app plus the concrete adapters behind its ports.
pub struct WiredApp {
    pub app: App,
    pub record_store: Arc<InMemoryRecordStore>,
    pub metrics_provider: Arc<InMemoryMetricsProvider>,
    pub clock: Arc<dyn ClockPort>,
}

pub fn wire_app(config: &AppConfig) -> WiredApp {
    let record_store = Arc::new(InMemoryRecordStore::new());
    let metrics_provider = Arc::new(InMemoryMetricsProvider::new(AuthorizationStatus::Granted));
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);

    seed_activity(&metrics_provider, &clock.now_local());

    let app = App::new(
        AppDeps {
            record_store: record_store.clone(),
            metrics_provider: metrics_provider.clone(),
            clock: clock.clone(),
        },
        config,
    );

    WiredApp {
        app,
        record_store,
        metrics_provider,
        clock,
    }
}

/// A week of step samples and some energy for today, so the demo has numbers to show.
fn seed_activity<Tz: TimeZone>(provider: &InMemoryMetricsProvider, now: &DateTime<Tz>) {
    const DAILY_STEPS: [f64; 7] = [6400.0, 8120.0, 3050.0, 10240.0, 7300.0, 5600.0, 2150.0];

    let tz = now.timezone();
    let today = now.date_naive();
    for (days_ago, steps) in (0..7u64).rev().zip(DAILY_STEPS) {
        let Some(day) = today.checked_sub_days(Days::new(days_ago)) else {
            continue;
        };
        provider.record_sample(MetricKind::StepCount, start_of_day(day, &tz), steps);
    }
    provider.record_sample(MetricKind::ActiveEnergy, start_of_day(today, &tz), 180.5);
}
