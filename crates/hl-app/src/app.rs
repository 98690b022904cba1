use hl_core::config::AppConfig;

use crate::deps::AppDeps;
use crate::usecases::{MetricAggregator, RecordsFacade};

/// Application root: the records surface and the metrics aggregator.
pub struct App {
    pub records: RecordsFacade,
    pub metrics: MetricAggregator,
}

impl App {
    /// This constructor signature is the dependency manifest.
    pub fn new(deps: AppDeps, config: &AppConfig) -> Self {
        let AppDeps {
            record_store,
            metrics_provider,
            clock,
        } = deps;

        Self {
            records: RecordsFacade::new(
                record_store,
                clock.clone(),
                config.records.overlay_ttl(),
                config.records.sweep_interval(),
            ),
            metrics: MetricAggregator::new(
                metrics_provider,
                clock,
                config.metrics.daily_energy_target,
            ),
        }
    }
}
