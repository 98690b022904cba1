use super::*;

/// Hide window for a requested delete.
pub const DEFAULT_OVERLAY_TTL_MS: u64 = 500;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 250;
pub const DEFAULT_DAILY_ENERGY_TARGET: u64 = 500;

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            overlay_ttl_ms: DEFAULT_OVERLAY_TTL_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            daily_energy_target: DEFAULT_DAILY_ENERGY_TARGET,
        }
    }
}
