//! # Configuration DTO
//!
//! Plain data mapped from the TOML config file. Loading the file is the
//! bootstrap's job; defaults live in [`defaults`](self::defaults).

mod defaults;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ids::OwnerId;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub records: RecordsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordsConfig {
    /// How long a requested delete hides a record without store confirmation.
    pub overlay_ttl_ms: u64,

    /// Period of the overlay expiry sweep.
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Daily active-energy target (kcal) used for goal progress.
    pub daily_energy_target: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Owner whose records are mirrored at startup. Empty means "not signed in".
    pub owner_id: String,
}

impl AppConfig {
    /// Maps a parsed TOML document onto the config. Missing sections keep their defaults.
    pub fn from_toml(toml_value: toml::Value) -> anyhow::Result<Self> {
        Ok(toml_value.try_into()?)
    }
}

impl RecordsConfig {
    pub fn overlay_ttl(&self) -> Duration {
        Duration::from_millis(self.overlay_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl SessionConfig {
    pub fn owner(&self) -> Option<OwnerId> {
        let owner = self.owner_id.trim();
        (!owner.is_empty()).then(|| OwnerId::from(owner))
    }
}
