//! # hl-core
//!
//! Core domain models and business logic for Healthy Living.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! the record model, the optimistic overlay set, the derived view engine, the
//! weekly bucketizer and the ports implemented by adapters.

pub mod config;
pub mod ids;
pub mod metrics;
pub mod overlay;
pub mod ports;
pub mod record;
pub mod time;
pub mod view;

// Re-export commonly used types at the crate root
pub use config::AppConfig;
pub use ids::{OwnerId, RecordId};
pub use metrics::{AggregatorState, CurrentMetrics, WeeklySeries};
pub use overlay::PendingOverlay;
pub use record::{Category, NewRecord, Record, RecordDraft, Snapshot, ValidationError};
pub use view::{CategoryTotals, DerivedView, HistoryGroup};
