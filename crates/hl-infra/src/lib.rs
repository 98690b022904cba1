//! In-process adapters for the Healthy Living ports.

pub mod metrics;
pub mod store;
pub mod time;

pub use metrics::InMemoryMetricsProvider;
pub use store::InMemoryRecordStore;
pub use time::{ManualClock, SystemClock};
