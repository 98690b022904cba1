//! # Application Dependencies
//!
//! Dependency grouping for App construction. Not a builder: no defaults, no
//! hidden logic, just the ports the use cases are built from.

use std::sync::Arc;

use hl_core::ports::{ClockPort, MetricsProviderPort, RecordStorePort};

/// All dependencies are required.
pub struct AppDeps {
    // Records
    pub record_store: Arc<dyn RecordStorePort>,

    // Metrics
    pub metrics_provider: Arc<dyn MetricsProviderPort>,

    // System
    pub clock: Arc<dyn ClockPort>,
}
