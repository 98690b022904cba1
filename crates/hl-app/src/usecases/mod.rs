//! Business logic use cases
//!
//! [RecordStorePort]                    [MetricsProviderPort]
//!         ↓                                      ↓
//! RecordSubscription ── OptimisticOverlay   MetricAggregator
//!         ↓                  ↓                   ↓
//!        RecordsFacade (derived views)     current / weekly observables

pub mod metrics;
pub mod records;

pub use metrics::{MetricAggregator, MetricIssue};
pub use records::{
    AddRecord, AddRecordError, DeleteRecord, DeleteRecordError, RecordsFacade, SyncIssue,
};
