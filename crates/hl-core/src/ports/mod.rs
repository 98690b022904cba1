//! Port interfaces for the application layer
//!
//! Ports define the contract between the application logic (use cases)
//! and infrastructure implementations. The remote collection store and the
//! metrics provider are external collaborators; the core only ever talks to
//! them through these traits.

mod clock;
pub mod errors;
pub mod metrics_provider;
pub mod record_store;

pub use clock::ClockPort;
pub use errors::{ProviderError, StoreError};
pub use metrics_provider::MetricsProviderPort;
pub use record_store::{RecordStorePort, SnapshotEvent, SnapshotReceiver};
