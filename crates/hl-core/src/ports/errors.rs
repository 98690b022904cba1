use thiserror::Error;

/// Failures reported by the remote collection store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Other(String),
}

/// Failures reported by the metrics provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("metrics are not available on this device")]
    NotAvailable,

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("query failed: {0}")]
    Query(String),
}
