use async_trait::async_trait;

use super::errors::ProviderError;
use crate::metrics::{AuthorizationStatus, BucketSize, DateRange, MetricBucket, MetricKind};

/// External metrics provider, usually the platform health store.
#[async_trait]
pub trait MetricsProviderPort: Send + Sync {
    /// Asks the user for read access to the step and energy metrics.
    async fn request_authorization(&self) -> Result<AuthorizationStatus, ProviderError>;

    /// Cumulative sum of `kind` over `range`. `Ok(None)` when there are no samples.
    async fn query_cumulative(
        &self,
        kind: MetricKind,
        range: DateRange,
    ) -> Result<Option<f64>, ProviderError>;

    /// Per-bucket sums of `kind` over `range`, ordered by bucket start.
    async fn query_windowed(
        &self,
        kind: MetricKind,
        range: DateRange,
        bucket: BucketSize,
    ) -> Result<Vec<MetricBucket>, ProviderError>;
}
