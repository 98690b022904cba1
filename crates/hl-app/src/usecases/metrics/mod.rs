pub mod aggregator;

pub use aggregator::{MetricAggregator, MetricIssue};
