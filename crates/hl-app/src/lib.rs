//! Healthy Living Application Orchestration Layer
//!
//! This crate contains the use cases that keep the record mirror and the
//! metric aggregates up to date, and the observables the UI reads from.

pub mod app;
pub mod deps;
pub mod join;
pub mod observable;
pub mod usecases;

pub use app::App;
pub use deps::AppDeps;
pub use observable::Observable;
pub use usecases::{MetricAggregator, RecordsFacade};
