//! Healthy Living process bootstrap: tracing, configuration and wiring of the
//! in-process adapters into the application use cases.

pub mod bootstrap;
