//! Runtime glue: validated client configuration and tracing/metrics
//! reporting.

pub mod config;
pub mod telemetry;
