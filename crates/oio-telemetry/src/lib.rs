// Path: crates/oio-telemetry/src/lib.rs
//! # oio-telemetry
//!
//! Structured logging and Prometheus metrics wiring shared by every
//! binary in the workspace. Kept deliberately thin: subsystems register
//! their own metric families through `metrics::registry()` and emit their
//! own `tracing` spans/events; this crate only owns process-wide setup.

pub mod init;
pub mod metrics;

pub use init::init_tracing;
