// Path: crates/oio-conscience/src/lib.rs
#![cfg_attr(
        not(test),
        deny(
            clippy::unwrap_used,
            clippy::expect_used,
            clippy::panic,
            clippy::unimplemented,
            clippy::todo,
            clippy::indexing_slicing
        )
    )]

//! # oio-conscience
//!
//! Service discovery and scoring plane: a
//! per-service-type registry of live services, each annotated with a score
//! recomputed from a configurable arithmetic expression over the service's
//! reported metrics.

/// Hand-written recursive-descent parser and evaluator for `score_expr`.
pub mod expr;
mod metrics;
/// The `ConscienceRegistry` itself, implementing `oio_api::conscience::ServiceRegistry`.
pub mod registry;

pub use registry::ConscienceRegistry;
