// Path: crates/oio-upload/src/lib.rs
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

//! # oio-upload
//!
//! Parallel HTTP upload engine: streams one bounded-length
//! payload concurrently to N HTTP PUT destinations, computing a streaming
//! MD5 over the source once and accumulating per-destination outcomes.

mod engine;
mod metrics;

pub use engine::HttpUploadEngine;
