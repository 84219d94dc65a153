// Path: crates/oio-meta2/src/lib.rs
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

//! # oio-meta2
//!
//! The META2 container metadata engine: one SQLite database
//! per container holds its Alias/Content/Chunk/Property/admin tables.
//! `Meta2Engine` implements `oio_api::container::ContainerEngine` over a pool
//! of per-container `sqlx::SqlitePool` handles, each guarded by its own
//! writer lock so that every write is serialized per container, not
//! process-wide.

mod admin;
pub mod engine;
mod metrics;
mod pool;
mod rows;
mod schema;

pub use admin::{AdminTable, KEY_STORAGE_POLICY, KEY_VERSIONING_POLICY};
pub use engine::{ContainerInfo, Meta2Engine};
pub use pool::{ContainerHandle, ContainerPools};
