// Path: crates/oio-types/src/lib.rs
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

//! # oio-types
//!
//! Core data structures shared by every component of the control plane:
//! the container entity model (§3), the storage-policy grammar (§4.4), the
//! configuration structs loaded by `oio-node`, and the error taxonomy (§7)
//! that every other crate's errors convert into.

/// Alias / Content / Chunk / Property entities and the bean enum that wraps them.
pub mod entity;
/// Chunk position encoding (`M`, `M.S`, `M.pS`) — strict parse/format.
pub mod position;
/// Storage policy grammar (`type`, `COPY_COUNT`, `DISTANCE`, `K`, `M`, `ALGO`).
pub mod policy;
/// Versioning policy semantics shared by META2 and the gateway.
pub mod versioning;
/// Configuration structs for every subsystem, loaded from TOML by `oio-node`.
pub mod config;
/// The unified error taxonomy and the `ErrorCode` trait.
pub mod error;
/// Small helpers: random content ids, hex rendering, timestamps.
pub mod ids;

/// A curated set of the most commonly used types.
pub mod prelude {
    pub use crate::entity::{Alias, Bean, Chunk, Content, Property};
    pub use crate::error::{ErrorCode, OioError};
    pub use crate::ids::ContentId;
    pub use crate::policy::{PolicyType, StoragePolicy};
    pub use crate::position::ChunkPosition;
    pub use crate::versioning::VersioningPolicy;
}
