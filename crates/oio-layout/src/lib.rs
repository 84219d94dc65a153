// Path: crates/oio-layout/src/lib.rs
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

//! # oio-layout
//!
//! Chunk layout generator: given a content size, a chunk
//! size, and a decoded `StoragePolicy`, allocates the ordered `Chunk` set a
//! PUT needs, pulling RAWX candidates from a caller-supplied
//! `RawxIterator`.

mod generator;

pub use generator::ChunkLayoutGenerator;
