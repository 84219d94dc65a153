// Path: crates/oio-api/src/lib.rs
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

//! # oio-api
//!
//! Core trait contracts for the control plane. Each subsystem crate
//! (`oio-conscience`, `oio-resolver`, `oio-meta2`, `oio-layout`,
//! `oio-upload`) implements the trait defined here for its component, so
//! that `oio-gateway` and `oio-node` can compose them behind `Arc<dyn Trait>`
//! following the same pattern used elsewhere for cross-crate trait
//! contracts: define the interface once, behind `Arc<dyn Trait>`, and let
//! each subsystem crate supply a concrete implementation.

/// The service registry / scoring contract.
pub mod conscience;
/// The directory resolver contract.
pub mod resolver;
/// The META2 container engine contract.
pub mod container;
/// The chunk layout generator contract.
pub mod layout;
/// The parallel HTTP upload engine contract.
pub mod upload;

pub mod prelude {
    pub use crate::conscience::{ServiceInfo, ServiceRegistry};
    pub use crate::container::ContainerEngine;
    pub use crate::layout::{LayoutGenerator, RawxIterator};
    pub use crate::resolver::DirectoryResolver;
    pub use crate::upload::UploadEngine;
}
