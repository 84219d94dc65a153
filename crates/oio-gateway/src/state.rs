// Path: crates/oio-gateway/src/state.rs
//! Shared application state composing the five control-plane components
//! behind the REST surface.

use oio_api::conscience::ServiceRegistry;
use oio_api::resolver::DirectoryResolver;
use oio_api::upload::{UploadEngine, UploadTimeouts};
use oio_layout::ChunkLayoutGenerator;
use oio_meta2::Meta2Engine;
use oio_types::policy::StoragePolicy;
use std::sync::Arc;

/// `Meta2Engine` and `ChunkLayoutGenerator` are held concrete rather than
/// behind `Arc<dyn..>`: the gateway needs `Meta2Engine`'s inherent admin
/// methods (`create_container`, `describe`,...) that are not part of the
/// `ContainerEngine` trait object, and `ChunkLayoutGenerator::generate`
/// takes a caller-supplied `&mut dyn RawxIterator` the gateway must
/// construct from the registry, so there is no benefit to erasing the type.
#[derive(Clone)]
pub struct AppState {
    pub namespace: String,
    pub registry: Arc<dyn ServiceRegistry>,
    pub resolver: Arc<dyn DirectoryResolver>,
    pub containers: Arc<Meta2Engine>,
    pub layout: Arc<ChunkLayoutGenerator>,
    pub uploader: Arc<dyn UploadEngine>,
    pub default_policy: StoragePolicy,
    pub default_chunk_size: i64,
    pub max_redirects: u32,
    pub upload_timeouts: UploadTimeouts,
    /// Minimum number of destinations that must succeed for a PUT to be
    /// committed to META2; fewer than this and the upload as a whole fails
    /// with `PolicyNotSatisfiable`.
    pub upload_min_success: usize,
}
