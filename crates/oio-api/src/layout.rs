// Path: crates/oio-api/src/layout.rs
use oio_types::entity::{ChunkShell, ContentShell};
use oio_types::error::LayoutError;
use oio_types::policy::StoragePolicy;

/// A candidate RAWX destination yielded by the conscience registry for a
/// given position, subject to the `distance`/`storage_class` constraint
///.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawxCandidate {
    pub addr: String,
}

/// A pull-based source of RAWX candidates, in production backed by the
/// conscience registry's `list("rawx",..)`.
pub trait RawxIterator {
    /// Returns up to `count` distinct candidates satisfying `distance` and
    /// `storage_class`, or `None` once exhausted.
    fn next_candidates(
        &mut self,
        count: u32,
        distance: u32,
        storage_class: &str,
    ) -> Option<Vec<RawxCandidate>>;
}

/// The chunk layout generator contract.
pub trait LayoutGenerator {
    /// Allocates a `Content` + ordered `Chunk` set for a write of
    /// `content_size` bytes under `policy`, pulling RAWX destinations from
    /// `rawx`.
    fn generate(
        &self,
        content_size: i64,
        chunk_size: i64,
        policy: &StoragePolicy,
        rawx: &mut dyn RawxIterator,
    ) -> Result<(ContentShell, Vec<ChunkShell>), LayoutError>;
}
