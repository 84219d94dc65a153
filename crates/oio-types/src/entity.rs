// Path: crates/oio-types/src/entity.rs
use crate::ids::{ChunkHash, ContentId};
use crate::position::ChunkPosition;
use serde::{Deserialize, Serialize};

/// A named pointer (per container) to a `Content`; carries version and the
/// tombstone flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub name: String,
    pub version: i64,
    pub deleted: bool,
    pub ctime: i64,
    pub content_id: ContentId,
    /// Opaque metadata-system string mirrored from the request; not
    /// interpreted by the engine itself.
    pub mdsys: String,
}

impl Alias {
    /// `true` iff this alias row is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.deleted
    }
}

/// Immutable blob of metadata about an uploaded object, addressed by
/// `content_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub id: ContentId,
    pub size: i64,
    pub policy: String,
    pub chunk_method: String,
    pub mime_type: String,
    pub hash: Option<Vec<u8>>,
    pub ctime: i64,
}

/// One network-addressable fragment stored on a RAWX server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub position: ChunkPosition,
    pub hash: Option<ChunkHash>,
    pub size: i64,
    pub ctime: i64,
    pub content_id: ContentId,
}

/// A key/value pair bound to a specific `(alias, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub alias_name: String,
    pub version: i64,
    pub key: String,
    pub value: Vec<u8>,
}

/// A tagged variant wrapping any of the four row-shaped entities — the
/// generalization of the reference implementation's opaque "bean" pointer
///.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Bean {
    Alias(Alias),
    Content(Content),
    Chunk(Chunk),
    Property(Property),
}

/// The input bean set for a PUT/APPEND request: one alias+content shell,
/// plus the chunks allocated for it. Beans arrive with `content_id` left
/// unset by the caller; the engine fills it in.
#[derive(Debug, Clone)]
pub struct BeanSet {
    pub alias_name: String,
    pub mdsys: String,
    pub content: ContentShell,
    pub chunks: Vec<ChunkShell>,
}

/// A `Content` row without its final id/ctime, as supplied by a caller
/// building a PUT/APPEND request.
#[derive(Debug, Clone)]
pub struct ContentShell {
    pub size: i64,
    pub policy: Option<String>,
    pub chunk_method: String,
    pub mime_type: String,
    pub hash: Option<Vec<u8>>,
}

/// A `Chunk` row without its final `content_id`, as supplied by the layout
/// generator or a caller building a PUT/APPEND request.
#[derive(Debug, Clone)]
pub struct ChunkShell {
    pub id: String,
    pub position: ChunkPosition,
    pub hash: Option<ChunkHash>,
    pub size: i64,
}
