// Path: crates/oio-meta2/src/rows.rs
//! `sqlx::FromRow` wire structs and their conversion into `oio_types::entity`
//! values. Kept separate from `engine.rs` so the SQL/entity boundary has one
//! obvious home, the way `harborgrid-justin-caddy`'s `saas::tenant` module
//! keeps its `#[derive(sqlx::FromRow)]` struct next to its domain type.

use oio_types::entity::{Alias, Chunk, Content, Property};
use oio_types::error::ContainerError;
use oio_types::ids::{ChunkHash, ContentId};
use oio_types::position::ChunkPosition;
use std::str::FromStr;

#[derive(sqlx::FromRow)]
pub struct AliasRow {
    pub alias: String,
    pub version: i64,
    pub deleted: i64,
    pub ctime: i64,
    pub mdsys: String,
    pub content_id: Vec<u8>,
}

impl AliasRow {
    pub fn into_entity(self) -> Result<Alias, ContainerError> {
        Ok(Alias {
                name: self.alias,
                version: self.version,
                deleted: self.deleted != 0,
                ctime: self.ctime,
                content_id: content_id_from_blob(&self.content_id)?,
                mdsys: self.mdsys,
            })
    }
}

#[derive(sqlx::FromRow)]
pub struct ContentRow {
    pub id: Vec<u8>,
    pub size: i64,
    pub policy: String,
    pub chunk_method: String,
    pub mime_type: String,
    pub hash: Option<Vec<u8>>,
    pub ctime: i64,
}

impl ContentRow {
    pub fn into_entity(self) -> Result<Content, ContainerError> {
        Ok(Content {
                id: content_id_from_blob(&self.id)?,
                size: self.size,
                policy: self.policy,
                chunk_method: self.chunk_method,
                mime_type: self.mime_type,
                hash: self.hash,
                ctime: self.ctime,
            })
    }
}

#[derive(sqlx::FromRow)]
pub struct ChunkRow {
    pub id: String,
    pub position: String,
    pub hash: Option<Vec<u8>>,
    pub size: i64,
    pub ctime: i64,
    pub content_id: Vec<u8>,
}

impl ChunkRow {
    pub fn into_entity(self) -> Result<Chunk, ContainerError> {
        let position = ChunkPosition::from_str(&self.position)
        .map_err(|e| ContainerError::Backend(format!("corrupt chunk position: {e}")))?;
        let hash = match self.hash {
            Some(bytes) if bytes.len() == 16 => {
                let mut buf = [0u8; 16];
                buf.copy_from_slice(&bytes);
                Some(ChunkHash(buf))
            }
            Some(_) => None,
            None => None,
        };
        Ok(Chunk {
                id: self.id,
                position,
                hash,
                size: self.size,
                ctime: self.ctime,
                content_id: content_id_from_blob(&self.content_id)?,
            })
    }
}

#[derive(sqlx::FromRow)]
pub struct PropertyRow {
    pub alias: String,
    pub version: i64,
    pub key: String,
    pub value: Vec<u8>,
}

impl PropertyRow {
    pub fn into_entity(self) -> Property {
        Property {
            alias_name: self.alias,
            version: self.version,
            key: self.key,
            value: self.value,
        }
    }
}

pub fn content_id_from_blob(blob: &[u8]) -> Result<ContentId, ContainerError> {
    if blob.len() != 32 {
        return Err(ContainerError::Backend(format!(
                    "corrupt content_id length {}",
                    blob.len()
                )));
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(blob);
    Ok(ContentId(buf))
}
