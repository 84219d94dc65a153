// Path: crates/oio-meta2/src/pool.rs
//! Per-container connection pools and the writer lock that serializes
//! transactions on each container.

use crate::schema;
use dashmap::DashMap;
use oio_types::error::ContainerError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// A container's pool plus its single writer lock. Reads go through the pool
/// directly (SQLite's WAL journal mode allows concurrent readers); writes
/// acquire `writer` for the whole transaction.
pub struct ContainerHandle {
    pub pool: SqlitePool,
    pub writer: AsyncMutex<()>,
}

/// Opens (creating if needed) the per-container SQLite database and caches
/// the resulting handle, one pool per container, so repeated access never
/// reopens the file.
pub struct ContainerPools {
    data_dir: PathBuf,
    handles: DashMap<String, Arc<ContainerHandle>>,
}

impl ContainerPools {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            handles: DashMap::new(),
        }
    }

    fn db_path(&self, container_id: &str) -> PathBuf {
        self.data_dir.join(format!("{container_id}.sqlite"))
    }

    /// Returns the handle for an existing container, erroring
    /// `CONTAINER_NOTFOUND` if it has never been created.
    pub async fn open_existing(
        &self,
        container_id: &str,
    ) -> Result<Arc<ContainerHandle>, ContainerError> {
        if let Some(handle) = self.handles.get(container_id) {
            return Ok(handle.clone());
        }
        if !self.db_path(container_id).exists() {
            return Err(ContainerError::ContainerNotFound);
        }
        self.open_or_create(container_id, false).await
    }

    /// Returns the handle for a container, creating its database file and
    /// schema if it does not yet exist.
    pub async fn open_or_create(
        &self,
        container_id: &str,
        create: bool,
    ) -> Result<Arc<ContainerHandle>, ContainerError> {
        if let Some(handle) = self.handles.get(container_id) {
            return Ok(handle.clone());
        }
        let path = self.db_path(container_id);
        if !create && !path.exists() {
            return Err(ContainerError::ContainerNotFound);
        }
        std::fs::create_dir_all(&self.data_dir)
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        let pool = open_pool(&path).await?;
        schema::create_all(&pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        let handle = Arc::new(ContainerHandle {
                pool,
                writer: AsyncMutex::new(()),
            });
        self.handles
        .insert(container_id.to_string(), handle.clone());
        Ok(handle)
    }

    pub fn exists(&self, container_id: &str) -> bool {
        self.handles.contains_key(container_id) || self.db_path(container_id).exists()
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    /// Permanently removes a container's database (used by `destroy`).
    pub fn destroy(&self, container_id: &str) -> Result<(), ContainerError> {
        self.handles.remove(container_id);
        let path = self.db_path(container_id);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| ContainerError::Backend(e.to_string()))?;
        }
        Ok(())
    }
}

async fn open_pool(path: &Path) -> Result<SqlitePool, ContainerError> {
    let url = format!("sqlite://{}", path.display());
    let options = SqliteConnectOptions::from_str(&url)
    .map_err(|e| ContainerError::Backend(e.to_string()))?
    .create_if_missing(true)
    .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
    .foreign_keys(true);
    SqlitePoolOptions::new()
    .max_connections(8)
    .connect_with(options)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}
