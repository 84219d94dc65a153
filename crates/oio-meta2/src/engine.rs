// Path: crates/oio-meta2/src/engine.rs
//! The META2 container metadata engine: `Meta2Engine`
//! implements `oio_api::container::ContainerEngine` over one SQLite database
//! per container.

use crate::admin::{self, AdminTable};
use crate::pool::{ContainerHandle, ContainerPools};
use crate::rows::{content_id_from_blob, AliasRow, ChunkRow, ContentRow, PropertyRow};
use async_trait::async_trait;
use oio_api::container::{
    ContainerEngine, DedupReport, GetResult, ListRequest, ListResult, ReadFlags, WriteRequest,
    WriteResult,
};
use oio_types::entity::{Alias, Bean};
use oio_types::error::ContainerError;
use oio_types::ids::{now_secs, ContentId};
use oio_types::position::ChunkPosition;
use oio_types::versioning::VersioningPolicy;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

pub struct Meta2Engine {
    pools: ContainerPools,
    default_max_versions: i64,
    retention_delay_secs: i64,
}

impl Meta2Engine {
    pub fn new(data_dir: PathBuf, default_max_versions: i64, retention_delay_secs: i64) -> Self {
        Self {
            pools: ContainerPools::new(data_dir),
            default_max_versions,
            retention_delay_secs,
        }
    }

    /// Creates a brand-new container's database and admin rows. Returns
    /// `true` if it was actually created, `false` if it already existed
    ///.
    pub async fn create_container(
        &self,
        container_id: &str,
        namespace: &str,
        account: &str,
        user: &str,
        versioning_policy_raw: Option<i64>,
        storage_policy: Option<&str>,
    ) -> Result<bool, ContainerError> {
        if self.pools.exists(container_id) {
            return Ok(false);
        }
        let handle = self.pools.open_or_create(container_id, true).await?;
        crate::metrics::set_containers_open(self.pools.open_count() as i64);
        admin::initialize(
            &handle.pool,
            namespace,
            account,
            user,
            versioning_policy_raw.unwrap_or(self.default_max_versions),
            storage_policy.unwrap_or("SINGLE"),
            now_secs(),
        )
        .await?;
        Ok(true)
    }

    pub fn destroy_container(&self, container_id: &str) -> Result<(), ContainerError> {
        self.pools.destroy(container_id)
    }

    /// Returns `true` if the container's database already exists on disk or
    /// in the open-handle cache, without opening a connection.
    pub fn container_exists(&self, container_id: &str) -> bool {
        self.pools.exists(container_id)
    }

    /// Reads the container's admin key/value rows into a REST-friendly
    /// snapshot.
    pub async fn describe(&self, container_id: &str) -> Result<ContainerInfo, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let admin = AdminTable::new(&handle.pool);
        Ok(ContainerInfo {
                container_id: container_id.to_string(),
                namespace: admin.get(admin::KEY_NAMESPACE).await?.unwrap_or_default(),
                account: admin.get(admin::KEY_ACCOUNT).await?.unwrap_or_default(),
                user: admin.get(admin::KEY_USER).await?.unwrap_or_default(),
                ctime: admin.get_i64(admin::KEY_CTIME, 0).await?,
                version: admin.get_i64(admin::KEY_VERSION, 0).await?,
                size: admin.size().await?,
                quota: admin.get_i64(admin::KEY_QUOTA, -1).await?,
                versioning_policy: admin.get_i64(admin::KEY_VERSIONING_POLICY, -1).await?,
                storage_policy: admin.storage_policy_name().await?,
                status: admin.get(admin::KEY_STATUS).await?.unwrap_or_else(|| "enabled".to_string()),
            })
    }
}

/// A REST-friendly snapshot of a container's admin state, returned by `container/show`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ContainerInfo {
    pub container_id: String,
    pub namespace: String,
    pub account: String,
    pub user: String,
    pub ctime: i64,
    pub version: i64,
    pub size: i64,
    pub quota: i64,
    pub versioning_policy: i64,
    pub storage_policy: String,
    pub status: String,
}

// --- row-level query helpers, free functions over a pool -------------------

async fn fetch_latest_alias(
    pool: &SqlitePool,
    alias_name: &str,
) -> Result<Option<AliasRow>, ContainerError> {
    sqlx::query_as::<_, AliasRow>(
        "SELECT alias, version, deleted, ctime, mdsys, content_id FROM alias \
        WHERE alias = ? ORDER BY version DESC LIMIT 1",
    )
    .bind(alias_name)
    .fetch_optional(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

async fn fetch_alias_at_version(
    pool: &SqlitePool,
    alias_name: &str,
    version: i64,
) -> Result<Option<AliasRow>, ContainerError> {
    sqlx::query_as::<_, AliasRow>(
        "SELECT alias, version, deleted, ctime, mdsys, content_id FROM alias \
        WHERE alias = ? AND version = ?",
    )
    .bind(alias_name)
    .bind(version)
    .fetch_optional(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

async fn fetch_all_versions(
    pool: &SqlitePool,
    alias_name: &str,
) -> Result<Vec<AliasRow>, ContainerError> {
    sqlx::query_as::<_, AliasRow>(
        "SELECT alias, version, deleted, ctime, mdsys, content_id FROM alias \
        WHERE alias = ? ORDER BY version ASC",
    )
    .bind(alias_name)
    .fetch_all(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

async fn fetch_content(
    pool: &SqlitePool,
    id: &ContentId,
) -> Result<Option<ContentRow>, ContainerError> {
    sqlx::query_as::<_, ContentRow>(
        "SELECT id, size, policy, chunk_method, mime_type, hash, ctime FROM content WHERE id = ?",
    )
    .bind(id.0.to_vec())
    .fetch_optional(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

async fn fetch_chunks(pool: &SqlitePool, id: &ContentId) -> Result<Vec<ChunkRow>, ContainerError> {
    sqlx::query_as::<_, ChunkRow>(
        "SELECT id, position, hash, size, ctime, content_id FROM chunk WHERE content_id = ?",
    )
    .bind(id.0.to_vec())
    .fetch_all(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

async fn fetch_properties(
    pool: &SqlitePool,
    alias_name: &str,
    version: i64,
) -> Result<Vec<PropertyRow>, ContainerError> {
    sqlx::query_as::<_, PropertyRow>(
        "SELECT alias, version, key, value FROM property WHERE alias = ? AND version = ?",
    )
    .bind(alias_name)
    .bind(version)
    .fetch_all(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))
}

/// Real-delete closure: always drops the alias row; drops the Content only
/// if no other alias still references it; if the Content is dropped, drops
/// its Chunks too. Returns the
/// freed Content's size, or 0 if the Content is still referenced elsewhere.
async fn real_delete_closure(pool: &SqlitePool, alias: &AliasRow) -> Result<i64, ContainerError> {
    sqlx::query("DELETE FROM alias WHERE alias = ? AND version = ?")
    .bind(&alias.alias)
    .bind(alias.version)
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    sqlx::query("DELETE FROM property WHERE alias = ? AND version = ?")
    .bind(&alias.alias)
    .bind(alias.version)
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;

    let remaining: i64 = sqlx::query("SELECT COUNT(*) AS c FROM alias WHERE content_id = ?")
    .bind(&alias.content_id)
    .fetch_one(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?
    .get("c");

    if remaining > 0 {
        return Ok(0);
    }
    let content_size: Option<i64> = sqlx::query("SELECT size FROM content WHERE id = ?")
    .bind(&alias.content_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?
    .map(|r| r.get("size"));
    let Some(size) = content_size else {
        return Ok(0);
    };
    sqlx::query("DELETE FROM chunk WHERE content_id = ?")
    .bind(&alias.content_id)
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    sqlx::query("DELETE FROM content WHERE id = ?")
    .bind(&alias.content_id)
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    Ok(size)
}

/// Recomputes container size from scratch: Σ `Content.size` over every
/// non-tombstone alias row.
async fn recompute_size(pool: &SqlitePool) -> Result<i64, ContainerError> {
    let size: i64 = sqlx::query(
        "SELECT COALESCE(SUM(c.size), 0) AS s FROM alias a \
        JOIN content c ON a.content_id = c.id WHERE a.deleted = 0",
    )
    .fetch_one(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?
    .get("s");
    AdminTable::new(pool).set_i64(admin::KEY_SIZE, size).await?;
    Ok(size)
}

/// Cascade-prunes Property/Content/Chunk rows no longer reachable from any
/// Alias row.
async fn cascade_prune(pool: &SqlitePool) -> Result<(), ContainerError> {
    sqlx::query(
        "DELETE FROM property WHERE NOT EXISTS \
        (SELECT 1 FROM alias a WHERE a.alias = property.alias AND a.version = property.version)",
    )
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    sqlx::query(
        "DELETE FROM chunk WHERE NOT EXISTS \
        (SELECT 1 FROM content c WHERE c.id = chunk.content_id)",
    )
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    sqlx::query(
        "DELETE FROM content WHERE NOT EXISTS \
        (SELECT 1 FROM alias a WHERE a.content_id = content.id)",
    )
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    Ok(())
}

async fn insert_content(
    pool: &SqlitePool,
    id: &ContentId,
    size: i64,
    policy: &str,
    chunk_method: &str,
    mime_type: &str,
    hash: Option<&[u8]>,
    ctime: i64,
) -> Result<(), ContainerError> {
    sqlx::query(
        "INSERT INTO content(id, size, policy, chunk_method, mime_type, hash, ctime) \
        VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.0.to_vec())
    .bind(size)
    .bind(policy)
    .bind(chunk_method)
    .bind(mime_type)
    .bind(hash)
    .bind(ctime)
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    Ok(())
}

async fn insert_chunk(
    pool: &SqlitePool,
    id: &str,
    position: &ChunkPosition,
    hash: Option<&[u8]>,
    size: i64,
    ctime: i64,
    content_id: &ContentId,
) -> Result<(), ContainerError> {
    sqlx::query(
        "INSERT OR REPLACE INTO chunk(id, position, hash, size, ctime, content_id) \
        VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(position.to_string())
    .bind(hash)
    .bind(size)
    .bind(ctime)
    .bind(content_id.0.to_vec())
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    Ok(())
}

async fn insert_alias(
    pool: &SqlitePool,
    alias_name: &str,
    version: i64,
    deleted: bool,
    ctime: i64,
    mdsys: &str,
    content_id: &ContentId,
) -> Result<(), ContainerError> {
    sqlx::query(
        "INSERT OR REPLACE INTO alias(alias, version, deleted, ctime, mdsys, content_id) \
        VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(alias_name)
    .bind(version)
    .bind(deleted as i64)
    .bind(ctime)
    .bind(mdsys)
    .bind(content_id.0.to_vec())
    .execute(pool)
    .await
    .map_err(|e| ContainerError::Backend(e.to_string()))?;
    Ok(())
}

/// Performs the PUT algorithm against an
/// already-locked handle. Shared by `ContainerEngine::put` and by
/// `ContainerEngine::append`'s "degrades to PUT" path.
async fn put_locked(
    handle: &ContainerHandle,
    req: &WriteRequest,
) -> Result<WriteResult, ContainerError> {
    let pool = &handle.pool;
    let admin = AdminTable::new(pool);
    let versioning = admin.versioning_policy().await?;
    let policy_name = match &req.beans.content.policy {
        Some(p) => p.clone(),
        None => admin.storage_policy_name().await?,
    };
    let now = now_secs();
    let content_id = ContentId::random();
    let latest = fetch_latest_alias(pool, &req.beans.alias_name).await?;

    let mut purge_previous: Option<AliasRow> = None;
    let new_version = match &latest {
        None => 0,
        Some(prev) => match versioning {
            VersioningPolicy::Disabled => {
                if prev.deleted != 0 {
                    purge_previous = Some(clone_alias_row(prev));
                    0
                } else {
                    return Err(ContainerError::ContentExists);
                }
            }
            VersioningPolicy::Suspended => {
                purge_previous = Some(clone_alias_row(prev));
                0
            }
            VersioningPolicy::Bounded(_) | VersioningPolicy::Unlimited => prev.version + 1,
        },
    };

    insert_content(
        pool,
        &content_id,
        req.beans.content.size,
        &policy_name,
        &req.beans.content.chunk_method,
        &req.beans.content.mime_type,
        req.beans.content.hash.as_deref(),
        now,
    )
    .await?;
    for chunk in &req.beans.chunks {
        insert_chunk(
            pool,
            &chunk.id,
            &chunk.position,
            chunk.hash.as_ref().map(|h| h.0.as_slice()),
            chunk.size,
            now,
            &content_id,
        )
        .await?;
    }
    insert_alias(
        pool,
        &req.beans.alias_name,
        new_version,
        false,
        now,
        &req.beans.mdsys,
        &content_id,
    )
    .await?;

    let mut purged_previous = false;
    if let Some(prev) = purge_previous {
        real_delete_closure(pool, &prev).await?;
        purged_previous = true;
    }

    if let VersioningPolicy::Bounded(max) = versioning {
        sweep_exceeding_for_alias(pool, &req.beans.alias_name, max).await?;
    }
    cascade_prune(pool).await?;
    recompute_size(pool).await?;
    admin.bump_version().await?;

    Ok(WriteResult {
            alias_name: req.beans.alias_name.clone(),
            version: new_version,
            content_id,
            purged_previous,
        })
}

fn clone_alias_row(row: &AliasRow) -> AliasRow {
    AliasRow {
        alias: row.alias.clone(),
        version: row.version,
        deleted: row.deleted,
        ctime: row.ctime,
        mdsys: row.mdsys.clone(),
        content_id: row.content_id.clone(),
    }
}

/// Drops the `count - max` oldest alias rows for one name once its version
/// count exceeds `max`.
async fn sweep_exceeding_for_alias(
    pool: &SqlitePool,
    alias_name: &str,
    max: u32,
) -> Result<(), ContainerError> {
    let rows = fetch_all_versions(pool, alias_name).await?;
    if rows.len() <= max as usize {
        return Ok(());
    }
    let excess = rows.len() - max as usize;
    for row in rows.into_iter().take(excess) {
        real_delete_closure(pool, &row).await?;
    }
    Ok(())
}

#[async_trait]
impl ContainerEngine for Meta2Engine {
    async fn get(
        &self,
        container_id: &str,
        alias_name: &str,
        version: Option<i64>,
        flags: ReadFlags,
    ) -> Result<GetResult, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let pool = &handle.pool;

        let mut alias_rows: Vec<AliasRow> = if let Some(v) = version {
            match fetch_alias_at_version(pool, alias_name, v).await? {
                Some(row) => vec![row],
                None => return Err(ContainerError::ContentNotFound),
            }
        } else if flags.contains(ReadFlags::ALLVERSION) {
            let rows = fetch_all_versions(pool, alias_name).await?;
            if rows.is_empty() {
                return Err(ContainerError::ContentNotFound);
            }
            rows
        } else {
            match fetch_latest_alias(pool, alias_name).await? {
                Some(row) => vec![row],
                None => return Err(ContainerError::ContentNotFound),
            }
        };

        if flags.contains(ReadFlags::NODELETED) {
            if flags.contains(ReadFlags::ALLVERSION) {
                alias_rows.retain(|r| r.deleted == 0);
                if alias_rows.is_empty() {
                    return Err(ContainerError::ContentNotFound);
                }
            } else if alias_rows.first().map(|r| r.deleted != 0).unwrap_or(false) {
                return Err(ContainerError::ContentNotFound);
            }
        }

        let mut aliases = Vec::new();
        let mut beans = Vec::new();
        for row in alias_rows {
            let content_id = content_id_from_blob(&row.content_id)?;
            let name = row.alias.clone();
            let alias_version = row.version;
            let alias_entity: Alias = row.into_entity()?;
            aliases.push(alias_entity.clone());
            beans.push(Bean::Alias(alias_entity));

            if flags.contains(ReadFlags::HEADERS) {
                if let Some(content_row) = fetch_content(pool, &content_id).await? {
                    beans.push(Bean::Content(content_row.into_entity()?));
                }
            }
            if !flags.contains(ReadFlags::NORECURSION) {
                for chunk_row in fetch_chunks(pool, &content_id).await? {
                    beans.push(Bean::Chunk(chunk_row.into_entity()?));
                }
            }
            if !flags.contains(ReadFlags::NOPROPS) {
                for prop_row in fetch_properties(pool, &name, alias_version).await? {
                    beans.push(Bean::Property(prop_row.into_entity()));
                }
            }
        }

        crate::metrics::record_operation("get", "ok");
        Ok(GetResult { aliases, beans })
    }

    async fn put(&self, req: WriteRequest) -> Result<WriteResult, ContainerError> {
        let handle = if req.autocreate {
            self.pools.open_or_create(&req.container_id, true).await?
        } else {
            self.pools.open_existing(&req.container_id).await?
        };
        let _guard = handle.writer.lock().await;
        let result = put_locked(&handle, &req).await;
        crate::metrics::record_operation("put", if result.is_ok() { "ok" } else { "error" });
        result
    }

    async fn append(&self, req: WriteRequest) -> Result<WriteResult, ContainerError> {
        let handle = if req.autocreate {
            self.pools.open_or_create(&req.container_id, true).await?
        } else {
            self.pools.open_existing(&req.container_id).await?
        };
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;
        let admin = AdminTable::new(pool);

        let latest = fetch_latest_alias(pool, &req.beans.alias_name).await?;
        let degrades_to_put = match &latest {
            None => true,
            Some(row) => row.deleted != 0,
        };
        if degrades_to_put {
            return put_locked(&handle, &req).await;
        }
        let prev = latest.ok_or(ContainerError::ContentNotFound)?;
        let prev_content_id = content_id_from_blob(&prev.content_id)?;
        let prev_content = fetch_content(pool, &prev_content_id)
        .await?
        .ok_or(ContainerError::ContentNotFound)?;
        let prev_chunks = fetch_chunks(pool, &prev_content_id).await?;

        let old_max = prev_chunks
        .iter()
        .filter_map(|c| ChunkPosition::from_str(&c.position).ok())
        .map(|p| p.metachunk)
        .max();
        let next_base = old_max.map(|m| m + 1).unwrap_or(0);

        let versioning = admin.versioning_policy().await?;
        let now = now_secs();
        let new_content_id = ContentId::random();
        let new_size = prev_content.size + req.beans.content.size;

        sqlx::query("UPDATE chunk SET content_id = ? WHERE content_id = ?")
        .bind(new_content_id.0.to_vec())
        .bind(&prev.content_id)
        .execute(pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;

        insert_content(
            pool,
            &new_content_id,
            new_size,
            &prev_content.policy,
            &req.beans.content.chunk_method,
            &req.beans.content.mime_type,
            None,
            now,
        )
        .await?;
        for chunk in &req.beans.chunks {
            let shifted = ChunkPosition {
                metachunk: chunk.position.metachunk + next_base,
                intra: chunk.position.intra,
                parity: chunk.position.parity,
            };
            insert_chunk(
                pool,
                &chunk.id,
                &shifted,
                chunk.hash.as_ref().map(|h| h.0.as_slice()),
                chunk.size,
                now,
                &new_content_id,
            )
            .await?;
        }

        let new_version = if versioning.overwrites_in_place() || matches!(versioning, VersioningPolicy::Disabled) {
            prev.version
        } else {
            prev.version + 1
        };
        insert_alias(
            pool,
            &req.beans.alias_name,
            new_version,
            false,
            now,
            &req.beans.mdsys,
            &new_content_id,
        )
        .await?;

        if matches!(versioning, VersioningPolicy::Disabled) {
            if let Err(e) = sqlx::query("DELETE FROM content WHERE id = ?")
            .bind(&prev.content_id)
            .execute(pool)
            .await
            {
                warn!(
                    error = %e,
                    "post-APPEND synchronous chunk deletion failed; run PURGE to reclaim",
                );
            }
        }

        cascade_prune(pool).await?;
        recompute_size(pool).await?;
        admin.bump_version().await?;

        Ok(WriteResult {
                alias_name: req.beans.alias_name.clone(),
                version: new_version,
                content_id: new_content_id,
                purged_previous: false,
            })
    }

    async fn delete(
        &self,
        container_id: &str,
        alias_name: &str,
        version: Option<i64>,
    ) -> Result<(), ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;
        let admin = AdminTable::new(pool);
        let versioning = admin.versioning_policy().await?;

        if let Some(v) = version {
            let row = fetch_alias_at_version(pool, alias_name, v)
            .await?
            .ok_or(ContainerError::ContentNotFound)?;
            real_delete_closure(pool, &row).await?;
        } else {
            let latest = fetch_latest_alias(pool, alias_name)
            .await?
            .ok_or(ContainerError::ContentNotFound)?;
            let real_delete = matches!(
                versioning,
                VersioningPolicy::Disabled | VersioningPolicy::Suspended
            ) || latest.deleted != 0;
            if real_delete {
                real_delete_closure(pool, &latest).await?;
            } else {
                insert_alias(
                    pool,
                    alias_name,
                    latest.version + 1,
                    true,
                    now_secs(),
                    &latest.mdsys,
                    &content_id_from_blob(&latest.content_id)?,
                )
                .await?;
            }
        }

        cascade_prune(pool).await?;
        recompute_size(pool).await?;
        admin.bump_version().await?;
        crate::metrics::record_operation("delete", "ok");
        Ok(())
    }

    async fn list(&self, container_id: &str, req: ListRequest) -> Result<ListResult, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let pool = &handle.pool;

        let mut builder = sqlx::QueryBuilder::<sqlx::Sqlite>::new(
            "SELECT alias, version, deleted, ctime, mdsys, content_id FROM alias WHERE 1=1",
        );
        if let Some(prefix) = &req.prefix {
            builder.push(" AND alias LIKE ");
            builder.push_bind(format!("{prefix}%"));
        }
        if let Some(marker_start) = &req.marker_start {
            builder.push(" AND alias > ");
            builder.push_bind(marker_start.clone());
        }
        if let Some(marker_end) = &req.marker_end {
            builder.push(" AND alias < ");
            builder.push_bind(marker_end.clone());
        }
        builder.push(" ORDER BY alias ASC, version ASC");

        let rows: Vec<AliasRow> = builder
        .build_query_as::<AliasRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;

        let mut ordered_names: Vec<String> = Vec::new();
        let mut latest_by_name: HashMap<String, AliasRow> = HashMap::new();
        let mut all_versions: Vec<AliasRow> = Vec::new();

        for row in rows {
            if !req.flags.contains(ReadFlags::ALLVERSION) {
                if !latest_by_name.contains_key(&row.alias) {
                    ordered_names.push(row.alias.clone());
                }
                latest_by_name.insert(row.alias.clone(), row);
            } else {
                all_versions.push(row);
            }
        }

        let mut aliases: Vec<Alias> = if req.flags.contains(ReadFlags::ALLVERSION) {
            let mut out = Vec::with_capacity(all_versions.len());
            for row in all_versions {
                out.push(row.into_entity()?);
            }
            out
        } else {
            let mut out = Vec::with_capacity(ordered_names.len());
            for name in ordered_names {
                if let Some(row) = latest_by_name.remove(&name) {
                    out.push(row.into_entity()?);
                }
            }
            out
        };

        if req.flags.contains(ReadFlags::NODELETED) {
            aliases.retain(|a| !a.deleted);
        }

        let truncated = match req.maxkeys {
            Some(max) if aliases.len() > max => {
                aliases.truncate(max);
                true
            }
            _ => false,
        };

        Ok(ListResult { aliases, truncated })
    }

    async fn copy(
        &self,
        container_id: &str,
        src_alias: &str,
        dst_alias: &str,
    ) -> Result<WriteResult, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;
        let admin = AdminTable::new(pool);

        let src = fetch_latest_alias(pool, src_alias)
        .await?
        .ok_or(ContainerError::ContentNotFound)?;
        if src.deleted != 0 {
            return Err(ContainerError::ContentNotFound);
        }
        let content_id = content_id_from_blob(&src.content_id)?;
        let dst_latest = fetch_latest_alias(pool, dst_alias).await?;
        let new_version = dst_latest.map(|r| r.version + 1).unwrap_or(0);
        let now = now_secs();

        insert_alias(
            pool,
            dst_alias,
            new_version,
            false,
            now,
            &src.mdsys,
            &content_id,
        )
        .await?;

        recompute_size(pool).await?;
        admin.bump_version().await?;

        Ok(WriteResult {
                alias_name: dst_alias.to_string(),
                version: new_version,
                content_id,
                purged_previous: false,
            })
    }

    async fn prop_set(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;
        if fetch_alias_at_version(pool, alias_name, version)
        .await?
        .is_none()
        {
            return Err(ContainerError::ContentNotFound);
        }
        sqlx::query(
            "INSERT INTO property(alias, version, key, value) VALUES (?, ?, ?, ?) \
            ON CONFLICT(alias, version, key) DO UPDATE SET value = excluded.value",
        )
        .bind(alias_name)
        .bind(version)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn prop_get(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
    ) -> Result<Vec<oio_types::entity::Property>, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let pool = &handle.pool;
        let rows = fetch_properties(pool, alias_name, version).await?;
        Ok(rows.into_iter().map(|r| r.into_entity()).collect())
    }

    async fn prop_del(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
        key: &str,
    ) -> Result<(), ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        sqlx::query("DELETE FROM property WHERE alias = ? AND version = ? AND key = ?")
        .bind(alias_name)
        .bind(version)
        .bind(key)
        .execute(&handle.pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn purge(&self, container_id: &str, retention_delay_secs: i64) -> Result<(), ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;
        let admin = AdminTable::new(pool);
        let versioning = admin.versioning_policy().await?;

        // Exceeding-version sweep.
        if let VersioningPolicy::Bounded(max) = versioning {
            let names: Vec<String> = sqlx::query("SELECT DISTINCT alias FROM alias")
            .fetch_all(pool)
            .await
            .map_err(|e| ContainerError::Backend(e.to_string()))?
            .into_iter()
            .map(|r| r.get::<String, _>("alias"))
            .collect();
            for name in names {
                sweep_exceeding_for_alias(pool, &name, max).await?;
            }
        }

        // Retention sweep: drop whole alias chains whose latest row is a
        // tombstone older than `retention_delay_secs`.
        let effective_retention = if retention_delay_secs > 0 {
            retention_delay_secs
        } else {
            self.retention_delay_secs
        };
        let cutoff = now_secs() - effective_retention;
        let names: Vec<String> = sqlx::query("SELECT DISTINCT alias FROM alias")
        .fetch_all(pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?
        .into_iter()
        .map(|r| r.get::<String, _>("alias"))
        .collect();
        for name in names {
            if let Some(latest) = fetch_latest_alias(pool, &name).await? {
                if latest.deleted != 0 && latest.ctime < cutoff {
                    let versions = fetch_all_versions(pool, &name).await?;
                    for row in versions {
                        real_delete_closure(pool, &row).await?;
                    }
                }
            }
        }

        cascade_prune(pool).await?;
        recompute_size(pool).await?;
        admin.bump_version().await?;
        Ok(())
    }

    async fn dedup(&self, container_id: &str) -> Result<DedupReport, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        let pool = &handle.pool;

        let contents: Vec<ContentRow> = sqlx::query_as(
            "SELECT id, size, policy, chunk_method, mime_type, hash, ctime FROM content",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;

        let mut signature_to_canonical: HashMap<String, Vec<u8>> = HashMap::new();
        let mut bytes_saved = 0i64;
        let mut aliases_impacted = 0usize;

        for content in contents {
            let content_id = content_id_from_blob(&content.id)?;
            let mut chunks = fetch_chunks(pool, &content_id).await?;
            chunks.sort_by(|a, b| a.position.cmp(&b.position));
            if chunks.is_empty() || chunks.iter().any(|c| c.hash.is_none()) {
                continue;
            }
            let signature = chunks
            .iter()
            .map(|c| {
                    let hash_hex = c.hash.as_ref().map(hex::encode).unwrap_or_default();
                    format!("{}:{}", c.position, hash_hex)
                })
            .collect::<Vec<_>>()
            .join(",");

            match signature_to_canonical.get(&signature) {
                None => {
                    signature_to_canonical.insert(signature, content.id.clone());
                }
                Some(canonical_id) if canonical_id != &content.id => {
                    let impacted = sqlx::query("UPDATE alias SET content_id = ? WHERE content_id = ?")
                    .bind(canonical_id.clone())
                    .bind(&content.id)
                    .execute(pool)
                    .await
                    .map_err(|e| ContainerError::Backend(e.to_string()))?
                    .rows_affected();
                    if impacted > 0 {
                        aliases_impacted += impacted as usize;
                        bytes_saved += content.size;
                        sqlx::query("DELETE FROM chunk WHERE content_id = ?")
                        .bind(&content.id)
                        .execute(pool)
                        .await
                        .map_err(|e| ContainerError::Backend(e.to_string()))?;
                        sqlx::query("DELETE FROM content WHERE id = ?")
                        .bind(&content.id)
                        .execute(pool)
                        .await
                        .map_err(|e| ContainerError::Backend(e.to_string()))?;
                    }
                }
                Some(_) => {}
            }
        }

        cascade_prune(pool).await?;
        recompute_size(pool).await?;
        AdminTable::new(pool).bump_version().await?;

        Ok(DedupReport {
                bytes_saved,
                aliases_impacted,
            })
    }

    async fn touch(&self, container_id: &str) -> Result<(), ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        let _guard = handle.writer.lock().await;
        AdminTable::new(&handle.pool).bump_version().await?;
        Ok(())
    }

    async fn size(&self, container_id: &str) -> Result<i64, ContainerError> {
        let handle = self.pools.open_existing(container_id).await?;
        AdminTable::new(&handle.pool).size().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oio_api::container::ListRequest;
    use oio_types::entity::{BeanSet, ChunkShell, ContentShell};
    use oio_types::ids::ChunkHash;

    fn engine(dir: &tempfile::TempDir) -> Meta2Engine {
        Meta2Engine::new(dir.path().to_path_buf(), -1, 86_400)
    }

    async fn create(engine: &Meta2Engine, container_id: &str, versioning_raw: i64) {
        assert!(engine
            .create_container(container_id, "NS", "acct", "user", Some(versioning_raw), None)
            .await
            .unwrap());
    }

    fn chunk(position: ChunkPosition, size: i64) -> ChunkShell {
        ChunkShell {
            id: format!("http://rawx1/{}", position),
            position,
            hash: Some(ChunkHash([0xAB; 16])),
            size,
        }
    }

    fn write_req(container_id: &str, alias_name: &str, size: i64, n_chunks: u32) -> WriteRequest {
        let chunk_size = size / n_chunks.max(1) as i64;
        let chunks: Vec<ChunkShell> = (0..n_chunks)
        .map(|p| chunk(ChunkPosition::metachunk(p), chunk_size))
        .collect();
        WriteRequest {
            container_id: container_id.to_string(),
            autocreate: false,
            beans: BeanSet {
                alias_name: alias_name.to_string(),
                mdsys: String::new(),
                content: ContentShell {
                    size,
                    policy: None,
                    chunk_method: "plain/nb_copy=1".to_string(),
                    mime_type: "application/octet-stream".to_string(),
                    hash: None,
                },
                chunks,
            },
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;

        let result = engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        assert_eq!(result.version, 0);

        let got = engine
        .get("cnt", "a", None, ReadFlags::empty())
        .await
        .unwrap();
        assert_eq!(got.aliases.len(), 1);
        assert_eq!(got.aliases[0].content_id, result.content_id);
        assert_eq!(engine.size("cnt").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn overwrite_disabled_returns_content_exists_on_second_put() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", 0).await;

        engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        let err = engine.put(write_req("cnt", "a", 10, 1)).await.unwrap_err();
        assert!(matches!(err, ContainerError::ContentExists));
    }

    #[tokio::test]
    async fn overwrite_suspended_replaces_in_place_and_debits_size() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", 1).await;

        engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        let second = engine.put(write_req("cnt", "a", 7, 1)).await.unwrap();
        assert_eq!(second.version, 0);
        assert_eq!(engine.size("cnt").await.unwrap(), 7);

        let got = engine
        .get("cnt", "a", None, ReadFlags::ALLVERSION)
        .await
        .unwrap();
        assert_eq!(got.aliases.len(), 1, "suspended overwrite keeps one row at v=0");
    }

    #[tokio::test]
    async fn delete_then_get_tombstones_and_nodeleted_returns_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;

        engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        engine.delete("cnt", "a", None).await.unwrap();

        let not_found = engine
        .get("cnt", "a", None, ReadFlags::NODELETED)
        .await
        .unwrap_err();
        assert!(matches!(not_found, ContainerError::ContentNotFound));

        let all = engine
        .get("cnt", "a", None, ReadFlags::ALLVERSION)
        .await
        .unwrap();
        assert_eq!(all.aliases.len(), 2);
        assert!(all.aliases.iter().any(|a| a.deleted));
    }

    #[tokio::test]
    async fn append_extends_chunks_and_content_size() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;

        engine.put(write_req("cnt", "a", 100, 4)).await.unwrap();
        let appended = engine.append(write_req("cnt", "a", 50, 2)).await.unwrap();
        assert_eq!(appended.version, 1);

        let got = engine
        .get("cnt", "a", None, ReadFlags::HEADERS)
        .await
        .unwrap();
        let content = got
        .beans
        .iter()
        .find_map(|b| match b {
                Bean::Content(c) => Some(c),
                _ => None,
            })
        .unwrap();
        assert_eq!(content.size, 150);

        let chunks: Vec<&Chunk> = got
        .beans
        .iter()
        .filter_map(|b| match b {
                Bean::Chunk(c) => Some(c),
                _ => None,
            })
        .collect();
        let mut positions: Vec<u32> = chunks.iter().map(|c| c.position.metachunk).collect();
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn purge_exceeding_versions_keeps_newest_n() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", 2).await;

        for _ in 0..4 {
            engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        }
        engine.purge("cnt", 86_400).await.unwrap();

        let all = engine
        .get("cnt", "a", None, ReadFlags::ALLVERSION)
        .await
        .unwrap();
        assert_eq!(all.aliases.len(), 2, "bounded(2) keeps only the newest two versions");
    }

    #[tokio::test]
    async fn dedup_merges_identical_contents_and_reports_savings() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;

        engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();
        engine.put(write_req("cnt", "b", 10, 1)).await.unwrap();

        let report = engine.dedup("cnt").await.unwrap();
        assert_eq!(report.aliases_impacted, 1);
        assert_eq!(report.bytes_saved, 10);

        let a = engine
        .get("cnt", "a", None, ReadFlags::empty())
        .await
        .unwrap();
        let b = engine
        .get("cnt", "b", None, ReadFlags::empty())
        .await
        .unwrap();
        assert_eq!(a.aliases[0].content_id, b.aliases[0].content_id);
    }

    #[tokio::test]
    async fn list_with_prefix_and_maxkeys_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;

        for name in ["a/1", "a/2", "a/3", "b/1"] {
            engine.put(write_req("cnt", name, 1, 1)).await.unwrap();
        }

        let page1 = engine
        .list(
            "cnt",
            ListRequest {
                prefix: Some("a/".to_string()),
                maxkeys: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page1.aliases.len(), 2);
        assert!(page1.truncated);

        let full = engine
        .list(
            "cnt",
            ListRequest {
                prefix: Some("a/".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(full.aliases.len(), 3);
        assert!(!full.truncated);
    }

    #[tokio::test]
    async fn describe_reports_admin_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        create(&engine, "cnt", -1).await;
        engine.put(write_req("cnt", "a", 10, 1)).await.unwrap();

        let info = engine.describe("cnt").await.unwrap();
        assert_eq!(info.namespace, "NS");
        assert_eq!(info.account, "acct");
        assert_eq!(info.size, 10);
        assert_eq!(info.versioning_policy, -1);
    }

    #[tokio::test]
    async fn describe_missing_container_errors() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine(&dir);
        let err = engine.describe("missing").await.unwrap_err();
        assert!(matches!(err, ContainerError::ContainerNotFound));
    }
}
