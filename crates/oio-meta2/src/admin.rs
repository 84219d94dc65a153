// Path: crates/oio-meta2/src/admin.rs
//! Typed helpers over the `admin(k, v)` key/value table. `namespace`,
//! `account`, and `user` are persisted here too, so a container can be
//! addressed without an external lookup.

use oio_types::error::ContainerError;
use oio_types::versioning::VersioningPolicy;
use sqlx::{Row, SqlitePool};

pub const KEY_NAMESPACE: &str = "namespace";
pub const KEY_ACCOUNT: &str = "account";
pub const KEY_USER: &str = "user";
pub const KEY_CTIME: &str = "ctime";
pub const KEY_VERSION: &str = "version";
pub const KEY_SIZE: &str = "size";
pub const KEY_QUOTA: &str = "quota";
pub const KEY_VERSIONING_POLICY: &str = "versioning_policy";
pub const KEY_STORAGE_POLICY: &str = "storage_policy";
pub const KEY_STATUS: &str = "status";

/// Thin accessor bound to one container's connection pool.
pub struct AdminTable<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminTable<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, ContainerError> {
        let row = sqlx::query("SELECT v FROM admin WHERE k = ?")
        .bind(key)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        Ok(row.map(|r| r.get::<String, _>("v")))
    }

    pub async fn get_i64(&self, key: &str, default: i64) -> Result<i64, ContainerError> {
        match self.get(key).await? {
            Some(v) => v
            .parse::<i64>()
            .map_err(|e| ContainerError::Backend(format!("admin key {key:?} not an int: {e}"))),
            None => Ok(default),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), ContainerError> {
        sqlx::query("INSERT INTO admin(k, v) VALUES (?, ?) ON CONFLICT(k) DO UPDATE SET v = excluded.v")
        .bind(key)
        .bind(value)
        .execute(self.pool)
        .await
        .map_err(|e| ContainerError::Backend(e.to_string()))?;
        Ok(())
    }

    pub async fn set_i64(&self, key: &str, value: i64) -> Result<(), ContainerError> {
        self.set(key, &value.to_string()).await
    }

    /// Bumps the container's monotonically increasing write serial.
    pub async fn bump_version(&self) -> Result<i64, ContainerError> {
        let current = self.get_i64(KEY_VERSION, 0).await?;
        let next = current + 1;
        self.set_i64(KEY_VERSION, next).await?;
        Ok(next)
    }

    pub async fn versioning_policy(&self) -> Result<VersioningPolicy, ContainerError> {
        let raw = self.get_i64(KEY_VERSIONING_POLICY, -1).await?;
        Ok(VersioningPolicy::from_raw(raw))
    }

    pub async fn size(&self) -> Result<i64, ContainerError> {
        self.get_i64(KEY_SIZE, 0).await
    }

    pub async fn add_size(&self, delta: i64) -> Result<(), ContainerError> {
        let current = self.size().await?;
        self.set_i64(KEY_SIZE, current + delta).await
    }

    pub async fn storage_policy_name(&self) -> Result<String, ContainerError> {
        Ok(self
            .get(KEY_STORAGE_POLICY)
            .await?
            .unwrap_or_else(|| "SINGLE".to_string()))
    }
}

/// Seeds the admin rows for a brand-new container.
pub async fn initialize(
    pool: &SqlitePool,
    namespace: &str,
    account: &str,
    user: &str,
    versioning_policy_raw: i64,
    storage_policy: &str,
    ctime: i64,
) -> Result<(), ContainerError> {
    let admin = AdminTable::new(pool);
    if admin.get(KEY_CTIME).await?.is_some() {
        return Ok(()); // already initialized
    }
    admin.set(KEY_NAMESPACE, namespace).await?;
    admin.set(KEY_ACCOUNT, account).await?;
    admin.set(KEY_USER, user).await?;
    admin.set_i64(KEY_CTIME, ctime).await?;
    admin.set_i64(KEY_VERSION, 0).await?;
    admin.set_i64(KEY_SIZE, 0).await?;
    admin.set_i64(KEY_QUOTA, -1).await?;
    admin.set_i64(KEY_VERSIONING_POLICY, versioning_policy_raw).await?;
    admin.set(KEY_STORAGE_POLICY, storage_policy).await?;
    admin.set(KEY_STATUS, "enabled").await?;
    Ok(())
}
