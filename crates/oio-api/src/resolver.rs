// Path: crates/oio-api/src/resolver.rs
use async_trait::async_trait;
use bitflags::bitflags;
use oio_types::error::DirectoryError;

bitflags! {
    /// Flags recognized on resolver reads.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResolveFlags: u8 {
        const NOCACHE = 0b001;
        const NOATIME = 0b010;
        const NOMAX = 0b100;
    }
}

impl Default for ResolveFlags {
    fn default() -> Self {
        ResolveFlags::empty()
    }
}

/// One resolved service endpoint: `seq|type|host` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocation {
    pub seq: u32,
    pub service_type: String,
    pub host: String,
    pub args: Vec<String>,
}

/// The fully-qualified object URL: namespace / account / user / path /
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl {
    pub namespace: String,
    pub account: String,
    pub user: String,
    pub path: String,
}

impl ObjectUrl {
    /// The reference key, e.g. `NS/account/user`, that maps to a META1
    /// host set through the `csm0` cache.
    pub fn reference_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.account, self.user)
    }
}

/// The resolver+directory plane contract.
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    /// Resolves `(url, service_type)` to a sorted list of endpoints,
    /// consulting the `services` cache first and falling back through the
    /// `csm0` cache and finally META0/META1 when both caches miss.
    async fn resolve(
        &self,
        url: &ObjectUrl,
        service_type: &str,
        flags: ResolveFlags,
    ) -> Result<Vec<ServiceLocation>, DirectoryError>;

    /// Invalidates the cache entry for `(url, service_type)`, e.g. on an
    /// RPC reply carrying `REDIRECT` or on an upstream timeout.
    fn decache(&self, url: &ObjectUrl, service_type: &str);

    /// Drops cache entries whose `ctime` predates their TTL.
    fn expire(&self, now: i64);
}
