// Path: crates/oio-api/src/container.rs
use async_trait::async_trait;
use bitflags::bitflags;
use oio_types::entity::{Alias, Bean, BeanSet, Property};
use oio_types::error::ContainerError;

bitflags! {
    /// Flags recognized by GET/LIST.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ReadFlags: u16 {
        const LATEST = 0b0000_0001;
        const ALLVERSION = 0b0000_0010;
        const NODELETED = 0b0000_0100;
        const NOPROPS = 0b0000_1000;
        const HEADERS = 0b0001_0000;
        const NORECURSION = 0b0010_0000;
    }
}

/// The resolved set of beans for a GET.
#[derive(Debug, Clone, Default)]
pub struct GetResult {
    pub aliases: Vec<Alias>,
    pub beans: Vec<Bean>,
}

/// Inputs for a PUT/APPEND.
#[derive(Debug, Clone)]
pub struct WriteRequest {
    pub container_id: String,
    pub beans: BeanSet,
    pub autocreate: bool,
}

/// Result of a write, reporting the version that was actually committed
/// and whether a previous version was scheduled for purge.
#[derive(Debug, Clone)]
pub struct WriteResult {
    pub alias_name: String,
    pub version: i64,
    pub content_id: oio_types::ids::ContentId,
    pub purged_previous: bool,
}

/// Pagination inputs/outputs for LIST.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub prefix: Option<String>,
    pub marker_start: Option<String>,
    pub marker_end: Option<String>,
    pub maxkeys: Option<usize>,
    pub flags: ReadFlags,
}

#[derive(Debug, Clone, Default)]
pub struct ListResult {
    pub aliases: Vec<Alias>,
    pub truncated: bool,
}

/// Outcome of a deduplication pass.
#[derive(Debug, Clone, Default)]
pub struct DedupReport {
    pub bytes_saved: i64,
    pub aliases_impacted: usize,
}

/// The META2 container metadata engine contract.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    async fn get(
        &self,
        container_id: &str,
        alias_name: &str,
        version: Option<i64>,
        flags: ReadFlags,
    ) -> Result<GetResult, ContainerError>;

    async fn put(&self, req: WriteRequest) -> Result<WriteResult, ContainerError>;

    async fn append(&self, req: WriteRequest) -> Result<WriteResult, ContainerError>;

    async fn delete(
        &self,
        container_id: &str,
        alias_name: &str,
        version: Option<i64>,
    ) -> Result<(), ContainerError>;

    async fn list(&self, container_id: &str, req: ListRequest) -> Result<ListResult, ContainerError>;

    async fn copy(
        &self,
        container_id: &str,
        src_alias: &str,
        dst_alias: &str,
    ) -> Result<WriteResult, ContainerError>;

    async fn prop_set(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ContainerError>;

    async fn prop_get(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
    ) -> Result<Vec<Property>, ContainerError>;

    async fn prop_del(
        &self,
        container_id: &str,
        alias_name: &str,
        version: i64,
        key: &str,
    ) -> Result<(), ContainerError>;

    /// Runs both purge sweeps (exceeding-version and retention) and
    /// cascade-prunes unreferenced Properties/Contents/Chunks.
    async fn purge(&self, container_id: &str, retention_delay_secs: i64) -> Result<(), ContainerError>;

    async fn dedup(&self, container_id: &str) -> Result<DedupReport, ContainerError>;

    async fn touch(&self, container_id: &str) -> Result<(), ContainerError>;

    /// Current container size: Σ `Content.size` over live aliases.
    async fn size(&self, container_id: &str) -> Result<i64, ContainerError>;
}
