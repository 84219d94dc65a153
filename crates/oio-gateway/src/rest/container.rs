// Path: crates/oio-gateway/src/rest/container.rs
//! `container/{create,show,destroy,list,get,put,delete,content/prepare}`
//!.

use crate::error::AppError;
use crate::rawx::RawxPool;
use crate::rest::{container_id, RefQuery};
use crate::state::AppState;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use oio_api::container::{
    ContainerEngine, DedupReport, GetResult, ListRequest, ListResult, ReadFlags, WriteRequest,
};
use oio_api::upload::{Destination, PayloadSource, UploadEngine as _};
use oio_meta2::ContainerInfo;
use oio_types::entity::{Bean, BeanSet, ChunkShell, ContentShell};
use oio_types::error::ContainerError;
use oio_types::policy::StoragePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Size of the chunks the gateway itself pulls out of the buffered request
/// body while streaming it to every destination; unrelated to the storage
/// chunk size the layout generator allocates.
const UPLOAD_STREAM_CHUNK: usize = 64 * 1024;

const AUTOCREATE_HEADER: &str = "x-oio-action-mode";

fn wants_autocreate(headers: &HeaderMap) -> bool {
    headers
    .get(AUTOCREATE_HEADER)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.contains("autocreate"))
    .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    #[serde(default)]
    pub storage_policy: Option<String>,
    #[serde(default)]
    pub versioning_policy: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Query(q): Query<RefQuery>,
    Json(body): Json<CreateBody>,
) -> Result<StatusCode, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let created = state
    .containers
    .create_container(
        &cid,
        &ns,
        &q.acct,
        &q.reference,
        body.versioning_policy,
        body.storage_policy.as_deref(),
    )
    .await?;
    Ok(if created { StatusCode::CREATED } else { StatusCode::ACCEPTED })
}

pub async fn show(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<Json<ContainerInfo>, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let info = state.containers.describe(&cid).await?;
    Ok(Json(info))
}

pub async fn destroy(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<StatusCode, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    state.containers.destroy_container(&cid)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub end_marker: Option<String>,
    #[serde(default)]
    pub maxkeys: Option<usize>,
    #[serde(default)]
    pub allversion: Option<String>,
    #[serde(default)]
    pub nodeleted: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListOut {
    pub objects: Vec<AliasOut>,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
pub struct AliasOut {
    pub name: String,
    pub version: i64,
    pub deleted: bool,
    pub content_id: String,
}

pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListOut>, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let mut flags = ReadFlags::empty();
    if q.allversion.is_some() {
        flags |= ReadFlags::ALLVERSION;
    }
    if q.nodeleted.is_some() {
        flags |= ReadFlags::NODELETED;
    }
    let req = ListRequest {
        prefix: q.prefix,
        marker_start: q.marker,
        marker_end: q.end_marker,
        maxkeys: q.maxkeys,
        flags,
    };
    let ListResult { aliases, truncated } = state.containers.list(&cid, req).await?;
    let objects = aliases
    .into_iter()
    .map(|a| AliasOut {
            name: a.name,
            version: a.version,
            deleted: a.deleted,
            content_id: a.content_id.to_hex_upper(),
        })
    .collect();
    Ok(Json(ListOut { objects, truncated }))
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub path: String,
    #[serde(default)]
    pub version: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChunkWire {
    pub url: String,
    pub size: i64,
    pub pos: String,
    pub hash: String,
}

pub async fn get_content(
    State(state): State<AppState>,
    Query(q): Query<PathQuery>,
) -> Result<Json<Vec<ChunkWire>>, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let GetResult { beans,.. } = state
    .containers
    .get(&cid, &q.path, q.version, ReadFlags::HEADERS)
    .await?;
    let chunks = beans
    .into_iter()
    .filter_map(|bean| match bean {
            Bean::Chunk(c) => Some(ChunkWire {
                    url: c.id,
                    size: c.size,
                    pos: c.position.to_string(),
                    hash: c.hash.map(|h| h.to_hex_lower()).unwrap_or_default(),
                }),
            _ => None,
        })
    .collect();
    Ok(Json(chunks))
}

#[derive(Debug, Deserialize)]
pub struct PutQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub path: String,
    #[serde(default)]
    pub policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PutOut {
    pub version: i64,
    pub content_id: String,
    pub size: i64,
    pub chunks_written: usize,
    pub chunks_failed: usize,
}

/// Resolves a layout, streams the request body to every chunk destination
/// through the upload engine, then commits to META2 only the chunks whose
/// destination actually accepted the data.
pub async fn put_content(
    State(state): State<AppState>,
    Query(q): Query<PutQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PutOut>, AppError> {
    if body.is_empty() {
        return Err(AppError::bad_request("request body must not be empty"));
    }

    let policy = resolve_policy(&state, q.policy.as_deref())?;

    let rawx_services = state.registry.list("rawx", false).await?;
    let mut pool = RawxPool::from_services(rawx_services);
    let (mut content, chunks) =
    state.layout.generate(body.len() as i64, state.default_chunk_size, &policy, &mut pool)?;

    let destinations: Vec<Destination> = chunks
    .iter()
    .map(|c| Destination {
            url: c.id.clone(),
            headers_out: HashMap::new(),
            user_data: c.id.clone(),
        })
    .collect();

    let source: Box<dyn PayloadSource> =
    Box::new(BytesPayloadSource::new(body.clone(), UPLOAD_STREAM_CHUNK));
    let report = state.uploader.run(source, destinations, state.upload_timeouts).await;

    if report.success_count() < state.upload_min_success {
        return Err(ContainerError::PolicyNotSatisfiable(format!(
                    "only {} of {} destinations accepted the upload, {} required",
                    report.success_count(),
                    report.outcomes.len(),
                    state.upload_min_success
                ))
        .into());
    }

    let succeeded: std::collections::HashSet<&str> = report
    .outcomes
    .iter()
    .filter(|o| o.success)
    .map(|o| o.user_data.as_str())
    .collect();
    let chunks_failed = report.failure_count();
    let surviving: Vec<ChunkShell> =
    chunks.into_iter().filter(|c| succeeded.contains(c.id.as_str())).collect();
    if surviving.is_empty() {
        return Err(ContainerError::PolicyNotSatisfiable(
                "no chunk destination accepted the upload".to_string(),
            )
        .into());
    }
    if chunks_failed > 0 {
        tracing::warn!(
            chunks_failed,
            "committing content with fewer chunk replicas than the layout requested"
        );
    }

    content.hash = Some(report.source_md5.to_vec());
    let committed_size = content.size;
    let chunks_written = surviving.len();

    let cid = container_id(&q.acct, &q.reference);
    let beans = BeanSet {
        alias_name: q.path.clone(),
        mdsys: String::new(),
        content,
        chunks: surviving,
    };
    let req = WriteRequest {
        container_id: cid,
        beans,
        autocreate: wants_autocreate(&headers),
    };
    let result = state.containers.put(req).await?;
    Ok(Json(PutOut {
                version: result.version,
                content_id: result.content_id.to_hex_upper(),
                size: committed_size,
                chunks_written,
                chunks_failed,
            }))
}

/// Buffers the whole request body in memory and hands it out in fixed-size
/// slices; the gateway already bounds body size via `RequestBodyLimitLayer`,
/// so there is no separate cap here.
struct BytesPayloadSource {
    data: Bytes,
    offset: usize,
    chunk_size: usize,
}

impl BytesPayloadSource {
    fn new(data: Bytes, chunk_size: usize) -> Self {
        Self { data, offset: 0, chunk_size }
    }
}

#[async_trait]
impl PayloadSource for BytesPayloadSource {
    fn content_length(&self) -> u64 {
        self.data.len() as u64
    }

    async fn next_chunk(&mut self) -> std::io::Result<Option<Bytes>> {
        if self.offset >= self.data.len() {
            return Ok(None);
        }
        let end = (self.offset + self.chunk_size).min(self.data.len());
        let chunk = self.data.slice(self.offset..end);
        self.offset = end;
        Ok(Some(chunk))
    }
}

/// Only the namespace default storage policy is selectable today; a caller
/// asking for anything else gets a clear error rather than a silent
/// substitution.
fn resolve_policy(state: &AppState, requested: Option<&str>) -> Result<StoragePolicy, AppError> {
    match requested {
        Some(name) if name == state.default_policy.name => Ok(state.default_policy.clone()),
        Some(name) => Err(AppError::bad_request(format!(
            "unknown storage policy {name:?}; only the namespace default is configurable here"
        ))),
        None => Ok(state.default_policy.clone()),
    }
}

pub async fn delete_content(
    State(state): State<AppState>,
    Query(q): Query<PathQuery>,
) -> Result<StatusCode, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    state.containers.delete(&cid, &q.path, q.version).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct DedupOut {
    pub bytes_saved: i64,
    pub aliases_impacted: usize,
}

impl From<DedupReport> for DedupOut {
    fn from(r: DedupReport) -> Self {
        Self {
            bytes_saved: r.bytes_saved,
            aliases_impacted: r.aliases_impacted,
        }
    }
}

/// `dedup`/`purge`/`touch` are load-bearing `ContainerEngine` operations
/// with no other caller in this build; exposing them keeps the whole trait
/// reachable over REST, the way real OpenIO exposes them as
/// `container/dedup` and `container/touch` admin actions.
pub async fn dedup(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<Json<DedupOut>, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let report = state.containers.dedup(&cid).await?;
    Ok(Json(DedupOut::from(report)))
}

#[derive(Debug, Deserialize)]
pub struct PurgeQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub retention_delay_secs: Option<i64>,
}

pub async fn purge(
    State(state): State<AppState>,
    Query(q): Query<PurgeQuery>,
) -> Result<StatusCode, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    let delay = q.retention_delay_secs.unwrap_or(86_400);
    state.containers.purge(&cid, delay).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn touch(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<StatusCode, AppError> {
    let cid = container_id(&q.acct, &q.reference);
    state.containers.touch(&cid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PrepareQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    pub path: String,
    pub size: i64,
    #[serde(default)]
    pub policy: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrepareOut {
    pub chunks: Vec<ChunkWire>,
    pub chunk_method: String,
    pub storage_policy: String,
}

/// Allocates a chunk layout without uploading anything, for clients that
/// want to drive their own upload (e.g. streaming straight from disk)
/// instead of going through `put_content`'s server-side upload. The
/// returned chunk list is only an allocation; nothing is reserved or
/// written until the client PUTs to the chunk URLs itself and records the
/// result some other way, since this build has no separate commit-by-chunk-
/// list endpoint.
pub async fn prepare(
    State(state): State<AppState>,
    Query(q): Query<PrepareQuery>,
) -> Result<Json<PrepareOut>, AppError> {
    let policy = resolve_policy(&state, q.policy.as_deref())?;

    let rawx_services = state.registry.list("rawx", false).await?;
    let mut pool = RawxPool::from_services(rawx_services);
    let (content, chunks) =
    state.layout.generate(q.size, state.default_chunk_size, &policy, &mut pool)?;
    let wire = chunks
    .into_iter()
    .map(|c| ChunkWire {
            url: c.id,
            size: c.size,
            pos: c.position.to_string(),
            hash: String::new(),
        })
    .collect();
    Ok(Json(PrepareOut {
                chunks: wire,
                chunk_method: content.chunk_method,
                storage_policy: policy.name,
            }))
}
