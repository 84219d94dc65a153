// Path: crates/oio-gateway/src/rest/reference.rs
//! `reference/{create,show,destroy,link,unlink,renew,force,prop/*}`
//!.
//!
//! The only directory contract this workspace models is
//! `DirectoryResolver::{resolve, decache, expire}` — there is
//! no modeled META1 write RPC for creating/destroying a reference or
//! storing reference-level properties (those live in a raw TCP RPC
//! transport this build deliberately leaves out of scope). So:
//! - `create`/`destroy` are thin acknowledgements (no META1 write path to
//! call through to).
//! - `link` resolves (populating the cache); `unlink`/`renew`/`force`
//! decache, so the next read re-resolves.
//! - `prop/{get,set,del}` report `BAD_REQUEST`: inventing a fake
//! reference-property store would misrepresent a capability this build
//! does not have, so this is documented as a deliberate simplification
//! (DESIGN.md) rather than faked.

use crate::error::AppError;
use crate::redirect::resolve_with_redirects;
use crate::rest::RefQuery;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use oio_api::resolver::{ObjectUrl, ResolveFlags, ServiceLocation};
use serde::Serialize;

fn object_url(namespace: &str, q: &RefQuery) -> ObjectUrl {
    ObjectUrl {
        namespace: namespace.to_string(),
        account: q.acct.clone(),
        user: q.reference.clone(),
        path: String::new(),
    }
}

fn service_type(q: &RefQuery) -> &str {
    q.r#type.as_deref().unwrap_or("meta2")
}

#[derive(Debug, Serialize)]
pub struct LocationOut {
    pub seq: u32,
    #[serde(rename = "type")]
    pub service_type: String,
    pub host: String,
    pub args: Vec<String>,
}

impl From<ServiceLocation> for LocationOut {
    fn from(l: ServiceLocation) -> Self {
        Self {
            seq: l.seq,
            service_type: l.service_type,
            host: l.host,
            args: l.args,
        }
    }
}

pub async fn create(Query(_q): Query<RefQuery>) -> StatusCode {
    StatusCode::CREATED
}

pub async fn show(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<Json<Vec<LocationOut>>, AppError> {
    link(State(state), Query(q)).await
}

pub async fn destroy(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> StatusCode {
    state.resolver.decache(&object_url(&state.namespace, &q), service_type(&q));
    StatusCode::NO_CONTENT
}

pub async fn link(
    State(state): State<AppState>,
    Query(q): Query<RefQuery>,
) -> Result<Json<Vec<LocationOut>>, AppError> {
    let url = object_url(&state.namespace, &q);
    let locations = resolve_with_redirects(
        state.resolver.as_ref(),
        &url,
        service_type(&q),
        ResolveFlags::default(),
        state.max_redirects,
    )
    .await?;
    Ok(Json(locations.into_iter().map(LocationOut::from).collect()))
}

pub async fn unlink(State(state): State<AppState>, Query(q): Query<RefQuery>) -> StatusCode {
    state.resolver.decache(&object_url(&state.namespace, &q), service_type(&q));
    StatusCode::NO_CONTENT
}

pub async fn renew(State(state): State<AppState>, Query(q): Query<RefQuery>) -> StatusCode {
    state.resolver.decache(&object_url(&state.namespace, &q), service_type(&q));
    StatusCode::NO_CONTENT
}

pub async fn force(State(state): State<AppState>, Query(q): Query<RefQuery>) -> StatusCode {
    state.resolver.decache(&object_url(&state.namespace, &q), service_type(&q));
    StatusCode::NO_CONTENT
}

pub async fn prop_get() -> AppError {
    AppError::bad_request("reference properties require a META1 write backend not modeled here")
}

pub async fn prop_set() -> AppError {
    AppError::bad_request("reference properties require a META1 write backend not modeled here")
}

pub async fn prop_del() -> AppError {
    AppError::bad_request("reference properties require a META1 write backend not modeled here")
}
