// Path: crates/oio-gateway/src/rest/mod.rs
//! REST handlers, one module per resource family.

pub mod conscience;
pub mod container;
pub mod reference;

use axum::extract::Query;
use serde::Deserialize;

/// Common `acct`/`ref` query parameters shared by every `reference/*` and
/// `container/*` endpoint.
#[derive(Debug, Deserialize)]
pub struct RefQuery {
    pub acct: String,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default)]
    pub r#type: Option<String>,
}

pub type RefParams = Query<RefQuery>;

/// `acct/ref` is how the rest of the OpenIO ecosystem names a container;
/// this gateway maps that pair to a single `container_id` string used as
/// the META2 database key.
pub fn container_id(acct: &str, reference: &str) -> String {
    format!("{acct}/{reference}")
}
