// Path: crates/oio-gateway/src/rest/conscience.rs
//! `conscience/{info,list,register,deregister,lock,unlock}`.

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use oio_api::conscience::ServiceInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire shape of a `serviceInfo` object. `ns`
/// is accepted but not stored: each gateway process is already scoped to a
/// single namespace, so the field only round-trips for client
/// compatibility.
#[derive(Debug, Deserialize)]
pub struct ServiceInfoWire {
    #[serde(default)]
    pub ns: Option<String>,
    #[serde(rename = "type")]
    pub service_type: String,
    pub addr: String,
    #[serde(default)]
    pub score: ScoreWire,
    #[serde(default)]
    pub tags: HashMap<String, f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ScoreWire {
    #[serde(default)]
    pub value: i32,
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfoOut {
    pub ns: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub addr: String,
    pub score: i32,
    pub locked: bool,
    pub tags: HashMap<String, f64>,
}

impl ServiceInfoOut {
    fn from_info(ns: &str, info: ServiceInfo) -> Self {
        Self {
            ns: ns.to_string(),
            service_type: info.service_type,
            addr: info.addr,
            score: info.score,
            locked: info.locked,
            tags: info.tags,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TypeAddrQuery {
    #[serde(rename = "type")]
    pub service_type: String,
    pub addr: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub full: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LockBody {
    #[serde(rename = "type")]
    pub service_type: String,
    pub addr: String,
    pub score: i32,
}

pub async fn register(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Json(wire): Json<ServiceInfoWire>,
) -> Result<Json<ServiceInfoOut>, AppError> {
    let info = ServiceInfo {
        service_type: wire.service_type,
        addr: wire.addr,
        score: wire.score.value,
        locked: false,
        last_seen: 0,
        tags: wire.tags,
    };
    let stored = state.registry.register(info).await?;
    Ok(Json(ServiceInfoOut::from_info(&ns, stored)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<ServiceInfoOut>>, AppError> {
    let include_expired = q.full.is_some();
    let services = state.registry.list(&q.service_type, include_expired).await?;
    Ok(Json(
            services.into_iter().map(|s| ServiceInfoOut::from_info(&ns, s)).collect(),
        ))
}

pub async fn info(
    State(state): State<AppState>,
    Path(ns): Path<String>,
    Query(q): Query<TypeAddrQuery>,
) -> Result<Json<ServiceInfoOut>, AppError> {
    let services = state.registry.list(&q.service_type, true).await?;
    let found = services
    .into_iter()
    .find(|s| s.addr == q.addr)
    .ok_or_else(|| oio_types::error::ConscienceError::ServiceNotFound(q.addr.clone()))?;
    Ok(Json(ServiceInfoOut::from_info(&ns, found)))
}

pub async fn deregister(
    State(state): State<AppState>,
    Query(q): Query<TypeAddrQuery>,
) -> Result<(), AppError> {
    state.registry.deregister(&q.service_type, &q.addr).await?;
    Ok(())
}

pub async fn lock(State(state): State<AppState>, Json(body): Json<LockBody>) -> Result<(), AppError> {
    state.registry.lock(&body.service_type, &body.addr, body.score).await?;
    Ok(())
}

pub async fn unlock(
    State(state): State<AppState>,
    Query(q): Query<TypeAddrQuery>,
) -> Result<(), AppError> {
    state.registry.unlock(&q.service_type, &q.addr).await?;
    Ok(())
}
