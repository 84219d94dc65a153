// Path: crates/oio-api/src/conscience.rs
use async_trait::async_trait;
use oio_types::error::ConscienceError;
use std::collections::HashMap;

/// A live service as reported by a `register` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub service_type: String,
    pub addr: String,
    pub score: i32,
    pub locked: bool,
    pub last_seen: i64,
    pub tags: HashMap<String, f64>,
}

/// Service discovery and scoring plane contract ("Conscience").
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Upserts a service keyed by `(type, addr)`. Resets `last_seen` and
    /// recomputes the score, clamped to the type's `score_variation_bound`.
    async fn register(&self, info: ServiceInfo) -> Result<ServiceInfo, ConscienceError>;

    /// Sets a service's score to a fixed value in `[0, 100]` and prevents
    /// re-evaluation until `unlock` is called.
    async fn lock(&self, service_type: &str, addr: &str, value: i32) -> Result<(), ConscienceError>;

    /// Clears a lock; the service's score re-enters expression-driven updates.
    async fn unlock(&self, service_type: &str, addr: &str) -> Result<(), ConscienceError>;

    /// Removes a service from the registry immediately, independent of
    /// `expire`'s staleness window.
    async fn deregister(&self, service_type: &str, addr: &str) -> Result<(), ConscienceError>;

    /// Lists known services of a type. When `include_expired` is false,
    /// services whose `last_seen` has exceeded `score_expiration` are
    /// omitted.
    async fn list(
        &self,
        service_type: &str,
        include_expired: bool,
    ) -> Result<Vec<ServiceInfo>, ConscienceError>;

    /// Removes services whose `last_seen` predates `now - score_expiration`.
    async fn expire(&self, now: i64) -> Result<usize, ConscienceError>;
}
