// Path: crates/oio-conscience/src/registry.rs
//! The per-service-type registry itself.

use crate::expr::{self, Expr};
use crate::metrics;
use async_trait::async_trait;
use dashmap::DashMap;
use oio_api::conscience::{ServiceInfo, ServiceRegistry};
use oio_types::config::ConscienceTypeConfig;
use oio_types::error::ConscienceError;
use oio_types::ids::now_secs;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct ServiceEntry {
    addr: String,
    score: i32,
    locked: bool,
    last_seen: i64,
    tags: HashMap<String, f64>,
}

impl ServiceEntry {
    fn to_info(&self, service_type: &str) -> ServiceInfo {
        ServiceInfo {
            service_type: service_type.to_string(),
            addr: self.addr.clone(),
            score: self.score,
            locked: self.locked,
            last_seen: self.last_seen,
            tags: self.tags.clone(),
        }
    }
}

struct TypeTable {
    score_expr: Expr,
    score_variation_bound: i32,
    score_expiration_secs: i64,
    services: DashMap<String, ServiceEntry>,
}

/// Holds one `TypeTable` per configured service type, each guarded
/// independently so that `list()` on one type never blocks `register()` on
/// another. Within a
/// type, `DashMap`'s internal shard locking gives "readers must not block
/// each other" without a hand-rolled `RwLock<HashMap<..>>`.
pub struct ConscienceRegistry {
    types: DashMap<String, TypeTable>,
}

impl ConscienceRegistry {
    pub fn new(type_configs: &[ConscienceTypeConfig]) -> Result<Self, ConscienceError> {
        let types = DashMap::new();
        for cfg in type_configs {
            let parsed = expr::parse(&cfg.score_expr)?;
            types.insert(
                cfg.service_type.clone(),
                TypeTable {
                    score_expr: parsed,
                    score_variation_bound: cfg.score_variation_bound,
                    score_expiration_secs: cfg.score_expiration_secs,
                    services: DashMap::new(),
                },
            );
        }
        Ok(Self { types })
    }

    /// Clamps a recomputed score to `[old - bound, old + bound]` first, then
    /// to `[0, 100]`.
    fn clamp_score(old: i32, raw: f64, bound: i32) -> i32 {
        let raw = raw.round() as i64;
        let lo = (old as i64) - (bound as i64);
        let hi = (old as i64) + (bound as i64);
        let bounded = raw.clamp(lo, hi);
        bounded.clamp(0, 100) as i32
    }
}

#[async_trait]
impl ServiceRegistry for ConscienceRegistry {
    async fn register(&self, info: ServiceInfo) -> Result<ServiceInfo, ConscienceError> {
        let table = self
        .types
        .get(&info.service_type)
        .ok_or_else(|| ConscienceError::UnknownType(info.service_type.clone()))?;
        let now = now_secs();
        let mut entry = table.services.entry(info.addr.clone()).or_insert_with(|| ServiceEntry {
                addr: info.addr.clone(),
                score: 0,
                locked: false,
                last_seen: now,
                tags: HashMap::new(),
            });
        entry.tags.extend(info.tags.clone());
        entry.last_seen = now;
        if !entry.locked {
            let raw = table.score_expr.eval(&entry.tags)?;
            entry.score = Self::clamp_score(entry.score, raw, table.score_variation_bound);
        }
        let result = entry.to_info(&info.service_type);
        metrics::set_registry_size(&info.service_type, table.services.len());
        Ok(result)
    }

    async fn lock(&self, service_type: &str, addr: &str, value: i32) -> Result<(), ConscienceError> {
        if !(0..=100).contains(&value) {
            return Err(ConscienceError::LockOutOfRange(value));
        }
        let table = self
        .types
        .get(service_type)
        .ok_or_else(|| ConscienceError::UnknownType(service_type.to_string()))?;
        let mut entry = table
        .services
        .get_mut(addr)
        .ok_or_else(|| ConscienceError::ServiceNotFound(addr.to_string()))?;
        entry.score = value;
        entry.locked = true;
        Ok(())
    }

    async fn unlock(&self, service_type: &str, addr: &str) -> Result<(), ConscienceError> {
        let table = self
        .types
        .get(service_type)
        .ok_or_else(|| ConscienceError::UnknownType(service_type.to_string()))?;
        let mut entry = table
        .services
        .get_mut(addr)
        .ok_or_else(|| ConscienceError::ServiceNotFound(addr.to_string()))?;
        entry.locked = false;
        Ok(())
    }

    async fn deregister(&self, service_type: &str, addr: &str) -> Result<(), ConscienceError> {
        let table = self
        .types
        .get(service_type)
        .ok_or_else(|| ConscienceError::UnknownType(service_type.to_string()))?;
        table
        .services
        .remove(addr)
        .ok_or_else(|| ConscienceError::ServiceNotFound(addr.to_string()))?;
        metrics::set_registry_size(service_type, table.services.len());
        Ok(())
    }

    async fn list(&self, service_type: &str, include_expired: bool) -> Result<Vec<ServiceInfo>, ConscienceError> {
        let table = self
        .types
        .get(service_type)
        .ok_or_else(|| ConscienceError::UnknownType(service_type.to_string()))?;
        let now = now_secs();
        let out = table
        .services
        .iter()
        .filter(|e| include_expired || now - e.last_seen <= table.score_expiration_secs)
        .map(|e| e.to_info(service_type))
        .collect();
        Ok(out)
    }

    async fn expire(&self, now: i64) -> Result<usize, ConscienceError> {
        let mut removed = 0;
        for table in self.types.iter() {
            let expiration = table.score_expiration_secs;
            let stale: Vec<String> = table
            .services
            .iter()
            .filter(|e| now - e.last_seen > expiration)
            .map(|e| e.addr.clone())
            .collect();
            for addr in stale {
                if table.services.remove(&addr).is_some() {
                    removed += 1;
                }
            }
            metrics::set_registry_size(table.key(), table.services.len());
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(service_type: &str) -> ConscienceTypeConfig {
        ConscienceTypeConfig {
            service_type: service_type.to_string(),
            score_expr: "cpu".to_string(),
            score_variation_bound: 20,
            score_expiration_secs: 300,
            alert_frequency_limit_secs: 60,
        }
    }

    fn info(addr: &str, cpu: f64) -> ServiceInfo {
        let mut tags = HashMap::new();
        tags.insert("cpu".to_string(), cpu);
        ServiceInfo {
            service_type: "rawx".to_string(),
            addr: addr.to_string(),
            score: 0,
            locked: false,
            last_seen: 0,
            tags,
        }
    }

    #[tokio::test]
    async fn register_unknown_type_errors() {
        let reg = ConscienceRegistry::new(&[]).unwrap();
        let err = reg.register(info("127.0.0.1:6000", 50.0)).await.unwrap_err();
        assert!(matches!(err, ConscienceError::UnknownType(_)));
    }

    #[tokio::test]
    async fn register_clamps_score_variation() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        let first = reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        assert_eq!(first.score, 10);
        // raw jumps to 90 but bound is 20, so score can move at most to 30.
        let second = reg.register(info("127.0.0.1:6000", 90.0)).await.unwrap();
        assert_eq!(second.score, 30);
    }

    #[tokio::test]
    async fn lock_prevents_recompute_until_unlocked() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        reg.lock("rawx", "127.0.0.1:6000", 77).await.unwrap();
        let locked = reg.register(info("127.0.0.1:6000", 99.0)).await.unwrap();
        assert_eq!(locked.score, 77);
        reg.unlock("rawx", "127.0.0.1:6000").await.unwrap();
        let unlocked = reg.register(info("127.0.0.1:6000", 80.0)).await.unwrap();
        assert_eq!(unlocked.score, 97); // 77 + bound(20)
    }

    #[tokio::test]
    async fn lock_rejects_out_of_range_value() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        let err = reg.lock("rawx", "127.0.0.1:6000", 101).await.unwrap_err();
        assert!(matches!(err, ConscienceError::LockOutOfRange(101)));
    }

    #[tokio::test]
    async fn deregister_removes_entry_immediately() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        reg.deregister("rawx", "127.0.0.1:6000").await.unwrap();
        assert!(reg.list("rawx", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deregister_unknown_service_errors() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        let err = reg.deregister("rawx", "127.0.0.1:9999").await.unwrap_err();
        assert!(matches!(err, ConscienceError::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn expire_removes_stale_entries() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        let removed = reg.expire(now_secs() + 10_000).await.unwrap();
        assert_eq!(removed, 1);
        assert!(reg.list("rawx", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_excludes_expired_unless_requested() {
        let reg = ConscienceRegistry::new(&[cfg("rawx")]).unwrap();
        reg.register(info("127.0.0.1:6000", 10.0)).await.unwrap();
        // Directly simulate staleness by expiring far in the future relative
        // to score_expiration, then re-list without actually removing.
        let all = reg.list("rawx", true).await.unwrap();
        assert_eq!(all.len(), 1);
    }
}
