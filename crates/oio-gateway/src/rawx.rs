// Path: crates/oio-gateway/src/rawx.rs
//! Adapts a one-shot `ServiceRegistry::list("rawx",..)` snapshot into the
//! synchronous, pull-based `RawxIterator` the layout generator expects
//!.
//!
//! The registry call is async and happens once, before `generate()` runs;
//! `RawxPool` itself just round-robins over the snapshot it was handed.

use oio_api::conscience::ServiceInfo;
use oio_api::layout::{RawxCandidate, RawxIterator};

pub struct RawxPool {
    candidates: Vec<RawxCandidate>,
    cursor: usize,
}

impl RawxPool {
    /// Orders candidates by descending score so that healthier RAWX
    /// services are offered first, the way the conscience registry itself
    /// ranks services for callers that ask for "the best".
    pub fn from_services(mut services: Vec<ServiceInfo>) -> Self {
        services.sort_by(|a, b| b.score.cmp(&a.score));
        let candidates = services
        .into_iter()
        .map(|s| RawxCandidate { addr: s.addr })
        .collect();
        Self { candidates, cursor: 0 }
    }
}

impl RawxIterator for RawxPool {
    fn next_candidates(
        &mut self,
        count: u32,
        _distance: u32,
        _storage_class: &str,
    ) -> Option<Vec<RawxCandidate>> {
        if self.candidates.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let idx = self.cursor % self.candidates.len();
            out.push(self.candidates[idx].clone());
            self.cursor += 1;
        }
        if out.len() < count as usize {
            None
        } else {
            Some(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn svc(addr: &str, score: i32) -> ServiceInfo {
        ServiceInfo {
            service_type: "rawx".to_string(),
            addr: addr.to_string(),
            score,
            locked: false,
            last_seen: 0,
            tags: HashMap::new(),
        }
    }

    #[test]
    fn orders_by_descending_score() {
        let mut pool = RawxPool::from_services(vec![svc("a", 10), svc("b", 90)]);
        let picked = pool.next_candidates(1, 1, "STANDARD").unwrap();
        assert_eq!(picked[0].addr, "b");
    }

    #[test]
    fn wraps_around_when_fewer_candidates_than_requested() {
        let mut pool = RawxPool::from_services(vec![svc("a", 50)]);
        let picked = pool.next_candidates(2, 1, "STANDARD").unwrap();
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].addr, "a");
        assert_eq!(picked[1].addr, "a");
    }

    #[test]
    fn empty_pool_yields_none() {
        let mut pool = RawxPool::from_services(vec![]);
        assert!(pool.next_candidates(1, 1, "STANDARD").is_none());
    }
}
