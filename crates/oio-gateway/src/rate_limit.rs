// Path: crates/oio-gateway/src/rate_limit.rs
//! Per-IP token-bucket rate limiting. Some gateways of this shape trust
//! `x-forwarded-for` only from a configured, `ipnetwork`-backed allowlist of
//! trusted proxy CIDRs; that crate is not part of this workspace's
//! dependency graph, so this simplified version always keys on the
//! socket's peer address instead of trusting any forwarding header
//! (documented in DESIGN.md as a deliberate scope reduction, not an
//! oversight).

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket limiter keyed by peer IP; `rps` tokens refill per second, up
/// to a `burst` ceiling.
#[derive(Clone)]
pub struct IpLimiter {
    buckets: Arc<DashMap<IpAddr, Bucket>>,
    rps: f64,
    burst: f64,
}

impl IpLimiter {
    pub fn new(rps: f64, burst: f64) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            rps,
            burst,
        }
    }

    fn allow(&self, ip: IpAddr) -> bool {
        let mut bucket = self.buckets.entry(ip).or_insert_with(|| Bucket {
                tokens: self.burst,
                last_refill: Instant::now(),
            });
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rps).min(self.burst);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<IpLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if limiter.allow(addr.ip()) {
        Ok(next.run(req).await)
    } else {
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_burst_then_rejects() {
        let limiter = IpLimiter::new(1.0, 2.0);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));
    }

    #[test]
    fn separate_ips_have_independent_buckets() {
        let limiter = IpLimiter::new(1.0, 1.0);
        let a: IpAddr = "127.0.0.1".parse().unwrap();
        let b: IpAddr = "127.0.0.2".parse().unwrap();
        assert!(limiter.allow(a));
        assert!(limiter.allow(b));
        assert!(!limiter.allow(a));
    }
}
