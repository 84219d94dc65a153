// Path: crates/oio-gateway/src/redirect.rs
//! Redirect-retry loop around `DirectoryResolver::resolve`: if an RPC
//! replies `REDIRECT <addr>`, the gateway retries against the new address;
//! it tracks visited addresses to detect loops (limit 7 redirects →
//! `TOOMANY_REDIRECT`; same address revisited → `LOOP_REDIRECT`).
//!
//! `CachingResolver::resolve` can itself return `DirectoryError::Redirect`
//! as its final error once every META1 host in its round-robin has failed
//! or redirected. This helper is what turns that single-attempt signal into
//! the retry loop described above; the resolver trait itself is not
//! extended.

use oio_api::resolver::{DirectoryResolver, ObjectUrl, ResolveFlags, ServiceLocation};
use oio_types::error::DirectoryError;
use std::collections::HashSet;

/// Resolves `url`/`service_type`, retrying on `DirectoryError::Redirect` by
/// decaching and re-resolving, up to `max_redirects` attempts. Revisiting an
/// already-seen address fails fast with `LoopRedirect`.
pub async fn resolve_with_redirects(
    resolver: &dyn DirectoryResolver,
    url: &ObjectUrl,
    service_type: &str,
    flags: ResolveFlags,
    max_redirects: u32,
) -> Result<Vec<ServiceLocation>, DirectoryError> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut attempts = 0u32;
    loop {
        match resolver.resolve(url, service_type, flags).await {
            Ok(locations) => return Ok(locations),
            Err(DirectoryError::Redirect(addr)) => {
                if attempts >= max_redirects {
                    return Err(DirectoryError::TooManyRedirect(attempts));
                }
                if !visited.insert(addr.clone()) {
                    return Err(DirectoryError::LoopRedirect(addr));
                }
                resolver.decache(url, service_type);
                attempts += 1;
            }
            Err(other) => return Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn url() -> ObjectUrl {
        ObjectUrl {
            namespace: "OPENIO".to_string(),
            account: "acct".to_string(),
            user: "user".to_string(),
            path: "path".to_string(),
        }
    }

    struct ScriptedResolver {
        replies: Mutex<Vec<Result<Vec<ServiceLocation>, DirectoryError>>>,
        decache_calls: AtomicUsize,
    }

    impl ScriptedResolver {
        fn new(replies: Vec<Result<Vec<ServiceLocation>, DirectoryError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                decache_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DirectoryResolver for ScriptedResolver {
        async fn resolve(
            &self,
            _url: &ObjectUrl,
            _service_type: &str,
            _flags: ResolveFlags,
        ) -> Result<Vec<ServiceLocation>, DirectoryError> {
            let mut replies = self.replies.lock().expect("lock");
            if replies.is_empty() {
                panic!("resolver called more times than scripted");
            }
            replies.remove(0)
        }

        fn decache(&self, _url: &ObjectUrl, _service_type: &str) {
            self.decache_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn expire(&self, _now: i64) {}
    }

    fn loc(host: &str) -> ServiceLocation {
        ServiceLocation {
            seq: 0,
            service_type: "meta2".to_string(),
            host: host.to_string(),
            args: vec![],
        }
    }

    #[tokio::test]
    async fn succeeds_without_redirect() {
        let resolver = ScriptedResolver::new(vec![Ok(vec![loc("10.0.0.1:6002")])]);
        let out = resolve_with_redirects(&resolver, &url(), "meta2", ResolveFlags::default(), 7)
        .await
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(resolver.decache_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retries_once_on_redirect_then_succeeds() {
        let resolver = ScriptedResolver::new(vec![
                Err(DirectoryError::Redirect("10.0.0.2:6002".to_string())),
                Ok(vec![loc("10.0.0.2:6002")]),
            ]);
        let out = resolve_with_redirects(&resolver, &url(), "meta2", ResolveFlags::default(), 7)
        .await
        .unwrap();
        assert_eq!(out[0].host, "10.0.0.2:6002");
        assert_eq!(resolver.decache_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn revisiting_an_address_is_a_loop() {
        let resolver = ScriptedResolver::new(vec![
                Err(DirectoryError::Redirect("10.0.0.2:6002".to_string())),
                Err(DirectoryError::Redirect("10.0.0.1:6002".to_string())),
                Err(DirectoryError::Redirect("10.0.0.2:6002".to_string())),
            ]);
        let err = resolve_with_redirects(&resolver, &url(), "meta2", ResolveFlags::default(), 7)
        .await
        .unwrap_err();
        assert!(matches!(err, DirectoryError::LoopRedirect(addr) if addr == "10.0.0.2:6002"));
    }

    #[tokio::test]
    async fn exceeding_max_redirects_fails() {
        let replies = (0..8)
        .map(|i| Err(DirectoryError::Redirect(format!("10.0.0.{i}:6002"))))
        .collect();
        let resolver = ScriptedResolver::new(replies);
        let err = resolve_with_redirects(&resolver, &url(), "meta2", ResolveFlags::default(), 7)
        .await
        .unwrap_err();
        assert!(matches!(err, DirectoryError::TooManyRedirect(7)));
    }
}
