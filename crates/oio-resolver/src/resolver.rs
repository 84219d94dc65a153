// Path: crates/oio-resolver/src/resolver.rs
//! The caching `DirectoryResolver` implementation.

use crate::cache::TtlLruCache;
use crate::meta_clients::{Meta0Client, Meta1Client};
use async_trait::async_trait;
use oio_api::resolver::{DirectoryResolver, ObjectUrl, ResolveFlags, ServiceLocation};
use oio_types::ids::now_secs;
use oio_types::error::DirectoryError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Two independent TTL+cardinality-bounded caches plus the META0/META1
/// clients that back them on a miss.
pub struct CachingResolver {
    csm0: TtlLruCache<String, Vec<String>>,
    services: TtlLruCache<(String, String), Vec<ServiceLocation>>,
    meta0: Arc<dyn Meta0Client>,
    meta1: Arc<dyn Meta1Client>,
}

impl CachingResolver {
    pub fn new(
        csm0_ttl_secs: i64,
        csm0_max: usize,
        services_ttl_secs: i64,
        services_max: usize,
        meta0: Arc<dyn Meta0Client>,
        meta1: Arc<dyn Meta1Client>,
    ) -> Self {
        Self {
            csm0: TtlLruCache::new(csm0_ttl_secs, csm0_max),
            services: TtlLruCache::new(services_ttl_secs, services_max),
            meta0,
            meta1,
        }
    }

    /// Resolves the META1 host set for a reference key, consulting `csm0`
    /// first unless `NOCACHE`.
    async fn meta1_hosts(
        &self,
        reference_key: &str,
        flags: ResolveFlags,
        now: i64,
    ) -> Result<Vec<String>, DirectoryError> {
        if !flags.contains(ResolveFlags::NOCACHE) {
            if let Some(hosts) =
            self.csm0
            .get(&reference_key.to_string(), now, flags.contains(ResolveFlags::NOATIME))
            {
                return Ok(hosts);
            }
        }
        let hosts = self.meta0.meta1_hosts(reference_key).await?;
        self.csm0.insert(
            reference_key.to_string(),
            hosts.clone(),
            now,
            flags.contains(ResolveFlags::NOMAX),
        );
        Ok(hosts)
    }

    /// Queries each META1 host in round-robin until one answers.
    async fn query_meta1_round_robin(
        &self,
        hosts: &[String],
        url: &ObjectUrl,
        service_type: &str,
    ) -> Result<Vec<ServiceLocation>, DirectoryError> {
        let mut last_err = DirectoryError::NotFound;
        for host in hosts {
            match self.meta1.resolve_services(host, url, service_type).await {
                Ok(locations) => return Ok(locations),
                Err(e) => {
                    debug!(host = %host, error = %e, "meta1 host did not answer, trying next");
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

#[async_trait]
impl DirectoryResolver for CachingResolver {
    async fn resolve(
        &self,
        url: &ObjectUrl,
        service_type: &str,
        flags: ResolveFlags,
    ) -> Result<Vec<ServiceLocation>, DirectoryError> {
        let now = now_secs();
        let services_key = (url.reference_key(), service_type.to_string());

        if !flags.contains(ResolveFlags::NOCACHE) {
            if let Some(locations) =
            self.services
            .get(&services_key, now, flags.contains(ResolveFlags::NOATIME))
            {
                return Ok(locations);
            }
        }

        let hosts = self
        .meta1_hosts(&url.reference_key(), flags, now)
        .await?;
        if hosts.is_empty() {
            return Err(DirectoryError::NotFound);
        }
        let locations = self
        .query_meta1_round_robin(&hosts, url, service_type)
        .await?;

        self.services.insert(
            services_key,
            locations.clone(),
            now,
            flags.contains(ResolveFlags::NOMAX),
        );
        Ok(locations)
    }

    fn decache(&self, url: &ObjectUrl, service_type: &str) {
        warn!(reference = %url.reference_key(), service_type, "decaching resolver entry");
        self.services
        .remove(&(url.reference_key(), service_type.to_string()));
    }

    fn expire(&self, now: i64) {
        self.csm0.expire(now);
        self.services.expire(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeMeta0 {
        hosts: HashMap<String, Vec<String>>,
    }

    #[async_trait]
    impl Meta0Client for FakeMeta0 {
        async fn meta1_hosts(&self, reference_key: &str) -> Result<Vec<String>, DirectoryError> {
            self.hosts
            .get(reference_key)
            .cloned()
            .ok_or(DirectoryError::NotFound)
        }
    }

    struct FakeMeta1 {
        /// host -> `None` means "did not answer"; used to exercise round-robin.
        answers: Mutex<HashMap<String, Option<Vec<ServiceLocation>>>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Meta1Client for FakeMeta1 {
        async fn resolve_services(
            &self,
            meta1_host: &str,
            _url: &ObjectUrl,
            _service_type: &str,
        ) -> Result<Vec<ServiceLocation>, DirectoryError> {
            self.calls.lock().unwrap().push(meta1_host.to_string());
            match self.answers.lock().unwrap().get(meta1_host).cloned().flatten() {
                Some(locations) => Ok(locations),
                None => Err(DirectoryError::ReadTimeout),
            }
        }
    }

    fn url() -> ObjectUrl {
        ObjectUrl {
            namespace: "NS".into(),
            account: "acct".into(),
            user: "user".into(),
            path: "a".into(),
        }
    }

    fn location(host: &str) -> ServiceLocation {
        ServiceLocation {
            seq: 1,
            service_type: "meta2".into(),
            host: host.to_string(),
            args: vec![],
        }
    }

    #[tokio::test]
    async fn resolve_hits_csm0_then_meta1_and_caches() {
        let mut hosts = HashMap::new();
        hosts.insert("NS/acct/user".to_string(), vec!["m1a".to_string()]);
        let meta0 = Arc::new(FakeMeta0 { hosts });
        let mut answers = HashMap::new();
        answers.insert("m1a".to_string(), Some(vec![location("meta2-1")]));
        let meta1 = Arc::new(FakeMeta1 {
                answers: Mutex::new(answers),
                calls: Mutex::new(vec![]),
            });
        let resolver = CachingResolver::new(60, 10, 60, 10, meta0, meta1.clone());

        let result = resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        assert_eq!(result, vec![location("meta2-1")]);
        assert_eq!(meta1.calls.lock().unwrap().len(), 1);

        // Second call hits the services cache; meta1 is not queried again.
        let result2 = resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        assert_eq!(result2, result);
        assert_eq!(meta1.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolve_tries_next_meta1_host_on_failure() {
        let mut hosts = HashMap::new();
        hosts.insert(
            "NS/acct/user".to_string(),
            vec!["m1a".to_string(), "m1b".to_string()],
        );
        let meta0 = Arc::new(FakeMeta0 { hosts });
        let mut answers = HashMap::new();
        answers.insert("m1b".to_string(), Some(vec![location("meta2-2")]));
        let meta1 = Arc::new(FakeMeta1 {
                answers: Mutex::new(answers),
                calls: Mutex::new(vec![]),
            });
        let resolver = CachingResolver::new(60, 10, 60, 10, meta0, meta1.clone());

        let result = resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        assert_eq!(result, vec![location("meta2-2")]);
        assert_eq!(*meta1.calls.lock().unwrap(), vec!["m1a", "m1b"]);
    }

    #[tokio::test]
    async fn nocache_bypasses_both_caches() {
        let mut hosts = HashMap::new();
        hosts.insert("NS/acct/user".to_string(), vec!["m1a".to_string()]);
        let meta0 = Arc::new(FakeMeta0 { hosts });
        let mut answers = HashMap::new();
        answers.insert("m1a".to_string(), Some(vec![location("meta2-1")]));
        let meta1 = Arc::new(FakeMeta1 {
                answers: Mutex::new(answers),
                calls: Mutex::new(vec![]),
            });
        let resolver = CachingResolver::new(60, 10, 60, 10, meta0, meta1.clone());

        resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        resolver
        .resolve(&url(), "meta2", ResolveFlags::NOCACHE)
        .await
        .unwrap();
        assert_eq!(meta1.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn decache_forces_fresh_lookup() {
        let mut hosts = HashMap::new();
        hosts.insert("NS/acct/user".to_string(), vec!["m1a".to_string()]);
        let meta0 = Arc::new(FakeMeta0 { hosts });
        let mut answers = HashMap::new();
        answers.insert("m1a".to_string(), Some(vec![location("meta2-1")]));
        let meta1 = Arc::new(FakeMeta1 {
                answers: Mutex::new(answers),
                calls: Mutex::new(vec![]),
            });
        let resolver = CachingResolver::new(60, 10, 60, 10, meta0, meta1.clone());

        resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        resolver.decache(&url(), "meta2");
        resolver
        .resolve(&url(), "meta2", ResolveFlags::empty())
        .await
        .unwrap();
        assert_eq!(meta1.calls.lock().unwrap().len(), 2);
    }
}
