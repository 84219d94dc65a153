// Path: crates/oio-resolver/src/meta_clients.rs
//! RPC client contracts for META0 (root table) and META1 (reference
//! directory) lookups. The wire transport itself is out of scope here —
//! only message semantics are specified — and these traits are that
//! message-semantics boundary. Production wiring backs them with an HTTP
//! client, matching the control plane's other all-HTTP tiers; tests back
//! them with in-memory fakes.

use async_trait::async_trait;
use oio_api::resolver::{ObjectUrl, ServiceLocation};
use oio_types::error::DirectoryError;

/// Resolves a reference key (`NS/account/user`) to the set of META1 hosts
/// responsible for it.
#[async_trait]
pub trait Meta0Client: Send + Sync {
    async fn meta1_hosts(&self, reference_key: &str) -> Result<Vec<String>, DirectoryError>;
}

/// Queries one META1 host for the service endpoints of a given type bound to
/// a URL.
#[async_trait]
pub trait Meta1Client: Send + Sync {
    async fn resolve_services(
        &self,
        meta1_host: &str,
        url: &ObjectUrl,
        service_type: &str,
    ) -> Result<Vec<ServiceLocation>, DirectoryError>;
}

/// An HTTP-backed `Meta0Client`/`Meta1Client` pair, calling a directory
/// service the same shape as the `oio-gateway` REST surface.
pub struct HttpMetaClient {
    http: reqwest::Client,
    meta0_base_url: String,
}

impl HttpMetaClient {
    pub fn new(meta0_base_url: String, connect_timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .unwrap_or_default();
        Self {
            http,
            meta0_base_url,
        }
    }
}

#[async_trait]
impl Meta0Client for HttpMetaClient {
    async fn meta1_hosts(&self, reference_key: &str) -> Result<Vec<String>, DirectoryError> {
        let url = format!("{}/meta0/hosts", self.meta0_base_url);
        let resp = self
        .http
        .get(&url)
        .query(&[("ref", reference_key)])
        .send()
        .await
        .map_err(|e| DirectoryError::Backend(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound);
        }
        resp.json::<Vec<String>>()
        .await
        .map_err(|e| DirectoryError::Backend(e.to_string()))
    }
}

#[async_trait]
impl Meta1Client for HttpMetaClient {
    async fn resolve_services(
        &self,
        meta1_host: &str,
        url: &ObjectUrl,
        service_type: &str,
    ) -> Result<Vec<ServiceLocation>, DirectoryError> {
        let endpoint = format!("http://{meta1_host}/meta1/link");
        #[derive(serde::Deserialize)]
        struct Wire {
            seq: u32,
            #[serde(rename = "type")]
            service_type: String,
            host: String,
            #[serde(default)]
            args: Vec<String>,
        }
        let resp = self
        .http
        .get(&endpoint)
        .query(&[
                ("ref", url.reference_key()),
                ("type", service_type.to_string()),
            ])
        .send()
        .await
        .map_err(|e| DirectoryError::Backend(e.to_string()))?;
        if resp.status().as_u16() == 307 {
            let loc = resp
            .headers()
            .get("location")
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
            return Err(DirectoryError::Redirect(loc));
        }
        let wire: Vec<Wire> = resp
        .json()
        .await
        .map_err(|e| DirectoryError::Backend(e.to_string()))?;
        Ok(wire
            .into_iter()
            .map(|w| ServiceLocation {
                    seq: w.seq,
                    service_type: w.service_type,
                    host: w.host,
                    args: w.args,
                })
            .collect())
    }
}
