// Path: crates/oio-types/src/config.rs
//! Configuration structs loaded from a TOML file by `oio-node`. Config
//! loading is an external collaborator to the rest of the stack, but every
//! component still needs to be configurable through it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for a control-plane process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub namespace: NamespaceConfig,
    #[serde(default)]
    pub conscience: ConscienceConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub meta2: Meta2Config,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i64,
    #[serde(default = "default_policy_name")]
    pub default_storage_policy: String,
}

fn default_chunk_size() -> i64 {
    10 * 1024 * 1024
}
fn default_policy_name() -> String {
    "SINGLE".to_string()
}

/// Per-service-type scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConscienceTypeConfig {
    pub service_type: String,
    #[serde(default = "default_score_expr")]
    pub score_expr: String,
    #[serde(default = "default_score_variation_bound")]
    pub score_variation_bound: i32,
    #[serde(default = "default_score_expiration")]
    pub score_expiration_secs: i64,
    #[serde(default = "default_alert_frequency_limit")]
    pub alert_frequency_limit_secs: i64,
}

fn default_score_expr() -> String {
    "cpu".to_string()
}
fn default_score_variation_bound() -> i32 {
    20
}
fn default_score_expiration() -> i64 {
    300
}
fn default_alert_frequency_limit() -> i64 {
    60
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConscienceConfig {
    #[serde(default)]
    pub types: Vec<ConscienceTypeConfig>,
}

/// Resolver cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_csm0_ttl")]
    pub csm0_ttl_secs: i64,
    #[serde(default = "default_csm0_max")]
    pub csm0_max: usize,
    #[serde(default = "default_services_ttl")]
    pub services_ttl_secs: i64,
    #[serde(default = "default_services_max")]
    pub services_max: usize,
    /// Base URL of the META0 root-table service this process' resolver
    /// queries on a `csm0` cache miss.
    #[serde(default = "default_meta0_base_url")]
    pub meta0_base_url: String,
}

fn default_meta0_base_url() -> String {
    "http://127.0.0.1:6001".to_string()
}

fn default_csm0_ttl() -> i64 {
    3600
}
fn default_csm0_max() -> usize {
    4096
}
fn default_services_ttl() -> i64 {
    60
}
fn default_services_max() -> usize {
    65536
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            csm0_ttl_secs: default_csm0_ttl(),
            csm0_max: default_csm0_max(),
            services_ttl_secs: default_services_ttl(),
            services_max: default_services_max(),
            meta0_base_url: default_meta0_base_url(),
        }
    }
}

/// META2 container-engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta2Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_max_versions")]
    pub default_max_versions: i64,
    #[serde(default = "default_retention_delay")]
    pub retention_delay_secs: i64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/meta2")
}
fn default_max_versions() -> i64 {
    -1
}
fn default_retention_delay() -> i64 {
    86400
}

impl Default for Meta2Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_max_versions: default_max_versions(),
            retention_delay_secs: default_retention_delay(),
        }
    }
}

/// Parallel upload engine tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_connect_timeout")]
    pub timeout_cnx_ms: u64,
    #[serde(default = "default_op_timeout")]
    pub timeout_op_ms: u64,
    #[serde(default = "default_min_success")]
    pub min_success: usize,
}

fn default_connect_timeout() -> u64 {
    1000
}
fn default_op_timeout() -> u64 {
    30_000
}
fn default_min_success() -> usize {
    1
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            timeout_cnx_ms: default_connect_timeout(),
            timeout_op_ms: default_op_timeout(),
            min_success: default_min_success(),
        }
    }
}

/// HTTP gateway binding and redirect-loop limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_listen_addr() -> String {
    "127.0.0.1:6007".to_string()
}
fn default_max_redirects() -> u32 {
    7
}
fn default_request_timeout() -> u64 {
    30_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_redirects: default_max_redirects(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_in_defaults() {
        let toml_src = r#"
            [namespace]
            name = "OPENIO"
        "#;
        let cfg: Config = toml::from_str(toml_src).expect("parses");
        assert_eq!(cfg.namespace.name, "OPENIO");
        assert_eq!(cfg.namespace.chunk_size, default_chunk_size());
        assert_eq!(cfg.resolver.csm0_max, default_csm0_max());
        assert_eq!(cfg.gateway.max_redirects, 7);
    }
}
