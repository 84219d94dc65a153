// Path: crates/oio-node/src/bin/oio-node.rs
//! The control-plane process binary: loads a TOML configuration file,
//! wires up the conscience registry, directory resolver, META2 engine,
//! chunk layout generator and parallel upload engine, and serves the HTTP
//! gateway until signalled to stop.

use anyhow::{Context, Result};
use clap::Parser;
use oio_conscience::ConscienceRegistry;
use oio_gateway::{serve, AppState, GatewayLimits};
use oio_layout::ChunkLayoutGenerator;
use oio_meta2::Meta2Engine;
use oio_resolver::meta_clients::HttpMetaClient;
use oio_resolver::CachingResolver;
use oio_types::config::Config;
use oio_types::policy::StoragePolicy;
use oio_upload::HttpUploadEngine;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Command-line options for the `oio-node` control-plane process.
#[derive(Parser, Debug)]
#[command(author, version, about = "oio-sds-core control-plane process")]
struct Opts {
    /// Path to the process' TOML configuration file.
    #[arg(long, env = "OIO_CONFIG", default_value = "oio-node.toml")]
    config: PathBuf,
}

/// Resolves a named storage policy to its decoded parameters. Only the
/// single built-in default is known at startup; operators wanting DUPLI/RAIN defaults
/// configure the container's admin row directly.
fn resolve_default_policy(name: &str) -> StoragePolicy {
    let single = StoragePolicy::single();
    if name == single.name {
        single
    } else {
        tracing::warn!(policy = name, "unknown default storage policy, using SINGLE");
        single
    }
}

async fn run(opts: Opts) -> Result<()> {
    oio_telemetry::init_tracing().context("initializing tracing subscriber")?;

    let raw = std::fs::read_to_string(&opts.config)
    .with_context(|| format!("reading config file {:?}", opts.config))?;
    let config: Config = toml::from_str(&raw).context("parsing config file as TOML")?;

    tracing::info!(namespace = %config.namespace.name, "starting oio-node");

    let registry: Arc<dyn oio_api::conscience::ServiceRegistry> = Arc::new(
        ConscienceRegistry::new(&config.conscience.types).context("building conscience registry")?,
    );

    let meta_client = Arc::new(HttpMetaClient::new(
            config.resolver.meta0_base_url.clone(),
            Duration::from_millis(config.upload.timeout_cnx_ms),
        ));
    let resolver: Arc<dyn oio_api::resolver::DirectoryResolver> = Arc::new(CachingResolver::new(
            config.resolver.csm0_ttl_secs,
            config.resolver.csm0_max,
            config.resolver.services_ttl_secs,
            config.resolver.services_max,
            meta_client.clone(),
            meta_client,
        ));

    std::fs::create_dir_all(&config.meta2.data_dir)
    .with_context(|| format!("creating META2 data dir {:?}", config.meta2.data_dir))?;
    let containers = Arc::new(Meta2Engine::new(
            config.meta2.data_dir.clone(),
            config.meta2.default_max_versions,
            config.meta2.retention_delay_secs,
        ));

    let layout = Arc::new(ChunkLayoutGenerator::new());
    let uploader: Arc<dyn oio_api::upload::UploadEngine> = Arc::new(HttpUploadEngine::new());

    let state = AppState {
        namespace: config.namespace.name.clone(),
        registry,
        resolver,
        containers,
        layout,
        uploader,
        default_policy: resolve_default_policy(&config.namespace.default_storage_policy),
        default_chunk_size: config.namespace.chunk_size,
        max_redirects: config.gateway.max_redirects,
        upload_timeouts: oio_api::upload::UploadTimeouts {
            connect: Duration::from_millis(config.upload.timeout_cnx_ms),
            operation: Duration::from_millis(config.upload.timeout_op_ms),
        },
        upload_min_success: config.upload.min_success,
    };

    let limits = GatewayLimits {
        request_timeout: Duration::from_millis(config.gateway.request_timeout_ms),
        ..GatewayLimits::default()
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("received ctrl-c, shutting down");
                let _ = shutdown_tx.send(true);
            }
        });

    serve(&config.gateway.listen_addr, state, limits, shutdown_rx).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Opts::parse();
    run(opts).await
}
