// Path: crates/oio-gateway/src/lib.rs
#![cfg_attr(
        not(test),
        deny(
            clippy::unwrap_used,
            clippy::expect_used,
            clippy::panic,
            clippy::unimplemented,
            clippy::todo,
            clippy::indexing_slicing
        )
    )]

//! # oio-gateway
//!
//! HTTP gateway composing the conscience, resolver, META2, layout and
//! upload planes behind the REST surface: a layered `tower::ServiceBuilder`
//! around the router, graceful shutdown driven by a `tokio::sync::watch`
//! channel, and a `/metrics` endpoint over the shared Prometheus registry.

mod error;
pub mod metrics;
pub mod rate_limit;
pub mod rawx;
pub mod redirect;
pub mod rest;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{BoxError, Json, Router};
use rate_limit::IpLimiter;
use serde_json::json;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Tunables for [`router`] beyond what lives in [`AppState`].
#[derive(Debug, Clone, Copy)]
pub struct GatewayLimits {
    pub request_timeout: Duration,
    pub concurrency_limit: usize,
    pub body_limit_bytes: usize,
    pub rate_limit_rps: f64,
    pub rate_limit_burst: f64,
}

impl Default for GatewayLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            concurrency_limit: 256,
            body_limit_bytes: 64 * 1024 * 1024,
            rate_limit_rps: 200.0,
            rate_limit_burst: 400.0,
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_handler() -> String {
    oio_telemetry::metrics::gather_text()
}

/// Maps errors raised by the fallible layers (`TimeoutLayer`,
/// `ConcurrencyLimitLayer`, `LoadShedLayer`) to a response.
async fn map_middleware_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(json!({"status": 408, "message": "request timed out"})),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": 503, "message": "OVERLOADED"})),
        )
    }
}

/// Builds the full router: REST surface + `/health` + `/metrics`, with
/// fallible layers innermost behind `HandleErrorLayer` and infallible
/// tracing/panic-catching/body-limit layers outermost.
pub fn router(state: AppState, limits: GatewayLimits) -> Router {
    let ns_scoped = Router::new()
        .route("/conscience/register", post(rest::conscience::register))
        .route("/conscience/list", post(rest::conscience::list))
        .route("/conscience/info", get(rest::conscience::info))
        .route("/conscience/deregister", post(rest::conscience::deregister))
        .route("/conscience/lock", post(rest::conscience::lock))
        .route("/conscience/unlock", post(rest::conscience::unlock))
        .route("/reference/create", post(rest::reference::create))
        .route("/reference/show", get(rest::reference::show))
        .route("/reference/destroy", post(rest::reference::destroy))
        .route("/reference/link", post(rest::reference::link))
        .route("/reference/unlink", post(rest::reference::unlink))
        .route("/reference/renew", post(rest::reference::renew))
        .route("/reference/force", post(rest::reference::force))
        .route("/reference/prop/get", post(rest::reference::prop_get))
        .route("/reference/prop/set", post(rest::reference::prop_set))
        .route("/reference/prop/del", post(rest::reference::prop_del))
        .route("/container/create", post(rest::container::create))
        .route("/container/show", get(rest::container::show))
        .route("/container/destroy", post(rest::container::destroy))
        .route("/container/list", get(rest::container::list))
        .route("/container/dedup", post(rest::container::dedup))
        .route("/container/purge", post(rest::container::purge))
        .route("/container/touch", post(rest::container::touch))
        .route(
            "/container/content",
            get(rest::container::get_content)
                .put(rest::container::put_content)
                .delete(rest::container::delete_content),
        )
        .route("/container/content/prepare", put(rest::container::prepare));

    let limiter = IpLimiter::new(limits.rate_limit_rps, limits.rate_limit_burst);

    let api = Router::new()
        .nest("/v3.0/:ns", ns_scoped)
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(axum::middleware::from_fn(metrics::record))
        .layer(axum::middleware::from_fn_with_state(
            limiter,
            rate_limit::rate_limit_middleware,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(map_middleware_error))
                .load_shed()
                .concurrency_limit(limits.concurrency_limit)
                .timeout(limits.request_timeout),
        )
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
        .with_state(state);

    api
}

/// Serves `router` on `listen_addr` until `shutdown_rx` fires.
pub async fn serve(
    listen_addr: &str,
    state: AppState,
    limits: GatewayLimits,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let app = router(state, limits).into_make_service_with_connect_info::<std::net::SocketAddr>();
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(%listen_addr, "oio-gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
            tracing::info!("oio-gateway shutting down");
        })
        .await?;
    Ok(())
}

#[allow(unused_imports)]
use State as _StateMarker;
