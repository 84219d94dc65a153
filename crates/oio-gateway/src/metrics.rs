// Path: crates/oio-gateway/src/metrics.rs
//! Gateway-local Prometheus metrics, registered against the shared
//! process-wide registry (`oio_telemetry::metrics::registry()`) rather than
//! prometheus's own default registry, so that `GET /metrics` reports the
//! same registry the other subsystem crates (oio-conscience, oio-meta2,
//! oio-upload) register into.

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use prometheus::{HistogramVec, IntCounterVec};
use std::time::Instant;

static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        let metric = IntCounterVec::new(
            prometheus::Opts::new(
                "oio_gateway_requests_total",
                "Total REST requests handled by the gateway, by route and status class.",
            ),
            &["route", "method", "status"],
        )
        .expect("metric options are valid");
        oio_telemetry::metrics::registry()
        .register(Box::new(metric.clone()))
        .expect("first registration of oio_gateway_requests_total");
        metric
    });

static REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
        let metric = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "oio_gateway_request_duration_seconds",
                "REST request latency in seconds, by route.",
            ),
            &["route", "method"],
        )
        .expect("metric options are valid");
        oio_telemetry::metrics::registry()
        .register(Box::new(metric.clone()))
        .expect("first registration of oio_gateway_request_duration_seconds");
        metric
    });

pub fn observe(route: &str, method: &str, status: u16, elapsed_secs: f64) {
    REQUESTS_TOTAL
    .with_label_values(&[route, method, &status_class(status)])
    .inc();
    REQUEST_DURATION.with_label_values(&[route, method]).observe(elapsed_secs);
}

fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

/// Records `oio_gateway_requests_total`/`oio_gateway_request_duration_seconds`
/// for every request, keyed by the route's axum pattern rather than the raw
/// path (so `/v3.0/{ns}/container/show` is one series, not one per
/// container).
pub async fn record(req: Request, next: Next) -> Response {
    let route = req
    .extensions()
    .get::<MatchedPath>()
    .map(|p| p.as_str().to_string())
    .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().to_string();
    let start = Instant::now();
    let response = next.run(req).await;
    observe(&route, &method, response.status().as_u16(), start.elapsed().as_secs_f64());
    response
}
