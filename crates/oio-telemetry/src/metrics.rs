// Path: crates/oio-telemetry/src/metrics.rs
//! A single process-wide Prometheus registry, installed once. Subsystems
//! register their own counters/histograms into it via `registry()`, using
//! `prometheus::register_int_counter_vec!` against the default registry.

use once_cell::sync::Lazy;
use prometheus::Registry;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Returns the shared process-wide metrics registry.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Renders the registry in Prometheus text exposition format, for a
/// `GET /metrics` handler.
pub fn gather_text() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&metric_families, &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
