// Path: crates/oio-conscience/src/metrics.rs
//! Local Prometheus metrics for the conscience registry, installed against
//! the shared process-wide registry the same way the gateway's own metrics
//! module installs its counters and histograms.

use once_cell::sync::OnceCell;
use prometheus::{IntGaugeVec, Opts};

static REGISTRY_SIZE: OnceCell<IntGaugeVec> = OnceCell::new();

fn registry_size() -> &'static IntGaugeVec {
    REGISTRY_SIZE.get_or_init(|| {
            let gauge = IntGaugeVec::new(
                Opts::new(
                    "oio_conscience_registry_size",
                    "Number of services currently registered per service type",
                ),
                &["service_type"],
            )
            .expect("build oio_conscience_registry_size gauge");
            oio_telemetry::metrics::registry()
            .register(Box::new(gauge.clone()))
            .expect("register oio_conscience_registry_size");
            gauge
        })
}

pub(crate) fn set_registry_size(service_type: &str, size: usize) {
    registry_size().with_label_values(&[service_type]).set(size as i64);
}
