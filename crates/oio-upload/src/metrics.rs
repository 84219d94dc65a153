// Path: crates/oio-upload/src/metrics.rs
//! Local Prometheus metrics for the upload engine, registered against the
//! shared process-wide registry from `oio_telemetry::metrics::registry()`.

use once_cell::sync::OnceCell;
use prometheus::{IntCounterVec, Opts};

static DESTINATIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

fn destinations_total() -> &'static IntCounterVec {
    DESTINATIONS_TOTAL.get_or_init(|| {
            let counter = IntCounterVec::new(
                Opts::new(
                    "oio_upload_destinations_total",
                    "Number of per-destination PUTs completed, by outcome",
                ),
                &["outcome"],
            )
            .expect("build oio_upload_destinations_total counter");
        oio_telemetry::metrics::registry()
            .register(Box::new(counter.clone()))
            .expect("register oio_upload_destinations_total");
            counter
        })
}

pub(crate) fn record_destination(outcome: &str) {
    destinations_total().with_label_values(&[outcome]).inc();
}
