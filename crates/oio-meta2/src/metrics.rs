// Path: crates/oio-meta2/src/metrics.rs
//! Local Prometheus metrics for the META2 engine, registered against the
//! shared process-wide registry from `oio_telemetry::metrics::registry()`.

use once_cell::sync::OnceCell;
use prometheus::{IntCounterVec, IntGauge, Opts};

static CONTAINERS_OPEN: OnceCell<IntGauge> = OnceCell::new();
static OPERATIONS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

fn containers_open() -> &'static IntGauge {
    CONTAINERS_OPEN.get_or_init(|| {
            let gauge = IntGauge::new(
                "oio_meta2_containers_open",
                "Number of container SQLite pools currently held open",
            )
            .expect("build oio_meta2_containers_open gauge");
            oio_telemetry::metrics::registry()
            .register(Box::new(gauge.clone()))
            .expect("register oio_meta2_containers_open");
            gauge
        })
}

fn operations_total() -> &'static IntCounterVec {
    OPERATIONS_TOTAL.get_or_init(|| {
            let counter = IntCounterVec::new(
                Opts::new(
                    "oio_meta2_operations_total",
                    "Number of META2 operations processed, by operation and outcome",
                ),
                &["operation", "outcome"],
            )
            .expect("build oio_meta2_operations_total counter");
        oio_telemetry::metrics::registry()
            .register(Box::new(counter.clone()))
            .expect("register oio_meta2_operations_total");
            counter
        })
}

pub(crate) fn set_containers_open(count: i64) {
    containers_open().set(count);
}

pub(crate) fn record_operation(operation: &str, outcome: &str) {
    operations_total()
    .with_label_values(&[operation, outcome])
    .inc();
}
