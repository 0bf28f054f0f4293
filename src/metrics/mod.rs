use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;
use warp::Filter;
use warp::Rejection;
use warp::Reply;


lazy_static! {
    pub static ref IS_LEADER_METRIC: IntGaugeVec = IntGaugeVec::new(
        Opts::new("is_leader", "1 while this candidate holds the lease"),
        &["identity"]
    )
    .expect("metric can not be created");

    pub static ref LEADERSHIP_TRANSITIONS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("leadership_transitions_total", "Leadership edges seen by this candidate"),
        &["identity", "event"]
    )
    .expect("metric can not be created");

    pub static ref LEASE_STORE_ERRORS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("lease_store_errors_total", "Failed lease store attempts by kind"),
        &["identity", "kind"]
    )
    .expect("metric can not be created");

    pub static ref LEASE_CONFLICTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("lease_write_conflicts_total", "Lease writes lost to another candidate"),
        &["identity"]
    )
    .expect("metric can not be created");

    pub static ref WORK_TICKS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("work_ticks_total", "Completed work ticks by outcome"),
        &["identity", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(IS_LEADER_METRIC.clone()),
        Box::new(LEADERSHIP_TRANSITIONS_METRIC.clone()),
        Box::new(LEASE_STORE_ERRORS_METRIC.clone()),
        Box::new(LEASE_CONFLICTS_METRIC.clone()),
        Box::new(WORK_TICKS_METRIC.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            warn!("collector can not be registered: {}", e);
        }
    }
}

pub fn record_leading(
    identity: &str,
    leading: bool,
) {
    IS_LEADER_METRIC
        .with_label_values(&[identity])
        .set(i64::from(leading));
    let event = if leading { "started" } else { "stopped" };
    LEADERSHIP_TRANSITIONS_METRIC
        .with_label_values(&[identity, event])
        .inc();
}

pub fn record_store_error(
    identity: &str,
    kind: &str,
) {
    LEASE_STORE_ERRORS_METRIC
        .with_label_values(&[identity, kind])
        .inc();
}

/// A lost compare-and-swap race. Expected, so kept out of the error count.
pub fn record_conflict(identity: &str) {
    LEASE_CONFLICTS_METRIC.with_label_values(&[identity]).inc();
}

pub fn record_work_tick(
    identity: &str,
    ok: bool,
) {
    let outcome = if ok { "ok" } else { "error" };
    WORK_TICKS_METRIC.with_label_values(&[identity, outcome]).inc();
}

/// Serves `/metrics` until `shutdown` fires
pub async fn start_server(
    port: u16,
    shutdown: CancellationToken,
) {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));

    let metrics_route = warp::path!("metrics").and_then(metrics_handler);

    info!("metrics server listening on 0.0.0.0:{}", port);
    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            shutdown.cancelled().await;
        });
    server.await;
}

pub fn encode_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    };
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}

async fn metrics_handler() -> Result<impl Reply, Rejection> {
    Ok(encode_metrics())
}
