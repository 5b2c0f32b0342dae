use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::exponential_buckets;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramOpts;
use prometheus::IntCounter;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use prometheus::TextEncoder;
use tracing::error;


lazy_static! {
    pub static ref CHANGE_EVENTS_RECEIVED: IntCounter = IntCounter::new(
        "change_events_received",
        "Distinct change events handled by this instance"
    )
    .expect("metric can not be created");

    pub static ref DUPLICATE_EVENTS_DROPPED: IntCounter = IntCounter::new(
        "duplicate_events_dropped",
        "Change events dropped because their id was already handled"
    )
    .expect("metric can not be created");

    pub static ref MISSED_EVENTS: IntCounter = IntCounter::new(
        "missed_events",
        "Change events lost because the subscription lagged"
    )
    .expect("metric can not be created");

    pub static ref KEY_REFRESH_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("key_refresh_total", "Key refreshes by outcome"),
        &["outcome"]
    )
    .expect("metric can not be created");

    pub static ref CONFIG_READS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("config_reads_total", "Configuration reads by result"),
        &["result"]
    )
    .expect("metric can not be created");

    pub static ref EVENT_APPLY_LATENCY_MS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "event_apply_latency_ms",
            "Time to apply one change event in ms"
        )
        .buckets(exponential_buckets(1.0, 2.0, 12).expect("valid buckets"))
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers every collector into `registry`.
pub fn register_custom_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(CHANGE_EVENTS_RECEIVED.clone()),
        Box::new(DUPLICATE_EVENTS_DROPPED.clone()),
        Box::new(MISSED_EVENTS.clone()),
        Box::new(KEY_REFRESH_TOTAL.clone()),
        Box::new(CONFIG_READS_TOTAL.clone()),
        Box::new(EVENT_APPLY_LATENCY_MS.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            error!("collector can not be registered: {}", e);
        }
    }
}

/// Registers the collectors into the crate `REGISTRY` once per process.
pub fn init_metrics() {
    REGISTER.call_once(|| register_custom_metrics(&REGISTRY));
}

/// Renders `registry` in the Prometheus text exposition format.
pub fn encode_metrics(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
        return String::default();
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
