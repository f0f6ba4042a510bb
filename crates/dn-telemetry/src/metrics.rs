//! Prometheus metrics for the broker, subscribers and net params store.
//!
//! All metrics follow the naming convention: `dn_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., events published)
//! - **Gauge**: Value that can go up or down (e.g., active subscribers)

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BROKER METRICS
    // =========================================================================

    /// Events accepted by the broker for fan-out
    pub static ref BUS_EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("dn_bus_events_published_total", "Events published to the broker"),
        &["event_type"]
    ).expect("metric creation failed");

    /// Per-subscriber deliveries dropped by the broker
    pub static ref BUS_EVENTS_SKIPPED: CounterVec = CounterVec::new(
        Opts::new("dn_bus_events_skipped_total", "Deliveries skipped by the broker"),
        &["reason"]  // reason: paused/timeout/closed
    ).expect("metric creation failed");

    /// Subscribers currently registered with the broker
    pub static ref SUBSCRIBERS_ACTIVE: IntGauge = IntGauge::new(
        "dn_subscribers_active",
        "Number of subscribers registered with the broker"
    ).expect("metric creation failed");

    // =========================================================================
    // SUBSCRIBER METRICS
    // =========================================================================

    /// Events handled by a subscriber's push
    pub static ref SUBSCRIBER_EVENTS: CounterVec = CounterVec::new(
        Opts::new("dn_subscriber_events_total", "Events pushed to subscribers"),
        &["subscriber"]
    ).expect("metric creation failed");

    /// Non-empty buffer flushes
    pub static ref SUBSCRIBER_FLUSHES: CounterVec = CounterVec::new(
        Opts::new("dn_subscriber_flushes_total", "Subscriber buffer flushes"),
        &["subscriber"]
    ).expect("metric creation failed");

    /// Store writes that failed and were dropped
    pub static ref STORE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("dn_store_errors_total", "Store persistence failures"),
        &["store"]
    ).expect("metric creation failed");

    // =========================================================================
    // NET PARAMS METRICS
    // =========================================================================

    /// Net params update attempts
    pub static ref NETPARAMS_UPDATES: CounterVec = CounterVec::new(
        Opts::new("dn_netparams_updates_total", "Network parameter update attempts"),
        &["outcome"]  // outcome: applied/rejected
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Broker
        Box::new(BUS_EVENTS_PUBLISHED.clone()),
        Box::new(BUS_EVENTS_SKIPPED.clone()),
        Box::new(SUBSCRIBERS_ACTIVE.clone()),
        // Subscribers
        Box::new(SUBSCRIBER_EVENTS.clone()),
        Box::new(SUBSCRIBER_FLUSHES.clone()),
        Box::new(STORE_ERRORS.clone()),
        // Net params
        Box::new(NETPARAMS_UPDATES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_encode() {
        // May fail if already registered by another test, which is fine
        let _ = register_metrics();
        BUS_EVENTS_PUBLISHED.with_label_values(&["order"]).inc();

        let text = encode_metrics().unwrap();
        assert!(text.contains("dn_bus_events_published_total"));
    }

    #[test]
    fn test_counter_increment() {
        STORE_ERRORS.with_label_values(&["orders"]).inc();
        assert!(STORE_ERRORS.with_label_values(&["orders"]).get() >= 1.0);
    }

    #[test]
    fn test_gauge_moves_both_ways() {
        SUBSCRIBERS_ACTIVE.inc();
        SUBSCRIBERS_ACTIVE.dec();
        assert!(SUBSCRIBERS_ACTIVE.get() >= 0);
    }
}
