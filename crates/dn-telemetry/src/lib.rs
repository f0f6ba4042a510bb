//! # Data Node Telemetry
//!
//! Logging and metrics for the event broker and subscriber stack.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` registry with an env filter and either
//!   a pretty or a JSON formatting layer.
//! - **Metrics**: Prometheus counters and gauges for bus delivery, subscriber
//!   flushes, store failures and net params updates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dn_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DN_SERVICE_NAME` | `data-node` | Service name in logs |
//! | `DN_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `DN_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `DN_METRICS_ENABLED` | `true` | Register Prometheus metrics |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, register_metrics, BUS_EVENTS_PUBLISHED, BUS_EVENTS_SKIPPED,
    NETPARAMS_UPDATES, STORE_ERRORS, SUBSCRIBERS_ACTIVE, SUBSCRIBER_EVENTS, SUBSCRIBER_FLUSHES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and, when enabled, register the metrics.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    if config.metrics_enabled {
        register_metrics()?;
    }
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        metrics = config.metrics_enabled,
        "Telemetry initialized"
    );
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
