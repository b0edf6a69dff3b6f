//! # Shell Telemetry
//!
//! Logging and metrics for the host shell.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shell_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SHELL_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SHELL_JSON_LOGS` | `false` | JSON log lines |
//! | `SHELL_SERVICE_NAME` | `micro-shell` | Service name on every line |
//! | `SHELL_METRICS` | `true` | Register Prometheus metrics |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    gather_metrics, register_metrics, MetricsHandle, BUS_MESSAGES_PUBLISHED, GUARD_REDIRECTS,
    ROUTE_SYNC_PUSHES, SANDBOX_LOAD_ERRORS, SANDBOX_MOUNTS, SESSION_LOGOUTS, TOKEN_REFRESHES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive did not parse.
    #[error("Invalid log filter '{directive}': {reason}")]
    Filter {
        /// Rejected directive
        directive: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    /// Metric registration or encoding failed.
    #[error("Prometheus metrics error: {0}")]
    Metrics(String),
}

/// Install the log subscriber and register metrics.
///
/// Returns a guard to hold for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = if config.metrics_enabled {
        Some(register_metrics()?)
    } else {
        None
    };

    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        metrics = config.metrics_enabled,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _metrics: metrics,
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _metrics: Option<MetricsHandle>,
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Increment a metric, optionally with label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_service_name() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "micro-shell");
    }

    #[test]
    fn test_metric_inc_macro() {
        let before = ROUTE_SYNC_PUSHES.get();
        metric_inc!(ROUTE_SYNC_PUSHES);
        assert!(ROUTE_SYNC_PUSHES.get() > before);

        metric_inc!(SANDBOX_MOUNTS, &["macro-test"]);
        assert_eq!(SANDBOX_MOUNTS.with_label_values(&["macro-test"]).get(), 1);
    }
}
