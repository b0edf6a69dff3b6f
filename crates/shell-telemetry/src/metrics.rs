//! Prometheus metrics for the shell.
//!
//! All metrics follow the naming convention `shell_<component>_<metric>`.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Sandboxes that reached `Active` from a fresh load.
    pub static ref SANDBOX_MOUNTS: IntCounterVec = IntCounterVec::new(
        Opts::new("shell_sandbox_mounts_total", "Sandboxes mounted"),
        &["sub_app"]
    ).expect("metric creation failed");

    /// Sandbox load or start failures.
    pub static ref SANDBOX_LOAD_ERRORS: IntCounterVec = IntCounterVec::new(
        Opts::new("shell_sandbox_load_errors_total", "Sandbox load or start failures"),
        &["sub_app"]
    ).expect("metric creation failed");

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Sessions torn down.
    pub static ref SESSION_LOGOUTS: IntCounter = IntCounter::new(
        "shell_session_logouts_total",
        "Sessions cleared (user, sandbox, 401 or refresh failure)"
    ).expect("metric creation failed");

    /// Token refresh attempts.
    pub static ref TOKEN_REFRESHES: IntCounterVec = IntCounterVec::new(
        Opts::new("shell_session_token_refreshes_total", "Token refresh attempts"),
        &["outcome"]  // outcome: success/failure
    ).expect("metric creation failed");

    // =========================================================================
    // ROUTING
    // =========================================================================

    /// Host navigator pushes caused by sandbox navigation.
    pub static ref ROUTE_SYNC_PUSHES: IntCounter = IntCounter::new(
        "shell_route_sync_pushes_total",
        "Host navigator pushes caused by sandbox navigation"
    ).expect("metric creation failed");

    /// Guard redirects by target.
    pub static ref GUARD_REDIRECTS: IntCounterVec = IntCounterVec::new(
        Opts::new("shell_guard_redirects_total", "Navigations redirected by the auth guard"),
        &["target"]  // target: login/forbidden/home
    ).expect("metric creation failed");

    // =========================================================================
    // BUS
    // =========================================================================

    /// Messages published on the host bus (mirrors the bus's own counter).
    pub static ref BUS_MESSAGES_PUBLISHED: IntGauge = IntGauge::new(
        "shell_bus_messages_published",
        "Messages published on the host bus"
    ).expect("metric creation failed");
}

/// Handle proving metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _registered: (),
}

/// Register all metrics with the global registry. Safe to call more than
/// once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Lifecycle
        Box::new(SANDBOX_MOUNTS.clone()),
        Box::new(SANDBOX_LOAD_ERRORS.clone()),
        // Session
        Box::new(SESSION_LOGOUTS.clone()),
        Box::new(TOKEN_REFRESHES.clone()),
        // Routing
        Box::new(ROUTE_SYNC_PUSHES.clone()),
        Box::new(GUARD_REDIRECTS.clone()),
        // Bus
        Box::new(BUS_MESSAGES_PUBLISHED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::Metrics(e.to_string())),
        }
    }

    Ok(MetricsHandle { _registered: () })
}

/// Encode all metrics as Prometheus text format.
pub fn gather_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        register_metrics().unwrap();
        register_metrics().unwrap();
    }

    #[test]
    fn test_gather_contains_registered_metrics() {
        register_metrics().unwrap();
        SESSION_LOGOUTS.inc();
        TOKEN_REFRESHES.with_label_values(&["success"]).inc();

        let text = gather_metrics().unwrap();
        assert!(text.contains("shell_session_logouts_total"));
        assert!(text.contains("shell_session_token_refreshes_total"));
    }

    #[test]
    fn test_gauge_set() {
        BUS_MESSAGES_PUBLISHED.set(42);
        assert_eq!(BUS_MESSAGES_PUBLISHED.get(), 42);
    }
}
