//! Telemetry configuration from environment variables.

use std::env;

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to the startup line.
    pub service_name: String,

    /// Log filter directive (`info`, `mf_04_lifecycle=debug`, ...).
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,

    /// Register Prometheus metrics.
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "micro-shell".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `SHELL_SERVICE_NAME`: Service name (default: micro-shell)
    /// - `SHELL_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `SHELL_JSON_LOGS`: JSON output (default: false)
    /// - `SHELL_METRICS`: Metrics registration (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            service_name: lookup("SHELL_SERVICE_NAME").unwrap_or(defaults.service_name),
            log_level: lookup("SHELL_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            json_logs: lookup("SHELL_JSON_LOGS")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.json_logs),
            metrics_enabled: lookup("SHELL_METRICS")
                .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Override the log filter (command line wins over environment).
    #[must_use]
    pub fn with_log_level(mut self, level: Option<String>) -> Self {
        if let Some(level) = level {
            self.log_level = level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        assert_eq!(TelemetryConfig::from_lookup(lookup(&[])), TelemetryConfig::default());
    }

    #[test]
    fn test_shell_level_wins_over_rust_log() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("SHELL_LOG_LEVEL", "debug"),
            ("RUST_LOG", "warn"),
        ]));
        assert_eq!(config.log_level, "debug");

        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_boolean_switches() {
        let config = TelemetryConfig::from_lookup(lookup(&[
            ("SHELL_JSON_LOGS", "TRUE"),
            ("SHELL_METRICS", "0"),
        ]));
        assert!(config.json_logs);
        assert!(!config.metrics_enabled);
    }

    #[test]
    fn test_cli_override() {
        let config = TelemetryConfig::default().with_log_level(Some("trace".to_string()));
        assert_eq!(config.log_level, "trace");
        let config = TelemetryConfig::default().with_log_level(None);
        assert_eq!(config.log_level, "info");
    }
}
