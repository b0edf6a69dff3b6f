//! Structured logging.
//!
//! Every crate logs through `tracing` with structured fields
//! (`sub_app`, `channel`, `path`, ...). This module installs the subscriber
//! that renders them.

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber: `EnvFilter` plus a fmt layer (JSON or
/// human-readable).
pub(crate) fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = build_filter(&config.log_level)?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))
    }
}

pub(crate) fn build_filter(directive: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directive).map_err(|e| TelemetryError::Filter {
        directive: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Log an event tagged with the emitting shell component.
///
/// ```rust,ignore
/// log_event!(info, "lifecycle", "Sub-application active", sub_app = %name);
/// ```
#[macro_export]
macro_rules! log_event {
    (info, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (error, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $component:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            component = $component,
            $($($field)*,)?
            $msg
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_module_directives() {
        assert!(build_filter("info,mf_04_lifecycle=debug").is_ok());
    }

    #[test]
    fn test_filter_rejects_garbage() {
        let err = build_filter("mf_04_lifecycle=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::Filter { .. }));
    }

    #[test]
    fn test_log_event_macro_expands() {
        let sub_app = "order-system";
        log_event!(info, "lifecycle", "Sub-application active", sub_app = %sub_app);
        log_event!(warn, "bus", "No subscribers");
    }
}
