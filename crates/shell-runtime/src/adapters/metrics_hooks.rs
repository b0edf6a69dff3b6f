//! Lifecycle hooks that feed the Prometheus counters.

use mf_04_lifecycle::{LifecycleHooks, SandboxError, TracingHooks};
use shell_telemetry::{metric_inc, SANDBOX_LOAD_ERRORS, SANDBOX_MOUNTS};

/// Counts mounts and load failures per sub-application, then logs like
/// `TracingHooks`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsHooks;

impl LifecycleHooks for MetricsHooks {
    fn after_mount(&self, sub_app: &str) {
        metric_inc!(SANDBOX_MOUNTS, &[sub_app]);
        TracingHooks.after_mount(sub_app);
    }

    fn load_error(&self, sub_app: &str, error: &SandboxError) {
        metric_inc!(SANDBOX_LOAD_ERRORS, &[sub_app]);
        TracingHooks.load_error(sub_app, error);
    }
}
