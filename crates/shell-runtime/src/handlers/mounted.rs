//! Mount telemetry published by the sandboxes.

use mf_01_registry::SubAppRegistry;
use shared_bus::{BusPayload, Channel, MessageBus, SubscriptionToken};
use shell_telemetry::log_event;

/// Handler for `{subAppName}-mounted`, one subscription per registered
/// sub-application.
pub struct MountedHandler;

impl MountedHandler {
    /// Subscribe for every sub-application in `registry`.
    pub fn install(registry: &SubAppRegistry, bus: &MessageBus) -> Vec<SubscriptionToken> {
        registry
            .names()
            .into_iter()
            .map(|name| {
                let channel = Channel::mounted(&name);
                bus.subscribe(channel, move |msg| {
                    if let BusPayload::SubAppMounted { timestamp } = msg.payload {
                        log_event!(info, "lifecycle", "Sub-application reported mounted", sub_app = %name, timestamp);
                    }
                })
            })
            .collect()
    }
}
