//! # Mount-Time Properties
//!
//! What a sandbox receives when it is started: its initial relative path,
//! the session at that moment, and the sub-application's static props.

use crate::entities::{SessionSnapshot, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Properties injected into a sandbox at mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MountProps {
    /// Initial path inside the sandbox.
    pub route_path: String,
    /// Session token.
    pub token: Option<String>,
    /// Session profile.
    pub user_info: Option<UserProfile>,
    /// Session permission codes.
    pub permissions: Vec<String>,
    /// Descriptor props (`jumpBase`, ...).
    #[serde(flatten)]
    pub static_props: BTreeMap<String, Value>,
}

impl MountProps {
    /// Props for a mount at `route_path` with the given session.
    pub fn new(
        route_path: impl Into<String>,
        session: &SessionSnapshot,
        static_props: &BTreeMap<String, Value>,
    ) -> Self {
        Self {
            route_path: route_path.into(),
            token: session.token.clone(),
            user_info: session.user_profile.clone(),
            permissions: session.permission_codes.iter().cloned().collect(),
            static_props: static_props.clone(),
        }
    }

    /// Session part of the props.
    #[must_use]
    pub fn session(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            user_profile: self.user_info.clone(),
            permission_codes: self.permissions.iter().cloned().collect(),
        }
    }

    /// Static prop lookup.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.static_props.get(key)
    }
}
