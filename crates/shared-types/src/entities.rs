//! # Core Domain Entities
//!
//! Session-related values shared by the host shell and every sandbox.
//!
//! ## Clusters
//!
//! - **Identity**: `UserProfile`, `PermissionSet`
//! - **Session**: `SessionSnapshot` (the value carried on the bus and
//!   injected into sandboxes at mount time)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Set of opaque permission codes (e.g. `order:write`).
pub type PermissionSet = BTreeSet<String>;

/// Profile of the logged-in user as returned by the authentication API.
///
/// Unknown fields are preserved in `extra` so sandboxes see the same shape
/// the backend produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user identifier.
    #[serde(default)]
    pub id: String,
    /// Login name.
    pub username: String,
    /// Contact address, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Administrative flag.
    #[serde(default)]
    pub is_admin: bool,
    /// Permission codes granted to the user.
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Any additional backend fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl UserProfile {
    /// Create a profile with a username and permission codes.
    pub fn new(id: impl Into<String>, username: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            permissions: permissions.iter().map(|p| (*p).to_string()).collect(),
            ..Self::default()
        }
    }

    /// Derive the permission-code set from the profile.
    #[must_use]
    pub fn permission_codes(&self) -> PermissionSet {
        self.permissions.iter().cloned().collect()
    }
}

// =============================================================================
// CLUSTER B: SESSION
// =============================================================================

/// Immutable view of the process-wide session.
///
/// This is the payload of `session-changed` and `auth:setAuthInfo:{sender}`
/// and the credential part of mount-time properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Opaque credential token. `None` means logged out.
    pub token: Option<String>,
    /// Cached profile of the token's owner.
    pub user_profile: Option<UserProfile>,
    /// Permission codes derived from the profile.
    #[serde(default)]
    pub permission_codes: PermissionSet,
}

impl SessionSnapshot {
    /// The logged-out snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot for a token whose profile is already known.
    pub fn authenticated(token: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            permission_codes: profile.permission_codes(),
            user_profile: Some(profile),
        }
    }

    /// Token presence is the sole authority for "logged in".
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Membership test for a permission code.
    #[must_use]
    pub fn has_permission(&self, code: &str) -> bool {
        self.permission_codes.contains(code)
    }

    /// Username for display, if a profile is cached.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.user_profile.as_ref().map(|p| p.username.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_codes_derived_from_profile() {
        let profile = UserProfile::new("1", "alice", &["order:read", "order:write"]);
        let snapshot = SessionSnapshot::authenticated("tok", profile);

        assert!(snapshot.is_logged_in());
        assert!(snapshot.has_permission("order:write"));
        assert!(!snapshot.has_permission("user:create"));
        assert_eq!(snapshot.username(), Some("alice"));
    }

    #[test]
    fn test_empty_snapshot_is_logged_out() {
        let snapshot = SessionSnapshot::empty();
        assert!(!snapshot.is_logged_in());
        assert!(snapshot.permission_codes.is_empty());
    }

    #[test]
    fn test_snapshot_wire_shape_is_camel_case() {
        let profile = UserProfile::new("7", "bob", &["product:read"]);
        let snapshot = SessionSnapshot::authenticated("abc", profile);
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["token"], "abc");
        assert_eq!(json["userProfile"]["username"], "bob");
        assert_eq!(json["permissionCodes"][0], "product:read");
    }

    #[test]
    fn test_profile_keeps_unknown_backend_fields() {
        let json = serde_json::json!({
            "id": "1",
            "username": "carol",
            "permissions": ["user:read"],
            "department": "ops"
        });
        let profile: UserProfile = serde_json::from_value(json).unwrap();

        assert_eq!(profile.extra["department"], "ops");
        assert!(profile.permission_codes().contains("user:read"));
    }
}
