//! # Bus Messages
//!
//! Channel names and payloads that flow between the host shell and the
//! sandboxes.
//!
//! | Channel | Payload | Direction |
//! |---|---|---|
//! | `session-changed` | `SessionSnapshot` | host → all sandboxes |
//! | `auth:getToken` | `{sender}` | sandbox → host |
//! | `auth:setAuthInfo:{sender}` | `SessionSnapshot` | host → requesting sandbox |
//! | `auth:logout` | `{}` | sandbox → host |
//! | `sub-route-change` | `{subAppName, relativePath}` | sandbox → host |
//! | `{subAppName}-mounted` | `{timestamp}` | sandbox → host |

use serde::{Deserialize, Serialize};
use shared_types::SessionSnapshot;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a published message.
pub type MessageId = Uuid;

/// A named bus channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Session broadcast to every sandbox.
    pub const SESSION_CHANGED: &'static str = "session-changed";
    /// Pull request for the current session.
    pub const AUTH_GET_TOKEN: &'static str = "auth:getToken";
    /// Prefix of the sender-scoped reply channel.
    pub const AUTH_SET_AUTH_INFO_PREFIX: &'static str = "auth:setAuthInfo:";
    /// Logout requested by a sandbox.
    pub const AUTH_LOGOUT: &'static str = "auth:logout";
    /// Sandbox-initiated route change.
    pub const SUB_ROUTE_CHANGE: &'static str = "sub-route-change";
    /// Suffix of the per-sub-app mounted telemetry channel.
    pub const MOUNTED_SUFFIX: &'static str = "-mounted";

    /// Arbitrary channel name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `session-changed`
    #[must_use]
    pub fn session_changed() -> Self {
        Self::new(Self::SESSION_CHANGED)
    }

    /// `auth:getToken`
    #[must_use]
    pub fn auth_get_token() -> Self {
        Self::new(Self::AUTH_GET_TOKEN)
    }

    /// `auth:setAuthInfo:{sender}`; scoped per sender so concurrent
    /// requesters never see each other's replies.
    #[must_use]
    pub fn auth_reply(sender: &str) -> Self {
        Self(format!("{}{sender}", Self::AUTH_SET_AUTH_INFO_PREFIX))
    }

    /// `auth:logout`
    #[must_use]
    pub fn auth_logout() -> Self {
        Self::new(Self::AUTH_LOGOUT)
    }

    /// `sub-route-change`
    #[must_use]
    pub fn sub_route_change() -> Self {
        Self::new(Self::SUB_ROUTE_CHANGE)
    }

    /// `{sub_app}-mounted`
    #[must_use]
    pub fn mounted(sub_app: &str) -> Self {
        Self(format!("{sub_app}{}", Self::MOUNTED_SUFFIX))
    }

    /// Channel name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Everything that can be carried on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BusPayload {
    /// The session was mutated (login, refresh, logout).
    SessionChanged(SessionSnapshot),

    /// A sandbox asks for the current session.
    AuthGetToken {
        /// Sandbox identifier; the reply goes to `auth:setAuthInfo:{sender}`.
        sender: String,
    },

    /// Reply to `AuthGetToken`.
    AuthSetAuthInfo(SessionSnapshot),

    /// A sandbox asks the host to log out.
    AuthLogout,

    /// A sandbox navigated internally.
    #[serde(rename_all = "camelCase")]
    SubRouteChange {
        /// Emitting sub-application.
        sub_app_name: String,
        /// New path relative to the sub-application's mount prefix.
        relative_path: String,
    },

    /// A sandbox finished mounting (telemetry only).
    SubAppMounted {
        /// Milliseconds since the Unix epoch.
        timestamp: i64,
    },

    /// Free-form payload for business channels outside the shell core.
    Custom(serde_json::Value),
}

impl BusPayload {
    /// Short name for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionChanged(_) => "session-changed",
            Self::AuthGetToken { .. } => "auth-get-token",
            Self::AuthSetAuthInfo(_) => "auth-set-auth-info",
            Self::AuthLogout => "auth-logout",
            Self::SubRouteChange { .. } => "sub-route-change",
            Self::SubAppMounted { .. } => "sub-app-mounted",
            Self::Custom(_) => "custom",
        }
    }

    /// Session carried by the payload, if it carries one.
    #[must_use]
    pub fn session_snapshot(&self) -> Option<&SessionSnapshot> {
        match self {
            Self::SessionChanged(snapshot) | Self::AuthSetAuthInfo(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// A published message as seen by handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Channel the message was published on.
    pub channel: Channel,
    /// Identifier of the publishing context.
    pub sender_id: String,
    /// Publish time, milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Message content.
    pub payload: BusPayload,
}

impl BusMessage {
    /// Stamp a new message.
    pub fn new(channel: Channel, payload: BusPayload, sender_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel,
            sender_id: sender_id.into(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            payload,
        }
    }
}
