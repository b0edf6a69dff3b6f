//! # Domain Entities
//!
//! The sub-application descriptor.

use crate::domain::errors::RegistryError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Relative path a sandbox starts on when the host path names only its
/// prefix.
pub const DEFAULT_RELATIVE_PATH: &str = "/list";

/// Everything the shell needs to know about one sub-application.
///
/// Immutable after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAppDescriptor {
    /// Unique key; also the sandbox identifier on the bus.
    pub name: String,
    /// URL of the entry document.
    pub entry_url: String,
    /// Host path prefix owned by this sub-application (`/{name}`).
    pub mount_prefix: String,
    /// Relative path used when the host path is exactly the prefix.
    pub default_path: String,
    /// Keep sandbox state across deactivate/activate.
    pub keep_alive: bool,
    /// Use the reduced-isolation sandbox strategy.
    pub degrade: bool,
    /// Execute the entry document's scripts.
    pub exec: bool,
    /// Permission code required to enter the sub-application, if any.
    pub permission_code: Option<String>,
    /// Human-readable title.
    pub title: Option<String>,
    /// Properties merged into every mount.
    pub static_props: BTreeMap<String, Value>,
}

impl SubAppDescriptor {
    /// Descriptor with the conventional prefix and default path.
    pub fn new(name: impl Into<String>, entry_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            mount_prefix: format!("/{name}"),
            default_path: DEFAULT_RELATIVE_PATH.to_string(),
            name,
            entry_url: entry_url.into(),
            keep_alive: false,
            degrade: false,
            exec: true,
            permission_code: None,
            title: None,
            static_props: BTreeMap::new(),
        }
    }

    /// Set keep-alive.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Set degrade mode.
    #[must_use]
    pub fn degrade(mut self, degrade: bool) -> Self {
        self.degrade = degrade;
        self
    }

    /// Override the default relative path.
    #[must_use]
    pub fn with_default_path(mut self, path: impl Into<String>) -> Self {
        self.default_path = path.into();
        self
    }

    /// Require a permission code for the whole sub-application.
    #[must_use]
    pub fn with_permission(mut self, code: impl Into<String>) -> Self {
        self.permission_code = Some(code.into());
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a static mount property.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.static_props.insert(key.into(), value);
        self
    }

    /// Whether `host_path` falls under this sub-application's prefix.
    #[must_use]
    pub fn owns_path(&self, host_path: &str) -> bool {
        host_path == self.mount_prefix
            || host_path
                .strip_prefix(self.mount_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Check structural validity.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidDescriptor {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() || self.name.contains('/') {
            return Err(invalid("name must be non-empty and contain no '/'"));
        }
        if self.entry_url.is_empty() {
            return Err(invalid("entry URL is empty"));
        }
        if !self.mount_prefix.starts_with('/') || self.mount_prefix.len() < 2 {
            return Err(invalid("mount prefix must start with '/' and name a segment"));
        }
        if self.mount_prefix.ends_with('/') {
            return Err(invalid("mount prefix must not end with '/'"));
        }
        if !self.default_path.starts_with('/') {
            return Err(invalid("default path must start with '/'"));
        }
        Ok(())
    }
}
