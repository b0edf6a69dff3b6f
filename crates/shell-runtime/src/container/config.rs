//! # Shell Configuration
//!
//! Unified configuration for every shell component, loaded from a JSON file
//! and overridden from the environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SHELL_AUTH_URL` | Authentication API base URL |
//! | `SHELL_CURRENT_HOST` | Host used to build production entry URLs |
//! | `SHELL_PRELOAD` | `false` disables preloading |
//! | `SHELL_DEGRADE` | `true` forces the reduced-isolation sandbox |

use mf_01_registry::{RegistryConfig, RegistryError, SubAppRegistry};
use mf_02_credentials::CredentialConfig;
use mf_03_auth_guard::{GuardConfig, GuardError};
use mf_04_lifecycle::{IsolationCapabilities, LifecycleConfig};
use mf_05_route_sync::RouteTableConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Complete shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Authentication API.
    pub auth_api: AuthApiConfig,
    /// Sub-application entry fetching.
    pub sandbox: SandboxConfig,
    /// Sub-applications.
    pub registry: RegistryConfig,
    /// Session and refresh.
    pub credentials: CredentialConfig,
    /// Navigation guard.
    pub guard: GuardConfig,
    /// Host page routes.
    pub routes: RouteTableConfig,
    /// Sandbox lifecycle.
    pub lifecycle: LifecycleConfig,
    /// Isolation primitives of the host environment.
    pub capabilities: IsolationCapabilities,
    /// Host path at startup.
    pub initial_path: String,
    /// Guard redirects followed before a navigation is abandoned.
    pub max_redirects: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            auth_api: AuthApiConfig::default(),
            sandbox: SandboxConfig::default(),
            registry: RegistryConfig::default(),
            credentials: CredentialConfig::default(),
            guard: GuardConfig::default(),
            routes: RouteTableConfig::default(),
            lifecycle: LifecycleConfig::default(),
            capabilities: IsolationCapabilities::full(),
            initial_path: "/".to_string(),
            max_redirects: 5,
        }
    }
}

impl ShellConfig {
    /// Config for tests: two sub-apps, no preloading, no entry fetching.
    pub fn for_testing() -> Self {
        Self {
            sandbox: SandboxConfig {
                fetch_entries: false,
                ..SandboxConfig::default()
            },
            registry: RegistryConfig::for_testing(),
            credentials: CredentialConfig::for_testing(),
            guard: GuardConfig::for_testing(),
            lifecycle: LifecycleConfig::for_testing(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), sub_apps = config.registry.sub_apps.len(), "Configuration loaded");
        Ok(config)
    }

    /// Apply `SHELL_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("SHELL_AUTH_URL") {
            self.auth_api.base_url = url;
        }
        if let Some(host) = lookup("SHELL_CURRENT_HOST") {
            self.registry.current_host = host;
        }
        if let Some(preload) = lookup("SHELL_PRELOAD") {
            self.lifecycle.preload_enabled = !preload.eq_ignore_ascii_case("false");
        }
        if let Some(degrade) = lookup("SHELL_DEGRADE") {
            self.lifecycle.degrade = degrade.eq_ignore_ascii_case("true") || degrade == "1";
        }
        self
    }

    /// Lifecycle settings with the isolation probe applied.
    #[must_use]
    pub fn effective_lifecycle(&self) -> LifecycleConfig {
        self.lifecycle.clone().with_capabilities(self.capabilities)
    }

    /// Check the configuration before wiring.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.guard.validate()?;
        if !self.auth_api.base_url.starts_with("http://")
            && !self.auth_api.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "auth_api.base_url must be an http(s) URL, got '{}'",
                self.auth_api.base_url
            )));
        }
        if self.auth_api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("auth_api.timeout_secs must be > 0".into()));
        }
        if self.max_redirects == 0 {
            return Err(ConfigError::Invalid("max_redirects must be > 0".into()));
        }
        if !self.initial_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "initial_path must be absolute, got '{}'",
                self.initial_path
            )));
        }
        // Duplicate names and prefixes surface here rather than at boot.
        SubAppRegistry::from_config(&self.registry)?;
        Ok(())
    }
}

/// Authentication API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthApiConfig {
    /// Base URL; endpoints are appended (`/auth/login`, ...).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for AuthApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api".to_string(),
            timeout_secs: 10,
        }
    }
}

impl AuthApiConfig {
    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Entry fetching for the HTTP sandbox runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Fetch the entry document on preload.
    pub fetch_entries: bool,
    /// Entry fetch timeout.
    pub timeout_secs: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            fetch_entries: true,
            timeout_secs: 10,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Cause
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON for `ShellConfig`.
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Guard routes are inconsistent.
    #[error("Invalid guard configuration: {0}")]
    Guard(#[from] GuardError),

    /// Sub-application list is inconsistent.
    #[error("Invalid sub-application configuration: {0}")]
    Registry(#[from] RegistryError),

    /// An HTTP client could not be built.
    #[error("HTTP client setup failed: {0}")]
    Client(String),

    /// Any other invalid value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
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
    fn test_defaults_validate() {
        let config = ShellConfig::default();
        assert_eq!(config.auth_api.base_url, "http://localhost:3001/api");
        assert_eq!(config.auth_api.timeout(), Duration::from_secs(10));
        config.validate().unwrap();
        ShellConfig::for_testing().validate().unwrap();
    }

    #[test]
    fn test_env_overrides() {
        let config = ShellConfig::default().with_overrides(lookup(&[
            ("SHELL_AUTH_URL", "https://auth.example.com/api"),
            ("SHELL_CURRENT_HOST", "shell.example.com"),
            ("SHELL_PRELOAD", "false"),
            ("SHELL_DEGRADE", "true"),
        ]));
        assert_eq!(config.auth_api.base_url, "https://auth.example.com/api");
        assert_eq!(config.registry.current_host, "shell.example.com");
        assert!(!config.lifecycle.preload_enabled);
        assert!(config.lifecycle.degrade);
    }

    #[test]
    fn test_preload_stays_on_unless_false() {
        let config = ShellConfig::default().with_overrides(lookup(&[("SHELL_PRELOAD", "yes")]));
        assert!(config.lifecycle.preload_enabled);
    }

    #[test]
    fn test_missing_isolation_forces_degrade() {
        let mut config = ShellConfig::default();
        config.capabilities.custom_elements = false;
        assert!(config.effective_lifecycle().degrade);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ShellConfig =
            serde_json::from_str(r#"{ "initial_path": "/order-system/list", "max_redirects": 3 }"#)
                .unwrap();
        assert_eq!(config.initial_path, "/order-system/list");
        assert_eq!(config.max_redirects, 3);
        assert_eq!(config.auth_api, AuthApiConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ShellConfig::default();
        config.auth_api.base_url = "localhost:3001".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ShellConfig::default();
        config.guard.login_path = "login".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Guard(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = ShellConfig::from_file(Path::new("/nonexistent/shell.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
