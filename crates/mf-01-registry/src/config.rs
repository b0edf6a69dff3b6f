//! # Registry Configuration
//!
//! Static sub-application table plus the build-time environment that decides
//! how entry URLs are formed.

use crate::domain::{SubAppDescriptor, DEFAULT_RELATIVE_PATH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of the default prop telling sandboxes where host-level jumps go.
pub const JUMP_BASE_PROP: &str = "jumpBase";

/// Build environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Sub-applications served from their own dev servers on localhost.
    Development,
    /// Sub-applications served under the host's origin.
    Production,
}

impl Environment {
    /// Environment fixed at compile time: `SHELL_ENV`, else the build profile.
    #[must_use]
    pub fn current() -> Self {
        match option_env!("SHELL_ENV") {
            Some(value) => Self::parse(value),
            None if cfg!(debug_assertions) => Self::Development,
            None => Self::Production,
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    /// Entry URL of a sub-application in this environment.
    #[must_use]
    pub fn entry_url(self, scheme: &str, current_host: &str, name: &str, port: u16) -> String {
        match self {
            Self::Development => format!("{scheme}://localhost:{port}/"),
            Self::Production => format!("{scheme}://{current_host}/{name}/"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One sub-application entry in the configuration file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubAppConfig {
    /// Unique name.
    pub name: String,
    /// Development server port.
    pub port: u16,
    /// Explicit entry URL; bypasses the environment rule.
    #[serde(default)]
    pub entry_url: Option<String>,
    /// Keep sandbox state across navigation.
    #[serde(default = "default_true")]
    pub keep_alive: bool,
    /// Force the reduced-isolation strategy for this sub-application.
    #[serde(default)]
    pub degrade: bool,
    /// Execute entry scripts.
    #[serde(default = "default_true")]
    pub exec: bool,
    /// Relative path for a bare prefix.
    #[serde(default)]
    pub default_path: Option<String>,
    /// Permission code required to enter.
    #[serde(default)]
    pub permission: Option<String>,
    /// Human-readable title.
    #[serde(default)]
    pub title: Option<String>,
    /// Extra static props.
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
}

impl SubAppConfig {
    /// Keep-alive entry on a development port.
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            entry_url: None,
            keep_alive: true,
            degrade: false,
            exec: true,
            default_path: None,
            permission: None,
            title: None,
            props: BTreeMap::new(),
        }
    }

    fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
}

/// Registry configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// URL scheme for generated entry URLs.
    pub scheme: String,
    /// Host used for production entry URLs.
    pub current_host: String,
    /// Host path sandboxes jump to for host-level navigation.
    pub jump_base: String,
    /// Sub-applications in registration order.
    pub sub_apps: Vec<SubAppConfig>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            current_host: "localhost".to_string(),
            jump_base: "/".to_string(),
            sub_apps: vec![
                SubAppConfig::new("user-center", 8001).with_title("User Center"),
                SubAppConfig::new("product-management", 8002).with_title("Product Management"),
                SubAppConfig::new("order-system", 8003).with_title("Order System"),
            ],
        }
    }
}

impl RegistryConfig {
    /// Create a config for testing (two sub-applications, one not kept alive).
    pub fn for_testing() -> Self {
        let mut transient = SubAppConfig::new("product-management", 8002);
        transient.keep_alive = false;
        Self {
            sub_apps: vec![SubAppConfig::new("order-system", 8003), transient],
            ..Self::default()
        }
    }

    /// Descriptors for the build environment.
    #[must_use]
    pub fn descriptors(&self) -> Vec<SubAppDescriptor> {
        self.descriptors_for(Environment::current())
    }

    /// Descriptors for an explicit environment. Default props are merged
    /// first so per-app props override them.
    #[must_use]
    pub fn descriptors_for(&self, environment: Environment) -> Vec<SubAppDescriptor> {
        self.sub_apps
            .iter()
            .map(|app| {
                let entry_url = app.entry_url.clone().unwrap_or_else(|| {
                    environment.entry_url(&self.scheme, &self.current_host, &app.name, app.port)
                });

                let mut descriptor = SubAppDescriptor::new(&app.name, entry_url)
                    .keep_alive(app.keep_alive)
                    .degrade(app.degrade)
                    .with_default_path(
                        app.default_path
                            .clone()
                            .unwrap_or_else(|| DEFAULT_RELATIVE_PATH.to_string()),
                    )
                    .with_prop(JUMP_BASE_PROP, Value::String(self.jump_base.clone()));
                descriptor.exec = app.exec;
                descriptor.permission_code = app.permission.clone();
                descriptor.title = app.title.clone();
                descriptor
                    .static_props
                    .extend(app.props.iter().map(|(k, v)| (k.clone(), v.clone())));
                descriptor
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.sub_apps.len(), 3);
        assert!(config.sub_apps.iter().all(|a| a.keep_alive && a.exec));
    }

    #[test]
    fn test_development_entry_urls() {
        let descriptors = RegistryConfig::default().descriptors_for(Environment::Development);
        assert_eq!(descriptors[0].entry_url, "http://localhost:8001/");
        assert_eq!(descriptors[2].entry_url, "http://localhost:8003/");
    }

    #[test]
    fn test_production_entry_urls() {
        let config = RegistryConfig {
            scheme: "https".to_string(),
            current_host: "shop.example.com".to_string(),
            ..RegistryConfig::default()
        };
        let descriptors = config.descriptors_for(Environment::Production);
        assert_eq!(descriptors[1].entry_url, "https://shop.example.com/product-management/");
    }

    #[test]
    fn test_app_props_override_defaults() {
        let mut config = RegistryConfig::default();
        config.sub_apps[0]
            .props
            .insert(JUMP_BASE_PROP.to_string(), Value::String("/home".to_string()));

        let descriptors = config.descriptors_for(Environment::Development);
        assert_eq!(descriptors[0].static_props[JUMP_BASE_PROP], "/home");
        assert_eq!(descriptors[1].static_props[JUMP_BASE_PROP], "/");
    }

    #[test]
    fn test_parse_from_json() {
        let json = r#"{
            "scheme": "https",
            "sub_apps": [
                { "name": "order-system", "port": 8003, "permission": "order:read" }
            ]
        }"#;
        let config: RegistryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.current_host, "localhost");
        let app = &config.sub_apps[0];
        assert!(app.keep_alive);
        assert_eq!(app.permission.as_deref(), Some("order:read"));
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("PROD"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
    }
}
