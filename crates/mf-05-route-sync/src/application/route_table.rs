//! # Host Route Table
//!
//! Resolves a host path to the route that renders it.
//!
//! | Path | Kind | Requires session |
//! |------|------|------------------|
//! | `/`, `/home` | Home | yes |
//! | `/login`, `/register`, `/forgot-password` | auth pages | no |
//! | `/403` | Forbidden | yes |
//! | `/{sub-app}/**` | SubApp | yes, plus the sub-app's permission code |
//! | anything else | NotFound | yes |

use crate::config::RouteTableConfig;
use crate::domain::{host_to_sub, RouteBinding, RouteKind, RouteMatch};
use mf_01_registry::SubAppRegistry;
use shared_types::{RouteLocation, RouteMeta};
use std::sync::Arc;

/// Host route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    config: RouteTableConfig,
    registry: Arc<SubAppRegistry>,
}

impl RouteTable {
    /// Table over the host pages in `config` and every registered sub-app.
    pub fn new(config: RouteTableConfig, registry: Arc<SubAppRegistry>) -> Self {
        Self { config, registry }
    }

    /// Resolve a URL string.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> RouteMatch {
        self.resolve(&RouteLocation::parse(url))
    }

    /// Resolve a location.
    #[must_use]
    pub fn resolve(&self, location: &RouteLocation) -> RouteMatch {
        let path = location.path.as_str();
        let c = &self.config;

        if c.home_paths.iter().any(|p| p == path) {
            return RouteMatch::new(
                RouteKind::Home,
                location.clone(),
                RouteMeta::protected().with_title("Home"),
            );
        }
        if path == c.login_path {
            return RouteMatch::new(
                RouteKind::Login,
                location.clone(),
                RouteMeta::public().with_title("Login"),
            );
        }
        if path == c.register_path {
            return RouteMatch::new(
                RouteKind::Register,
                location.clone(),
                RouteMeta::public().with_title("Register"),
            );
        }
        if path == c.forgot_password_path {
            return RouteMatch::new(
                RouteKind::ForgotPassword,
                location.clone(),
                RouteMeta::public().with_title("Forgot Password"),
            );
        }
        if path == c.forbidden_path {
            return RouteMatch::new(
                RouteKind::Forbidden,
                location.clone(),
                RouteMeta::protected().with_title("Forbidden"),
            );
        }

        if let Some(descriptor) = self.registry.find_by_path(path) {
            if let Ok(relative_path) = host_to_sub(&descriptor, path) {
                let mut meta = RouteMeta::protected().with_sub_app(&descriptor.name);
                if let Some(code) = &descriptor.permission_code {
                    meta = meta.with_permission(code);
                }
                if let Some(title) = &descriptor.title {
                    meta = meta.with_title(title);
                }
                let binding = RouteBinding {
                    host_path: path.to_string(),
                    sub_app: descriptor.name.clone(),
                    relative_path,
                };
                return RouteMatch::new(RouteKind::SubApp(binding), location.clone(), meta);
            }
        }

        RouteMatch::new(
            RouteKind::NotFound,
            location.clone(),
            RouteMeta::protected().with_title("Not Found"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_01_registry::{Environment, RegistryConfig};

    fn table() -> RouteTable {
        let mut config = RegistryConfig::default();
        config.sub_apps[2].permission = Some("order:read".to_string());
        let registry =
            Arc::new(SubAppRegistry::from_config_for(&config, Environment::Development).unwrap());
        RouteTable::new(RouteTableConfig::default(), registry)
    }

    #[test]
    fn test_host_pages() {
        let t = table();
        assert_eq!(t.resolve_url("/").kind, RouteKind::Home);
        assert_eq!(t.resolve_url("/home").kind, RouteKind::Home);
        assert_eq!(t.resolve_url("/403").kind, RouteKind::Forbidden);

        let login = t.resolve_url("/login?redirect=/home");
        assert_eq!(login.kind, RouteKind::Login);
        assert!(!login.target.meta.requires_auth);
        assert_eq!(login.target.location.query_param("redirect"), Some("/home"));
    }

    #[test]
    fn test_sub_app_route() {
        let m = table().resolve_url("/order-system/detail/7");
        let binding = m.binding().unwrap();
        assert_eq!(binding.sub_app, "order-system");
        assert_eq!(binding.relative_path, "/detail/7");
        assert!(m.target.meta.requires_auth);
        assert_eq!(m.target.meta.permission_code.as_deref(), Some("order:read"));
        assert_eq!(m.target.meta.sub_app.as_deref(), Some("order-system"));
    }

    #[test]
    fn test_bare_prefix_uses_default_path() {
        let m = table().resolve_url("/user-center");
        assert_eq!(m.binding().unwrap().relative_path, "/list");
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let m = table().resolve_url("/orders/detail/7");
        assert_eq!(m.kind, RouteKind::NotFound);
        assert!(m.target.meta.requires_auth);
    }
}
