//! # Route Table Configuration

use serde::{Deserialize, Serialize};

/// Paths of the host's own pages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteTableConfig {
    /// Landing page aliases.
    pub home_paths: Vec<String>,
    /// Login page.
    pub login_path: String,
    /// Registration page.
    pub register_path: String,
    /// Password recovery page.
    pub forgot_password_path: String,
    /// Missing-permission page.
    pub forbidden_path: String,
}

impl Default for RouteTableConfig {
    fn default() -> Self {
        Self {
            home_paths: vec!["/".to_string(), "/home".to_string()],
            login_path: "/login".to_string(),
            register_path: "/register".to_string(),
            forgot_password_path: "/forgot-password".to_string(),
            forbidden_path: "/403".to_string(),
        }
    }
}
