//! # Routing Values
//!
//! Host-side route locations and per-route metadata consumed by the
//! auth guard and the route synchronizer.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Characters escaped in query values. `/` stays readable so redirect
/// targets look like `/login?redirect=/orders/detail/7`.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

/// A host navigator location: path plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct RouteLocation {
    /// Absolute path, always starting with `/`.
    pub path: String,
    /// Query parameters, ordered for stable rendering.
    #[serde(default)]
    pub query: BTreeMap<String, String>,
}

impl RouteLocation {
    /// Location without query parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            query: BTreeMap::new(),
        }
    }

    /// Builder-style query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Parse `"/path?k=v&k2=v2"`. Fragments are dropped.
    #[must_use]
    pub fn parse(url: &str) -> Self {
        let without_fragment = url.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, query),
            None => (without_fragment, ""),
        };

        let query = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (
                    percent_decode_str(k).decode_utf8_lossy().into_owned(),
                    percent_decode_str(v).decode_utf8_lossy().into_owned(),
                )
            })
            .collect();

        Self {
            path: normalize_path(path),
            query,
        }
    }

    /// Query parameter lookup.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Render back to a URL string.
    #[must_use]
    pub fn to_url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, QUERY_VALUE),
                    utf8_percent_encode(v, QUERY_VALUE)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.path, query)
    }
}

impl fmt::Display for RouteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}

/// Ensure a leading `/` and strip a trailing one (except for the root).
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Per-route metadata evaluated by the auth guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    /// Whether a session is needed at all.
    pub requires_auth: bool,
    /// Permission code the session must hold, if any.
    #[serde(default)]
    pub permission_code: Option<String>,
    /// Human-readable title.
    #[serde(default)]
    pub title: Option<String>,
    /// Sub-application rendered by this route, if any.
    #[serde(default)]
    pub sub_app: Option<String>,
}

impl RouteMeta {
    /// Route reachable without a session.
    #[must_use]
    pub fn public() -> Self {
        Self::default()
    }

    /// Route that needs a session.
    #[must_use]
    pub fn protected() -> Self {
        Self {
            requires_auth: true,
            ..Self::default()
        }
    }

    /// Builder-style permission requirement.
    #[must_use]
    pub fn with_permission(mut self, code: impl Into<String>) -> Self {
        self.permission_code = Some(code.into());
        self
    }

    /// Builder-style title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder-style sub-application binding.
    #[must_use]
    pub fn with_sub_app(mut self, name: impl Into<String>) -> Self {
        self.sub_app = Some(name.into());
        self
    }
}

/// A navigation attempt: where to, and what the route demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// Requested location.
    pub location: RouteLocation,
    /// Metadata of the matched route.
    pub meta: RouteMeta,
}

impl RouteTarget {
    /// Create a target from a location and its metadata.
    pub fn new(location: RouteLocation, meta: RouteMeta) -> Self {
        Self { location, meta }
    }

    /// Path component of the target.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.location.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        let loc = RouteLocation::parse("/login?redirect=/orders/detail/7");
        assert_eq!(loc.path, "/login");
        assert_eq!(loc.query_param("redirect"), Some("/orders/detail/7"));
    }

    #[test]
    fn test_redirect_target_renders_readably() {
        let loc = RouteLocation::new("/login").with_query("redirect", "/orders/detail/7");
        assert_eq!(loc.to_url(), "/login?redirect=/orders/detail/7");
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let loc = RouteLocation::new("/login").with_query("redirect", "/a?b=c&d");
        let url = loc.to_url();
        assert_eq!(url, "/login?redirect=/a%3Fb%3Dc%26d");
        assert_eq!(
            RouteLocation::parse(&url).query_param("redirect"),
            Some("/a?b=c&d")
        );
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("orders/"), "/orders");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/a/b//"), "/a/b");
    }

    #[test]
    fn test_fragment_dropped() {
        let loc = RouteLocation::parse("/home#top");
        assert_eq!(loc.path, "/home");
        assert!(loc.query.is_empty());
    }
}
