//! # Path Translation
//!
//! Pure functions between host paths and sandbox-relative paths.

use super::errors::RouteError;
use mf_01_registry::SubAppDescriptor;
use shared_types::normalize_path;

/// Strip the descriptor's prefix from `host_path`. An empty remainder maps
/// to the descriptor's default relative path.
pub fn host_to_sub(descriptor: &SubAppDescriptor, host_path: &str) -> Result<String, RouteError> {
    let host_path = normalize_path(host_path);
    if !descriptor.owns_path(&host_path) {
        return Err(RouteError::OutsidePrefix {
            host_path,
            prefix: descriptor.mount_prefix.clone(),
        });
    }

    let remainder = &host_path[descriptor.mount_prefix.len()..];
    if remainder.is_empty() || remainder == "/" {
        Ok(descriptor.default_path.clone())
    } else {
        Ok(remainder.to_string())
    }
}

/// Compose the host path of a sandbox-relative path.
#[must_use]
pub fn sub_to_host(descriptor: &SubAppDescriptor, relative_path: &str) -> String {
    let relative = normalize_path(relative_path);
    if relative == "/" {
        return descriptor.mount_prefix.clone();
    }
    format!("{}{}", descriptor.mount_prefix, relative)
}
