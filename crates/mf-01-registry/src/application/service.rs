//! # Sub-App Registry Service
//!
//! Holds the descriptors in registration order. Lookups are by name or by
//! owned host path.

use crate::config::{Environment, RegistryConfig};
use crate::domain::{RegistryError, SubAppDescriptor};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// Catalogue of mountable sub-applications.
#[derive(Debug, Default)]
pub struct SubAppRegistry {
    descriptors: RwLock<Vec<Arc<SubAppDescriptor>>>,
}

impl SubAppRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from configuration for the build environment.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        Self::from_config_for(config, Environment::current())
    }

    /// Registry populated from configuration for an explicit environment.
    pub fn from_config_for(
        config: &RegistryConfig,
        environment: Environment,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for descriptor in config.descriptors_for(environment) {
            registry.register(descriptor)?;
        }
        info!(
            environment = ?environment,
            sub_apps = registry.len(),
            "Sub-app registry initialized"
        );
        Ok(registry)
    }

    /// Add a descriptor. Names are unique.
    pub fn register(
        &self,
        descriptor: SubAppDescriptor,
    ) -> Result<Arc<SubAppDescriptor>, RegistryError> {
        descriptor.validate()?;

        let mut descriptors = self.descriptors.write();
        if descriptors.iter().any(|d| d.name == descriptor.name) {
            return Err(RegistryError::Duplicate(descriptor.name));
        }
        if let Some(owner) = descriptors
            .iter()
            .find(|d| d.mount_prefix == descriptor.mount_prefix)
        {
            return Err(RegistryError::InvalidDescriptor {
                name: descriptor.name.clone(),
                reason: format!("mount prefix already owned by '{}'", owner.name),
            });
        }

        debug!(
            sub_app = %descriptor.name,
            entry = %descriptor.entry_url,
            keep_alive = descriptor.keep_alive,
            "Sub-app registered"
        );
        let descriptor = Arc::new(descriptor);
        descriptors.push(descriptor.clone());
        Ok(descriptor)
    }

    /// Look up a descriptor by name.
    pub fn resolve(&self, name: &str) -> Result<Arc<SubAppDescriptor>, RegistryError> {
        self.descriptors
            .read()
            .iter()
            .find(|d| d.name == name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Descriptor whose mount prefix owns `host_path`.
    #[must_use]
    pub fn find_by_path(&self, host_path: &str) -> Option<Arc<SubAppDescriptor>> {
        self.descriptors
            .read()
            .iter()
            .filter(|d| d.owns_path(host_path))
            .max_by_key(|d| d.mount_prefix.len())
            .cloned()
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.read().iter().any(|d| d.name == name)
    }

    /// All descriptors in registration order.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<SubAppDescriptor>> {
        self.descriptors.read().clone()
    }

    /// All names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.descriptors
            .read()
            .iter()
            .map(|d| d.name.clone())
            .collect()
    }

    /// Number of registered sub-applications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }
}
