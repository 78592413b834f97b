//! The entity registry.
//!
//! Maps registered entity names to their descriptors. A registry is built by
//! an explicit initialization routine (a list of `register` calls), then
//! frozen: nothing mutates it afterwards, so it can be shared across threads
//! without locking.
//!
//! One registry can be installed as the process-wide instance with
//! [`install`] and read back through [`global`].

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::entity::EntityDescriptor;
use crate::error::{Error, Result};

static GLOBAL: OnceLock<EntityRegistry> = OnceLock::new();

/// Directory of entity type descriptors.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    /// Descriptors in registration order.
    entries: Vec<EntityDescriptor>,
    /// Name → index into `entries`.
    by_name: HashMap<&'static str, usize>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a list of descriptors.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = EntityDescriptor>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Register an entity type. Fails if the descriptor is invalid or the
    /// name is taken.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> Result<()> {
        descriptor.validate()?;
        let name = descriptor.name();
        if self.by_name.contains_key(name) {
            return Err(Error::DuplicateEntityType(name.to_string()));
        }

        tracing::debug!(
            entity = name,
            columns = descriptor.fields().len(),
            synthesized = descriptor.synthesized_fields().len(),
            "Registering entity type"
        );

        self.by_name.insert(name, self.entries.len());
        self.entries.push(descriptor);
        Ok(())
    }

    /// Look up a descriptor by its exact registered name.
    pub fn lookup(&self, name: &str) -> Result<&EntityDescriptor> {
        self.by_name
            .get(name)
            .map(|&idx| &self.entries[idx])
            .ok_or_else(|| Error::UnknownEntityType(name.to_string()))
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn list_types(&self) -> Vec<&'static str> {
        self.entries.iter().map(EntityDescriptor::name).collect()
    }

    /// Iterate descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entries.iter()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Install `registry` as the process-wide registry.
///
/// Can succeed only once per process; later calls fail with
/// [`Error::RegistryInstalled`].
pub fn install(registry: EntityRegistry) -> Result<&'static EntityRegistry> {
    let mut installed = false;
    let global = GLOBAL.get_or_init(|| {
        installed = true;
        registry
    });
    if installed {
        tracing::info!(types = global.len(), "Installed process-wide entity registry");
        Ok(global)
    } else {
        Err(Error::RegistryInstalled)
    }
}

/// The process-wide registry, if one was installed.
pub fn global() -> Option<&'static EntityRegistry> {
    GLOBAL.get()
}
