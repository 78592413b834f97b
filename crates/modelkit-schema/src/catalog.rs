//! Precomputed schema metadata for every registered entity type.

use std::collections::HashMap;

use modelkit_core::{EntityRegistry, Error, Result};

use crate::introspect::SchemaDescription;

#[derive(Debug, Clone)]
struct CatalogEntry {
    columns: Vec<&'static str>,
    schema: SchemaDescription,
}

/// Column lists and schema descriptions, computed once per entity type.
///
/// Building the catalog walks the registry a single time; lookups afterwards
/// return the cached values, so repeated calls are identical by construction.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entries: HashMap<&'static str, CatalogEntry>,
}

impl SchemaCatalog {
    /// Build the catalog for every type in `registry`.
    pub fn build(registry: &EntityRegistry) -> Self {
        let entries: HashMap<_, _> = registry
            .iter()
            .map(|entity| {
                let entry = CatalogEntry {
                    columns: entity.columns(),
                    schema: SchemaDescription::of(entity),
                };
                (entity.name(), entry)
            })
            .collect();

        tracing::debug!(types = entries.len(), "Built schema catalog");
        Self { entries }
    }

    fn entry(&self, entity_type: &str) -> Result<&CatalogEntry> {
        self.entries
            .get(entity_type)
            .ok_or_else(|| Error::UnknownEntityType(entity_type.to_string()))
    }

    /// Stored columns followed by synthesized fields.
    pub fn get_columns(&self, entity_type: &str) -> Result<&[&'static str]> {
        self.entry(entity_type).map(|e| e.columns.as_slice())
    }

    /// The public schema description.
    pub fn get_schema(&self, entity_type: &str) -> Result<&SchemaDescription> {
        self.entry(entity_type).map(|e| &e.schema)
    }
}
