//! Filter-expression evaluation over the in-memory store.

use std::sync::Arc;

use modelkit_core::{
    EntityRegistry, Error, FilterEvaluator, Record, Result, Store, StoreTransaction,
};

use crate::filter::Filter;
use crate::store::MemoryStore;

/// [`FilterEvaluator`] over a [`MemoryStore`].
///
/// Expressions are matched against full records, so synthesized fields can
/// be filtered on. See [`crate::filter`] for the grammar.
#[derive(Debug, Clone)]
pub struct MemoryFilterEvaluator {
    store: MemoryStore,
    registry: Arc<EntityRegistry>,
}

impl MemoryFilterEvaluator {
    /// Create an evaluator reading from `store`.
    pub fn new(store: MemoryStore, registry: impl Into<Arc<EntityRegistry>>) -> Self {
        Self {
            store,
            registry: registry.into(),
        }
    }
}

impl FilterEvaluator for MemoryFilterEvaluator {
    #[tracing::instrument(level = "debug", skip(self))]
    fn evaluate(&self, entity_type: &str, query_text: &str) -> Result<Vec<Record>> {
        let entity = self.registry.lookup(entity_type)?;
        let filter = Filter::parse(query_text)?;

        if let Some(unknown) = filter
            .fields()
            .into_iter()
            .find(|f| !entity.is_stored(f) && !entity.is_synthesized(f))
        {
            return Err(Error::InvalidQuery(format!(
                "no such field: {}.{unknown}",
                entity.name()
            )));
        }

        let rows = {
            let mut tx = self
                .store
                .begin()
                .map_err(|e| Error::runtime(e.to_string()))?;
            let rows = tx
                .fetch_all(entity)
                .map_err(|e| Error::runtime(e.to_string()))?;
            tx.rollback().map_err(|e| Error::runtime(e.to_string()))?;
            rows
        };

        let matched: Vec<Record> = rows
            .iter()
            .map(|row| entity.materialize(row))
            .filter(|row| filter.test(row))
            .collect();
        tracing::debug!(
            entity = entity.name(),
            scanned = rows.len(),
            matched = matched.len(),
            "Evaluated filter"
        );
        Ok(matched)
    }
}
