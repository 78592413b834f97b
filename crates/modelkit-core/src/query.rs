//! The filter-expression boundary.

use crate::error::Result;
use crate::record::Record;

/// Evaluates free-text filter expressions against one entity type.
///
/// The executor never parses `query_text`; it checks the entity type is
/// registered and hands both strings over unchanged.
pub trait FilterEvaluator: Send + Sync {
    /// Evaluate `query_text` against `entity_type` and return matching rows.
    fn evaluate(&self, entity_type: &str, query_text: &str) -> Result<Vec<Record>>;
}

impl<F: FilterEvaluator + ?Sized> FilterEvaluator for std::sync::Arc<F> {
    fn evaluate(&self, entity_type: &str, query_text: &str) -> Result<Vec<Record>> {
        (**self).evaluate(entity_type, query_text)
    }
}
