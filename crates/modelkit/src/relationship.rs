//! Hand-written queries that span entity types.

use modelkit_core::{JoinCondition, JoinSpec, Record, Result, Store, Value};
use modelkit_session::Executor;

use crate::models::{ADVENTURES, NODES};

/// Adventures that can run on the node keyed by `node_id`.
///
/// An adventure is compatible when its `backend` equals the node's or is
/// NULL, and its `backend_state` equals the node's or is NULL. A missing node
/// yields no adventures.
///
/// ```text
/// SELECT adventures.* FROM adventures JOIN nodes
///   ON (adventures.backend = nodes.backend OR adventures.backend IS NULL)
///  AND (adventures.backend_state = nodes.backend_state
///       OR adventures.backend_state IS NULL)
///  AND nodes.id = :node_id
/// ```
#[tracing::instrument(level = "debug", skip(executor))]
pub fn adventures_compatible_with_node<S: Store>(
    executor: &Executor<S>,
    node_id: Value,
) -> Result<Vec<Record>> {
    let join = JoinSpec::on_key(node_id)
        .condition(JoinCondition::equals_or_null("backend", "backend"))
        .condition(JoinCondition::equals_or_null("backend_state", "backend_state"));
    executor.fetch_joined(ADVENTURES.name(), NODES.name(), &join)
}
