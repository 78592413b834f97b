//! The persistence boundary.
//!
//! Drivers implement [`Store`] and [`StoreTransaction`]. Every executor
//! operation runs inside exactly one transaction obtained from
//! [`Store::begin`] and ends it with either [`StoreTransaction::commit`] or
//! [`StoreTransaction::rollback`]. A transaction dropped without commit must
//! leave no trace in the store.
//!
//! Stores deal in *stored* rows only: synthesized fields are derived by the
//! executor after the fact.

use crate::entity::EntityDescriptor;
use crate::error::StoreError;
use crate::record::Record;
use crate::value::Value;

/// A transactional persistence store.
pub trait Store: Send + Sync {
    /// Transaction handle type.
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// Begin a transaction.
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;
}

/// Operations available inside a transaction.
pub trait StoreTransaction {
    /// Every stored row of `entity`.
    fn fetch_all(&mut self, entity: &EntityDescriptor) -> Result<Vec<Record>, StoreError>;

    /// Rows whose columns equal every `(field, value)` in `filters`.
    ///
    /// A filter naming something that is not a stored column fails with
    /// [`StoreError::InvalidClause`].
    fn fetch_where(
        &mut self,
        entity: &EntityDescriptor,
        filters: &Record,
    ) -> Result<Vec<Record>, StoreError>;

    /// Insert a row built from `values` and return it as stored, primary key
    /// included.
    fn insert(&mut self, entity: &EntityDescriptor, values: &Record)
    -> Result<Record, StoreError>;

    /// Apply `changes` to the row keyed by `id` and return the stored row.
    fn update(
        &mut self,
        entity: &EntityDescriptor,
        id: &Value,
        changes: &Record,
    ) -> Result<Record, StoreError>;

    /// Delete the row keyed by `id`; [`StoreError::NotFound`] if absent.
    fn delete(&mut self, entity: &EntityDescriptor, id: &Value) -> Result<(), StoreError>;

    /// Rows of `target` joined against one keyed row of `source`.
    fn fetch_joined(
        &mut self,
        target: &EntityDescriptor,
        source: &EntityDescriptor,
        join: &JoinSpec,
    ) -> Result<Vec<Record>, StoreError>;

    /// Make the transaction's changes durable.
    fn commit(self) -> Result<(), StoreError>;

    /// Discard the transaction's changes.
    fn rollback(self) -> Result<(), StoreError>;
}

/// One column pairing of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinCondition {
    /// Column on the target (returned) entity.
    pub target_column: String,
    /// Column on the source entity.
    pub source_column: String,
    /// When true, a NULL target column matches any source value.
    pub null_matches: bool,
}

impl JoinCondition {
    /// `target.column = source.column`.
    pub fn equals(target_column: impl Into<String>, source_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            source_column: source_column.into(),
            null_matches: false,
        }
    }

    /// `target.column = source.column OR target.column IS NULL`.
    pub fn equals_or_null(target_column: impl Into<String>, source_column: impl Into<String>) -> Self {
        Self {
            null_matches: true,
            ..Self::equals(target_column, source_column)
        }
    }

    /// Evaluate the condition for one pair of rows.
    pub fn holds(&self, target: &Record, source: &Record) -> bool {
        let left = target.get(&self.target_column).unwrap_or(&Value::Null);
        if self.null_matches && left.is_null() {
            return true;
        }
        let right = source.get(&self.source_column).unwrap_or(&Value::Null);
        // SQL semantics: NULL never equals anything.
        !left.is_null() && !right.is_null() && left.matches(right)
    }
}

/// Join of a target entity against the single source row whose primary key
/// is `source_key`. All conditions are ANDed.
///
/// Equivalent SQL:
///
/// ```text
/// SELECT target.* FROM target JOIN source
///   ON (cond_1) AND ... AND (cond_n) AND source.pk = :source_key
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JoinSpec {
    /// Primary key value of the source row.
    pub source_key: Value,
    /// Column pairings.
    pub conditions: Vec<JoinCondition>,
}

impl JoinSpec {
    /// Start a join against the source row keyed by `source_key`.
    pub fn on_key(source_key: impl Into<Value>) -> Self {
        Self {
            source_key: source_key.into(),
            conditions: Vec::new(),
        }
    }

    /// Add a condition.
    #[must_use]
    pub fn condition(mut self, condition: JoinCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Whether a target row matches the given source row.
    pub fn matches(&self, target: &Record, source: &Record) -> bool {
        self.conditions.iter().all(|c| c.holds(target, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq_or_null() {
        let node = Record::new().with("backend", "east");
        let cond = JoinCondition::equals_or_null("backend", "backend");
        assert!(cond.holds(&Record::new().with("backend", "east"), &node));
        assert!(cond.holds(&Record::new().with("backend", Value::Null), &node));
        assert!(!cond.holds(&Record::new().with("backend", "west"), &node));
    }

    #[test]
    fn test_plain_eq_never_matches_null() {
        let cond = JoinCondition::equals("backend", "backend");
        let null_row = Record::new().with("backend", Value::Null);
        assert!(!cond.holds(&null_row, &null_row));
    }

    #[test]
    fn test_string_null_is_not_null() {
        let node = Record::new().with("backend", "east");
        let cond = JoinCondition::equals_or_null("backend", "backend");
        assert!(!cond.holds(&Record::new().with("backend", "null"), &node));
    }

    #[test]
    fn test_join_spec_ands_conditions() {
        let spec = JoinSpec::on_key(1)
            .condition(JoinCondition::equals_or_null("backend", "backend"))
            .condition(JoinCondition::equals_or_null("backend_state", "backend_state"));
        let node = Record::new()
            .with("backend", "east")
            .with("backend_state", "active");
        let ok = Record::new()
            .with("backend", Value::Null)
            .with("backend_state", "active");
        let wrong_state = Record::new()
            .with("backend", "east")
            .with("backend_state", "idle");
        assert!(spec.matches(&ok, &node));
        assert!(!spec.matches(&wrong_state, &node));
    }
}
