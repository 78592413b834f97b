//! In-memory transactional store.
//!
//! Tables live behind one mutex. A transaction holds the lock for its whole
//! lifetime, so transactions are serialized; writes go to a per-transaction
//! overlay of the touched tables and are published only by `commit`.
//! Dropping a transaction (or calling `rollback`) discards the overlay.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use modelkit_core::{
    EntityDescriptor, FieldInfo, JoinSpec, Record, Store, StoreError, StoreTransaction, Value,
};

/// Configuration for [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStoreConfig {
    /// First primary key handed out for every table.
    pub first_id: i64,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self { first_id: 1 }
    }
}

impl MemoryStoreConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first generated primary key.
    pub fn first_id(mut self, id: i64) -> Self {
        self.first_id = id;
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Table {
    rows: Vec<Record>,
    /// Last primary key handed out, if any.
    last_id: Option<i64>,
}

type Tables = HashMap<String, Table>;

/// Transactional in-memory store. Cheap to clone; clones share the data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    config: MemoryStoreConfig,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with custom configuration.
    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            tables: Arc::default(),
            config,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &MemoryStoreConfig {
        &self.config
    }

    /// Number of committed rows in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.lock().get(table).map_or(0, |t| t.rows.len())
    }
}

impl Store for MemoryStore {
    type Tx<'a>
        = MemoryTransaction<'a>
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        Ok(MemoryTransaction {
            committed: self.tables.lock(),
            overlay: HashMap::new(),
            first_id: self.config.first_id,
        })
    }
}

/// A transaction on a [`MemoryStore`].
pub struct MemoryTransaction<'a> {
    committed: MutexGuard<'a, Tables>,
    overlay: Tables,
    first_id: i64,
}

impl MemoryTransaction<'_> {
    fn rows(&self, table: &str) -> &[Record] {
        self.overlay
            .get(table)
            .or_else(|| self.committed.get(table))
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
    }

    fn table_mut(&mut self, table: &str) -> &mut Table {
        if !self.overlay.contains_key(table) {
            let copy = self.committed.get(table).cloned().unwrap_or_default();
            self.overlay.insert(table.to_string(), copy);
        }
        self.overlay.entry(table.to_string()).or_default()
    }

    fn position(&self, entity: &EntityDescriptor, id: &Value) -> Option<usize> {
        let pk = entity.primary_key();
        self.rows(entity.name())
            .iter()
            .position(|r| r.get(pk).is_some_and(|v| v.matches(id)))
    }

    /// Fail if another row already holds `value` in a unique column.
    fn check_unique(
        &self,
        entity: &EntityDescriptor,
        field: &FieldInfo,
        value: &Value,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        if !field.is_unique() || value.is_null() {
            return Ok(());
        }
        let taken = self
            .rows(entity.name())
            .iter()
            .enumerate()
            .any(|(idx, r)| Some(idx) != skip && r.get(field.name).is_some_and(|v| v.matches(value)));
        if taken {
            return Err(StoreError::IntegrityViolation(format!(
                "UNIQUE constraint failed: {}.{}",
                entity.name(),
                field.name
            )));
        }
        Ok(())
    }
}

/// Type and nullability check for one column value.
fn check_value(entity: &EntityDescriptor, field: &FieldInfo, value: &Value) -> Result<(), StoreError> {
    if value.is_null() && field.is_required() {
        return Err(StoreError::IntegrityViolation(format!(
            "NOT NULL constraint failed: {}.{}",
            entity.name(),
            field.name
        )));
    }
    field
        .sql_type
        .accepts(value)
        .map_err(|message| StoreError::MalformedValue {
            field: field.name.to_string(),
            message,
        })
}

fn reject_unknown_columns(entity: &EntityDescriptor, values: &Record) -> Result<(), StoreError> {
    match values.columns().find(|c| !entity.is_stored(c)) {
        Some(column) => Err(StoreError::InvalidClause(format!(
            "no such column: {}.{column}",
            entity.name()
        ))),
        None => Ok(()),
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn fetch_all(&mut self, entity: &EntityDescriptor) -> Result<Vec<Record>, StoreError> {
        Ok(self.rows(entity.name()).to_vec())
    }

    fn fetch_where(
        &mut self,
        entity: &EntityDescriptor,
        filters: &Record,
    ) -> Result<Vec<Record>, StoreError> {
        reject_unknown_columns(entity, filters)?;
        Ok(self
            .rows(entity.name())
            .iter()
            .filter(|row| {
                filters
                    .iter()
                    .all(|(k, v)| row.get(k).unwrap_or(&Value::Null).matches(v))
            })
            .cloned()
            .collect())
    }

    fn insert(&mut self, entity: &EntityDescriptor, values: &Record) -> Result<Record, StoreError> {
        reject_unknown_columns(entity, values)?;
        let pk = entity.primary_key();

        let id = match values.get(pk) {
            Some(Value::BigInt(id)) => *id,
            Some(other) if !other.is_null() => {
                return Err(StoreError::MalformedValue {
                    field: pk.to_string(),
                    message: format!("primary key must be an integer, not {}", other.type_name()),
                });
            }
            _ => {
                let first_id = self.first_id;
                let table = self.table_mut(entity.name());
                match table.last_id {
                    None => first_id,
                    Some(last) => last.checked_add(1).ok_or_else(|| {
                        StoreError::Request(format!(
                            "primary key space exhausted for {}",
                            entity.name()
                        ))
                    })?,
                }
            }
        };

        let mut row = Record::with_capacity(entity.fields().len());
        for field in entity.fields() {
            let value = if field.primary_key {
                Value::BigInt(id)
            } else {
                values.get(field.name).cloned().unwrap_or_default()
            };
            check_value(entity, field, &value)?;
            self.check_unique(entity, field, &value, None)?;
            row.set(field.name, value);
        }

        let table = self.table_mut(entity.name());
        table.last_id = Some(table.last_id.map_or(id, |last| last.max(id)));
        table.rows.push(row.clone());
        Ok(row)
    }

    fn update(
        &mut self,
        entity: &EntityDescriptor,
        id: &Value,
        changes: &Record,
    ) -> Result<Record, StoreError> {
        reject_unknown_columns(entity, changes)?;
        let idx = self.position(entity, id).ok_or(StoreError::NotFound)?;

        for (column, value) in changes.iter() {
            let Some(field) = entity.field(column) else {
                continue;
            };
            if field.primary_key {
                return Err(StoreError::InvalidClause(format!(
                    "primary key {}.{column} cannot be updated",
                    entity.name()
                )));
            }
            check_value(entity, field, value)?;
            self.check_unique(entity, field, value, Some(idx))?;
        }

        let table = self.table_mut(entity.name());
        let row = &mut table.rows[idx];
        for (column, value) in changes.iter() {
            row.set(column, value.clone());
        }
        Ok(row.clone())
    }

    fn delete(&mut self, entity: &EntityDescriptor, id: &Value) -> Result<(), StoreError> {
        let idx = self.position(entity, id).ok_or(StoreError::NotFound)?;
        self.table_mut(entity.name()).rows.remove(idx);
        Ok(())
    }

    fn fetch_joined(
        &mut self,
        target: &EntityDescriptor,
        source: &EntityDescriptor,
        join: &JoinSpec,
    ) -> Result<Vec<Record>, StoreError> {
        for condition in &join.conditions {
            if !target.is_stored(&condition.target_column) {
                return Err(StoreError::InvalidClause(format!(
                    "no such column: {}.{}",
                    target.name(),
                    condition.target_column
                )));
            }
            if !source.is_stored(&condition.source_column) {
                return Err(StoreError::InvalidClause(format!(
                    "no such column: {}.{}",
                    source.name(),
                    condition.source_column
                )));
            }
        }

        let Some(source_idx) = self.position(source, &join.source_key) else {
            return Ok(Vec::new());
        };
        let source_row = &self.rows(source.name())[source_idx];

        Ok(self
            .rows(target.name())
            .iter()
            .filter(|row| join.matches(row, source_row))
            .cloned()
            .collect())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let touched = self.overlay.len();
        for (name, table) in self.overlay.drain() {
            self.committed.insert(name, table);
        }
        tracing::trace!(tables = touched, "Committed memory transaction");
        Ok(())
    }

    fn rollback(self) -> Result<(), StoreError> {
        tracing::trace!(tables = self.overlay.len(), "Rolled back memory transaction");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::{JoinCondition, SqlType};
    use serde_json::json;

    const NODE_FIELDS: &[FieldInfo] = &[
        FieldInfo::id("id"),
        FieldInfo::new("name", SqlType::Varchar(16)).unique(true),
        FieldInfo::new("backend", SqlType::Text).nullable(true),
        FieldInfo::new("config", SqlType::Json).nullable(true),
    ];
    const NODES: EntityDescriptor = EntityDescriptor::new("nodes", NODE_FIELDS);

    fn insert(store: &MemoryStore, values: Record) -> Result<Record, StoreError> {
        let mut tx = store.begin()?;
        let row = tx.insert(&NODES, &values)?;
        tx.commit()?;
        Ok(row)
    }

    #[test]
    fn test_ids_are_generated_in_sequence() {
        let store = MemoryStore::new();
        let a = insert(&store, Record::new().with("name", "a")).unwrap();
        let b = insert(&store, Record::new().with("name", "b")).unwrap();
        assert_eq!(a.get("id"), Some(&Value::BigInt(1)));
        assert_eq!(b.get("id"), Some(&Value::BigInt(2)));
        assert_eq!(b.get("backend"), Some(&Value::Null));
    }

    #[test]
    fn test_first_id_config() {
        let store = MemoryStore::with_config(MemoryStoreConfig::new().first_id(100));
        let a = insert(&store, Record::new().with("name", "a")).unwrap();
        assert_eq!(a.get("id"), Some(&Value::BigInt(100)));
    }

    #[test]
    fn test_exhausted_id_space_is_an_error() {
        let store = MemoryStore::with_config(MemoryStoreConfig::new().first_id(i64::MAX));
        let a = insert(&store, Record::new().with("name", "a")).unwrap();
        assert_eq!(a.get("id"), Some(&Value::BigInt(i64::MAX)));
        assert!(matches!(
            insert(&store, Record::new().with("name", "b")),
            Err(StoreError::Request(msg)) if msg.contains("exhausted")
        ));
        assert_eq!(store.row_count("nodes"), 1);
    }

    #[test]
    fn test_unique_and_not_null() {
        let store = MemoryStore::new();
        insert(&store, Record::new().with("name", "a")).unwrap();
        assert!(matches!(
            insert(&store, Record::new().with("name", "a")),
            Err(StoreError::IntegrityViolation(msg)) if msg.contains("UNIQUE")
        ));
        assert!(matches!(
            insert(&store, Record::new().with("backend", "east")),
            Err(StoreError::IntegrityViolation(msg)) if msg.contains("NOT NULL")
        ));
    }

    #[test]
    fn test_malformed_json() {
        let store = MemoryStore::new();
        let err = insert(
            &store,
            Record::new().with("name", "a").with("config", "not json"),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::MalformedValue { field, .. } if field == "config"));
        assert!(insert(
            &store,
            Record::new().with("name", "b").with("config", json!({"ram": 4})),
        )
        .is_ok());
    }

    #[test]
    fn test_rollback_and_drop_discard_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().unwrap();
            tx.insert(&NODES, &Record::new().with("name", "a")).unwrap();
            tx.rollback().unwrap();
        }
        {
            let mut tx = store.begin().unwrap();
            tx.insert(&NODES, &Record::new().with("name", "b")).unwrap();
            // dropped without commit
        }
        assert_eq!(store.row_count("nodes"), 0);
        let row = insert(&store, Record::new().with("name", "c")).unwrap();
        assert_eq!(row.get("id"), Some(&Value::BigInt(1)));
    }

    #[test]
    fn test_uncommitted_writes_visible_inside_transaction() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.insert(&NODES, &Record::new().with("name", "a")).unwrap();
        assert_eq!(tx.fetch_all(&NODES).unwrap().len(), 1);
    }

    #[test]
    fn test_fetch_where_unknown_column() {
        let store = MemoryStore::new();
        let mut tx = store.begin().unwrap();
        assert!(matches!(
            tx.fetch_where(&NODES, &Record::new().with("colour", "red")),
            Err(StoreError::InvalidClause(_))
        ));
    }

    #[test]
    fn test_update_and_delete() {
        let store = MemoryStore::new();
        insert(&store, Record::new().with("name", "a")).unwrap();
        insert(&store, Record::new().with("name", "b")).unwrap();

        let mut tx = store.begin().unwrap();
        let row = tx
            .update(&NODES, &Value::BigInt(1), &Record::new().with("backend", "west"))
            .unwrap();
        assert_eq!(row.get("backend"), Some(&Value::Text("west".into())));
        assert!(matches!(
            tx.update(&NODES, &Value::BigInt(1), &Record::new().with("name", "b")),
            Err(StoreError::IntegrityViolation(_))
        ));
        assert_eq!(tx.delete(&NODES, &Value::BigInt(9)), Err(StoreError::NotFound));
        tx.delete(&NODES, &Value::BigInt(2)).unwrap();
        tx.commit().unwrap();

        assert_eq!(store.row_count("nodes"), 1);
    }

    #[test]
    fn test_fetch_joined_or_null() {
        const AD_FIELDS: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("backend", SqlType::Text).nullable(true),
        ];
        const ADVENTURES: EntityDescriptor = EntityDescriptor::new("adventures", AD_FIELDS);

        let store = MemoryStore::new();
        insert(&store, Record::new().with("name", "n").with("backend", "east")).unwrap();
        let mut tx = store.begin().unwrap();
        for backend in [Value::from("east"), Value::Null, Value::from("west")] {
            tx.insert(&ADVENTURES, &Record::new().with("backend", backend))
                .unwrap();
        }

        let join = JoinSpec::on_key(1).condition(JoinCondition::equals_or_null("backend", "backend"));
        let rows = tx.fetch_joined(&ADVENTURES, &NODES, &join).unwrap();
        let ids: Vec<_> = rows.iter().filter_map(|r| r.get("id")?.as_i64()).collect();
        assert_eq!(ids, vec![1, 2]);

        let missing = JoinSpec::on_key(99).condition(JoinCondition::equals("backend", "backend"));
        assert!(tx.fetch_joined(&ADVENTURES, &NODES, &missing).unwrap().is_empty());
    }
}
