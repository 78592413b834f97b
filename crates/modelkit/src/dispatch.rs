//! Name-keyed operation table.
//!
//! For every registered type `T` with singular form `s` the table binds:
//!
//! | Name                      | Call                  | Reply              |
//! |---------------------------|-----------------------|--------------------|
//! | `T_get_all`               | `Call::None`          | `Reply::Records`   |
//! | `s_get_by_id`             | `Call::Id`            | `Reply::Record`    |
//! | `s_get_first_by_filter`   | `Call::Filters`       | `Reply::Record`    |
//! | `s_get_columns`           | `Call::None`          | `Reply::Columns`   |
//! | `s_create`                | `Call::Fields`        | `Reply::Record`    |
//! | `s_update_by_id`          | `Call::IdFields`      | `Reply::Record`    |
//! | `s_delete_by_id`          | `Call::Id`            | `Reply::Deleted`   |
//! | `T_query`                 | `Call::Query`         | `Reply::Records`   |
//!
//! Hand-written operations are added with [`DispatchBuilder::operation`]
//! and always win over a generated binding of the same name.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use modelkit_core::{EntityRegistry, Error, Record, Result, Store, Value, singular};
use modelkit_session::Executor;

use crate::models::{ADVENTURES, NODES};
use crate::relationship::adventures_compatible_with_node;

/// Arguments to a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    None,
    Id(Value),
    Fields(Record),
    IdFields(Value, Record),
    Filters(Record),
    Query(String),
}

impl Call {
    fn id(self, operation: &str) -> Result<Value> {
        match self {
            Call::Id(id) => Ok(id),
            _ => Err(bad_args(operation, "an id")),
        }
    }

    fn record(self, operation: &str) -> Result<Record> {
        match self {
            Call::Fields(r) | Call::Filters(r) => Ok(r),
            _ => Err(bad_args(operation, "a record")),
        }
    }

    fn id_fields(self, operation: &str) -> Result<(Value, Record)> {
        match self {
            Call::IdFields(id, fields) => Ok((id, fields)),
            _ => Err(bad_args(operation, "an id and a record")),
        }
    }

    fn query(self, operation: &str) -> Result<String> {
        match self {
            Call::Query(q) => Ok(q),
            _ => Err(bad_args(operation, "query text")),
        }
    }

    fn none(self, operation: &str) -> Result<()> {
        match self {
            Call::None => Ok(()),
            _ => Err(bad_args(operation, "no arguments")),
        }
    }
}

fn bad_args(operation: &str, expected: &'static str) -> Error {
    Error::InvalidArguments {
        operation: operation.to_string(),
        expected,
    }
}

/// Result of a dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Record(Option<Record>),
    Records(Vec<Record>),
    Columns(Vec<&'static str>),
    Deleted(bool),
}

impl Reply {
    /// The single record, if this reply carries one.
    pub fn into_record(self) -> Option<Record> {
        match self {
            Reply::Record(r) => r,
            _ => None,
        }
    }

    /// The record list, or an empty list for other replies.
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Reply::Records(r) => r,
            Reply::Record(r) => r.into_iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// A bound operation.
pub type Operation<S> = Arc<dyn Fn(&Executor<S>, Call) -> Result<Reply> + Send + Sync>;

/// Builds a [`DispatchTable`].
pub struct DispatchBuilder<S: Store> {
    operations: HashMap<String, Operation<S>>,
}

impl<S: Store + 'static> Default for DispatchBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store + 'static> DispatchBuilder<S> {
    pub fn new() -> Self {
        Self {
            operations: HashMap::new(),
        }
    }

    /// Add a hand-written operation. Generated bindings never replace it.
    #[must_use]
    pub fn operation<F>(mut self, name: impl Into<String>, op: F) -> Self
    where
        F: Fn(&Executor<S>, Call) -> Result<Reply> + Send + Sync + 'static,
    {
        self.operations.insert(name.into(), Arc::new(op));
        self
    }

    /// Add the built-in hand-written operations whose types are registered.
    #[must_use]
    pub fn builtin_overrides(self, registry: &EntityRegistry) -> Self {
        if !(registry.contains(ADVENTURES.name()) && registry.contains(NODES.name())) {
            return self;
        }
        self.operation("adventures_get_by_node_id", |executor, call| {
            let node_id = call.id("adventures_get_by_node_id")?;
            adventures_compatible_with_node(executor, node_id).map(Reply::Records)
        })
    }

    /// Bind the generic operations of every registered type and finish.
    ///
    /// Fails if two registered types derive the same operation name (for
    /// example `node` and `nodes` both derive `node_create`), unless a
    /// hand-written operation already owns that name.
    pub fn build(mut self, registry: &EntityRegistry) -> Result<DispatchTable<S>> {
        let mut generated_by: HashMap<String, &'static str> = HashMap::new();
        for descriptor in registry.iter() {
            let plural = descriptor.name();
            for (name, op) in generic_operations::<S>(plural) {
                if let Some(first) = generated_by.get(&name) {
                    return Err(Error::DuplicateOperation {
                        name,
                        first: (*first).to_string(),
                        second: plural.to_string(),
                    });
                }
                match self.operations.entry(name.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert(op);
                        generated_by.insert(name, plural);
                    }
                    Entry::Occupied(_) => {
                        tracing::debug!(
                            entity = plural,
                            operation = %name,
                            "Keeping hand-written operation"
                        );
                    }
                }
            }
        }
        tracing::info!(
            operations = self.operations.len(),
            generated = generated_by.len(),
            "Built dispatch table"
        );
        Ok(DispatchTable {
            operations: self.operations,
        })
    }
}

fn generic_operations<S: Store + 'static>(plural: &'static str) -> Vec<(String, Operation<S>)> {
    let s = singular(plural);
    let mut ops: Vec<(String, Operation<S>)> = Vec::with_capacity(8);

    let name = format!("{plural}_get_all");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        call.none(&name)?;
        ex.get_all(plural).map(Reply::Records)
    })));

    let name = format!("{s}_delete_by_id");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        ex.delete_by_id(plural, call.id(&name)?).map(Reply::Deleted)
    })));

    let name = format!("{s}_get_columns");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        call.none(&name)?;
        ex.get_columns(plural).map(Reply::Columns)
    })));

    let name = format!("{s}_get_first_by_filter");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        ex.get_first_by_filter(plural, &call.record(&name)?)
            .map(Reply::Record)
    })));

    let name = format!("{s}_get_by_id");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        ex.get_by_id(plural, call.id(&name)?).map(Reply::Record)
    })));

    let name = format!("{s}_create");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        ex.create(plural, &call.record(&name)?)
            .map(|r| Reply::Record(Some(r)))
    })));

    let name = format!("{s}_update_by_id");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        let (id, fields) = call.id_fields(&name)?;
        ex.update_by_id(plural, id, &fields)
            .map(|r| Reply::Record(Some(r)))
    })));

    let name = format!("{plural}_query");
    ops.push((name.clone(), Arc::new(move |ex: &Executor<S>, call: Call| {
        ex.query(plural, &call.query(&name)?).map(Reply::Records)
    })));

    ops
}

/// Operation name → bound operation.
pub struct DispatchTable<S: Store> {
    operations: HashMap<String, Operation<S>>,
}

impl<S: Store + 'static> DispatchTable<S> {
    /// Start a table.
    pub fn builder() -> DispatchBuilder<S> {
        DispatchBuilder::new()
    }

    /// Generated bindings plus the built-in hand-written operations.
    pub fn standard(registry: &EntityRegistry) -> Result<Self> {
        DispatchBuilder::new()
            .builtin_overrides(registry)
            .build(registry)
    }

    /// Look up an operation by name.
    pub fn get(&self, name: &str) -> Result<&Operation<S>> {
        self.operations
            .get(name)
            .ok_or_else(|| Error::UnknownOperation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    /// Every bound name, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Run the operation bound to `name`.
    #[tracing::instrument(level = "debug", skip(self, executor, call))]
    pub fn call(&self, executor: &Executor<S>, name: &str, call: Call) -> Result<Reply> {
        let op = self.get(name)?;
        op(executor, call)
    }
}

impl<S: Store> fmt::Debug for DispatchTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("operations", &self.operations.len())
            .finish()
    }
}
