//! Operations bound to one entity type.

use modelkit_core::{Record, Result, Store, Value};
use modelkit_schema::SchemaDescription;

use crate::executor::Executor;

/// The executor's operations with the entity type fixed.
///
/// Obtained from [`Executor::entity`], which has already checked the type is
/// registered.
///
/// ```ignore
/// let nodes = executor.entity("nodes")?;
/// let node = nodes.create(&Record::new().with("backend", "east"))?;
/// nodes.update_by_id(1, &Record::new().with("backend", "west"))?;
/// ```
pub struct EntityHandle<'e, S: Store> {
    executor: &'e Executor<S>,
    name: &'static str,
}

impl<S: Store> Clone for EntityHandle<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Store> Copy for EntityHandle<'_, S> {}

impl<'e, S: Store> EntityHandle<'e, S> {
    pub(crate) fn new(executor: &'e Executor<S>, name: &'static str) -> Self {
        Self { executor, name }
    }

    /// Registered name of the bound type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn get_all(&self) -> Result<Vec<Record>> {
        self.executor.get_all(self.name)
    }

    pub fn get_by_id(&self, id: impl Into<Value>) -> Result<Option<Record>> {
        self.executor.get_by_id(self.name, id)
    }

    pub fn get_by_filter(&self, filters: &Record) -> Result<Vec<Record>> {
        self.executor.get_by_filter(self.name, filters)
    }

    pub fn get_first_by_filter(&self, filters: &Record) -> Result<Option<Record>> {
        self.executor.get_first_by_filter(self.name, filters)
    }

    pub fn query(&self, query_text: &str) -> Result<Vec<Record>> {
        self.executor.query(self.name, query_text)
    }

    pub fn create(&self, fields: &Record) -> Result<Record> {
        self.executor.create(self.name, fields)
    }

    pub fn update_by_id(&self, id: impl Into<Value>, fields: &Record) -> Result<Record> {
        self.executor.update_by_id(self.name, id, fields)
    }

    pub fn delete_by_id(&self, id: impl Into<Value>) -> Result<bool> {
        self.executor.delete_by_id(self.name, id)
    }

    pub fn get_columns(&self) -> Result<Vec<&'static str>> {
        self.executor.get_columns(self.name)
    }

    pub fn get_schema(&self) -> Result<&'e SchemaDescription> {
        self.executor.get_schema(self.name)
    }
}
