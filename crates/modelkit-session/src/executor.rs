//! The generic CRUD executor.
//!
//! One family of operations that works for every registered entity type.
//! The registry says which columns exist and which are mutable; the store
//! does the persistence; the notifier hears about every mutation before its
//! transaction commits.
//!
//! # Transactions
//!
//! Every operation runs in exactly one store transaction. Mutations commit
//! only after the notifier accepted the change; any error on the way rolls
//! the transaction back and is returned to the caller. Reads always end with
//! a rollback since they have nothing to persist.

use std::sync::Arc;

use modelkit_core::{
    EntityDescriptor, EntityRegistry, Error, FilterEvaluator, JoinSpec, Notifier, Record, Result,
    Store, StoreError, StoreTransaction, Value, Verb,
};
use modelkit_schema::{SchemaCatalog, SchemaDescription};

use crate::config::ExecutorConfig;
use crate::handle::EntityHandle;
use crate::notifiers::NoopNotifier;

/// Generic CRUD over the entity types of one registry.
pub struct Executor<S: Store> {
    registry: Arc<EntityRegistry>,
    catalog: SchemaCatalog,
    store: S,
    notifier: Arc<dyn Notifier>,
    evaluator: Option<Arc<dyn FilterEvaluator>>,
    config: ExecutorConfig,
}

impl<S: Store> Executor<S> {
    /// Create an executor with a no-op notifier and no filter evaluator.
    pub fn new(registry: impl Into<Arc<EntityRegistry>>, store: S) -> Self {
        let registry = registry.into();
        let catalog = SchemaCatalog::build(&registry);
        Self {
            registry,
            catalog,
            store,
            notifier: Arc::new(NoopNotifier),
            evaluator: None,
            config: ExecutorConfig::default(),
        }
    }

    /// Set the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    /// Set the evaluator used by [`Executor::query`].
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: impl FilterEvaluator + 'static) -> Self {
        self.evaluator = Some(Arc::new(evaluator));
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry this executor serves.
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Look up a registered entity type.
    pub fn descriptor(&self, entity_type: &str) -> Result<&EntityDescriptor> {
        self.registry.lookup(entity_type)
    }

    /// Bind operations to one entity type.
    pub fn entity(&self, entity_type: &str) -> Result<EntityHandle<'_, S>> {
        let entity = self.descriptor(entity_type)?;
        Ok(EntityHandle::new(self, entity.name()))
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Stored columns followed by synthesized fields.
    pub fn get_columns(&self, entity_type: &str) -> Result<Vec<&'static str>> {
        self.catalog.get_columns(entity_type).map(<[_]>::to_vec)
    }

    /// Public schema description.
    pub fn get_schema(&self, entity_type: &str) -> Result<&SchemaDescription> {
        self.catalog.get_schema(entity_type)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every record of the type.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn get_all(&self, entity_type: &str) -> Result<Vec<Record>> {
        let entity = self.descriptor(entity_type)?;
        let rows = self
            .read(|tx| tx.fetch_all(entity))
            .map_err(|e| Error::runtime(e.to_string()))?;
        Ok(rows.iter().map(|r| entity.materialize(r)).collect())
    }

    /// Records whose fields equal every entry of `filters`.
    ///
    /// A filter the store cannot evaluate matches nothing unless
    /// [`ExecutorConfig::lenient_filters`] is off.
    #[tracing::instrument(level = "debug", skip(self, filters))]
    pub fn get_by_filter(&self, entity_type: &str, filters: &Record) -> Result<Vec<Record>> {
        let entity = self.descriptor(entity_type)?;
        match self.read(|tx| tx.fetch_where(entity, filters)) {
            Ok(rows) => Ok(rows.iter().map(|r| entity.materialize(r)).collect()),
            Err(StoreError::InvalidClause(message)) if self.config.lenient_filters => {
                tracing::debug!(
                    entity = entity.name(),
                    %message,
                    "Invalid filter treated as empty result"
                );
                Ok(Vec::new())
            }
            Err(StoreError::InvalidClause(message)) => Err(Error::InvalidFilter {
                entity: entity.name().to_string(),
                message,
            }),
            Err(other) => Err(Error::runtime(other.to_string())),
        }
    }

    /// First record matching `filters`, if any.
    pub fn get_first_by_filter(
        &self,
        entity_type: &str,
        filters: &Record,
    ) -> Result<Option<Record>> {
        Ok(self.get_by_filter(entity_type, filters)?.into_iter().next())
    }

    /// The record whose primary key equals `id`, if any.
    pub fn get_by_id(&self, entity_type: &str, id: impl Into<Value>) -> Result<Option<Record>> {
        let entity = self.descriptor(entity_type)?;
        let filters = Record::new().with(entity.primary_key(), id);
        self.get_first_by_filter(entity_type, &filters)
    }

    /// Hand `query_text` to the filter evaluator unchanged.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn query(&self, entity_type: &str, query_text: &str) -> Result<Vec<Record>> {
        let entity = self.descriptor(entity_type)?;
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or_else(|| Error::runtime("no filter evaluator configured"))?;
        evaluator.evaluate(entity.name(), query_text)
    }

    /// Records of `target_type` joined against the `source_type` row keyed by
    /// `join.source_key`.
    #[tracing::instrument(level = "debug", skip(self, join))]
    pub fn fetch_joined(
        &self,
        target_type: &str,
        source_type: &str,
        join: &JoinSpec,
    ) -> Result<Vec<Record>> {
        let target = self.descriptor(target_type)?;
        let source = self.descriptor(source_type)?;
        let rows = self
            .read(|tx| tx.fetch_joined(target, source, join))
            .map_err(|e| Error::runtime(e.to_string()))?;
        Ok(rows.iter().map(|r| target.materialize(r)).collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a record from the stored, non-key entries of `fields`.
    ///
    /// The caller's primary key and any synthesized fields are ignored.
    #[tracing::instrument(level = "debug", skip(self, fields))]
    pub fn create(&self, entity_type: &str, fields: &Record) -> Result<Record> {
        let entity = self.descriptor(entity_type)?;
        let values = entity.select_fields(fields, &entity.insertable_columns());
        let classify = |e: StoreError| create_error(entity, e);

        let created = self.mutate(entity, &classify, |tx| {
            let stored = tx.insert(entity, &values).map_err(&classify)?;
            let created = entity.materialize(&stored);
            self.notify(entity, Verb::Create, None, Some(&created))?;
            Ok(created)
        })?;

        let id = created.get(entity.primary_key()).cloned().unwrap_or_default();
        tracing::info!(entity = entity.name(), %id, "Created record");
        Ok(created)
    }

    /// Apply the updatable entries of `fields` to the record keyed by `id`.
    ///
    /// Primary key and non-updatable fields in `fields` are ignored. Store
    /// failures other than a missing row surface as [`Error::Runtime`].
    #[tracing::instrument(level = "debug", skip(self, id, fields))]
    pub fn update_by_id(
        &self,
        entity_type: &str,
        id: impl Into<Value>,
        fields: &Record,
    ) -> Result<Record> {
        let entity = self.descriptor(entity_type)?;
        let id = id.into();
        let changes = entity.select_fields(fields, &entity.updatable_columns());
        let classify = |e: StoreError| match e {
            StoreError::NotFound => not_found(entity, &id),
            other => Error::runtime(other.to_string()),
        };

        let updated = self.mutate(entity, &classify, |tx| {
            let before = fetch_by_key(tx, entity, &id)
                .map_err(&classify)?
                .ok_or_else(|| not_found(entity, &id))?;
            let before = entity.materialize(&before);
            let stored = tx.update(entity, &id, &changes).map_err(&classify)?;
            let after = entity.materialize(&stored);
            self.notify(entity, Verb::Update, Some(&before), Some(&after))?;
            Ok(after)
        })?;

        tracing::info!(
            entity = entity.name(),
            %id,
            changed = changes.len(),
            "Updated record"
        );
        Ok(updated)
    }

    /// Delete the record keyed by `id`.
    #[tracing::instrument(level = "debug", skip(self, id))]
    pub fn delete_by_id(&self, entity_type: &str, id: impl Into<Value>) -> Result<bool> {
        let entity = self.descriptor(entity_type)?;
        let id = id.into();
        let classify = |e: StoreError| match e {
            StoreError::NotFound => not_found(entity, &id),
            other => Error::runtime(other.to_string()),
        };

        self.mutate(entity, &classify, |tx| {
            let before = fetch_by_key(tx, entity, &id)
                .map_err(&classify)?
                .map(|row| entity.materialize(&row));
            tx.delete(entity, &id).map_err(&classify)?;
            self.notify(entity, Verb::Delete, before.as_ref(), None)
        })?;

        tracing::info!(entity = entity.name(), %id, "Deleted record");
        Ok(true)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Run a read in its own transaction and roll it back afterwards.
    fn read<'s, T>(
        &'s self,
        op: impl FnOnce(&mut S::Tx<'s>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tx = self.store.begin()?;
        let result = op(&mut tx);
        if let Err(e) = tx.rollback() {
            tracing::debug!(error = %e, "Rollback after read failed");
        }
        result
    }

    /// Run a mutation in its own transaction. Commits on success, rolls back
    /// on any error. Store errors from `begin` and `commit` go through
    /// `classify`.
    fn mutate<'s, T>(
        &'s self,
        entity: &EntityDescriptor,
        classify: &dyn Fn(StoreError) -> Error,
        op: impl FnOnce(&mut S::Tx<'s>) -> Result<T>,
    ) -> Result<T> {
        let mut tx = self.store.begin().map_err(classify)?;
        match op(&mut tx) {
            Ok(value) => {
                tx.commit().map_err(|e| {
                    tracing::warn!(entity = entity.name(), error = %e, "Commit failed");
                    classify(e)
                })?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(entity = entity.name(), error = %err, "Rolling back transaction");
                if let Err(e) = tx.rollback() {
                    tracing::warn!(entity = entity.name(), error = %e, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    fn notify(
        &self,
        entity: &EntityDescriptor,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<()> {
        if self.config.log_snapshots {
            tracing::debug!(
                kind = entity.singular(),
                %verb,
                before = ?before,
                after = ?after,
                "Notifying backends"
            );
        }
        self.notifier
            .notify(entity.singular(), verb, before, after)
            .map_err(Error::from)
    }
}

impl<S: Store + std::fmt::Debug> std::fmt::Debug for Executor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("types", &self.registry.list_types())
            .field("store", &self.store)
            .field("has_evaluator", &self.evaluator.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn fetch_by_key<T: StoreTransaction>(
    tx: &mut T,
    entity: &EntityDescriptor,
    id: &Value,
) -> Result<Option<Record>, StoreError> {
    let filters = Record::new().with(entity.primary_key(), id.clone());
    Ok(tx.fetch_where(entity, &filters)?.into_iter().next())
}

fn not_found(entity: &EntityDescriptor, id: &Value) -> Error {
    Error::NotFound {
        entity: entity.name().to_string(),
        id: id.clone(),
    }
}

fn create_error(entity: &EntityDescriptor, err: StoreError) -> Error {
    match err {
        StoreError::IntegrityViolation(message) => Error::DuplicateEntry {
            entity: entity.name().to_string(),
            message,
        },
        StoreError::MalformedValue { field, message } => Error::InvalidFieldValue {
            entity: entity.name().to_string(),
            field,
            message,
        },
        other => Error::runtime(other.to_string()),
    }
}
