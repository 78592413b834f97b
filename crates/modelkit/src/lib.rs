//! modelkit: registry-driven generic CRUD.
//!
//! Entity types are described once, as data. From that description modelkit
//! derives a schema, a full set of CRUD operations that run inside a single
//! transaction each, change notifications delivered before commit, and a
//! name-keyed dispatch table for callers that select operations by string.
//!
//! # Quick Start
//!
//! ```
//! use modelkit::prelude::*;
//!
//! let registry = Arc::new(modelkit::models::builtin_registry()?);
//! let store = MemoryStore::new();
//! let events = Arc::new(RecordingNotifier::new());
//! let executor = Executor::new(Arc::clone(&registry), store.clone())
//!     .with_notifier(Arc::clone(&events))
//!     .with_evaluator(MemoryFilterEvaluator::new(store, registry));
//!
//! let node = executor.create("nodes", &Record::new().with("backend", "east"))?;
//! assert_eq!(node.get("id"), Some(&Value::BigInt(1)));
//! assert_eq!(events.len(), 1);
//!
//! let east = executor.query("nodes", "backend = 'east'")?;
//! assert_eq!(east.len(), 1);
//! # Ok::<(), modelkit::Error>(())
//! ```
//!
//! # Crates
//!
//! - `modelkit-core`: values, records, descriptors, registry and the
//!   store/notifier/evaluator traits
//! - `modelkit-schema`: schema descriptions
//! - `modelkit-session`: the executor
//! - `modelkit-memory`: in-memory store and filter evaluator

pub mod dispatch;
pub mod models;
pub mod relationship;

pub use modelkit_core::{
    ChangeNotification, EntityDescriptor, EntityRegistry, Error, FieldInfo, FilterEvaluator,
    JoinCondition, JoinSpec, Notifier, NotifyError, Record, Result, SqlType, Store, StoreError,
    StoreTransaction, SynthesizedField, Value, Verb, registry, singular,
};
pub use modelkit_memory::{MemoryFilterEvaluator, MemoryStore, MemoryStoreConfig};
pub use modelkit_schema::{FieldSchema, SchemaCatalog, SchemaDescription};
pub use modelkit_session::{
    EntityHandle, Executor, ExecutorConfig, FanoutNotifier, NoopNotifier, RecordingNotifier,
};

pub use dispatch::{Call, DispatchBuilder, DispatchTable, Reply};
pub use relationship::adventures_compatible_with_node;

/// Everything needed for typical use.
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::dispatch::{Call, DispatchTable, Reply};
    pub use crate::{
        EntityDescriptor, EntityRegistry, Error, Executor, ExecutorConfig, FieldInfo,
        MemoryFilterEvaluator, MemoryStore, Notifier, RecordingNotifier, Record, Result, SqlType,
        SynthesizedField, Value, Verb,
    };
}
