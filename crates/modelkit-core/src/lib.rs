//! Core types and traits for modelkit.
//!
//! `modelkit-core` is the **foundation layer** for the workspace. It defines the
//! data model shared by every other crate and the traits at each collaborator
//! boundary.
//!
//! # Role In The Architecture
//!
//! - **Data model**: `Value`, `Record` and `SqlType` represent column values,
//!   rows and column types.
//! - **Metadata**: `FieldInfo` and `EntityDescriptor` describe entity types;
//!   `EntityRegistry` is the frozen directory of them.
//! - **Contract layer**: `Store`/`StoreTransaction` (persistence), `Notifier`
//!   (backends) and `FilterEvaluator` (free-text queries) are implemented by
//!   drivers and integrations.
//!
//! # Who Uses This Crate
//!
//! - `modelkit-schema` turns descriptors into the public schema description.
//! - `modelkit-session` runs generic CRUD on top of the three boundary traits.
//! - `modelkit-memory` implements `Store` and `FilterEvaluator` in memory.
//!
//! Most applications should use the `modelkit` facade.

pub mod entity;
pub mod error;
pub mod field;
pub mod notify;
pub mod query;
pub mod record;
pub mod registry;
pub mod store;
pub mod types;
pub mod value;

pub use entity::{DeriveFn, EntityDescriptor, SynthesizedField, singular};
pub use error::{Error, NotifyError, Result, StoreError};
pub use field::FieldInfo;
pub use notify::{ChangeNotification, Notifier, Verb};
pub use query::FilterEvaluator;
pub use record::Record;
pub use registry::EntityRegistry;
pub use store::{JoinCondition, JoinSpec, Store, StoreTransaction};
pub use types::SqlType;
pub use value::Value;
