//! In-memory backend for modelkit.
//!
//! `modelkit-memory` provides a [`Store`](modelkit_core::Store) that keeps
//! tables in process memory and a
//! [`FilterEvaluator`](modelkit_core::FilterEvaluator) for a small filter
//! expression language over those tables.
//!
//! # Behavior
//!
//! - Integer primary keys are generated per table, starting at
//!   [`MemoryStoreConfig::first_id`] and never reused.
//! - `UNIQUE` and `NOT NULL` are enforced on insert and update; violations
//!   surface as [`StoreError::IntegrityViolation`](modelkit_core::StoreError).
//! - Values are checked against the column's [`SqlType`](modelkit_core::SqlType).
//! - Transactions are serialized. A transaction holds the store lock until it
//!   is committed, rolled back or dropped, so code running inside one (a
//!   notifier, for example) must not open another on the same store.
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! let evaluator = MemoryFilterEvaluator::new(store.clone(), Arc::clone(&registry));
//! let executor = Executor::new(registry, store).with_evaluator(evaluator);
//! ```

pub mod evaluator;
pub mod filter;
pub mod store;

pub use evaluator::MemoryFilterEvaluator;
pub use filter::{CompareOp, Filter};
pub use store::{MemoryStore, MemoryStoreConfig, MemoryTransaction};
