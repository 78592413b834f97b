//! Generic CRUD executor for modelkit.
//!
//! The [`Executor`] is the central unit of work. It owns a persistence store,
//! a notification sink and an optional filter evaluator, and runs the same
//! family of operations against any registered entity type.
//!
//! # Design Philosophy
//!
//! - **No per-type code**: entity types are data (descriptors), not structs
//! - **One transaction per operation**: commit or rollback, nothing in between
//! - **Notify before commit**: a backend that refuses a change undoes it
//! - **Fail closed**: unregistered type names are rejected before any I/O
//!
//! # Example
//!
//! ```ignore
//! let executor = Executor::new(registry, store)
//!     .with_notifier(backends)
//!     .with_evaluator(evaluator);
//!
//! let node = executor.create("nodes", &Record::new().with("backend", "east"))?;
//! let same = executor.get_by_id("nodes", 1)?;
//! executor.update_by_id("nodes", 1, &Record::new().with("backend", "west"))?;
//! executor.delete_by_id("nodes", 1)?;
//! ```

pub mod config;
pub mod executor;
pub mod handle;
pub mod notifiers;

pub use config::ExecutorConfig;
pub use executor::Executor;
pub use handle::EntityHandle;
pub use notifiers::{FanoutNotifier, NoopNotifier, RecordingNotifier};
