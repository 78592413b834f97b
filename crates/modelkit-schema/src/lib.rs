//! Schema introspection for modelkit.
//!
//! Turns registered [`EntityDescriptor`](modelkit_core::EntityDescriptor)s
//! into the public schema description consumed by API clients:
//!
//! ```text
//! { "schema": { field: { type, primary_key, unique, updatable, required, fk? } } }
//! ```
//!
//! Synthesized fields are folded in with a fixed description (`TEXT`, not
//! unique, not required, not updatable). [`SchemaCatalog`] computes every
//! description once, up front, from a frozen registry.

pub mod catalog;
pub mod introspect;

pub use catalog::SchemaCatalog;
pub use introspect::{FieldSchema, SYNTHESIZED_TYPE, SchemaDescription};
