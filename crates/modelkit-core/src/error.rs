//! Error types.
//!
//! [`Error`] is what callers of the data-access layer see. The two boundary
//! errors, [`StoreError`] (persistence) and [`NotifyError`] (backends), are
//! translated into it by the executor, operation by operation.

use thiserror::Error;

use crate::value::Value;

/// Result alias used across modelkit.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by registry, schema, executor and dispatch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The entity type name is not registered.
    #[error("unknown entity type `{0}`")]
    UnknownEntityType(String),

    /// Update or delete target does not exist.
    #[error("{entity} id {id} does not exist")]
    NotFound { entity: String, id: Value },

    /// Uniqueness or integrity violation on create.
    #[error("unable to create {entity}, duplicate entry: {message}")]
    DuplicateEntry { entity: String, message: String },

    /// A structured value did not fit its column on create.
    #[error("invalid value for {entity}.{field}: {message}")]
    InvalidFieldValue {
        entity: String,
        field: String,
        message: String,
    },

    /// A notification backend refused the change; the transaction was rolled back.
    #[error("backend failure: {0}")]
    BackendNotification(#[from] NotifyError),

    /// Unclassified persistence failure.
    #[error("{0}")]
    Runtime(String),

    /// Filter referenced a clause the store could not evaluate (strict mode only).
    #[error("invalid filter on {entity}: {message}")]
    InvalidFilter { entity: String, message: String },

    /// Free-text query could not be parsed by the evaluator.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Entity descriptor failed validation at registration.
    #[error("invalid descriptor for `{entity}`: {message}")]
    InvalidDescriptor { entity: String, message: String },

    /// An entity type with this name is already registered.
    #[error("entity type `{0}` is already registered")]
    DuplicateEntityType(String),

    /// The process-wide registry was already installed.
    #[error("entity registry is already installed")]
    RegistryInstalled,

    /// No operation is bound under this name.
    #[error("no operation named `{0}`")]
    UnknownOperation(String),

    /// Two entity types derive the same generated operation name.
    #[error("operation `{name}` would be generated for both `{first}` and `{second}`")]
    DuplicateOperation {
        name: String,
        first: String,
        second: String,
    },

    /// Operation called with the wrong argument shape.
    #[error("operation `{operation}` expects {expected}")]
    InvalidArguments {
        operation: String,
        expected: &'static str,
    },
}

impl Error {
    /// Shorthand for a [`Error::Runtime`] failure.
    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime(message.into())
    }

    /// True for "target row does not exist".
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// Failure categories reported by a persistence store.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Unique or NOT NULL constraint violated.
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    /// Value does not fit the column type.
    #[error("malformed value for `{field}`: {message}")]
    MalformedValue { field: String, message: String },

    /// The keyed row does not exist.
    #[error("row not found")]
    NotFound,

    /// A clause referenced something the store cannot evaluate.
    #[error("invalid clause: {0}")]
    InvalidClause(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),
}

/// Failure reported by a notification backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{backend}: {message}")]
pub struct NotifyError {
    /// Backend that failed.
    pub backend: String,
    /// What went wrong.
    pub message: String,
}

impl NotifyError {
    /// Create a new notification error.
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
