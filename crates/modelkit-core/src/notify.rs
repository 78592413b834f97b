//! The notification boundary.
//!
//! Backends subscribe to state changes through [`Notifier`]. The executor
//! calls it exactly once per successful mutation, before the transaction
//! commits; an error aborts the transaction.

use std::fmt;

use serde::Serialize;

use crate::error::NotifyError;
use crate::record::Record;

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Update,
    Delete,
}

impl Verb {
    /// Wire name of the verb.
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subscriber for record changes.
pub trait Notifier: Send + Sync {
    /// Deliver one change. `kind` is the singular entity name.
    fn notify(
        &self,
        kind: &str,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<(), NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(
        &self,
        kind: &str,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Result<(), NotifyError> {
        (**self).notify(kind, verb, before, after)
    }
}

/// An owned change event, as forwarded to backends that queue or log them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeNotification {
    /// Singular entity name.
    pub kind: String,
    /// What happened.
    pub verb: Verb,
    /// Snapshot before the change (`None` for create).
    pub before: Option<Record>,
    /// Snapshot after the change (`None` for delete).
    pub after: Option<Record>,
}

impl ChangeNotification {
    /// Capture an event from the borrowed arguments of [`Notifier::notify`].
    pub fn capture(
        kind: &str,
        verb: Verb,
        before: Option<&Record>,
        after: Option<&Record>,
    ) -> Self {
        Self {
            kind: kind.to_string(),
            verb,
            before: before.cloned(),
            after: after.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_serializes_with_lowercase_verb() {
        let after = Record::new().with("id", 1);
        let change = ChangeNotification::capture("node", Verb::Create, None, Some(&after));
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "node", "verb": "create", "before": null, "after": {"id": 1}})
        );
    }
}
