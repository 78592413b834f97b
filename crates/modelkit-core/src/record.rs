//! Entity records.
//!
//! A `Record` is one row of an entity type: column names mapped to values,
//! in column order. It is also used for caller-supplied field maps and
//! equality filters, which are just partial records.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::value::Value;

/// An ordered field-name → value mapping.
///
/// # Example
///
/// ```
/// use modelkit_core::{Record, Value};
///
/// let mut node = Record::new();
/// node.set("backend", "east");
/// node.set("backend_state", "active");
///
/// assert_eq!(node.get("backend").and_then(Value::as_str), Some("east"));
/// assert_eq!(node.columns().collect::<Vec<_>>(), vec!["backend", "backend_state"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with room for `capacity` fields.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Set a field, replacing an existing value in place or appending.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(idx).1)
    }

    /// Check whether a field is present (NULL counts as present).
    pub fn contains(&self, field: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == field)
    }

    /// Field names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy only the listed fields, in the listed order. Fields missing from
    /// this record are skipped.
    #[must_use]
    pub fn project<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = Self::new();
        for field in fields {
            if let Some(v) = self.get(field) {
                out.entries.push((field.to_string(), v.clone()));
            }
        }
        out
    }

    /// Convert into a JSON object.
    ///
    /// Key order follows `serde_json::Map`; serialize the record directly
    /// when column order matters.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    /// Build a record from a JSON object. Returns `None` for non-objects.
    pub fn from_json(json: JsonValue) -> Option<Self> {
        match json {
            JsonValue::Object(map) => Some(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.set(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
