//! Entity type descriptors.
//!
//! An [`EntityDescriptor`] is the static description of one entity type: its
//! stored columns, which of them the update path may touch, and the
//! synthesized fields derived from a stored row. Descriptors are `const`
//! constructible so a whole schema can be declared as a list of statics.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::field::FieldInfo;
use crate::record::Record;
use crate::value::Value;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap_or_else(|e| panic!("identifier pattern: {e}"))
});

/// Singular form of a registered entity name: one trailing `s` removed.
///
/// ```
/// assert_eq!(modelkit_core::singular("nodes"), "node");
/// assert_eq!(modelkit_core::singular("sheep"), "sheep");
/// ```
pub fn singular(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Function deriving a synthesized field from the stored columns of a row.
pub type DeriveFn = fn(&Record) -> Value;

/// A field present in output and schema but never stored.
#[derive(Debug, Clone, Copy)]
pub struct SynthesizedField {
    /// Output name.
    pub name: &'static str,
    /// Computes the value from the stored row.
    pub derive: DeriveFn,
}

impl SynthesizedField {
    /// Declare a synthesized field.
    pub const fn new(name: &'static str, derive: DeriveFn) -> Self {
        Self { name, derive }
    }
}

/// Static description of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityDescriptor {
    name: &'static str,
    fields: &'static [FieldInfo],
    non_updatable: &'static [&'static str],
    synthesized: &'static [SynthesizedField],
}

impl EntityDescriptor {
    /// Describe an entity type by its registered (plural) name and stored columns.
    pub const fn new(name: &'static str, fields: &'static [FieldInfo]) -> Self {
        Self {
            name,
            fields,
            non_updatable: &[],
            synthesized: &[],
        }
    }

    /// Stored columns the update path must never change.
    pub const fn non_updatable(mut self, fields: &'static [&'static str]) -> Self {
        self.non_updatable = fields;
        self
    }

    /// Fields derived from the stored row.
    pub const fn synthesized(mut self, fields: &'static [SynthesizedField]) -> Self {
        self.synthesized = fields;
        self
    }

    /// Registered (plural) name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Singular name, used for dispatch entry names and notification kinds.
    pub fn singular(&self) -> &'static str {
        singular(self.name)
    }

    /// Stored column metadata, in declaration order.
    pub const fn fields(&self) -> &'static [FieldInfo] {
        self.fields
    }

    /// Look up a stored column.
    pub fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Synthesized field declarations.
    pub const fn synthesized_fields(&self) -> &'static [SynthesizedField] {
        self.synthesized
    }

    /// Names listed as non-updatable.
    pub const fn non_updatable_fields(&self) -> &'static [&'static str] {
        self.non_updatable
    }

    /// Primary key column name. Registration guarantees there is exactly one;
    /// `"id"` is the fallback for unregistered descriptors.
    pub fn primary_key(&self) -> &'static str {
        self.fields
            .iter()
            .find(|f| f.primary_key)
            .map_or("id", |f| f.name)
    }

    /// Stored column names in declaration order.
    pub fn stored_columns(&self) -> impl Iterator<Item = &'static str> + use<> {
        self.fields.iter().map(|f| f.name)
    }

    /// Stored columns followed by synthesized fields.
    pub fn columns(&self) -> Vec<&'static str> {
        self.stored_columns()
            .chain(self.synthesized.iter().map(|s| s.name))
            .collect()
    }

    /// Whether `name` is a stored column.
    pub fn is_stored(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Whether `name` is a synthesized field.
    pub fn is_synthesized(&self, name: &str) -> bool {
        self.synthesized.iter().any(|s| s.name == name)
    }

    /// Whether the update path may write `name`.
    pub fn is_updatable(&self, name: &str) -> bool {
        self.field(name)
            .is_some_and(|f| !f.primary_key && !self.non_updatable.iter().any(|n| *n == name))
    }

    /// Stored columns minus non-updatable ones minus the primary key.
    pub fn updatable_columns(&self) -> Vec<&'static str> {
        self.stored_columns()
            .filter(|c| self.is_updatable(c))
            .collect()
    }

    /// Stored columns a create may supply (everything but the primary key).
    pub fn insertable_columns(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| !f.primary_key)
            .map(|f| f.name)
            .collect()
    }

    /// Keep only the entries of `input` that are in `allowed`, in column order.
    pub fn select_fields(&self, input: &Record, allowed: &[&'static str]) -> Record {
        input.project(allowed.iter().copied())
    }

    /// Build the full output record from a stored row: stored columns in
    /// declaration order (missing ones as NULL), then synthesized fields.
    pub fn materialize(&self, stored: &Record) -> Record {
        let mut out = Record::with_capacity(self.fields.len() + self.synthesized.len());
        for field in self.fields {
            out.set(field.name, stored.get(field.name).cloned().unwrap_or_default());
        }
        for syn in self.synthesized {
            let value = (syn.derive)(&out);
            out.set(syn.name, value);
        }
        out
    }

    /// Check the descriptor is internally consistent.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Error::InvalidDescriptor {
            entity: self.name.to_string(),
            message,
        };

        if !IDENTIFIER.is_match(self.name) {
            return Err(invalid("entity name is not a valid identifier".into()));
        }
        if self.fields.is_empty() {
            return Err(invalid("no stored columns".into()));
        }

        let mut seen = HashSet::new();
        for field in self.fields {
            if !IDENTIFIER.is_match(field.name) {
                return Err(invalid(format!("`{}` is not a valid column name", field.name)));
            }
            if !seen.insert(field.name) {
                return Err(invalid(format!("column `{}` declared twice", field.name)));
            }
            let fk_ok = field.foreign_key_parts().is_some_and(|(entity, column)| {
                IDENTIFIER.is_match(entity) && IDENTIFIER.is_match(column)
            });
            if field.foreign_key.is_some() && !fk_ok {
                return Err(invalid(format!(
                    "foreign key on `{}` must look like `entity.field`",
                    field.name
                )));
            }
        }

        match self.fields.iter().filter(|f| f.primary_key).count() {
            1 => {}
            n => return Err(invalid(format!("expected one primary key, found {n}"))),
        }

        for name in self.non_updatable {
            if !self.is_stored(name) {
                return Err(invalid(format!("non-updatable `{name}` is not a stored column")));
            }
        }

        for syn in self.synthesized {
            if !IDENTIFIER.is_match(syn.name) {
                return Err(invalid(format!("`{}` is not a valid field name", syn.name)));
            }
            if !seen.insert(syn.name) {
                return Err(invalid(format!(
                    "synthesized `{}` collides with another field",
                    syn.name
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    fn label(row: &Record) -> Value {
        match row.get("name") {
            Some(Value::Text(n)) => Value::Text(format!("<{n}>")),
            _ => Value::Null,
        }
    }

    const FIELDS: &[FieldInfo] = &[
        FieldInfo::id("id"),
        FieldInfo::new("name", SqlType::Text).unique(true),
        FieldInfo::new("created", SqlType::Integer).nullable(true),
    ];
    const SYNTH: &[SynthesizedField] = &[SynthesizedField::new("label", label)];
    const THINGS: EntityDescriptor = EntityDescriptor::new("things", FIELDS)
        .non_updatable(&["created"])
        .synthesized(SYNTH);

    #[test]
    fn test_column_sets() {
        assert_eq!(THINGS.primary_key(), "id");
        assert_eq!(THINGS.columns(), vec!["id", "name", "created", "label"]);
        assert_eq!(THINGS.updatable_columns(), vec!["name"]);
        assert_eq!(THINGS.insertable_columns(), vec!["name", "created"]);
        assert_eq!(THINGS.singular(), "thing");
        assert!(THINGS.validate().is_ok());
    }

    #[test]
    fn test_materialize_fills_missing_and_derives() {
        let stored = Record::new().with("name", "x").with("id", 3);
        let full = THINGS.materialize(&stored);
        assert_eq!(full.columns().collect::<Vec<_>>(), THINGS.columns());
        assert_eq!(full.get("created"), Some(&Value::Null));
        assert_eq!(full.get("label"), Some(&Value::Text("<x>".into())));
    }

    #[test]
    fn test_validate_rejects_two_primary_keys() {
        const BAD: &[FieldInfo] = &[FieldInfo::id("id"), FieldInfo::id("other")];
        let err = EntityDescriptor::new("bad", BAD).validate().unwrap_err();
        assert!(err.to_string().contains("one primary key"));
    }

    #[test]
    fn test_validate_rejects_synthesized_collision() {
        const SYN: &[SynthesizedField] = &[SynthesizedField::new("name", label)];
        let err = EntityDescriptor::new("things", FIELDS)
            .synthesized(SYN)
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_validate_rejects_malformed_foreign_keys() {
        const GOOD: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes.id"),
        ];
        assert!(EntityDescriptor::new("facts", GOOD).validate().is_ok());

        const NO_COLUMN: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes."),
        ];
        const NO_ENTITY: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("node_id", SqlType::Integer).foreign_key(".id"),
        ];
        const NO_DOT: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes"),
        ];
        const NESTED: &[FieldInfo] = &[
            FieldInfo::id("id"),
            FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes.id.x"),
        ];
        for fields in [NO_COLUMN, NO_ENTITY, NO_DOT, NESTED] {
            assert!(matches!(
                EntityDescriptor::new("facts", fields).validate(),
                Err(Error::InvalidDescriptor { .. })
            ));
        }
    }

    #[test]
    fn test_validate_rejects_unknown_non_updatable() {
        let err = EntityDescriptor::new("things", FIELDS)
            .non_updatable(&["nope"])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
