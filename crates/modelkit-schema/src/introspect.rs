//! Public schema descriptions derived from entity descriptors.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use modelkit_core::{EntityDescriptor, FieldInfo};

/// Type tag reported for every synthesized field.
pub const SYNTHESIZED_TYPE: &str = "TEXT";

/// Public description of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSchema {
    /// Type tag (`TEXT`, `INTEGER`, `JSON`, ...).
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Whether this is the primary key.
    pub primary_key: bool,
    /// Explicitly unique or primary key.
    pub unique: bool,
    /// Whether the update path may write this field.
    pub updatable: bool,
    /// Not nullable.
    pub required: bool,
    /// Foreign key target (`entity.field`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fk: Option<String>,
}

impl FieldSchema {
    /// Describe a stored column of `entity`.
    pub fn stored(entity: &EntityDescriptor, field: &FieldInfo) -> Self {
        Self {
            type_tag: field.sql_type.tag(),
            primary_key: field.primary_key,
            unique: field.is_unique(),
            updatable: !entity.non_updatable_fields().contains(&field.name),
            required: field.is_required(),
            fk: field.foreign_key.map(str::to_string),
        }
    }

    /// The fixed description of a synthesized field.
    pub fn synthesized() -> Self {
        Self {
            type_tag: SYNTHESIZED_TYPE.to_string(),
            primary_key: false,
            unique: false,
            updatable: false,
            required: false,
            fk: None,
        }
    }
}

/// `{"schema": {field: FieldSchema, ...}}` for one entity type.
///
/// Fields keep column order: stored columns, then synthesized fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDescription {
    fields: Vec<(String, FieldSchema)>,
}

impl SchemaDescription {
    /// Describe an entity type.
    pub fn of(entity: &EntityDescriptor) -> Self {
        let stored = entity
            .fields()
            .iter()
            .map(|f| (f.name.to_string(), FieldSchema::stored(entity, f)));
        let synthesized = entity
            .synthesized_fields()
            .iter()
            .map(|s| (s.name.to_string(), FieldSchema::synthesized()));
        Self {
            fields: stored.chain(synthesized).collect(),
        }
    }

    /// Description of one field.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate `(name, description)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSchema)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    /// Number of described fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if there are no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

struct FieldMap<'a>(&'a [(String, FieldSchema)]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, field) in self.0 {
            map.serialize_entry(name, field)?;
        }
        map.end()
    }
}

impl Serialize for SchemaDescription {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("schema", &FieldMap(&self.fields))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelkit_core::{SqlType, SynthesizedField, Value};
    use serde_json::json;

    fn nothing(_: &modelkit_core::Record) -> Value {
        Value::Null
    }

    const FIELDS: &[FieldInfo] = &[
        FieldInfo::id("id"),
        FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes.id"),
        FieldInfo::new("payload", SqlType::Json).nullable(true),
        FieldInfo::new("submitted", SqlType::Integer).nullable(true),
    ];
    const SYN: &[SynthesizedField] = &[SynthesizedField::new("summary", nothing)];
    const TASKS: EntityDescriptor = EntityDescriptor::new("tasks", FIELDS)
        .non_updatable(&["submitted"])
        .synthesized(SYN);

    #[test]
    fn test_one_entry_per_column_and_synthesized_field() {
        let schema = SchemaDescription::of(&TASKS);
        assert_eq!(schema.len(), 5);
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["id", "node_id", "payload", "submitted", "summary"]
        );
    }

    #[test]
    fn test_primary_key_reports_unique() {
        let schema = SchemaDescription::of(&TASKS);
        let id = schema.field("id").unwrap();
        assert!(id.primary_key);
        assert!(id.unique);
        assert!(id.required);
    }

    #[test]
    fn test_json_shape() {
        let schema = SchemaDescription::of(&TASKS);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            json["schema"]["node_id"],
            json!({
                "type": "INTEGER",
                "primary_key": false,
                "unique": false,
                "updatable": true,
                "required": true,
                "fk": "nodes.id"
            })
        );
        assert_eq!(json["schema"]["payload"]["type"], "JSON");
        assert!(json["schema"]["payload"].get("fk").is_none());
        assert_eq!(json["schema"]["submitted"]["updatable"], false);
        assert_eq!(
            json["schema"]["summary"],
            json!({
                "type": "TEXT",
                "primary_key": false,
                "unique": false,
                "updatable": false,
                "required": false
            })
        );
    }
}
