//! Field and column definitions.

use crate::types::SqlType;

/// Metadata about a stored column of an entity type.
///
/// Built with `const` builder methods so that whole entity schemas can live
/// in `static` tables:
///
/// ```
/// use modelkit_core::{FieldInfo, SqlType};
///
/// const PARENT: FieldInfo = FieldInfo::new("parent_id", SqlType::Integer)
///     .nullable(true)
///     .foreign_key("nodes.id");
///
/// assert_eq!(PARENT.foreign_key_parts(), Some(("nodes", "id")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    /// Column name
    pub name: &'static str,
    /// Semantic type of the column
    pub sql_type: SqlType,
    /// Whether NULL may be stored
    pub nullable: bool,
    /// Whether this is the primary key
    pub primary_key: bool,
    /// Whether this column has its own unique constraint
    pub unique: bool,
    /// Foreign key reference (`entity.field`)
    pub foreign_key: Option<&'static str>,
}

impl FieldInfo {
    /// Create a new non-null, non-unique column.
    pub const fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            primary_key: false,
            unique: false,
            foreign_key: None,
        }
    }

    /// Shorthand for an integer primary key column.
    pub const fn id(name: &'static str) -> Self {
        Self::new(name, SqlType::Integer).primary_key(true)
    }

    /// Set nullable flag.
    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Set primary key flag.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Set unique flag.
    pub const fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Set foreign key reference.
    pub const fn foreign_key(mut self, reference: &'static str) -> Self {
        self.foreign_key = Some(reference);
        self
    }

    /// Whether values in this column must be unique. Primary keys always are.
    pub const fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// Whether a value must be supplied (the column is NOT NULL).
    pub const fn is_required(&self) -> bool {
        !self.nullable
    }

    /// Split the foreign key reference into `(entity, field)`.
    pub fn foreign_key_parts(&self) -> Option<(&'static str, &'static str)> {
        self.foreign_key?.split_once('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_is_unique() {
        let id = FieldInfo::id("id");
        assert!(id.primary_key);
        assert!(!id.unique);
        assert!(id.is_unique());
        assert!(id.is_required());
    }

    #[test]
    fn test_builder_flags() {
        let f = FieldInfo::new("name", SqlType::Varchar(32))
            .unique(true)
            .nullable(true);
        assert!(f.is_unique());
        assert!(!f.is_required());
        assert_eq!(f.foreign_key_parts(), None);
    }

    #[test]
    fn test_malformed_foreign_key_has_no_parts() {
        let f = FieldInfo::new("node_id", SqlType::Integer).foreign_key("nodes");
        assert_eq!(f.foreign_key_parts(), None);
    }
}
