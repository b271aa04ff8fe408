//! Field and table schema metadata.

use serde::{Deserialize, Serialize};

use crate::value::AttrType;

/// Metadata for one column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    name: String,
    attr_type: AttrType,
}

impl FieldMeta {
    /// Creates a new field.
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            name: name.into(),
            attr_type,
        }
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's declared type.
    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }
}

/// An ordered list of fields describing a table's rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    fields: Vec<FieldMeta>,
}

impl TableSchema {
    /// Creates a schema from its fields.
    pub fn new(fields: Vec<FieldMeta>) -> Self {
        Self { fields }
    }

    /// All fields, in declaration order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Looks up a field's position by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup() {
        let schema = TableSchema::new(vec![
            FieldMeta::new("id", AttrType::Int),
            FieldMeta::new("name", AttrType::Char),
        ]);
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field("name").unwrap().attr_type(), AttrType::Char);
        assert_eq!(schema.field_index("id"), Some(0));
        assert!(schema.field("missing").is_none());
    }
}
