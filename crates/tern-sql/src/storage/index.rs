//! Index metadata and the range-cursor interfaces.

use std::cmp::Ordering;
use std::fmt;

use parking_lot::RwLock;
use serde_json::json;
use tern_common::{RowId, TernError, TernResult};

use crate::value::Value;

use super::schema::TableSchema;

/// Immutable metadata describing one index.
///
/// Created at CREATE INDEX time, serialized to and from the catalog
/// document, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    name: String,
    unique: bool,
    fields: Vec<String>,
}

impl IndexMeta {
    /// Creates index metadata.
    pub fn new(
        name: impl Into<String>,
        fields: Vec<String>,
        unique: bool,
    ) -> TernResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TernError::invalid_argument("index name is empty"));
        }
        Ok(Self {
            name,
            unique,
            fields,
        })
    }

    /// The index name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the index enforces uniqueness.
    pub fn unique(&self) -> bool {
        self.unique
    }

    /// The indexed column names, in key order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Serializes to the catalog document format.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "unique": self.unique,
            "field_num": self.fields.len(),
            "field_name": self.fields,
        })
    }

    /// Deserializes from the catalog document format.
    ///
    /// Fails with an internal error if `name` is not a string, and with a
    /// column-not-found error if a referenced column does not exist on
    /// the table.
    pub fn from_json(
        table_name: &str,
        schema: &TableSchema,
        value: &serde_json::Value,
    ) -> TernResult<Self> {
        let name = value
            .get("name")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| TernError::internal("index name is not a string"))?;
        let unique = value
            .get("unique")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        let field_num = value
            .get("field_num")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as usize;

        let mut fields = Vec::with_capacity(field_num);
        for i in 0..field_num {
            let field_name = value
                .get("field_name")
                .and_then(|names| names.get(i))
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    TernError::internal(format!("field name {} of index '{}' is not a string", i, name))
                })?;
            if schema.field(field_name).is_none() {
                return Err(TernError::ColumnNotFound {
                    column: field_name.to_string(),
                    table: table_name.to_string(),
                });
            }
            fields.push(field_name.to_string());
        }
        Self::new(name, fields, unique)
    }
}

impl fmt::Display for IndexMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "index name={}, fields={}", self.name, self.fields.join(","))
    }
}

/// An index over one table, able to produce range cursors.
pub trait Index: Send + Sync + fmt::Debug {
    /// The index metadata.
    fn meta(&self) -> &IndexMeta;

    /// Opens a range cursor over `[low, high]` with per-bound
    /// inclusivity. `None` bounds are unbounded.
    fn create_scanner(
        &self,
        low: Option<&Value>,
        low_inclusive: bool,
        high: Option<&Value>,
        high_inclusive: bool,
    ) -> TernResult<Box<dyn IndexScanner>>;
}

/// A range cursor over index entries.
///
/// The cursor is a scoped resource; dropping it releases it.
pub trait IndexScanner: Send {
    /// Returns the next matching entry's row id, or `None` at the end of
    /// the range.
    fn next_entry(&mut self) -> TernResult<Option<RowId>>;
}

/// In-memory index ordered on its first key column.
#[derive(Debug)]
pub struct MemoryIndex {
    meta: IndexMeta,
    key_columns: Vec<usize>,
    entries: RwLock<Vec<(Vec<Value>, RowId)>>,
}

impl MemoryIndex {
    /// Creates an empty index. `key_columns` are schema positions of the
    /// indexed columns, in key order.
    pub fn new(meta: IndexMeta, key_columns: Vec<usize>) -> Self {
        Self {
            meta,
            key_columns,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Adds an entry for a stored row.
    pub fn insert_entry(&self, row_values: &[Value], rid: RowId) {
        let key: Vec<Value> = self
            .key_columns
            .iter()
            .map(|&i| row_values.get(i).cloned().unwrap_or(Value::Null))
            .collect();
        self.entries.write().push((key, rid));
    }

    /// Removes the entry for a row.
    pub fn remove_entry(&self, rid: RowId) {
        self.entries.write().retain(|(_, entry_rid)| *entry_rid != rid);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn within_low(key: &Value, low: &Value, inclusive: bool) -> TernResult<bool> {
        match key.compare(low)? {
            Ordering::Greater => Ok(true),
            Ordering::Equal => Ok(inclusive),
            Ordering::Less => Ok(false),
        }
    }

    fn within_high(key: &Value, high: &Value, inclusive: bool) -> TernResult<bool> {
        match key.compare(high)? {
            Ordering::Less => Ok(true),
            Ordering::Equal => Ok(inclusive),
            Ordering::Greater => Ok(false),
        }
    }
}

impl Index for MemoryIndex {
    fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    fn create_scanner(
        &self,
        low: Option<&Value>,
        low_inclusive: bool,
        high: Option<&Value>,
        high_inclusive: bool,
    ) -> TernResult<Box<dyn IndexScanner>> {
        let entries = self.entries.read();
        let mut matched: Vec<(Value, RowId)> = Vec::new();
        for (key, rid) in entries.iter() {
            let first = key.first().cloned().unwrap_or(Value::Null);
            // Range predicates never match NULL keys
            if first.is_null() {
                if low.is_none() && high.is_none() {
                    matched.push((first, *rid));
                }
                continue;
            }
            if let Some(low) = low {
                if !Self::within_low(&first, low, low_inclusive)? {
                    continue;
                }
            }
            if let Some(high) = high {
                if !Self::within_high(&first, high, high_inclusive)? {
                    continue;
                }
            }
            matched.push((first, *rid));
        }
        matched.sort_by(|(a_key, a_rid), (b_key, b_rid)| {
            match (a_key.is_null(), b_key.is_null()) {
                (true, true) => a_rid.cmp(b_rid),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => a_key.compare_raw(b_key).cmp(&0).then(a_rid.cmp(b_rid)),
            }
        });

        Ok(Box::new(MemoryIndexScanner {
            row_ids: matched.into_iter().map(|(_, rid)| rid).collect(),
            pos: 0,
        }))
    }
}

struct MemoryIndexScanner {
    row_ids: Vec<RowId>,
    pos: usize,
}

impl IndexScanner for MemoryIndexScanner {
    fn next_entry(&mut self) -> TernResult<Option<RowId>> {
        if self.pos >= self.row_ids.len() {
            return Ok(None);
        }
        let rid = self.row_ids[self.pos];
        self.pos += 1;
        Ok(Some(rid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FieldMeta;
    use crate::value::AttrType;

    fn test_schema() -> TableSchema {
        TableSchema::new(vec![
            FieldMeta::new("id", AttrType::Int),
            FieldMeta::new("score", AttrType::Float),
        ])
    }

    fn test_index() -> MemoryIndex {
        let meta = IndexMeta::new("idx_score", vec!["score".to_string()], false).unwrap();
        MemoryIndex::new(meta, vec![1])
    }

    fn drain(mut scanner: Box<dyn IndexScanner>) -> Vec<u64> {
        let mut out = Vec::new();
        while let Some(rid) = scanner.next_entry().unwrap() {
            out.push(rid.as_u64());
        }
        out
    }

    #[test]
    fn test_meta_rejects_blank_name() {
        assert!(IndexMeta::new("  ", vec![], false).is_err());
    }

    #[test]
    fn test_meta_json_round_trip() {
        let meta = IndexMeta::new(
            "idx",
            vec!["id".to_string(), "score".to_string()],
            true,
        )
        .unwrap();
        let doc = meta.to_json();
        assert_eq!(doc["field_num"], 2);
        let loaded = IndexMeta::from_json("t", &test_schema(), &doc).unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn test_meta_json_rejects_bad_name() {
        let doc = json!({ "name": 7, "unique": false, "field_num": 0, "field_name": [] });
        let err = IndexMeta::from_json("t", &test_schema(), &doc).unwrap_err();
        assert_eq!(err.code(), tern_common::ErrorCode::Internal);
    }

    #[test]
    fn test_meta_json_rejects_unknown_column() {
        let doc = json!({
            "name": "idx",
            "unique": false,
            "field_num": 1,
            "field_name": ["missing"],
        });
        let err = IndexMeta::from_json("t", &test_schema(), &doc).unwrap_err();
        assert_eq!(err.code(), tern_common::ErrorCode::ColumnNotFound);
    }

    #[test]
    fn test_range_scan_bounds() {
        let index = test_index();
        for (rid, score) in [(1, 10.0f32), (2, 20.0), (3, 30.0), (4, 20.0)] {
            index.insert_entry(&[Value::int(rid as i32), Value::float(score)], RowId::new(rid));
        }

        let low = Value::float(20.0);
        let scanner = index.create_scanner(Some(&low), true, None, false).unwrap();
        assert_eq!(drain(scanner), vec![2, 4, 3]);

        let scanner = index.create_scanner(Some(&low), false, None, false).unwrap();
        assert_eq!(drain(scanner), vec![3]);

        let high = Value::float(20.0);
        let scanner = index.create_scanner(None, false, Some(&high), true).unwrap();
        assert_eq!(drain(scanner), vec![1, 2, 4]);
    }

    #[test]
    fn test_null_keys_excluded_from_ranges() {
        let index = test_index();
        index.insert_entry(&[Value::int(1), Value::Null], RowId::new(1));
        index.insert_entry(&[Value::int(2), Value::float(5.0)], RowId::new(2));

        let low = Value::float(0.0);
        let scanner = index.create_scanner(Some(&low), true, None, false).unwrap();
        assert_eq!(drain(scanner), vec![2]);

        // An unbounded scan still reaches every entry
        let scanner = index.create_scanner(None, false, None, false).unwrap();
        assert_eq!(drain(scanner).len(), 2);
    }

    #[test]
    fn test_remove_entry() {
        let index = test_index();
        index.insert_entry(&[Value::int(1), Value::float(1.0)], RowId::new(1));
        index.insert_entry(&[Value::int(2), Value::float(2.0)], RowId::new(2));
        index.remove_entry(RowId::new(1));
        let scanner = index.create_scanner(None, false, None, false).unwrap();
        assert_eq!(drain(scanner), vec![2]);
    }
}
