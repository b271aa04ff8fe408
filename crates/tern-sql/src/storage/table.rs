//! In-memory tables and their record heap.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tern_common::{RowId, TernError, TernResult};
use tracing::debug;

use crate::value::Value;

use super::index::{Index, IndexMeta, MemoryIndex};
use super::record::Record;
use super::schema::{FieldMeta, TableSchema};

/// The record heap of one table; also serves as the record handler that
/// scan operators fetch full records from.
#[derive(Debug)]
pub struct RecordStore {
    rows: RwLock<Vec<Option<Vec<Value>>>>,
}

impl RecordStore {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Fetches the full record for a row id.
    pub fn get_record(&self, rid: RowId) -> TernResult<Record> {
        self.rows
            .read()
            .get(rid.as_u64() as usize)
            .and_then(Clone::clone)
            .map(|values| Record::new(rid, values))
            .ok_or_else(|| TernError::internal(format!("no record for row id {}", rid)))
    }

    /// Stores a new row and returns it as a record.
    fn insert(&self, values: Vec<Value>) -> Record {
        let mut rows = self.rows.write();
        let rid = RowId::new(rows.len() as u64);
        rows.push(Some(values.clone()));
        Record::new(rid, values)
    }

    /// Removes a row.
    fn remove(&self, rid: RowId) -> TernResult<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .get_mut(rid.as_u64() as usize)
            .ok_or_else(|| TernError::internal(format!("no record for row id {}", rid)))?;
        if slot.take().is_none() {
            return Err(TernError::internal(format!("row id {} already deleted", rid)));
        }
        Ok(())
    }

    /// Row ids of all live rows, in storage order.
    pub fn row_ids(&self) -> Vec<RowId> {
        self.rows
            .read()
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|_| RowId::new(i as u64)))
            .collect()
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.rows.read().iter().filter(|slot| slot.is_some()).count()
    }

    /// Returns true if the heap has no live rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A table: schema, record heap, and indexes.
pub struct Table {
    name: String,
    schema: TableSchema,
    heap: Arc<RecordStore>,
    indexes: RwLock<Vec<Arc<MemoryIndex>>>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        Self::with_capacity(name, schema, 0)
    }

    /// Creates an empty table with reserved heap capacity.
    pub fn with_capacity(name: impl Into<String>, schema: TableSchema, capacity: usize) -> Self {
        Self {
            name: name.into(),
            schema,
            heap: Arc::new(RecordStore::with_capacity(capacity)),
            indexes: RwLock::new(Vec::new()),
        }
    }

    /// The table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table schema.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Resolves a column by name.
    pub fn field(&self, name: &str) -> TernResult<&FieldMeta> {
        self.schema.field(name).ok_or_else(|| TernError::ColumnNotFound {
            column: name.to_string(),
            table: self.name.clone(),
        })
    }

    /// The record handler for this table's heap.
    pub fn record_handler(&self) -> Arc<RecordStore> {
        Arc::clone(&self.heap)
    }

    /// Inserts a row, maintaining all indexes.
    pub fn insert_row(&self, values: Vec<Value>) -> TernResult<Record> {
        if values.len() != self.schema.len() {
            return Err(TernError::invalid_argument(format!(
                "table '{}' expects {} values, got {}",
                self.name,
                self.schema.len(),
                values.len()
            )));
        }
        let record = self.heap.insert(values);
        for index in self.indexes.read().iter() {
            index.insert_entry(record.values(), record.rid());
        }
        debug!(table = %self.name, rid = %record.rid(), "inserted row");
        Ok(record)
    }

    /// Deletes a row, maintaining all indexes.
    pub fn delete_row(&self, rid: RowId) -> TernResult<()> {
        self.heap.remove(rid)?;
        for index in self.indexes.read().iter() {
            index.remove_entry(rid);
        }
        debug!(table = %self.name, rid = %rid, "deleted row");
        Ok(())
    }

    /// Applies column values to a detached record.
    ///
    /// Mutates only the record, never storage; the caller re-inserts the
    /// record through the transaction.
    pub fn update_record(
        &self,
        record: &mut Record,
        fields: &[FieldMeta],
        values: &[Value],
    ) -> TernResult<()> {
        for (field, value) in fields.iter().zip(values) {
            let index = self
                .schema
                .field_index(field.name())
                .ok_or_else(|| TernError::ColumnNotFound {
                    column: field.name().to_string(),
                    table: self.name.clone(),
                })?;
            record.set_value(index, value.clone());
        }
        Ok(())
    }

    /// Creates an index described by `meta`, backfilling existing rows.
    pub fn create_index(&self, meta: IndexMeta) -> TernResult<Arc<MemoryIndex>> {
        let mut key_columns = Vec::with_capacity(meta.fields().len());
        for field_name in meta.fields() {
            let position = self
                .schema
                .field_index(field_name)
                .ok_or_else(|| TernError::ColumnNotFound {
                    column: field_name.clone(),
                    table: self.name.clone(),
                })?;
            key_columns.push(position);
        }

        let index = Arc::new(MemoryIndex::new(meta, key_columns));
        for rid in self.heap.row_ids() {
            let record = self.heap.get_record(rid)?;
            index.insert_entry(record.values(), rid);
        }
        self.indexes.write().push(Arc::clone(&index));
        Ok(index)
    }

    /// Looks up an index by name.
    pub fn find_index(&self, name: &str) -> TernResult<Arc<MemoryIndex>> {
        self.indexes
            .read()
            .iter()
            .find(|index| index.meta().name() == name)
            .cloned()
            .ok_or_else(|| TernError::IndexNotFound {
                index: name.to_string(),
                table: self.name.clone(),
            })
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("rows", &self.heap.len())
            .finish()
    }
}
