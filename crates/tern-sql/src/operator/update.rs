//! Update operator.
//!
//! Three-phase so mutation stays well-defined under concurrent readers:
//! collect every matched record by value while the child cursor is still
//! the only thing touching storage, then validate and coerce the
//! replacement values, then issue delete / apply / insert per record
//! through the transaction.

use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tracing::debug;

use crate::expr::Tuple;
use crate::storage::{FieldMeta, Record, Table};
use crate::txn::Transaction;
use crate::value::Value;

use super::PhysicalOperator;

/// Applies column updates to every row produced by the child scan.
///
/// Produces no output rows; its effect is entirely the side effect on
/// storage via the transaction.
pub struct UpdateOperator {
    table: Arc<Table>,
    fields: Vec<FieldMeta>,
    values: Vec<Value>,
    child: Box<dyn PhysicalOperator>,
}

impl UpdateOperator {
    /// Creates an update of `fields` to `values` over the child's rows.
    pub fn new(
        table: Arc<Table>,
        fields: Vec<FieldMeta>,
        values: Vec<Value>,
        child: Box<dyn PhysicalOperator>,
    ) -> Self {
        Self {
            table,
            fields,
            values,
            child,
        }
    }

    /// Coerces each replacement value to its column's declared type,
    /// failing the whole operation on the first coercion error.
    fn coerce_values(&mut self) -> TernResult<()> {
        if self.fields.len() != self.values.len() {
            return Err(TernError::invalid_argument(format!(
                "{} target columns but {} values",
                self.fields.len(),
                self.values.len()
            )));
        }
        for (field, value) in self.fields.iter().zip(self.values.iter_mut()) {
            if !value.is_null() && value.attr_type() != field.attr_type() {
                *value = value.cast_to(field.attr_type())?;
            }
        }
        Ok(())
    }
}

impl PhysicalOperator for UpdateOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.child.open(Arc::clone(&txn))?;

        // Phase 1: detach every matched record from the scan before any
        // mutation begins; never mutate under an active cursor.
        let mut records: Vec<Record> = Vec::new();
        while self.child.next()? {
            records.push(self.child.current_record()?);
        }
        self.child.close()?;

        // Phase 2: validate and coerce the replacement values.
        self.coerce_values()?;
        debug!(rows = records.len(), table = %self.table.name(), "updating records");

        // Phase 3: delete, apply, insert, in that order, so the
        // transaction's visibility bookkeeping sees a delete/insert pair
        // rather than an in-place mutation.
        for record in records {
            txn.delete_record(&self.table, &record)?;
            let mut record = record;
            self.table
                .update_record(&mut record, &self.fields, &self.values)?;
            txn.insert_record(&self.table, record)?;
        }
        Ok(())
    }

    fn next(&mut self) -> TernResult<bool> {
        Ok(false)
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        Err(TernError::internal("update produces no rows"))
    }

    fn close(&mut self) -> TernResult<()> {
        Ok(())
    }
}
