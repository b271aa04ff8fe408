//! Delete operator.

use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tracing::debug;

use crate::expr::Tuple;
use crate::storage::{Record, Table};
use crate::txn::Transaction;

use super::PhysicalOperator;

/// Deletes every row produced by the child scan.
///
/// Like the update operator, it first detaches all matched records from
/// the scan, then mutates; it produces no output rows.
pub struct DeleteOperator {
    table: Arc<Table>,
    child: Box<dyn PhysicalOperator>,
}

impl DeleteOperator {
    /// Creates a delete over the child's rows.
    pub fn new(table: Arc<Table>, child: Box<dyn PhysicalOperator>) -> Self {
        Self { table, child }
    }
}

impl PhysicalOperator for DeleteOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.child.open(Arc::clone(&txn))?;

        let mut records: Vec<Record> = Vec::new();
        while self.child.next()? {
            records.push(self.child.current_record()?);
        }
        self.child.close()?;

        debug!(rows = records.len(), table = %self.table.name(), "deleting records");
        for record in records {
            txn.delete_record(&self.table, &record)?;
        }
        Ok(())
    }

    fn next(&mut self) -> TernResult<bool> {
        Ok(false)
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        Err(TernError::internal("delete produces no rows"))
    }

    fn close(&mut self) -> TernResult<()> {
        Ok(())
    }
}
