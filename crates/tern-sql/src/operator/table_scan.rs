//! Sequential table-scan operator.

use std::sync::Arc;

use tern_common::{ErrorCode, RowId, TernError, TernResult};
use tracing::trace;

use crate::expr::{Expression, RowTuple, Tuple};
use crate::storage::{Record, Table};
use crate::txn::{AccessMode, Transaction};

use super::{evaluate_predicates, PhysicalOperator};

/// Full-heap scan with residual predicates and transaction visibility.
pub struct TableScanOperator {
    table: Arc<Table>,
    mode: AccessMode,
    predicates: Vec<Expression>,
    txn: Option<Arc<dyn Transaction>>,
    row_ids: Vec<RowId>,
    pos: usize,
    current: Option<Record>,
}

impl TableScanOperator {
    /// Creates a scan over `table`.
    pub fn new(table: Arc<Table>, mode: AccessMode) -> Self {
        Self {
            table,
            mode,
            predicates: Vec::new(),
            txn: None,
            row_ids: Vec::new(),
            pos: 0,
            current: None,
        }
    }

    /// Attaches residual predicates evaluated against every record.
    pub fn with_predicates(mut self, predicates: Vec<Expression>) -> Self {
        self.predicates = predicates;
        self
    }
}

impl PhysicalOperator for TableScanOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.row_ids = self.table.record_handler().row_ids();
        self.pos = 0;
        self.current = None;
        self.txn = Some(txn);
        Ok(())
    }

    fn next(&mut self) -> TernResult<bool> {
        debug_assert!(self.txn.is_some(), "next() on a closed operator");
        let txn = self
            .txn
            .clone()
            .ok_or_else(|| TernError::internal("table scan is not open"))?;
        let handler = self.table.record_handler();

        while self.pos < self.row_ids.len() {
            let rid = self.row_ids[self.pos];
            self.pos += 1;

            let record = handler.get_record(rid)?;
            let tuple = RowTuple::new(self.table.name(), self.table.schema(), &record);
            if !evaluate_predicates(&self.predicates, &tuple)? {
                trace!(rid = %rid, "record filtered");
                continue;
            }

            match txn.visit_record(&self.table, &record, self.mode) {
                Ok(()) => {
                    self.current = Some(record);
                    return Ok(true);
                }
                Err(e) if e.code() == ErrorCode::RecordInvisible => {
                    trace!(rid = %rid, "record invisible");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        self.current = None;
        Ok(false)
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        let record = self
            .current
            .as_ref()
            .ok_or_else(|| TernError::internal("table scan has no current row"))?;
        Ok(Box::new(RowTuple::new(
            self.table.name(),
            self.table.schema(),
            record,
        )))
    }

    fn current_record(&self) -> TernResult<Record> {
        self.current
            .clone()
            .ok_or_else(|| TernError::internal("table scan has no current row"))
    }

    fn close(&mut self) -> TernResult<()> {
        self.txn = None;
        self.row_ids.clear();
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ComparisonExpr, ComparisonOp, FieldExpr, ValueExpr};
    use crate::operator::test_support::students_db;
    use crate::txn::VacuousTxn;
    use crate::value::{AttrType, Value};

    fn score_above(threshold: f32) -> Expression {
        Expression::Comparison(ComparisonExpr::new(
            ComparisonOp::Greater,
            Expression::Field(FieldExpr::new("students", "score", AttrType::Float)),
            Expression::Value(ValueExpr::new(Value::float(threshold))),
        ))
    }

    #[test]
    fn test_scan_all_rows() {
        let (_db, table) = students_db();
        let mut scan = TableScanOperator::new(table, AccessMode::ReadOnly);
        scan.open(Arc::new(VacuousTxn::new())).unwrap();

        let mut count = 0;
        while scan.next().unwrap() {
            count += 1;
            scan.current_tuple().unwrap();
        }
        assert_eq!(count, 4);
        scan.close().unwrap();
    }

    #[test]
    fn test_scan_with_predicate() {
        let (_db, table) = students_db();
        let mut scan = TableScanOperator::new(table, AccessMode::ReadOnly)
            .with_predicates(vec![score_above(80.0)]);
        scan.open(Arc::new(VacuousTxn::new())).unwrap();

        let mut ids = Vec::new();
        while scan.next().unwrap() {
            ids.push(scan.current_record().unwrap().value_at(0).cloned().unwrap());
        }
        // NULL scores compare false, so only cho passes
        assert_eq!(ids, vec![Value::int(3)]);
        scan.close().unwrap();
    }

    #[test]
    fn test_current_tuple_without_row_is_an_error() {
        let (_db, table) = students_db();
        let scan = TableScanOperator::new(table, AccessMode::ReadOnly);
        assert!(scan.current_tuple().is_err());
    }
}
