//! Index-scan operator.
//!
//! Narrows candidate rows through an index range cursor, applies
//! residual predicates, and reconciles every surviving row with the
//! transaction's visibility rules.

use std::sync::Arc;

use tern_common::{ErrorCode, TernError, TernResult};
use tracing::{trace, warn};

use crate::expr::{Expression, RowTuple, Tuple};
use crate::storage::{Index, IndexScanner, Record, Table};
use crate::txn::{AccessMode, Transaction};
use crate::value::{check_date_encoded, type_ops, AttrType, Value};

use super::{evaluate_predicates, PhysicalOperator};

/// Range scan over one index of one table.
pub struct IndexScanOperator {
    table: Arc<Table>,
    index: Arc<dyn Index>,
    mode: AccessMode,
    left_value: Option<Value>,
    left_inclusive: bool,
    right_value: Option<Value>,
    right_inclusive: bool,
    predicates: Vec<Expression>,
    txn: Option<Arc<dyn Transaction>>,
    scanner: Option<Box<dyn IndexScanner>>,
    current: Option<Record>,
}

impl IndexScanOperator {
    /// Creates an index scan with no bounds.
    pub fn new(table: Arc<Table>, index: Arc<dyn Index>, mode: AccessMode) -> Self {
        Self {
            table,
            index,
            mode,
            left_value: None,
            left_inclusive: false,
            right_value: None,
            right_inclusive: false,
            predicates: Vec::new(),
            txn: None,
            scanner: None,
            current: None,
        }
    }

    /// Sets the range bounds and their inclusivity.
    pub fn with_bounds(
        mut self,
        left_value: Option<Value>,
        left_inclusive: bool,
        right_value: Option<Value>,
        right_inclusive: bool,
    ) -> Self {
        self.left_value = left_value;
        self.left_inclusive = left_inclusive;
        self.right_value = right_value;
        self.right_inclusive = right_inclusive;
        self
    }

    /// Attaches residual predicates evaluated against every fetched row.
    pub fn with_predicates(mut self, predicates: Vec<Expression>) -> Self {
        self.predicates = predicates;
        self
    }

    /// Rejects DATE-typed bounds that are not calendar-valid.
    fn check_valid(&self) -> TernResult<()> {
        for bound in [&self.left_value, &self.right_value].into_iter().flatten() {
            if bound.attr_type() == AttrType::Date && !check_date_encoded(bound.get_int()) {
                warn!("invalid date bound: {}", bound.get_int());
                return Err(TernError::invalid_argument(format!(
                    "invalid date bound: {}",
                    bound.get_int()
                )));
            }
        }
        Ok(())
    }

    /// Coerces CHAR bounds to DATE when the indexed column is DATE-typed.
    fn coerce_bounds(&mut self) -> TernResult<()> {
        let Some(first_field) = self.index.meta().fields().first() else {
            return Ok(());
        };
        if self.table.field(first_field)?.attr_type() != AttrType::Date {
            return Ok(());
        }
        for bound in [&mut self.left_value, &mut self.right_value] {
            if let Some(value) = bound {
                if value.attr_type() == AttrType::Char {
                    *value = type_ops(AttrType::Char).cast_to(value, AttrType::Date)?;
                }
            }
        }
        Ok(())
    }
}

impl PhysicalOperator for IndexScanOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.check_valid()?;
        self.coerce_bounds()?;

        let scanner = self.index.create_scanner(
            self.left_value.as_ref(),
            self.left_inclusive,
            self.right_value.as_ref(),
            self.right_inclusive,
        )?;
        self.scanner = Some(scanner);
        self.current = None;
        self.txn = Some(txn);
        Ok(())
    }

    fn next(&mut self) -> TernResult<bool> {
        debug_assert!(self.scanner.is_some(), "next() on a closed operator");
        let txn = self
            .txn
            .clone()
            .ok_or_else(|| TernError::internal("index scan is not open"))?;
        let handler = self.table.record_handler();

        loop {
            let scanner = self
                .scanner
                .as_mut()
                .ok_or_else(|| TernError::internal("index scan is not open"))?;
            let Some(rid) = scanner.next_entry()? else {
                // End-of-range is the only clean exhaustion signal
                self.current = None;
                return Ok(false);
            };

            let record = handler.get_record(rid)?;
            trace!(rid = %rid, "got a record");

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
                    // Not an end-of-scan signal; keep scanning
                    trace!(rid = %rid, "record invisible");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        let record = self
            .current
            .as_ref()
            .ok_or_else(|| TernError::internal("index scan has no current row"))?;
        Ok(Box::new(RowTuple::new(
            self.table.name(),
            self.table.schema(),
            record,
        )))
    }

    fn current_record(&self) -> TernResult<Record> {
        self.current
            .clone()
            .ok_or_else(|| TernError::internal("index scan has no current row"))
    }

    fn close(&mut self) -> TernResult<()> {
        // Dropping the cursor releases it, on every exit path
        self.scanner = None;
        self.txn = None;
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ComparisonExpr, ComparisonOp, FieldExpr, ValueExpr};
    use crate::operator::test_support::students_db;
    use crate::storage::IndexMeta;
    use crate::txn::VacuousTxn;
    use crate::value::AttrType;

    use parking_lot::Mutex;

    fn scored_index(table: &Arc<Table>) -> Arc<dyn Index> {
        table
            .create_index(IndexMeta::new("idx_score", vec!["score".to_string()], false).unwrap())
            .unwrap()
    }

    fn name_not(name: &str) -> Expression {
        Expression::Comparison(ComparisonExpr::new(
            ComparisonOp::NotEqual,
            Expression::Field(FieldExpr::new("students", "name", AttrType::Char)),
            Expression::Value(ValueExpr::new(Value::chars(name))),
        ))
    }

    /// Transaction stub that hides chosen rows and records which rows
    /// reached the visibility check.
    struct SelectiveTxn {
        invisible: Vec<i32>,
        visited: Mutex<Vec<i32>>,
    }

    impl SelectiveTxn {
        fn hiding(invisible: Vec<i32>) -> Self {
            Self {
                invisible,
                visited: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transaction for SelectiveTxn {
        fn visit_record(
            &self,
            _table: &Table,
            record: &Record,
            _mode: AccessMode,
        ) -> TernResult<()> {
            let id = record.value_at(0).unwrap().get_int();
            self.visited.lock().push(id);
            if self.invisible.contains(&id) {
                return Err(TernError::RecordInvisible);
            }
            Ok(())
        }

        fn delete_record(&self, _table: &Table, _record: &Record) -> TernResult<()> {
            unimplemented!("read-only stub")
        }

        fn insert_record(&self, _table: &Table, _record: Record) -> TernResult<()> {
            unimplemented!("read-only stub")
        }
    }

    fn collect_ids(scan: &mut IndexScanOperator) -> Vec<i32> {
        let mut ids = Vec::new();
        while scan.next().unwrap() {
            ids.push(scan.current_record().unwrap().value_at(0).unwrap().get_int());
        }
        ids
    }

    #[test]
    fn test_range_scan() {
        let (_db, table) = students_db();
        let index = scored_index(&table);
        let mut scan = IndexScanOperator::new(table, index, AccessMode::ReadOnly).with_bounds(
            Some(Value::float(80.0)),
            true,
            None,
            false,
        );
        scan.open(Arc::new(VacuousTxn::new())).unwrap();
        // ann (80), dee (80), cho (95.5); bob's NULL never matches a range
        assert_eq!(collect_ids(&mut scan), vec![1, 4, 3]);
        scan.close().unwrap();
    }

    #[test]
    fn test_residual_predicates_run_before_visibility() {
        let (_db, table) = students_db();
        let index = scored_index(&table);
        let txn = Arc::new(SelectiveTxn::hiding(vec![]));
        let mut scan = IndexScanOperator::new(table, index, AccessMode::ReadOnly)
            .with_bounds(Some(Value::float(80.0)), true, None, false)
            .with_predicates(vec![name_not("dee")]);
        scan.open(txn.clone()).unwrap();
        assert_eq!(collect_ids(&mut scan), vec![1, 3]);
        // dee failed the residual predicate and never reached the
        // visibility check
        assert_eq!(*txn.visited.lock(), vec![1, 3]);
        scan.close().unwrap();
    }

    #[test]
    fn test_invisible_rows_are_skipped_without_error() {
        let (_db, table) = students_db();
        let index = scored_index(&table);
        let txn = Arc::new(SelectiveTxn::hiding(vec![4]));
        let mut scan = IndexScanOperator::new(table, index, AccessMode::ReadOnly).with_bounds(
            Some(Value::float(80.0)),
            true,
            None,
            false,
        );
        scan.open(txn).unwrap();
        assert_eq!(collect_ids(&mut scan), vec![1, 3]);
        scan.close().unwrap();
    }

    #[test]
    fn test_invalid_date_bound_fails_fast() {
        let (_db, table) = students_db();
        let index = scored_index(&table);
        let mut scan = IndexScanOperator::new(table, index, AccessMode::ReadOnly).with_bounds(
            Some(Value::Date(20240230)),
            true,
            None,
            false,
        );
        let err = scan.open(Arc::new(VacuousTxn::new())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_char_bounds_coerce_on_date_index() {
        let db = crate::storage::Db::new("test");
        let table = db
            .create_table(
                "events",
                crate::storage::TableSchema::new(vec![
                    crate::storage::FieldMeta::new("id", AttrType::Int),
                    crate::storage::FieldMeta::new("day", AttrType::Date),
                ]),
            )
            .unwrap();
        for (id, day) in [(1, 20240105), (2, 20240301), (3, 20241231)] {
            table.insert_row(vec![Value::int(id), Value::Date(day)]).unwrap();
        }
        let index = table
            .create_index(IndexMeta::new("idx_day", vec!["day".to_string()], false).unwrap())
            .unwrap();

        let mut scan = IndexScanOperator::new(table, index, AccessMode::ReadOnly).with_bounds(
            Some(Value::chars("2024-3-1")),
            true,
            None,
            false,
        );
        scan.open(Arc::new(VacuousTxn::new())).unwrap();
        assert_eq!(collect_ids(&mut scan), vec![2, 3]);
        scan.close().unwrap();

        // A malformed CHAR bound fails the coercion at open
        let index = scan.index.clone();
        let mut scan = IndexScanOperator::new(scan.table.clone(), index, AccessMode::ReadOnly)
            .with_bounds(Some(Value::chars("2024-2-30")), true, None, false);
        let err = scan.open(Arc::new(VacuousTxn::new())).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }
}
