//! Sort (order-by) operator.
//!
//! Fully materializing: `open` drains the child completely, evaluating
//! both the sort keys and the projected output expressions per row, then
//! sorts row indices once with a multi-key comparator. `next()` walks the
//! sorted indices and emits pre-materialized value lists.

use std::cmp::Ordering;
use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tracing::debug;

use crate::expr::{CellSpec, Expression, Tuple, ValueListTuple};
use crate::txn::Transaction;
use crate::value::Value;

use super::PhysicalOperator;

/// One sort key: ascending flag plus the key expression.
pub type OrderByItem = (bool, Expression);

/// Materializing multi-key sort over one child operator.
pub struct OrderByOperator {
    order_by: Vec<OrderByItem>,
    name_exprs: Vec<Expression>,
    child: Box<dyn PhysicalOperator>,
    answer: Vec<usize>,
    ans_values: Vec<Vec<Value>>,
    key_values: Vec<Vec<Value>>,
    now_index: usize,
    cur_tuple: ValueListTuple,
}

impl OrderByOperator {
    /// Creates a sort over `child`.
    ///
    /// Output cell names are derived here, once, by walking the
    /// projection expressions down to their field and aggregate leaves.
    pub fn new(
        order_by: Vec<OrderByItem>,
        query_expressions: &[Expression],
        child: Box<dyn PhysicalOperator>,
    ) -> Self {
        let mut names = Vec::new();
        let mut name_exprs = Vec::new();
        for expression in query_expressions {
            collect_output_cells(expression, &mut names, &mut name_exprs);
        }
        let mut cur_tuple = ValueListTuple::new();
        cur_tuple.set_specs(names);

        Self {
            order_by,
            name_exprs,
            child,
            answer: Vec::new(),
            ans_values: Vec::new(),
            key_values: Vec::new(),
            now_index: 0,
            cur_tuple,
        }
    }

    fn drain_child(&mut self) -> TernResult<()> {
        while self.child.next()? {
            let tuple = self.child.current_tuple()?;

            let mut keys = Vec::with_capacity(self.order_by.len());
            for (_, expression) in &self.order_by {
                keys.push(expression.value(tuple.as_ref())?);
            }
            self.key_values.push(keys);

            let mut row = Vec::with_capacity(self.name_exprs.len());
            for expression in &self.name_exprs {
                row.push(expression.value(tuple.as_ref())?);
            }
            self.ans_values.push(row);
            self.answer.push(self.ans_values.len() - 1);
        }
        Ok(())
    }

    fn work(&mut self) -> TernResult<()> {
        self.now_index = 0;
        self.answer.clear();
        self.key_values.clear();
        self.ans_values.clear();
        self.drain_child()?;
        debug!(rows = self.answer.len(), "materialized sort input");

        let keys = &self.key_values;
        let order_by = &self.order_by;
        self.answer.sort_by(|&a, &b| {
            for (i, (ascending, _)) in order_by.iter().enumerate() {
                match compare_keys(&keys[a][i], &keys[b][i], *ascending) {
                    Ordering::Equal => continue,
                    decided => return decided,
                }
            }
            // Stable fallback: original row order breaks remaining ties
            a.cmp(&b)
        });
        Ok(())
    }
}

/// Compares one sort key pair under its direction flag.
///
/// Both NULL ties to the next key; a single NULL sorts ahead of non-null
/// when ascending and behind it when descending.
fn compare_keys(a: &Value, b: &Value, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => {
            if ascending {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
        (false, true) => {
            if ascending {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (false, false) => {
            let raw = a.compare_raw(b);
            let decided = raw.cmp(&0);
            if ascending {
                decided
            } else {
                decided.reverse()
            }
        }
    }
}

/// Walks an expression tree to its field and aggregate leaves, recording
/// their output cell names and the leaf expressions to materialize.
fn collect_output_cells(
    expression: &Expression,
    names: &mut Vec<CellSpec>,
    name_exprs: &mut Vec<Expression>,
) {
    match expression {
        Expression::Field(field) => {
            names.push(CellSpec::new(field.table_name(), field.field_name()));
            name_exprs.push(expression.clone());
        }
        Expression::Aggregate(_) => {
            names.push(CellSpec::from_alias(expression.name()));
            name_exprs.push(expression.clone());
        }
        Expression::Value(_) => {}
        Expression::Cast(cast) => collect_output_cells(cast.child(), names, name_exprs),
        Expression::Comparison(cmp) => {
            collect_output_cells(cmp.left(), names, name_exprs);
            collect_output_cells(cmp.right(), names, name_exprs);
        }
        Expression::Conjunction(conj) => {
            for child in conj.children() {
                collect_output_cells(child, names, name_exprs);
            }
        }
        Expression::Arithmetic(arith) => {
            collect_output_cells(arith.left(), names, name_exprs);
            if let Some(right) = arith.right() {
                collect_output_cells(right, names, name_exprs);
            }
        }
        Expression::VectorDistance(dist) => {
            collect_output_cells(dist.left(), names, name_exprs);
            collect_output_cells(dist.right(), names, name_exprs);
        }
    }
}

impl PhysicalOperator for OrderByOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.child.open(txn)?;
        self.work()
    }

    fn next(&mut self) -> TernResult<bool> {
        if self.now_index < self.answer.len() {
            let row = self.ans_values[self.answer[self.now_index]].clone();
            self.cur_tuple.set_cells(row);
            self.now_index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        if self.now_index == 0 {
            return Err(TernError::internal("sort has no current row"));
        }
        Ok(Box::new(&self.cur_tuple))
    }

    fn close(&mut self) -> TernResult<()> {
        self.child.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::FieldExpr;
    use crate::operator::table_scan::TableScanOperator;
    use crate::operator::test_support::students_db;
    use crate::txn::{AccessMode, VacuousTxn};
    use crate::value::AttrType;

    fn field(name: &str, attr_type: AttrType) -> Expression {
        Expression::Field(FieldExpr::new("students", name, attr_type))
    }

    fn run_sort(order_by: Vec<OrderByItem>) -> Vec<Vec<Value>> {
        let (_db, table) = students_db();
        let scan = TableScanOperator::new(table, AccessMode::ReadOnly);
        let projections = vec![
            field("id", AttrType::Int),
            field("name", AttrType::Char),
            field("score", AttrType::Float),
        ];
        let mut sort = OrderByOperator::new(order_by, &projections, Box::new(scan));

        sort.open(Arc::new(VacuousTxn::new())).unwrap();
        let mut rows = Vec::new();
        while sort.next().unwrap() {
            let tuple = sort.current_tuple().unwrap();
            rows.push((0..tuple.cell_count()).map(|i| tuple.cell_at(i).unwrap()).collect());
        }
        sort.close().unwrap();
        rows
    }

    fn ids(rows: &[Vec<Value>]) -> Vec<i32> {
        rows.iter().map(|row| row[0].get_int()).collect()
    }

    #[test]
    fn test_ascending_sort_places_null_first() {
        let rows = run_sort(vec![(true, field("score", AttrType::Float))]);
        // bob's NULL leads, then 80, 80 (stable), then 95.5
        assert_eq!(ids(&rows), vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_descending_sort_places_null_last() {
        let rows = run_sort(vec![(false, field("score", AttrType::Float))]);
        assert_eq!(ids(&rows), vec![3, 1, 4, 2]);
    }

    #[test]
    fn test_tie_break_by_second_key() {
        let rows = run_sort(vec![
            (false, field("score", AttrType::Float)),
            (false, field("name", AttrType::Char)),
        ]);
        // 80-tie resolved descending by name: dee before ann
        assert_eq!(ids(&rows), vec![3, 4, 1, 2]);
    }

    #[test]
    fn test_stability_on_full_tie() {
        let rows = run_sort(vec![(true, field("name", AttrType::Char))]);
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);

        // Constant key: everything ties, input order must be preserved
        let rows = run_sort(vec![(
            true,
            Expression::Value(crate::expr::ValueExpr::new(Value::int(1))),
        )]);
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_output_cells_resolvable_by_name() {
        let (_db, table) = students_db();
        let scan = TableScanOperator::new(table, AccessMode::ReadOnly);
        let projections = vec![field("name", AttrType::Char)];
        let mut sort = OrderByOperator::new(
            vec![(true, field("id", AttrType::Int))],
            &projections,
            Box::new(scan),
        );
        sort.open(Arc::new(VacuousTxn::new())).unwrap();
        assert!(sort.next().unwrap());
        {
            let tuple = sort.current_tuple().unwrap();
            assert_eq!(
                tuple.find_cell(&CellSpec::new("students", "name")).unwrap(),
                Value::chars("ann")
            );
        }
        sort.close().unwrap();
    }

    #[test]
    fn test_name_derivation_recurses_into_compound_expressions() {
        let mut names = Vec::new();
        let mut exprs = Vec::new();
        let compound = Expression::Arithmetic(crate::expr::ArithmeticExpr::new(
            crate::expr::ArithmeticType::Add,
            field("id", AttrType::Int),
            field("score", AttrType::Float),
        ));
        collect_output_cells(&compound, &mut names, &mut exprs);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], CellSpec::new("students", "id"));
        assert_eq!(names[1], CellSpec::new("students", "score"));
    }
}
