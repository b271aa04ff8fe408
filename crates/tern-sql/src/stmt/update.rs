//! UPDATE statement binding and assembly.

use std::sync::Arc;

use tern_common::TernResult;

use crate::ast::UpdateAst;
use crate::binder::BinderContext;
use crate::expr::Expression;
use crate::operator::{PhysicalOperator, TableScanOperator, UpdateOperator};
use crate::storage::{Db, FieldMeta, Table};
use crate::txn::AccessMode;
use crate::value::Value;

use super::bind_condition;

/// A bound UPDATE statement.
#[derive(Debug)]
pub struct UpdateStmt {
    table: Arc<Table>,
    fields: Vec<FieldMeta>,
    values: Vec<Value>,
    filter: Option<Expression>,
}

impl UpdateStmt {
    /// Resolves and binds an UPDATE against the catalog.
    ///
    /// Each target column is resolved against the table schema and
    /// paired with its replacement value, in column order.
    pub fn bind(db: &Db, ast: &UpdateAst) -> TernResult<Self> {
        let table = db.find_table(&ast.table)?;

        let mut fields = Vec::with_capacity(ast.assignments.len());
        let mut values = Vec::with_capacity(ast.assignments.len());
        for (column, value) in &ast.assignments {
            fields.push(table.field(column)?.clone());
            values.push(value.clone());
        }

        let mut context = BinderContext::new();
        context.add_table(Arc::clone(&table));
        let filter = bind_condition(&context, ast.condition.as_ref())?;

        Ok(Self {
            table,
            fields,
            values,
            filter,
        })
    }

    /// The target table.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// The resolved target columns.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// The replacement values, in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The bound WHERE condition.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// Wires the update pipeline: write-intent scan feeding the update
    /// operator.
    pub fn build_operator(&self) -> Box<dyn PhysicalOperator> {
        let predicates = self.filter.iter().cloned().collect();
        let scan = TableScanOperator::new(Arc::clone(&self.table), AccessMode::ReadWrite)
            .with_predicates(predicates);
        Box::new(UpdateOperator::new(
            Arc::clone(&self.table),
            self.fields.clone(),
            self.values.clone(),
            Box::new(scan),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SqlExpr;
    use crate::expr::ComparisonOp;
    use crate::operator::test_support::students_db;
    use crate::txn::VacuousTxn;

    #[test]
    fn test_bind_unknown_column() {
        let (db, _table) = students_db();
        let ast = UpdateAst {
            table: "students".to_string(),
            assignments: vec![("missing".to_string(), Value::int(1))],
            condition: None,
        };
        let err = UpdateStmt::bind(&db, &ast).unwrap_err();
        assert_eq!(err.code(), tern_common::ErrorCode::ColumnNotFound);
    }

    #[test]
    fn test_bind_pairs_columns_in_order() {
        let (db, _table) = students_db();
        let ast = UpdateAst {
            table: "students".to_string(),
            assignments: vec![
                ("score".to_string(), Value::int(42)),
                ("name".to_string(), Value::chars("zed")),
            ],
            condition: None,
        };
        let stmt = UpdateStmt::bind(&db, &ast).unwrap();
        assert_eq!(stmt.fields()[0].name(), "score");
        assert_eq!(stmt.fields()[1].name(), "name");
        assert_eq!(stmt.values()[1], Value::chars("zed"));
    }

    #[test]
    fn test_end_to_end_update() {
        let (db, table) = students_db();
        let ast = UpdateAst {
            table: "students".to_string(),
            assignments: vec![("score".to_string(), Value::int(70))],
            condition: Some(SqlExpr::comparison(
                ComparisonOp::Equal,
                SqlExpr::field("name"),
                SqlExpr::literal(Value::chars("ann")),
            )),
        };
        let stmt = UpdateStmt::bind(&db, &ast).unwrap();
        let mut operator = stmt.build_operator();
        operator.open(Arc::new(VacuousTxn::new())).unwrap();
        operator.close().unwrap();

        let handler = table.record_handler();
        let scores: Vec<Value> = handler
            .row_ids()
            .into_iter()
            .map(|rid| handler.get_record(rid).unwrap())
            .filter(|r| r.value_at(1) == Some(&Value::chars("ann")))
            .map(|r| r.value_at(2).cloned().unwrap())
            .collect();
        // The INT literal was coerced to the FLOAT column type
        assert_eq!(scores, vec![Value::Float(70.0)]);
    }
}
