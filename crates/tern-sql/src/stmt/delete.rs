//! DELETE statement binding and assembly.

use std::sync::Arc;

use tern_common::TernResult;
use tracing::debug;

use crate::ast::DeleteAst;
use crate::binder::BinderContext;
use crate::expr::Expression;
use crate::operator::{DeleteOperator, PhysicalOperator, TableScanOperator};
use crate::storage::{Db, Table};
use crate::txn::AccessMode;

use super::bind_condition;

/// A bound DELETE statement.
#[derive(Debug)]
pub struct DeleteStmt {
    table: Arc<Table>,
    filter: Option<Expression>,
}

impl DeleteStmt {
    /// Resolves and binds a DELETE against the catalog.
    pub fn bind(db: &Db, ast: &DeleteAst) -> TernResult<Self> {
        let table = db.find_table(&ast.table)?;

        let mut context = BinderContext::new();
        context.add_table(Arc::clone(&table));
        let filter = bind_condition(&context, ast.condition.as_ref())?;
        if filter.is_none() {
            debug!(table = %ast.table, "delete without condition");
        }

        Ok(Self { table, filter })
    }

    /// The target table.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// The bound WHERE condition.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// Wires the delete pipeline: write-intent scan feeding the delete
    /// operator.
    pub fn build_operator(&self) -> Box<dyn PhysicalOperator> {
        let predicates = self.filter.iter().cloned().collect();
        let scan = TableScanOperator::new(Arc::clone(&self.table), AccessMode::ReadWrite)
            .with_predicates(predicates);
        Box::new(DeleteOperator::new(
            Arc::clone(&self.table),
            Box::new(scan),
        ))
    }
}
