//! Projection operator.

use std::sync::Arc;

use tern_common::TernResult;

use crate::expr::{Expression, ExpressionTuple, Tuple};
use crate::txn::Transaction;

use super::PhysicalOperator;

/// Exposes child rows through bound projection expressions.
pub struct ProjectOperator {
    expressions: Vec<Expression>,
    child: Box<dyn PhysicalOperator>,
}

impl ProjectOperator {
    /// Creates a projection over `child`.
    pub fn new(expressions: Vec<Expression>, child: Box<dyn PhysicalOperator>) -> Self {
        Self { expressions, child }
    }
}

impl PhysicalOperator for ProjectOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.child.open(txn)
    }

    fn next(&mut self) -> TernResult<bool> {
        self.child.next()
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        let inner = self.child.current_tuple()?;
        Ok(Box::new(
            ExpressionTuple::new(&self.expressions).with_inner(inner),
        ))
    }

    fn close(&mut self) -> TernResult<()> {
        self.child.close()
    }
}
