//! Streaming filter operator.

use std::sync::Arc;

use tern_common::TernResult;

use crate::expr::{Expression, Tuple};
use crate::storage::Record;
use crate::txn::Transaction;

use super::PhysicalOperator;

/// Passes through child rows for which the predicate holds.
pub struct PredicateOperator {
    expression: Expression,
    child: Box<dyn PhysicalOperator>,
}

impl PredicateOperator {
    /// Creates a filter over `child`.
    pub fn new(expression: Expression, child: Box<dyn PhysicalOperator>) -> Self {
        Self { expression, child }
    }
}

impl PhysicalOperator for PredicateOperator {
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()> {
        self.child.open(txn)
    }

    fn next(&mut self) -> TernResult<bool> {
        while self.child.next()? {
            let matched = {
                let tuple = self.child.current_tuple()?;
                self.expression.value(tuple.as_ref())?.get_boolean()
            };
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>> {
        self.child.current_tuple()
    }

    fn current_record(&self) -> TernResult<Record> {
        self.child.current_record()
    }

    fn close(&mut self) -> TernResult<()> {
        self.child.close()
    }
}
