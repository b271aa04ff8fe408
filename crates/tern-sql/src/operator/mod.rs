//! Pull-based physical operators.
//!
//! Every operator follows the same lifecycle:
//! **Closed → Open → (Open, Exhausted) → Closed**, driven by
//! [`PhysicalOperator::open`], repeated [`PhysicalOperator::next`] calls,
//! and [`PhysicalOperator::close`]. `next()` runs to completion before
//! returning; there is no suspension and no parallelism within one
//! operator tree. Calling `next()` or `current_tuple()` outside the Open
//! state is a programming error.

mod delete;
mod index_scan;
mod order_by;
mod predicate;
mod project;
mod table_scan;
mod update;

use std::sync::Arc;

use tern_common::{TernError, TernResult};

use crate::expr::{Expression, Tuple};
use crate::storage::Record;
use crate::txn::Transaction;

pub use delete::DeleteOperator;
pub use index_scan::IndexScanOperator;
pub use order_by::{OrderByItem, OrderByOperator};
pub use predicate::PredicateOperator;
pub use project::ProjectOperator;
pub use table_scan::TableScanOperator;
pub use update::UpdateOperator;

/// A pull-based physical operator.
pub trait PhysicalOperator {
    /// Opens the operator, acquiring scan resources and (for blocking
    /// operators) draining children.
    fn open(&mut self, txn: Arc<dyn Transaction>) -> TernResult<()>;

    /// Advances to the next row. `Ok(true)` means a row is available
    /// through `current_tuple()`; `Ok(false)` means clean exhaustion.
    fn next(&mut self) -> TernResult<bool>;

    /// The current row, valid only after `next()` returned `Ok(true)`.
    fn current_tuple(&self) -> TernResult<Box<dyn Tuple + '_>>;

    /// The current row as a detached storage record.
    ///
    /// Only operators positioned on table records provide this; mutation
    /// operators use it to collect their target rows.
    fn current_record(&self) -> TernResult<Record> {
        Err(TernError::internal(
            "operator does not expose storage records",
        ))
    }

    /// Closes the operator, releasing any held scan or cursor resources
    /// on every exit path.
    fn close(&mut self) -> TernResult<()>;
}

/// Evaluates residual predicates against a tuple, short-circuiting to
/// "not matched" on the first false predicate. Evaluation errors are hard
/// failures.
pub(crate) fn evaluate_predicates(
    predicates: &[Expression],
    tuple: &dyn Tuple,
) -> TernResult<bool> {
    for predicate in predicates {
        if !predicate.value(tuple)?.get_boolean() {
            return Ok(false);
        }
    }
    Ok(true)
}
