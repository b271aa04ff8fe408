//! Statement assembly.
//!
//! Per-statement-kind binding: resolve tables against the catalog,
//! register them so field references inside conditions resolve
//! unambiguously, bind the raw condition trees, and wire the physical
//! operators a statement needs from storage.

mod delete;
mod select;
mod update;

use std::sync::Arc;

use tern_common::TernResult;

use crate::ast::SqlExpr;
use crate::binder::{BinderContext, ExpressionBinder};
use crate::expr::Expression;
use crate::storage::Table;

pub use delete::DeleteStmt;
pub use select::SelectStmt;
pub use update::UpdateStmt;

/// One position in a join chain: a table plus its per-table filter.
#[derive(Debug)]
pub struct JoinLink {
    table: Arc<Table>,
    filter: Option<Expression>,
}

impl JoinLink {
    /// The table at this position.
    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    /// The join condition attached to this position, absent for the
    /// first relation of a chain.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }
}

/// One FROM-clause relation group, resolved and bound.
///
/// Built once during binding and consumed by downstream join operators.
#[derive(Debug, Default)]
pub struct JoinChain {
    links: Vec<JoinLink>,
}

impl JoinChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table with its bound filter.
    pub fn add_link(&mut self, table: Arc<Table>, filter: Option<Expression>) {
        self.links.push(JoinLink { table, filter });
    }

    /// The chain's links, in join order.
    pub fn links(&self) -> &[JoinLink] {
        &self.links
    }
}

/// Binds an optional condition to at most one expression node.
///
/// A missing condition binds to "no condition" rather than failing.
pub(crate) fn bind_condition(
    context: &BinderContext,
    condition: Option<&SqlExpr>,
) -> TernResult<Option<Expression>> {
    match condition {
        None => Ok(None),
        Some(condition) => {
            let binder = ExpressionBinder::new(context);
            Ok(Some(binder.bind(condition)?))
        }
    }
}
