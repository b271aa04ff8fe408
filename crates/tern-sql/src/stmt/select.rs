//! SELECT statement binding and assembly.

use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tracing::debug;

use crate::ast::{JoinGroupAst, SelectAst};
use crate::binder::{BinderContext, ExpressionBinder};
use crate::expr::Expression;
use crate::operator::{
    OrderByOperator, PhysicalOperator, PredicateOperator, ProjectOperator, TableScanOperator,
};
use crate::storage::Db;
use crate::txn::AccessMode;

use super::{bind_condition, JoinChain};

/// A bound SELECT statement.
#[derive(Debug)]
pub struct SelectStmt {
    join_chains: Vec<JoinChain>,
    query_expressions: Vec<Expression>,
    filter: Option<Expression>,
    group_by: Vec<Expression>,
    order_by: Vec<(bool, Expression)>,
    having: Option<Expression>,
}

impl SelectStmt {
    /// Resolves and binds a SELECT against the catalog.
    pub fn bind(db: &Db, ast: &SelectAst) -> TernResult<Self> {
        let mut context = BinderContext::new();

        // Resolve the FROM clause first so every later condition binds
        // against the registered tables.
        let mut join_chains = Vec::with_capacity(ast.relations.len());
        for group in &ast.relations {
            join_chains.push(Self::bind_join_group(db, &mut context, group)?);
        }

        let binder = ExpressionBinder::new(&context);
        let mut query_expressions = Vec::with_capacity(ast.expressions.len());
        for expression in &ast.expressions {
            query_expressions.push(binder.bind(expression)?);
        }

        let mut group_by = Vec::with_capacity(ast.group_by.len());
        for expression in &ast.group_by {
            group_by.push(binder.bind(expression)?);
        }

        let mut order_by = Vec::with_capacity(ast.order_by.len());
        for item in &ast.order_by {
            order_by.push((item.ascending, binder.bind(&item.expr)?));
        }

        let filter = bind_condition(&context, ast.condition.as_ref())?;
        let having = bind_condition(&context, ast.having.as_ref())?;
        debug!(
            chains = join_chains.len(),
            projections = query_expressions.len(),
            "bound select statement"
        );

        Ok(Self {
            join_chains,
            query_expressions,
            filter,
            group_by,
            order_by,
            having,
        })
    }

    /// Binds one FROM-clause relation group into a join chain.
    ///
    /// The first relation carries no condition; each subsequent relation
    /// pairs with the condition between it and its predecessor, bound
    /// against the tables registered so far.
    fn bind_join_group(
        db: &Db,
        context: &mut BinderContext,
        group: &JoinGroupAst,
    ) -> TernResult<JoinChain> {
        let mut chain = JoinChain::new();
        for (position, relation) in group.relations.iter().enumerate() {
            let table = db.find_table(relation)?;
            context.add_table(Arc::clone(&table));

            let condition = if position == 0 {
                None
            } else {
                group.conditions.get(position - 1)
            };
            let filter = bind_condition(context, condition)?;
            chain.add_link(table, filter);
        }
        Ok(chain)
    }

    /// The bound join chains, one per FROM-clause relation group.
    pub fn join_chains(&self) -> &[JoinChain] {
        &self.join_chains
    }

    /// The bound projection expressions.
    pub fn query_expressions(&self) -> &[Expression] {
        &self.query_expressions
    }

    /// The bound WHERE condition.
    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// The bound GROUP BY expressions.
    pub fn group_by(&self) -> &[Expression] {
        &self.group_by
    }

    /// The bound ORDER BY items with their direction flags.
    pub fn order_by(&self) -> &[(bool, Expression)] {
        &self.order_by
    }

    /// The bound HAVING condition.
    pub fn having(&self) -> Option<&Expression> {
        self.having.as_ref()
    }

    /// Wires the single-table read pipeline:
    /// scan → filter → sort-or-project.
    pub fn build_operator(&self) -> TernResult<Box<dyn PhysicalOperator>> {
        let [chain] = self.join_chains.as_slice() else {
            return Err(TernError::not_supported(
                "multi-group FROM clause execution",
            ));
        };
        let [link] = chain.links() else {
            return Err(TernError::not_supported("join execution"));
        };

        let mut pipeline: Box<dyn PhysicalOperator> = Box::new(TableScanOperator::new(
            Arc::clone(link.table()),
            AccessMode::ReadOnly,
        ));
        if let Some(filter) = &self.filter {
            pipeline = Box::new(PredicateOperator::new(filter.clone(), pipeline));
        }
        if self.order_by.is_empty() {
            pipeline = Box::new(ProjectOperator::new(
                self.query_expressions.clone(),
                pipeline,
            ));
        } else {
            pipeline = Box::new(OrderByOperator::new(
                self.order_by.clone(),
                &self.query_expressions,
                pipeline,
            ));
        }
        Ok(pipeline)
    }
}
