//! The expression binder.
//!
//! Turns loosely-typed [`SqlExpr`] trees into bound, table/column-resolved
//! [`Expression`] trees, once per statement. Field references resolve
//! against the tables registered in a [`BinderContext`]; comparisons get
//! an implicit cast on the cheaper-to-convert side when the operand types
//! differ and a conversion exists.

use std::collections::HashMap;
use std::sync::Arc;

use tern_common::{TernError, TernResult};
use tracing::debug;

use crate::ast::SqlExpr;
use crate::expr::{
    AggregateExpr, ArithmeticExpr, ArithmeticType, CastExpr, ComparisonExpr, ConjunctionExpr,
    Expression, FieldExpr, ValueExpr, VectorDistanceExpr,
};
use crate::storage::Table;
use crate::value::{cast_cost, AttrType};

/// The tables visible to field resolution, in registration order.
#[derive(Default)]
pub struct BinderContext {
    tables: Vec<Arc<Table>>,
    table_map: HashMap<String, Arc<Table>>,
}

impl BinderContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resolved table.
    pub fn add_table(&mut self, table: Arc<Table>) {
        self.table_map
            .insert(table.name().to_string(), Arc::clone(&table));
        self.tables.push(table);
    }

    /// Looks up a registered table by name.
    pub fn find_table(&self, name: &str) -> Option<Arc<Table>> {
        self.table_map.get(name).cloned()
    }

    /// The registered tables.
    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    /// The table unqualified fields resolve against, when unambiguous.
    pub fn default_table(&self) -> Option<&Arc<Table>> {
        if self.tables.len() == 1 {
            self.tables.first()
        } else {
            None
        }
    }
}

/// Binds unbound expression trees against a context.
pub struct ExpressionBinder<'a> {
    context: &'a BinderContext,
}

impl<'a> ExpressionBinder<'a> {
    /// Creates a binder over a context.
    pub fn new(context: &'a BinderContext) -> Self {
        Self { context }
    }

    /// Binds one expression tree.
    pub fn bind(&self, expr: &SqlExpr) -> TernResult<Expression> {
        match expr {
            SqlExpr::Field { table, name } => self.bind_field(table.as_deref(), name),
            SqlExpr::Literal(value) => Ok(Expression::Value(ValueExpr::new(value.clone()))),
            SqlExpr::Cast { child, target } => Ok(Expression::Cast(CastExpr::new(
                self.bind(child)?,
                *target,
            ))),
            SqlExpr::Negative(child) => Ok(Expression::Arithmetic(ArithmeticExpr::negative(
                self.bind(child)?,
            ))),
            SqlExpr::Arithmetic { op, left, right } => {
                if *op == ArithmeticType::Negative {
                    return Err(TernError::internal(
                        "negation must use the unary node, not binary arithmetic",
                    ));
                }
                Ok(Expression::Arithmetic(ArithmeticExpr::new(
                    *op,
                    self.bind(left)?,
                    self.bind(right)?,
                )))
            }
            SqlExpr::Comparison { op, left, right } => {
                let left = self.bind(left)?;
                let right = self.bind(right)?;
                let (left, right) = insert_implicit_cast(left, right);
                Ok(Expression::Comparison(ComparisonExpr::new(*op, left, right)))
            }
            SqlExpr::Conjunction { op, children } => {
                let bound: TernResult<Vec<Expression>> =
                    children.iter().map(|child| self.bind(child)).collect();
                Ok(Expression::Conjunction(ConjunctionExpr::new(*op, bound?)))
            }
            SqlExpr::Aggregate { func, child } => Ok(Expression::Aggregate(AggregateExpr::new(
                *func,
                self.bind(child)?,
            ))),
            SqlExpr::VectorDistance { kind, left, right } => {
                Ok(Expression::VectorDistance(VectorDistanceExpr::new(
                    *kind,
                    self.bind(left)?,
                    self.bind(right)?,
                )))
            }
        }
    }

    fn bind_field(&self, table: Option<&str>, name: &str) -> TernResult<Expression> {
        if let Some(table_name) = table {
            let table = self
                .context
                .find_table(table_name)
                .ok_or_else(|| TernError::TableNotFound {
                    table: table_name.to_string(),
                })?;
            let field = table.field(name)?;
            return Ok(Expression::Field(FieldExpr::new(
                table.name(),
                field.name(),
                field.attr_type(),
            )));
        }

        if let Some(table) = self.context.default_table() {
            let field = table.field(name)?;
            return Ok(Expression::Field(FieldExpr::new(
                table.name(),
                field.name(),
                field.attr_type(),
            )));
        }

        let mut owners = self
            .context
            .tables()
            .iter()
            .filter(|table| table.schema().field(name).is_some());
        let first = owners.next();
        if owners.next().is_some() {
            return Err(TernError::invalid_argument(format!(
                "ambiguous field reference '{}'",
                name
            )));
        }
        let table = first.ok_or_else(|| {
            debug!(field = name, "field not found in any registered table");
            TernError::ColumnNotFound {
                column: name.to_string(),
                table: String::new(),
            }
        })?;
        let field = table.field(name)?;
        Ok(Expression::Field(FieldExpr::new(
            table.name(),
            field.name(),
            field.attr_type(),
        )))
    }
}

/// Wraps one comparison operand in a cast when the operand types differ
/// and a conversion exists, preferring the cheaper direction.
fn insert_implicit_cast(left: Expression, right: Expression) -> (Expression, Expression) {
    let left_type = left.value_type();
    let right_type = right.value_type();
    if left_type == right_type
        || matches!(left_type, AttrType::Undefined | AttrType::Null)
        || matches!(right_type, AttrType::Undefined | AttrType::Null)
    {
        return (left, right);
    }
    match (cast_cost(left_type, right_type), cast_cost(right_type, left_type)) {
        (Some(to_right), Some(to_left)) if to_left < to_right => {
            (left, Expression::Cast(CastExpr::new(right, left_type)))
        }
        (Some(_), _) => (Expression::Cast(CastExpr::new(left, right_type)), right),
        (None, Some(_)) => (left, Expression::Cast(CastExpr::new(right, left_type))),
        // No conversion either way; the runtime comparison matrix decides
        (None, None) => (left, right),
    }
}
