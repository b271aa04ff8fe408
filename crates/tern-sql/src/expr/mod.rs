//! Bound expression trees.
//!
//! An expression tree is built once at bind time and is immutable
//! afterwards, so it can be evaluated repeatedly and concurrently by
//! operator instances that share no mutable node state. Evaluation pulls
//! cell values from a [`Tuple`] and routes all comparisons, casts, and
//! arithmetic through the typed-value dispatch.

mod tuple;

use tern_common::{TernError, TernResult};

use crate::value::{
    self, vector_op, ArithmeticOp, AttrType, Value, VectorOpKind,
};

pub use tuple::{CellSpec, ExpressionTuple, RowTuple, Tuple, ValueListTuple};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `=`
    Equal,
    /// `<>`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
}

impl ComparisonOp {
    /// The operator's SQL symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            ComparisonOp::Equal => "=",
            ComparisonOp::NotEqual => "<>",
            ComparisonOp::Less => "<",
            ComparisonOp::LessEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterEqual => ">=",
        }
    }

    fn evaluate(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        matches!(
            (self, ordering),
            (ComparisonOp::Equal, Equal)
                | (ComparisonOp::NotEqual, Less | Greater)
                | (ComparisonOp::Less, Less)
                | (ComparisonOp::LessEqual, Less | Equal)
                | (ComparisonOp::Greater, Greater)
                | (ComparisonOp::GreaterEqual, Greater | Equal)
        )
    }
}

/// Arithmetic node operators, including unary negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticType {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Unary sign negation.
    Negative,
}

/// Conjunction kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjunctionType {
    /// All children must hold.
    And,
    /// At least one child must hold.
    Or,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    /// Row count.
    Count,
    /// Sum of values.
    Sum,
    /// Arithmetic mean.
    Avg,
    /// Minimum value.
    Min,
    /// Maximum value.
    Max,
}

impl AggregateFunc {
    /// The function name used in expression names.
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
        }
    }
}

/// A reference to a resolved table column.
#[derive(Debug, Clone)]
pub struct FieldExpr {
    table_name: String,
    field_name: String,
    attr_type: AttrType,
}

impl FieldExpr {
    /// Creates a field reference.
    pub fn new(
        table_name: impl Into<String>,
        field_name: impl Into<String>,
        attr_type: AttrType,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            field_name: field_name.into(),
            attr_type,
        }
    }

    /// The resolved table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The column name.
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// The column's declared type.
    pub fn attr_type(&self) -> AttrType {
        self.attr_type
    }

    /// The spec this field resolves through.
    pub fn spec(&self) -> CellSpec {
        CellSpec::new(self.table_name.clone(), self.field_name.clone())
    }
}

/// A literal value.
#[derive(Debug, Clone)]
pub struct ValueExpr {
    value: Value,
}

impl ValueExpr {
    /// Creates a literal node.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The literal value.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A cast of a child expression to a target type.
#[derive(Debug, Clone)]
pub struct CastExpr {
    child: Box<Expression>,
    target: AttrType,
}

impl CastExpr {
    /// Creates a cast node.
    pub fn new(child: Expression, target: AttrType) -> Self {
        Self {
            child: Box::new(child),
            target,
        }
    }

    /// The casted child.
    pub fn child(&self) -> &Expression {
        &self.child
    }

    /// The cast target type.
    pub fn target(&self) -> AttrType {
        self.target
    }
}

/// A binary comparison.
#[derive(Debug, Clone)]
pub struct ComparisonExpr {
    op: ComparisonOp,
    left: Box<Expression>,
    right: Box<Expression>,
}

impl ComparisonExpr {
    /// Creates a comparison node.
    pub fn new(op: ComparisonOp, left: Expression, right: Expression) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The comparison operator.
    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    /// The left operand.
    pub fn left(&self) -> &Expression {
        &self.left
    }

    /// The right operand.
    pub fn right(&self) -> &Expression {
        &self.right
    }

    fn compare_values(&self, left: &Value, right: &Value) -> TernResult<Value> {
        // A NULL operand makes every comparison false
        if left.is_null() || right.is_null() {
            return Ok(Value::boolean(false));
        }
        let ordering = left.compare(right)?;
        Ok(Value::boolean(self.op.evaluate(ordering)))
    }
}

/// A conjunction or disjunction over any number of children.
#[derive(Debug, Clone)]
pub struct ConjunctionExpr {
    conjunction_type: ConjunctionType,
    children: Vec<Expression>,
}

impl ConjunctionExpr {
    /// Creates a conjunction node.
    pub fn new(conjunction_type: ConjunctionType, children: Vec<Expression>) -> Self {
        Self {
            conjunction_type,
            children,
        }
    }

    /// The conjunction kind.
    pub fn conjunction_type(&self) -> ConjunctionType {
        self.conjunction_type
    }

    /// The child expressions.
    pub fn children(&self) -> &[Expression] {
        &self.children
    }
}

/// An arithmetic operation, binary or unary negation.
#[derive(Debug, Clone)]
pub struct ArithmeticExpr {
    arithmetic_type: ArithmeticType,
    left: Box<Expression>,
    right: Option<Box<Expression>>,
}

impl ArithmeticExpr {
    /// Creates a binary arithmetic node.
    pub fn new(arithmetic_type: ArithmeticType, left: Expression, right: Expression) -> Self {
        Self {
            arithmetic_type,
            left: Box::new(left),
            right: Some(Box::new(right)),
        }
    }

    /// Creates a unary negation node.
    pub fn negative(child: Expression) -> Self {
        Self {
            arithmetic_type: ArithmeticType::Negative,
            left: Box::new(child),
            right: None,
        }
    }

    /// The operation kind.
    pub fn arithmetic_type(&self) -> ArithmeticType {
        self.arithmetic_type
    }

    /// The left (or only) operand.
    pub fn left(&self) -> &Expression {
        &self.left
    }

    /// The right operand, absent for negation.
    pub fn right(&self) -> Option<&Expression> {
        self.right.as_deref()
    }

    fn apply(&self, left: &Value, right: Option<&Value>) -> TernResult<Value> {
        let op = match self.arithmetic_type {
            ArithmeticType::Add => ArithmeticOp::Add,
            ArithmeticType::Sub => ArithmeticOp::Sub,
            ArithmeticType::Mul => ArithmeticOp::Mul,
            ArithmeticType::Div => ArithmeticOp::Div,
            ArithmeticType::Negative => return value::negate(left),
        };
        let right = right.ok_or_else(|| {
            TernError::internal("binary arithmetic node is missing its right operand")
        })?;
        value::arithmetic(op, left, right)
    }
}

/// A reference to an aggregate computed upstream.
///
/// The aggregation operator materializes the result under this node's
/// name; evaluation resolves it from the tuple by that name.
#[derive(Debug, Clone)]
pub struct AggregateExpr {
    func: AggregateFunc,
    child: Box<Expression>,
}

impl AggregateExpr {
    /// Creates an aggregate node.
    pub fn new(func: AggregateFunc, child: Expression) -> Self {
        Self {
            func,
            child: Box::new(child),
        }
    }

    /// The aggregate function.
    pub fn func(&self) -> AggregateFunc {
        self.func
    }

    /// The aggregated child expression.
    pub fn child(&self) -> &Expression {
        &self.child
    }
}

/// A vector similarity operation.
#[derive(Debug, Clone)]
pub struct VectorDistanceExpr {
    kind: VectorOpKind,
    left: Box<Expression>,
    right: Box<Expression>,
}

impl VectorDistanceExpr {
    /// Creates a vector-distance node.
    pub fn new(kind: VectorOpKind, left: Expression, right: Expression) -> Self {
        Self {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// The operation kind.
    pub fn kind(&self) -> VectorOpKind {
        self.kind
    }

    /// The left operand.
    pub fn left(&self) -> &Expression {
        &self.left
    }

    /// The right operand.
    pub fn right(&self) -> &Expression {
        &self.right
    }
}

/// A bound, immutable expression node.
#[derive(Debug, Clone)]
pub enum Expression {
    /// Resolved column reference.
    Field(FieldExpr),
    /// Literal value.
    Value(ValueExpr),
    /// Cast to a target type.
    Cast(CastExpr),
    /// Binary comparison.
    Comparison(ComparisonExpr),
    /// Conjunction / disjunction.
    Conjunction(ConjunctionExpr),
    /// Arithmetic, including unary negation.
    Arithmetic(ArithmeticExpr),
    /// Aggregate reference.
    Aggregate(AggregateExpr),
    /// Vector similarity operation.
    VectorDistance(VectorDistanceExpr),
}

impl Expression {
    /// Evaluates this expression against a tuple.
    pub fn value(&self, tuple: &dyn Tuple) -> TernResult<Value> {
        match self {
            Expression::Field(expr) => tuple.find_cell(&expr.spec()),
            Expression::Value(expr) => Ok(expr.value().clone()),
            Expression::Cast(expr) => expr.child().value(tuple)?.cast_to(expr.target()),
            Expression::Comparison(expr) => {
                let left = expr.left().value(tuple)?;
                let right = expr.right().value(tuple)?;
                expr.compare_values(&left, &right)
            }
            Expression::Conjunction(expr) => {
                evaluate_conjunction(expr, |child| child.value(tuple))
            }
            Expression::Arithmetic(expr) => {
                let left = expr.left().value(tuple)?;
                let right = expr.right().map(|r| r.value(tuple)).transpose()?;
                expr.apply(&left, right.as_ref())
            }
            Expression::Aggregate(_) => tuple.find_cell(&CellSpec::from_alias(self.name())),
            Expression::VectorDistance(expr) => {
                let left = expr.left().value(tuple)?;
                let right = expr.right().value(tuple)?;
                vector_op(expr.kind(), &left, &right)
            }
        }
    }

    /// Evaluates this expression without a tuple.
    ///
    /// Succeeds only for expressions with no field dependency.
    pub fn try_constant(&self) -> TernResult<Value> {
        match self {
            Expression::Field(expr) => Err(TernError::internal(format!(
                "field '{}' is not a constant",
                expr.spec()
            ))),
            Expression::Value(expr) => Ok(expr.value().clone()),
            Expression::Cast(expr) => expr.child().try_constant()?.cast_to(expr.target()),
            Expression::Comparison(expr) => {
                let left = expr.left().try_constant()?;
                let right = expr.right().try_constant()?;
                expr.compare_values(&left, &right)
            }
            Expression::Conjunction(expr) => {
                evaluate_conjunction(expr, Expression::try_constant)
            }
            Expression::Arithmetic(expr) => {
                let left = expr.left().try_constant()?;
                let right = expr.right().map(Expression::try_constant).transpose()?;
                expr.apply(&left, right.as_ref())
            }
            Expression::Aggregate(_) => {
                Err(TernError::internal("an aggregate is not a constant"))
            }
            Expression::VectorDistance(expr) => {
                let left = expr.left().try_constant()?;
                let right = expr.right().try_constant()?;
                vector_op(expr.kind(), &left, &right)
            }
        }
    }

    /// The expression's display name, used for output cell naming.
    pub fn name(&self) -> String {
        match self {
            Expression::Field(expr) => expr.field_name().to_string(),
            Expression::Value(expr) => expr.value().to_string(),
            Expression::Cast(expr) => expr.child().name(),
            Expression::Comparison(expr) => format!(
                "{}{}{}",
                expr.left().name(),
                expr.op().symbol(),
                expr.right().name()
            ),
            Expression::Conjunction(expr) => {
                let joiner = match expr.conjunction_type() {
                    ConjunctionType::And => " and ",
                    ConjunctionType::Or => " or ",
                };
                expr.children()
                    .iter()
                    .map(Expression::name)
                    .collect::<Vec<_>>()
                    .join(joiner)
            }
            Expression::Arithmetic(expr) => match expr.arithmetic_type() {
                ArithmeticType::Negative => format!("-{}", expr.left().name()),
                op => {
                    let symbol = match op {
                        ArithmeticType::Add => '+',
                        ArithmeticType::Sub => '-',
                        ArithmeticType::Mul => '*',
                        ArithmeticType::Div => '/',
                        ArithmeticType::Negative => unreachable!(),
                    };
                    format!(
                        "{}{}{}",
                        expr.left().name(),
                        symbol,
                        expr.right().map(Expression::name).unwrap_or_default()
                    )
                }
            },
            Expression::Aggregate(expr) => {
                format!("{}({})", expr.func().name(), expr.child().name())
            }
            Expression::VectorDistance(expr) => format!(
                "{}({},{})",
                expr.kind().func_name(),
                expr.left().name(),
                expr.right().name()
            ),
        }
    }

    /// The type this expression evaluates to.
    pub fn value_type(&self) -> AttrType {
        match self {
            Expression::Field(expr) => expr.attr_type(),
            Expression::Value(expr) => expr.value().attr_type(),
            Expression::Cast(expr) => expr.target(),
            Expression::Comparison(_) | Expression::Conjunction(_) => AttrType::Boolean,
            Expression::Arithmetic(expr) => {
                let left = expr.left().value_type();
                let right = expr
                    .right()
                    .map(Expression::value_type)
                    .unwrap_or(AttrType::Undefined);
                if expr.arithmetic_type() == ArithmeticType::Div {
                    AttrType::Float
                } else if left == AttrType::Vector || right == AttrType::Vector {
                    AttrType::Vector
                } else if left == AttrType::Float || right == AttrType::Float {
                    AttrType::Float
                } else {
                    left
                }
            }
            Expression::Aggregate(expr) => match expr.func() {
                AggregateFunc::Count => AttrType::Int,
                AggregateFunc::Avg => AttrType::Float,
                _ => expr.child().value_type(),
            },
            Expression::VectorDistance(_) => AttrType::Float,
        }
    }
}

fn evaluate_conjunction(
    expr: &ConjunctionExpr,
    mut eval: impl FnMut(&Expression) -> TernResult<Value>,
) -> TernResult<Value> {
    match expr.conjunction_type() {
        ConjunctionType::And => {
            for child in expr.children() {
                if !eval(child)?.get_boolean() {
                    return Ok(Value::boolean(false));
                }
            }
            Ok(Value::boolean(true))
        }
        ConjunctionType::Or => {
            for child in expr.children() {
                if eval(child)?.get_boolean() {
                    return Ok(Value::boolean(true));
                }
            }
            Ok(Value::boolean(false))
        }
    }
}
