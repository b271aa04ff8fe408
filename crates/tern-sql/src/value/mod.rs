//! Typed runtime values and per-tag behavior dispatch.
//!
//! A [`Value`] is a tagged union over the engine's attribute types. All
//! polymorphic behavior (comparison, casting, arithmetic, text parsing and
//! rendering) lives in one stateless [`TypeOps`] singleton per tag, looked
//! up through [`type_ops`]. Expression evaluation never matches on value
//! payloads directly; it goes through the dispatch table so the
//! cross-type coercion rules stay in one place.

mod behavior;
mod boolean_type;
mod char_type;
mod date_type;
mod float_type;
mod int_type;
mod text_type;
mod vector_type;

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use tern_common::{TernError, TernResult};

pub use behavior::{type_ops, ArithmeticOp, TypeOps, CMP_INCOMPARABLE, EPSILON};
pub use date_type::{check_date, check_date_encoded, encode_date, parse_date_text};
pub use text_type::{TextPool, TextRef};
pub use vector_type::{
    cosine_distance, inner_product, l2_distance, parse_vector_literal, vector_op, VectorOpKind,
};

/// The discriminant identifying which variant a [`Value`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    /// No type resolved yet (unbound metadata only; a constructed value
    /// is never undefined).
    Undefined,
    /// Character string.
    Char,
    /// 32-bit signed integer.
    Int,
    /// 32-bit floating point.
    Float,
    /// Calendar date, encoded as the integer `y * 10000 + m * 100 + d`.
    Date,
    /// Large text stored out of line in a string pool.
    Text,
    /// Fixed-length vector of floats.
    Vector,
    /// Boolean value.
    Boolean,
    /// The NULL type.
    Null,
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttrType::Undefined => "UNDEFINED",
            AttrType::Char => "CHAR",
            AttrType::Int => "INT",
            AttrType::Float => "FLOAT",
            AttrType::Date => "DATE",
            AttrType::Text => "TEXT",
            AttrType::Vector => "VECTOR",
            AttrType::Boolean => "BOOLEAN",
            AttrType::Null => "NULL",
        };
        write!(f, "{}", name)
    }
}

/// A runtime value during query execution.
///
/// A value is either fully typed or explicitly [`Value::Null`]; payload
/// validity is determined solely by the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 32-bit floating point.
    Float(f32),
    /// Date as its `YYYYMMDD` integer encoding.
    Date(i32),
    /// Character string.
    Chars(String),
    /// Out-of-line text handle.
    Text(TextRef),
    /// Float vector.
    Vector(Vec<f32>),
}

impl Value {
    /// Creates a NULL value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates an integer value.
    pub fn int(v: i32) -> Self {
        Value::Int(v)
    }

    /// Creates a float value.
    pub fn float(v: f32) -> Self {
        Value::Float(v)
    }

    /// Creates a character-string value.
    pub fn chars(v: impl Into<String>) -> Self {
        Value::Chars(v.into())
    }

    /// Creates a vector value.
    pub fn vector(v: Vec<f32>) -> Self {
        Value::Vector(v)
    }

    /// Creates a date value, validating calendar well-formedness.
    pub fn date(year: i32, month: i32, day: i32) -> TernResult<Self> {
        if !check_date(year, month, day) {
            return Err(TernError::invalid_argument(format!(
                "invalid date: {:04}-{:02}-{:02}",
                year, month, day
            )));
        }
        Ok(Value::Date(encode_date(year, month, day)))
    }

    /// Returns the tag of this value.
    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::Null => AttrType::Null,
            Value::Boolean(_) => AttrType::Boolean,
            Value::Int(_) => AttrType::Int,
            Value::Float(_) => AttrType::Float,
            Value::Date(_) => AttrType::Date,
            Value::Chars(_) => AttrType::Char,
            Value::Text(_) => AttrType::Text,
            Value::Vector(_) => AttrType::Vector,
        }
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerces this value to an integer.
    ///
    /// Character strings use a numeric-prefix parse that yields 0 on
    /// unparsable input; floats truncate toward zero.
    pub fn get_int(&self) -> i32 {
        match self {
            Value::Null => 0,
            Value::Boolean(b) => i32::from(*b),
            Value::Int(v) => *v,
            Value::Float(v) => *v as i32,
            Value::Date(v) => *v,
            Value::Chars(s) => behavior::parse_int_prefix(s),
            Value::Text(t) => t.id().as_u32() as i32,
            Value::Vector(_) => 0,
        }
    }

    /// Coerces this value to a float.
    ///
    /// Integers widen; character strings use a numeric-prefix parse that
    /// yields 0.0 on unparsable input.
    pub fn get_float(&self) -> f32 {
        match self {
            Value::Null => 0.0,
            Value::Boolean(b) => f32::from(u8::from(*b)),
            Value::Int(v) => *v as f32,
            Value::Float(v) => *v,
            Value::Date(v) => *v as f32,
            Value::Chars(s) => behavior::parse_float_prefix(s),
            Value::Text(_) => 0.0,
            Value::Vector(_) => 0.0,
        }
    }

    /// Coerces this value to a boolean.
    pub fn get_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Date(_) => true,
            Value::Chars(s) => !s.is_empty(),
            Value::Text(_) => true,
            Value::Vector(v) => !v.is_empty(),
        }
    }

    /// Returns the vector payload, parsing CHAR values as vector literals.
    pub fn get_vector(&self) -> TernResult<Vec<f32>> {
        match self {
            Value::Vector(v) => Ok(v.clone()),
            Value::Chars(s) => parse_vector_literal(s),
            other => Err(TernError::TypeMismatch {
                expected: AttrType::Vector.to_string(),
                actual: other.attr_type().to_string(),
            }),
        }
    }

    /// Raw three-way comparison following the cross-tag coercion matrix.
    ///
    /// The tag of the left operand selects the behavior used. Returns
    /// `-1`, `0`, `1`, or [`CMP_INCOMPARABLE`] when the operands cannot
    /// be ordered (e.g. vectors of different lengths). Callers must treat
    /// the sentinel as "incomparable", never as an ordering.
    pub fn compare_raw(&self, other: &Value) -> i32 {
        type_ops(self.attr_type()).compare(self, other)
    }

    /// Checked three-way comparison.
    ///
    /// Maps the incomparable sentinel to an internal error so it cannot
    /// leak into ordering decisions.
    pub fn compare(&self, other: &Value) -> TernResult<Ordering> {
        let raw = self.compare_raw(other);
        if raw == CMP_INCOMPARABLE {
            return Err(TernError::internal(format!(
                "values of type {} and {} are not comparable",
                self.attr_type(),
                other.attr_type()
            )));
        }
        Ok(raw.cmp(&0))
    }

    /// Casts this value to the target type via the behavior of its tag.
    ///
    /// NULL casts to NULL for any target.
    pub fn cast_to(&self, target: AttrType) -> TernResult<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        type_ops(self.attr_type()).cast_to(self, target)
    }
}

/// Returns the cost of implicitly casting `from` to `to`.
///
/// `Some(0)` for identity, `Some(n)` for a supported conversion, `None`
/// when the cast is impossible. The binder uses this to prefer the
/// cheapest viable implicit conversion.
pub fn cast_cost(from: AttrType, to: AttrType) -> Option<u32> {
    type_ops(from).cast_cost(to)
}

/// Applies a binary arithmetic operation.
///
/// NULL operands short-circuit to NULL. The tag of the left operand
/// selects the behavior used.
pub fn arithmetic(op: ArithmeticOp, left: &Value, right: &Value) -> TernResult<Value> {
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }
    type_ops(left.attr_type()).arithmetic(op, left, right)
}

/// Negates a value. NULL negates to NULL.
pub fn negate(value: &Value) -> TernResult<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    type_ops(value.attr_type()).negate(value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", type_ops(self.attr_type()).format(self))
    }
}
