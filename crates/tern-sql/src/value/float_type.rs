//! Behavior for FLOAT values.

use tern_common::{TernError, TernResult};

use super::behavior::{compare_f32, ArithmeticOp, TypeOps, EPSILON};
use super::{AttrType, Value};

/// Behavior singleton for [`AttrType::Float`].
pub struct FloatOps;

impl TypeOps for FloatOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Float
    }

    /// The right operand is coerced to float: INT widens, CHAR parses.
    /// No tolerance is applied; the comparison is direct.
    fn compare(&self, left: &Value, right: &Value) -> i32 {
        compare_f32(left.get_float(), right.get_float())
    }

    fn arithmetic(&self, op: ArithmeticOp, left: &Value, right: &Value) -> TernResult<Value> {
        let l = left.get_float();
        let r = right.get_float();
        match op {
            ArithmeticOp::Add => Ok(Value::Float(l + r)),
            ArithmeticOp::Sub => Ok(Value::Float(l - r)),
            ArithmeticOp::Mul => Ok(Value::Float(l * r)),
            // The value model has no infinity representation, so a
            // near-zero divisor yields NULL rather than an error.
            ArithmeticOp::Div => {
                if r > -EPSILON && r < EPSILON {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Float(l / r))
                }
            }
        }
    }

    fn negate(&self, value: &Value) -> TernResult<Value> {
        Ok(Value::Float(-value.get_float()))
    }

    fn parse_text(&self, text: &str) -> TernResult<Value> {
        text.parse::<f32>()
            .map(Value::Float)
            .map_err(|_| TernError::TypeMismatch {
                expected: AttrType::Float.to_string(),
                actual: format!("text literal '{}'", text),
            })
    }

    /// Shortest round-trippable decimal rendering, not fixed precision.
    fn format(&self, value: &Value) -> String {
        value.get_float().to_string()
    }
}
