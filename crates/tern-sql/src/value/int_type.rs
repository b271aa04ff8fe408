//! Behavior for INT values.

use tern_common::{TernError, TernResult};

use super::behavior::{compare_f32, compare_i32, ArithmeticOp, TypeOps, EPSILON};
use super::{AttrType, Value, CMP_INCOMPARABLE};

/// Behavior singleton for [`AttrType::Int`].
pub struct IntOps;

impl TypeOps for IntOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Int
    }

    fn compare(&self, left: &Value, right: &Value) -> i32 {
        match right.attr_type() {
            AttrType::Int | AttrType::Boolean => compare_i32(left.get_int(), right.get_int()),
            AttrType::Float | AttrType::Char => compare_f32(left.get_float(), right.get_float()),
            _ => CMP_INCOMPARABLE,
        }
    }

    fn cast_to(&self, value: &Value, target: AttrType) -> TernResult<Value> {
        match target {
            AttrType::Int => Ok(value.clone()),
            AttrType::Float => Ok(Value::Float(value.get_int() as f32)),
            _ => Err(TernError::not_supported(format!(
                "cast from INT to {}",
                target
            ))),
        }
    }

    fn cast_cost(&self, target: AttrType) -> Option<u32> {
        match target {
            AttrType::Int => Some(0),
            AttrType::Float => Some(1),
            _ => None,
        }
    }

    fn arithmetic(&self, op: ArithmeticOp, left: &Value, right: &Value) -> TernResult<Value> {
        let l = left.get_int();
        let r = right.get_int();
        match op {
            ArithmeticOp::Add => Ok(Value::Int(l.wrapping_add(r))),
            ArithmeticOp::Sub => Ok(Value::Int(l.wrapping_sub(r))),
            ArithmeticOp::Mul => Ok(Value::Int(l.wrapping_mul(r))),
            // Division widens to float; a near-zero divisor yields NULL
            // because the value model has no infinity representation.
            ArithmeticOp::Div => {
                let divisor = right.get_float();
                if divisor > -EPSILON && divisor < EPSILON {
                    Ok(Value::Null)
                } else {
                    Ok(Value::Float(left.get_float() / divisor))
                }
            }
        }
    }

    fn negate(&self, value: &Value) -> TernResult<Value> {
        Ok(Value::Int(value.get_int().wrapping_neg()))
    }

    fn parse_text(&self, text: &str) -> TernResult<Value> {
        text.parse::<i32>()
            .map(Value::Int)
            .map_err(|_| TernError::TypeMismatch {
                expected: AttrType::Int.to_string(),
                actual: format!("text literal '{}'", text),
            })
    }

    fn format(&self, value: &Value) -> String {
        value.get_int().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::type_ops;
    use super::*;

    fn ops() -> &'static dyn TypeOps {
        type_ops(AttrType::Int)
    }

    #[test]
    fn test_int_compare() {
        assert_eq!(ops().compare(&Value::int(1), &Value::int(2)), -1);
        assert_eq!(ops().compare(&Value::int(2), &Value::float(1.5)), 1);
        assert_eq!(ops().compare(&Value::int(10), &Value::chars("10")), 0);
        assert_eq!(ops().compare(&Value::int(10), &Value::vector(vec![])), CMP_INCOMPARABLE);
    }

    #[test]
    fn test_int_arithmetic() {
        let v = ops()
            .arithmetic(ArithmeticOp::Add, &Value::int(2), &Value::int(3))
            .unwrap();
        assert_eq!(v, Value::Int(5));

        let v = ops()
            .arithmetic(ArithmeticOp::Div, &Value::int(7), &Value::int(2))
            .unwrap();
        assert_eq!(v, Value::Float(3.5));
    }

    #[test]
    fn test_int_divide_by_zero_is_null() {
        let v = ops()
            .arithmetic(ArithmeticOp::Div, &Value::int(7), &Value::int(0))
            .unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_int_cast() {
        assert_eq!(ops().cast_to(&Value::int(3), AttrType::Float).unwrap(), Value::Float(3.0));
        assert!(ops().cast_to(&Value::int(3), AttrType::Date).is_err());
        assert_eq!(ops().cast_cost(AttrType::Float), Some(1));
        assert_eq!(ops().cast_cost(AttrType::Char), None);
    }

    #[test]
    fn test_int_parse_is_strict() {
        assert_eq!(ops().parse_text("42").unwrap(), Value::Int(42));
        assert!(ops().parse_text("42x").is_err());
        assert!(ops().parse_text("").is_err());
    }
}
