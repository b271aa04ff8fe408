//! Behavior for BOOLEAN values.

use super::behavior::{compare_i32, TypeOps};
use super::{AttrType, Value, CMP_INCOMPARABLE};

/// Behavior singleton for [`AttrType::Boolean`].
pub struct BooleanOps;

impl TypeOps for BooleanOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Boolean
    }

    fn compare(&self, left: &Value, right: &Value) -> i32 {
        match right.attr_type() {
            AttrType::Boolean | AttrType::Int => compare_i32(left.get_int(), right.get_int()),
            _ => CMP_INCOMPARABLE,
        }
    }

    fn format(&self, value: &Value) -> String {
        if value.get_boolean() { "true" } else { "false" }.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::super::type_ops;
    use super::*;

    #[test]
    fn test_boolean_compare() {
        let ops = type_ops(AttrType::Boolean);
        assert_eq!(ops.compare(&Value::boolean(false), &Value::boolean(true)), -1);
        assert_eq!(ops.compare(&Value::boolean(true), &Value::boolean(true)), 0);
        assert_eq!(ops.compare(&Value::boolean(true), &Value::chars("x")), CMP_INCOMPARABLE);
    }

    #[test]
    fn test_boolean_format() {
        assert_eq!(Value::boolean(true).to_string(), "true");
        assert_eq!(Value::boolean(false).to_string(), "false");
    }
}
