//! Behavior for CHAR values.

use tern_common::{TernError, TernResult};
use tracing::warn;

use super::behavior::{compare_bytes, compare_f32, compare_i32, parse_int_prefix, TypeOps};
use super::date_type::parse_date_text;
use super::vector_type::parse_vector_literal;
use super::{AttrType, Value, CMP_INCOMPARABLE};

/// Behavior singleton for [`AttrType::Char`].
pub struct CharOps;

impl TypeOps for CharOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Char
    }

    /// Cross-tag policy, in priority order: DATE coerces the char side to
    /// a date, INT/FLOAT coerce numerically, TEXT compares realized
    /// content, and CHAR vs CHAR is a length-aware byte comparison.
    fn compare(&self, left: &Value, right: &Value) -> i32 {
        match right.attr_type() {
            AttrType::Date => match self.cast_to(left, AttrType::Date) {
                Ok(coerced) => compare_i32(coerced.get_int(), right.get_int()),
                Err(_) => CMP_INCOMPARABLE,
            },
            AttrType::Int => compare_i32(left.get_int(), right.get_int()),
            AttrType::Float => compare_f32(left.get_float(), right.get_float()),
            AttrType::Text => {
                let left_str = left.to_string();
                let right_str = right.to_string();
                compare_bytes(left_str.as_bytes(), right_str.as_bytes())
            }
            _ => match (left, right) {
                (Value::Chars(l), Value::Chars(r)) => compare_bytes(l.as_bytes(), r.as_bytes()),
                _ => CMP_INCOMPARABLE,
            },
        }
    }

    fn cast_to(&self, value: &Value, target: AttrType) -> TernResult<Value> {
        let Value::Chars(text) = value else {
            return Err(TernError::internal("char behavior applied to non-char value"));
        };
        match target {
            AttrType::Char => Ok(value.clone()),
            AttrType::Date => {
                let encoded = parse_date_text(text).map_err(|e| {
                    warn!("invalid date format: {}", text);
                    e
                })?;
                Ok(Value::Date(encoded))
            }
            // Unparsable input silently yields 0. Intentional; callers
            // depend on the numeric-prefix parse.
            AttrType::Int => Ok(Value::Int(parse_int_prefix(text))),
            AttrType::Vector => Ok(Value::Vector(parse_vector_literal(text)?)),
            _ => Err(TernError::not_supported(format!(
                "cast from CHAR to {}",
                target
            ))),
        }
    }

    fn cast_cost(&self, target: AttrType) -> Option<u32> {
        match target {
            AttrType::Char => Some(0),
            AttrType::Date | AttrType::Int => Some(1),
            _ => None,
        }
    }

    fn parse_text(&self, text: &str) -> TernResult<Value> {
        Ok(Value::Chars(text.to_string()))
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Chars(s) => s.clone(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::type_ops;
    use super::*;

    fn ops() -> &'static dyn TypeOps {
        type_ops(AttrType::Char)
    }

    #[test]
    fn test_char_vs_char_is_byte_order() {
        assert_eq!(ops().compare(&Value::chars("abc"), &Value::chars("abd")), -1);
        assert_eq!(ops().compare(&Value::chars("abc"), &Value::chars("abc")), 0);
        // Prefix sorts first: the embedded length is authoritative
        assert_eq!(ops().compare(&Value::chars("ab"), &Value::chars("abc")), -1);
    }

    #[test]
    fn test_char_vs_int_is_numeric() {
        assert_eq!(ops().compare(&Value::chars("12"), &Value::int(13)), -1);
        assert_eq!(ops().compare(&Value::chars("12abc"), &Value::int(12)), 0);
        // "9" < "10" numerically even though "9" > "1" as bytes
        assert_eq!(ops().compare(&Value::chars("9"), &Value::int(10)), -1);
    }

    #[test]
    fn test_char_vs_float_is_numeric() {
        assert_eq!(ops().compare(&Value::chars("2.5"), &Value::float(2.75)), -1);
        assert_eq!(ops().compare(&Value::chars("2.5"), &Value::float(2.5)), 0);
    }

    #[test]
    fn test_char_vs_date_coerces() {
        let date = Value::date(2024, 3, 1).unwrap();
        assert_eq!(ops().compare(&Value::chars("2024-2-29"), &date), -1);
        assert_eq!(ops().compare(&Value::chars("2024-3-1"), &date), 0);
        // Malformed char side cannot be ordered against a date
        assert_eq!(ops().compare(&Value::chars("not a date"), &date), CMP_INCOMPARABLE);
    }

    #[test]
    fn test_cast_to_date_strict() {
        assert_eq!(
            ops().cast_to(&Value::chars("2024-2-29"), AttrType::Date).unwrap(),
            Value::Date(20240229)
        );
        for bad in ["2024/02/29", "2023-2-29", "2024-13-1", "2024-0-1", "2024-1-0", "x"] {
            let err = ops().cast_to(&Value::chars(bad), AttrType::Date).unwrap_err();
            assert_eq!(
                err.code(),
                tern_common::ErrorCode::InvalidArgument,
                "expected InvalidArgument for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_cast_to_int_silently_zeroes() {
        // Locked-in quirk: unlike CHAR->DATE, unparsable input yields 0
        assert_eq!(
            ops().cast_to(&Value::chars("42x"), AttrType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            ops().cast_to(&Value::chars("garbage"), AttrType::Int).unwrap(),
            Value::Int(0)
        );
    }

    #[test]
    fn test_cast_cost() {
        assert_eq!(ops().cast_cost(AttrType::Char), Some(0));
        assert_eq!(ops().cast_cost(AttrType::Date), Some(1));
        assert_eq!(ops().cast_cost(AttrType::Int), Some(1));
        assert_eq!(ops().cast_cost(AttrType::Float), None);
        assert_eq!(ops().cast_cost(AttrType::Vector), None);
    }

    #[test]
    fn test_unsupported_cast() {
        let err = ops().cast_to(&Value::chars("x"), AttrType::Boolean).unwrap_err();
        assert_eq!(err.code(), tern_common::ErrorCode::NotSupported);
    }
}
