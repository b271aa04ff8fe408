//! Behavior for DATE values and calendar helpers.
//!
//! A date is stored as the 8-digit integer `y * 10000 + m * 100 + d`.
//! Validity is enforced at construction and cast time, not at use time.

use tern_common::{TernError, TernResult};

use super::behavior::{compare_i32, TypeOps};
use super::{type_ops, AttrType, Value, CMP_INCOMPARABLE};

const DAYS_IN_MONTH: [i32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Returns true for a valid calendar date with `1 <= y <= 9999`.
pub fn check_date(year: i32, month: i32, day: i32) -> bool {
    let leap = year % 400 == 0 || (year % 100 != 0 && year % 4 == 0);
    year > 0
        && year <= 9999
        && month > 0
        && month < 13
        && day > 0
        && day <= DAYS_IN_MONTH[month as usize] + i32::from(month == 2 && leap)
}

/// Returns true when an integer-encoded date is calendar-valid.
pub fn check_date_encoded(encoded: i32) -> bool {
    check_date(encoded / 10000, encoded % 10000 / 100, encoded % 100)
}

/// Encodes a date as `y * 10000 + m * 100 + d`.
pub fn encode_date(year: i32, month: i32, day: i32) -> i32 {
    year * 10000 + month * 100 + day
}

/// Parses date text of the form `integer-integer-integer`.
///
/// Any deviation from the pattern, or a calendar-invalid combination,
/// is an invalid-argument error; there is no best-effort default.
pub fn parse_date_text(text: &str) -> TernResult<i32> {
    let invalid = || TernError::invalid_argument(format!("invalid date format: {}", text));

    let mut parts = text.split('-');
    let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let month: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let day: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }
    if !check_date(year, month, day) {
        return Err(invalid());
    }
    Ok(encode_date(year, month, day))
}

/// Behavior singleton for [`AttrType::Date`].
pub struct DateOps;

impl TypeOps for DateOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Date
    }

    fn compare(&self, left: &Value, right: &Value) -> i32 {
        if right.attr_type() == AttrType::Char {
            return match type_ops(AttrType::Char).cast_to(right, AttrType::Date) {
                Ok(coerced) => compare_i32(left.get_int(), coerced.get_int()),
                Err(_) => CMP_INCOMPARABLE,
            };
        }
        compare_i32(left.get_int(), right.get_int())
    }

    fn parse_text(&self, text: &str) -> TernResult<Value> {
        Ok(Value::Date(parse_date_text(text)?))
    }

    /// Renders as zero-padded `YYYY-MM-DD`, derived purely from the
    /// integer encoding.
    fn format(&self, value: &Value) -> String {
        let encoded = value.get_int();
        format!(
            "{:04}-{:02}-{:02}",
            encoded / 10000,
            encoded % 10000 / 100,
            encoded % 100
        )
    }
}
