//! Behavior for VECTOR values and the vector similarity operations.

use tern_common::{TernError, TernResult};
use tracing::warn;

use super::behavior::{ArithmeticOp, TypeOps, EPSILON};
use super::{AttrType, Value, CMP_INCOMPARABLE};

/// Vector similarity operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOpKind {
    /// Dot product of two equal-length vectors.
    InnerProduct,
    /// `1 - cos(angle)` between two equal-length vectors.
    CosineDistance,
    /// Euclidean distance between two equal-length vectors.
    L2Distance,
}

impl VectorOpKind {
    /// Returns the function name used in expression names.
    pub fn func_name(self) -> &'static str {
        match self {
            VectorOpKind::InnerProduct => "inner_product",
            VectorOpKind::CosineDistance => "cosine_distance",
            VectorOpKind::L2Distance => "l2_distance",
        }
    }
}

/// Parses a vector literal of the form `[v0,v1,...,vn]`.
pub fn parse_vector_literal(text: &str) -> TernResult<Vec<f32>> {
    let invalid = || TernError::invalid_argument(format!("invalid vector literal: {}", text));

    let body = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(invalid)?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    body.split(',')
        .map(|part| part.trim().parse::<f32>().map_err(|_| invalid()))
        .collect()
}

fn format_vector(values: &[f32]) -> String {
    let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

/// Realizes both operands as vectors (parsing CHAR literals) and checks
/// that their lengths match.
fn operand_pair(left: &Value, right: &Value) -> TernResult<(Vec<f32>, Vec<f32>)> {
    let l = left.get_vector()?;
    let r = right.get_vector()?;
    if l.len() != r.len() {
        warn!("vector lengths differ: {} vs {}", l.len(), r.len());
        return Err(TernError::internal("the size of two vectors is not equal"));
    }
    Ok((l, r))
}

/// Dot product. Operands must be equal-length vectors (or CHAR vector
/// literals).
pub fn inner_product(left: &Value, right: &Value) -> TernResult<Value> {
    let (l, r) = operand_pair(left, right)?;
    let sum: f32 = l.iter().zip(&r).map(|(a, b)| a * b).sum();
    Ok(Value::Float(sum))
}

/// Cosine distance, snapped to exactly zero within the epsilon band to
/// absorb floating-point noise.
pub fn cosine_distance(left: &Value, right: &Value) -> TernResult<Value> {
    let (l, r) = operand_pair(left, right)?;
    let mut dot = 0.0f32;
    let mut l_norm = 0.0f32;
    let mut r_norm = 0.0f32;
    for (a, b) in l.iter().zip(&r) {
        dot += a * b;
        l_norm += a * a;
        r_norm += b * b;
    }
    let mut cosine = 1.0 - dot / (l_norm.sqrt() * r_norm.sqrt());
    if (-EPSILON..=EPSILON).contains(&cosine) {
        cosine = 0.0;
    }
    Ok(Value::Float(cosine))
}

/// Euclidean distance.
pub fn l2_distance(left: &Value, right: &Value) -> TernResult<Value> {
    let (l, r) = operand_pair(left, right)?;
    let sum: f32 = l.iter().zip(&r).map(|(a, b)| (a - b) * (a - b)).sum();
    Ok(Value::Float(sum.sqrt()))
}

/// Applies a vector similarity operation.
pub fn vector_op(kind: VectorOpKind, left: &Value, right: &Value) -> TernResult<Value> {
    match kind {
        VectorOpKind::InnerProduct => inner_product(left, right),
        VectorOpKind::CosineDistance => cosine_distance(left, right),
        VectorOpKind::L2Distance => l2_distance(left, right),
    }
}

/// Behavior singleton for [`AttrType::Vector`].
pub struct VectorOps;

impl TypeOps for VectorOps {
    fn attr_type(&self) -> AttrType {
        AttrType::Vector
    }

    /// Element-wise: the first non-equal element decides the ordering.
    /// Mismatched lengths are incomparable.
    fn compare(&self, left: &Value, right: &Value) -> i32 {
        let (Ok(l), Ok(r)) = (left.get_vector(), right.get_vector()) else {
            return CMP_INCOMPARABLE;
        };
        if l.len() != r.len() {
            warn!("vector lengths differ: {} vs {}", l.len(), r.len());
            return CMP_INCOMPARABLE;
        }
        for (a, b) in l.iter().zip(&r) {
            if a < b {
                return -1;
            }
            if a > b {
                return 1;
            }
        }
        0
    }

    fn arithmetic(&self, op: ArithmeticOp, left: &Value, right: &Value) -> TernResult<Value> {
        let (l, r) = operand_pair(left, right)?;
        let combine: fn(f32, f32) -> f32 = match op {
            ArithmeticOp::Add => |a, b| a + b,
            ArithmeticOp::Sub => |a, b| a - b,
            ArithmeticOp::Mul => |a, b| a * b,
            ArithmeticOp::Div => {
                return Err(TernError::not_supported("arithmetic / on VECTOR"));
            }
        };
        Ok(Value::Vector(
            l.iter().zip(&r).map(|(a, b)| combine(*a, *b)).collect(),
        ))
    }

    fn parse_text(&self, text: &str) -> TernResult<Value> {
        Ok(Value::Vector(parse_vector_literal(text)?))
    }

    fn format(&self, value: &Value) -> String {
        match value {
            Value::Vector(v) => format_vector(v),
            _ => String::new(),
        }
    }
}
