//! Store term values.
//!
//! [`Value`] is what a tuple position holds. Equality (`==`) is exact: the kind
//! and the payload must both match, except that `Int32` and `Int64` are one
//! integer kind, so `Int32(1) == Int64(1)` and both hash alike.
//! [`Value::term_cmp`] is the coercing comparison used by guards, where
//! `Int64(1)` and `Float64(1.0)` compare equal.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single tuple element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Kind name, used in type mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Float64(_) => "Float64",
            Value::Utf8(_) => "Utf8",
            Value::Bytes(_) => "Bytes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Class rank in term order: `Null < Boolean < number < Utf8 < Bytes`.
    fn class_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int32(_) | Value::Int64(_) | Value::Float64(_) => 2,
            Value::Utf8(_) => 3,
            Value::Bytes(_) => 4,
        }
    }

    /// Tie-break among numbers of equal magnitude: integers before floats.
    fn kind_rank(&self) -> u8 {
        match self {
            Value::Float64(_) => 1,
            _ => 0,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Coercing term comparison.
    ///
    /// Numbers compare by numeric value regardless of kind; other kinds compare
    /// within their class, and classes follow the term order.
    pub fn term_cmp(&self, other: &Value) -> Ordering {
        let class = self.class_rank().cmp(&other.class_rank());
        if class != Ordering::Equal {
            return class;
        }
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Utf8(a), Value::Utf8(b)) => a.cmp(b),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Float64(a), b) => b
                .as_i64()
                .map(|b| int_float_cmp(b, *a).reverse())
                .unwrap_or(Ordering::Equal),
            (a, Value::Float64(b)) => a
                .as_i64()
                .map(|a| int_float_cmp(a, *b))
                .unwrap_or(Ordering::Equal),
            (a, b) => a.as_i64().cmp(&b.as_i64()),
        }
    }

    /// Coercing equality (`==` in guard vocabulary).
    pub fn term_eq(&self, other: &Value) -> bool {
        self.term_cmp(other) == Ordering::Equal
    }

    /// Truthiness of a guard operand: only `Boolean(true)` is true.
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Boolean(true))
    }
}

/// Exact `i64` vs `f64` comparison, without rounding the integer through `f64`.
///
/// NaN follows `f64::total_cmp`: positive NaN above every integer, negative NaN
/// below.
fn int_float_cmp(i: i64, f: f64) -> Ordering {
    // 2^63, exactly representable
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // in [-2^63, 2^63): the cast is exact
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0f64.total_cmp(&(f - whole)),
        ord => ord,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Ord for Value {
    /// Total order consistent with exact equality: term order first, then kind.
    fn cmp(&self, other: &Self) -> Ordering {
        self.term_cmp(other)
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Int32 and Int64 are equal for equal payloads, so they share a tag
        match self {
            Value::Int32(_) | Value::Int64(_) => 2u8.hash(state),
            other => std::mem::discriminant(other).hash(state),
        }
        match self {
            Value::Null => {}
            Value::Boolean(v) => v.hash(state),
            Value::Int32(v) => i64::from(*v).hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::Utf8(v) => v.hash(state),
            Value::Bytes(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::Utf8(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => write!(f, "<<{} bytes>>", v.len()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_equality_distinguishes_kinds() {
        assert_ne!(Value::Int64(1), Value::Float64(1.0));
        assert_eq!(Value::Int64(7), Value::Int64(7));
    }

    #[test]
    fn integer_kinds_are_one_key() {
        use std::collections::BTreeMap;
        use std::hash::BuildHasher;

        assert_eq!(Value::Int32(1), Value::Int64(1));
        assert_eq!(Value::Int32(-5).cmp(&Value::Int64(-5)), Ordering::Equal);

        let hasher = ahash::RandomState::new();
        assert_eq!(
            hasher.hash_one(Value::Int32(42)),
            hasher.hash_one(Value::Int64(42))
        );

        let mut rows = BTreeMap::new();
        rows.insert(Value::Int64(1), "stored");
        assert_eq!(rows.get(&Value::Int32(1)), Some(&"stored"));
    }

    #[test]
    fn int_float_comparison_is_exact_beyond_f64_precision() {
        let big = 1i64 << 53;
        let float = Value::Float64(big as f64);
        assert!(!Value::Int64(big + 1).term_eq(&float));
        assert_eq!(Value::Int64(big + 1).term_cmp(&float), Ordering::Greater);
        assert_eq!(float.term_cmp(&Value::Int64(big + 1)), Ordering::Less);
        assert!(Value::Int64(big).term_eq(&float));

        assert_eq!(Value::Int64(2).term_cmp(&Value::Float64(2.5)), Ordering::Less);
        assert_eq!(Value::Int64(-3).term_cmp(&Value::Float64(-2.5)), Ordering::Less);
        assert_eq!(Value::Int64(-2).term_cmp(&Value::Float64(-2.5)), Ordering::Greater);
        assert_eq!(Value::Int64(i64::MAX).term_cmp(&Value::Float64(f64::INFINITY)), Ordering::Less);
        assert_eq!(Value::Int64(i64::MIN).term_cmp(&Value::Float64(-1e300)), Ordering::Greater);
        assert_eq!(Value::Int64(i64::MAX).term_cmp(&Value::Float64(9.3e18)), Ordering::Less);
    }

    #[test]
    fn term_equality_coerces_numbers() {
        assert!(Value::Int64(1).term_eq(&Value::Float64(1.0)));
        assert!(Value::Int32(3).term_eq(&Value::Int64(3)));
        assert!(!Value::Int64(1).term_eq(&Value::Utf8("1".into())));
    }

    #[test]
    fn term_order_across_classes() {
        let mut values = vec![
            Value::Bytes(vec![1]),
            Value::Utf8("a".into()),
            Value::Int64(5),
            Value::Boolean(false),
            Value::Null,
            Value::Float64(2.5),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(false),
                Value::Float64(2.5),
                Value::Int64(5),
                Value::Utf8("a".into()),
                Value::Bytes(vec![1]),
            ]
        );
    }

    #[test]
    fn ord_is_consistent_with_exact_eq() {
        let a = Value::Int64(1);
        let b = Value::Float64(1.0);
        assert_eq!(a.term_cmp(&b), Ordering::Equal);
        assert_eq!(a.cmp(&b), Ordering::Less);
    }
}
