//! Guard expressions.
//!
//! [`Guard`] is what callers write, by attribute name. [`GuardExpr`] is the
//! compiled form the store evaluates, by placeholder.

use crate::api::IntoValue;
use crate::error::{TqlError, TqlResult};
use crate::pattern::VarId;
use crate::value::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Comparison operators of the guard vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `==`, numbers compare by value
    Eq,
    /// `=:=`, kind and value must match
    ExactEq,
    /// `/=`
    Ne,
    /// `=/=`
    ExactNe,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::ExactEq => "=:=",
            CompareOp::Ne => "/=",
            CompareOp::ExactNe => "=/=",
            CompareOp::Lt => "<",
            CompareOp::Le => "=<",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Apply the operator to two values.
    pub fn apply(&self, left: &Value, right: &Value) -> bool {
        match self {
            CompareOp::Eq => left.term_eq(right),
            CompareOp::ExactEq => left == right,
            CompareOp::Ne => !left.term_eq(right),
            CompareOp::ExactNe => left != right,
            CompareOp::Lt => left.term_cmp(right) == Ordering::Less,
            CompareOp::Le => left.term_cmp(right) != Ordering::Greater,
            CompareOp::Gt => left.term_cmp(right) == Ordering::Greater,
            CompareOp::Ge => left.term_cmp(right) != Ordering::Less,
        }
    }
}

impl FromStr for CompareOp {
    type Err = TqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" | "eq" => Ok(CompareOp::Eq),
            "=:=" | "===" | "exact_eq" => Ok(CompareOp::ExactEq),
            "/=" | "!=" | "ne" => Ok(CompareOp::Ne),
            "=/=" | "!==" | "exact_ne" => Ok(CompareOp::ExactNe),
            "<" | "lt" => Ok(CompareOp::Lt),
            "=<" | "<=" | "le" => Ok(CompareOp::Le),
            ">" | "gt" => Ok(CompareOp::Gt),
            ">=" | "ge" => Ok(CompareOp::Ge),
            other => Err(TqlError::Schema(format!(
                "unknown comparison operator '{other}'"
            ))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
    Xor,
    Not,
}

impl FromStr for BoolOp {
    type Err = TqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "and" | "andalso" => Ok(BoolOp::And),
            "or" | "orelse" => Ok(BoolOp::Or),
            "xor" => Ok(BoolOp::Xor),
            "not" => Ok(BoolOp::Not),
            other => Err(TqlError::Schema(format!("unknown boolean operator '{other}'"))),
        }
    }
}

/// A guard written against attribute names.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// `attribute op value`
    Compare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    /// `left op right`, both attributes
    CompareAttributes {
        left: String,
        op: CompareOp,
        right: String,
    },
    /// Conjunction; must not be empty (rejected at compile time)
    And(Vec<Guard>),
    /// Disjunction; must not be empty (rejected at compile time)
    Or(Vec<Guard>),
    Xor(Box<Guard>, Box<Guard>),
    Not(Box<Guard>),
    Const(bool),
}

impl Guard {
    pub fn compare(attribute: impl Into<String>, op: CompareOp, value: impl IntoValue) -> Self {
        Guard::Compare {
            attribute: attribute.into(),
            op,
            value: value.into_value(),
        }
    }

    pub fn attributes(left: impl Into<String>, op: CompareOp, right: impl Into<String>) -> Self {
        Guard::CompareAttributes {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Combine guards with a connective, checking operand counts.
    ///
    /// `not` takes one guard, `xor` two, `and`/`or` at least one.
    pub fn logical(op: BoolOp, mut guards: Vec<Guard>) -> TqlResult<Self> {
        match (op, guards.len()) {
            (BoolOp::Not, 1) => Ok(Guard::Not(Box::new(guards.remove(0)))),
            (BoolOp::Xor, 2) => {
                let right = guards.remove(1);
                let left = guards.remove(0);
                Ok(Guard::Xor(Box::new(left), Box::new(right)))
            }
            (BoolOp::And, n) if n > 0 => Ok(Guard::And(guards)),
            (BoolOp::Or, n) if n > 0 => Ok(Guard::Or(guards)),
            (op, n) => Err(TqlError::Schema(format!(
                "{op:?} cannot take {n} operand(s)"
            ))),
        }
    }

    pub fn and(self, other: Guard) -> Self {
        match self {
            Guard::And(mut guards) => {
                guards.push(other);
                Guard::And(guards)
            }
            guard => Guard::And(vec![guard, other]),
        }
    }

    pub fn or(self, other: Guard) -> Self {
        match self {
            Guard::Or(mut guards) => {
                guards.push(other);
                Guard::Or(guards)
            }
            guard => Guard::Or(vec![guard, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Guard::Not(Box::new(self))
    }
}

/// A `select` condition: `{attribute, operator, value}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, op: CompareOp, value: impl IntoValue) -> Self {
        Self {
            attribute: attribute.into(),
            op,
            value: value.into_value(),
        }
    }

    /// Build a condition from an operator spelling such as `">"` or `"=<"`.
    pub fn parse(attribute: impl Into<String>, op: &str, value: impl IntoValue) -> TqlResult<Self> {
        Ok(Self::new(attribute, op.parse()?, value))
    }
}

impl From<Condition> for Guard {
    fn from(c: Condition) -> Self {
        Guard::Compare {
            attribute: c.attribute,
            op: c.op,
            value: c.value,
        }
    }
}

/// Compiled operand: a placeholder or a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Var(VarId),
    Const(Value),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{var}"),
            Operand::Const(v) => write!(f, "{v}"),
        }
    }
}

/// Compiled guard, evaluated by the store against placeholder bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardExpr {
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    And(Vec<GuardExpr>),
    Or(Vec<GuardExpr>),
    Xor(Box<GuardExpr>, Box<GuardExpr>),
    Not(Box<GuardExpr>),
    Const(bool),
}

impl GuardExpr {
    /// Evaluate against a binding lookup.
    ///
    /// An unbound placeholder makes its comparison false, like a failing guard
    /// in the store.
    pub fn evaluate<'v, F>(&self, lookup: &F) -> bool
    where
        F: Fn(VarId) -> Option<&'v Value>,
    {
        match self {
            GuardExpr::Compare { left, op, right } => {
                match (resolve_operand(left, lookup), resolve_operand(right, lookup)) {
                    (Some(l), Some(r)) => op.apply(l, r),
                    _ => false,
                }
            }
            GuardExpr::And(guards) => guards.iter().all(|g| g.evaluate(lookup)),
            GuardExpr::Or(guards) => guards.iter().any(|g| g.evaluate(lookup)),
            GuardExpr::Xor(a, b) => a.evaluate(lookup) != b.evaluate(lookup),
            GuardExpr::Not(g) => !g.evaluate(lookup),
            GuardExpr::Const(b) => *b,
        }
    }
}

fn resolve_operand<'a, 'v, F>(operand: &'a Operand, lookup: &F) -> Option<&'a Value>
where
    'v: 'a,
    F: Fn(VarId) -> Option<&'v Value>,
{
    match operand {
        Operand::Var(var) => lookup(*var),
        Operand::Const(v) => Some(v),
    }
}

impl fmt::Display for GuardExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardExpr::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            GuardExpr::And(guards) => write_joined(f, guards, " and "),
            GuardExpr::Or(guards) => write_joined(f, guards, " or "),
            GuardExpr::Xor(a, b) => write!(f, "({a} xor {b})"),
            GuardExpr::Not(g) => write!(f, "not ({g})"),
            GuardExpr::Const(b) => write!(f, "{b}"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, guards: &[GuardExpr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, g) in guards.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{g}")?;
    }
    write!(f, ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbolic_and_word_spellings() {
        assert_eq!(">".parse::<CompareOp>().unwrap(), CompareOp::Gt);
        assert_eq!("=<".parse::<CompareOp>().unwrap(), CompareOp::Le);
        assert_eq!("<=".parse::<CompareOp>().unwrap(), CompareOp::Le);
        assert_eq!("=:=".parse::<CompareOp>().unwrap(), CompareOp::ExactEq);
        assert_eq!("!=".parse::<CompareOp>().unwrap(), CompareOp::Ne);
        assert!("~".parse::<CompareOp>().is_err());
        assert_eq!("andalso".parse::<BoolOp>().unwrap(), BoolOp::And);
        assert_eq!("orelse".parse::<BoolOp>().unwrap(), BoolOp::Or);
    }

    #[test]
    fn coercing_vs_exact_equality() {
        let one = Value::Int64(1);
        let one_f = Value::Float64(1.0);
        assert!(CompareOp::Eq.apply(&one, &one_f));
        assert!(!CompareOp::ExactEq.apply(&one, &one_f));
        assert!(CompareOp::ExactNe.apply(&one, &one_f));
        assert!(!CompareOp::Ne.apply(&one, &one_f));
    }

    #[test]
    fn logical_checks_operand_count() {
        let g = Guard::compare("age", CompareOp::Gt, 1);
        assert!(Guard::logical(BoolOp::Not, vec![g.clone(), g.clone()]).is_err());
        assert!(Guard::logical(BoolOp::And, vec![]).is_err());
        assert!(matches!(
            Guard::logical(BoolOp::Xor, vec![g.clone(), g.clone()]).unwrap(),
            Guard::Xor(_, _)
        ));
    }

    #[test]
    fn and_flattens() {
        let g = Guard::compare("a", CompareOp::Eq, 1)
            .and(Guard::compare("b", CompareOp::Eq, 2))
            .and(Guard::compare("c", CompareOp::Eq, 3));
        match g {
            Guard::And(parts) => assert_eq!(parts.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn evaluate_against_bindings() {
        let bindings = [Value::Int64(10), Value::Int32(40)];
        let lookup = |var: VarId| bindings.get(var.position());
        let expr = GuardExpr::And(vec![
            GuardExpr::Compare {
                left: Operand::Var(VarId(2)),
                op: CompareOp::Gt,
                right: Operand::Const(Value::Int64(35)),
            },
            GuardExpr::Not(Box::new(GuardExpr::Compare {
                left: Operand::Var(VarId(1)),
                op: CompareOp::Eq,
                right: Operand::Const(Value::Int64(3)),
            })),
        ]);
        assert!(expr.evaluate(&lookup));
        assert_eq!(expr.to_string(), "($2 > 35 and not ($1 == 3))");
    }

    #[test]
    fn unbound_var_fails_comparison() {
        let lookup = |_: VarId| -> Option<&'static Value> { None };
        let expr = GuardExpr::Compare {
            left: Operand::Var(VarId(9)),
            op: CompareOp::Eq,
            right: Operand::Const(Value::Null),
        };
        assert!(!expr.evaluate(&lookup));
    }
}
