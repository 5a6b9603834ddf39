//! Match patterns — the store's positional query language.
//!
//! ```text
//! Pattern (by attribute name) + Guard (by attribute name)
//!          → compiler → MatchSpec { head, guards, result }
//!          → StoreBackend::select / match_object
//! ```
//!
//! Position `i` of a compiled head corresponds to attribute `i` of the table.
//! Unmentioned attributes become placeholders (`$1`, `$2`, ...) so guards and
//! projections can address them; [`Pattern::ignore`] asks for an untracked
//! wildcard instead.

pub mod compiler;
pub mod guard;

pub use compiler::{compile_conditions, compile_match};
pub use guard::{BoolOp, CompareOp, Condition, Guard, GuardExpr, Operand};

use crate::api::IntoValue;
use crate::value::Value;
use smallvec::SmallVec;
use std::fmt;

/// Placeholder variable. `VarId(n)` is bound to attribute `n - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

impl VarId {
    /// Placeholder for a zero-based attribute position.
    pub fn for_position(position: usize) -> Self {
        VarId(position as u32 + 1)
    }

    /// Zero-based attribute position this placeholder binds.
    pub fn position(self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// One position of a compiled head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternElement {
    /// Must equal this value exactly
    Literal(Value),
    /// Matches anything, not addressable
    Wildcard,
    /// Matches anything, bound for guards and projections
    Placeholder(VarId),
}

/// Tuple-shaped template: table tag + one element per attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    pub table: String,
    pub elements: SmallVec<[PatternElement; 8]>,
}

impl MatchPattern {
    /// Every position a placeholder.
    pub fn all_placeholders(table: impl Into<String>, arity: usize) -> Self {
        Self {
            table: table.into(),
            elements: (0..arity)
                .map(|i| PatternElement::Placeholder(VarId::for_position(i)))
                .collect(),
        }
    }

    /// `true` when no position constrains the match.
    pub fn is_unconstrained(&self) -> bool {
        self.elements
            .iter()
            .all(|e| !matches!(e, PatternElement::Literal(_)))
    }

    /// Literal bound at the key position, if any.
    pub fn bound_key(&self) -> Option<&Value> {
        match self.elements.first() {
            Some(PatternElement::Literal(v)) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}", self.table)?;
        for element in &self.elements {
            match element {
                PatternElement::Literal(v) => write!(f, ", {v}")?,
                PatternElement::Wildcard => write!(f, ", _")?,
                PatternElement::Placeholder(var) => write!(f, ", {var}")?,
            }
        }
        write!(f, "}}")
    }
}

/// Shape of each result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultTemplate {
    /// The whole matched tuple
    Record,
    /// These operands, in order (placeholders or constants)
    Project(Vec<Operand>),
}

/// The (pattern, guards, result) triple consumed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSpec {
    pub head: MatchPattern,
    pub guards: Vec<GuardExpr>,
    pub result: ResultTemplate,
}

impl MatchSpec {
    pub fn table(&self) -> &str {
        &self.head.table
    }

    /// `true` when every row comes back as a full record.
    pub fn returns_records(&self) -> bool {
        self.result == ResultTemplate::Record
    }
}

/// How the caller constrained one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSpec {
    /// Literal match
    Bound(Value),
    /// Plain wildcard, not addressable by guards
    Ignore,
}

/// Partial record pattern keyed by attribute name.
///
/// Attributes not mentioned compile to placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    table: String,
    fields: Vec<(String, FieldSpec)>,
}

impl Pattern {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Require `attribute` to equal `value`.
    pub fn bind(mut self, attribute: impl Into<String>, value: impl IntoValue) -> Self {
        self.set(attribute.into(), FieldSpec::Bound(value.into_value()));
        self
    }

    /// Leave `attribute` as a plain wildcard.
    pub fn ignore(mut self, attribute: impl Into<String>) -> Self {
        self.set(attribute.into(), FieldSpec::Ignore);
        self
    }

    /// Last setting for an attribute wins.
    fn set(&mut self, attribute: String, spec: FieldSpec) {
        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == attribute) {
            slot.1 = spec;
        } else {
            self.fields.push((attribute, spec));
        }
    }

    pub fn field(&self, attribute: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, spec)| spec)
    }

    pub(crate) fn fields(&self) -> &[(String, FieldSpec)] {
        &self.fields
    }
}
