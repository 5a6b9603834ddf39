//! Match Spec Evaluation
//!
//! Store-side interpretation of compiled heads, guards and result templates.
//! A placeholder appearing at several positions must bind the same value at
//! each of them.

use crate::pattern::{GuardExpr, MatchPattern, MatchSpec, Operand, PatternElement, ResultTemplate, VarId};
use crate::value::Value;
use smallvec::SmallVec;

/// Placeholder bindings produced by a successful head match.
#[derive(Debug, Default)]
pub struct Bindings<'v> {
    slots: SmallVec<[(VarId, &'v Value); 8]>,
}

impl<'v> Bindings<'v> {
    pub fn get(&self, var: VarId) -> Option<&'v Value> {
        self.slots
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, value)| *value)
    }

    /// Bind `var`, or check consistency with an earlier binding.
    fn bind(&mut self, var: VarId, value: &'v Value) -> bool {
        match self.get(var) {
            Some(existing) => existing == value,
            None => {
                self.slots.push((var, value));
                true
            }
        }
    }

    fn resolve(&self, operand: &Operand) -> Option<Value> {
        match operand {
            Operand::Var(var) => self.get(*var).cloned(),
            Operand::Const(v) => Some(v.clone()),
        }
    }
}

/// Match tuple values (tag excluded) against a head.
///
/// Literals compare with exact equality.
pub fn bind<'v>(head: &MatchPattern, values: &'v [Value]) -> Option<Bindings<'v>> {
    if head.elements.len() != values.len() {
        return None;
    }
    let mut bindings = Bindings::default();
    for (element, value) in head.elements.iter().zip(values) {
        let ok = match element {
            PatternElement::Literal(literal) => literal == value,
            PatternElement::Wildcard => true,
            PatternElement::Placeholder(var) => bindings.bind(*var, value),
        };
        if !ok {
            return None;
        }
    }
    Some(bindings)
}

/// `true` when the head matches.
pub fn matches_head(head: &MatchPattern, values: &[Value]) -> bool {
    bind(head, values).is_some()
}

/// `true` when every guard holds.
pub fn guards_hold(guards: &[GuardExpr], bindings: &Bindings<'_>) -> bool {
    let lookup = |var: VarId| bindings.get(var);
    guards.iter().all(|g| g.evaluate(&lookup))
}

/// Apply a full match spec to one tuple, returning its result row.
///
/// Projections that reference an unbound placeholder yield no row.
pub fn apply_spec(spec: &MatchSpec, values: &[Value]) -> Option<Vec<Value>> {
    let bindings = bind(&spec.head, values)?;
    if !guards_hold(&spec.guards, &bindings) {
        return None;
    }
    match &spec.result {
        ResultTemplate::Record => Some(values.to_vec()),
        ResultTemplate::Project(operands) => operands
            .iter()
            .map(|op| bindings.resolve(op))
            .collect(),
    }
}
