//! Match Compiler — attribute names to positional match specs.
//!
//! 1. Each attribute, in schema order, becomes a literal (bound by the caller),
//!    a plain wildcard ([`Pattern::ignore`]) or the placeholder of its position.
//! 2. Guard attribute names are replaced by the operand of their position; a
//!    plain wildcard is not addressable and fails with `UnboundGuardAttribute`.
//! 3. The result template defaults to the whole record or projects the
//!    requested attributes.

use crate::error::{TqlError, TqlResult};
use crate::pattern::guard::{Condition, Guard, GuardExpr, Operand};
use crate::pattern::{FieldSpec, MatchPattern, MatchSpec, Pattern, PatternElement, ResultTemplate, VarId};
use crate::schema::TableSchema;
use smallvec::SmallVec;
use tracing::debug;

/// Compile a partial record pattern and its guards.
///
/// `projection` lists attribute names to return instead of whole records.
pub fn compile_match(
    schema: &TableSchema,
    pattern: &Pattern,
    guards: &[Guard],
    projection: Option<&[&str]>,
) -> TqlResult<MatchSpec> {
    if pattern.table() != schema.name() {
        return Err(TqlError::Schema(format!(
            "pattern for table '{}' used against table '{}'",
            pattern.table(),
            schema.name()
        )));
    }

    let mut elements: SmallVec<[PatternElement; 8]> = (0..schema.arity())
        .map(|i| PatternElement::Placeholder(VarId::for_position(i)))
        .collect();
    for (attribute, spec) in pattern.fields() {
        let position = schema.require_position(attribute)?;
        elements[position] = match spec {
            FieldSpec::Bound(value) => PatternElement::Literal(value.clone()),
            FieldSpec::Ignore => PatternElement::Wildcard,
        };
    }

    let head = MatchPattern {
        table: schema.name().to_string(),
        elements,
    };
    finish(schema, head, guards.iter(), projection)
}

/// Compile `select` conditions: every attribute a placeholder, conditions
/// joined as a conjunction of guards.
pub fn compile_conditions(
    schema: &TableSchema,
    conditions: &[Condition],
    projection: Option<&[&str]>,
) -> TqlResult<MatchSpec> {
    let head = MatchPattern::all_placeholders(schema.name(), schema.arity());
    let guards: Vec<Guard> = conditions.iter().cloned().map(Guard::from).collect();
    finish(schema, head, guards.iter(), projection)
}

fn finish<'g>(
    schema: &TableSchema,
    head: MatchPattern,
    guards: impl Iterator<Item = &'g Guard>,
    projection: Option<&[&str]>,
) -> TqlResult<MatchSpec> {
    let scope = Scope {
        schema,
        head: &head,
    };
    let guards = guards
        .map(|g| scope.compile_guard(g))
        .collect::<TqlResult<Vec<_>>>()?;
    let result = match projection {
        None => ResultTemplate::Record,
        Some(attributes) => ResultTemplate::Project(
            attributes
                .iter()
                .map(|a| scope.operand(a))
                .collect::<TqlResult<Vec<_>>>()?,
        ),
    };

    let spec = MatchSpec {
        head,
        guards,
        result,
    };
    debug!(table = %schema.name(), head = %spec.head, guards = spec.guards.len(), "compiled match spec");
    Ok(spec)
}

/// Attribute resolution against a compiled head.
struct Scope<'a> {
    schema: &'a TableSchema,
    head: &'a MatchPattern,
}

impl Scope<'_> {
    fn operand(&self, attribute: &str) -> TqlResult<Operand> {
        let position = self.schema.require_position(attribute)?;
        match &self.head.elements[position] {
            PatternElement::Placeholder(var) => Ok(Operand::Var(*var)),
            PatternElement::Literal(value) => Ok(Operand::Const(value.clone())),
            PatternElement::Wildcard => Err(TqlError::UnboundGuardAttribute {
                table: self.schema.name().to_string(),
                attribute: attribute.to_string(),
            }),
        }
    }

    fn compile_guard(&self, guard: &Guard) -> TqlResult<GuardExpr> {
        Ok(match guard {
            Guard::Compare {
                attribute,
                op,
                value,
            } => GuardExpr::Compare {
                left: self.operand(attribute)?,
                op: *op,
                right: Operand::Const(value.clone()),
            },
            Guard::CompareAttributes { left, op, right } => GuardExpr::Compare {
                left: self.operand(left)?,
                op: *op,
                right: self.operand(right)?,
            },
            Guard::And(guards) => GuardExpr::And(self.compile_all(guards)?),
            Guard::Or(guards) => GuardExpr::Or(self.compile_all(guards)?),
            Guard::Xor(a, b) => GuardExpr::Xor(
                Box::new(self.compile_guard(a)?),
                Box::new(self.compile_guard(b)?),
            ),
            Guard::Not(g) => GuardExpr::Not(Box::new(self.compile_guard(g)?)),
            Guard::Const(b) => GuardExpr::Const(*b),
        })
    }

    /// Operands of `and`/`or`; an empty list is rejected like [`Guard::logical`] does.
    fn compile_all(&self, guards: &[Guard]) -> TqlResult<Vec<GuardExpr>> {
        if guards.is_empty() {
            return Err(TqlError::Schema(format!(
                "empty and/or guard on table '{}'",
                self.schema.name()
            )));
        }
        guards.iter().map(|g| self.compile_guard(g)).collect()
    }
}
