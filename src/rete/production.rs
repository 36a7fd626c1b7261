//! Compiled productions
//!
//! A production is the unit the axiom compiler hands to the network builder:
//! a left-hand side of triple patterns, guard/compute builtins, and
//! right-hand-side templates asserted on every complete match. Productions
//! are append-only after compilation; the network never mutates them.

use std::fmt;

use crate::term::TermId;

/// One slot of a pattern: a constant or a variable index
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
    /// A fixed term
    Const(TermId),
    /// A production-scoped variable
    Var(u8),
}

impl Slot {
    /// The variable index, if this slot is one
    pub fn as_var(self) -> Option<u8> {
        match self {
            Slot::Var(v) => Some(v),
            Slot::Const(_) => None,
        }
    }
}

/// A triple pattern with constant or variable slots
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Pattern {
    pub subject: Slot,
    pub predicate: Slot,
    pub object: Slot,
}

impl Pattern {
    pub fn new(subject: Slot, predicate: Slot, object: Slot) -> Self {
        Pattern {
            subject,
            predicate,
            object,
        }
    }

    /// The three slots in order
    pub fn slots(&self) -> [Slot; 3] {
        [self.subject, self.predicate, self.object]
    }

    /// Variables referenced by this pattern, with duplicates
    pub fn vars(&self) -> impl Iterator<Item = u8> {
        self.slots().into_iter().filter_map(Slot::as_var)
    }
}

/// Pure functions evaluable inside a production body
///
/// Comparisons drop the tuple on failure; arithmetic ops may bind their last
/// argument when it arrives unbound. The set mirrors the SWRL builtin core.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BuiltinOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    StringLength,
    Contains,
    StartsWith,
    Matches,
}

impl BuiltinOp {
    /// Whether this op may bind its final argument
    pub fn binds_result(&self) -> bool {
        matches!(
            self,
            BuiltinOp::Add
                | BuiltinOp::Subtract
                | BuiltinOp::Multiply
                | BuiltinOp::Divide
                | BuiltinOp::StringLength
        )
    }

    /// SWRL builtin local name
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinOp::Equal => "equal",
            BuiltinOp::NotEqual => "notEqual",
            BuiltinOp::LessThan => "lessThan",
            BuiltinOp::LessThanOrEqual => "lessThanOrEqual",
            BuiltinOp::GreaterThan => "greaterThan",
            BuiltinOp::GreaterThanOrEqual => "greaterThanOrEqual",
            BuiltinOp::Add => "add",
            BuiltinOp::Subtract => "subtract",
            BuiltinOp::Multiply => "multiply",
            BuiltinOp::Divide => "divide",
            BuiltinOp::StringLength => "stringLength",
            BuiltinOp::Contains => "contains",
            BuiltinOp::StartsWith => "startsWith",
            BuiltinOp::Matches => "matches",
        }
    }
}

impl fmt::Display for BuiltinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "swrlb:{}", self.name())
    }
}

/// A builtin invocation inside a production body
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BuiltinCall {
    pub op: BuiltinOp,
    pub args: Vec<Slot>,
}

impl BuiltinCall {
    pub fn new(op: BuiltinOp, args: Vec<Slot>) -> Self {
        BuiltinCall { op, args }
    }
}

/// A compiled production
#[derive(Clone, Debug)]
pub struct Production {
    /// Stable id assigned at compilation
    pub id: usize,
    /// Rule-template name for diagnostics (e.g. `cax-sco#4`)
    pub name: String,
    /// Number of variables the body binds
    pub var_count: u8,
    /// Triple patterns joined left to right
    pub lhs: Vec<Pattern>,
    /// Builtins evaluated after the joins, in order
    pub builtins: Vec<BuiltinCall>,
    /// Templates instantiated per complete match
    pub rhs: Vec<Pattern>,
}

impl Production {
    /// Variables bound by the triple patterns alone
    pub fn pattern_vars(&self) -> impl Iterator<Item = u8> + '_ {
        self.lhs.iter().flat_map(|p| p.vars())
    }
}
