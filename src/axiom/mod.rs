//! Abstract axiom IR
//!
//! The only input shape the core accepts. Surface parsers (DL text, SWRL,
//! annotation extractors) are external translators targeting these variants;
//! the compiler in [`crate::axiom::compiler`] lowers them to productions and
//! ground facts. Concept expressions are a tagged sum with exhaustive
//! matching, not an object hierarchy, so compiler passes stay plain `match`
//! blocks.

use crate::rete::BuiltinOp;
use crate::term::TermId;

pub mod compiler;

pub use compiler::{AxiomCompiler, CompiledAxioms};

/// A class expression
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Concept {
    /// A named class
    Atomic(TermId),
    /// `owl:Thing`
    Thing,
    /// `owl:Nothing`
    Nothing,
    /// Intersection
    And(Box<Concept>, Box<Concept>),
    /// Union
    Or(Box<Concept>, Box<Concept>),
    /// Complement
    Not(Box<Concept>),
    /// Existential restriction `∃R.C`
    Some(TermId, Box<Concept>),
    /// Universal restriction `∀R.C`
    Only(TermId, Box<Concept>),
    /// `∃R.{i}`
    HasValue(TermId, TermId),
    /// `∃R.Self`
    HasSelf(TermId),
    /// `≥ n R.C`
    MinCard(u32, TermId, Box<Concept>),
    /// `≤ n R.C`
    MaxCard(u32, TermId, Box<Concept>),
    /// `= n R.C`
    ExactCard(u32, TermId, Box<Concept>),
    /// Enumeration `{i₁, …, iₙ}`
    OneOf(Vec<TermId>),
}

impl Concept {
    /// Convenience constructor for a named class
    pub fn atomic(id: TermId) -> Self {
        Concept::Atomic(id)
    }

    /// Intersection of two concepts
    pub fn and(a: Concept, b: Concept) -> Self {
        Concept::And(Box::new(a), Box::new(b))
    }

    /// Union of two concepts
    pub fn or(a: Concept, b: Concept) -> Self {
        Concept::Or(Box::new(a), Box::new(b))
    }

    /// Existential restriction
    pub fn some(role: TermId, filler: Concept) -> Self {
        Concept::Some(role, Box::new(filler))
    }

    /// Universal restriction
    pub fn only(role: TermId, filler: Concept) -> Self {
        Concept::Only(role, Box::new(filler))
    }
}

/// An argument of a SWRL atom
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SwrlArg {
    /// A rule variable, scoped to the rule
    Var(String),
    /// A fixed term (individual or literal)
    Term(TermId),
}

/// One atom of a SWRL rule body or head
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SwrlAtom {
    /// `C(x)` with a named class
    Class { concept: TermId, arg: SwrlArg },
    /// `R(x, y)` over individuals
    Role {
        role: TermId,
        subject: SwrlArg,
        object: SwrlArg,
    },
    /// `R(x, v)` with a literal value
    Data {
        role: TermId,
        subject: SwrlArg,
        value: SwrlArg,
    },
    /// `sameAs(x, y)`
    SameAs(SwrlArg, SwrlArg),
    /// `differentFrom(x, y)`
    DifferentFrom(SwrlArg, SwrlArg),
    /// A builtin predicate over bound arguments
    Builtin { op: BuiltinOp, args: Vec<SwrlArg> },
}

/// A single axiom
///
/// Ground assertions, schema axioms, role characteristics and SWRL rules in
/// one tagged sum. Source tags are supplied per load call, not per variant.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Axiom {
    /// `C(i)`
    ClassAssertion { individual: TermId, concept: Concept },
    /// `R(a, b)`
    RoleAssertion {
        subject: TermId,
        role: TermId,
        object: TermId,
    },
    /// `R(a, v)` with a literal value
    DataAssertion {
        subject: TermId,
        role: TermId,
        value: TermId,
    },
    /// `C ⊑ D`
    SubClassOf { sub: Concept, sup: Concept },
    /// `C ≡ D`
    EquivClasses(Concept, Concept),
    /// Pairwise disjointness over two or more concepts
    DisjointClasses(Vec<Concept>),
    /// `R ⊑ S`
    SubRole { sub: TermId, sup: TermId },
    /// `R ≡ S`
    EquivRoles(TermId, TermId),
    /// `Disjoint(R, S)`
    DisjointRoles(TermId, TermId),
    /// `R ≡ S⁻`
    InverseRoles(TermId, TermId),
    /// `R₁ ∘ … ∘ Rₙ ⊑ S`
    RoleChain { chain: Vec<TermId>, sup: TermId },
    /// `∃R.⊤ ⊑ C`
    RoleDomain { role: TermId, domain: Concept },
    /// `⊤ ⊑ ∀R.C`
    RoleRange { role: TermId, range: Concept },
    /// `Functional(R)`
    FunctionalRole(TermId),
    /// `InverseFunctional(R)`
    InverseFunctionalRole(TermId),
    /// `Transitive(R)`
    TransitiveRole(TermId),
    /// `Symmetric(R)`
    SymmetricRole(TermId),
    /// `Asymmetric(R)`
    AsymmetricRole(TermId),
    /// `Reflexive(R)`
    ReflexiveRole(TermId),
    /// `Irreflexive(R)`
    IrreflexiveRole(TermId),
    /// All listed individuals denote one thing
    SameAs(Vec<TermId>),
    /// All listed individuals are pairwise distinct
    DifferentFrom(Vec<TermId>),
    /// `HasKey(C, k₁ … kₙ)`
    HasKey { class: Concept, keys: Vec<TermId> },
    /// A datatype name aliasing another datatype
    DatatypeDefinition { name: TermId, datatype: TermId },
    /// A SWRL rule: body implies head
    SwrlRule {
        body: Vec<SwrlAtom>,
        head: Vec<SwrlAtom>,
    },
}
