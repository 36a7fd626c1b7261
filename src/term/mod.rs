//! Term representations
//!
//! Every constant the reasoner touches (concept name, role name, individual,
//! literal) is interned to a dense 32-bit [`TermId`]. Named terms and literals
//! share the id range; the owning [`TermStore`] knows which ids denote
//! literals. Triples are three ids, which keeps the fact store indices and
//! the RETE token memories compact.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod interner;
mod literal;

pub use interner::TermStore;
pub use literal::{cmp_literals, Datatype, Literal, LiteralValue};

/// Dense id of an interned term
///
/// Ids are never recycled within a reasoner lifetime; two byte-equal inputs
/// intern to the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(u32);

impl TermId {
    /// Construct from a raw index (used by the term store)
    pub(crate) fn from_raw(raw: u32) -> Self {
        TermId(raw)
    }

    /// The raw index value
    pub fn raw(self) -> u32 {
        self.0
    }

    /// The index into the term table
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// An interned term: an IRI-like name or a typed literal
#[derive(Clone, Debug)]
pub enum Term {
    /// A named term (IRI)
    Name(Arc<str>),
    /// A typed literal
    Literal(Literal),
}

impl Term {
    /// The IRI if this is a named term
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Term::Name(iri) => Some(iri),
            Term::Literal(_) => None,
        }
    }

    /// The literal if this is a literal term
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(lit) => Some(lit),
            Term::Name(_) => None,
        }
    }

    /// Whether this term is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Name(iri) => write!(f, "<{}>", iri),
            Term::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

/// A triple of interned terms
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: TermId,
    pub predicate: TermId,
    pub object: TermId,
}

impl Triple {
    pub fn new(subject: TermId, predicate: TermId, object: TermId) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }

    /// The three slots in subject, predicate, object order
    pub fn slots(&self) -> [TermId; 3] {
        [self.subject, self.predicate, self.object]
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:?} {:?} {:?})",
            self.subject, self.predicate, self.object
        )
    }
}
