//! The term store: string and literal interning
//!
//! Interning is monotonic and deterministic: byte-equal inputs map to the
//! same id for the lifetime of the store, and ids are handed out densely in
//! first-seen order. Literal interning keys on the canonical form, so
//! spelling variants of the same value collapse to one id.

use std::cmp::Ordering;
use std::sync::Arc;

use fnv::FnvHashMap;

use crate::term::literal::{cmp_literals, Datatype, Literal};
use crate::term::{Term, TermId};

/// Interner for names and literals
#[derive(Debug, Default)]
pub struct TermStore {
    terms: Vec<Term>,
    names: FnvHashMap<Arc<str>, TermId>,
    literals: FnvHashMap<(Datatype, String), TermId>,
    datatype_aliases: FnvHashMap<String, String>,
}

impl TermStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a named term, returning its id
    pub fn intern_name(&mut self, iri: &str) -> TermId {
        if let Some(&id) = self.names.get(iri) {
            return id;
        }
        let arc: Arc<str> = Arc::from(iri);
        let id = TermId::from_raw(self.terms.len() as u32);
        self.terms.push(Term::Name(arc.clone()));
        self.names.insert(arc, id);
        id
    }

    /// Intern a typed literal, returning its id
    ///
    /// The datatype IRI is resolved through any aliases registered via
    /// [`TermStore::define_datatype_alias`]. Spelling variants of one value
    /// (`"1.0"` vs `"1.00"` decimal) intern to the same id.
    pub fn intern_literal(&mut self, lexical: &str, datatype_iri: &str) -> TermId {
        let resolved = self
            .datatype_aliases
            .get(datatype_iri)
            .cloned()
            .unwrap_or_else(|| datatype_iri.to_string());
        let lit = Literal::parse(lexical, &resolved);
        let key = (lit.datatype().clone(), lit.canonical().to_string());
        if let Some(&id) = self.literals.get(&key) {
            return id;
        }
        let id = TermId::from_raw(self.terms.len() as u32);
        self.terms.push(Term::Literal(lit));
        self.literals.insert(key, id);
        id
    }

    /// Register a datatype alias (from a `DatatypeDefinition` axiom)
    pub fn define_datatype_alias(&mut self, name_iri: &str, target_iri: &str) {
        // Resolve chains at definition time so lookups stay one hop
        let target = self
            .datatype_aliases
            .get(target_iri)
            .cloned()
            .unwrap_or_else(|| target_iri.to_string());
        self.datatype_aliases.insert(name_iri.to_string(), target);
    }

    /// Look up an id without interning
    pub fn find_name(&self, iri: &str) -> Option<TermId> {
        self.names.get(iri).copied()
    }

    /// Look up a literal id without interning
    pub fn find_literal(&self, lexical: &str, datatype_iri: &str) -> Option<TermId> {
        let resolved = self
            .datatype_aliases
            .get(datatype_iri)
            .map(String::as_str)
            .unwrap_or(datatype_iri);
        let lit = Literal::parse(lexical, resolved);
        let key = (lit.datatype().clone(), lit.canonical().to_string());
        self.literals.get(&key).copied()
    }

    /// Resolve an id back to its term
    pub fn lookup(&self, id: TermId) -> &Term {
        &self.terms[id.index()]
    }

    /// Whether the id denotes a literal
    pub fn is_literal(&self, id: TermId) -> bool {
        self.terms[id.index()].is_literal()
    }

    /// The literal behind an id, if it is one
    pub fn literal(&self, id: TermId) -> Option<&Literal> {
        self.terms[id.index()].as_literal()
    }

    /// Compare two interned literals by value
    ///
    /// `None` means incomparable (different value spaces), or that one of the
    /// ids is not a literal at all.
    pub fn cmp_literal(&self, a: TermId, b: TermId) -> Option<Ordering> {
        let la = self.literal(a)?;
        let lb = self.literal(b)?;
        cmp_literals(la, lb)
    }

    /// Number of interned terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Render an id for display and logs
    pub fn display(&self, id: TermId) -> String {
        match self.lookup(id) {
            Term::Name(iri) => iri.to_string(),
            Term::Literal(lit) => lit.lexical().to_string(),
        }
    }

    /// Order two ids for ORDER BY: literals by value, names by IRI
    ///
    /// Mixed name/literal pairs and incomparable literals fall back to
    /// lexical text so sorting stays total and deterministic.
    pub fn ordering_key_cmp(&self, a: TermId, b: TermId) -> Ordering {
        match (self.lookup(a), self.lookup(b)) {
            (Term::Literal(la), Term::Literal(lb)) => {
                cmp_literals(la, lb).unwrap_or_else(|| la.lexical().cmp(lb.lexical()))
            }
            (Term::Name(na), Term::Name(nb)) => na.as_ref().cmp(nb.as_ref()),
            (Term::Name(_), Term::Literal(_)) => Ordering::Less,
            (Term::Literal(_), Term::Name(_)) => Ordering::Greater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab;

    #[test]
    fn test_intern_is_idempotent() {
        let mut store = TermStore::new();
        let a = store.intern_name("http://example.org/A");
        let b = store.intern_name("http://example.org/A");
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_literal_normalisation_shares_id() {
        let mut store = TermStore::new();
        let a = store.intern_literal("1.0", vocab::XSD_DECIMAL);
        let b = store.intern_literal("1.00", vocab::XSD_DECIMAL);
        assert_eq!(a, b);
    }

    #[test]
    fn test_find_does_not_intern() {
        let mut store = TermStore::new();
        assert!(store.find_name("http://example.org/missing").is_none());
        let id = store.intern_name("http://example.org/present");
        assert_eq!(store.find_name("http://example.org/present"), Some(id));
    }

    #[test]
    fn test_datatype_alias_resolution() {
        let mut store = TermStore::new();
        store.define_datatype_alias("http://example.org/age", vocab::XSD_INTEGER);
        let a = store.intern_literal("42", "http://example.org/age");
        let b = store.intern_literal("42", vocab::XSD_INTEGER);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cmp_literal_incomparable() {
        let mut store = TermStore::new();
        let n = store.intern_literal("5", vocab::XSD_INTEGER);
        let name = store.intern_name("http://example.org/five");
        assert_eq!(store.cmp_literal(n, name), None);
    }
}
