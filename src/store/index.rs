//! Index permutations over the fact store
//!
//! Five two-level hash indices (SPO, POS, OSP, PSO, SOP) give O(1) point
//! lookup for every bound-slot shape: one bound slot reads an outer map, two
//! bound slots read outer-then-inner. Entries are append-only; liveness and
//! epoch visibility are the record table's concern, so tombstoned triples
//! stay reachable for older snapshots. `IndexMap` keeps enumeration in
//! insertion order, which keeps unordered query results deterministic across
//! runs.

use indexmap::IndexMap;

use crate::term::{TermId, Triple};

use super::TripleId;

/// One permutation: outer key, inner key, postings
#[derive(Debug, Default)]
struct Permutation {
    map: IndexMap<TermId, IndexMap<TermId, Vec<TripleId>>>,
}

impl Permutation {
    fn insert(&mut self, outer: TermId, inner: TermId, id: TripleId) {
        self.map
            .entry(outer)
            .or_default()
            .entry(inner)
            .or_default()
            .push(id);
    }

    fn pair(&self, outer: TermId, inner: TermId) -> &[TripleId] {
        self.map
            .get(&outer)
            .and_then(|m| m.get(&inner))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn prefix(&self, outer: TermId) -> impl Iterator<Item = TripleId> + '_ {
        self.map
            .get(&outer)
            .into_iter()
            .flat_map(|m| m.values().flatten().copied())
    }

    fn prefix_len(&self, outer: TermId) -> usize {
        self.map
            .get(&outer)
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn pair_len(&self, outer: TermId, inner: TermId) -> usize {
        self.pair(outer, inner).len()
    }
}

/// The five permutation indices
#[derive(Debug, Default)]
pub struct TripleIndices {
    spo: Permutation,
    pos: Permutation,
    osp: Permutation,
    pso: Permutation,
    sop: Permutation,
}

impl TripleIndices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly stored triple under all five permutations
    pub fn insert(&mut self, triple: &Triple, id: TripleId) {
        let Triple {
            subject: s,
            predicate: p,
            object: o,
        } = *triple;
        self.spo.insert(s, p, id);
        self.pos.insert(p, o, id);
        self.osp.insert(o, s, id);
        self.pso.insert(p, s, id);
        self.sop.insert(s, o, id);
    }

    /// Candidate ids for a pattern shape, choosing the most selective index
    ///
    /// `None` slots are wildcards. The fully-unbound shape is served by the
    /// caller's record scan, and the fully-bound shape by its triple map, so
    /// both return `None` here.
    pub fn candidates(
        &self,
        s: Option<TermId>,
        p: Option<TermId>,
        o: Option<TermId>,
    ) -> Option<Vec<TripleId>> {
        match (s, p, o) {
            (Some(s), Some(p), None) => Some(self.spo.pair(s, p).to_vec()),
            (Some(s), None, Some(o)) => Some(self.sop.pair(s, o).to_vec()),
            (None, Some(p), Some(o)) => Some(self.pos.pair(p, o).to_vec()),
            (Some(s), None, None) => Some(self.spo.prefix(s).collect()),
            (None, Some(p), None) => Some(self.pso.prefix(p).collect()),
            (None, None, Some(o)) => Some(self.osp.prefix(o).collect()),
            (Some(_), Some(_), Some(_)) | (None, None, None) => None,
        }
    }

    /// Posting-list size for a pattern shape, used by the query planner
    pub fn estimate(&self, s: Option<TermId>, p: Option<TermId>, o: Option<TermId>) -> Option<usize> {
        match (s, p, o) {
            (Some(s), Some(p), None) => Some(self.spo.pair_len(s, p)),
            (Some(s), None, Some(o)) => Some(self.sop.pair_len(s, o)),
            (None, Some(p), Some(o)) => Some(self.pos.pair_len(p, o)),
            (Some(s), None, None) => Some(self.spo.prefix_len(s)),
            (None, Some(p), None) => Some(self.pso.prefix_len(p)),
            (None, None, Some(o)) => Some(self.osp.prefix_len(o)),
            (Some(_), Some(_), Some(_)) | (None, None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::TermId;

    fn t(s: u32, p: u32, o: u32) -> Triple {
        Triple::new(
            TermId::from_raw(s),
            TermId::from_raw(p),
            TermId::from_raw(o),
        )
    }

    #[test]
    fn test_single_bound_lookup() {
        let mut idx = TripleIndices::new();
        idx.insert(&t(1, 2, 3), TripleId(0));
        idx.insert(&t(1, 2, 4), TripleId(1));
        idx.insert(&t(5, 2, 3), TripleId(2));

        let by_s = idx.candidates(Some(TermId::from_raw(1)), None, None).unwrap();
        assert_eq!(by_s.len(), 2);
        let by_p = idx.candidates(None, Some(TermId::from_raw(2)), None).unwrap();
        assert_eq!(by_p.len(), 3);
    }

    #[test]
    fn test_two_bound_lookup() {
        let mut idx = TripleIndices::new();
        idx.insert(&t(1, 2, 3), TripleId(0));
        idx.insert(&t(1, 2, 4), TripleId(1));

        let sp = idx
            .candidates(Some(TermId::from_raw(1)), Some(TermId::from_raw(2)), None)
            .unwrap();
        assert_eq!(sp.len(), 2);
        let so = idx
            .candidates(Some(TermId::from_raw(1)), None, Some(TermId::from_raw(4)))
            .unwrap();
        assert_eq!(so, vec![TripleId(1)]);
    }

    #[test]
    fn test_estimates_match_postings() {
        let mut idx = TripleIndices::new();
        for i in 0..10 {
            idx.insert(&t(1, 2, i), TripleId(i));
        }
        assert_eq!(idx.estimate(None, Some(TermId::from_raw(2)), None), Some(10));
        assert_eq!(
            idx.estimate(Some(TermId::from_raw(1)), Some(TermId::from_raw(2)), None),
            Some(10)
        );
    }
}
