//! sameAs equivalence classes
//!
//! Union-find over term ids with the smallest id elected as the canonical
//! representative, which keeps the choice deterministic across runs. The
//! structure is cheap to rebuild, which is how retraction of a `sameAs`
//! source is handled: re-union the surviving pairs.

use fnv::FnvHashMap;

use crate::term::TermId;

/// Union-find over `sameAs`-connected individuals
#[derive(Debug, Default, Clone)]
pub struct SameAsClasses {
    parent: FnvHashMap<TermId, TermId>,
}

impl SameAsClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical representative of the class containing `id`
    ///
    /// Ids never merged return themselves. No path compression so lookups
    /// work on a shared reference; chains stay short because `union` always
    /// roots at the smaller id.
    pub fn find(&self, id: TermId) -> TermId {
        let mut current = id;
        while let Some(&next) = self.parent.get(&current) {
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// Merge the classes of `a` and `b`
    pub fn union(&mut self, a: TermId, b: TermId) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (root, child) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent.insert(child, root);
    }

    /// Whether two ids are in the same class
    pub fn connected(&self, a: TermId, b: TermId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Drop all classes and re-union from the given pairs
    pub fn rebuild(&mut self, pairs: impl IntoIterator<Item = (TermId, TermId)>) {
        self.parent.clear();
        for (a, b) in pairs {
            self.union(a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> TermId {
        TermId::from_raw(raw)
    }

    #[test]
    fn test_union_elects_smallest_id() {
        let mut classes = SameAsClasses::new();
        classes.union(id(7), id(3));
        classes.union(id(3), id(9));
        assert_eq!(classes.find(id(7)), id(3));
        assert_eq!(classes.find(id(9)), id(3));
    }

    #[test]
    fn test_disjoint_ids_are_their_own_representative() {
        let classes = SameAsClasses::new();
        assert_eq!(classes.find(id(42)), id(42));
    }

    #[test]
    fn test_rebuild_forgets_old_unions() {
        let mut classes = SameAsClasses::new();
        classes.union(id(1), id(2));
        classes.rebuild([(id(3), id(4))]);
        assert!(!classes.connected(id(1), id(2)));
        assert!(classes.connected(id(3), id(4)));
    }
}
