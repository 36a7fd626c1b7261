//! Indexed working memory with provenance and epoch snapshots
//!
//! The fact store holds every triple the reasoner knows about together with
//! its [`Derivation`]: whether it was asserted externally, under which source
//! tags, and the justification lists recorded by production firings. Five
//! index permutations serve selective lookup; birth/death epoch stamps give
//! snapshot isolation without copy-on-write.
//!
//! Removal is logical: a record gains a death epoch and drops out of the
//! current view, while older snapshots keep seeing it. Counting, not a
//! truth-maintenance graph, gates removal: a triple stays alive while it is
//! asserted or has at least one justification left.

use fnv::{FnvHashMap, FnvHashSet};

use crate::term::{TermId, Triple};

mod index;
mod sameas;

pub use index::TripleIndices;
pub use sameas::SameAsClasses;

/// Epoch counter value
pub type Epoch = u64;

/// Death epoch of a live record
const NEVER: Epoch = Epoch::MAX;

/// Dense id of a stored triple record
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TripleId(pub(crate) u32);

impl TripleId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned id of a source tag
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct SourceId(u32);

/// How a stored triple is supported
#[derive(Clone, Debug, Default)]
pub struct Derivation {
    /// Asserted without a source tag; immune to source retraction
    permanent: bool,
    /// Source tags supplied at assertion time
    sources: FnvHashSet<SourceId>,
    /// One premise list per successful production firing
    justifications: Vec<Vec<TripleId>>,
}

impl Derivation {
    /// Whether the triple counts as externally asserted
    pub fn is_asserted(&self) -> bool {
        self.permanent || !self.sources.is_empty()
    }

    /// Whether anything keeps this triple alive
    pub fn is_supported(&self) -> bool {
        self.is_asserted() || !self.justifications.is_empty()
    }

    /// The recorded justification lists
    pub fn justifications(&self) -> &[Vec<TripleId>] {
        &self.justifications
    }

    /// The source tags currently attached
    pub fn sources(&self) -> impl Iterator<Item = SourceId> + '_ {
        self.sources.iter().copied()
    }
}

#[derive(Debug)]
struct TripleRecord {
    triple: Triple,
    derivation: Derivation,
    born: Epoch,
    died: Epoch,
}

impl TripleRecord {
    fn is_alive(&self) -> bool {
        self.died == NEVER
    }

    fn visible_at(&self, epoch: Epoch) -> bool {
        self.born <= epoch && self.died > epoch
    }
}

/// Result of an assert or derive call
#[derive(Clone, Copy, Debug)]
pub struct AssertOutcome {
    /// Record id (existing or fresh)
    pub id: TripleId,
    /// True only if the triple was absent from the current view
    pub added: bool,
}

/// Result of removing one justification instance
#[derive(Clone, Copy, Debug, Default)]
pub struct UndoOutcome {
    /// A matching justification was found and removed
    pub removed: bool,
    /// Set when the removal left the triple unsupported and it died
    pub killed: Option<TripleId>,
}

/// Report returned by source retraction
#[derive(Clone, Debug, Default)]
pub struct RetractReport {
    /// The retracted tag
    pub tag: String,
    /// Triples that carried the tag
    pub tagged: usize,
    /// Triples that lost assertion status but survive on justifications
    pub demoted: usize,
    /// Triples removed, including downstream derivations
    pub retracted: Vec<Triple>,
}

/// An epoch-stamped read view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Snapshot(pub(crate) Epoch);

/// Visibility filter for reads
#[derive(Clone, Copy, Debug)]
pub enum View {
    /// The live store
    Current,
    /// As of a snapshot epoch
    AsOf(Epoch),
}

impl From<Snapshot> for View {
    fn from(snap: Snapshot) -> Self {
        View::AsOf(snap.0)
    }
}

/// The indexed fact store
#[derive(Debug, Default)]
pub struct FactStore {
    records: Vec<TripleRecord>,
    by_triple: FnvHashMap<Triple, TripleId>,
    indices: TripleIndices,
    clock: Epoch,
    alive: usize,
    source_names: Vec<String>,
    source_ids: FnvHashMap<String, SourceId>,
    source_members: FnvHashMap<SourceId, FnvHashSet<TripleId>>,
    same_as: SameAsClasses,
}

impl FactStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Source tags
    // ------------------------------------------------------------------

    /// Intern a source tag
    pub fn intern_source(&mut self, tag: &str) -> SourceId {
        if let Some(&id) = self.source_ids.get(tag) {
            return id;
        }
        let id = SourceId(self.source_names.len() as u32);
        self.source_names.push(tag.to_string());
        self.source_ids.insert(tag.to_string(), id);
        id
    }

    /// Look up a source tag without interning
    pub fn find_source(&self, tag: &str) -> Option<SourceId> {
        self.source_ids.get(tag).copied()
    }

    /// The text of a source tag
    pub fn source_name(&self, id: SourceId) -> &str {
        &self.source_names[id.0 as usize]
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Assert an external triple, merging source tags on duplicates
    pub fn assert_fact(&mut self, triple: Triple, source: Option<SourceId>) -> AssertOutcome {
        if let Some(&id) = self.by_triple.get(&triple) {
            let record = &mut self.records[id.index()];
            match source {
                Some(tag) => {
                    record.derivation.sources.insert(tag);
                    self.source_members.entry(tag).or_default().insert(id);
                }
                None => record.derivation.permanent = true,
            }
            return AssertOutcome { id, added: false };
        }

        let mut derivation = Derivation::default();
        match source {
            Some(tag) => {
                derivation.sources.insert(tag);
            }
            None => derivation.permanent = true,
        }
        let id = self.insert_record(triple, derivation);
        if let Some(tag) = source {
            self.source_members.entry(tag).or_default().insert(id);
        }
        AssertOutcome { id, added: true }
    }

    /// Record a derived triple with its justification
    ///
    /// Duplicate derivations append the justification but report `added =
    /// false`, which is what stops re-propagation through the network.
    pub fn derive_fact(&mut self, triple: Triple, justification: Vec<TripleId>) -> AssertOutcome {
        if let Some(&id) = self.by_triple.get(&triple) {
            let record = &mut self.records[id.index()];
            record.derivation.justifications.push(justification);
            return AssertOutcome { id, added: false };
        }
        let derivation = Derivation {
            permanent: false,
            sources: FnvHashSet::default(),
            justifications: vec![justification],
        };
        let id = self.insert_record(triple, derivation);
        AssertOutcome { id, added: true }
    }

    fn insert_record(&mut self, triple: Triple, derivation: Derivation) -> TripleId {
        self.clock += 1;
        let id = TripleId(self.records.len() as u32);
        self.indices.insert(&triple, id);
        self.by_triple.insert(triple, id);
        self.records.push(TripleRecord {
            triple,
            derivation,
            born: self.clock,
            died: NEVER,
        });
        self.alive += 1;
        id
    }

    /// Remove one justification instance matching the given premise list
    pub fn undo_justification(&mut self, triple: &Triple, premises: &[TripleId]) -> UndoOutcome {
        let Some(&id) = self.by_triple.get(triple) else {
            return UndoOutcome::default();
        };
        let record = &mut self.records[id.index()];
        let Some(pos) = record
            .derivation
            .justifications
            .iter()
            .position(|j| j == premises)
        else {
            return UndoOutcome::default();
        };
        record.derivation.justifications.swap_remove(pos);
        if record.derivation.is_supported() {
            UndoOutcome {
                removed: true,
                killed: None,
            }
        } else {
            self.kill(id);
            UndoOutcome {
                removed: true,
                killed: Some(id),
            }
        }
    }

    /// Strip a tag from everything carrying it
    ///
    /// Returns the ids of triples that died outright, plus tagged/demoted
    /// counts for the report. Downstream invalidation is the driver's job.
    pub fn strip_source(&mut self, tag: SourceId) -> (Vec<TripleId>, usize, usize) {
        let members = self.source_members.remove(&tag).unwrap_or_default();
        let mut killed = Vec::new();
        let mut tagged = 0;
        let mut demoted = 0;
        for id in members {
            let record = &mut self.records[id.index()];
            if !record.is_alive() || !record.derivation.sources.remove(&tag) {
                continue;
            }
            tagged += 1;
            if record.derivation.is_asserted() {
                continue;
            }
            if record.derivation.justifications.is_empty() {
                self.kill(id);
                killed.push(id);
            } else {
                demoted += 1;
            }
        }
        (killed, tagged, demoted)
    }

    fn kill(&mut self, id: TripleId) {
        self.clock += 1;
        let record = &mut self.records[id.index()];
        debug_assert!(record.is_alive());
        record.died = self.clock;
        self.by_triple.remove(&record.triple);
        self.alive -= 1;
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Take a snapshot of the current epoch
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.clock)
    }

    /// The triple behind a record id
    pub fn triple(&self, id: TripleId) -> Triple {
        self.records[id.index()].triple
    }

    /// The derivation of a record
    pub fn derivation(&self, id: TripleId) -> &Derivation {
        &self.records[id.index()].derivation
    }

    /// Whether the record is in the current view
    pub fn is_alive(&self, id: TripleId) -> bool {
        self.records[id.index()].is_alive()
    }

    /// Whether the triple is in the current view
    pub fn contains(&self, triple: &Triple) -> bool {
        self.by_triple.contains_key(triple)
    }

    /// Alive record id for a triple, if any
    pub fn find(&self, triple: &Triple) -> Option<TripleId> {
        self.by_triple.get(triple).copied()
    }

    /// Number of triples in the current view
    pub fn len(&self) -> usize {
        self.alive
    }

    /// Whether the current view is empty
    pub fn is_empty(&self) -> bool {
        self.alive == 0
    }

    fn visible(&self, id: TripleId, view: View) -> bool {
        let record = &self.records[id.index()];
        match view {
            View::Current => record.is_alive(),
            View::AsOf(epoch) => record.visible_at(epoch),
        }
    }

    /// Enumerate record ids matching a pattern shape under a view
    ///
    /// Picks the most selective of the five indices for the bound slots; the
    /// fully-bound shape checks point-wise and the unbound shape scans.
    pub fn select(
        &self,
        s: Option<TermId>,
        p: Option<TermId>,
        o: Option<TermId>,
        view: View,
    ) -> Vec<TripleId> {
        match (s, p, o) {
            (Some(s), Some(p), Some(o)) => {
                let triple = Triple::new(s, p, o);
                match view {
                    View::Current => self.find(&triple).into_iter().collect(),
                    View::AsOf(_) => self
                        .indices
                        .candidates(Some(s), Some(p), None)
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|&id| {
                            self.records[id.index()].triple.object == o && self.visible(id, view)
                        })
                        .collect(),
                }
            }
            (None, None, None) => (0..self.records.len() as u32)
                .map(TripleId)
                .filter(|&id| self.visible(id, view))
                .collect(),
            (s, p, o) => self
                .indices
                .candidates(s, p, o)
                .unwrap_or_default()
                .into_iter()
                .filter(|&id| self.visible(id, view))
                .collect(),
        }
    }

    /// Cardinality estimate for the planner; counts tombstones, which is fine
    /// for ordering decisions
    pub fn estimate(&self, s: Option<TermId>, p: Option<TermId>, o: Option<TermId>) -> usize {
        match (s, p, o) {
            (Some(_), Some(_), Some(_)) => 1,
            (None, None, None) => self.alive,
            (s, p, o) => self.indices.estimate(s, p, o).unwrap_or(self.alive),
        }
    }

    /// Iterate the current view
    pub fn iter_alive(&self) -> impl Iterator<Item = (TripleId, Triple)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_alive())
            .map(|(i, r)| (TripleId(i as u32), r.triple))
    }

    // ------------------------------------------------------------------
    // sameAs classes
    // ------------------------------------------------------------------

    /// Merge two individuals into one equivalence class
    pub fn union_same_as(&mut self, a: TermId, b: TermId) {
        self.same_as.union(a, b);
    }

    /// Canonical representative of an individual
    pub fn canonical(&self, id: TermId) -> TermId {
        self.same_as.find(id)
    }

    /// Whether two individuals are known equal
    pub fn same_individual(&self, a: TermId, b: TermId) -> bool {
        self.same_as.connected(a, b)
    }

    /// Rebuild the classes from the surviving `sameAs` edges
    pub fn rebuild_same_as(&mut self, same_as_predicate: TermId) {
        let pairs: Vec<(TermId, TermId)> = self
            .iter_alive()
            .filter(|(_, t)| t.predicate == same_as_predicate)
            .map(|(_, t)| (t.subject, t.object))
            .collect();
        self.same_as.rebuild(pairs);
    }
}
