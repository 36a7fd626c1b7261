//! The reasoner: fixpoint driver and host-facing operations
//!
//! Owns every piece of per-instance state (term store, fact store, network,
//! compiler, event log) so a process can hold many independent reasoners.
//! Mutations run under `&mut self`, which is the single-writer discipline;
//! queries read an epoch snapshot through `&self`, so a handle taken before a
//! mutation keeps seeing the pre-mutation store.
//!
//! Forward chaining pumps signed deltas breadth-first through the network to
//! quiescence. Source retraction strips the tag, feeds the now-unsupported
//! triples back through the same pump with the sign flipped, and lets
//! justification counting decide what else dies.

use std::collections::VecDeque;

use fnv::{FnvHashMap, FnvHashSet};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::axiom::{Axiom, AxiomCompiler};
use crate::config::{ReasonerConfig, ReasoningProfile};
use crate::error::ReasonerResult;
use crate::event::{EventLog, ReasonerEvent};
use crate::query::{bfs_subgraph, execute, PlanCache, Query, Table};
use crate::rete::{ActivationCtx, Delta, Network, Sign};
use crate::store::{FactStore, RetractReport, Snapshot, SourceId, TripleId, View};
use crate::term::{TermId, TermStore, Triple};
use crate::vocab::{self, Vocab};

/// Counters accumulated over a reasoner's lifetime
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct ReasonerStats {
    /// Production firings (forward direction)
    pub rules_fired: u64,
    /// Distinct triples materialised (asserted or derived)
    pub triples_derived: u64,
    /// Deltas pumped through the network
    pub steps: u64,
    /// Source retraction calls
    pub retractions: u64,
}

/// Summary returned by an axiom load
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct LoadSummary {
    /// Axioms consumed
    pub axioms: usize,
    /// Productions wired into the network
    pub productions: usize,
    /// Ground facts asserted
    pub facts: usize,
    /// Axioms (or parts) refused as outside the profile
    pub warnings: usize,
}

/// An incremental OWL 2 RL reasoner instance
pub struct Reasoner {
    config: ReasonerConfig,
    terms: TermStore,
    vocab: Vocab,
    store: FactStore,
    network: Network,
    compiler: AxiomCompiler,
    agenda: VecDeque<Delta>,
    events: EventLog,
    stats: ReasonerStats,
    regexes: FnvHashMap<String, Regex>,
    plan_cache: PlanCache,
}

impl Reasoner {
    /// A reasoner with the default OWL 2 RL profile
    pub fn new() -> Self {
        Self::with_config(ReasonerConfig::default())
    }

    /// A reasoner for the given profile
    pub fn with_profile(profile: ReasoningProfile) -> Self {
        Self::with_config(ReasonerConfig::with_profile(profile))
    }

    /// A reasoner with explicit configuration
    pub fn with_config(config: ReasonerConfig) -> Self {
        let mut terms = TermStore::new();
        let vocab = Vocab::intern(&mut terms);
        let mut compiler = AxiomCompiler::new(vocab);
        let mut network = Network::new();
        for production in compiler.base_productions(config.profile) {
            network.add_production(production);
        }
        let plan_cache = PlanCache::new(config.plan_cache_capacity);
        Reasoner {
            config,
            terms,
            vocab,
            store: FactStore::new(),
            network,
            compiler,
            agenda: VecDeque::new(),
            events: EventLog::new(),
            stats: ReasonerStats::default(),
            regexes: FnvHashMap::default(),
            plan_cache,
        }
    }

    // ------------------------------------------------------------------
    // Terms
    // ------------------------------------------------------------------

    /// Intern a named term for use in axioms
    pub fn intern(&mut self, iri: &str) -> TermId {
        self.terms.intern_name(iri)
    }

    /// Intern a typed literal for use in axioms
    pub fn intern_literal(&mut self, lexical: &str, datatype: &str) -> TermId {
        self.terms.intern_literal(lexical, datatype)
    }

    /// Look up a named term without interning
    pub fn term(&self, iri: &str) -> Option<TermId> {
        self.terms.find_name(iri)
    }

    /// Render a term id for display
    pub fn display(&self, id: TermId) -> String {
        self.terms.display(id)
    }

    /// The underlying term store
    pub fn terms(&self) -> &TermStore {
        &self.terms
    }

    /// The reserved vocabulary ids
    pub fn vocab(&self) -> Vocab {
        self.vocab
    }

    // ------------------------------------------------------------------
    // Loading and reasoning
    // ------------------------------------------------------------------

    /// Load a batch of axioms, optionally tagging asserted facts for later
    /// retraction
    ///
    /// Productions added here immediately see facts already in the store, so
    /// rules may arrive after the data they match. Derivations only appear
    /// after the next [`Reasoner::reason`] call.
    pub fn load_axioms(
        &mut self,
        axioms: impl IntoIterator<Item = Axiom>,
        source: Option<&str>,
    ) -> LoadSummary {
        let tag = source.map(|s| self.store.intern_source(s));
        let mut summary = LoadSummary::default();
        for axiom in axioms {
            summary.axioms += 1;
            let compiled = self.compiler.compile(&axiom, &mut self.terms);
            summary.warnings += compiled.warnings.len();
            for detail in compiled.warnings {
                self.events.record(ReasonerEvent::NonRlAxiom { detail });
            }
            summary.facts += compiled.facts.len();
            for triple in compiled.facts {
                self.assert_triple(triple, tag);
            }
            summary.productions += compiled.productions.len();
            for production in compiled.productions {
                let chain = self.network.add_production(production);
                self.seed_chain(chain);
            }
        }
        debug!(
            axioms = summary.axioms,
            productions = summary.productions,
            facts = summary.facts,
            "axioms loaded"
        );
        summary
    }

    fn assert_triple(&mut self, triple: Triple, tag: Option<SourceId>) {
        let outcome = self.store.assert_fact(triple, tag);
        if outcome.added {
            self.agenda.push_back(Delta {
                id: outcome.id,
                triple,
                sign: Sign::Insert,
            });
        }
    }

    /// Replay already-propagated facts through a freshly wired production
    fn seed_chain(&mut self, chain: usize) {
        let pending: FnvHashSet<TripleId> = self.agenda.iter().map(|d| d.id).collect();
        let existing: Vec<Delta> = self
            .store
            .iter_alive()
            .filter(|(id, _)| !pending.contains(id))
            .map(|(id, triple)| Delta {
                id,
                triple,
                sign: Sign::Insert,
            })
            .collect();
        for delta in existing {
            let mut ctx = ActivationCtx {
                terms: &mut self.terms,
                store: &mut self.store,
                events: &mut self.events,
                agenda: &mut self.agenda,
                regexes: &mut self.regexes,
                fired: &mut self.stats.rules_fired,
            };
            self.network.activate_chain(chain, delta, &mut ctx);
        }
    }

    /// Run forward chaining to quiescence; a no-op when already quiescent
    pub fn reason(&mut self) -> &ReasonerStats {
        self.pump();
        &self.stats
    }

    /// Whether there is pending work for `reason()`
    pub fn is_quiescent(&self) -> bool {
        self.agenda.is_empty()
    }

    fn pump(&mut self) -> Vec<Triple> {
        let mut removed = Vec::new();
        let mut steps: usize = 0;
        while let Some(delta) = self.agenda.pop_front() {
            steps += 1;
            if steps > self.config.max_steps {
                warn!(
                    max_steps = self.config.max_steps,
                    "fixpoint bound reached, stopping propagation"
                );
                break;
            }
            self.stats.steps += 1;
            if delta.sign == Sign::Remove {
                removed.push(delta.triple);
            }
            self.process_delta(delta);
        }
        removed
    }

    fn process_delta(&mut self, delta: Delta) {
        let v = self.vocab;
        let triple = delta.triple;

        match delta.sign {
            Sign::Insert => {
                self.stats.triples_derived += 1;
                if triple.predicate == v.same_as {
                    self.store.union_same_as(triple.subject, triple.object);
                }
                if triple.predicate == v.rdf_type && triple.object == v.nothing {
                    self.events.record(ReasonerEvent::Inconsistency {
                        subject: triple.subject,
                        detail: format!(
                            "{} is an instance of owl:Nothing",
                            self.terms.display(triple.subject)
                        ),
                    });
                }
                for individual in self.individuals_of(&triple) {
                    let thing = Triple::new(individual, v.rdf_type, v.thing);
                    let outcome = self.store.derive_fact(thing, vec![delta.id]);
                    if outcome.added {
                        self.agenda.push_back(Delta {
                            id: outcome.id,
                            triple: thing,
                            sign: Sign::Insert,
                        });
                    }
                }
            }
            Sign::Remove => {
                for individual in self.individuals_of(&triple) {
                    let thing = Triple::new(individual, v.rdf_type, v.thing);
                    let undo = self.store.undo_justification(&thing, &[delta.id]);
                    if let Some(killed) = undo.killed {
                        self.agenda.push_back(Delta {
                            id: killed,
                            triple: thing,
                            sign: Sign::Remove,
                        });
                    }
                }
            }
        }

        let mut ctx = ActivationCtx {
            terms: &mut self.terms,
            store: &mut self.store,
            events: &mut self.events,
            agenda: &mut self.agenda,
            regexes: &mut self.regexes,
            fired: &mut self.stats.rules_fired,
        };
        self.network.activate(delta, &mut ctx);
    }

    /// Individuals a triple makes known, owed a `Thing` membership
    fn individuals_of(&self, triple: &Triple) -> Vec<TermId> {
        let v = self.vocab;
        let mut out = Vec::new();
        if v.is_schema_predicate(triple.predicate) {
            return out;
        }
        if triple.predicate == v.rdf_type {
            if triple.object != v.thing && !self.terms.is_literal(triple.subject) {
                out.push(triple.subject);
            }
            return out;
        }
        if !self.terms.is_literal(triple.subject) {
            out.push(triple.subject);
        }
        if !self.terms.is_literal(triple.object) && triple.object != triple.subject {
            out.push(triple.object);
        }
        out
    }

    // ------------------------------------------------------------------
    // Retraction
    // ------------------------------------------------------------------

    /// Retract every assertion carrying the given source tag
    ///
    /// Unknown tags are a no-op. Derived triples whose last justification
    /// disappears are removed transitively; triples with surviving support
    /// stay.
    pub fn retract_source(&mut self, tag: &str) -> RetractReport {
        let mut report = RetractReport {
            tag: tag.to_string(),
            ..Default::default()
        };
        let Some(source) = self.store.find_source(tag) else {
            return report;
        };
        self.stats.retractions += 1;

        let (killed, tagged, demoted) = self.store.strip_source(source);
        report.tagged = tagged;
        report.demoted = demoted;
        for id in killed {
            self.agenda.push_back(Delta {
                id,
                triple: self.store.triple(id),
                sign: Sign::Remove,
            });
        }
        report.retracted = self.pump();

        if report
            .retracted
            .iter()
            .any(|t| t.predicate == self.vocab.same_as)
        {
            self.store.rebuild_same_as(self.vocab.same_as);
        }
        debug!(tag, retracted = report.retracted.len(), "source retracted");
        report
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Take an epoch snapshot of the current materialisation
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Run a select query against the current store
    pub fn select(&self, query: &Query) -> ReasonerResult<Table> {
        self.select_at(query, self.snapshot())
    }

    /// Run a select query against a snapshot
    pub fn select_at(&self, query: &Query, snapshot: Snapshot) -> ReasonerResult<Table> {
        execute(
            query,
            &self.terms,
            &self.store,
            snapshot.into(),
            &self.plan_cache,
            self.config.max_query_results,
        )
    }

    /// Whether any solution exists
    pub fn ask(&self, query: &Query) -> ReasonerResult<bool> {
        let mut probe = query.clone();
        probe.limit = Some(1);
        Ok(!self.select(&probe)?.is_empty())
    }

    /// Every triple mentioning the term as subject or object
    pub fn describe(&self, iri: &str) -> Table {
        let mut table = Table::empty(vec![
            "subject".to_string(),
            "predicate".to_string(),
            "object".to_string(),
        ]);
        let Some(id) = self.terms.find_name(iri) else {
            return table;
        };
        let id = self.store.canonical(id);
        let view = View::Current;
        let mut ids = self.store.select(Some(id), None, None, view);
        ids.extend(self.store.select(None, None, Some(id), view));
        ids.sort_unstable();
        ids.dedup();
        for triple_id in ids {
            let t = self.store.triple(triple_id);
            table
                .rows
                .push(vec![Some(t.subject), Some(t.predicate), Some(t.object)]);
        }
        table
    }

    /// All individuals materialised as instances of the named class
    pub fn instances_of(&self, class: &str) -> Table {
        let mut table = Table::empty(vec!["individual".to_string()]);
        let Some(class_id) = self.terms.find_name(class) else {
            return table;
        };
        for id in self
            .store
            .select(None, Some(self.vocab.rdf_type), Some(class_id), View::Current)
        {
            table.rows.push(vec![Some(self.store.triple(id).subject)]);
        }
        table
    }

    /// Named classes subsuming the given class, per the materialised
    /// `rdfs:subClassOf` closure
    pub fn subsumers_of(&self, class: &str) -> Vec<TermId> {
        let Some(class_id) = self.terms.find_name(class) else {
            return Vec::new();
        };
        let mut out: Vec<TermId> = self
            .store
            .select(Some(class_id), Some(self.vocab.sub_class_of), None, View::Current)
            .into_iter()
            .map(|id| self.store.triple(id).object)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Named classes subsumed by the given class
    pub fn subsumed_by(&self, class: &str) -> Vec<TermId> {
        let Some(class_id) = self.terms.find_name(class) else {
            return Vec::new();
        };
        let mut out: Vec<TermId> = self
            .store
            .select(None, Some(self.vocab.sub_class_of), Some(class_id), View::Current)
            .into_iter()
            .map(|id| self.store.triple(id).subject)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Role assertion triples, optionally constrained on any slot
    ///
    /// With no role given, schema and typing edges are excluded so the result
    /// is the individual-to-individual (or individual-to-literal) graph.
    pub fn role_assertions(
        &self,
        role: Option<&str>,
        subject: Option<&str>,
        object: Option<&str>,
    ) -> Table {
        let mut table = Table::empty(vec![
            "subject".to_string(),
            "role".to_string(),
            "object".to_string(),
        ]);
        let resolve = |name: Option<&str>| -> Option<Option<TermId>> {
            match name {
                None => Some(None),
                Some(iri) => self.terms.find_name(iri).map(Some),
            }
        };
        let (Some(p), Some(s), Some(o)) = (resolve(role), resolve(subject), resolve(object))
        else {
            return table;
        };
        let v = self.vocab;
        for id in self.store.select(s, p, o, View::Current) {
            let t = self.store.triple(id);
            if p.is_none()
                && (t.predicate == v.rdf_type
                    || t.predicate == v.same_as
                    || t.predicate == v.different_from
                    || v.is_schema_predicate(t.predicate))
            {
                continue;
            }
            table
                .rows
                .push(vec![Some(t.subject), Some(t.predicate), Some(t.object)]);
        }
        table
    }

    /// BFS subgraph over one role's edge relation
    pub fn subgraph(&self, role: &str, root: &str, max_depth: usize) -> Vec<(TermId, TermId)> {
        let (Some(role_id), Some(root_id)) =
            (self.terms.find_name(role), self.terms.find_name(root))
        else {
            return Vec::new();
        };
        let edges: Vec<(TermId, TermId)> = self
            .store
            .select(None, Some(role_id), None, View::Current)
            .into_iter()
            .map(|id| {
                let t = self.store.triple(id);
                (t.subject, t.object)
            })
            .collect();
        bfs_subgraph(&edges, root_id, max_depth)
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Canonical representative of an individual's `sameAs` class
    pub fn canonical(&self, id: TermId) -> TermId {
        self.store.canonical(id)
    }

    /// Whether the triple is currently materialised
    pub fn contains(&self, triple: &Triple) -> bool {
        self.store.contains(triple)
    }

    /// Number of materialised triples
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Diagnostics recorded so far
    pub fn events(&self) -> &[ReasonerEvent] {
        self.events.events()
    }

    /// Whether no inconsistency has been observed
    pub fn is_consistent(&self) -> bool {
        !self.events.has_inconsistency()
    }

    /// Lifetime counters
    pub fn stats(&self) -> &ReasonerStats {
        &self.stats
    }

    /// The underlying fact store (read-only)
    pub fn facts(&self) -> &FactStore {
        &self.store
    }

    /// Convenience: intern and assert one plain triple outside any axiom
    pub fn assert_raw(&mut self, subject: &str, predicate: &str, object: &str, source: Option<&str>) {
        let s = self.terms.intern_name(subject);
        let p = self.terms.intern_name(predicate);
        let o = self.terms.intern_name(object);
        let tag = source.map(|t| self.store.intern_source(t));
        self.assert_triple(Triple::new(s, p, o), tag);
    }
}

impl Default for Reasoner {
    fn default() -> Self {
        Self::new()
    }
}

// Re-export the xsd helpers hosts need to build literals
pub use crate::vocab::{
    XSD_BOOLEAN, XSD_DATE_TIME, XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER, XSD_STRING,
};
