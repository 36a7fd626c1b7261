//! Axiom compiler: IR to OWL 2 RL productions
//!
//! Lowers each axiom to (a) productions for the RETE builder and (b) ground
//! facts asserted directly. Compilation follows the OWL 2 RL rule templates:
//! subclass inclusions become `type`-propagation rules, role characteristics
//! become join rules, keys become n-way joins producing `sameAs`.
//!
//! Right-hand sides that would generate fresh existentials are refused: the
//! compiler records a warning and drops the offending form, as is
//! transitivity combined with a cardinality bound on the same role. The
//! caller surfaces warnings as `NonRlAxiom` events.

use fnv::FnvHashMap;
use fnv::FnvHashSet;

use crate::axiom::{Axiom, Concept, SwrlArg, SwrlAtom};
use crate::config::ReasoningProfile;
use crate::rete::{BuiltinCall, BuiltinOp, Pattern, Production, Slot};
use crate::term::{TermId, TermStore, Triple};
use crate::vocab::Vocab;

/// Output of compiling a batch of axioms
#[derive(Debug, Default)]
pub struct CompiledAxioms {
    /// Productions to wire into the network
    pub productions: Vec<Production>,
    /// Ground facts to assert
    pub facts: Vec<Triple>,
    /// Axioms (or parts) refused as outside OWL 2 RL
    pub warnings: Vec<String>,
}

impl CompiledAxioms {
    fn merge(&mut self, other: CompiledAxioms) {
        self.productions.extend(other.productions);
        self.facts.extend(other.facts);
        self.warnings.extend(other.warnings);
    }
}

/// Variable allocator scoped to one production
#[derive(Default)]
struct VarAlloc {
    count: u8,
}

impl VarAlloc {
    fn fresh(&mut self) -> u8 {
        let v = self.count;
        self.count += 1;
        v
    }
}

/// Right-hand-side lowering result
#[derive(Clone, Default)]
struct RhsParts {
    /// Patterns the head needs joined in addition to the subclass body
    extra_lhs: Vec<Pattern>,
    /// Guards introduced by the head (cardinality merges)
    builtins: Vec<BuiltinCall>,
    /// Consequent templates
    templates: Vec<Pattern>,
}

impl RhsParts {
    fn merge(&mut self, other: RhsParts) {
        self.extra_lhs.extend(other.extra_lhs);
        self.builtins.extend(other.builtins);
        self.templates.extend(other.templates);
    }
}

/// The axiom compiler
///
/// Holds cross-axiom state: the production id counter and the role sets used
/// to reject the transitivity/cardinality combination.
#[derive(Debug)]
pub struct AxiomCompiler {
    vocab: Vocab,
    next_id: usize,
    transitive_roles: FnvHashSet<TermId>,
    bounded_roles: FnvHashSet<TermId>,
}

impl AxiomCompiler {
    /// Create a compiler for the given reserved vocabulary
    pub fn new(vocab: Vocab) -> Self {
        AxiomCompiler {
            vocab,
            next_id: 0,
            transitive_roles: FnvHashSet::default(),
            bounded_roles: FnvHashSet::default(),
        }
    }

    /// Productions every reasoner installs before user axioms
    pub fn base_productions(&mut self, profile: ReasoningProfile) -> Vec<Production> {
        let v = self.vocab;
        let mut out = Vec::new();

        // Schema closure, shared by both profiles
        out.push(self.chain_rule("scm-sco", v.sub_class_of));
        out.push(self.chain_rule("scm-spo", v.sub_property_of));

        if profile == ReasoningProfile::Rdfs {
            return out;
        }

        // eq-sym
        out.push(self.make(
            "eq-sym",
            2,
            vec![pat(var(0), cst(v.same_as), var(1))],
            vec![],
            vec![pat(var(1), cst(v.same_as), var(0))],
        ));
        // eq-trans
        out.push(self.make(
            "eq-trans",
            3,
            vec![
                pat(var(0), cst(v.same_as), var(1)),
                pat(var(1), cst(v.same_as), var(2)),
            ],
            vec![],
            vec![pat(var(0), cst(v.same_as), var(2))],
        ));
        // eq-rep-s: rewrite subjects onto the merged individual
        out.push(self.make(
            "eq-rep-s",
            4,
            vec![
                pat(var(0), cst(v.same_as), var(1)),
                pat(var(0), var(2), var(3)),
            ],
            vec![],
            vec![pat(var(1), var(2), var(3))],
        ));
        // eq-rep-o
        out.push(self.make(
            "eq-rep-o",
            4,
            vec![
                pat(var(0), cst(v.same_as), var(1)),
                pat(var(2), var(3), var(0)),
            ],
            vec![],
            vec![pat(var(2), var(3), var(1))],
        ));
        // eq-diff: sameAs/differentFrom collision
        out.push(self.make(
            "eq-diff",
            2,
            vec![
                pat(var(0), cst(v.same_as), var(1)),
                pat(var(0), cst(v.different_from), var(1)),
            ],
            vec![],
            vec![pat(var(0), cst(self.vocab.rdf_type), cst(self.vocab.nothing))],
        ));

        out
    }

    fn chain_rule(&mut self, name: &str, predicate: TermId) -> Production {
        self.make(
            name,
            3,
            vec![
                pat(var(0), cst(predicate), var(1)),
                pat(var(1), cst(predicate), var(2)),
            ],
            vec![],
            vec![pat(var(0), cst(predicate), var(2))],
        )
    }

    /// Compile one axiom
    pub fn compile(&mut self, axiom: &Axiom, terms: &mut TermStore) -> CompiledAxioms {
        let mut out = CompiledAxioms::default();
        let v = self.vocab;
        match axiom {
            Axiom::ClassAssertion {
                individual,
                concept,
            } => {
                self.assert_concept(*individual, concept, &mut out);
            }
            Axiom::RoleAssertion {
                subject,
                role,
                object,
            } => {
                out.facts.push(Triple::new(*subject, *role, *object));
            }
            Axiom::DataAssertion {
                subject,
                role,
                value,
            } => {
                out.facts.push(Triple::new(*subject, *role, *value));
            }
            Axiom::SubClassOf { sub, sup } => {
                self.compile_inclusion("cax-sco", sub, sup, &mut out);
            }
            Axiom::EquivClasses(a, b) => {
                self.compile_inclusion("cax-eqc1", a, b, &mut out);
                self.compile_inclusion("cax-eqc2", b, a, &mut out);
                if let (Concept::Atomic(ca), Concept::Atomic(cb)) = (a, b) {
                    out.facts.push(Triple::new(*ca, v.equivalent_class, *cb));
                }
            }
            Axiom::DisjointClasses(concepts) => {
                for (i, a) in concepts.iter().enumerate() {
                    for b in concepts.iter().skip(i + 1) {
                        self.compile_disjoint_pair(a, b, &mut out);
                    }
                }
            }
            Axiom::SubRole { sub, sup } => {
                out.productions.push(self.role_inclusion("prp-spo1", *sub, *sup));
                out.facts.push(Triple::new(*sub, v.sub_property_of, *sup));
            }
            Axiom::EquivRoles(a, b) => {
                out.productions.push(self.role_inclusion("prp-eqp1", *a, *b));
                out.productions.push(self.role_inclusion("prp-eqp2", *b, *a));
                out.facts.push(Triple::new(*a, v.sub_property_of, *b));
                out.facts.push(Triple::new(*b, v.sub_property_of, *a));
            }
            Axiom::DisjointRoles(a, b) => {
                out.productions.push(self.make(
                    "prp-pdw",
                    3,
                    vec![pat(var(0), cst(*a), var(1)), pat(var(0), cst(*b), var(1))],
                    vec![],
                    vec![pat(var(0), cst(v.rdf_type), cst(v.nothing))],
                ));
            }
            Axiom::InverseRoles(a, b) => {
                out.productions.push(self.make(
                    "prp-inv1",
                    2,
                    vec![pat(var(0), cst(*a), var(1))],
                    vec![],
                    vec![pat(var(1), cst(*b), var(0))],
                ));
                out.productions.push(self.make(
                    "prp-inv2",
                    2,
                    vec![pat(var(0), cst(*b), var(1))],
                    vec![],
                    vec![pat(var(1), cst(*a), var(0))],
                ));
                out.facts.push(Triple::new(*a, v.inverse_of, *b));
            }
            Axiom::RoleChain { chain, sup } => {
                if chain.is_empty() {
                    out.warnings.push("empty role chain".to_string());
                } else {
                    let mut alloc = VarAlloc::default();
                    let first = alloc.fresh();
                    let mut lhs = Vec::with_capacity(chain.len());
                    let mut current = first;
                    for role in chain {
                        let next = alloc.fresh();
                        lhs.push(pat(var(current), cst(*role), var(next)));
                        current = next;
                    }
                    let rhs = vec![pat(var(first), cst(*sup), var(current))];
                    let production = self.make("prp-spo2", alloc.count, lhs, vec![], rhs);
                    out.productions.push(production);
                }
            }
            Axiom::RoleDomain { role, domain } => {
                self.compile_role_frame("prp-dom", *role, domain, true, &mut out);
            }
            Axiom::RoleRange { role, range } => {
                self.compile_role_frame("prp-rng", *role, range, false, &mut out);
            }
            Axiom::FunctionalRole(role) => {
                self.note_bounded(*role, &mut out);
                out.productions.push(self.make(
                    "prp-fp",
                    3,
                    vec![pat(var(0), cst(*role), var(1)), pat(var(0), cst(*role), var(2))],
                    vec![BuiltinCall::new(BuiltinOp::NotEqual, vec![var(1), var(2)])],
                    vec![pat(var(1), cst(v.same_as), var(2))],
                ));
            }
            Axiom::InverseFunctionalRole(role) => {
                out.productions.push(self.make(
                    "prp-ifp",
                    3,
                    vec![pat(var(1), cst(*role), var(0)), pat(var(2), cst(*role), var(0))],
                    vec![BuiltinCall::new(BuiltinOp::NotEqual, vec![var(1), var(2)])],
                    vec![pat(var(1), cst(v.same_as), var(2))],
                ));
            }
            Axiom::TransitiveRole(role) => {
                if self.bounded_roles.contains(role) {
                    out.warnings.push(
                        "transitivity combined with a cardinality bound on the same role"
                            .to_string(),
                    );
                } else {
                    self.transitive_roles.insert(*role);
                    out.productions.push(self.make(
                        "prp-trp",
                        3,
                        vec![pat(var(0), cst(*role), var(1)), pat(var(1), cst(*role), var(2))],
                        vec![],
                        vec![pat(var(0), cst(*role), var(2))],
                    ));
                }
            }
            Axiom::SymmetricRole(role) => {
                out.productions.push(self.make(
                    "prp-symp",
                    2,
                    vec![pat(var(0), cst(*role), var(1))],
                    vec![],
                    vec![pat(var(1), cst(*role), var(0))],
                ));
            }
            Axiom::AsymmetricRole(role) => {
                out.productions.push(self.make(
                    "prp-asyp",
                    2,
                    vec![pat(var(0), cst(*role), var(1)), pat(var(1), cst(*role), var(0))],
                    vec![],
                    vec![pat(var(0), cst(v.rdf_type), cst(v.nothing))],
                ));
            }
            Axiom::ReflexiveRole(role) => {
                out.productions.push(self.make(
                    "prp-rfx",
                    1,
                    vec![pat(var(0), cst(v.rdf_type), cst(v.thing))],
                    vec![],
                    vec![pat(var(0), cst(*role), var(0))],
                ));
            }
            Axiom::IrreflexiveRole(role) => {
                out.productions.push(self.make(
                    "prp-irp",
                    1,
                    vec![pat(var(0), cst(*role), var(0))],
                    vec![],
                    vec![pat(var(0), cst(v.rdf_type), cst(v.nothing))],
                ));
            }
            Axiom::SameAs(individuals) => {
                for pair in individuals.windows(2) {
                    out.facts.push(Triple::new(pair[0], v.same_as, pair[1]));
                }
            }
            Axiom::DifferentFrom(individuals) => {
                for (i, a) in individuals.iter().enumerate() {
                    for b in individuals.iter().skip(i + 1) {
                        out.facts.push(Triple::new(*a, v.different_from, *b));
                    }
                }
            }
            Axiom::HasKey { class, keys } => {
                self.compile_has_key(class, keys, &mut out);
            }
            Axiom::DatatypeDefinition { name, datatype } => {
                let name_iri = terms.lookup(*name).as_name().map(str::to_string);
                let target_iri = terms.lookup(*datatype).as_name().map(str::to_string);
                match (name_iri, target_iri) {
                    (Option::Some(n), Option::Some(t)) => terms.define_datatype_alias(&n, &t),
                    _ => out
                        .warnings
                        .push("datatype definition over non-named terms".to_string()),
                }
            }
            Axiom::SwrlRule { body, head } => {
                self.compile_swrl(body, head, &mut out);
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Class expressions
    // ------------------------------------------------------------------

    /// Lower a ground class assertion to facts where RL permits
    fn assert_concept(&mut self, individual: TermId, concept: &Concept, out: &mut CompiledAxioms) {
        let v = self.vocab;
        match concept {
            Concept::Atomic(c) => out.facts.push(Triple::new(individual, v.rdf_type, *c)),
            Concept::Thing => out.facts.push(Triple::new(individual, v.rdf_type, v.thing)),
            Concept::Nothing => out.facts.push(Triple::new(individual, v.rdf_type, v.nothing)),
            Concept::And(a, b) => {
                self.assert_concept(individual, a, out);
                self.assert_concept(individual, b, out);
            }
            Concept::HasValue(role, value) => {
                out.facts.push(Triple::new(individual, *role, *value));
            }
            Concept::HasSelf(role) => {
                out.facts.push(Triple::new(individual, *role, individual));
            }
            Concept::OneOf(members) if members.len() == 1 => {
                out.facts.push(Triple::new(individual, v.same_as, members[0]));
            }
            other => out.warnings.push(format!(
                "class assertion over unsupported expression: {:?}",
                other
            )),
        }
    }

    /// Lower a concept on the left of an inclusion to pattern alternatives
    ///
    /// Each alternative is one conjunction of patterns; `Or` multiplies
    /// alternatives, `Nothing` yields none (a vacuous inclusion).
    fn lhs_concept(
        &mut self,
        concept: &Concept,
        subject: u8,
        alloc: &mut VarAlloc,
    ) -> Result<Vec<Vec<Pattern>>, String> {
        let v = self.vocab;
        match concept {
            Concept::Atomic(c) => Ok(vec![vec![pat(var(subject), cst(v.rdf_type), cst(*c))]]),
            Concept::Thing => Ok(vec![vec![pat(var(subject), cst(v.rdf_type), cst(v.thing))]]),
            Concept::Nothing => Ok(vec![]),
            Concept::And(a, b) => {
                let left = self.lhs_concept(a, subject, alloc)?;
                let right = self.lhs_concept(b, subject, alloc)?;
                let mut alts = Vec::with_capacity(left.len() * right.len());
                for l in &left {
                    for r in &right {
                        let mut patterns = l.clone();
                        patterns.extend(r.iter().cloned());
                        alts.push(patterns);
                    }
                }
                Ok(alts)
            }
            Concept::Or(a, b) => {
                let mut alts = self.lhs_concept(a, subject, alloc)?;
                alts.extend(self.lhs_concept(b, subject, alloc)?);
                Ok(alts)
            }
            Concept::Some(role, filler) | Concept::MinCard(1, role, filler) => {
                let y = alloc.fresh();
                let edge = pat(var(subject), cst(*role), var(y));
                if matches!(filler.as_ref(), Concept::Thing) {
                    return Ok(vec![vec![edge]]);
                }
                let filler_alts = self.lhs_concept(filler, y, alloc)?;
                Ok(filler_alts
                    .into_iter()
                    .map(|mut patterns| {
                        patterns.insert(0, edge);
                        patterns
                    })
                    .collect())
            }
            Concept::MinCard(0, _, _) => {
                // Trivially true of every individual
                Ok(vec![vec![pat(var(subject), cst(v.rdf_type), cst(v.thing))]])
            }
            Concept::HasValue(role, value) => {
                Ok(vec![vec![pat(var(subject), cst(*role), cst(*value))]])
            }
            Concept::HasSelf(role) => Ok(vec![vec![pat(var(subject), cst(*role), var(subject))]]),
            Concept::MinCard(n, _, _) => Err(format!(
                "min cardinality {} on the left of an inclusion",
                n
            )),
            Concept::MaxCard(..) | Concept::ExactCard(..) => {
                Err("cardinality bound on the left of an inclusion".to_string())
            }
            Concept::Not(_) => Err("complement on the left of an inclusion".to_string()),
            Concept::Only(..) => {
                Err("universal restriction on the left of an inclusion".to_string())
            }
            Concept::OneOf(_) => {
                Err("nested enumeration on the left of an inclusion".to_string())
            }
        }
    }

    /// Lower a concept on the right of an inclusion
    fn rhs_concept(
        &mut self,
        concept: &Concept,
        subject: u8,
        alloc: &mut VarAlloc,
        out: &mut CompiledAxioms,
    ) -> Result<RhsParts, String> {
        let v = self.vocab;
        match concept {
            Concept::Atomic(c) => Ok(RhsParts {
                templates: vec![pat(var(subject), cst(v.rdf_type), cst(*c))],
                ..Default::default()
            }),
            Concept::Thing => Ok(RhsParts {
                templates: vec![pat(var(subject), cst(v.rdf_type), cst(v.thing))],
                ..Default::default()
            }),
            Concept::Nothing => Ok(RhsParts {
                templates: vec![pat(var(subject), cst(v.rdf_type), cst(v.nothing))],
                ..Default::default()
            }),
            Concept::And(a, b) => {
                let mut parts = self.rhs_concept(a, subject, alloc, out)?;
                parts.merge(self.rhs_concept(b, subject, alloc, out)?);
                Ok(parts)
            }
            Concept::Only(role, filler) => {
                let y = alloc.fresh();
                let mut parts = self.rhs_concept(filler, y, alloc, out)?;
                parts.extra_lhs.insert(0, pat(var(subject), cst(*role), var(y)));
                Ok(parts)
            }
            Concept::HasValue(role, value) => Ok(RhsParts {
                templates: vec![pat(var(subject), cst(*role), cst(*value))],
                ..Default::default()
            }),
            Concept::HasSelf(role) => Ok(RhsParts {
                templates: vec![pat(var(subject), cst(*role), var(subject))],
                ..Default::default()
            }),
            Concept::MaxCard(0, role, filler) => {
                let y = alloc.fresh();
                let mut extra = vec![pat(var(subject), cst(*role), var(y))];
                match filler.as_ref() {
                    Concept::Thing => {}
                    Concept::Atomic(c) => extra.push(pat(var(y), cst(v.rdf_type), cst(*c))),
                    _ => return Err("max-0 cardinality over a complex filler".to_string()),
                }
                self.note_bounded(*role, out);
                Ok(RhsParts {
                    extra_lhs: extra,
                    templates: vec![pat(var(subject), cst(v.rdf_type), cst(v.nothing))],
                    ..Default::default()
                })
            }
            Concept::MaxCard(1, role, filler) => {
                let y1 = alloc.fresh();
                let y2 = alloc.fresh();
                let mut extra = vec![
                    pat(var(subject), cst(*role), var(y1)),
                    pat(var(subject), cst(*role), var(y2)),
                ];
                match filler.as_ref() {
                    Concept::Thing => {}
                    Concept::Atomic(c) => {
                        extra.push(pat(var(y1), cst(v.rdf_type), cst(*c)));
                        extra.push(pat(var(y2), cst(v.rdf_type), cst(*c)));
                    }
                    _ => return Err("max-1 cardinality over a complex filler".to_string()),
                }
                self.note_bounded(*role, out);
                Ok(RhsParts {
                    extra_lhs: extra,
                    builtins: vec![BuiltinCall::new(BuiltinOp::NotEqual, vec![var(y1), var(y2)])],
                    templates: vec![pat(var(y1), cst(v.same_as), var(y2))],
                })
            }
            Concept::MaxCard(n, _, _) | Concept::ExactCard(n, _, _) => Err(format!(
                "cardinality {} on the right of an inclusion",
                n
            )),
            Concept::Some(..) | Concept::MinCard(..) => {
                Err("existential on the right of an inclusion generates fresh individuals"
                    .to_string())
            }
            Concept::Or(..) => Err("union on the right of an inclusion".to_string()),
            Concept::Not(_) => Err("complement on the right of an inclusion".to_string()),
            Concept::OneOf(_) => Err("enumeration on the right of an inclusion".to_string()),
        }
    }

    fn compile_inclusion(
        &mut self,
        name: &str,
        sub: &Concept,
        sup: &Concept,
        out: &mut CompiledAxioms,
    ) {
        // Enumerations on the left lower to ground assertions per member
        if let Concept::OneOf(members) = sub {
            for &m in members {
                self.assert_concept(m, sup, out);
            }
            return;
        }

        let mut alloc = VarAlloc::default();
        let x = alloc.fresh();
        let alternatives = match self.lhs_concept(sub, x, &mut alloc) {
            Ok(alts) => alts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        let parts = match self.rhs_concept(sup, x, &mut alloc, out) {
            Ok(parts) => parts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        for alt in alternatives {
            let mut lhs = alt;
            lhs.extend(parts.extra_lhs.iter().cloned());
            let production = self.make(
                name,
                alloc.count,
                lhs,
                parts.builtins.clone(),
                parts.templates.clone(),
            );
            out.productions.push(production);
        }
        if let (Concept::Atomic(a), Concept::Atomic(b)) = (sub, sup) {
            out.facts.push(Triple::new(*a, self.vocab.sub_class_of, *b));
        }
    }

    fn compile_disjoint_pair(&mut self, a: &Concept, b: &Concept, out: &mut CompiledAxioms) {
        let v = self.vocab;
        let mut alloc = VarAlloc::default();
        let x = alloc.fresh();
        let left = match self.lhs_concept(a, x, &mut alloc) {
            Ok(alts) => alts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        let right = match self.lhs_concept(b, x, &mut alloc) {
            Ok(alts) => alts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        for l in &left {
            for r in &right {
                let mut lhs = l.clone();
                lhs.extend(r.iter().cloned());
                let production = self.make(
                    "cax-dw",
                    alloc.count,
                    lhs,
                    vec![],
                    vec![pat(var(x), cst(v.rdf_type), cst(v.nothing))],
                );
                out.productions.push(production);
            }
        }
        if let (Concept::Atomic(ca), Concept::Atomic(cb)) = (a, b) {
            out.facts.push(Triple::new(*ca, v.disjoint_with, *cb));
        }
    }

    fn compile_role_frame(
        &mut self,
        name: &str,
        role: TermId,
        concept: &Concept,
        on_subject: bool,
        out: &mut CompiledAxioms,
    ) {
        let mut alloc = VarAlloc::default();
        let x = alloc.fresh();
        let y = alloc.fresh();
        let target = if on_subject { x } else { y };
        let parts = match self.rhs_concept(concept, target, &mut alloc, out) {
            Ok(parts) => parts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        let mut lhs = vec![pat(var(x), cst(role), var(y))];
        lhs.extend(parts.extra_lhs.iter().cloned());
        let production = self.make(name, alloc.count, lhs, parts.builtins, parts.templates);
        out.productions.push(production);
    }

    fn compile_has_key(&mut self, class: &Concept, keys: &[TermId], out: &mut CompiledAxioms) {
        let v = self.vocab;
        if keys.is_empty() {
            out.warnings.push("key axiom without key roles".to_string());
            return;
        }
        let mut alloc = VarAlloc::default();
        let x = alloc.fresh();
        let y = alloc.fresh();
        let left = match self.lhs_concept(class, x, &mut alloc) {
            Ok(alts) => alts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        let right = match self.lhs_concept(class, y, &mut alloc) {
            Ok(alts) => alts,
            Err(warning) => {
                out.warnings.push(warning);
                return;
            }
        };
        let mut key_patterns = Vec::with_capacity(keys.len() * 2);
        for &key in keys {
            let value = alloc.fresh();
            key_patterns.push(pat(var(x), cst(key), var(value)));
            key_patterns.push(pat(var(y), cst(key), var(value)));
        }
        for l in &left {
            for r in &right {
                let mut lhs = l.clone();
                lhs.extend(r.iter().cloned());
                lhs.extend(key_patterns.iter().cloned());
                let production = self.make(
                    "prp-key",
                    alloc.count,
                    lhs,
                    vec![BuiltinCall::new(BuiltinOp::NotEqual, vec![var(x), var(y)])],
                    vec![pat(var(x), cst(v.same_as), var(y))],
                );
                out.productions.push(production);
            }
        }
    }

    // ------------------------------------------------------------------
    // SWRL
    // ------------------------------------------------------------------

    fn compile_swrl(&mut self, body: &[SwrlAtom], head: &[SwrlAtom], out: &mut CompiledAxioms) {
        let v = self.vocab;
        let mut alloc = VarAlloc::default();
        let mut names: FnvHashMap<String, u8> = FnvHashMap::default();
        let slot = |arg: &SwrlArg, alloc: &mut VarAlloc, names: &mut FnvHashMap<String, u8>| {
            match arg {
                SwrlArg::Term(id) => cst(*id),
                SwrlArg::Var(name) => var(*names
                    .entry(name.clone())
                    .or_insert_with(|| alloc.fresh())),
            }
        };

        let mut lhs = Vec::new();
        let mut builtins = Vec::new();
        for atom in body {
            match atom {
                SwrlAtom::Class { concept, arg } => {
                    let s = slot(arg, &mut alloc, &mut names);
                    lhs.push(pat(s, cst(v.rdf_type), cst(*concept)));
                }
                SwrlAtom::Role {
                    role,
                    subject,
                    object,
                }
                | SwrlAtom::Data {
                    role,
                    subject,
                    value: object,
                } => {
                    let s = slot(subject, &mut alloc, &mut names);
                    let o = slot(object, &mut alloc, &mut names);
                    lhs.push(pat(s, cst(*role), o));
                }
                SwrlAtom::SameAs(a, b) => {
                    let sa = slot(a, &mut alloc, &mut names);
                    let sb = slot(b, &mut alloc, &mut names);
                    lhs.push(pat(sa, cst(v.same_as), sb));
                }
                SwrlAtom::DifferentFrom(a, b) => {
                    let sa = slot(a, &mut alloc, &mut names);
                    let sb = slot(b, &mut alloc, &mut names);
                    lhs.push(pat(sa, cst(v.different_from), sb));
                }
                SwrlAtom::Builtin { op, args } => {
                    let slots = args
                        .iter()
                        .map(|a| slot(a, &mut alloc, &mut names))
                        .collect();
                    builtins.push(BuiltinCall::new(*op, slots));
                }
            }
        }

        // Every builtin argument must be bound by the patterns, except the
        // result slot of a computing builtin, which becomes bound itself.
        let mut bound: FnvHashSet<u8> = lhs.iter().flat_map(|p| p.vars()).collect();
        for call in &builtins {
            let arity = call.args.len();
            for (i, arg) in call.args.iter().enumerate() {
                if let Slot::Var(idx) = arg {
                    let is_result = call.op.binds_result() && i + 1 == arity;
                    if is_result {
                        bound.insert(*idx);
                    } else if !bound.contains(idx) {
                        out.warnings.push(format!(
                            "builtin {} argument is never bound by the rule body",
                            call.op
                        ));
                        return;
                    }
                }
            }
        }

        let mut rhs = Vec::new();
        for atom in head {
            match atom {
                SwrlAtom::Class { concept, arg } => {
                    let s = slot(arg, &mut alloc, &mut names);
                    rhs.push(pat(s, cst(v.rdf_type), cst(*concept)));
                }
                SwrlAtom::Role {
                    role,
                    subject,
                    object,
                }
                | SwrlAtom::Data {
                    role,
                    subject,
                    value: object,
                } => {
                    let s = slot(subject, &mut alloc, &mut names);
                    let o = slot(object, &mut alloc, &mut names);
                    rhs.push(pat(s, cst(*role), o));
                }
                SwrlAtom::SameAs(a, b) => {
                    let sa = slot(a, &mut alloc, &mut names);
                    let sb = slot(b, &mut alloc, &mut names);
                    rhs.push(pat(sa, cst(v.same_as), sb));
                }
                SwrlAtom::DifferentFrom(a, b) => {
                    let sa = slot(a, &mut alloc, &mut names);
                    let sb = slot(b, &mut alloc, &mut names);
                    rhs.push(pat(sa, cst(v.different_from), sb));
                }
                SwrlAtom::Builtin { .. } => {
                    out.warnings.push("builtin atom in a rule head".to_string());
                    return;
                }
            }
        }

        // Head variables must come from the body; anything else would mint
        // fresh individuals.
        for template in &rhs {
            for idx in template.vars() {
                if !bound.contains(&idx) {
                    out.warnings
                        .push("rule head introduces an unbound variable".to_string());
                    return;
                }
            }
        }

        if lhs.is_empty() {
            out.warnings.push("rule with an empty body".to_string());
            return;
        }

        let production = self.make("swrl", alloc.count, lhs, builtins, rhs);
        out.productions.push(production);
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn note_bounded(&mut self, role: TermId, out: &mut CompiledAxioms) {
        if self.transitive_roles.contains(&role) {
            out.warnings.push(
                "cardinality bound combined with transitivity on the same role".to_string(),
            );
        }
        self.bounded_roles.insert(role);
    }

    fn make(
        &mut self,
        template: &str,
        var_count: u8,
        lhs: Vec<Pattern>,
        builtins: Vec<BuiltinCall>,
        rhs: Vec<Pattern>,
    ) -> Production {
        let id = self.next_id;
        self.next_id += 1;
        Production {
            id,
            name: format!("{}#{}", template, id),
            var_count,
            lhs,
            builtins,
            rhs,
        }
    }

    fn role_inclusion(&mut self, name: &str, sub: TermId, sup: TermId) -> Production {
        self.make(
            name,
            2,
            vec![pat(var(0), cst(sub), var(1))],
            vec![],
            vec![pat(var(0), cst(sup), var(1))],
        )
    }
}

#[inline]
fn pat(subject: Slot, predicate: Slot, object: Slot) -> Pattern {
    Pattern::new(subject, predicate, object)
}

#[inline]
fn var(idx: u8) -> Slot {
    Slot::Var(idx)
}

#[inline]
fn cst(id: TermId) -> Slot {
    Slot::Const(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::TermStore;

    fn setup() -> (TermStore, Vocab, AxiomCompiler) {
        let mut terms = TermStore::new();
        let vocab = Vocab::intern(&mut terms);
        let compiler = AxiomCompiler::new(vocab);
        (terms, vocab, compiler)
    }

    #[test]
    fn test_atomic_inclusion_emits_rule_and_schema_fact() {
        let (mut terms, vocab, mut compiler) = setup();
        let person = terms.intern_name("http://example.org/Person");
        let animal = terms.intern_name("http://example.org/Animal");
        let out = compiler.compile(
            &Axiom::SubClassOf {
                sub: Concept::Atomic(person),
                sup: Concept::Atomic(animal),
            },
            &mut terms,
        );
        assert_eq!(out.productions.len(), 1);
        let p = &out.productions[0];
        assert_eq!(p.lhs, vec![pat(var(0), cst(vocab.rdf_type), cst(person))]);
        assert_eq!(p.rhs, vec![pat(var(0), cst(vocab.rdf_type), cst(animal))]);
        assert_eq!(
            out.facts,
            vec![Triple::new(person, vocab.sub_class_of, animal)]
        );
    }

    #[test]
    fn test_existential_body_joins_filler() {
        let (mut terms, vocab, mut compiler) = setup();
        let has_part = terms.intern_name("http://example.org/hasPart");
        let wheel = terms.intern_name("http://example.org/Wheel");
        let vehicle = terms.intern_name("http://example.org/Vehicle");
        let out = compiler.compile(
            &Axiom::SubClassOf {
                sub: Concept::some(has_part, Concept::Atomic(wheel)),
                sup: Concept::Atomic(vehicle),
            },
            &mut terms,
        );
        assert_eq!(out.productions.len(), 1);
        let p = &out.productions[0];
        assert_eq!(p.lhs.len(), 2);
        assert_eq!(p.lhs[0], pat(var(0), cst(has_part), var(1)));
        assert_eq!(p.lhs[1], pat(var(1), cst(vocab.rdf_type), cst(wheel)));
    }

    #[test]
    fn test_union_body_splits_productions() {
        let (mut terms, _, mut compiler) = setup();
        let cat = terms.intern_name("http://example.org/Cat");
        let dog = terms.intern_name("http://example.org/Dog");
        let pet = terms.intern_name("http://example.org/Pet");
        let out = compiler.compile(
            &Axiom::SubClassOf {
                sub: Concept::or(Concept::Atomic(cat), Concept::Atomic(dog)),
                sup: Concept::Atomic(pet),
            },
            &mut terms,
        );
        assert_eq!(out.productions.len(), 2);
    }

    #[test]
    fn test_existential_head_is_refused() {
        let (mut terms, _, mut compiler) = setup();
        let a = terms.intern_name("http://example.org/A");
        let r = terms.intern_name("http://example.org/r");
        let b = terms.intern_name("http://example.org/B");
        let out = compiler.compile(
            &Axiom::SubClassOf {
                sub: Concept::Atomic(a),
                sup: Concept::some(r, Concept::Atomic(b)),
            },
            &mut terms,
        );
        assert!(out.productions.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_transitive_after_cardinality_is_refused() {
        let (mut terms, _, mut compiler) = setup();
        let r = terms.intern_name("http://example.org/r");
        let first = compiler.compile(&Axiom::FunctionalRole(r), &mut terms);
        assert_eq!(first.productions.len(), 1);
        let second = compiler.compile(&Axiom::TransitiveRole(r), &mut terms);
        assert!(second.productions.is_empty());
        assert_eq!(second.warnings.len(), 1);
    }

    #[test]
    fn test_role_chain_builds_left_deep_join() {
        let (mut terms, _, mut compiler) = setup();
        let has_parent = terms.intern_name("http://example.org/hasParent");
        let has_grandparent = terms.intern_name("http://example.org/hasGrandparent");
        let out = compiler.compile(
            &Axiom::RoleChain {
                chain: vec![has_parent, has_parent],
                sup: has_grandparent,
            },
            &mut terms,
        );
        assert_eq!(out.productions.len(), 1);
        let p = &out.productions[0];
        assert_eq!(p.lhs.len(), 2);
        assert_eq!(p.lhs[0], pat(var(0), cst(has_parent), var(1)));
        assert_eq!(p.lhs[1], pat(var(1), cst(has_parent), var(2)));
        assert_eq!(p.rhs, vec![pat(var(0), cst(has_grandparent), var(2))]);
    }

    #[test]
    fn test_swrl_head_variable_must_be_bound() {
        let (mut terms, _, mut compiler) = setup();
        let person = terms.intern_name("http://example.org/Person");
        let knows = terms.intern_name("http://example.org/knows");
        let out = compiler.compile(
            &Axiom::SwrlRule {
                body: vec![SwrlAtom::Class {
                    concept: person,
                    arg: SwrlArg::Var("x".to_string()),
                }],
                head: vec![SwrlAtom::Role {
                    role: knows,
                    subject: SwrlArg::Var("x".to_string()),
                    object: SwrlArg::Var("someone".to_string()),
                }],
            },
            &mut terms,
        );
        assert!(out.productions.is_empty());
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_different_from_expands_pairwise() {
        let (mut terms, vocab, mut compiler) = setup();
        let a = terms.intern_name("http://example.org/a");
        let b = terms.intern_name("http://example.org/b");
        let c = terms.intern_name("http://example.org/c");
        let out = compiler.compile(&Axiom::DifferentFrom(vec![a, b, c]), &mut terms);
        assert_eq!(out.facts.len(), 3);
        assert!(out
            .facts
            .contains(&Triple::new(a, vocab.different_from, c)));
    }
}
