//! RETE discrimination network
//!
//! Three node kinds: alpha nodes filter single patterns and are shared across
//! productions with identical patterns; beta join steps pair a token stream
//! with an alpha input over hash indices keyed by the shared-variable tuple;
//! builtin evaluation guards the completed match just before the terminal
//! fires. Terminals assert consequents back into the fact store with the
//! matched premise ids as the justification.
//!
//! Deltas flow with a sign. Insertion and removal take the same path through
//! the join indices, which is what makes counting-based invalidation line up
//! with set-semantics joins: every firing that happened forward is replayed
//! backward exactly once.

use std::collections::VecDeque;

use fnv::{FnvHashMap, FnvHashSet};
use regex::Regex;
use tracing::trace;

use crate::event::{EventLog, ReasonerEvent};
use crate::store::{FactStore, TripleId};
use crate::term::{TermId, TermStore, Triple};

mod builtins;
mod production;

pub use builtins::{evaluate as evaluate_builtin, BuiltinOutcome};
pub use production::{BuiltinCall, BuiltinOp, Pattern, Production, Slot};

/// Direction of a propagated change
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sign {
    Insert,
    Remove,
}

/// A fact-level change travelling through the network
#[derive(Clone, Copy, Debug)]
pub struct Delta {
    pub id: TripleId,
    pub triple: Triple,
    pub sign: Sign,
}

/// Mutable context threaded through node activations
pub struct ActivationCtx<'a> {
    pub terms: &'a mut TermStore,
    pub store: &'a mut FactStore,
    pub events: &'a mut EventLog,
    pub agenda: &'a mut VecDeque<Delta>,
    pub regexes: &'a mut FnvHashMap<String, Regex>,
    pub fired: &'a mut u64,
}

/// Alpha signature slot: constants verbatim, variables renamed by first
/// occurrence so `(?x r ?x)` and `(?a r ?a)` share a node while `(?x r ?y)`
/// does not
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum SigSlot {
    Const(TermId),
    Var(u8),
}

type AlphaSig = [SigSlot; 3];

fn signature(pattern: &Pattern) -> AlphaSig {
    let mut mapping: [Option<u8>; 256] = [None; 256];
    let mut next = 0u8;
    let mut rename = |slot: Slot| match slot {
        Slot::Const(id) => SigSlot::Const(id),
        Slot::Var(v) => {
            let idx = mapping[v as usize].unwrap_or_else(|| {
                let fresh = next;
                mapping[v as usize] = Some(fresh);
                next += 1;
                fresh
            });
            SigSlot::Var(idx)
        }
    };
    [
        rename(pattern.subject),
        rename(pattern.predicate),
        rename(pattern.object),
    ]
}

fn sig_matches(sig: &AlphaSig, triple: &Triple) -> bool {
    let values = triple.slots();
    let mut seen: [Option<TermId>; 3] = [None; 3];
    for (slot, value) in sig.iter().zip(values) {
        match slot {
            SigSlot::Const(c) => {
                if *c != value {
                    return false;
                }
            }
            SigSlot::Var(v) => match seen[*v as usize] {
                Some(prev) => {
                    if prev != value {
                        return false;
                    }
                }
                None => seen[*v as usize] = Some(value),
            },
        }
    }
    true
}

/// A partial match: variable frame plus the premise ids that built it
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    bindings: Vec<Option<TermId>>,
    premises: Vec<TripleId>,
}

#[derive(Debug)]
struct AlphaNode {
    sig: AlphaSig,
    memory: FnvHashSet<TripleId>,
    /// (chain, lhs position); position 0 seeds the chain, position i > 0 is
    /// the right input of join step i - 1
    successors: Vec<(usize, usize)>,
}

#[derive(Debug)]
struct JoinStep {
    right_pattern: Pattern,
    /// Shared variables between the accumulated left frame and the right
    /// pattern, sorted; empty means a cross product
    key_vars: Vec<u8>,
    left_index: FnvHashMap<Vec<TermId>, Vec<Token>>,
    right_index: FnvHashMap<Vec<TermId>, Vec<TripleId>>,
}

#[derive(Debug)]
struct Chain {
    production: Production,
    /// Alpha node per lhs position
    alphas: Vec<usize>,
    steps: Vec<JoinStep>,
}

/// The compiled network
#[derive(Debug, Default)]
pub struct Network {
    alphas: Vec<AlphaNode>,
    alpha_by_sig: FnvHashMap<AlphaSig, usize>,
    alpha_by_predicate: FnvHashMap<TermId, Vec<usize>>,
    alpha_any_predicate: Vec<usize>,
    chains: Vec<Chain>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of alpha nodes (shared nodes counted once)
    pub fn alpha_count(&self) -> usize {
        self.alphas.len()
    }

    /// Number of wired productions
    pub fn production_count(&self) -> usize {
        self.chains.len()
    }

    /// Wire a production into the network
    ///
    /// Builds a left-deep join chain in the compiler-supplied pattern order;
    /// the network does not re-plan. Returns the chain index for seeding.
    pub fn add_production(&mut self, production: Production) -> usize {
        let chain_idx = self.chains.len();
        let mut alphas = Vec::with_capacity(production.lhs.len());
        for (position, pattern) in production.lhs.iter().enumerate() {
            let alpha_idx = self.intern_alpha(pattern);
            self.alphas[alpha_idx].successors.push((chain_idx, position));
            alphas.push(alpha_idx);
        }

        let mut steps = Vec::new();
        let mut bound: FnvHashSet<u8> = production.lhs[0].vars().collect();
        for pattern in production.lhs.iter().skip(1) {
            let right_vars: FnvHashSet<u8> = pattern.vars().collect();
            let mut key_vars: Vec<u8> = bound.intersection(&right_vars).copied().collect();
            key_vars.sort_unstable();
            steps.push(JoinStep {
                right_pattern: *pattern,
                key_vars,
                left_index: FnvHashMap::default(),
                right_index: FnvHashMap::default(),
            });
            bound.extend(right_vars);
        }

        self.chains.push(Chain {
            production,
            alphas,
            steps,
        });
        chain_idx
    }

    fn intern_alpha(&mut self, pattern: &Pattern) -> usize {
        let sig = signature(pattern);
        if let Some(&idx) = self.alpha_by_sig.get(&sig) {
            return idx;
        }
        let idx = self.alphas.len();
        self.alphas.push(AlphaNode {
            sig,
            memory: FnvHashSet::default(),
            successors: Vec::new(),
        });
        self.alpha_by_sig.insert(sig, idx);
        match sig[1] {
            SigSlot::Const(p) => self.alpha_by_predicate.entry(p).or_default().push(idx),
            SigSlot::Var(_) => self.alpha_any_predicate.push(idx),
        }
        idx
    }

    /// Feed one delta to every matching alpha node
    pub fn activate(&mut self, delta: Delta, ctx: &mut ActivationCtx<'_>) {
        let mut candidates: Vec<usize> = self
            .alpha_by_predicate
            .get(&delta.triple.predicate)
            .cloned()
            .unwrap_or_default();
        candidates.extend(self.alpha_any_predicate.iter().copied());

        for alpha_idx in candidates {
            if !sig_matches(&self.alphas[alpha_idx].sig, &delta.triple) {
                continue;
            }
            let fresh = match delta.sign {
                Sign::Insert => self.alphas[alpha_idx].memory.insert(delta.id),
                Sign::Remove => self.alphas[alpha_idx].memory.remove(&delta.id),
            };
            if !fresh {
                continue;
            }
            let successors = self.alphas[alpha_idx].successors.clone();
            for (chain, position) in successors {
                self.activate_position(chain, position, delta, ctx);
            }
        }
    }

    /// Replay one delta through a single chain, used to seed a production
    /// added after facts already exist
    pub fn activate_chain(&mut self, chain: usize, delta: Delta, ctx: &mut ActivationCtx<'_>) {
        let positions = self.chains[chain].alphas.len();
        for position in 0..positions {
            let alpha_idx = self.chains[chain].alphas[position];
            if !sig_matches(&self.alphas[alpha_idx].sig, &delta.triple) {
                continue;
            }
            // Shared alpha memories may already hold the triple; the new
            // chain's join state still has to see it.
            if delta.sign == Sign::Insert {
                self.alphas[alpha_idx].memory.insert(delta.id);
            }
            self.activate_position(chain, position, delta, ctx);
        }
    }

    fn activate_position(
        &mut self,
        chain: usize,
        position: usize,
        delta: Delta,
        ctx: &mut ActivationCtx<'_>,
    ) {
        if position == 0 {
            self.seed_activate(chain, delta, ctx);
        } else {
            self.right_activate(chain, position - 1, delta, ctx);
        }
    }

    fn seed_activate(&mut self, chain: usize, delta: Delta, ctx: &mut ActivationCtx<'_>) {
        let (pattern, var_count) = {
            let c = &self.chains[chain];
            (c.production.lhs[0], c.production.var_count)
        };
        let token = extract_token(&pattern, &delta.triple, delta.id, var_count);
        if self.chains[chain].steps.is_empty() {
            self.finish(chain, token, delta.sign, ctx);
        } else {
            self.left_activate(chain, 0, token, delta.sign, ctx);
        }
    }

    fn left_activate(
        &mut self,
        chain: usize,
        step_idx: usize,
        token: Token,
        sign: Sign,
        ctx: &mut ActivationCtx<'_>,
    ) {
        let (right_ids, right_pattern) = {
            let step = &mut self.chains[chain].steps[step_idx];
            let key = key_of_token(&token, &step.key_vars);
            match sign {
                Sign::Insert => {
                    step.left_index.entry(key.clone()).or_default().push(token.clone());
                }
                Sign::Remove => {
                    if let Some(bucket) = step.left_index.get_mut(&key) {
                        if let Some(pos) = bucket.iter().position(|t| t == &token) {
                            bucket.swap_remove(pos);
                        }
                    }
                }
            }
            let right_ids = step.right_index.get(&key).cloned().unwrap_or_default();
            (right_ids, step.right_pattern)
        };

        for right_id in right_ids {
            let right_triple = ctx.store.triple(right_id);
            let merged = merge_token(&token, &right_pattern, &right_triple, right_id);
            self.emit(chain, step_idx, merged, sign, ctx);
        }
    }

    fn right_activate(
        &mut self,
        chain: usize,
        step_idx: usize,
        delta: Delta,
        ctx: &mut ActivationCtx<'_>,
    ) {
        let var_count = self.chains[chain].production.var_count;
        let (lefts, right_pattern) = {
            let step = &mut self.chains[chain].steps[step_idx];
            let fragment = extract_bindings(&step.right_pattern, &delta.triple, var_count);
            let key: Vec<TermId> = step
                .key_vars
                .iter()
                .map(|&v| fragment[v as usize].expect("key variable unbound on right"))
                .collect();
            match delta.sign {
                Sign::Insert => {
                    step.right_index.entry(key.clone()).or_default().push(delta.id);
                }
                Sign::Remove => {
                    if let Some(bucket) = step.right_index.get_mut(&key) {
                        if let Some(pos) = bucket.iter().position(|&id| id == delta.id) {
                            bucket.swap_remove(pos);
                        }
                    }
                }
            }
            let lefts = step.left_index.get(&key).cloned().unwrap_or_default();
            (lefts, step.right_pattern)
        };

        for left in lefts {
            let merged = merge_token(&left, &right_pattern, &delta.triple, delta.id);
            self.emit(chain, step_idx, merged, delta.sign, ctx);
        }
    }

    fn emit(
        &mut self,
        chain: usize,
        step_idx: usize,
        token: Token,
        sign: Sign,
        ctx: &mut ActivationCtx<'_>,
    ) {
        if step_idx + 1 < self.chains[chain].steps.len() {
            self.left_activate(chain, step_idx + 1, token, sign, ctx);
        } else {
            self.finish(chain, token, sign, ctx);
        }
    }

    /// Run the production's builtins and fire the terminal
    fn finish(&self, chain: usize, token: Token, sign: Sign, ctx: &mut ActivationCtx<'_>) {
        let production = &self.chains[chain].production;
        let mut bindings = token.bindings.clone();

        for call in &production.builtins {
            match evaluate_builtin(call.op, &call.args, &bindings, ctx.terms, ctx.regexes) {
                BuiltinOutcome::Pass => {}
                BuiltinOutcome::Bind(v, id) => bindings[v as usize] = Some(id),
                BuiltinOutcome::Fail => return,
                BuiltinOutcome::TypeError(detail) => {
                    if sign == Sign::Insert {
                        ctx.events.record(ReasonerEvent::LiteralTypeError { detail });
                    }
                    return;
                }
            }
        }

        if sign == Sign::Insert {
            *ctx.fired += 1;
        }

        for template in &production.rhs {
            let Some(triple) = instantiate(template, &bindings) else {
                debug_assert!(false, "unbound variable in rhs template");
                continue;
            };
            match sign {
                Sign::Insert => {
                    let outcome = ctx.store.derive_fact(triple, token.premises.clone());
                    if outcome.added {
                        trace!(production = %production.name, "derived");
                        ctx.agenda.push_back(Delta {
                            id: outcome.id,
                            triple,
                            sign: Sign::Insert,
                        });
                    }
                }
                Sign::Remove => {
                    let undo = ctx.store.undo_justification(&triple, &token.premises);
                    if let Some(killed) = undo.killed {
                        trace!(production = %production.name, "retracted");
                        ctx.agenda.push_back(Delta {
                            id: killed,
                            triple,
                            sign: Sign::Remove,
                        });
                    }
                }
            }
        }
    }
}

fn extract_token(pattern: &Pattern, triple: &Triple, id: TripleId, var_count: u8) -> Token {
    let mut bindings = vec![None; var_count as usize];
    for (slot, value) in pattern.slots().into_iter().zip(triple.slots()) {
        if let Slot::Var(v) = slot {
            bindings[v as usize] = Some(value);
        }
    }
    Token {
        bindings,
        premises: vec![id],
    }
}

fn extract_bindings(pattern: &Pattern, triple: &Triple, var_count: u8) -> Vec<Option<TermId>> {
    let mut bindings = vec![None; var_count as usize];
    for (slot, value) in pattern.slots().into_iter().zip(triple.slots()) {
        if let Slot::Var(v) = slot {
            bindings[v as usize] = Some(value);
        }
    }
    bindings
}

fn key_of_token(token: &Token, key_vars: &[u8]) -> Vec<TermId> {
    key_vars
        .iter()
        .map(|&v| token.bindings[v as usize].expect("key variable unbound on left"))
        .collect()
}

fn merge_token(left: &Token, right_pattern: &Pattern, right_triple: &Triple, right_id: TripleId) -> Token {
    let mut bindings = left.bindings.clone();
    for (slot, value) in right_pattern.slots().into_iter().zip(right_triple.slots()) {
        if let Slot::Var(v) = slot {
            bindings[v as usize] = Some(value);
        }
    }
    let mut premises = left.premises.clone();
    premises.push(right_id);
    Token { bindings, premises }
}

fn instantiate(template: &Pattern, bindings: &[Option<TermId>]) -> Option<Triple> {
    let resolve = |slot: Slot| match slot {
        Slot::Const(id) => Some(id),
        Slot::Var(v) => bindings[v as usize],
    };
    Some(Triple::new(
        resolve(template.subject)?,
        resolve(template.predicate)?,
        resolve(template.object)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_sharing_by_signature() {
        let mut network = Network::new();
        let type_id = TermId::from_raw(10);
        let person = TermId::from_raw(11);
        let animal = TermId::from_raw(12);

        // Two productions over the same body pattern with different variable
        // numbering share one alpha node.
        network.add_production(Production {
            id: 0,
            name: "a".into(),
            var_count: 1,
            lhs: vec![Pattern::new(Slot::Var(0), Slot::Const(type_id), Slot::Const(person))],
            builtins: vec![],
            rhs: vec![Pattern::new(Slot::Var(0), Slot::Const(type_id), Slot::Const(animal))],
        });
        network.add_production(Production {
            id: 1,
            name: "b".into(),
            var_count: 2,
            lhs: vec![
                Pattern::new(Slot::Var(1), Slot::Const(type_id), Slot::Const(person)),
                Pattern::new(Slot::Var(1), Slot::Const(animal), Slot::Var(0)),
            ],
            builtins: vec![],
            rhs: vec![Pattern::new(Slot::Var(0), Slot::Const(type_id), Slot::Const(animal))],
        });

        assert_eq!(network.production_count(), 2);
        assert_eq!(network.alpha_count(), 2);
    }

    #[test]
    fn test_self_equality_pattern_gets_own_alpha() {
        let mut network = Network::new();
        let r = TermId::from_raw(5);
        network.add_production(Production {
            id: 0,
            name: "irreflexive".into(),
            var_count: 1,
            lhs: vec![Pattern::new(Slot::Var(0), Slot::Const(r), Slot::Var(0))],
            builtins: vec![],
            rhs: vec![Pattern::new(Slot::Var(0), Slot::Const(r), Slot::Var(0))],
        });
        network.add_production(Production {
            id: 1,
            name: "plain".into(),
            var_count: 2,
            lhs: vec![Pattern::new(Slot::Var(0), Slot::Const(r), Slot::Var(1))],
            builtins: vec![],
            rhs: vec![Pattern::new(Slot::Var(1), Slot::Const(r), Slot::Var(0))],
        });
        assert_eq!(network.alpha_count(), 2);
    }

    #[test]
    fn test_signature_matching_enforces_equality() {
        let sig = [
            SigSlot::Var(0),
            SigSlot::Const(TermId::from_raw(1)),
            SigSlot::Var(0),
        ];
        let reflexive = Triple::new(
            TermId::from_raw(7),
            TermId::from_raw(1),
            TermId::from_raw(7),
        );
        let plain = Triple::new(
            TermId::from_raw(7),
            TermId::from_raw(1),
            TermId::from_raw(8),
        );
        assert!(sig_matches(&sig, &reflexive));
        assert!(!sig_matches(&sig, &plain));
    }
}
