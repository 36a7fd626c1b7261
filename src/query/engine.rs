//! Query execution
//!
//! Plan and run a conjunctive query against a fact store view. Patterns are
//! ordered by a greedy selectivity heuristic (cached by structural
//! fingerprint), joined pairwise with hash joins over shared variables,
//! filters pushed down as soon as their variables are bound. UNION blocks are
//! each evaluated into an independent relation and joined with the outer
//! patterns and with each other; short-circuiting a UNION while another block
//! remains is exactly the hazard this layout avoids. MINUS is an anti-join
//! over shared variables. Modifiers apply in DISTINCT, ORDER BY, OFFSET,
//! LIMIT order.

use std::cmp::Ordering;

use fnv::{FnvHashMap, FnvHashSet};
use regex::Regex;

use crate::error::{ErrorCode, ReasonerError, ReasonerResult};
use crate::store::{FactStore, View};
use crate::term::{Term, TermId, TermStore};

use super::{
    BasicPattern, CompareOp, FilterExpr, FilterValue, Order, PlanCache, Query, QueryTerm, Table,
};

/// A pattern slot after constant resolution
#[derive(Clone, Debug)]
enum Resolved {
    Const(TermId),
    Var(String),
}

type ResolvedPattern = [Resolved; 3];

#[derive(Clone, Debug)]
enum RValue {
    Const(TermId),
    Var(String),
}

#[derive(Debug)]
enum RFilter {
    Compare(CompareOp, RValue, RValue),
    Regex(RValue, Regex),
    Bound(String),
    And(Box<RFilter>, Box<RFilter>),
    Or(Box<RFilter>, Box<RFilter>),
    Not(Box<RFilter>),
}

impl RFilter {
    fn vars(&self, out: &mut Vec<String>) {
        match self {
            RFilter::Compare(_, a, b) => {
                if let RValue::Var(v) = a {
                    out.push(v.clone());
                }
                if let RValue::Var(v) = b {
                    out.push(v.clone());
                }
            }
            RFilter::Regex(a, _) => {
                if let RValue::Var(v) = a {
                    out.push(v.clone());
                }
            }
            RFilter::Bound(v) => out.push(v.clone()),
            RFilter::And(a, b) | RFilter::Or(a, b) => {
                a.vars(out);
                b.vars(out);
            }
            RFilter::Not(a) => a.vars(out),
        }
    }
}

/// Intermediate solution relation
#[derive(Clone, Debug)]
struct Relation {
    vars: Vec<String>,
    rows: Vec<Vec<Option<TermId>>>,
}

impl Relation {
    fn unit() -> Self {
        Relation {
            vars: Vec::new(),
            rows: vec![Vec::new()],
        }
    }

    fn col(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == name)
    }
}

/// Execute a query against a store view
pub fn execute(
    query: &Query,
    terms: &TermStore,
    store: &FactStore,
    view: View,
    cache: &PlanCache,
    max_rows: Option<usize>,
) -> ReasonerResult<Table> {
    let projected = validate(query)?;

    // Resolve every constant up front; an unknown constant means the store
    // has never seen the term, so nothing can match.
    let Some(plan) = ResolvedQuery::resolve(query, terms) else {
        return Ok(Table::empty(projected));
    };

    let mut applied = vec![false; plan.filters.len()];

    // Outer patterns, then each UNION as its own relation
    let mut relations: Vec<Relation> = Vec::new();
    if !plan.patterns.is_empty() {
        relations.push(eval_basic(
            &plan.patterns,
            &plan.fingerprints[0],
            terms,
            store,
            view,
            cache,
            &plan.filters,
            &mut applied,
        ));
    }
    for (u, branches) in plan.unions.iter().enumerate() {
        let mut parts = Vec::with_capacity(branches.len());
        for (b, branch) in branches.iter().enumerate() {
            let fp = &plan.union_fingerprints[u][b];
            let mut no_pushdown = vec![true; plan.filters.len()];
            parts.push(eval_basic(
                branch,
                fp,
                terms,
                store,
                view,
                cache,
                &plan.filters,
                &mut no_pushdown,
            ));
        }
        relations.push(union_all(parts));
    }

    // Join the independent relations over shared variables
    let mut rel = relations
        .into_iter()
        .reduce(|a, b| join_relations(a, b))
        .unwrap_or_else(Relation::unit);

    // Remaining filters (cross-relation variables)
    for (i, filter) in plan.filters.iter().enumerate() {
        if !applied[i] {
            rel.rows
                .retain(|row| eval_filter(filter, &rel.vars, row, terms));
        }
    }

    // MINUS groups: anti-join over shared variables
    for (m, minus) in plan.minuses.iter().enumerate() {
        let fp = &plan.minus_fingerprints[m];
        let mut no_pushdown = vec![true; plan.filters.len()];
        let minus_rel = eval_basic(
            minus,
            fp,
            terms,
            store,
            view,
            cache,
            &plan.filters,
            &mut no_pushdown,
        );
        rel = anti_join(rel, &minus_rel);
    }

    // Project
    let columns = if projected.is_empty() {
        rel.vars.clone()
    } else {
        projected
    };
    let indices: Vec<usize> = columns
        .iter()
        .map(|c| rel.col(c).expect("validated column"))
        .collect();
    let mut rows: Vec<Vec<Option<TermId>>> = rel
        .rows
        .iter()
        .map(|row| indices.iter().map(|&i| row[i]).collect())
        .collect();

    // DISTINCT, ORDER BY, OFFSET, LIMIT, in that order
    if query.distinct {
        let mut seen: FnvHashSet<Vec<Option<TermId>>> = FnvHashSet::default();
        rows.retain(|row| seen.insert(row.clone()));
    }
    if !query.order_by.is_empty() {
        let keys: Vec<(usize, Order)> = query
            .order_by
            .iter()
            .map(|(var, order)| {
                let idx = columns.iter().position(|c| c == var).expect("validated");
                (idx, *order)
            })
            .collect();
        rows.sort_by(|a, b| {
            for &(idx, order) in &keys {
                let ordering = cmp_cells(terms, a[idx], b[idx]);
                let ordering = match order {
                    Order::Asc => ordering,
                    Order::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
    if let Some(offset) = query.offset {
        rows = rows.into_iter().skip(offset).collect();
    }
    if let Some(limit) = query.limit {
        rows.truncate(limit);
    }
    if let Some(cap) = max_rows {
        rows.truncate(cap);
    }

    Ok(Table { columns, rows })
}

/// Structural validation; returns the projected columns
fn validate(query: &Query) -> ReasonerResult<Vec<String>> {
    if query.patterns.is_empty() && query.unions.is_empty() {
        return Err(ReasonerError::query("query has no patterns")
            .with_code(ErrorCode::EmptyQuery));
    }

    let mut solution: FnvHashSet<&str> = FnvHashSet::default();
    for pattern in &query.patterns {
        solution.extend(pattern.vars());
    }
    for union in &query.unions {
        for branch in union {
            for pattern in branch {
                solution.extend(pattern.vars());
            }
        }
    }
    let mut minus_vars: FnvHashSet<&str> = FnvHashSet::default();
    for minus in &query.minuses {
        for pattern in minus {
            minus_vars.extend(pattern.vars());
        }
    }

    for var in &query.select {
        if !solution.contains(var.as_str()) {
            let code = if minus_vars.contains(var.as_str()) {
                ErrorCode::MinusOnlyVariable
            } else {
                ErrorCode::UnboundSelectVariable
            };
            return Err(ReasonerError::query(format!(
                "selected variable ?{} is not bound by any pattern",
                var
            ))
            .with_code(code)
            .with_context("variable", var.clone()));
        }
    }

    let projected: Vec<String> = if query.select.is_empty() {
        Vec::new()
    } else {
        query.select.clone()
    };
    let order_scope: Vec<&str> = if projected.is_empty() {
        solution.iter().copied().collect()
    } else {
        projected.iter().map(String::as_str).collect()
    };
    for (var, _) in &query.order_by {
        if !order_scope.contains(&var.as_str()) {
            return Err(ReasonerError::query(format!(
                "ORDER BY variable ?{} is absent from the solution",
                var
            ))
            .with_code(ErrorCode::UnknownOrderVariable));
        }
    }

    Ok(projected)
}

/// Fully resolved query: constants interned, fingerprints precomputed
struct ResolvedQuery {
    patterns: Vec<ResolvedPattern>,
    unions: Vec<Vec<Vec<ResolvedPattern>>>,
    minuses: Vec<Vec<ResolvedPattern>>,
    filters: Vec<RFilter>,
    fingerprints: Vec<String>,
    union_fingerprints: Vec<Vec<String>>,
    minus_fingerprints: Vec<String>,
}

impl ResolvedQuery {
    /// `None` when any constant is unknown to the term store
    fn resolve(query: &Query, terms: &TermStore) -> Option<Self> {
        let resolve_term = |qt: &QueryTerm| -> Option<Resolved> {
            match qt {
                QueryTerm::Var(name) => Some(Resolved::Var(name.clone())),
                QueryTerm::Iri(iri) => terms.find_name(iri).map(Resolved::Const),
                QueryTerm::Literal { lexical, datatype } => {
                    terms.find_literal(lexical, datatype).map(Resolved::Const)
                }
            }
        };
        let resolve_basic = |patterns: &BasicPattern| -> Option<Vec<ResolvedPattern>> {
            patterns
                .iter()
                .map(|p| {
                    Some([
                        resolve_term(&p.subject)?,
                        resolve_term(&p.predicate)?,
                        resolve_term(&p.object)?,
                    ])
                })
                .collect()
        };
        let resolve_value = |value: &FilterValue| -> Option<RValue> {
            match value {
                FilterValue::Var(name) => Some(RValue::Var(name.clone())),
                FilterValue::Iri(iri) => terms.find_name(iri).map(RValue::Const),
                FilterValue::Literal { lexical, datatype } => {
                    terms.find_literal(lexical, datatype).map(RValue::Const)
                }
            }
        };

        fn resolve_filter(
            expr: &FilterExpr,
            resolve_value: &impl Fn(&FilterValue) -> Option<RValue>,
        ) -> Option<RFilter> {
            Some(match expr {
                FilterExpr::Compare(op, a, b) => {
                    RFilter::Compare(*op, resolve_value(a)?, resolve_value(b)?)
                }
                FilterExpr::Regex(a, pattern) => {
                    RFilter::Regex(resolve_value(a)?, Regex::new(pattern).ok()?)
                }
                FilterExpr::Bound(v) => RFilter::Bound(v.clone()),
                FilterExpr::And(a, b) => RFilter::And(
                    Box::new(resolve_filter(a, resolve_value)?),
                    Box::new(resolve_filter(b, resolve_value)?),
                ),
                FilterExpr::Or(a, b) => RFilter::Or(
                    Box::new(resolve_filter(a, resolve_value)?),
                    Box::new(resolve_filter(b, resolve_value)?),
                ),
                FilterExpr::Not(a) => {
                    RFilter::Not(Box::new(resolve_filter(a, resolve_value)?))
                }
            })
        }

        let patterns = resolve_basic(&query.patterns)?;
        let mut unions = Vec::new();
        let mut union_fingerprints = Vec::new();
        for union in &query.unions {
            let mut branches = Vec::new();
            let mut fps = Vec::new();
            for branch in union {
                branches.push(resolve_basic(branch)?);
                fps.push(PlanCache::fingerprint(branch));
            }
            unions.push(branches);
            union_fingerprints.push(fps);
        }
        let mut minuses = Vec::new();
        let mut minus_fingerprints = Vec::new();
        for minus in &query.minuses {
            minuses.push(resolve_basic(minus)?);
            minus_fingerprints.push(PlanCache::fingerprint(minus));
        }
        let filters = query
            .filters
            .iter()
            .map(|f| resolve_filter(f, &resolve_value))
            .collect::<Option<Vec<_>>>()?;

        Some(ResolvedQuery {
            fingerprints: vec![PlanCache::fingerprint(&query.patterns)],
            patterns,
            unions,
            minuses,
            filters,
            union_fingerprints,
            minus_fingerprints,
        })
    }
}

/// Evaluate one basic pattern group with plan caching and filter push-down
#[allow(clippy::too_many_arguments)]
fn eval_basic(
    patterns: &[ResolvedPattern],
    fingerprint: &str,
    terms: &TermStore,
    store: &FactStore,
    view: View,
    cache: &PlanCache,
    filters: &[RFilter],
    applied: &mut [bool],
) -> Relation {
    if patterns.is_empty() {
        return Relation::unit();
    }

    let order = cache.get_or_compute(fingerprint, || plan_order(patterns, store));

    let mut rel: Option<Relation> = None;
    for &idx in &order {
        let pattern = &patterns[idx];
        let matches = match_pattern(pattern, store, view);
        rel = Some(match rel {
            None => matches,
            Some(current) => join_relations(current, matches),
        });
        // Push down every filter whose variables are now bound
        let current = rel.as_mut().expect("just set");
        for (i, filter) in filters.iter().enumerate() {
            if applied[i] {
                continue;
            }
            let mut vars = Vec::new();
            filter.vars(&mut vars);
            if vars.iter().all(|v| current.vars.contains(v)) {
                let rel_vars = current.vars.clone();
                current
                    .rows
                    .retain(|row| eval_filter(filter, &rel_vars, row, terms));
                applied[i] = true;
            }
        }
    }
    rel.unwrap_or_else(Relation::unit)
}

/// Greedy join order: smallest estimated cardinality first, preferring
/// patterns that share a variable with the accumulated binding set
fn plan_order(patterns: &[ResolvedPattern], store: &FactStore) -> Vec<usize> {
    let estimate = |pattern: &ResolvedPattern| {
        let slot = |r: &Resolved| match r {
            Resolved::Const(id) => Some(*id),
            Resolved::Var(_) => None,
        };
        store.estimate(slot(&pattern[0]), slot(&pattern[1]), slot(&pattern[2]))
    };

    let mut order = Vec::with_capacity(patterns.len());
    let mut remaining: Vec<usize> = (0..patterns.len()).collect();
    let mut bound: FnvHashSet<String> = FnvHashSet::default();
    while !remaining.is_empty() {
        let best = remaining
            .iter()
            .copied()
            .min_by_key(|&i| {
                let shares = patterns[i].iter().any(|r| match r {
                    Resolved::Var(name) => bound.contains(name),
                    Resolved::Const(_) => false,
                });
                let prefers = if bound.is_empty() || shares { 0 } else { 1 };
                (prefers, estimate(&patterns[i]))
            })
            .expect("remaining is non-empty");
        order.push(best);
        remaining.retain(|&i| i != best);
        for r in &patterns[best] {
            if let Resolved::Var(name) = r {
                bound.insert(name.clone());
            }
        }
    }
    order
}

/// Match one pattern against the store into a relation
fn match_pattern(pattern: &ResolvedPattern, store: &FactStore, view: View) -> Relation {
    let slot = |r: &Resolved| match r {
        Resolved::Const(id) => Some(*id),
        Resolved::Var(_) => None,
    };
    let candidates = store.select(slot(&pattern[0]), slot(&pattern[1]), slot(&pattern[2]), view);

    // Unique variables in slot order
    let mut vars: Vec<String> = Vec::new();
    for r in pattern {
        if let Resolved::Var(name) = r {
            if !vars.contains(name) {
                vars.push(name.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(candidates.len());
    'next: for id in candidates {
        let triple = store.triple(id);
        let values = triple.slots();
        let mut row: Vec<Option<TermId>> = vec![None; vars.len()];
        for (r, value) in pattern.iter().zip(values) {
            if let Resolved::Var(name) = r {
                let idx = vars.iter().position(|v| v == name).expect("collected");
                match row[idx] {
                    Some(prev) if prev != value => continue 'next,
                    _ => row[idx] = Some(value),
                }
            }
        }
        rows.push(row);
    }
    Relation { vars, rows }
}

/// Hash-join two relations over their shared variables; a missing shared
/// variable is an explicit cross product
fn join_relations(left: Relation, right: Relation) -> Relation {
    let shared: Vec<String> = left
        .vars
        .iter()
        .filter(|v| right.vars.contains(v))
        .cloned()
        .collect();
    let right_extra: Vec<usize> = (0..right.vars.len())
        .filter(|&i| !shared.contains(&right.vars[i]))
        .collect();

    let mut vars = left.vars.clone();
    vars.extend(right_extra.iter().map(|&i| right.vars[i].clone()));

    let left_key: Vec<usize> = shared.iter().map(|v| left.col(v).expect("shared")).collect();
    let right_key: Vec<usize> = shared
        .iter()
        .map(|v| right.col(v).expect("shared"))
        .collect();

    // Build on the right, probe with the left
    let mut index: FnvHashMap<Vec<TermId>, Vec<&Vec<Option<TermId>>>> = FnvHashMap::default();
    'right: for row in &right.rows {
        let mut key = Vec::with_capacity(right_key.len());
        for &i in &right_key {
            match row[i] {
                Some(v) => key.push(v),
                None => continue 'right,
            }
        }
        index.entry(key).or_default().push(row);
    }

    let mut rows = Vec::new();
    'left: for row in &left.rows {
        let mut key = Vec::with_capacity(left_key.len());
        for &i in &left_key {
            match row[i] {
                Some(v) => key.push(v),
                None => continue 'left,
            }
        }
        if let Some(matches) = index.get(&key) {
            for right_row in matches {
                let mut merged = row.clone();
                merged.extend(right_extra.iter().map(|&i| right_row[i]));
                rows.push(merged);
            }
        }
    }
    Relation { vars, rows }
}

/// Concatenate UNION branches, aligning columns by variable name
fn union_all(parts: Vec<Relation>) -> Relation {
    let mut vars: Vec<String> = Vec::new();
    for part in &parts {
        for v in &part.vars {
            if !vars.contains(v) {
                vars.push(v.clone());
            }
        }
    }
    let mut rows = Vec::new();
    for part in parts {
        let mapping: Vec<Option<usize>> = vars.iter().map(|v| part.col(v)).collect();
        for row in part.rows {
            rows.push(
                mapping
                    .iter()
                    .map(|m| m.and_then(|i| row[i]))
                    .collect::<Vec<_>>(),
            );
        }
    }
    Relation { vars, rows }
}

/// Keep left rows with no compatible row on the minus side
///
/// Variables present only in the minus side do not participate; with no
/// shared variables at all the minus group removes nothing.
fn anti_join(rel: Relation, minus: &Relation) -> Relation {
    let shared: Vec<String> = rel
        .vars
        .iter()
        .filter(|v| minus.vars.contains(v))
        .cloned()
        .collect();
    if shared.is_empty() {
        return rel;
    }
    let minus_key: Vec<usize> = shared
        .iter()
        .map(|v| minus.col(v).expect("shared"))
        .collect();
    let mut keys: FnvHashSet<Vec<TermId>> = FnvHashSet::default();
    'minus: for row in &minus.rows {
        let mut key = Vec::with_capacity(minus_key.len());
        for &i in &minus_key {
            match row[i] {
                Some(v) => key.push(v),
                None => continue 'minus,
            }
        }
        keys.insert(key);
    }

    let rel_key: Vec<usize> = shared.iter().map(|v| rel.col(v).expect("shared")).collect();
    let vars = rel.vars.clone();
    let rows = rel
        .rows
        .into_iter()
        .filter(|row| {
            let mut key = Vec::with_capacity(rel_key.len());
            for &i in &rel_key {
                match row[i] {
                    Some(v) => key.push(v),
                    // Unbound on our side: not compatible, keep the row
                    None => return true,
                }
            }
            !keys.contains(&key)
        })
        .collect();
    Relation { vars, rows }
}

fn eval_filter(filter: &RFilter, vars: &[String], row: &[Option<TermId>], terms: &TermStore) -> bool {
    let lookup = |value: &RValue| -> Option<TermId> {
        match value {
            RValue::Const(id) => Some(*id),
            RValue::Var(name) => vars
                .iter()
                .position(|v| v == name)
                .and_then(|i| row[i]),
        }
    };
    match filter {
        RFilter::Compare(op, a, b) => {
            let (Some(a), Some(b)) = (lookup(a), lookup(b)) else {
                return false;
            };
            match op {
                CompareOp::Eq => equal_values(terms, a, b) == Some(true),
                CompareOp::Ne => equal_values(terms, a, b) == Some(false),
                CompareOp::Lt => terms.cmp_literal(a, b) == Some(Ordering::Less),
                CompareOp::Le => {
                    matches!(terms.cmp_literal(a, b), Some(Ordering::Less | Ordering::Equal))
                }
                CompareOp::Gt => terms.cmp_literal(a, b) == Some(Ordering::Greater),
                CompareOp::Ge => matches!(
                    terms.cmp_literal(a, b),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
            }
        }
        RFilter::Regex(a, regex) => {
            let Some(id) = lookup(a) else {
                return false;
            };
            let text = match terms.lookup(id) {
                Term::Name(iri) => iri.to_string(),
                Term::Literal(lit) => lit.lexical().to_string(),
            };
            regex.is_match(&text)
        }
        RFilter::Bound(name) => vars
            .iter()
            .position(|v| v == name)
            .and_then(|i| row[i])
            .is_some(),
        RFilter::And(a, b) => {
            eval_filter(a, vars, row, terms) && eval_filter(b, vars, row, terms)
        }
        RFilter::Or(a, b) => eval_filter(a, vars, row, terms) || eval_filter(b, vars, row, terms),
        RFilter::Not(a) => !eval_filter(a, vars, row, terms),
    }
}

/// Value equality: literals by value, names by id; mixed pairs are unequal
fn equal_values(terms: &TermStore, a: TermId, b: TermId) -> Option<bool> {
    if terms.is_literal(a) && terms.is_literal(b) {
        terms.cmp_literal(a, b).map(|o| o == Ordering::Equal)
    } else if !terms.is_literal(a) && !terms.is_literal(b) {
        Some(a == b)
    } else {
        Some(false)
    }
}

fn cmp_cells(terms: &TermStore, a: Option<TermId>, b: Option<TermId>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => terms.ordering_key_cmp(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryTerm as Q, TriplePattern};
    use crate::vocab;

    struct Fixture {
        terms: TermStore,
        store: FactStore,
        cache: PlanCache,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                terms: TermStore::new(),
                store: FactStore::new(),
                cache: PlanCache::new(16),
            }
        }

        fn fact(&mut self, s: &str, p: &str, o: &str) {
            let s = self.terms.intern_name(s);
            let p = self.terms.intern_name(p);
            let o = self.terms.intern_name(o);
            self.store
                .assert_fact(crate::term::Triple::new(s, p, o), None);
        }

        fn data(&mut self, s: &str, p: &str, lex: &str, datatype: &str) {
            let s = self.terms.intern_name(s);
            let p = self.terms.intern_name(p);
            let o = self.terms.intern_literal(lex, datatype);
            self.store
                .assert_fact(crate::term::Triple::new(s, p, o), None);
        }

        fn run(&self, query: &Query) -> ReasonerResult<Table> {
            execute(
                query,
                &self.terms,
                &self.store,
                View::Current,
                &self.cache,
                None,
            )
        }
    }

    #[test]
    fn test_conjunctive_join() {
        let mut fx = Fixture::new();
        fx.fact("ex:alice", "ex:knows", "ex:bob");
        fx.fact("ex:bob", "ex:knows", "ex:carol");

        let query = Query::select(["x", "z"])
            .pattern(Q::var("x"), Q::iri("ex:knows"), Q::var("y"))
            .pattern(Q::var("y"), Q::iri("ex:knows"), Q::var("z"));
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_constant_yields_empty() {
        let mut fx = Fixture::new();
        fx.fact("ex:alice", "ex:knows", "ex:bob");
        let query = Query::select(["x"]).pattern(Q::var("x"), Q::iri("ex:missing"), Q::var("y"));
        let table = fx.run(&query).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["x".to_string()]);
    }

    #[test]
    fn test_two_unions_join_over_shared_variables() {
        let mut fx = Fixture::new();
        fx.fact("ex:m1", "ex:type", "ex:Method");
        fx.fact("ex:f1", "ex:type", "ex:Function");
        fx.fact("ex:m1", "ex:calls", "ex:f1");

        let branch = |class: &str, var: &str| {
            vec![TriplePattern::new(
                Q::var(var),
                Q::iri("ex:type"),
                Q::iri(class),
            )]
        };
        let query = Query::select(["caller", "callee"])
            .union(vec![
                branch("ex:Method", "caller"),
                branch("ex:Function", "caller"),
            ])
            .pattern(Q::var("caller"), Q::iri("ex:calls"), Q::var("callee"))
            .union(vec![
                branch("ex:Method", "callee"),
                branch("ex:Function", "callee"),
            ]);
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_minus_removes_compatible_rows() {
        let mut fx = Fixture::new();
        fx.fact("ex:a", "ex:type", "ex:Person");
        fx.fact("ex:b", "ex:type", "ex:Person");
        fx.fact("ex:a", "ex:type", "ex:Robot");

        let query = Query::select(["x"])
            .pattern(Q::var("x"), Q::iri("ex:type"), Q::iri("ex:Person"))
            .minus(vec![TriplePattern::new(
                Q::var("x"),
                Q::iri("ex:type"),
                Q::iri("ex:Robot"),
            )]);
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_minus_private_variables_do_not_constrain() {
        let mut fx = Fixture::new();
        fx.fact("ex:a", "ex:type", "ex:Person");
        // The minus group binds only its private variable, sharing nothing
        let query = Query::select(["x"])
            .pattern(Q::var("x"), Q::iri("ex:type"), Q::iri("ex:Person"))
            .minus(vec![TriplePattern::new(
                Q::var("private"),
                Q::iri("ex:type"),
                Q::iri("ex:Person"),
            )]);
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_filter_on_numeric_literal() {
        let mut fx = Fixture::new();
        fx.data("ex:alice", "ex:age", "17", vocab::XSD_INTEGER);
        fx.data("ex:bob", "ex:age", "42", vocab::XSD_INTEGER);

        let query = Query::select(["x"])
            .pattern(Q::var("x"), Q::iri("ex:age"), Q::var("age"))
            .filter(FilterExpr::Compare(
                CompareOp::Ge,
                FilterValue::Var("age".to_string()),
                FilterValue::Literal {
                    lexical: "18".to_string(),
                    datatype: vocab::XSD_INTEGER.to_string(),
                },
            ));
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_modifiers_apply_in_order() {
        let mut fx = Fixture::new();
        for name in ["ex:a", "ex:b", "ex:c", "ex:d"] {
            fx.fact(name, "ex:type", "ex:Person");
            // Duplicate assertion, absorbed by the store
            fx.fact(name, "ex:type", "ex:Person");
        }
        let query = Query::select(["x"])
            .pattern(Q::var("x"), Q::iri("ex:type"), Q::iri("ex:Person"))
            .distinct()
            .order_by("x", Order::Asc)
            .offset(1)
            .limit(2);
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 2);
        let b = fx.terms.find_name("ex:b").unwrap();
        assert_eq!(table.rows[0][0], Some(b));
    }

    #[test]
    fn test_select_var_only_in_minus_is_invalid() {
        let query = Query::select(["ghost"])
            .pattern(Q::var("x"), Q::iri("ex:type"), Q::iri("ex:Person"))
            .minus(vec![TriplePattern::new(
                Q::var("ghost"),
                Q::iri("ex:type"),
                Q::iri("ex:Robot"),
            )]);
        let fx = Fixture::new();
        let err = fx.run(&query).unwrap_err();
        assert_eq!(err.code, ErrorCode::MinusOnlyVariable);
    }

    #[test]
    fn test_cross_product_is_explicit() {
        let mut fx = Fixture::new();
        fx.fact("ex:a", "ex:p", "ex:b");
        fx.fact("ex:c", "ex:q", "ex:d");
        let query = Query::select(["x", "y"])
            .pattern(Q::var("x"), Q::iri("ex:p"), Q::var("_o1"))
            .pattern(Q::var("y"), Q::iri("ex:q"), Q::var("_o2"));
        let table = fx.run(&query).unwrap();
        assert_eq!(table.len(), 1);
    }
}
