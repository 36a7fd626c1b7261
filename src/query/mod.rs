//! Conjunctive query IR and result tables
//!
//! Queries are built programmatically (a surface syntax parser is an external
//! concern) and refer to constants by IRI or literal text: resolution against
//! the term store happens at execution time, so a query mentioning a constant
//! the reasoner has never seen returns an empty table rather than an error.

use crate::term::TermId;

mod cache;
mod engine;
mod traverse;

pub use cache::{PlanCache, PlanCacheStats};
pub use engine::execute;
pub use traverse::bfs_subgraph;

/// A query slot: a constant reference or a variable
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum QueryTerm {
    /// A named term by IRI
    Iri(String),
    /// A typed literal by lexical form and datatype IRI
    Literal { lexical: String, datatype: String },
    /// A named variable
    Var(String),
}

impl QueryTerm {
    /// Reference a named term
    pub fn iri(text: impl Into<String>) -> Self {
        QueryTerm::Iri(text.into())
    }

    /// Reference a typed literal
    pub fn literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        QueryTerm::Literal {
            lexical: lexical.into(),
            datatype: datatype.into(),
        }
    }

    /// A variable
    pub fn var(name: impl Into<String>) -> Self {
        QueryTerm::Var(name.into())
    }

    /// The variable name, if this is one
    pub fn as_var(&self) -> Option<&str> {
        match self {
            QueryTerm::Var(name) => Some(name),
            _ => None,
        }
    }
}

/// A triple pattern over query terms
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TriplePattern {
    pub subject: QueryTerm,
    pub predicate: QueryTerm,
    pub object: QueryTerm,
}

impl TriplePattern {
    pub fn new(subject: QueryTerm, predicate: QueryTerm, object: QueryTerm) -> Self {
        TriplePattern {
            subject,
            predicate,
            object,
        }
    }

    /// The three slots in order
    pub fn slots(&self) -> [&QueryTerm; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Variable names referenced, with duplicates
    pub fn vars(&self) -> impl Iterator<Item = &str> {
        self.slots().into_iter().filter_map(|t| t.as_var())
    }
}

/// A conjunction of triple patterns
pub type BasicPattern = Vec<TriplePattern>;

/// Sort direction
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Order {
    Asc,
    Desc,
}

/// Comparison operator inside a FILTER
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// An operand of a FILTER comparison
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FilterValue {
    Var(String),
    Iri(String),
    Literal { lexical: String, datatype: String },
}

/// A FILTER expression tree
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum FilterExpr {
    /// Relational comparison; incomparable operands make the row fail
    Compare(CompareOp, FilterValue, FilterValue),
    /// Regex match over the text of the operand
    Regex(FilterValue, String),
    /// Variable is bound in the row
    Bound(String),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Variables the expression references
    pub fn vars(&self, out: &mut Vec<String>) {
        match self {
            FilterExpr::Compare(_, a, b) => {
                if let FilterValue::Var(v) = a {
                    out.push(v.clone());
                }
                if let FilterValue::Var(v) = b {
                    out.push(v.clone());
                }
            }
            FilterExpr::Regex(a, _) => {
                if let FilterValue::Var(v) = a {
                    out.push(v.clone());
                }
            }
            FilterExpr::Bound(v) => out.push(v.clone()),
            FilterExpr::And(a, b) | FilterExpr::Or(a, b) => {
                a.vars(out);
                b.vars(out);
            }
            FilterExpr::Not(a) => a.vars(out),
        }
    }
}

/// A conjunctive query with UNION, MINUS, FILTER and solution modifiers
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Query {
    /// Projected variables; empty projects every bound variable
    pub select: Vec<String>,
    /// Outer basic patterns
    pub patterns: BasicPattern,
    /// UNION blocks, each a list of alternative branches
    pub unions: Vec<Vec<BasicPattern>>,
    /// MINUS groups
    pub minuses: Vec<BasicPattern>,
    /// FILTER expressions
    pub filters: Vec<FilterExpr>,
    pub distinct: bool,
    pub order_by: Vec<(String, Order)>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl Query {
    /// Start a query projecting the given variables
    pub fn select<S: Into<String>>(vars: impl IntoIterator<Item = S>) -> Self {
        Query {
            select: vars.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Add an outer pattern
    pub fn pattern(mut self, subject: QueryTerm, predicate: QueryTerm, object: QueryTerm) -> Self {
        self.patterns
            .push(TriplePattern::new(subject, predicate, object));
        self
    }

    /// Add a UNION block over the given branches
    pub fn union(mut self, branches: Vec<BasicPattern>) -> Self {
        self.unions.push(branches);
        self
    }

    /// Add a MINUS group
    pub fn minus(mut self, patterns: BasicPattern) -> Self {
        self.minuses.push(patterns);
        self
    }

    /// Add a FILTER
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    /// Request distinct rows
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Order results by a variable
    pub fn order_by(mut self, var: impl Into<String>, order: Order) -> Self {
        self.order_by.push((var.into(), order));
        self
    }

    /// Limit the number of rows
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Skip leading rows
    pub fn offset(mut self, n: usize) -> Self {
        self.offset = Some(n);
        self
    }
}

/// A materialised query result
///
/// Cells are `None` where a UNION branch left a variable unbound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<TermId>>>,
}

impl Table {
    /// An empty table with the given columns
    pub fn empty(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by variable name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, skipping unbound cells
    pub fn column_values(&self, name: &str) -> Vec<TermId> {
        let Some(idx) = self.column(name) else {
            return Vec::new();
        };
        self.rows.iter().filter_map(|row| row[idx]).collect()
    }
}
