//! owlet - incremental OWL 2 RL reasoner
//!
//! A RETE-style materialisation core for Description Logic axioms and SWRL
//! rules, with a snapshot query engine over the derived fact base.
//!
//! # Architecture
//!
//! The crate is a pipeline of cooperating components:
//!
//! - [`term`] - interns names and typed literals into dense 32-bit ids
//! - [`store`] - indexed working memory with provenance and epoch snapshots
//! - [`axiom`] - the axiom IR and its compiler to OWL 2 RL productions
//! - [`rete`] - the discrimination network: alpha filters, hash joins,
//!   builtin guards, terminal firings
//! - [`reasoner`] - the fixpoint driver, source retraction and host API
//! - [`query`] - conjunctive queries with UNION/MINUS/FILTER and modifiers
//!
//! # Features
//!
//! - Incremental materialisation: axioms and facts may arrive in any order
//! - Source-tagged assertions with transitive retraction by tag
//! - Justification counting: multiply-derived facts survive partial retraction
//! - Snapshot-isolated queries with a fingerprint-keyed plan cache
//! - Paraconsistent by default: inconsistency is reported, not fatal
//!
//! # Example
//!
//! ```
//! use owlet::{Axiom, Concept, Reasoner};
//!
//! let mut reasoner = Reasoner::new();
//! let person = reasoner.intern("http://example.org/Person");
//! let animal = reasoner.intern("http://example.org/Animal");
//! let john = reasoner.intern("http://example.org/john");
//!
//! reasoner.load_axioms(
//!     [
//!         Axiom::SubClassOf {
//!             sub: Concept::Atomic(person),
//!             sup: Concept::Atomic(animal),
//!         },
//!         Axiom::ClassAssertion {
//!             individual: john,
//!             concept: Concept::Atomic(person),
//!         },
//!     ],
//!     Some("intro.owl"),
//! );
//! reasoner.reason();
//!
//! assert_eq!(reasoner.instances_of("http://example.org/Animal").len(), 1);
//! ```

pub mod axiom;
pub mod config;
pub mod error;
pub mod event;
pub mod query;
pub mod reasoner;
pub mod rete;
pub mod store;
pub mod term;
pub mod vocab;

// Re-export the host-facing surface
pub use crate::axiom::{Axiom, AxiomCompiler, CompiledAxioms, Concept, SwrlArg, SwrlAtom};
pub use crate::config::{ReasonerConfig, ReasoningProfile};
pub use crate::error::{ErrorCode, ReasonerError, ReasonerResult};
pub use crate::event::{EventLog, ReasonerEvent};
pub use crate::query::{
    bfs_subgraph, CompareOp, FilterExpr, FilterValue, Order, PlanCache, Query, QueryTerm, Table,
    TriplePattern,
};
pub use crate::reasoner::{LoadSummary, Reasoner, ReasonerStats};
pub use crate::rete::{BuiltinCall, BuiltinOp, Network, Pattern, Production, Slot};
pub use crate::store::{
    Derivation, FactStore, RetractReport, Snapshot, SourceId, TripleId, View,
};
pub use crate::term::{Datatype, Literal, LiteralValue, Term, TermId, TermStore, Triple};
pub use crate::vocab::Vocab;
