//! Reasoner event log
//!
//! Diagnostics that do not abort reasoning are appended here rather than
//! raised: the core is paraconsistent by default and callers choose policy.
//! Events are mirrored through `tracing` so operators see them without
//! polling the log.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::term::TermId;

/// A diagnostic recorded during loading, reasoning or retraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasonerEvent {
    /// `owl:Nothing` acquired an instance, or `sameAs`/`differentFrom` collided
    Inconsistency {
        /// The individual at fault
        subject: TermId,
        /// What produced the clash
        detail: String,
    },
    /// An axiom outside the OWL 2 RL profile was ignored
    NonRlAxiom {
        /// Why the axiom was refused
        detail: String,
    },
    /// A builtin received incomparable literal types; the firing was dropped
    LiteralTypeError {
        /// Builtin and operands
        detail: String,
    },
}

/// Append-only event log owned by a reasoner instance
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<ReasonerEvent>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, mirroring it through `tracing`
    pub fn record(&mut self, event: ReasonerEvent) {
        match &event {
            ReasonerEvent::Inconsistency { subject, detail } => {
                warn!(subject = subject.raw(), detail = %detail, "ontology inconsistency");
            }
            ReasonerEvent::NonRlAxiom { detail } => {
                warn!(detail = %detail, "axiom outside OWL 2 RL, ignored");
            }
            ReasonerEvent::LiteralTypeError { detail } => {
                debug!(detail = %detail, "builtin firing dropped on incomparable literals");
            }
        }
        self.events.push(event);
    }

    /// All recorded events in order
    pub fn events(&self) -> &[ReasonerEvent] {
        &self.events
    }

    /// Whether any inconsistency has been observed
    pub fn has_inconsistency(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ReasonerEvent::Inconsistency { .. }))
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
