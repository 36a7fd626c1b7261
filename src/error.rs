//! Structured error handling
//!
//! The fact store and the RETE network never raise to the caller; they record
//! diagnostics on the reasoner event log (see [`crate::event`]). The axiom
//! compiler and the query engine return structured errors for malformed input.
//!
//! # Error Categories
//!
//! - `Axiom` - axiom IR rejected outright (malformed, not merely outside RL)
//! - `Query` - structurally invalid query
//! - `Limit` - a configured resource limit was exceeded
//! - `Internal` - invariant violation inside the reasoner

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Axiom errors (1xxx)
    /// Generic axiom error
    AxiomError = 1000,
    /// Malformed concept expression
    MalformedConcept = 1001,
    /// Malformed SWRL rule
    MalformedRule = 1002,

    // Query errors (2xxx)
    /// Generic query error
    QueryError = 2000,
    /// A selected variable is not bound by any pattern
    UnboundSelectVariable = 2001,
    /// A variable appears only inside a MINUS group
    MinusOnlyVariable = 2002,
    /// Empty pattern list with no UNION groups
    EmptyQuery = 2003,
    /// ORDER BY references a variable absent from the solution
    UnknownOrderVariable = 2004,

    // Limit errors (3xxx)
    /// Maximum fixpoint steps exceeded
    MaxStepsExceeded = 3000,
    /// Result size limit exceeded
    ResultLimitExceeded = 3001,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::AxiomError => "Axiom error",
            ErrorCode::MalformedConcept => "Malformed concept expression",
            ErrorCode::MalformedRule => "Malformed SWRL rule",
            ErrorCode::QueryError => "Query error",
            ErrorCode::UnboundSelectVariable => "Selected variable is not bound by any pattern",
            ErrorCode::MinusOnlyVariable => "Variable appears only inside a MINUS group",
            ErrorCode::EmptyQuery => "Query has no patterns and no UNION groups",
            ErrorCode::UnknownOrderVariable => "ORDER BY variable absent from the solution",
            ErrorCode::MaxStepsExceeded => "Maximum fixpoint steps exceeded",
            ErrorCode::ResultLimitExceeded => "Result size limit exceeded",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// The unified error type raised to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context key/value pairs
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, String>,
}

impl ReasonerError {
    /// Create an error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ReasonerError {
            code,
            message: message.into(),
            context: HashMap::new(),
        }
    }

    /// Create a generic axiom error
    pub fn axiom(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AxiomError, message)
    }

    /// Create a generic query error
    pub fn query(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::QueryError, message)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Override the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Attach a context key/value pair
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for ReasonerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;
        if !self.context.is_empty() {
            let mut pairs: Vec<_> = self.context.iter().collect();
            pairs.sort();
            write!(f, " (")?;
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for ReasonerError {}

/// Convenience result alias
pub type ReasonerResult<T> = Result<T, ReasonerError>;
