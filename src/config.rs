//! Reasoner configuration
//!
//! A trimmed, serde-friendly configuration surface: the crate is a library,
//! so there is no config-file discovery or environment plumbing here; hosts
//! deserialize a [`ReasonerConfig`] from wherever they keep settings.

use serde::{Deserialize, Serialize};

/// Which entailment regime the reasoner materialises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningProfile {
    /// RDFS schema entailment only (subclass/subproperty closure)
    Rdfs,
    /// Full OWL 2 RL rule set
    #[default]
    Owl2Rl,
}

/// Configuration for a reasoner instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Entailment profile installed at construction
    pub profile: ReasoningProfile,
    /// Upper bound on fixpoint pump iterations per `reason()` call
    pub max_steps: usize,
    /// Optional cap on rows returned by a single query
    pub max_query_results: Option<usize>,
    /// Maximum number of cached query plans
    pub plan_cache_capacity: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        ReasonerConfig {
            profile: ReasoningProfile::Owl2Rl,
            max_steps: 1_000_000,
            max_query_results: None,
            plan_cache_capacity: 256,
        }
    }
}

impl ReasonerConfig {
    /// Configuration for the given profile with default limits
    pub fn with_profile(profile: ReasoningProfile) -> Self {
        ReasonerConfig {
            profile,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_owl2rl() {
        let config = ReasonerConfig::default();
        assert_eq!(config.profile, ReasoningProfile::Owl2Rl);
    }

    #[test]
    fn test_roundtrip_serde() {
        let config = ReasonerConfig::with_profile(ReasoningProfile::Rdfs);
        let json = serde_json::to_string(&config).unwrap();
        let back: ReasonerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.profile, ReasoningProfile::Rdfs);
    }
}
