//! Configuration for context accumulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContextError;

/// Which context strategy a session uses.
///
/// Each version is a total strategy: a tree is built with exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyVersion {
    /// No narrative elements and no context text.
    Naive,
    /// Named entities and pronouns.
    #[default]
    Entities,
    /// Named entities, pronouns, and preceding events.
    Events,
}

impl PolicyVersion {
    /// Whether this version extracts entities and pronouns.
    pub fn uses_entities(self) -> bool {
        !matches!(self, PolicyVersion::Naive)
    }

    /// Whether this version extracts event triples.
    pub fn uses_events(self) -> bool {
        matches!(self, PolicyVersion::Events)
    }
}

impl fmt::Display for PolicyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyVersion::Naive => write!(f, "naive"),
            PolicyVersion::Entities => write!(f, "entities"),
            PolicyVersion::Events => write!(f, "events"),
        }
    }
}

impl FromStr for PolicyVersion {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "naive" | "v1" => Ok(PolicyVersion::Naive),
            "entities" | "v2" => Ok(PolicyVersion::Entities),
            "events" | "v3" => Ok(PolicyVersion::Events),
            _ => Err(ContextError::UnknownPolicy(s.to_string())),
        }
    }
}

/// Configuration for a [`crate::ContextPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// The active strategy.
    pub policy: PolicyVersion,
    /// How many of the most frequent values to keep per entity type and for
    /// pronouns (at least 1).
    pub top_k: usize,
    /// Upper bound on aggregated events.
    pub max_events: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            policy: PolicyVersion::default(),
            top_k: 8,
            max_events: 16,
        }
    }
}

impl ContextConfig {
    /// Select the strategy.
    pub fn with_policy(mut self, policy: PolicyVersion) -> Self {
        self.policy = policy;
        self
    }

    /// Set the per-type frequency cut-off (clamped to at least 1).
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the event cap. Zero disables events in rendered context.
    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }
}
