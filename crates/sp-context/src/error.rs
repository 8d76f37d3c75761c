//! Error types for context extraction.

use thiserror::Error;

/// Result type for context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors raised while configuring a policy or loading extractor output.
#[derive(Debug, Error)]
pub enum ContextError {
    /// A policy identifier that names no known version.
    #[error("unknown context policy: {0} (expected naive, entities, or events)")]
    UnknownPolicy(String),

    /// Recorded extractor output could not be parsed.
    #[error("invalid extractor recording: {0}")]
    Recording(#[from] serde_json::Error),
}
