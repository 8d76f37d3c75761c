//! Error types for Twee documents.

use thiserror::Error;

/// Result type for document operations.
pub type TweeResult<T> = Result<T, TweeError>;

/// Document-level conditions that stop a story from being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TweeError {
    /// No passage is titled `Start`.
    #[error("no start passage found")]
    NoStart,

    /// More than one passage is titled `Start`.
    #[error("found {count} start passages, expected exactly one")]
    MultipleStarts {
        /// How many start passages the document holds.
        count: usize,
    },
}
