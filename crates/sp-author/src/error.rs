//! Error types for authoring sessions.

use sp_tree::TreeError;
use sp_twee::TweeError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by a [`crate::Completer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The completer has nothing left to return.
    #[error("no completions available")]
    Exhausted,

    /// The completion service failed.
    #[error("completion service error: {0}")]
    Service(String),
}

/// Errors that can occur during an authoring session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The title is not on the to-do list.
    #[error("passage not on the to-do list: {0}")]
    NotQueued(String),

    /// The configured placeholder would never be accepted.
    #[error("placeholder text is not a valid passage body: {0}")]
    InvalidPlaceholder(String),

    /// Document error while resuming a story.
    #[error("{0}")]
    Document(#[from] TweeError),

    /// Tree error while attaching a passage.
    #[error("{0}")]
    Tree(#[from] TreeError),

    /// Completer error while generating a passage.
    #[error("{0}")]
    Completion(#[from] CompletionError),
}
