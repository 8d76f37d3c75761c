//! Error types for passage trees.

use sp_twee::TweeError;
use thiserror::Error;

use crate::node::NodeId;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that stop a tree from being built or grown.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The document has no single start passage.
    #[error(transparent)]
    Document(#[from] TweeError),

    /// A passage that fails the prefix or bracket-balance check.
    #[error("passage \"{title}\" is invalid: {reason}")]
    InvalidPassage {
        /// The passage name.
        title: String,
        /// What the check found.
        reason: String,
    },

    /// A node id that does not belong to this tree.
    #[error("node not found: {0}")]
    UnknownNode(NodeId),
}
