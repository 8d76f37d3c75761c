//! Passage trees for Spindle.
//!
//! A [`PassageTree`] grows from a story's start passage by following links.
//! Every node carries the narrative elements of its own text and the
//! context rendered from its ancestors.

/// Error types for passage trees.
pub mod error;
/// Tree nodes.
pub mod node;
/// ASCII and Graphviz output.
pub mod render;
/// Title suggestions for unresolved links.
pub mod suggest;
/// The tree and its builder.
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use node::{Node, NodeId};
pub use render::{render_ascii, to_dot};
pub use tree::{PassageTree, UnresolvedLink, Visited};
