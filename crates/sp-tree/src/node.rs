//! Tree nodes and their identifiers.

use std::fmt;

use serde::Serialize;
use sp_context::NarrativeElements;
use sp_twee::Passage;

/// Index of a node in its [`crate::PassageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One accepted passage in a tree.
///
/// Everything except the child list is fixed when the node is created.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// This node's id.
    pub id: NodeId,
    /// Passage name, tag stripped, case preserved.
    pub title: String,
    /// The passage as accepted.
    pub passage: Passage,
    /// Body prose with markup stripped, as handed to the extractor.
    pub cleaned_text: String,
    /// Elements extracted from this node's own text.
    pub narrative_elements: NarrativeElements,
    /// Context rendered from this node's ancestors.
    pub context_text: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    /// The parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in the order they were attached.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether this is the root node.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
