//! The passage tree and its builder.

use std::collections::HashMap;

use serde::Serialize;
use sp_context::{ContextPolicy, NarrativeElements};
use sp_twee::links::{LinkCache, strip_markup};
use sp_twee::{Passage, TweeDocument, title_key};
use tracing::{debug, warn};

use crate::error::{TreeError, TreeResult};
use crate::node::{Node, NodeId};
use crate::suggest::closest_title;

/// Titles already instantiated as nodes, keyed by normalized title.
///
/// The first node created for a title owns it.
#[derive(Debug, Clone, Default)]
pub struct Visited {
    titles: HashMap<String, NodeId>,
}

impl Visited {
    /// Record `title` as owned by `id`. Returns `false` if it was already
    /// visited, leaving the first owner in place.
    pub fn mark(&mut self, title: &str, id: NodeId) -> bool {
        let key = title_key(title);
        if self.titles.contains_key(&key) {
            return false;
        }
        self.titles.insert(key, id);
        true
    }

    /// Whether `title` has a node.
    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains_key(&title_key(title))
    }

    /// The node owning `title`.
    pub fn get(&self, title: &str) -> Option<NodeId> {
        self.titles.get(&title_key(title)).copied()
    }

    /// Number of visited titles.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether nothing has been visited.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}

/// A link whose target passage does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedLink {
    /// The node whose passage holds the link.
    pub from: NodeId,
    /// The link target as written.
    pub link: String,
    /// The closest existing title, if one is similar enough.
    pub suggestion: Option<String>,
}

/// A tree of passages grown by following links from the start passage.
///
/// Nodes live in an arena in creation order, which is depth-first pre-order
/// for trees built by [`PassageTree::create`]. Each title appears at most
/// once: a link to a title that already has a node adds no edge.
#[derive(Debug, Clone, Serialize)]
pub struct PassageTree {
    nodes: Vec<Node>,
    unresolved: Vec<UnresolvedLink>,
    #[serde(skip)]
    visited: Visited,
    #[serde(skip)]
    links: LinkCache,
}

impl PassageTree {
    /// Build a tree from a whole document.
    ///
    /// Fails when the document has no start passage, more than one, or an
    /// invalid one; no partial tree is returned.
    pub fn create(document: &TweeDocument, policy: &ContextPolicy<'_>) -> TreeResult<Self> {
        let start = document.start()?;
        if let Some(reason) = start.validity().reason() {
            return Err(TreeError::InvalidPassage {
                title: start.name(),
                reason,
            });
        }
        let map = document.title_map();

        let mut tree = Self::with_root(start.clone(), policy);
        tree.expand(tree.root(), &map, policy);
        debug!(
            nodes = tree.len(),
            unresolved = tree.unresolved.len(),
            "built passage tree"
        );
        Ok(tree)
    }

    /// Start a tree containing only `root`.
    pub fn with_root(root: Passage, policy: &ContextPolicy<'_>) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            unresolved: Vec::new(),
            visited: Visited::default(),
            links: LinkCache::new(),
        };
        tree.push_node(None, root, policy);
        tree
    }

    /// Attach `passage` as a child of `parent`.
    ///
    /// If a node with the same title already exists, that node is returned
    /// and the tree is unchanged. Invalid passages are refused.
    pub fn attach(
        &mut self,
        parent: NodeId,
        passage: Passage,
        policy: &ContextPolicy<'_>,
    ) -> TreeResult<NodeId> {
        if self.node(parent).is_none() {
            return Err(TreeError::UnknownNode(parent));
        }
        if let Some(reason) = passage.validity().reason() {
            return Err(TreeError::InvalidPassage {
                title: passage.name(),
                reason,
            });
        }
        if let Some(existing) = self.visited.get(passage.title_line()) {
            debug!(title = %passage.name(), node = %existing, "title already in tree");
            return Ok(existing);
        }
        Ok(self.push_node(Some(parent), passage, policy))
    }

    /// Follow links depth-first from `from`, creating a node for every
    /// unvisited target found in `passages`.
    ///
    /// Metadata, code and invalid passages never become nodes and are not
    /// marked visited.
    fn expand(&mut self, from: NodeId, passages: &HashMap<String, &Passage>, policy: &ContextPolicy<'_>) {
        let mut stack: Vec<(NodeId, Vec<String>, usize)> = vec![(from, self.links_of(from), 0)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let Some(link) = frame.1.get(frame.2).cloned() else {
                stack.pop();
                continue;
            };
            frame.2 += 1;

            if self.visited.contains(&link) {
                continue;
            }
            let Some(passage) = passages.get(&title_key(&link)) else {
                let mut names: Vec<String> = passages
                    .values()
                    .filter(|p| !p.is_special() && !p.is_empty())
                    .map(|p| p.name())
                    .collect();
                names.sort();
                let suggestion = closest_title(&link, names.iter().map(String::as_str));
                warn!(
                    from = %self.nodes[node.0].title,
                    suggestion = ?suggestion,
                    "passage {link} does not exist"
                );
                self.unresolved.push(UnresolvedLink {
                    from: node,
                    link,
                    suggestion,
                });
                continue;
            };

            if passage.is_special() || passage.is_empty() {
                debug!(title = %passage.name(), "skipping link to a non-story passage");
                continue;
            }
            if let Some(reason) = passage.validity().reason() {
                warn!(
                    from = %self.nodes[node.0].title,
                    %reason,
                    "passage {link} is invalid, not added"
                );
                continue;
            }

            let child = self.push_node(Some(node), (*passage).clone(), policy);
            stack.push((child, self.links_of(child), 0));
        }
    }

    fn links_of(&mut self, id: NodeId) -> Vec<String> {
        let text = self.nodes[id.0].passage.raw_text().to_string();
        self.links.links(&text).to_vec()
    }

    fn push_node(&mut self, parent: Option<NodeId>, passage: Passage, policy: &ContextPolicy<'_>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let title = passage.name();
        let cleaned_text = strip_markup(&passage.body());
        let narrative_elements = policy.extract(&cleaned_text);
        let context_text = match parent {
            Some(parent) => self.context_below(parent, policy),
            None => String::new(),
        };

        self.visited.mark(passage.title_line(), id);
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        debug!(node = %id, title = %title, "added passage");
        self.nodes.push(Node {
            id,
            title,
            passage,
            cleaned_text,
            narrative_elements,
            context_text,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// The root node's id.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Find the node for a title or link target.
    pub fn find(&self, title: &str) -> Option<&Node> {
        self.visited.get(title).and_then(|id| self.node(id))
    }

    /// Children of a node, in attachment order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or_default()
    }

    /// Parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Ancestors of a node, root first, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            chain.push(ancestor);
            current = self.parent(ancestor);
        }
        chain.reverse();
        chain
    }

    /// The narrative elements of a node's ancestors, root first.
    pub fn full_context(&self, id: NodeId) -> Vec<&NarrativeElements> {
        self.ancestors(id)
            .into_iter()
            .filter_map(|a| self.node(a))
            .map(|n| &n.narrative_elements)
            .collect()
    }

    /// Context for a new child of `id`: the elements of `id` and all its
    /// ancestors, rendered by `policy`.
    pub fn context_below(&self, id: NodeId, policy: &ContextPolicy<'_>) -> String {
        let mut lineage = self.full_context(id);
        if let Some(node) = self.node(id) {
            lineage.push(&node.narrative_elements);
        }
        policy.render(lineage)
    }

    /// Whether `title` already has a node.
    pub fn contains(&self, title: &str) -> bool {
        self.visited.contains(title)
    }

    /// The visited set.
    pub fn visited(&self) -> &Visited {
        &self.visited
    }

    /// Links dropped because their target does not exist.
    pub fn unresolved(&self) -> &[UnresolvedLink] {
        &self.unresolved
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Always `false` for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_context::{ContextConfig, NerToken, RecordedExtractor, Recording};
    use sp_twee::TweeError;

    fn build(source: &str) -> PassageTree {
        let doc = TweeDocument::parse(source);
        PassageTree::create(&doc, &ContextPolicy::naive()).unwrap()
    }

    fn titles(tree: &PassageTree) -> Vec<&str> {
        tree.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn cycle_creates_one_node_per_title() {
        let tree = build(":: Start\n[[a]]\n:: a\n[[b]]\n:: b\n[[a]] [[Start]]");
        assert_eq!(titles(&tree), vec!["Start", "a", "b"]);
        let a = tree.find("a").unwrap().id;
        let b = tree.find("b").unwrap().id;
        assert_eq!(tree.children(a), &[b]);
        assert!(tree.children(b).is_empty());
        assert!(tree.unresolved().is_empty());
    }

    #[test]
    fn invalid_passage_is_not_added() {
        let tree = build(":: Start\n[[a]]\n:: a\nbroken [[b]\n:: b\nx");
        assert_eq!(titles(&tree), vec!["Start"]);
        assert!(!tree.contains("a"));
        assert!(tree.unresolved().is_empty());
    }

    #[test]
    fn invalid_passage_does_not_block_a_later_valid_path() {
        let tree = build(":: Start\n[[bad]] [[b]]\n:: bad\n<<oops\n:: b\n[[c]]\n:: c\nend");
        assert_eq!(titles(&tree), vec!["Start", "b", "c"]);
    }

    #[test]
    fn metadata_and_code_passages_are_not_nodes() {
        let tree = build(
            ":: StoryTitle\nTale\n:: Start\n[[StoryTitle]] [[style]]\n:: style [stylesheet]\nbody {}",
        );
        assert_eq!(titles(&tree), vec!["Start"]);
        assert!(tree.unresolved().is_empty());
    }

    #[test]
    fn metadata_is_never_extracted() {
        let extractor = RecordedExtractor::new().with_recording(
            "Tale",
            Recording {
                entities: vec![NerToken::new("B-PER", "Tale")],
                ..Recording::default()
            },
        );
        let policy = ContextPolicy::new(&extractor, ContextConfig::default());
        let doc = TweeDocument::parse(":: StoryTitle\nTale\n:: Start\n[[StoryTitle]] [[a]]\n:: a\nx");
        let tree = PassageTree::create(&doc, &policy).unwrap();
        assert_eq!(titles(&tree), vec!["Start", "a"]);
        assert!(tree.find("a").unwrap().context_text.contains("Mentioned People: None."));
    }

    #[test]
    fn nodes_are_in_depth_first_pre_order() {
        let tree = build(
            ":: Start\n[[left]] [[right]]\n:: left\n[[deep]]\n:: right\nEnd.\n:: deep\nBottom.",
        );
        assert_eq!(titles(&tree), vec!["Start", "left", "deep", "right"]);
    }

    #[test]
    fn first_reaching_parent_owns_a_shared_title() {
        let tree = build(":: Start\n[[a]] [[b]]\n:: a\n[[shared]]\n:: b\n[[shared]]\n:: shared\nx");
        let shared = tree.find("shared").unwrap();
        assert_eq!(tree.node(shared.parent().unwrap()).unwrap().title, "a");
        let b = tree.find("b").unwrap();
        assert!(b.is_leaf());
    }

    #[test]
    fn links_resolve_case_insensitively() {
        let tree = build(":: Start\n[[Go|The Docks]]\n:: the docks [dark]\nWater.");
        assert_eq!(titles(&tree), vec!["Start", "the docks"]);
    }

    #[test]
    fn missing_targets_are_recorded_with_suggestions() {
        let tree = build(":: Start\n[[the dock]] [[zeppelin]]\n:: the docks\nWater.");
        assert_eq!(tree.len(), 1);
        let unresolved = tree.unresolved();
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0].link, "the dock");
        assert_eq!(unresolved[0].from, tree.root());
        assert_eq!(unresolved[0].suggestion.as_deref(), Some("the docks"));
        assert_eq!(unresolved[1].suggestion, None);
    }

    #[test]
    fn construction_requires_one_start() {
        let policy = ContextPolicy::naive();
        let none = PassageTree::create(&TweeDocument::parse(":: a\nx"), &policy);
        assert!(matches!(none, Err(TreeError::Document(TweeError::NoStart))));

        let two = PassageTree::create(&TweeDocument::parse(":: Start\nx\n:: start\ny"), &policy);
        assert!(matches!(
            two,
            Err(TreeError::Document(TweeError::MultipleStarts { count: 2 }))
        ));

        let broken = PassageTree::create(&TweeDocument::parse(":: Start\n<<if"), &policy);
        assert!(matches!(broken, Err(TreeError::InvalidPassage { .. })));
    }

    #[test]
    fn ancestors_run_root_first() {
        let tree = build(":: Start\n[[a]]\n:: a\n[[b]]\n:: b\nEnd.");
        let b = tree.find("b").unwrap().id;
        let names: Vec<&str> = tree
            .ancestors(b)
            .into_iter()
            .map(|id| tree.node(id).unwrap().title.as_str())
            .collect();
        assert_eq!(names, vec!["Start", "a"]);
        assert_eq!(tree.full_context(b).len(), 2);
        assert!(tree.full_context(tree.root()).is_empty());
    }

    #[test]
    fn context_text_comes_from_ancestors() {
        let extractor = RecordedExtractor::new()
            .with_recording(
                "Anna waves. Go",
                Recording {
                    entities: vec![NerToken::new("B-PER", "Anna")],
                    ..Recording::default()
                },
            )
            .with_recording(
                "Bob and Anna talk.\nend",
                Recording {
                    entities: vec![NerToken::new("B-PER", "Bob"), NerToken::new("B-PER", "Anna")],
                    pronouns: vec!["They".into()],
                    ..Recording::default()
                },
            );
        let policy = ContextPolicy::new(&extractor, ContextConfig::default().with_top_k(1));
        let doc = TweeDocument::parse(
            ":: Start\nAnna waves. [[Go|talk]]\n:: talk\nBob and Anna talk.\n[[end]]\n:: end\nFin.",
        );
        let tree = PassageTree::create(&doc, &policy).unwrap();

        assert_eq!(tree.node(tree.root()).unwrap().context_text, "");
        assert_eq!(tree.find("talk").unwrap().cleaned_text, "Bob and Anna talk.\nend");
        assert_eq!(
            tree.find("talk").unwrap().context_text,
            "Mentioned People: Anna. Mentioned Locations: None. Pronouns referenced: None."
        );
        assert_eq!(
            tree.find("end").unwrap().context_text,
            "Mentioned People: Anna. Mentioned Locations: None. Pronouns referenced: they."
        );
    }

    #[test]
    fn attach_grows_incrementally() {
        let policy = ContextPolicy::naive();
        let mut tree = PassageTree::with_root(Passage::new(":: Start\n[[cave]]"), &policy);
        let cave = tree
            .attach(tree.root(), Passage::new(":: cave\nDark."), &policy)
            .unwrap();
        assert_eq!(tree.parent(cave), Some(tree.root()));

        let again = tree
            .attach(cave, Passage::new(":: Cave\nSecond draft."), &policy)
            .unwrap();
        assert_eq!(again, cave);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find("cave").unwrap().passage.body(), "Dark.");

        let missing = tree.attach(NodeId(9), Passage::new(":: x\ny"), &policy);
        assert!(matches!(missing, Err(TreeError::UnknownNode(NodeId(9)))));

        let broken = tree.attach(cave, Passage::new(":: shed\n[[door"), &policy);
        assert!(matches!(broken, Err(TreeError::InvalidPassage { .. })));
        assert!(!tree.contains("shed"));
    }

    #[test]
    fn tree_serializes_nodes_and_unresolved() {
        let tree = build(":: Start\n[[a]] [[gone]]\n:: a\nx");
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["nodes"][1]["title"], "a");
        assert_eq!(json["nodes"][1]["parent"], 0);
        assert_eq!(json["unresolved"][0]["link"], "gone");
    }
}
