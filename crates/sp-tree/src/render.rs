//! Text and Graphviz renderings of a passage tree.

use std::fmt::Write;

use crate::node::NodeId;
use crate::tree::PassageTree;

/// Render the tree as an indented outline with box-drawing branches.
///
/// ```text
/// Start
/// ├── garden
/// │   └── shed
/// └── cave
/// ```
pub fn render_ascii(tree: &PassageTree) -> String {
    let mut out = String::new();
    if tree.is_empty() {
        return out;
    }

    // (node, text before its title, prefix for its children)
    let mut stack: Vec<(NodeId, String, String)> = vec![(tree.root(), String::new(), String::new())];
    while let Some((id, line, prefix)) = stack.pop() {
        let Some(node) = tree.node(id) else { continue };
        let _ = writeln!(out, "{line}{}", node.title);

        let children = node.children();
        for (i, child) in children.iter().enumerate().rev() {
            let (connector, indent) = if i + 1 == children.len() {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            stack.push((*child, format!("{prefix}{connector}"), format!("{prefix}{indent}")));
        }
    }
    out
}

/// Render the tree as a Graphviz digraph.
///
/// Unresolved links are drawn as dashed edges to dashed placeholder nodes.
pub fn to_dot(tree: &PassageTree) -> String {
    let mut out = String::from("digraph passages {\n    node [shape=box];\n");

    for node in tree.iter() {
        let _ = writeln!(out, "    n{} [label=\"{}\"];", node.id.0, escape(&node.title));
    }
    for node in tree.iter() {
        for child in node.children() {
            let _ = writeln!(out, "    n{} -> n{};", node.id.0, child.0);
        }
    }
    for (i, missing) in tree.unresolved().iter().enumerate() {
        let _ = writeln!(
            out,
            "    m{i} [label=\"{}\", style=dashed];\n    n{} -> m{i} [style=dashed];",
            escape(&missing.link),
            missing.from.0
        );
    }

    out.push_str("}\n");
    out
}

fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_context::ContextPolicy;
    use sp_twee::TweeDocument;

    fn tree(source: &str) -> PassageTree {
        PassageTree::create(&TweeDocument::parse(source), &ContextPolicy::naive()).unwrap()
    }

    #[test]
    fn ascii_outline() {
        let tree = tree(
            ":: Start\n[[garden]] [[cave]]\n:: garden\n[[shed]]\n:: shed\nx\n:: cave\ny",
        );
        assert_eq!(
            render_ascii(&tree),
            "Start\n├── garden\n│   └── shed\n└── cave\n"
        );
    }

    #[test]
    fn dot_has_nodes_edges_and_missing_targets() {
        let tree = tree(":: Start\n[[a]] [[the \"void\"]]\n:: a\nx");
        let dot = to_dot(&tree);
        assert!(dot.starts_with("digraph passages {"));
        assert!(dot.contains("n0 [label=\"Start\"];"));
        assert!(dot.contains("n0 -> n1;"));
        assert!(dot.contains("m0 [label=\"the \\\"void\\\"\", style=dashed];"));
        assert!(dot.contains("n0 -> m0 [style=dashed];"));
        assert!(dot.ends_with("}\n"));
    }
}
