//! Shared-prefix tree of repertoire lines.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. Lines
//! are not re-validated here; they were replayed when stored.

use std::collections::{BTreeMap, BTreeSet};

use chess::is_white_ply;
use serde::Serialize;

use crate::model::{Opening, OpeningId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TreeNode {
    /// SAN token that leads here; `None` for the root.
    pub token: Option<String>,
    /// Ply reached at this node; the root is 0.
    pub depth: u32,
    pub parent: Option<NodeId>,
    pub children: BTreeMap<String, NodeId>,
    /// Every line passing through (or ending at) this node.
    pub openings: BTreeSet<OpeningId>,
    /// Lines whose last move is this node.
    pub ends_here: BTreeSet<OpeningId>,
}

impl TreeNode {
    pub fn is_decision_point(&self) -> bool {
        self.children.len() > 1
    }
}

/// A node as shown by [`OpeningTree::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub depth: u32,
    pub token: String,
    /// Token with its move number, e.g. `3. Bb5` or `3... a6`.
    pub label: String,
    pub line_count: usize,
    pub ends_here: Vec<OpeningId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpeningTree {
    nodes: Vec<TreeNode>,
}

impl Default for OpeningTree {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![TreeNode::default()],
        }
    }

    pub fn build<'a>(openings: impl IntoIterator<Item = &'a Opening>) -> Self {
        let mut tree = Self::new();
        for opening in openings {
            tree.insert(opening.id, &opening.moves);
        }
        tree
    }

    /// Add a line, sharing existing nodes for its common prefix. Returns the
    /// node of the line's last move.
    pub fn insert<S: AsRef<str>>(&mut self, id: OpeningId, moves: &[S]) -> NodeId {
        let mut current = NodeId::ROOT;
        self.nodes[current.0].openings.insert(id);

        for token in moves {
            let token = token.as_ref();
            let next = match self.nodes[current.0].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = NodeId(self.nodes.len());
                    let depth = self.nodes[current.0].depth + 1;
                    self.nodes.push(TreeNode {
                        token: Some(token.to_string()),
                        depth,
                        parent: Some(current),
                        ..TreeNode::default()
                    });
                    self.nodes[current.0]
                        .children
                        .insert(token.to_string(), child);
                    child
                }
            };
            self.nodes[next.0].openings.insert(id);
            current = next;
        }

        self.nodes[current.0].ends_here.insert(id);
        current
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// # Panics
    ///
    /// If `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Node count, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no line has been inserted.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].openings.is_empty()
    }

    /// Children in SAN lexical order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.nodes
            .get(id.0)
            .into_iter()
            .flat_map(|node| node.children.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(NodeId::ROOT, |node, token| {
            self.nodes[node.0].children.get(token.as_ref()).copied()
        })
    }

    /// Tokens from the root down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = self.nodes.get(id.0);
        while let Some(node) = current {
            if let Some(token) = &node.token {
                tokens.push(token.clone());
            }
            current = node.parent.and_then(|p| self.nodes.get(p.0));
        }
        tokens.reverse();
        tokens
    }

    /// Nodes with more than one continuation, in pre-order.
    pub fn decision_points(&self) -> Vec<NodeId> {
        self.preorder(u32::MAX)
            .into_iter()
            .filter(|id| self.nodes[id.0].is_decision_point())
            .collect()
    }

    /// Moves shared by every line.
    pub fn common_prefix(&self) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut current = &self.nodes[0];
        while current.children.len() == 1 && current.ends_here.is_empty() {
            let Some((token, child)) = current.children.iter().next() else {
                break;
            };
            tokens.push(token.clone());
            current = &self.nodes[child.0];
        }
        tokens
    }

    /// Pre-order listing of every node at depth `1..=levels`.
    pub fn render(&self, levels: u32) -> Vec<TreeRow> {
        self.preorder(levels)
            .into_iter()
            .filter_map(|id| {
                let node = &self.nodes[id.0];
                let token = node.token.clone()?;
                Some(TreeRow {
                    depth: node.depth,
                    label: move_label(node.depth, &token),
                    token,
                    line_count: node.openings.len(),
                    ends_here: node.ends_here.iter().copied().collect(),
                })
            })
            .collect()
    }

    fn preorder(&self, max_depth: u32) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.depth > max_depth {
                continue;
            }
            order.push(id);
            // Reverse so the lexically first child is visited first.
            stack.extend(node.children.values().rev().copied());
        }
        order
    }
}

/// `1. e4` for White's plies, `1... e5` for Black's.
pub fn move_label(ply: u32, token: &str) -> String {
    let number = ply.div_ceil(2);
    if is_white_ply(ply) {
        format!("{}. {}", number, token)
    } else {
        format!("{}... {}", number, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opening(id: OpeningId, name: &str, moves: &str) -> Opening {
        Opening {
            id,
            name: name.to_string(),
            moves: moves.split_whitespace().map(str::to_string).collect(),
        }
    }

    fn two_lines() -> OpeningTree {
        let lines = [
            opening(1, "King's Knight", "e4 e5 Nf3"),
            opening(2, "Vienna", "e4 e5 Nc3"),
        ];
        OpeningTree::build(&lines)
    }

    #[test]
    fn test_shared_prefix_branches() {
        let tree = two_lines();
        let e5 = tree.find(&["e4", "e5"]).unwrap();
        let children: Vec<&str> = tree.children(e5).map(|(t, _)| t).collect();
        assert_eq!(children, vec!["Nc3", "Nf3"]);
        assert_eq!(tree.decision_points(), vec![e5]);
        assert_eq!(tree.common_prefix(), vec!["e4", "e5"]);
        assert_eq!(tree.node(e5).openings.len(), 2);
        // root + e4 + e5 + two leaves
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_render_levels() {
        let tree = two_lines();
        let rows = tree.render(1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "1. e4");

        let rows = tree.render(3);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["1. e4", "1... e5", "2. Nc3", "2. Nf3"]);
        assert_eq!(rows[2].ends_here, vec![2]);
    }

    #[test]
    fn test_prefix_line_stops_common_prefix() {
        let lines = [
            opening(1, "Open", "e4 e5"),
            opening(2, "Open Nf3", "e4 e5 Nf3"),
        ];
        let tree = OpeningTree::build(&lines);
        assert_eq!(tree.common_prefix(), vec!["e4", "e5"]);
        let e5 = tree.find(&["e4", "e5"]).unwrap();
        assert!(tree.node(e5).ends_here.contains(&1));
        assert!(tree.decision_points().is_empty());
    }

    #[test]
    fn test_path_and_find() {
        let tree = two_lines();
        let leaf = tree.find(&["e4", "e5", "Nf3"]).unwrap();
        assert_eq!(tree.path(leaf), vec!["e4", "e5", "Nf3"]);
        assert!(tree.find(&["d4"]).is_none());
        assert_eq!(tree.path(tree.root()), Vec::<String>::new());
    }

    #[test]
    fn test_empty_tree() {
        let tree = OpeningTree::new();
        assert!(tree.is_empty());
        assert!(tree.common_prefix().is_empty());
        assert!(tree.render(3).is_empty());
    }

    #[test]
    fn test_move_label() {
        assert_eq!(move_label(1, "e4"), "1. e4");
        assert_eq!(move_label(2, "e5"), "1... e5");
        assert_eq!(move_label(5, "Bb5"), "3. Bb5");
    }
}
