use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::node::{Node, NodeId};
use crate::libs::interval::BasePairInterval;

/// Arena-backed phylogeny tree. The arena is rooted at the seed node of
/// the inference; the underlying phylogeny is unrooted, with every edge
/// represented by a child node carrying the branch data.
///
/// Trees are immutable once constructed; operations that change structure
/// (pruning, edge testing) return a new tree.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhylogenyTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
}

impl PhylogenyTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new detached node. Returns the new node's ID.
    pub fn add_node(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node::new(id));
        id
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn set_root(&mut self, id: NodeId) {
        if id < self.nodes.len() {
            self.root = Some(id);
        }
    }

    pub fn get_root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Link `child_id` under `parent_id`.
    pub fn add_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        debug_assert!(parent_id != child_id);
        debug_assert!(self.nodes[child_id].parent.is_none());
        self.nodes[child_id].parent = Some(parent_id);
        self.nodes[parent_id].children.push(child_id);
    }

    /// Post-order traversal from the root; children before parents.
    pub fn postorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let Some(root) = self.root else {
            return order;
        };
        // two-stack iterative post-order
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(&self.nodes[id].children);
        }
        order.reverse();
        order
    }

    /// All strains in the tree, sorted. The node strain sets partition
    /// this set.
    pub fn all_strains(&self) -> Vec<String> {
        let mut strains: Vec<String> = self
            .nodes
            .iter()
            .flat_map(|n| n.strains.iter().cloned())
            .collect();
        strains.sort();
        strains
    }

    /// Minimum-valued edge: the node whose parent edge carries the
    /// smallest value. None when no edge carries a value.
    pub fn min_value_edge(&self) -> Option<(NodeId, f64)> {
        self.nodes
            .iter()
            .filter_map(|n| n.value.map(|v| (n.id, v)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Remove leaves outside `keep` and contract the internal nodes left
    /// without strains and with a single child. Tree invariants are
    /// preserved: node strain sets stay disjoint, every leaf keeps a
    /// non-empty strain set.
    pub fn strain_pruned(&self, keep: &HashSet<String>) -> PhylogenyTree {
        let mut pruned = PhylogenyTree::new();
        let Some(root) = self.root else {
            return pruned;
        };

        if let Some(new_root) = self.prune_into(root, keep, &mut pruned) {
            // an empty root with a single child adds nothing; its child
            // takes over as root
            let mut new_root = new_root;
            loop {
                let node = pruned.get_node(new_root).unwrap();
                if !node.strains.is_empty() || node.children.len() != 1 {
                    break;
                }
                let child = node.children[0];
                pruned.nodes[child].parent = None;
                pruned.nodes[child].sdp = None;
                pruned.nodes[child].length = None;
                new_root = child;
            }
            // the root carries no branch data
            pruned.nodes[new_root].sdp = None;
            pruned.nodes[new_root].length = None;
            pruned.set_root(new_root);
        }
        pruned
    }

    fn prune_into(
        &self,
        id: NodeId,
        keep: &HashSet<String>,
        out: &mut PhylogenyTree,
    ) -> Option<NodeId> {
        let node = &self.nodes[id];
        let strains: Vec<String> = node
            .strains
            .iter()
            .filter(|s| keep.contains(*s))
            .cloned()
            .collect();

        let children: Vec<NodeId> = node
            .children
            .iter()
            .filter_map(|&c| self.prune_into(c, keep, out))
            .collect();

        if strains.is_empty() && children.is_empty() {
            return None;
        }

        // contract a strain-less pass-through node into its single child,
        // summing branch lengths and keeping the deeper edge's SDP
        if strains.is_empty() && children.len() == 1 {
            let child = children[0];
            if let (Some(own), Some(child_len)) = (node.length, out.nodes[child].length) {
                out.nodes[child].length = Some(own + child_len);
            }
            return Some(child);
        }

        let new_id = out.add_node();
        out.nodes[new_id].strains = strains;
        out.nodes[new_id].sdp = node.sdp.clone();
        out.nodes[new_id].length = node.length;
        out.nodes[new_id].value = node.value;
        for child in children {
            out.add_child(new_id, child);
        }
        Some(new_id)
    }

    /// Render as Newick. Node labels are the comma-joined strain names,
    /// space-free; branch lengths follow when present.
    pub fn to_newick(&self) -> String {
        match self.root {
            Some(root) => {
                let mut s = self.newick_recursive(root);
                s.push(';');
                s
            }
            None => ";".to_string(),
        }
    }

    fn newick_recursive(&self, id: NodeId) -> String {
        let node = &self.nodes[id];
        let mut out = String::new();
        if !node.children.is_empty() {
            out.push('(');
            for (i, &child) in node.children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&self.newick_recursive(child));
            }
            out.push(')');
        }
        out.push_str(&node.strains.join(","));
        if let Some(len) = node.length {
            out.push_str(&format!(":{}", len));
        }
        out
    }
}

/// A perfect-phylogeny tree together with the MAX-K interval that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhylogenyInterval {
    pub tree: PhylogenyTree,
    pub interval: BasePairInterval,
}

/// Phylogeny interval plus the minimum-edge p-value (1.0 when no edge
/// qualifies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhylogenyTestResult {
    pub phylogeny: PhylogenyInterval,
    pub p_value: f64,
}
