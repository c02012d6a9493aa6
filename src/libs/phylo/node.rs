use serde::{Deserialize, Serialize};

use crate::libs::sdp::Sdp;

/// NodeId is an index into the tree's node vector.
pub type NodeId = usize;

/// One node of a phylogeny tree. Branch data (SDP, length, edge value)
/// describes the edge to the parent and is absent on the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// Parent node ID (None for root)
    pub parent: Option<NodeId>,

    /// List of child node IDs
    pub children: Vec<NodeId>,

    /// Strains sitting at this node; may be empty on internal nodes of a
    /// pruned tree
    pub strains: Vec<String>,

    /// The SDP the parent edge cuts
    pub sdp: Option<Sdp>,

    /// Branch length to parent
    pub length: Option<f64>,

    /// Edge value attached by the significance tester (p-value)
    pub value: Option<f64>,
}

impl Node {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            children: Vec::new(),
            strains: Vec::new(),
            sdp: None,
            length: None,
            value: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
