pub mod build;
pub mod node;
pub mod sig;
pub mod tree;

pub use build::infer_perfect_phylogeny;
pub use node::{Node, NodeId};
pub use tree::{PhylogenyInterval, PhylogenyTestResult, PhylogenyTree};
