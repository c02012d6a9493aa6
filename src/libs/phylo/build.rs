use std::collections::HashSet;

use super::node::NodeId;
use super::tree::PhylogenyTree;
use crate::libs::error::HamError;
use crate::libs::sdp::Sdp;

/// Infer the perfect phylogeny for one MAX-K interval.
///
/// `sdps` are the interval's columns over the active strain subset;
/// `strains` is the sorted canonical strain list matching the bit order.
/// Columns are canonicalised (bit 0 unset), so the 1-sides form a laminar
/// family whenever the columns are pairwise four-gamete compatible.
/// Processing distinct informative columns by decreasing 1-side size lets
/// each column split exactly one node: all its member strains still sit
/// together on the deepest node whose cluster contains them.
///
/// Constant and duplicate columns are ignored. A column whose members are
/// spread across several nodes violates the compatibility precondition and
/// fails with `NoValidPhylogeny`.
pub fn infer_perfect_phylogeny(
    sdps: &[Sdp],
    strains: &[String],
) -> Result<PhylogenyTree, HamError> {
    let n = strains.len();

    let mut seen: HashSet<Sdp> = HashSet::new();
    let mut columns: Vec<Sdp> = Vec::new();
    for sdp in sdps {
        if sdp.len() != n {
            return Err(HamError::NoValidPhylogeny(format!(
                "SDP width {} does not match strain count {}",
                sdp.len(),
                n
            )));
        }
        let canonical = sdp.canonical();
        if canonical.is_constant() {
            continue;
        }
        if seen.insert(canonical.clone()) {
            columns.push(canonical);
        }
    }
    columns.sort_by(|a, b| {
        b.count_ones()
            .cmp(&a.count_ones())
            .then_with(|| a.to_binary().cmp(&b.to_binary()))
    });

    let mut tree = PhylogenyTree::new();
    let root = tree.add_node();
    tree.get_node_mut(root).unwrap().strains = strains.to_vec();
    tree.set_root(root);

    // where each strain currently sits
    let mut location: Vec<NodeId> = vec![root; n];

    for column in columns {
        let members: Vec<usize> = (0..n).filter(|&i| column.get(i)).collect();
        let home = location[members[0]];
        if members.iter().any(|&i| location[i] != home) {
            return Err(HamError::NoValidPhylogeny(format!(
                "column {} splits more than one node",
                column.to_binary()
            )));
        }

        let child = tree.add_node();
        tree.add_child(home, child);
        {
            let node = tree.get_node_mut(child).unwrap();
            node.strains = members.iter().map(|&i| strains[i].clone()).collect();
            node.sdp = Some(column.clone());
            node.length = Some(1.0);
        }
        let member_names: HashSet<&String> =
            members.iter().map(|&i| &strains[i]).collect();
        tree.get_node_mut(home)
            .unwrap()
            .strains
            .retain(|s| !member_names.contains(s));
        for &i in &members {
            location[i] = child;
        }
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Edge bipartitions of the tree: for every non-root node, the sorted
    /// strain set of its subtree.
    fn edge_partitions(tree: &PhylogenyTree) -> Vec<Vec<String>> {
        let order = tree.postorder();
        let mut subtree: std::collections::HashMap<usize, Vec<String>> =
            std::collections::HashMap::new();
        let mut partitions = Vec::new();
        for id in order {
            let node = tree.get_node(id).unwrap();
            let mut strains = node.strains.clone();
            for child in &node.children {
                strains.extend(subtree[child].iter().cloned());
            }
            strains.sort();
            if node.parent.is_some() {
                partitions.push(strains.clone());
            }
            subtree.insert(id, strains);
        }
        partitions.sort();
        partitions
    }

    #[test]
    fn two_column_tree() {
        // 0011 separates {A,B}|{C,D}; 0001 separates {D}|{A,B,C}
        let sdps = vec![Sdp::from_binary("0011"), Sdp::from_binary("0001")];
        let strains = names(&["A", "B", "C", "D"]);
        let tree = infer_perfect_phylogeny(&sdps, &strains).unwrap();

        assert_eq!(tree.all_strains(), strains);
        assert_eq!(
            edge_partitions(&tree),
            vec![names(&["C", "D"]), names(&["D"])]
        );

        // edges carry the SDP that cuts them
        let with_sdp: Vec<String> = tree
            .nodes()
            .filter_map(|n| n.sdp.as_ref().map(|s| s.to_binary()))
            .collect();
        assert!(with_sdp.contains(&"0011".to_string()));
        assert!(with_sdp.contains(&"0001".to_string()));
    }

    #[test]
    fn pruned_two_column_tree() {
        // pruning to {B,C,D} keeps both bipartitions
        let sdps = vec![Sdp::from_binary("0011"), Sdp::from_binary("0001")];
        let strains = names(&["A", "B", "C", "D"]);
        let tree = infer_perfect_phylogeny(&sdps, &strains).unwrap();

        let keep: HashSet<String> = names(&["B", "C", "D"]).into_iter().collect();
        let pruned = tree.strain_pruned(&keep);
        assert_eq!(
            edge_partitions(&pruned),
            vec![names(&["C", "D"]), names(&["D"])]
        );
    }

    #[test]
    fn duplicates_and_constants_ignored() {
        let sdps = vec![
            Sdp::from_binary("0011"),
            Sdp::from_binary("1100"), // complement duplicate
            Sdp::from_binary("0000"),
            Sdp::from_binary("1111"),
            Sdp::from_binary("0011"),
        ];
        let strains = names(&["A", "B", "C", "D"]);
        let tree = infer_perfect_phylogeny(&sdps, &strains).unwrap();

        // one informative column, one edge
        assert_eq!(tree.len(), 2);
        assert_eq!(edge_partitions(&tree), vec![names(&["C", "D"])]);
    }

    #[test]
    fn node_strain_sets_partition_the_panel() {
        let sdps = vec![
            Sdp::from_binary("001111"),
            Sdp::from_binary("000011"),
            Sdp::from_binary("010000"),
        ];
        let strains = names(&["A", "B", "C", "D", "E", "F"]);
        let tree = infer_perfect_phylogeny(&sdps, &strains).unwrap();

        assert_eq!(tree.all_strains(), strains);
        let total: usize = tree.nodes().map(|n| n.strains.len()).sum();
        assert_eq!(total, strains.len());
        assert!(tree
            .nodes()
            .filter(|n| n.is_leaf())
            .all(|n| !n.strains.is_empty()));
    }

    #[test]
    fn incompatible_columns_rejected() {
        let sdps = vec![
            Sdp::from_binary("0011"),
            Sdp::from_binary("0101"),
            Sdp::from_binary("0110"),
        ];
        let strains = names(&["A", "B", "C", "D"]);
        let err = infer_perfect_phylogeny(&sdps, &strains).unwrap_err();
        assert!(matches!(err, HamError::NoValidPhylogeny(_)));
    }
}
