use std::collections::BTreeMap;
use std::collections::HashMap;

use super::node::NodeId;
use super::tree::PhylogenyTree;
use crate::libs::error::HamError;
use crate::libs::stats::welch_t_test;

/// Minimum strains per side of an edge for the t-test to run.
const MIN_EDGE_SIDE: usize = 2;

/// Test every edge of a phylogeny for phenotype separation.
///
/// A single post-order pass carries a cumulative inside-strain set up
/// each branch; the outside set is the remaining phenotype strains. The
/// returned tree is structurally identical with a p-value attached to
/// every tested edge. Degenerate edges (either side under two strains)
/// carry p = 1.0; numerical failures are logged and also report 1.0 so
/// the scan keeps going.
///
/// The tree's strain set must equal the phenotype strain set exactly,
/// else `StrainMismatch`; that indicates a driver bug.
pub fn test_edge_significance(
    tree: &PhylogenyTree,
    phenotype_data: &BTreeMap<String, Vec<f64>>,
) -> Result<PhylogenyTree, HamError> {
    let tree_strains = tree.all_strains();
    if tree_strains.len() != phenotype_data.len()
        || !tree_strains.iter().all(|s| phenotype_data.contains_key(s))
    {
        let pheno: Vec<&String> = phenotype_data.keys().collect();
        return Err(HamError::StrainMismatch(format!(
            "phylogeny strains {:?} vs phenotype strains {:?}",
            tree_strains, pheno
        )));
    }

    let means: HashMap<&str, f64> = phenotype_data
        .iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(strain, values)| {
            (
                strain.as_str(),
                values.iter().sum::<f64>() / values.len() as f64,
            )
        })
        .collect();

    let mut tested = tree.clone();
    let order = tree.postorder();

    // cumulative inside-strain set per subtree
    let mut inside_sets: HashMap<NodeId, std::collections::HashSet<&str>> = HashMap::new();

    for id in order {
        let node = tree.get_node(id).unwrap();
        let mut inside: std::collections::HashSet<&str> =
            node.strains.iter().map(|s| s.as_str()).collect();
        for child in &node.children {
            inside.extend(&inside_sets[child]);
        }

        if node.parent.is_some() {
            let in_sample: Vec<f64> = inside
                .iter()
                .filter_map(|s| means.get(s).copied())
                .collect();
            let out_sample: Vec<f64> = means
                .iter()
                .filter(|(s, _)| !inside.contains(*s))
                .map(|(_, m)| *m)
                .collect();
            let mut p_value = 1.0;
            if in_sample.len() >= MIN_EDGE_SIDE && out_sample.len() >= MIN_EDGE_SIDE {
                match welch_t_test(&in_sample, &out_sample) {
                    Ok(p) => p_value = p,
                    Err(err) => {
                        eprintln!("edge t-test failed, reporting p = 1.0: {}", err);
                    }
                }
            }
            tested.get_node_mut(id).unwrap().value = Some(p_value);
        }

        inside_sets.insert(id, inside);
    }

    Ok(tested)
}
