use indexmap::IndexMap;

use super::interval::{BasePairInterval, PartitionedInterval};
use super::sdp::Sdp;

/// All genomic intervals whose SDPs induce the same strain bipartition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// Canonical partition bitset (bit 0 unset)
    pub strains: Sdp,
    /// Constituent intervals, sorted by (chromosome, start), duplicates coalesced
    pub intervals: Vec<BasePairInterval>,
    pub cumulative_extent_bp: i64,
}

/// Group partitioned intervals into equivalence classes.
///
/// Each bitset is canonicalised first; partitions that leave one side empty
/// carry no information and are discarded. Classes come back ordered by the
/// canonical bitset's binary string, which keeps result ordering
/// reproducible across runs.
pub fn build_equivalence_classes(partitions: &[PartitionedInterval]) -> Vec<EquivalenceClass> {
    let mut grouped: IndexMap<Sdp, Vec<BasePairInterval>> = IndexMap::new();
    for p in partitions {
        let canonical = p.strains.canonical();
        if canonical.is_constant() {
            continue;
        }
        grouped.entry(canonical).or_default().push(p.interval);
    }

    let mut classes: Vec<EquivalenceClass> = grouped
        .into_iter()
        .map(|(strains, mut intervals)| {
            intervals.sort();
            intervals.dedup();
            let cumulative_extent_bp = intervals.iter().map(|iv| iv.extent_bp).sum();
            EquivalenceClass {
                strains,
                intervals,
                cumulative_extent_bp,
            }
        })
        .collect();

    classes.sort_by(|a, b| a.strains.to_binary().cmp(&b.strains.to_binary()));
    classes
}
