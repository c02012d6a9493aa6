use serde::{Deserialize, Serialize};

use super::sdp::Sdp;

/// A genomic interval in base pairs, closed-open: `[start_bp, start_bp + extent_bp)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BasePairInterval {
    pub chromosome: i32,
    pub start_bp: i64,
    pub extent_bp: i64,
}

impl BasePairInterval {
    pub fn new(chromosome: i32, start_bp: i64, extent_bp: i64) -> Self {
        debug_assert!(extent_bp > 0);
        Self {
            chromosome,
            start_bp,
            extent_bp,
        }
    }

    pub fn end_bp(&self) -> i64 {
        self.start_bp + self.extent_bp
    }

    pub fn middle_bp(&self) -> i64 {
        self.start_bp + self.extent_bp / 2
    }

    pub fn overlaps(&self, other: &BasePairInterval) -> bool {
        self.chromosome == other.chromosome
            && self.start_bp < other.end_bp()
            && other.start_bp < self.end_bp()
    }

    pub fn contains(&self, other: &BasePairInterval) -> bool {
        self.chromosome == other.chromosome
            && self.start_bp <= other.start_bp
            && other.end_bp() <= self.end_bp()
    }
}

/// An interval over a per-chromosome SNP array: `extent_indices` SNPs
/// starting at `start_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexedSnpInterval {
    pub start_index: usize,
    pub extent_indices: usize,
}

impl IndexedSnpInterval {
    pub fn new(start_index: usize, extent_indices: usize) -> Self {
        debug_assert!(extent_indices > 0);
        Self {
            start_index,
            extent_indices,
        }
    }

    /// Index of the last SNP in the interval.
    pub fn end_index(&self) -> usize {
        self.start_index + self.extent_indices - 1
    }

    /// Map to base pairs through the SNP-position array. The resulting
    /// interval covers the first through last SNP positions inclusive.
    pub fn to_base_pairs(&self, chromosome: i32, positions: &[i64]) -> BasePairInterval {
        let start_bp = positions[self.start_index];
        let end_bp = positions[self.end_index()];
        BasePairInterval::new(chromosome, start_bp, end_bp - start_bp + 1)
    }
}

/// A genomic interval plus the binary strain partition it induces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionedInterval {
    pub interval: BasePairInterval,
    /// The "inside" strain group, bit order following the canonical strain list
    pub strains: Sdp,
}

/// A genomic interval plus a multi-way strain partition (group ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiPartitionedInterval {
    pub interval: BasePairInterval,
    /// Group id per strain, canonical bit order
    pub groups: Vec<i16>,
}
