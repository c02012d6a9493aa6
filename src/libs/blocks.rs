use fixedbitset::FixedBitSet;
use indexmap::IndexMap;

use super::genotype::ProjectedChromosome;
use super::interval::{IndexedSnpInterval, MultiPartitionedInterval, PartitionedInterval};
use super::sdp::{Direction, Sdp};

/// Haplotype block estimator thresholds.
#[derive(Debug, Clone, Copy)]
pub struct BlockParams {
    /// Minimum number of SNPs a block must cover (>= 1)
    pub min_snp_extent: usize,
    /// Minimum number of strains sharing a haplotype (>= 2)
    pub min_strain_group_size: usize,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            min_snp_extent: 3,
            min_strain_group_size: 3,
        }
    }
}

/// Output of one chromosome scan: binary partitions (one per qualifying
/// haplotype group per block) and multi-way partitions (one per block).
#[derive(Debug, Default)]
pub struct BlockScan {
    pub binary: Vec<PartitionedInterval>,
    pub multi: Vec<MultiPartitionedInterval>,
}

/// Group strains by their haplotype over the SNP window `sdps[lo..=hi]`.
/// Returned in first-seen strain order, which makes group ids deterministic.
fn haplotype_groups(sdps: &[Sdp], lo: usize, hi: usize, n_strains: usize) -> IndexMap<Vec<bool>, Vec<usize>> {
    let mut groups: IndexMap<Vec<bool>, Vec<usize>> = IndexMap::new();
    for strain in 0..n_strains {
        let signature: Vec<bool> = (lo..=hi).map(|i| sdps[i].get(strain)).collect();
        groups.entry(signature).or_default().push(strain);
    }
    groups
}

/// Estimate haplotype blocks on one chromosome.
///
/// A block is a maximal SNP span on which at least
/// `min_strain_group_size` strains share identical calls across every SNP,
/// covering at least `min_snp_extent` SNPs. The scan is a monotone
/// two-pointer pass: shrinking a window from the left only coarsens the
/// strain partition, so the minimal valid left endpoint never moves
/// backwards. Ties resolve to the earlier start, since every emitted span
/// is maximal at its right end with the smallest left endpoint that keeps
/// it valid.
pub fn scan_haplotype_blocks(chr: &ProjectedChromosome, params: &BlockParams) -> BlockScan {
    let mut stream = chr.stream(Direction::Forward);
    let n = stream.snp_count();
    let mut scan = BlockScan::default();
    if n == 0 {
        return scan;
    }

    let mut sdps: Vec<Sdp> = Vec::with_capacity(n);

    let valid = |sdps: &[Sdp], lo: usize, hi: usize| -> bool {
        haplotype_groups(sdps, lo, hi, sdps[0].len())
            .values()
            .any(|members| members.len() >= params.min_strain_group_size)
    };

    let emit = |scan: &mut BlockScan, sdps: &[Sdp], lo: usize, hi: usize| {
        let n_strains = sdps[0].len();
        let snp_iv = IndexedSnpInterval::new(lo, hi - lo + 1);
        let interval = chr.to_base_pairs(&snp_iv);
        let groups = haplotype_groups(sdps, lo, hi, n_strains);

        for members in groups.values() {
            if members.len() < params.min_strain_group_size {
                continue;
            }
            let mut bits = FixedBitSet::with_capacity(n_strains);
            for &strain in members {
                bits.set(strain, true);
            }
            scan.binary.push(PartitionedInterval {
                interval,
                strains: Sdp::new(bits),
            });
        }

        let mut group_ids = vec![0i16; n_strains];
        for (id, members) in groups.values().enumerate() {
            for &strain in members {
                group_ids[strain] = id as i16;
            }
        }
        scan.multi.push(MultiPartitionedInterval {
            interval,
            groups: group_ids,
        });
    };

    let mut l = 0usize;
    let mut have_window = false;
    for r in 0..n {
        let sdp = stream
            .next_sdp()
            .expect("stream shorter than its snp_count")
            .clone();
        sdps.push(sdp);

        let mut new_l = l;
        while new_l <= r && !valid(&sdps, new_l, r) {
            new_l += 1;
        }
        if new_l > l {
            if have_window && r - l >= params.min_snp_extent {
                emit(&mut scan, &sdps, l, r - 1);
            }
            l = new_l;
        }
        have_window = l <= r;
    }
    if have_window && n - l >= params.min_snp_extent {
        emit(&mut scan, &sdps, l, n - 1);
    }

    scan
}
