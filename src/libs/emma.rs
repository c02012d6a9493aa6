use std::collections::BTreeMap;

use super::error::HamError;
use super::stats::strain_mean_vector;

/// Opaque mixed-model engine. The kinship/REML numerics live outside this
/// crate; implementations consume flattened row-major matrices.
pub trait MixedModelOracle {
    /// Kinship matrix (n x n, row-major) from a flattened genotype matrix
    /// (`snp_count` rows of `strain_count` calls).
    fn calculate_kinship(
        &self,
        flat_genotypes: &[f64],
        strain_count: usize,
    ) -> Result<Vec<f64>, HamError>;

    /// Per-SNP association p-values under the mixed model.
    fn emma_scan(
        &self,
        phenotypes: &[f64],
        flat_genotypes: &[f64],
        flat_kinship: &[f64],
        strain_count: usize,
    ) -> Result<Vec<f64>, HamError>;
}

/// Flatten per-SNP call rows into the row-major layout the oracle expects.
pub fn flatten_genotypes(calls: &[Vec<f64>]) -> Vec<f64> {
    calls.iter().flatten().copied().collect()
}

/// Split a flat per-SNP result vector back into per-chromosome slices
/// given the SNP count of each chromosome, in order.
pub fn reshape_scan_results(flat: &[f64], snp_counts: &[usize]) -> Vec<Vec<f64>> {
    let mut out = Vec::with_capacity(snp_counts.len());
    let mut offset = 0;
    for &count in snp_counts {
        out.push(flat[offset..offset + count].to_vec());
        offset += count;
    }
    out
}

/// Reduce phenotype measurement lists to the per-strain mean vector the
/// oracle consumes, in the order of `strains`. Strains without data are
/// rejected; the driver intersects strain sets before calling.
pub fn phenotype_vector(
    strains: &[String],
    phenotype_data: &BTreeMap<String, Vec<f64>>,
) -> Result<Vec<f64>, HamError> {
    let responses: Vec<Vec<f64>> = strains
        .iter()
        .map(|s| phenotype_data.get(s).cloned().unwrap_or_default())
        .collect();
    strain_mean_vector(&responses)
        .into_iter()
        .zip(strains)
        .map(|(mean, strain)| {
            mean.ok_or_else(|| {
                HamError::StrainMismatch(format!("no phenotype data for strain {}", strain))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_is_row_major() {
        let calls = vec![vec![1.0, 0.0], vec![0.5, 1.0]];
        assert_eq!(flatten_genotypes(&calls), vec![1.0, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn reshape_splits_by_chromosome() {
        let flat = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let shaped = reshape_scan_results(&flat, &[2, 3]);
        assert_eq!(shaped, vec![vec![0.1, 0.2], vec![0.3, 0.4, 0.5]]);
    }

    #[test]
    fn phenotype_vector_follows_strain_order() {
        let mut data = BTreeMap::new();
        data.insert("B".to_string(), vec![2.0, 4.0]);
        data.insert("A".to_string(), vec![1.0]);
        let strains = vec!["A".to_string(), "B".to_string()];
        assert_eq!(phenotype_vector(&strains, &data).unwrap(), vec![1.0, 3.0]);

        let missing = vec!["A".to_string(), "C".to_string()];
        assert!(phenotype_vector(&missing, &data).is_err());
    }
}
