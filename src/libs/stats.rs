use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::error::HamError;
use super::sdp::Sdp;

/// Reduce per-strain measurement lists to per-strain means. Strains with
/// no measurements come back as None and are excluded from every test.
pub fn strain_mean_vector(responses: &[Vec<f64>]) -> Vec<Option<f64>> {
    responses
        .iter()
        .map(|values| {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        })
        .collect()
}

fn sample_variance(values: &[f64], mean: f64) -> f64 {
    debug_assert!(values.len() >= 2);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Welch's two-sample t-test (unequal variances), two-sided p-value.
///
/// Both samples must have at least two observations. When the pooled
/// standard error vanishes the statistic is indeterminate for equal means
/// (p = 1.0) and a perfect separation otherwise (p = 0.0).
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<f64, HamError> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let m1 = a.iter().sum::<f64>() / n1;
    let m2 = b.iter().sum::<f64>() / n2;
    let v1 = sample_variance(a, m1);
    let v2 = sample_variance(b, m2);

    let se2 = v1 / n1 + v2 / n2;
    if se2 == 0.0 {
        return Ok(if m1 == m2 { 1.0 } else { 0.0 });
    }

    let t = (m1 - m2) / se2.sqrt();
    let df = se2 * se2
        / ((v1 / n1).powi(2) / (n1 - 1.0) + (v2 / n2).powi(2) / (n2 - 1.0));
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| HamError::Numeric(format!("t distribution with df {}: {}", df, e)))?;
    Ok(2.0 * dist.sf(t.abs()))
}

/// One-way ANOVA F-test p-value over two or more groups, each with at
/// least two observations.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<f64, HamError> {
    let k = groups.len() as f64;
    let n: f64 = groups.iter().map(|g| g.len() as f64).sum();
    let grand_mean =
        groups.iter().flatten().sum::<f64>() / n;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let gn = group.len() as f64;
        let gm = group.iter().sum::<f64>() / gn;
        ss_between += gn * (gm - grand_mean).powi(2);
        ss_within += group.iter().map(|v| (v - gm).powi(2)).sum::<f64>();
    }

    let df_between = k - 1.0;
    let df_within = n - k;
    if ss_within == 0.0 {
        if ss_between == 0.0 {
            return Err(HamError::Numeric(
                "ANOVA on identical observations in every group".to_string(),
            ));
        }
        return Ok(0.0);
    }

    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).map_err(|e| {
        HamError::Numeric(format!(
            "F distribution with df ({}, {}): {}",
            df_between, df_within, e
        ))
    })?;
    Ok(dist.sf(f))
}

/// Minimum strains per side for the binary partition tester.
const MIN_BINARY_SIDE: usize = 3;

/// Welch t-test p-value per binary partition.
///
/// Strain means segregate into the inside (bit set) and outside (bit
/// clear) samples; strains without measurements are excluded from both.
/// Degenerate partitions (either side below three strains) report exactly
/// 1.0. Numerical failures propagate; they are never coerced to zero.
pub fn t_test_partitions(
    partitions: &[&Sdp],
    strain_means: &[Option<f64>],
) -> Result<Vec<f64>, HamError> {
    let mut p_values = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let mut inside = Vec::new();
        let mut outside = Vec::new();
        for (i, mean) in strain_means.iter().enumerate() {
            let Some(mean) = mean else { continue };
            if partition.get(i) {
                inside.push(*mean);
            } else {
                outside.push(*mean);
            }
        }

        if inside.len() < MIN_BINARY_SIDE || outside.len() < MIN_BINARY_SIDE {
            p_values.push(1.0);
        } else {
            p_values.push(welch_t_test(&inside, &outside)?);
        }
    }
    Ok(p_values)
}

/// Divide each p-value by its class's cumulative extent, yielding a
/// per-base score. The result is not a probability.
pub fn normalized_scores(p_values: &[f64], cumulative_extents_bp: &[i64]) -> Vec<f64> {
    debug_assert_eq!(p_values.len(), cumulative_extents_bp.len());
    p_values
        .iter()
        .zip(cumulative_extents_bp)
        .map(|(p, extent)| p / *extent as f64)
        .collect()
}

/// One-way ANOVA p-value per multi-group partition.
///
/// Groups with fewer than two strains are dropped; when fewer than two
/// groups survive the partition reports exactly 1.0.
pub fn f_test_partitions(
    partitions: &[&[i16]],
    strain_means: &[Option<f64>],
) -> Result<Vec<f64>, HamError> {
    let mut p_values = Vec::with_capacity(partitions.len());
    for groups in partitions {
        if groups.len() != strain_means.len() {
            return Err(HamError::Numeric(format!(
                "group array length {} does not match strain count {}",
                groups.len(),
                strain_means.len()
            )));
        }

        let mut by_group: std::collections::BTreeMap<i16, Vec<f64>> =
            std::collections::BTreeMap::new();
        for (i, mean) in strain_means.iter().enumerate() {
            let Some(mean) = mean else { continue };
            by_group.entry(groups[i]).or_default().push(*mean);
        }

        let surviving: Vec<Vec<f64>> = by_group
            .into_values()
            .filter(|g| g.len() >= 2)
            .collect();

        if surviving.len() < 2 {
            p_values.push(1.0);
        } else {
            p_values.push(one_way_anova(&surviving)?);
        }
    }
    Ok(p_values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_vector_skips_empty() {
        let means = strain_mean_vector(&[vec![1.0, 1.0], vec![1.0], vec![], vec![5.0, 5.0]]);
        assert_eq!(means, vec![Some(1.0), Some(1.0), None, Some(5.0)]);
    }

    #[test]
    fn welch_separated_samples() {
        let p = welch_t_test(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0, 7.0, 8.0]).unwrap();
        assert!(p < 0.01, "p = {}", p);
        assert!(p > 1e-6, "p = {}", p);
    }

    #[test]
    fn welch_identical_samples() {
        let p = welch_t_test(&[2.0, 2.0, 2.0], &[2.0, 2.0, 2.0]).unwrap();
        assert_relative_eq!(p, 1.0);
    }

    #[test]
    fn small_inside_group_is_degenerate() {
        // inside {A,B} of size 2 triggers the degenerate policy even
        // though the phenotypes separate perfectly
        let partition = Sdp::from_binary("1100");
        let means = strain_mean_vector(&[vec![1.0, 1.0], vec![1.0], vec![5.0], vec![5.0, 5.0]]);
        let p = t_test_partitions(&[&partition], &means).unwrap();
        assert_eq!(p, vec![1.0]);
    }

    #[test]
    fn three_a_side_separation_is_significant() {
        // threshold case: 3 vs 3 with perfect separation
        let partition = Sdp::from_binary("111000");
        let means: Vec<Option<f64>> =
            vec![1.0, 1.0, 1.0, 5.0, 5.0, 5.0].into_iter().map(Some).collect();
        let p = t_test_partitions(&[&partition], &means).unwrap();
        assert!(p[0] < 0.01, "p = {}", p[0]);
    }

    #[test]
    fn strains_without_measurements_reduce_n() {
        // 4 informative strains inside, but one has no data; outside keeps 3
        let partition = Sdp::from_binary("1111000");
        let means = vec![
            Some(1.0),
            Some(1.2),
            Some(0.8),
            None,
            Some(5.0),
            Some(5.2),
            Some(4.8),
        ];
        let p = t_test_partitions(&[&partition], &means).unwrap();
        assert!(p[0] < 0.05, "p = {}", p[0]);
    }

    #[test]
    fn normalized_scores_divide_by_extent() {
        let scores = normalized_scores(&[0.5, 1.0], &[100, 1000]);
        assert_relative_eq!(scores[0], 0.005);
        assert_relative_eq!(scores[1], 0.001);
    }

    #[test]
    fn anova_drops_small_groups() {
        // the singleton group {E} is dropped; the F-test runs on the
        // two remaining groups alone
        let groups: Vec<i16> = vec![0, 0, 1, 1, 2];
        let means: Vec<Option<f64>> =
            vec![1.0, 1.1, 5.0, 5.1, 3.0].into_iter().map(Some).collect();
        let p = f_test_partitions(&[&groups], &means).unwrap();
        assert!(p[0] < 0.05, "p = {}", p[0]);

        // retaining G3 with two members changes the statistic
        let groups3: Vec<i16> = vec![0, 0, 1, 1, 2, 2];
        let means3: Vec<Option<f64>> =
            vec![1.0, 1.1, 5.0, 5.1, 3.0, 3.2].into_iter().map(Some).collect();
        let p3 = f_test_partitions(&[&groups3], &means3).unwrap();
        assert!(p3[0] > 0.0 && p3[0] < 1.0);
        assert!(p3[0] != p[0]);
    }

    #[test]
    fn anova_fewer_than_two_groups_is_degenerate() {
        let groups: Vec<i16> = vec![0, 0, 1];
        let means: Vec<Option<f64>> = vec![1.0, 2.0, 9.0].into_iter().map(Some).collect();
        let p = f_test_partitions(&[&groups], &means).unwrap();
        assert_eq!(p, vec![1.0]);
    }

    #[test]
    fn anova_known_f_value() {
        // groups with textbook sums of squares
        let p = one_way_anova(&[vec![1.0, 2.0, 3.0], vec![2.0, 3.0, 4.0], vec![5.0, 6.0, 7.0]])
            .unwrap();
        assert!(p > 0.0 && p < 0.05, "p = {}", p);
    }
}
