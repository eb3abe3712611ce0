//! Rank-based tests.

use std::cmp::Ordering;

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use tbl_model::TestError;

use super::TestOutcome;

/// Mid-ranks of the pooled values, plus the tie term `Σ (t³ - t)`.
pub(crate) fn mid_ranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    let mut ranks = vec![0.0; values.len()];
    let mut ties = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share the average of ranks start+1..=end.
        let rank = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        let t = (end - start) as f64;
        ties += t * t * t - t;
        start = end;
    }
    (ranks, ties)
}

fn distribution_error(err: impl std::fmt::Display) -> TestError {
    TestError::Distribution {
        reason: err.to_string(),
    }
}

/// Wilcoxon rank-sum (Mann-Whitney) test, normal approximation with tie and
/// continuity correction. The statistic is `W = R₁ - n₁(n₁ + 1)/2`.
pub(crate) fn wilcoxon(x: &[f64], y: &[f64]) -> Result<TestOutcome, TestError> {
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let pooled: Vec<f64> = x.iter().chain(y).copied().collect();
    let n = pooled.len() as f64;
    let (ranks, ties) = mid_ranks(&pooled);
    let rank_sum: f64 = ranks[..x.len()].iter().sum();
    let w = rank_sum - nx * (nx + 1.0) / 2.0;

    let variance = nx * ny / 12.0 * ((n + 1.0) - ties / (n * (n - 1.0)));
    if variance <= 0.0 {
        return Err(TestError::ZeroVariance);
    }
    let shift = w - nx * ny / 2.0;
    let z = (shift - 0.5 * shift.signum()) / variance.sqrt();
    let normal = Normal::new(0.0, 1.0).map_err(distribution_error)?;
    let p_value = 2.0 * normal.cdf(z).min(normal.sf(z));
    Ok(TestOutcome::new(Some(w), p_value))
}

/// Kruskal-Wallis rank-sum test with tie correction; chi-squared reference
/// distribution on `k - 1` degrees of freedom.
pub(crate) fn kruskal_wallis(samples: &[&[f64]]) -> Result<TestOutcome, TestError> {
    let pooled: Vec<f64> = samples.iter().flat_map(|sample| sample.iter().copied()).collect();
    let n = pooled.len() as f64;
    let (ranks, ties) = mid_ranks(&pooled);

    let mut offset = 0;
    let mut weighted = 0.0;
    for sample in samples {
        let rank_sum: f64 = ranks[offset..offset + sample.len()].iter().sum();
        weighted += rank_sum * rank_sum / sample.len() as f64;
        offset += sample.len();
    }
    let correction = 1.0 - ties / (n * n * n - n);
    if correction <= 0.0 {
        return Err(TestError::ZeroVariance);
    }
    let h = (12.0 / (n * (n + 1.0)) * weighted - 3.0 * (n + 1.0)) / correction;
    let df = (samples.len() - 1) as f64;
    let chi2 = ChiSquared::new(df).map_err(distribution_error)?;
    Ok(TestOutcome::new(Some(h), chi2.sf(h.max(0.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mid_ranks_average_ties() {
        let (ranks, ties) = mid_ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
        assert!((ties - 6.0).abs() < 1e-12);
    }

    #[test]
    fn wilcoxon_separated_samples() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [6.0, 7.0, 8.0, 9.0, 10.0];
        let outcome = wilcoxon(&x, &y).expect("wilcoxon");
        assert_eq!(outcome.statistic, Some(0.0));
        // z = (0 - 12.5 + 0.5) / sqrt(22.9166..) = -2.5067
        assert!((outcome.p_value - 0.012_186).abs() < 1e-4, "{}", outcome.p_value);
    }

    #[test]
    fn wilcoxon_all_tied_has_zero_variance() {
        assert_eq!(
            wilcoxon(&[2.0, 2.0], &[2.0, 2.0]),
            Err(TestError::ZeroVariance)
        );
    }

    #[test]
    fn kruskal_three_groups() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let c = [7.0, 8.0, 9.0];
        let outcome = kruskal_wallis(&[&a, &b, &c]).expect("kruskal");
        // H = 12/(9*10) * (36 + 225 + 576)/3 - 30 = 7.2
        let h = outcome.statistic.expect("statistic");
        assert!((h - 7.2).abs() < 1e-9);
        assert!((outcome.p_value - (-3.6f64).exp()).abs() < 1e-9);
    }
}
