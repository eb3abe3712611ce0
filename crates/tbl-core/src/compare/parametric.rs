//! Mean-based tests.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tbl_model::TestError;

use super::TestOutcome;
use crate::descriptive::{mean, variance};

fn distribution_error(err: impl std::fmt::Display) -> TestError {
    TestError::Distribution {
        reason: err.to_string(),
    }
}

fn two_sided_t(t: f64, df: f64) -> Result<f64, TestError> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(distribution_error)?;
    Ok(2.0 * dist.sf(t.abs()))
}

/// Mean and sample variance; both strata need two observations.
fn moments(sample: &[f64]) -> Result<(f64, f64), TestError> {
    match (mean(sample), variance(sample)) {
        (Some(center), Some(spread)) => Ok((center, spread)),
        _ => Err(TestError::InsufficientObservations { required: 2 }),
    }
}

/// Welch's unequal-variance t-test with Welch-Satterthwaite degrees of freedom.
pub(crate) fn welch_t(x: &[f64], y: &[f64]) -> Result<TestOutcome, TestError> {
    let (mx, vx) = moments(x)?;
    let (my, vy) = moments(y)?;
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let (sx, sy) = (vx / nx, vy / ny);
    let se2 = sx + sy;
    if se2 <= 0.0 {
        return Err(TestError::ZeroVariance);
    }
    let t = (mx - my) / se2.sqrt();
    let df = se2 * se2 / (sx * sx / (nx - 1.0) + sy * sy / (ny - 1.0));
    Ok(TestOutcome::new(Some(t), two_sided_t(t, df)?))
}

/// Pooled-variance two-sample t-test.
pub(crate) fn student_t(x: &[f64], y: &[f64]) -> Result<TestOutcome, TestError> {
    let (mx, vx) = moments(x)?;
    let (my, vy) = moments(y)?;
    let (nx, ny) = (x.len() as f64, y.len() as f64);
    let df = nx + ny - 2.0;
    let pooled = ((nx - 1.0) * vx + (ny - 1.0) * vy) / df;
    let se2 = pooled * (1.0 / nx + 1.0 / ny);
    if se2 <= 0.0 {
        return Err(TestError::ZeroVariance);
    }
    let t = (mx - my) / se2.sqrt();
    Ok(TestOutcome::new(Some(t), two_sided_t(t, df)?))
}

/// One-way analysis of variance; F on `k - 1` and `n - k` degrees of freedom.
pub(crate) fn one_way_anova(samples: &[&[f64]]) -> Result<TestOutcome, TestError> {
    let n: usize = samples.iter().map(|sample| sample.len()).sum();
    let k = samples.len();
    if n <= k {
        return Err(TestError::InsufficientObservations { required: 2 });
    }
    let grand = samples.iter().flat_map(|sample| sample.iter()).sum::<f64>() / n as f64;
    let mut between = 0.0;
    let mut within = 0.0;
    for sample in samples {
        let center = mean(sample).unwrap_or(grand);
        between += sample.len() as f64 * (center - grand).powi(2);
        within += sample.iter().map(|value| (value - center).powi(2)).sum::<f64>();
    }
    if within <= 0.0 {
        return Err(TestError::ZeroVariance);
    }
    let (df1, df2) = ((k - 1) as f64, (n - k) as f64);
    let f = (between / df1) / (within / df2);
    let dist = FisherSnedecor::new(df1, df2).map_err(distribution_error)?;
    Ok(TestOutcome::new(Some(f), dist.sf(f)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welch_matches_reference() {
        // t.test(c(1,2,3,4,5), c(2,4,6,8,10)): t = -1.8974, df = 5.8824, p = 0.1075
        let outcome = welch_t(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0])
            .expect("welch");
        let t = outcome.statistic.expect("statistic");
        assert!((t + 1.897_366).abs() < 1e-5, "{t}");
        assert!((outcome.p_value - 0.1075).abs() < 5e-4, "{}", outcome.p_value);
    }

    #[test]
    fn constant_samples_have_zero_variance() {
        assert_eq!(
            welch_t(&[3.0, 3.0], &[3.0, 3.0]),
            Err(TestError::ZeroVariance)
        );
        assert_eq!(
            one_way_anova(&[&[1.0, 1.0], &[2.0, 2.0]]),
            Err(TestError::ZeroVariance)
        );
    }

    #[test]
    fn single_observation_is_insufficient() {
        assert_eq!(
            student_t(&[1.0], &[2.0, 3.0]),
            Err(TestError::InsufficientObservations { required: 2 })
        );
    }

    #[test]
    fn anova_statistic() {
        // Group means 2, 5, 8; grand mean 5; SSB = 54, SSW = 6; F = 27 on (2, 6).
        let outcome = one_way_anova(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]])
            .expect("anova");
        let f = outcome.statistic.expect("statistic");
        assert!((f - 27.0).abs() < 1e-9);
        assert!(outcome.p_value < 0.001);
    }
}
