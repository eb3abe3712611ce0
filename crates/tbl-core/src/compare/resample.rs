//! Permutation tests.
//!
//! Without a seed the generator is seeded from the operating system and
//! p-values differ between runs.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tbl_model::TestError;

use super::TestOutcome;
use super::contingency::Contingency;
use crate::descriptive::mean;

pub(crate) fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn require_replicates(replicates: usize) -> Result<(), TestError> {
    if replicates == 0 {
        return Err(TestError::Failed(
            "permutation test needs at least one replicate".to_string(),
        ));
    }
    Ok(())
}

/// Between-group sum of squares `Σ nᵢ (x̄ᵢ - x̄)²` of consecutive groups.
fn between_groups(values: &[f64], sizes: &[usize]) -> f64 {
    let grand = mean(values).unwrap_or(0.0);
    let mut offset = 0;
    let mut total = 0.0;
    for &size in sizes {
        let group = &values[offset..offset + size];
        if let Some(center) = mean(group) {
            total += size as f64 * (center - grand).powi(2);
        }
        offset += size;
    }
    total
}

/// Permutation test on the between-group sum of squares; labels are
/// shuffled across the pooled values.
pub(crate) fn numeric_permutation(
    samples: &[&[f64]],
    seed: Option<u64>,
    replicates: usize,
) -> Result<TestOutcome, TestError> {
    require_replicates(replicates)?;
    let sizes: Vec<usize> = samples.iter().map(|sample| sample.len()).collect();
    let mut pooled: Vec<f64> = samples.iter().flat_map(|sample| sample.iter().copied()).collect();
    let observed = between_groups(&pooled, &sizes);
    let threshold = observed - 1e-7 * observed.abs().max(1.0);
    let mut rng = rng(seed);
    let mut hits = 0usize;
    for _ in 0..replicates {
        pooled.shuffle(&mut rng);
        if between_groups(&pooled, &sizes) >= threshold {
            hits += 1;
        }
    }
    let p_value = (1 + hits) as f64 / (replicates + 1) as f64;
    Ok(TestOutcome::new(Some(observed), p_value))
}

/// Permutation test on Pearson's chi-squared statistic with fixed margins.
pub(crate) fn table_permutation(
    table: &Contingency,
    seed: Option<u64>,
    replicates: usize,
) -> Result<TestOutcome, TestError> {
    require_replicates(replicates)?;
    let statistic = table.chi_square_statistic();
    let p_value = table.simulate(&mut rng(seed), replicates, Contingency::chi_square_statistic);
    Ok(TestOutcome::new(Some(statistic), p_value))
}
