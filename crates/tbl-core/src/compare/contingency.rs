//! Contingency-table tests.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::function::factorial::ln_factorial;
use tbl_model::TestError;

use super::TestOutcome;
use super::resample::rng;

/// Relative tolerance when comparing table probabilities.
const RELATIVE_TOLERANCE: f64 = 1e-7;

/// Level-by-stratum counts with all-zero rows and columns removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contingency {
    counts: Vec<Vec<u64>>,
    row_totals: Vec<u64>,
    col_totals: Vec<u64>,
    total: u64,
}

impl Contingency {
    /// Builds a table from `counts[row][column]`.
    ///
    /// # Errors
    ///
    /// [`TestError::InsufficientStrata`] when fewer than two columns hold
    /// counts, [`TestError::DegenerateTable`] when fewer than two rows do.
    pub fn new(counts: Vec<Vec<u64>>) -> Result<Self, TestError> {
        let width = counts.iter().map(Vec::len).max().unwrap_or(0);
        let col_totals: Vec<u64> = (0..width)
            .map(|col| counts.iter().map(|row| row.get(col).copied().unwrap_or(0)).sum())
            .collect();
        let keep: Vec<usize> = (0..width).filter(|&col| col_totals[col] > 0).collect();
        if keep.len() < 2 {
            return Err(TestError::InsufficientStrata { found: keep.len() });
        }
        let counts: Vec<Vec<u64>> = counts
            .into_iter()
            .map(|row| keep.iter().map(|&col| row.get(col).copied().unwrap_or(0)).collect::<Vec<u64>>())
            .filter(|row| row.iter().any(|&count| count > 0))
            .collect();
        if counts.len() < 2 {
            return Err(TestError::DegenerateTable {
                reason: format!("{} observed level(s), at least 2 required", counts.len()),
            });
        }
        Ok(Self::from_counts(counts))
    }

    /// Cross-tabulates level keys by stratum. Rows follow `levels`, then
    /// keys outside `levels` in first-occurrence order.
    pub fn from_samples(levels: &[String], samples: &[&[String]]) -> Result<Self, TestError> {
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        let mut order: Vec<&str> = Vec::new();
        let keys = levels
            .iter()
            .map(String::as_str)
            .chain(samples.iter().flat_map(|sample| sample.iter().map(String::as_str)));
        for key in keys {
            if !index.contains_key(key) {
                index.insert(key, order.len());
                order.push(key);
            }
        }
        let mut counts = vec![vec![0u64; samples.len()]; order.len()];
        for (col, sample) in samples.iter().enumerate() {
            for key in sample.iter() {
                if let Some(&row) = index.get(key.as_str()) {
                    counts[row][col] += 1;
                }
            }
        }
        Self::new(counts)
    }

    /// Margins computed from counts; no shape checks.
    fn from_counts(counts: Vec<Vec<u64>>) -> Self {
        let row_totals: Vec<u64> = counts.iter().map(|row| row.iter().sum()).collect();
        let width = counts.first().map_or(0, Vec::len);
        let col_totals: Vec<u64> = (0..width)
            .map(|col| counts.iter().map(|row| row[col]).sum())
            .collect();
        let total = row_totals.iter().sum();
        Self {
            counts,
            row_totals,
            col_totals,
            total,
        }
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn rows(&self) -> usize {
        self.counts.len()
    }

    pub fn cols(&self) -> usize {
        self.col_totals.len()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn expected(&self, row: usize, col: usize) -> f64 {
        self.row_totals[row] as f64 * self.col_totals[col] as f64 / self.total as f64
    }

    pub fn min_expected(&self) -> f64 {
        (0..self.rows())
            .flat_map(|row| (0..self.cols()).map(move |col| (row, col)))
            .map(|(row, col)| self.expected(row, col))
            .fold(f64::INFINITY, f64::min)
    }

    /// Pearson's `Σ (O - E)² / E`.
    pub fn chi_square_statistic(&self) -> f64 {
        let mut statistic = 0.0;
        for (row, counts) in self.counts.iter().enumerate() {
            for (col, &observed) in counts.iter().enumerate() {
                let expected = self.expected(row, col);
                statistic += (observed as f64 - expected).powi(2) / expected;
            }
        }
        statistic
    }

    /// `Σ ln(n_ij!)`; larger values mean less probable tables under fixed margins.
    fn log_factorial_sum(&self) -> f64 {
        self.counts
            .iter()
            .flatten()
            .map(|&count| ln_factorial(count))
            .sum()
    }

    /// Monte-Carlo p-value: share of tables with the observed margins, drawn
    /// by shuffling observations across strata, whose statistic is at least
    /// the observed one. Computed as `(1 + hits) / (replicates + 1)`.
    pub(crate) fn simulate(
        &self,
        rng: &mut StdRng,
        replicates: usize,
        statistic: impl Fn(&Contingency) -> f64,
    ) -> f64 {
        let observed = statistic(self);
        let threshold = observed - RELATIVE_TOLERANCE * observed.abs().max(1.0);
        let mut labels: Vec<usize> = self
            .row_totals
            .iter()
            .enumerate()
            .flat_map(|(row, &total)| std::iter::repeat_n(row, total as usize))
            .collect();
        let mut hits = 0usize;
        for _ in 0..replicates {
            labels.shuffle(rng);
            let mut counts = vec![vec![0u64; self.cols()]; self.rows()];
            let mut position = 0;
            for (col, &size) in self.col_totals.iter().enumerate() {
                for &row in &labels[position..position + size as usize] {
                    counts[row][col] += 1;
                }
                position += size as usize;
            }
            if statistic(&Contingency::from_counts(counts)) >= threshold {
                hits += 1;
            }
        }
        (1 + hits) as f64 / (replicates + 1) as f64
    }
}

/// Pearson's chi-squared test without continuity correction.
pub(crate) fn chi_square(table: &Contingency) -> Result<TestOutcome, TestError> {
    let statistic = table.chi_square_statistic();
    let df = ((table.rows() - 1) * (table.cols() - 1)) as f64;
    let dist = ChiSquared::new(df).map_err(|err| TestError::Distribution {
        reason: err.to_string(),
    })?;
    Ok(TestOutcome::new(Some(statistic), dist.sf(statistic)))
}

/// Fisher's exact test for r x c tables.
///
/// Sums the hypergeometric probabilities of every table with the observed
/// margins that is no more probable than the observed one. When the search
/// visits more than `limit` partial tables the p-value is simulated instead
/// (`replicates` draws, seeded by `seed`).
pub(crate) fn fisher_exact(
    table: &Contingency,
    limit: usize,
    seed: Option<u64>,
    replicates: usize,
) -> Result<TestOutcome, TestError> {
    let log_margins: f64 = table
        .row_totals
        .iter()
        .chain(&table.col_totals)
        .map(|&total| ln_factorial(total))
        .sum::<f64>()
        - ln_factorial(table.total);
    let observed = log_margins - table.log_factorial_sum();
    let mut search = FisherSearch {
        row_totals: &table.row_totals,
        col_remaining: table.col_totals.clone(),
        log_margins,
        threshold: observed + RELATIVE_TOLERANCE,
        p_value: 0.0,
        visited: 0,
        limit,
    };
    if search.visit(0, 0, table.row_totals[0], 0.0) {
        return Ok(TestOutcome::new(None, search.p_value));
    }
    tracing::debug!(limit, "exact enumeration budget exceeded, simulating p-value");
    if replicates == 0 {
        return Err(TestError::Failed(
            "exact enumeration too large and no replicates configured".to_string(),
        ));
    }
    let p_value = table.simulate(&mut rng(seed), replicates, Contingency::log_factorial_sum);
    Ok(TestOutcome::new(None, p_value).with_method(format!(
        "Fisher's exact test with simulated p-value ({replicates} replicates)"
    )))
}

/// Depth-first enumeration of tables with fixed margins, filled row by row.
struct FisherSearch<'a> {
    row_totals: &'a [u64],
    col_remaining: Vec<u64>,
    log_margins: f64,
    threshold: f64,
    p_value: f64,
    visited: usize,
    limit: usize,
}

impl FisherSearch<'_> {
    /// Returns false once the visit budget is exhausted.
    fn visit(&mut self, row: usize, col: usize, row_remaining: u64, log_cells: f64) -> bool {
        self.visited += 1;
        if self.visited > self.limit {
            return false;
        }
        let rows = self.row_totals.len();
        let cols = self.col_remaining.len();
        if row == rows - 1 {
            // Last row is fixed by the remaining column totals.
            let last: f64 = self.col_remaining.iter().map(|&count| ln_factorial(count)).sum();
            let log_p = self.log_margins - log_cells - last;
            if log_p <= self.threshold {
                self.p_value += log_p.exp();
            }
            return true;
        }
        if col == cols - 1 {
            if row_remaining > self.col_remaining[col] {
                return true;
            }
            self.col_remaining[col] -= row_remaining;
            let complete = self.visit(
                row + 1,
                0,
                self.row_totals[row + 1],
                log_cells + ln_factorial(row_remaining),
            );
            self.col_remaining[col] += row_remaining;
            return complete;
        }
        let upper = row_remaining.min(self.col_remaining[col]);
        for value in 0..=upper {
            self.col_remaining[col] -= value;
            let complete = self.visit(
                row,
                col + 1,
                row_remaining - value,
                log_cells + ln_factorial(value),
            );
            self.col_remaining[col] += value;
            if !complete {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn drops_empty_levels_and_strata() {
        let a = labels(&["x", "y", "x"]);
        let b = labels(&["y", "y"]);
        let empty: Vec<String> = Vec::new();
        let table = Contingency::from_samples(
            &labels(&["x", "y", "z"]),
            &[a.as_slice(), empty.as_slice(), b.as_slice()],
        )
        .expect("table");
        assert_eq!(table.counts(), &[vec![2u64, 0], vec![1u64, 2]]);
        assert_eq!(table.total(), 5);
    }

    #[test]
    fn single_level_is_degenerate() {
        let a = labels(&["x", "x"]);
        let b = labels(&["x"]);
        assert!(matches!(
            Contingency::from_samples(&labels(&["x"]), &[a.as_slice(), b.as_slice()]),
            Err(TestError::DegenerateTable { .. })
        ));
    }

    #[test]
    fn chi_square_reference() {
        let table = Contingency::new(vec![vec![10, 20], vec![20, 10]]).expect("table");
        assert!((table.min_expected() - 15.0).abs() < 1e-12);
        let outcome = chi_square(&table).expect("chi-square");
        let statistic = outcome.statistic.expect("statistic");
        assert!((statistic - 20.0 / 3.0).abs() < 1e-9);
        assert!(outcome.p_value > 0.009 && outcome.p_value < 0.011, "{}", outcome.p_value);
    }

    #[test]
    fn fisher_tea_tasting() {
        let table = Contingency::new(vec![vec![3, 1], vec![1, 3]]).expect("table");
        let outcome = fisher_exact(&table, 1_000_000, None, 0).expect("fisher");
        assert!((outcome.p_value - 34.0 / 70.0).abs() < 1e-9, "{}", outcome.p_value);
        assert!(outcome.method.is_none());
    }

    #[test]
    fn fisher_three_by_two() {
        // Margins rows (2, 2, 2), columns (3, 3): 7 tables. The six
        // permutations of (2, 1, 0) each have probability 0.1.
        let table = Contingency::new(vec![vec![2, 0], vec![1, 1], vec![0, 2]]).expect("table");
        let outcome = fisher_exact(&table, 1_000_000, None, 0).expect("fisher");
        assert!((outcome.p_value - 0.6).abs() < 1e-9, "{}", outcome.p_value);
    }

    #[test]
    fn fisher_falls_back_to_simulation() {
        let table = Contingency::new(vec![vec![3, 1], vec![1, 3]]).expect("table");
        let outcome = fisher_exact(&table, 1, Some(7), 500).expect("fisher");
        assert!(outcome.method.is_some());
        assert!(outcome.p_value > 0.3 && outcome.p_value < 0.7, "{}", outcome.p_value);
        let again = fisher_exact(&table, 1, Some(7), 500).expect("fisher");
        assert_eq!(outcome.p_value, again.p_value);
    }
}
