//! Descriptive statistics over non-missing values.
//!
//! Every function returns `None` when the statistic is undefined for the
//! input (no values, or fewer than two for the spread measures).

use std::cmp::Ordering;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance with the `n - 1` denominator.
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let center = mean(values)?;
    let squares: f64 = values.iter().map(|value| (value - center).powi(2)).sum();
    Some(squares / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Percentile `q` (0..=1) of ascending `sorted` values.
///
/// Linear interpolation between order statistics (Hyndman and Fan type 7):
/// with `h = (n - 1) q`, the result is `x[⌊h⌋] + (h - ⌊h⌋)(x[⌊h⌋ + 1] - x[⌊h⌋])`.
///
/// # Examples
///
/// ```
/// use tbl_core::descriptive::percentile;
///
/// let values: Vec<f64> = (1..=10).map(f64::from).collect();
/// assert_eq!(percentile(&values, 0.5), Some(5.5));
/// assert_eq!(percentile(&values, 0.25), Some(3.25));
/// assert_eq!(percentile(&values, 0.75), Some(7.75));
/// ```
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * q.clamp(0.0, 1.0);
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(last);
    let fraction = h - lower as f64;
    Some(sorted[lower] + fraction * (sorted[upper] - sorted[lower]))
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    percentile(sorted, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    #[test]
    fn percentile_extremes() {
        let values = one_to_ten();
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 1.0), Some(10.0));
        assert_eq!(percentile(&[4.0], 0.3), Some(4.0));
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn sample_variance() {
        let values = one_to_ten();
        let var = variance(&values).expect("defined");
        assert!((var - 9.166_666_666_666_666).abs() < 1e-12);
        assert!((std_dev(&values).expect("defined") - var.sqrt()).abs() < 1e-12);
        assert_eq!(variance(&[3.0]), None);
    }

    #[test]
    fn mean_min_max() {
        let values = [2.0, -1.0, 5.0];
        assert_eq!(mean(&values), Some(2.0));
        assert_eq!(min(&values), Some(-1.0));
        assert_eq!(max(&values), Some(5.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn sorts_ascending() {
        assert_eq!(sorted(&[3.0, 1.0, 2.0]), vec![1.0, 2.0, 3.0]);
    }
}
