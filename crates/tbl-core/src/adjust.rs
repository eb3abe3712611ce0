//! Multiple-comparison adjustment of p-values.

use std::cmp::Ordering;

use tbl_model::PAdjust;

/// Adjusts `p_values` jointly; the result keeps the input order.
///
/// # Examples
///
/// ```
/// use tbl_core::adjust::adjust_p_values;
/// use tbl_model::PAdjust;
///
/// let adjusted = adjust_p_values(&[0.01, 0.04, 0.03], PAdjust::Holm);
/// assert_eq!(adjusted, vec![0.03, 0.06, 0.06]);
/// ```
pub fn adjust_p_values(p_values: &[f64], method: PAdjust) -> Vec<f64> {
    let m = p_values.len() as f64;
    match method {
        PAdjust::None => p_values.to_vec(),
        PAdjust::Bonferroni => p_values.iter().map(|p| (p * m).min(1.0)).collect(),
        PAdjust::Holm => {
            let order = ascending(p_values);
            let mut adjusted = vec![0.0; p_values.len()];
            let mut running: f64 = 0.0;
            for (rank, &index) in order.iter().enumerate() {
                let value = ((m - rank as f64) * p_values[index]).min(1.0);
                running = running.max(value);
                adjusted[index] = running;
            }
            adjusted
        }
        PAdjust::Fdr => {
            let order = ascending(p_values);
            let mut adjusted = vec![0.0; p_values.len()];
            let mut running: f64 = 1.0;
            for (rank, &index) in order.iter().enumerate().rev() {
                let value = (m / (rank + 1) as f64 * p_values[index]).min(1.0);
                running = running.min(value);
                adjusted[index] = running;
            }
            adjusted
        }
    }
}

fn ascending(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    order
}
