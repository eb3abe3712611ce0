//! Number formatting for table cells.

/// Formats a floating-point number as a string without trailing zeros.
///
/// Used for level labels of numeric categorical columns.
///
/// # Examples
///
/// ```
/// use tbl_common::format_numeric;
///
/// assert_eq!(format_numeric(4.0), "4");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(0.0), "0");
/// assert_eq!(format_numeric(10.0), "10");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if !s.contains('.') {
        return normalize_zero(s);
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    normalize_zero(trimmed.to_string())
}

/// Formats with a fixed number of decimal places.
///
/// # Examples
///
/// ```
/// use tbl_common::format_fixed;
///
/// assert_eq!(format_fixed(60.0, 1), "60.0");
/// assert_eq!(format_fixed(3.25, 0), "3");
/// assert_eq!(format_fixed(-0.04, 1), "0.0");
/// ```
pub fn format_fixed(v: f64, digits: usize) -> String {
    normalize_zero(format!("{v:.digits$}"))
}

/// Formats a p-value.
///
/// - below 0.001: `<0.001`
/// - below 0.1: three decimals
/// - below 0.2: two decimals
/// - up to 0.9: one decimal
/// - above 0.9: `>0.9`
///
/// # Examples
///
/// ```
/// use tbl_common::format_pvalue;
///
/// assert_eq!(format_pvalue(0.0002), "<0.001");
/// assert_eq!(format_pvalue(0.0123), "0.012");
/// assert_eq!(format_pvalue(0.15), "0.15");
/// assert_eq!(format_pvalue(0.45), "0.5");
/// assert_eq!(format_pvalue(0.95), ">0.9");
/// ```
pub fn format_pvalue(p: f64) -> String {
    if p.is_nan() {
        String::new()
    } else if p < 0.001 {
        "<0.001".to_string()
    } else if p < 0.1 {
        format_fixed(p, 3)
    } else if p < 0.2 {
        format_fixed(p, 2)
    } else if p <= 0.9 {
        format_fixed(p, 1)
    } else {
        ">0.9".to_string()
    }
}

/// `-0`, `-0.0`, ... become their unsigned form.
fn normalize_zero(s: String) -> String {
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|ch| ch == '0' || ch == '.') => rest.to_string(),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_numeric() {
        assert_eq!(format_numeric(1.0), "1");
        assert_eq!(format_numeric(100.0), "100");
        assert_eq!(format_numeric(2.125), "2.125");
        assert_eq!(format_numeric(-0.0), "0");
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(40.0, 1), "40.0");
        assert_eq!(format_fixed(5.5, 1), "5.5");
        assert_eq!(format_fixed(7.75, 2), "7.75");
        assert_eq!(format_fixed(19.0, 0), "19");
    }

    #[test]
    fn test_format_pvalue_boundaries() {
        assert_eq!(format_pvalue(0.001), "0.001");
        assert_eq!(format_pvalue(0.1), "0.10");
        assert_eq!(format_pvalue(0.2), "0.2");
        assert_eq!(format_pvalue(0.9), "0.9");
        assert_eq!(format_pvalue(1.0), ">0.9");
        assert_eq!(format_pvalue(f64::NAN), "");
    }
}
