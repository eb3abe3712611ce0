//! Column classification into summary variants.

use tbl_model::{Column, ColumnData, DeclaredKind, Variant};

use crate::view::distinct_count;

/// Outcome of classifying one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub variant: Variant,
    /// Distinct non-missing values observed.
    pub distinct: usize,
    /// The variant was chosen by the threshold rule with a distinct count
    /// within one of the threshold.
    pub ambiguous: bool,
}

/// Decides how a column is summarized.
///
/// An explicit declared kind always wins. Otherwise text columns, columns
/// with declared levels and numeric columns with fewer than `threshold`
/// distinct non-missing values are categorical; logical columns are
/// dichotomous; remaining numeric columns are continuous. A column with no
/// observed values is categorical with zero levels.
pub fn classify(column: &Column, threshold: usize) -> Classification {
    let distinct = distinct_count(column);
    let explicit = match &column.meta.kind {
        DeclaredKind::Auto => None,
        DeclaredKind::Categorical => Some(Variant::Categorical),
        DeclaredKind::Continuous => Some(Variant::Continuous),
        DeclaredKind::Dichotomous { .. } => Some(Variant::Dichotomous),
    };
    if let Some(variant) = explicit {
        return Classification {
            variant,
            distinct,
            ambiguous: false,
        };
    }
    if distinct == 0 {
        return Classification {
            variant: Variant::Categorical,
            distinct,
            ambiguous: false,
        };
    }
    let (variant, by_threshold) = match &column.data {
        ColumnData::Text(_) => (Variant::Categorical, false),
        ColumnData::Logical(_) => (Variant::Dichotomous, false),
        ColumnData::Numeric(_) if column.meta.levels.is_some() => (Variant::Categorical, false),
        ColumnData::Numeric(_) if distinct < threshold => (Variant::Categorical, true),
        ColumnData::Numeric(_) => (Variant::Continuous, true),
    };
    Classification {
        variant,
        distinct,
        ambiguous: by_threshold && distinct.abs_diff(threshold) <= 1,
    }
}
