//! Row partitioning by a grouping column.

use std::collections::{BTreeMap, BTreeSet};

use tbl_model::{Dataset, SummaryError};

use crate::view::{declared_levels, first_occurrence_levels, value_key};

/// Label of the pooled stratum.
pub const OVERALL_LABEL: &str = "Overall";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StratumKind {
    /// One level of the grouping column.
    Level,
    /// Pooled stratum added next to the levels.
    Overall,
    /// Implicit single stratum when there is no grouping column.
    All,
}

/// Row indices of one stratum; a view into the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stratum {
    pub label: String,
    pub kind: StratumKind,
    pub rows: Vec<usize>,
}

impl Stratum {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strata {
    /// Grouping column, if any.
    pub by: Option<String>,
    /// Level strata in display order, or the single implicit stratum.
    pub groups: Vec<Stratum>,
    /// Pooled stratum over every row, when requested with a grouping column.
    pub overall: Option<Stratum>,
}

impl Strata {
    pub fn is_grouped(&self) -> bool {
        self.by.is_some()
    }

    /// Groups followed by the overall stratum.
    pub fn iter(&self) -> impl Iterator<Item = &Stratum> {
        self.groups.iter().chain(self.overall.iter())
    }

    pub fn labels(&self) -> Vec<&str> {
        self.groups.iter().map(|stratum| stratum.label.as_str()).collect()
    }
}

/// Partitions the rows of `dataset` by the levels of `by`.
///
/// Strata follow the declared level order of the grouping column, then the
/// first occurrence of undeclared values. Rows with a missing group value
/// belong to no level stratum but stay in the overall stratum. Without a
/// grouping column the result is one stratum holding every row.
///
/// # Errors
///
/// [`SummaryError::UnknownColumn`] when `by` is not in the dataset.
pub fn stratify(
    dataset: &Dataset,
    by: Option<&str>,
    include_overall: bool,
) -> Result<Strata, SummaryError> {
    let all_rows: Vec<usize> = (0..dataset.row_count()).collect();
    let Some(by) = by else {
        return Ok(Strata {
            by: None,
            groups: vec![Stratum {
                label: OVERALL_LABEL.to_string(),
                kind: StratumKind::All,
                rows: all_rows,
            }],
            overall: None,
        });
    };
    let column = dataset.column(by).ok_or_else(|| SummaryError::UnknownColumn {
        column: by.to_string(),
    })?;

    let mut labels = declared_levels(column);
    let declared: BTreeSet<String> = labels.iter().cloned().collect();
    labels.extend(first_occurrence_levels(column, &declared));

    let mut rows_by_label: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..dataset.row_count() {
        if let Some(key) = value_key(&column.data, row) {
            rows_by_label.entry(key).or_default().push(row);
        }
    }
    let groups = labels
        .into_iter()
        .map(|label| Stratum {
            rows: rows_by_label.remove(&label).unwrap_or_default(),
            label,
            kind: StratumKind::Level,
        })
        .collect();

    Ok(Strata {
        by: Some(by.to_string()),
        groups,
        overall: include_overall.then(|| Stratum {
            label: OVERALL_LABEL.to_string(),
            kind: StratumKind::Overall,
            rows: all_rows,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbl_model::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::text(
                "am",
                vec![Some("automatic"), Some("manual"), None, Some("automatic")],
            ),
            Column::numeric("mpg", vec![Some(21.0), Some(22.8), Some(18.7), Some(14.3)]),
        ])
        .expect("dataset")
    }

    #[test]
    fn first_occurrence_order_and_overall() {
        let strata = stratify(&dataset(), Some("am"), true).expect("strata");
        assert_eq!(strata.labels(), vec!["automatic", "manual"]);
        assert_eq!(strata.groups[0].rows, vec![0, 3]);
        assert_eq!(strata.overall.as_ref().map(Stratum::len), Some(4));
    }

    #[test]
    fn declared_numeric_levels_normalize() {
        let dataset = Dataset::new(vec![
            Column::numeric("grp", vec![Some(0.0), Some(1.0), Some(0.0), Some(1.0)])
                .with_levels(["1.0", "0.0"]),
        ])
        .expect("dataset");
        let strata = stratify(&dataset, Some("grp"), false).expect("strata");
        assert_eq!(strata.labels(), vec!["1", "0"]);
        assert_eq!(strata.groups[0].rows, vec![1, 3]);
        assert_eq!(strata.groups[1].rows, vec![0, 2]);
    }

    #[test]
    fn no_grouping_column_gives_one_stratum() {
        let strata = stratify(&dataset(), None, true).expect("strata");
        assert_eq!(strata.groups.len(), 1);
        assert_eq!(strata.groups[0].kind, StratumKind::All);
        assert!(strata.overall.is_none());
    }

    #[test]
    fn unknown_grouping_column() {
        assert_eq!(
            stratify(&dataset(), Some("gear"), false),
            Err(SummaryError::UnknownColumn {
                column: "gear".to_string()
            })
        );
    }
}
