pub mod dataset;
pub mod error;
pub mod options;
pub mod statistic;
pub mod summary;
pub mod table;
pub mod variant;

pub use dataset::{Column, ColumnData, ColumnMeta, Dataset};
pub use error::{DatasetError, Result, SpecError, SummaryError, TestError};
pub use options::{
    CategoricalLayout, ComparatorOptions, LayoutOptions, MissingRow, MultiSampleTest, PAdjust,
    SummaryOptions, TestFailurePolicy, TwoSampleTest,
};
pub use statistic::{DEFAULT_CATEGORICAL_STAT, DEFAULT_CONTINUOUS_STAT, StatisticSpec};
pub use summary::{Advisory, SummaryCell};
pub use table::{ColumnRole, RowKind, TableColumn, TableModel, TableRow};
pub use variant::{DeclaredKind, Variant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_round_trip_with_defaults() {
        let json = r#"{"by": "am", "comparator": {"enabled": true}}"#;
        let options: SummaryOptions = serde_json::from_str(json).expect("parse options");
        assert_eq!(options.by.as_deref(), Some("am"));
        assert!(options.comparator.enabled);
        assert_eq!(options.categorical_threshold, 10);
        assert_eq!(options.percent_digits, 1);
        assert!((options.comparator.fisher_min_expected - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn table_model_serializes() {
        let table = TableModel {
            columns: vec![TableColumn {
                key: "stat_1".to_string(),
                heading: "automatic".to_string(),
                role: ColumnRole::Stratum,
                n: Some(19),
            }],
            header_counts: None,
            rows: vec![],
            footnotes: vec![],
        };
        let json = serde_json::to_string(&table).expect("serialize table");
        let round: TableModel = serde_json::from_str(&json).expect("deserialize table");
        assert_eq!(round, table);
    }
}
