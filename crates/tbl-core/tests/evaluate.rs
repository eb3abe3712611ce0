use tbl_core::{Summarizer, summarize};
use tbl_model::{Column, Dataset, DeclaredKind, RowKind, SpecError, StatisticSpec, SummaryError, SummaryOptions};

fn only_row_cells(report: &tbl_core::SummaryReport, column: &str) -> Vec<String> {
    report
        .table
        .variable_row(column)
        .map(|row| row.cells.clone())
        .unwrap_or_default()
}

#[test]
fn level_percentages_use_non_missing_denominator() {
    let dataset = Dataset::new(vec![Column::text(
        "sex",
        vec![Some("F"), Some("F"), Some("M"), Some("F"), None, Some("M")],
    )])
    .expect("dataset");
    let report = summarize(&dataset, &SummaryOptions::new()).expect("summary");
    let rows: Vec<_> = report.table.rows_for("sex").collect();
    assert_eq!(rows[1].label, "F");
    assert_eq!(rows[1].cells, vec!["3 (60.0%)"]);
    assert_eq!(rows[2].label, "M");
    assert_eq!(rows[2].cells, vec!["2 (40.0%)"]);
    assert_eq!(rows[3].kind, RowKind::Missing);
    assert_eq!(rows[3].cells, vec!["1"]);
}

#[test]
fn median_and_quartiles_interpolate() {
    let dataset = Dataset::new(vec![Column::numeric(
        "x",
        (1..=10).map(|value| Some(f64::from(value))).collect(),
    )])
    .expect("dataset");
    let mut options = SummaryOptions::new();
    options.digits.insert("x".to_string(), 2);
    let report = summarize(&dataset, &options).expect("summary");
    assert_eq!(only_row_cells(&report, "x"), vec!["5.50 (3.25, 7.75)"]);
}

#[test]
fn mean_and_standard_deviation() {
    let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let dataset = Dataset::new(vec![
        Column::numeric("x", values.iter().copied().map(Some).collect())
            .with_kind(DeclaredKind::Continuous),
    ])
    .expect("dataset");
    let options = SummaryOptions::new().with_statistics(
        StatisticSpec::default().with_all_continuous("{mean} ({sd}) [{min}-{max}] {p90}"),
    );
    let report = summarize(&dataset, &options).expect("summary");
    assert_eq!(only_row_cells(&report, "x"), vec!["5.0 (2.1) [2.0-9.0] 7.6"]);
}

#[test]
fn fully_missing_column_uses_placeholder() {
    let dataset = Dataset::new(vec![
        Column::numeric("lab", vec![None; 5]).with_kind(DeclaredKind::Continuous),
    ])
    .expect("dataset");
    let mut options = SummaryOptions::new().with_statistics(
        StatisticSpec::default().with_column("lab", "{mean} ({N_miss}/{N_obs}, {p_miss}%)"),
    );
    options.missing_placeholder = "NA".to_string();
    let report = summarize(&dataset, &options).expect("summary");
    assert_eq!(only_row_cells(&report, "lab"), vec!["NA (5/5, 100.0%)"]);
}

#[test]
fn missingness_tokens_in_categorical_expression() {
    let dataset = Dataset::new(vec![Column::text(
        "site",
        vec![Some("a"), None, Some("b"), Some("a")],
    )])
    .expect("dataset");
    let options = SummaryOptions::new()
        .with_statistics(StatisticSpec::default().with_all_categorical("{n}/{N} of {N_nonmiss}"));
    let report = summarize(&dataset, &options).expect("summary");
    let level_a = report
        .table
        .rows_for("site")
        .find(|row| row.label == "a")
        .expect("level row");
    assert_eq!(level_a.cells, vec!["2/3 of 3"]);
}

#[test]
fn dichotomous_logical_column_single_row() {
    let dataset = Dataset::new(vec![
        Column::logical("smoker", vec![Some(true), Some(true), Some(false), None])
            .with_label("Current smoker"),
    ])
    .expect("dataset");
    let report = summarize(&dataset, &SummaryOptions::new()).expect("summary");
    let rows: Vec<_> = report.table.rows_for("smoker").collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].label, "Current smoker");
    assert_eq!(rows[0].cells, vec!["2 (66.7%)"]);
    assert_eq!(rows[1].kind, RowKind::Missing);
}

#[test]
fn dichotomous_declared_level_on_text() {
    let dataset = Dataset::new(vec![
        Column::text(
            "response",
            vec![Some("CR"), Some("PD"), Some("CR"), Some("SD")],
        )
        .with_kind(DeclaredKind::Dichotomous {
            level: Some("CR".to_string()),
        }),
    ])
    .expect("dataset");
    let report = summarize(&dataset, &SummaryOptions::new()).expect("summary");
    assert_eq!(only_row_cells(&report, "response"), vec!["2 (50.0%)"]);
}

#[test]
fn dichotomous_text_without_level_is_rejected() {
    let dataset = Dataset::new(vec![
        Column::text("arm", vec![Some("A"), Some("B")]).with_kind(DeclaredKind::Dichotomous {
            level: None,
        }),
    ])
    .expect("dataset");
    assert_eq!(
        summarize(&dataset, &SummaryOptions::new()),
        Err(SummaryError::Spec(SpecError::DichotomousLevel {
            column: "arm".to_string()
        }))
    );
}

#[test]
fn continuous_text_column_is_rejected() {
    let dataset = Dataset::new(vec![
        Column::text("id", vec![Some("a"), Some("b")]).with_kind(DeclaredKind::Continuous),
    ])
    .expect("dataset");
    assert_eq!(
        summarize(&dataset, &SummaryOptions::new()),
        Err(SummaryError::Spec(SpecError::ContinuousNonNumeric {
            column: "id".to_string()
        }))
    );
}

#[test]
fn percentile_above_hundred_is_rejected() {
    let dataset = Dataset::new(vec![Column::numeric(
        "x",
        (0..20).map(|value| Some(f64::from(value))).collect(),
    )])
    .expect("dataset");
    let options =
        SummaryOptions::new().with_statistics(StatisticSpec::default().with_column("x", "{p101}"));
    assert_eq!(
        summarize(&dataset, &options),
        Err(SummaryError::Spec(SpecError::PercentileRange {
            token: "p101".to_string()
        }))
    );
}

#[test]
fn registered_function_per_stratum() {
    let dataset = Dataset::new(vec![
        Column::text("arm", vec![Some("A"), Some("A"), Some("B"), Some("B")]),
        Column::numeric("x", vec![Some(1.0), Some(3.0), None, None])
            .with_kind(DeclaredKind::Continuous),
    ])
    .expect("dataset");
    let mut options = SummaryOptions::new()
        .by("arm")
        .with_statistics(StatisticSpec::default().with_column("x", "{geo} / {n_pos}"));
    options.missing_placeholder = "-".to_string();
    let report = Summarizer::new()
        .with_function("geo", |values: &[f64]| {
            let product: f64 = values.iter().product();
            Some(product.powf(1.0 / values.len() as f64))
        })
        .with_function("n_pos", |values: &[f64]| {
            Some(values.iter().filter(|value| **value > 0.0).count() as f64)
        })
        .summarize(&dataset, &options)
        .expect("summary");
    // Functions are not called for strata without values.
    assert_eq!(only_row_cells(&report, "x"), vec!["1.7 / 2.0", "- / -"]);
}
