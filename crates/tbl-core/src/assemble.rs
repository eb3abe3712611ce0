//! Table assembly from per-column results.
//!
//! Column order is fixed: stratum columns in stratifier order, then Overall,
//! then N, then the p-value column. Layout flags only add or remove columns
//! and rows; they never reorder them.

use tbl_common::format_pvalue;
use tbl_model::{
    CategoricalLayout, ColumnRole, LayoutOptions, MissingRow, PAdjust, RowKind, SummaryCell,
    TableColumn, TableModel, TableRow, Variant,
};

use crate::evaluate::Evaluation;
use crate::stratify::{Strata, StratumKind};

/// Everything computed for one summarized column.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSummary {
    pub name: String,
    pub label: String,
    pub variant: Variant,
    /// One evaluation per stratum column: groups, then overall.
    pub cells: Vec<Evaluation>,
    /// Missing-count cells aligned with `cells`.
    pub missing: Vec<SummaryCell>,
    /// Missing values over all rows.
    pub missing_total: usize,
    /// Non-missing values over all rows.
    pub n: usize,
    /// Reader-facing statistic description for footnotes.
    pub legend: String,
    /// Test that produced `p_value`, or that failed.
    pub test: Option<String>,
    /// Adjusted p-value; `None` when not compared or the test failed.
    pub p_value: Option<f64>,
}

/// Input of [`assemble`].
#[derive(Debug, Clone)]
pub struct AssemblyInput<'a> {
    pub strata: &'a Strata,
    pub variables: Vec<VariableSummary>,
    pub p_adjust: PAdjust,
}

/// Builds the table model.
pub fn assemble(input: AssemblyInput<'_>, layout: &LayoutOptions) -> TableModel {
    let columns = table_columns(input.strata, layout);
    let stat_columns = columns
        .iter()
        .filter(|column| matches!(column.role, ColumnRole::Stratum | ColumnRole::Overall))
        .count();

    let header_counts = layout.n_header.then(|| {
        columns
            .iter()
            .map(|column| column.n.map(|n| format!("N = {n}")).unwrap_or_default())
            .collect()
    });

    let mut rows = Vec::new();
    for variable in &input.variables {
        push_variable_rows(&mut rows, variable, stat_columns, layout);
    }

    TableModel {
        footnotes: footnotes(&input, layout),
        columns,
        header_counts,
        rows,
    }
}

fn table_columns(strata: &Strata, layout: &LayoutOptions) -> Vec<TableColumn> {
    let mut columns = Vec::new();
    let mut index = 0;
    for stratum in &strata.groups {
        let (key, role) = match stratum.kind {
            StratumKind::All => ("stat_0".to_string(), ColumnRole::Overall),
            StratumKind::Level | StratumKind::Overall => {
                index += 1;
                (format!("stat_{index}"), ColumnRole::Stratum)
            }
        };
        columns.push(TableColumn {
            key,
            heading: stratum.label.clone(),
            role,
            n: Some(stratum.len()),
        });
    }
    if layout.overall
        && let Some(overall) = &strata.overall
    {
        columns.push(TableColumn {
            key: "stat_0".to_string(),
            heading: overall.label.clone(),
            role: ColumnRole::Overall,
            n: Some(overall.len()),
        });
    }
    if layout.n_column {
        columns.push(TableColumn {
            key: "n".to_string(),
            heading: "N".to_string(),
            role: ColumnRole::N,
            n: None,
        });
    }
    if layout.comparator {
        columns.push(TableColumn {
            key: "p_value".to_string(),
            heading: "p-value".to_string(),
            role: ColumnRole::Comparator,
            n: None,
        });
    }
    columns
}

/// Appends the N and p-value cells requested by the layout.
fn push_trailing(cells: &mut Vec<String>, variable: &VariableSummary, layout: &LayoutOptions, first: bool) {
    if layout.n_column {
        cells.push(if first { variable.n.to_string() } else { String::new() });
    }
    if layout.comparator {
        cells.push(match variable.p_value {
            Some(p) if first => format_pvalue(p),
            None if first => layout.placeholder.clone(),
            _ => String::new(),
        });
    }
}

fn push_variable_rows(
    rows: &mut Vec<TableRow>,
    variable: &VariableSummary,
    stat_columns: usize,
    layout: &LayoutOptions,
) {
    let evaluations = &variable.cells[..stat_columns.min(variable.cells.len())];
    let row = |label: &str, kind: RowKind, mut cells: Vec<String>, first: bool| {
        push_trailing(&mut cells, variable, layout, first);
        TableRow {
            variable: variable.name.clone(),
            label: label.to_string(),
            kind,
            cells,
        }
    };

    match variable.variant {
        Variant::Continuous | Variant::Dichotomous => {
            let cells = evaluations
                .iter()
                .map(|evaluation| {
                    evaluation
                        .single()
                        .map(|cell| cell.text.clone())
                        .unwrap_or_default()
                })
                .collect();
            rows.push(row(&variable.label, RowKind::Variable, cells, true));
        }
        Variant::Categorical => match layout.categorical_layout {
            CategoricalLayout::Nested => {
                rows.push(row(
                    &variable.label,
                    RowKind::Variable,
                    vec![String::new(); evaluations.len()],
                    true,
                ));
                let levels = evaluations.first().map(Evaluation::levels).unwrap_or_default();
                for (position, level) in levels.iter().enumerate() {
                    let cells = evaluations
                        .iter()
                        .map(|evaluation| {
                            evaluation
                                .levels()
                                .get(position)
                                .map(|entry| entry.cell.text.clone())
                                .unwrap_or_default()
                        })
                        .collect();
                    rows.push(row(&level.level, RowKind::Level, cells, false));
                }
            }
            CategoricalLayout::Inline => {
                let cells = evaluations
                    .iter()
                    .map(|evaluation| {
                        evaluation
                            .levels()
                            .iter()
                            .map(|entry| format!("{}: {}", entry.level, entry.cell.text))
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
                    .collect();
                rows.push(row(&variable.label, RowKind::Variable, cells, true));
            }
        },
    }

    let show_missing = match layout.missing {
        MissingRow::IfAny => variable.missing_total > 0,
        MissingRow::Always => true,
        MissingRow::Never => false,
    };
    if show_missing {
        let cells = variable.missing[..stat_columns.min(variable.missing.len())]
            .iter()
            .map(|cell| cell.text.clone())
            .collect();
        rows.push(row(&layout.missing_text, RowKind::Missing, cells, false));
    }
}

fn footnotes(input: &AssemblyInput<'_>, layout: &LayoutOptions) -> Vec<String> {
    let mut notes = Vec::new();
    let mut legends: Vec<&str> = Vec::new();
    for variable in &input.variables {
        if !legends.contains(&variable.legend.as_str()) {
            legends.push(&variable.legend);
        }
    }
    if !legends.is_empty() {
        notes.push(legends.join("; "));
    }
    if layout.comparator {
        let mut tests: Vec<&str> = Vec::new();
        for test in input
            .variables
            .iter()
            .filter(|variable| variable.p_value.is_some())
            .filter_map(|variable| variable.test.as_deref())
        {
            if !tests.contains(&test) {
                tests.push(test);
            }
        }
        if !tests.is_empty() {
            notes.push(tests.join("; "));
        }
        if input.p_adjust != PAdjust::None {
            notes.push(format!("p-values adjusted with {}", input.p_adjust.description()));
        }
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::LevelCell;
    use crate::stratify::Stratum;

    fn strata() -> Strata {
        Strata {
            by: Some("am".to_string()),
            groups: vec![
                Stratum {
                    label: "automatic".to_string(),
                    kind: StratumKind::Level,
                    rows: vec![0, 1],
                },
                Stratum {
                    label: "manual".to_string(),
                    kind: StratumKind::Level,
                    rows: vec![2],
                },
            ],
            overall: Some(Stratum {
                label: "Overall".to_string(),
                kind: StratumKind::Overall,
                rows: vec![0, 1, 2, 3],
            }),
        }
    }

    fn cell(text: &str) -> SummaryCell {
        SummaryCell::new(text, Vec::new())
    }

    fn categorical() -> VariableSummary {
        let per_stratum = |a: &str, b: &str| {
            Evaluation::PerLevel(vec![
                LevelCell {
                    level: "4".to_string(),
                    cell: cell(a),
                },
                LevelCell {
                    level: "6".to_string(),
                    cell: cell(b),
                },
            ])
        };
        VariableSummary {
            name: "cyl".to_string(),
            label: "Cylinders".to_string(),
            variant: Variant::Categorical,
            cells: vec![
                per_stratum("1 (50.0%)", "1 (50.0%)"),
                per_stratum("1 (100.0%)", "0 (0.0%)"),
                per_stratum("2 (66.7%)", "1 (33.3%)"),
            ],
            missing: vec![cell("0"), cell("0"), cell("1")],
            missing_total: 1,
            n: 3,
            legend: "n (%)".to_string(),
            test: Some("Fisher's exact test".to_string()),
            p_value: Some(0.0004),
        }
    }

    fn layout() -> LayoutOptions {
        LayoutOptions {
            overall: true,
            n_column: true,
            n_header: true,
            comparator: true,
            missing_text: "Unknown".to_string(),
            ..LayoutOptions::default()
        }
    }

    #[test]
    fn nested_rows_and_fixed_column_order() {
        let strata = strata();
        let input = AssemblyInput {
            strata: &strata,
            variables: vec![categorical()],
            p_adjust: PAdjust::None,
        };
        let table = assemble(input, &layout());
        assert_eq!(
            table.headings(),
            vec!["automatic", "manual", "Overall", "N", "p-value"]
        );
        assert_eq!(
            table.header_counts,
            Some(vec![
                "N = 2".to_string(),
                "N = 1".to_string(),
                "N = 4".to_string(),
                String::new(),
                String::new()
            ])
        );
        let labels: Vec<_> = table.rows.iter().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, vec!["Cylinders", "4", "6", "Unknown"]);
        assert_eq!(table.rows[0].cells, vec!["", "", "", "3", "<0.001"]);
        assert_eq!(table.rows[2].cells, vec!["1 (50.0%)", "0 (0.0%)", "1 (33.3%)", "", ""]);
        assert_eq!(table.rows[3].kind, RowKind::Missing);
        assert_eq!(table.footnotes, vec!["n (%)", "Fisher's exact test"]);
    }

    #[test]
    fn inline_layout_without_optional_columns() {
        let strata = strata();
        let input = AssemblyInput {
            strata: &strata,
            variables: vec![categorical()],
            p_adjust: PAdjust::Holm,
        };
        let layout = LayoutOptions {
            categorical_layout: CategoricalLayout::Inline,
            missing: MissingRow::Never,
            ..LayoutOptions::default()
        };
        let table = assemble(input, &layout);
        assert_eq!(table.headings(), vec!["automatic", "manual"]);
        assert!(table.header_counts.is_none());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells[1], "4: 1 (100.0%); 6: 0 (0.0%)");
        assert_eq!(table.footnotes, vec!["n (%)"]);
    }
}
