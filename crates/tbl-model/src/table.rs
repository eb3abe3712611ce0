#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Role of a statistic column in the table model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Stratum,
    Overall,
    N,
    Comparator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    /// Stable identifier (`stat_1`, `stat_0`, `n`, `p_value`).
    pub key: String,
    pub heading: String,
    pub role: ColumnRole,
    /// Row count of the stratum behind a stratum or overall column.
    pub n: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    /// First row of a variable (carries its label).
    Variable,
    /// Categorical level under a variable row.
    Level,
    /// Missing-count row under a variable.
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Source column name.
    pub variable: String,
    pub label: String,
    pub kind: RowKind,
    /// One entry per [`TableColumn`], in column order.
    pub cells: Vec<String>,
}

/// Abstract grid handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableModel {
    pub columns: Vec<TableColumn>,
    /// `N = ..` entries aligned with `columns`, when requested.
    pub header_counts: Option<Vec<String>>,
    pub rows: Vec<TableRow>,
    pub footnotes: Vec<String>,
}

impl TableModel {
    pub fn column_index(&self, key: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.key == key)
    }

    pub fn headings(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.heading.as_str())
            .collect()
    }

    pub fn stratum_columns(&self) -> impl Iterator<Item = &TableColumn> {
        self.columns
            .iter()
            .filter(|column| column.role == ColumnRole::Stratum)
    }

    /// All rows that belong to a source column, in table order.
    pub fn rows_for<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a TableRow> {
        self.rows.iter().filter(move |row| row.variable == variable)
    }

    /// The label row of a variable.
    pub fn variable_row(&self, variable: &str) -> Option<&TableRow> {
        self.rows
            .iter()
            .find(|row| row.kind == RowKind::Variable && row.variable == variable)
    }

    pub fn cell<'a>(&self, row: &'a TableRow, key: &str) -> Option<&'a str> {
        let index = self.column_index(key)?;
        row.cells.get(index).map(String::as_str)
    }
}
