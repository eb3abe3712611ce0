//! In-memory tabular dataset with per-column metadata.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::DatasetError;
use crate::variant::DeclaredKind;

/// Column values. `None` is the missing marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    Logical(Vec<Option<bool>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
            ColumnData::Logical(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// NaN counts as missing for numeric data, blank strings for text.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(values) => values
                .get(row)
                .copied()
                .flatten()
                .is_none_or(f64::is_nan),
            ColumnData::Text(values) => values
                .get(row)
                .is_none_or(|value| value.as_deref().is_none_or(|text| text.trim().is_empty())),
            ColumnData::Logical(values) => values.get(row).is_none_or(Option::is_none),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Numeric(_) => "numeric",
            ColumnData::Text(_) => "text",
            ColumnData::Logical(_) => "logical",
        }
    }
}

/// Caller-supplied description of a column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: DeclaredKind,
    /// Declared level order (factor levels).
    #[serde(default)]
    pub levels: Option<Vec<String>>,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Label shown in tables: the declared label when non-empty, else the name.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub meta: ColumnMeta,
    pub data: ColumnData,
}

impl Column {
    pub fn new(meta: ColumnMeta, data: ColumnData) -> Self {
        Self { meta, data }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(ColumnMeta::new(name), ColumnData::Numeric(values))
    }

    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = Option<S>>,
    ) -> Self {
        let values = values.into_iter().map(|value| value.map(Into::into)).collect();
        Self::new(ColumnMeta::new(name), ColumnData::Text(values))
    }

    pub fn logical(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(ColumnMeta::new(name), ColumnData::Logical(values))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.meta.label = Some(label.into());
        self
    }

    pub fn with_kind(mut self, kind: DeclaredKind) -> Self {
        self.meta.kind = kind;
        self
    }

    pub fn with_levels<S: Into<String>>(mut self, levels: impl IntoIterator<Item = S>) -> Self {
        self.meta.levels = Some(levels.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.data.is_missing(row)).count()
    }
}

/// Ordered set of equally long, uniquely named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.name().to_string()) {
                return Err(DatasetError::DuplicateColumn {
                    column: column.name().to_string(),
                });
            }
            if column.len() != row_count {
                return Err(DatasetError::RowCountMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// Mutable access to a column's metadata; values stay immutable so the
    /// row-count invariant holds.
    pub fn meta_mut(&mut self, name: &str) -> Option<&mut ColumnMeta> {
        self.columns
            .iter_mut()
            .find(|column| column.name() == name)
            .map(|column| &mut column.meta)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}
