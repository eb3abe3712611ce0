//! Row-subset views over dataset columns.
//!
//! A [`ColumnView`] pairs a borrowed column with the row indices of one
//! stratum, so strata never copy column values.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tbl_common::{format_numeric, logical_label, parse_bool, parse_f64};
use tbl_model::{Column, ColumnData};

/// Level key of a single cell, `None` when missing.
///
/// Numeric values use [`format_numeric`], logical values `TRUE`/`FALSE`.
pub fn value_key(data: &ColumnData, row: usize) -> Option<String> {
    if data.is_missing(row) {
        return None;
    }
    match data {
        ColumnData::Numeric(values) => values[row].map(format_numeric),
        ColumnData::Text(values) => values[row].clone(),
        ColumnData::Logical(values) => values[row].map(|value| logical_label(value).to_string()),
    }
}

/// Number of distinct non-missing values in the column.
pub fn distinct_count(column: &Column) -> usize {
    let keys: BTreeSet<String> = (0..column.len())
        .filter_map(|row| value_key(&column.data, row))
        .collect();
    keys.len()
}

/// Declared levels of `column` written as the keys [`value_key`] produces.
///
/// Numeric levels go through [`format_numeric`] and logical levels become
/// `TRUE`/`FALSE`, so `"1.0"` and `"1"` name the same level. Levels that do
/// not parse stay as written and never match a row. Blank levels are
/// dropped, later duplicates too.
pub fn declared_levels(column: &Column) -> Vec<String> {
    let Some(declared) = &column.meta.levels else {
        return Vec::new();
    };
    let mut levels: Vec<String> = Vec::with_capacity(declared.len());
    for level in declared {
        if level.trim().is_empty() {
            continue;
        }
        let key = match column.data {
            ColumnData::Numeric(_) => parse_f64(level).map_or_else(|| level.clone(), format_numeric),
            ColumnData::Logical(_) => parse_bool(level)
                .map_or_else(|| level.clone(), |flag| logical_label(flag).to_string()),
            ColumnData::Text(_) => level.clone(),
        };
        if !levels.contains(&key) {
            levels.push(key);
        }
    }
    levels
}

/// Level order used for categorical rows.
///
/// Declared levels come first, in declared order. Observed values that were
/// not declared follow: numeric ascending, logical `FALSE` before `TRUE`,
/// text in first-occurrence order.
pub fn ordered_levels(column: &Column) -> Vec<String> {
    let mut levels = declared_levels(column);
    let declared: BTreeSet<String> = levels.iter().cloned().collect();
    match &column.data {
        ColumnData::Numeric(values) => {
            let mut observed: Vec<f64> = values
                .iter()
                .flatten()
                .copied()
                .filter(|value| !value.is_nan())
                .collect();
            observed.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            observed.dedup();
            for value in observed {
                let key = format_numeric(value);
                if !declared.contains(&key) && !levels.contains(&key) {
                    levels.push(key);
                }
            }
        }
        ColumnData::Logical(values) => {
            for flag in [false, true] {
                let key = logical_label(flag).to_string();
                if values.contains(&Some(flag)) && !declared.contains(&key) {
                    levels.push(key);
                }
            }
        }
        ColumnData::Text(_) => {
            levels.extend(first_occurrence_levels(column, &declared));
        }
    }
    levels
}

/// Observed keys in first-occurrence order, skipping `exclude`.
pub fn first_occurrence_levels(column: &Column, exclude: &BTreeSet<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut levels = Vec::new();
    for row in 0..column.len() {
        let Some(key) = value_key(&column.data, row) else {
            continue;
        };
        if exclude.contains(&key) || !seen.insert(key.clone()) {
            continue;
        }
        levels.push(key);
    }
    levels
}

/// A column restricted to the rows of one stratum.
#[derive(Debug, Clone, Copy)]
pub struct ColumnView<'a> {
    column: &'a Column,
    rows: &'a [usize],
}

impl<'a> ColumnView<'a> {
    pub fn new(column: &'a Column, rows: &'a [usize]) -> Self {
        Self { column, rows }
    }

    pub fn column(&self) -> &'a Column {
        self.column
    }

    pub fn rows(&self) -> &'a [usize] {
        self.rows
    }

    /// Row count of the stratum, missing values included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|&&row| self.column.data.is_missing(row))
            .count()
    }

    pub fn non_missing_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Non-missing values as numbers, in row order.
    ///
    /// Logical values map to 1/0; text values that do not parse are skipped.
    pub fn numbers(&self) -> Vec<f64> {
        let data = &self.column.data;
        self.rows
            .iter()
            .filter(|&&row| !data.is_missing(row))
            .filter_map(|&row| match data {
                ColumnData::Numeric(values) => values[row],
                ColumnData::Logical(values) => values[row].map(|flag| if flag { 1.0 } else { 0.0 }),
                ColumnData::Text(values) => values[row].as_deref().and_then(parse_f64),
            })
            .collect()
    }

    /// Non-missing level keys, in row order.
    pub fn keys(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|&row| value_key(&self.column.data, row))
            .collect()
    }

    pub fn level_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for key in self.keys() {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}
