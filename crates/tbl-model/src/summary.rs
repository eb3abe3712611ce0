//! Summary cells and run advisories.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::variant::Variant;

/// One formatted statistic for a (column, stratum) pair.
///
/// `components` keeps the raw values behind `text` in template order, so a
/// renderer can re-format without recomputing. `None` marks a statistic that
/// is undefined for the stratum (for example the median of no values).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryCell {
    pub text: String,
    pub components: Vec<(String, Option<f64>)>,
}

impl SummaryCell {
    pub fn new(text: impl Into<String>, components: Vec<(String, Option<f64>)>) -> Self {
        Self {
            text: text.into(),
            components,
        }
    }

    /// Raw value of a component by its token name (`"median"`, `"n"`, ...).
    pub fn component(&self, token: &str) -> Option<f64> {
        self.components
            .iter()
            .find(|(name, _)| name == token)
            .and_then(|(_, value)| *value)
    }

    pub fn has_component(&self, token: &str) -> bool {
        self.components.iter().any(|(name, _)| name == token)
    }
}

/// Non-fatal conditions reported alongside a completed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Auto-classified numeric column with a distinct count next to the
    /// categorical threshold.
    ClassificationAmbiguity {
        column: String,
        distinct: usize,
        threshold: usize,
        variant: Variant,
    },
    /// Comparison test could not run; the p-value cell is blank.
    TestFailed {
        column: String,
        test: String,
        reason: String,
    },
}

impl Advisory {
    pub fn column(&self) -> &str {
        match self {
            Advisory::ClassificationAmbiguity { column, .. } => column,
            Advisory::TestFailed { column, .. } => column,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ClassificationAmbiguity {
                column,
                distinct,
                threshold,
                variant,
            } => write!(
                f,
                "column '{column}' has {distinct} distinct values (threshold {threshold}); summarized as {variant}"
            ),
            Advisory::TestFailed {
                column,
                test,
                reason,
            } => write!(f, "{test} skipped for column '{column}': {reason}"),
        }
    }
}
