//! Summary variants and declared column kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a column is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// One row per level with counts and percentages.
    Categorical,
    /// One row with distribution statistics.
    Continuous,
    /// One row with the count of a single level.
    Dichotomous,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Categorical => "categorical",
            Variant::Continuous => "continuous",
            Variant::Dichotomous => "dichotomous",
        }
    }

    /// Categorical and dichotomous columns are summarized from level counts.
    pub fn is_count_based(&self) -> bool {
        matches!(self, Variant::Categorical | Variant::Dichotomous)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind declared by the caller for a column.
///
/// `Auto` leaves the decision to the classifier; every other value wins
/// over the classifier's rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    #[default]
    Auto,
    Categorical,
    Continuous,
    /// Dichotomous on `level`; when absent the level is inferred
    /// (`TRUE` for logical columns, `1` for numeric, `yes` for text).
    Dichotomous { level: Option<String> },
}

impl FromStr for DeclaredKind {
    type Err = String;

    /// Parses `auto`, `categorical`, `continuous`, `dichotomous` or
    /// `dichotomous:<level>` (case-insensitive kind name).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (kind, level) = match trimmed.split_once(':') {
            Some((kind, level)) => (kind, Some(level.trim().to_string())),
            None => (trimmed, None),
        };
        match kind.to_lowercase().as_str() {
            "auto" if level.is_none() => Ok(DeclaredKind::Auto),
            "categorical" if level.is_none() => Ok(DeclaredKind::Categorical),
            "continuous" if level.is_none() => Ok(DeclaredKind::Continuous),
            "dichotomous" => Ok(DeclaredKind::Dichotomous {
                level: level.filter(|value| !value.is_empty()),
            }),
            _ => Err(format!("Unknown column kind: {s}")),
        }
    }
}
