//! Statistic expression configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::variant::Variant;

/// Default expression for continuous columns.
pub const DEFAULT_CONTINUOUS_STAT: &str = "{median} ({p25}, {p75})";

/// Default expression for categorical and dichotomous columns.
pub const DEFAULT_CATEGORICAL_STAT: &str = "{n} ({p}%)";

/// Which statistic expression applies to which column.
///
/// Resolution order: per-column entry, then the wildcard for the column's
/// variant, then the variant default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticSpec {
    pub columns: BTreeMap<String, String>,
    pub all_categorical: Option<String>,
    pub all_continuous: Option<String>,
}

impl StatisticSpec {
    pub fn with_column(mut self, column: impl Into<String>, expression: impl Into<String>) -> Self {
        self.columns.insert(column.into(), expression.into());
        self
    }

    pub fn with_all_categorical(mut self, expression: impl Into<String>) -> Self {
        self.all_categorical = Some(expression.into());
        self
    }

    pub fn with_all_continuous(mut self, expression: impl Into<String>) -> Self {
        self.all_continuous = Some(expression.into());
        self
    }

    pub fn resolve(&self, column: &str, variant: Variant) -> &str {
        if let Some(expression) = self.columns.get(column) {
            return expression;
        }
        match variant {
            Variant::Continuous => self
                .all_continuous
                .as_deref()
                .unwrap_or(DEFAULT_CONTINUOUS_STAT),
            Variant::Categorical | Variant::Dichotomous => self
                .all_categorical
                .as_deref()
                .unwrap_or(DEFAULT_CATEGORICAL_STAT),
        }
    }
}
