//! Configuration options for summary table construction.
//!
//! [`SummaryOptions`] is built once by the caller and passed by reference
//! through every stage; no stage mutates it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::statistic::StatisticSpec;

/// When to add a missing-count row under a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingRow {
    /// Only when the variable has at least one missing value.
    #[default]
    IfAny,
    Always,
    Never,
}

/// Layout of categorical variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalLayout {
    /// Header row followed by one row per level.
    #[default]
    Nested,
    /// Single row listing every level inline.
    Inline,
}

/// Default test for continuous columns compared across two strata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TwoSampleTest {
    #[default]
    Wilcoxon,
    WelchT,
}

/// Default test for continuous columns compared across more than two strata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiSampleTest {
    #[default]
    Kruskal,
    Anova,
}

/// What to do when a comparison test cannot run for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFailurePolicy {
    /// Leave the cell blank, record an advisory and continue.
    #[default]
    Blank,
    /// Abort the run with the test error.
    Abort,
}

/// Multiple-comparison adjustment applied across all compared columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PAdjust {
    #[default]
    None,
    Bonferroni,
    Holm,
    /// Benjamini-Hochberg false discovery rate.
    Fdr,
}

impl PAdjust {
    pub fn as_str(&self) -> &'static str {
        match self {
            PAdjust::None => "none",
            PAdjust::Bonferroni => "bonferroni",
            PAdjust::Holm => "holm",
            PAdjust::Fdr => "fdr",
        }
    }

    /// Human-readable method name for footnotes.
    pub fn description(&self) -> &'static str {
        match self {
            PAdjust::None => "no adjustment",
            PAdjust::Bonferroni => "Bonferroni correction",
            PAdjust::Holm => "Holm correction",
            PAdjust::Fdr => "Benjamini & Hochberg false discovery rate correction",
        }
    }
}

impl fmt::Display for PAdjust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PAdjust {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(PAdjust::None),
            "bonferroni" => Ok(PAdjust::Bonferroni),
            "holm" => Ok(PAdjust::Holm),
            "fdr" | "bh" => Ok(PAdjust::Fdr),
            _ => Err(format!("Unknown p-value adjustment: {s}")),
        }
    }
}

/// Options for the cross-stratum comparison column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorOptions {
    /// Add the p-value column.
    pub enabled: bool,
    /// Per-column test identifiers (built-in or registered).
    pub tests: BTreeMap<String, String>,
    pub two_sample: TwoSampleTest,
    pub multi_sample: MultiSampleTest,
    /// Categorical default switches from chi-square to Fisher's exact test
    /// when any expected cell count is below this value.
    pub fisher_min_expected: f64,
    /// Seed for randomized tests. Without a seed, permutation p-values
    /// differ between runs.
    pub seed: Option<u64>,
    /// Resamples drawn by permutation tests.
    pub permutation_replicates: usize,
    /// Tables visited by Fisher's exact enumeration before it falls back to
    /// a permutation p-value.
    pub exact_table_limit: usize,
    pub on_failure: TestFailurePolicy,
    pub p_adjust: PAdjust,
}

impl Default for ComparatorOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            tests: BTreeMap::new(),
            two_sample: TwoSampleTest::default(),
            multi_sample: MultiSampleTest::default(),
            fisher_min_expected: 5.0,
            seed: None,
            permutation_replicates: 2000,
            exact_table_limit: 1_000_000,
            on_failure: TestFailurePolicy::default(),
            p_adjust: PAdjust::default(),
        }
    }
}

/// Options controlling a summarization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// Numeric columns with fewer distinct non-missing values than this are
    /// summarized as categorical.
    pub categorical_threshold: usize,
    pub statistics: StatisticSpec,
    /// Grouping column.
    pub by: Option<String>,
    /// Columns to summarize, in order. Defaults to every column except `by`.
    pub include: Option<Vec<String>>,
    /// Add an Overall column after the strata.
    pub overall: bool,
    /// Add a column with the non-missing count per variable.
    pub n_column: bool,
    /// Add the `N = ..` header row.
    pub n_header: bool,
    pub comparator: ComparatorOptions,
    pub percent_digits: usize,
    pub continuous_digits: usize,
    /// Per-column decimal places for continuous statistics.
    pub digits: BTreeMap<String, usize>,
    /// Shown where a statistic or p-value is undefined.
    pub missing_placeholder: String,
    pub missing: MissingRow,
    pub missing_text: String,
    pub categorical_layout: CategoricalLayout,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            categorical_threshold: 10,
            statistics: StatisticSpec::default(),
            by: None,
            include: None,
            overall: false,
            n_column: false,
            n_header: false,
            comparator: ComparatorOptions::default(),
            percent_digits: 1,
            continuous_digits: 1,
            digits: BTreeMap::new(),
            missing_placeholder: String::new(),
            missing: MissingRow::default(),
            missing_text: "Unknown".to_string(),
            categorical_layout: CategoricalLayout::default(),
        }
    }
}

impl SummaryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, column: impl Into<String>) -> Self {
        self.by = Some(column.into());
        self
    }

    pub fn with_statistics(mut self, statistics: StatisticSpec) -> Self {
        self.statistics = statistics;
        self
    }

    pub fn with_overall(mut self, enable: bool) -> Self {
        self.overall = enable;
        self
    }

    pub fn with_n_column(mut self, enable: bool) -> Self {
        self.n_column = enable;
        self
    }

    pub fn with_n_header(mut self, enable: bool) -> Self {
        self.n_header = enable;
        self
    }

    pub fn with_comparator(mut self, enable: bool) -> Self {
        self.comparator.enabled = enable;
        self
    }

    pub fn with_test(mut self, column: impl Into<String>, test: impl Into<String>) -> Self {
        self.comparator.tests.insert(column.into(), test.into());
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.categorical_threshold = threshold;
        self
    }

    /// Decimal places for continuous statistics of `column`.
    pub fn digits_for(&self, column: &str) -> usize {
        self.digits
            .get(column)
            .copied()
            .unwrap_or(self.continuous_digits)
    }

    /// Layout-only view consumed by the table assembler.
    pub fn layout(&self) -> LayoutOptions {
        LayoutOptions {
            overall: self.overall && self.by.is_some(),
            n_column: self.n_column,
            n_header: self.n_header,
            comparator: self.comparator.enabled && self.by.is_some(),
            categorical_layout: self.categorical_layout,
            missing: self.missing,
            missing_text: self.missing_text.clone(),
            placeholder: self.missing_placeholder.clone(),
        }
    }
}

/// Flags that shape the assembled table; each is independent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub overall: bool,
    pub n_column: bool,
    pub n_header: bool,
    pub comparator: bool,
    pub categorical_layout: CategoricalLayout,
    pub missing: MissingRow,
    pub missing_text: String,
    pub placeholder: String,
}
