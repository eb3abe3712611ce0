//! Error taxonomy for summary table construction.

use thiserror::Error;

use crate::variant::Variant;

/// Caller configuration mistakes. Any of these halts the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Template text could not be tokenized.
    #[error("malformed statistic expression '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// Placeholder names neither a built-in statistic nor a registered function.
    #[error("unknown statistic '{token}' in '{template}'")]
    UnknownToken { token: String, template: String },

    /// Built-in statistic used with a column variant that cannot produce it.
    #[error("statistic '{token}' is not available for {variant} column '{column}'")]
    TokenNotApplicable {
        token: String,
        variant: Variant,
        column: String,
    },

    /// `p<NN>` with NN above 100.
    #[error("percentile '{token}' is outside 0..=100")]
    PercentileRange { token: String },

    /// Per-column setting refers to a column that is not in the dataset.
    #[error("{setting} configured for unknown column '{column}'")]
    UnknownColumn { setting: String, column: String },

    /// Test override names neither a built-in nor a registered test.
    #[error("unknown comparison test '{name}' for column '{column}'")]
    UnknownTest { name: String, column: String },

    /// Continuous summary requested on a text column.
    #[error("column '{column}' holds text and cannot be summarized as continuous")]
    ContinuousNonNumeric { column: String },

    /// Option value that cannot produce a valid table.
    #[error("invalid option '{option}': {reason}")]
    InvalidOption { option: String, reason: String },

    /// No level could be chosen for a dichotomous row.
    #[error("cannot determine the dichotomous level for column '{column}'")]
    DichotomousLevel { column: String },
}

/// A comparison test could not produce a result for one column.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TestError {
    #[error("at least 2 non-empty strata are required, found {found}")]
    InsufficientStrata { found: usize },

    #[error("each stratum needs at least {required} observations")]
    InsufficientObservations { required: usize },

    #[error("zero variance: test statistic is undefined")]
    ZeroVariance,

    #[error("degenerate contingency table: {reason}")]
    DegenerateTable { reason: String },

    #[error("{test} requires numeric data")]
    NonNumeric { test: String },

    #[error("{test} requires categorical data")]
    NonCategorical { test: String },

    #[error("distribution error: {reason}")]
    Distribution { reason: String },

    #[error("{0}")]
    Failed(String),
}

/// Dataset construction invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },
}

/// Errors returned by a summarization run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("comparison failed for column '{column}': {source}")]
    Test {
        column: String,
        #[source]
        source: TestError,
    },

    #[error("column '{column}' not found in dataset")]
    UnknownColumn { column: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

pub type Result<T> = std::result::Result<T, SummaryError>;
