//! CLI argument definitions for the summary table builder.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "tbl-summary",
    version,
    about = "Descriptive summary tables (\"Table 1\") from CSV data",
    long_about = "Summarize every column of a CSV file, optionally stratified by a grouping column.\n\n\
                  Continuous columns get median and quartiles, categorical columns counts and\n\
                  percentages. Strata can be compared with rank, parametric and exact tests."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build a summary table from a CSV file.
    Summarize(SummarizeArgs),

    /// List the available comparison tests.
    Tests,
}

#[derive(Parser, Debug, Default)]
pub struct SummarizeArgs {
    /// CSV file with one header row.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// JSON sidecar with column labels, kinds and level order.
    #[arg(long = "metadata", value_name = "PATH")]
    pub metadata: Option<PathBuf>,

    /// JSON file with summary options; flags override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Grouping column; one table column per level.
    #[arg(long = "by", value_name = "COLUMN")]
    pub by: Option<String>,

    /// Columns to summarize, in order (default: all but the grouping column).
    #[arg(long = "include", value_name = "COLUMN", value_delimiter = ',')]
    pub include: Vec<String>,

    /// Add an Overall column.
    #[arg(long = "overall")]
    pub overall: bool,

    /// Add a column with the non-missing count of each variable.
    #[arg(long = "add-n")]
    pub add_n: bool,

    /// Add the number of rows of each stratum to the header.
    #[arg(long = "n-header")]
    pub n_header: bool,

    /// Compare strata and add a p-value column.
    #[arg(long = "add-p")]
    pub add_p: bool,

    /// Test for one column, e.g. `--test age=welch-t`.
    #[arg(long = "test", value_name = "COLUMN=TEST")]
    pub tests: Vec<String>,

    /// Statistic expression for one column, e.g. `--stat age="{mean} ({sd})"`.
    #[arg(long = "stat", value_name = "COLUMN=EXPRESSION")]
    pub stats: Vec<String>,

    /// Statistic expression for every continuous column.
    #[arg(long = "continuous-stat", value_name = "EXPRESSION")]
    pub continuous_stat: Option<String>,

    /// Statistic expression for every categorical and dichotomous column.
    #[arg(long = "categorical-stat", value_name = "EXPRESSION")]
    pub categorical_stat: Option<String>,

    /// Display label for one column.
    #[arg(long = "label", value_name = "COLUMN=LABEL")]
    pub labels: Vec<String>,

    /// Declared kind for one column: auto, categorical, continuous,
    /// dichotomous or dichotomous:<level>.
    #[arg(long = "type", value_name = "COLUMN=KIND")]
    pub kinds: Vec<String>,

    /// Level order for one column, e.g. `--levels arm=placebo,low,high`.
    #[arg(long = "levels", value_name = "COLUMN=LEVEL,...")]
    pub levels: Vec<String>,

    /// Numeric columns with fewer distinct values are categorical.
    #[arg(long = "threshold", value_name = "N")]
    pub threshold: Option<usize>,

    /// Decimal places of percentages.
    #[arg(long = "percent-digits", value_name = "N")]
    pub percent_digits: Option<usize>,

    /// Decimal places of continuous statistics.
    #[arg(long = "digits", value_name = "N")]
    pub digits: Option<usize>,

    /// Decimal places for one column, e.g. `--column-digits age=0`.
    #[arg(long = "column-digits", value_name = "COLUMN=N")]
    pub column_digits: Vec<String>,

    /// When to add a missing-count row.
    #[arg(long = "missing", value_enum)]
    pub missing: Option<MissingArg>,

    /// Label of the missing-count row.
    #[arg(long = "missing-text", value_name = "TEXT")]
    pub missing_text: Option<String>,

    /// Text shown for undefined statistics.
    #[arg(long = "placeholder", value_name = "TEXT")]
    pub placeholder: Option<String>,

    /// List categorical levels on one row instead of one row per level.
    #[arg(long = "inline-levels")]
    pub inline_levels: bool,

    /// Default test for continuous columns with two strata.
    #[arg(long = "two-sample", value_enum)]
    pub two_sample: Option<TwoSampleArg>,

    /// Default test for continuous columns with more than two strata.
    #[arg(long = "multi-sample", value_enum)]
    pub multi_sample: Option<MultiSampleArg>,

    /// Multiple-comparison adjustment of the p-values.
    #[arg(long = "p-adjust", value_enum)]
    pub p_adjust: Option<PAdjustArg>,

    /// Seed for permutation tests.
    #[arg(long = "seed", value_name = "N")]
    pub seed: Option<u64>,

    /// What to do when a test cannot run for a column.
    #[arg(long = "on-test-failure", value_enum)]
    pub on_test_failure: Option<TestFailureArg>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MissingArg {
    IfAny,
    Always,
    Never,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TwoSampleArg {
    Wilcoxon,
    WelchT,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MultiSampleArg {
    Kruskal,
    Anova,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PAdjustArg {
    None,
    Bonferroni,
    Holm,
    Fdr,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TestFailureArg {
    Blank,
    Abort,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// Box-drawn table for the terminal.
    #[default]
    Text,
    /// Pipe table.
    Markdown,
    /// Report as JSON.
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
