pub mod adjust;
pub mod assemble;
pub mod classify;
pub mod compare;
pub mod descriptive;
pub mod evaluate;
pub mod functions;
pub mod stratify;
pub mod summarize;
pub mod template;
pub mod view;

pub use adjust::adjust_p_values;
pub use assemble::{AssemblyInput, VariableSummary, assemble};
pub use classify::{Classification, classify};
pub use compare::{
    BuiltinTest, Comparison, ComparisonTest, Contingency, FnTest, StratumSample, TestInput,
    TestOutcome, TestRegistry, compare,
};
pub use evaluate::{
    ColumnPlan, EvalContext, Evaluation, LevelCell, dichotomous_level, evaluate, missing_cell,
};
pub use functions::{StatFunctionRegistry, StatisticFunction};
pub use stratify::{OVERALL_LABEL, Strata, Stratum, StratumKind, stratify};
pub use summarize::{SummaryReport, Summarizer, summarize};
pub use template::{Piece, StatTemplate, StatToken};
pub use view::{ColumnView, distinct_count, ordered_levels, value_key};
