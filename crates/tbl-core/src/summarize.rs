//! Summarization driver.
//!
//! A run has two phases. The planning phase classifies every column and
//! validates every statistic expression and test override; any
//! [`SpecError`] stops the run before a statistic is computed. The compute
//! phase evaluates each column per stratum, runs the comparator and hands
//! the results to the table assembler. Either a complete
//! [`SummaryReport`] or an error is returned.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use tbl_model::{
    Advisory, Column, ColumnData, Dataset, MissingRow, Result, SpecError, SummaryError,
    SummaryOptions, TableModel, TestFailurePolicy, Variant,
};

use crate::adjust::adjust_p_values;
use crate::assemble::{AssemblyInput, VariableSummary, assemble};
use crate::classify::classify;
use crate::compare::{ComparisonTest, StratumSample, TestInput, TestRegistry, compare};
use crate::evaluate::{ColumnPlan, EvalContext, evaluate, missing_cell};
use crate::functions::{StatFunctionRegistry, StatisticFunction};
use crate::stratify::{Strata, stratify};
use crate::template::StatTemplate;
use crate::view::{ColumnView, ordered_levels, value_key};

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub table: TableModel,
    pub advisories: Vec<Advisory>,
    /// Variant chosen for each summarized column, in table order.
    pub variants: Vec<(String, Variant)>,
}

impl SummaryReport {
    pub fn variant_of(&self, column: &str) -> Option<Variant> {
        self.variants
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, variant)| *variant)
    }
}

/// Summarization entry point holding the extension registries.
///
/// # Example
///
/// ```
/// use tbl_core::Summarizer;
/// use tbl_model::{Column, Dataset, StatisticSpec, SummaryOptions};
///
/// let dataset = Dataset::new(vec![Column::numeric(
///     "age",
///     (20..40).map(|age| Some(f64::from(age))).collect(),
/// )])
/// .unwrap();
/// let options = SummaryOptions::new()
///     .with_statistics(StatisticSpec::default().with_column("age", "{range}"));
/// let report = Summarizer::new()
///     .with_function("range", |values: &[f64]| {
///         let min = values.iter().copied().reduce(f64::min)?;
///         let max = values.iter().copied().reduce(f64::max)?;
///         Some(max - min)
///     })
///     .summarize(&dataset, &options)
///     .unwrap();
/// assert_eq!(report.table.rows[0].cells, vec!["19.0"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    functions: StatFunctionRegistry,
    tests: TestRegistry,
}

impl Summarizer {
    /// Creates a summarizer with the built-in tests and no statistic functions.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_function(
        mut self,
        name: impl Into<String>,
        function: impl StatisticFunction + 'static,
    ) -> Self {
        self.functions.register(name, function);
        self
    }

    pub fn with_test(mut self, name: impl Into<String>, test: impl ComparisonTest + 'static) -> Self {
        self.tests.register(name, test);
        self
    }

    pub fn functions(&self) -> &StatFunctionRegistry {
        &self.functions
    }

    pub fn tests(&self) -> &TestRegistry {
        &self.tests
    }

    /// Builds the summary table of `dataset`.
    ///
    /// # Errors
    ///
    /// - [`SummaryError::Spec`] for any configuration mistake
    /// - [`SummaryError::UnknownColumn`] for an unknown grouping column
    /// - [`SummaryError::Test`] when a test fails under
    ///   [`TestFailurePolicy::Abort`]
    pub fn summarize(&self, dataset: &Dataset, options: &SummaryOptions) -> Result<SummaryReport> {
        let span = info_span!(
            "summarize",
            rows = dataset.row_count(),
            columns = dataset.columns().len(),
            by = options.by.as_deref().unwrap_or("-")
        );
        let _guard = span.enter();

        check_column_settings(dataset, options)?;
        let strata = stratify(dataset, options.by.as_deref(), options.overall)?;
        let comparing = options.comparator.enabled && strata.is_grouped();
        let group = strata.by.clone().unwrap_or_default();

        // Planning: every SpecError surfaces here.
        let mut advisories = Vec::new();
        let mut planned = Vec::new();
        for column in selected_columns(dataset, options)? {
            let classification = classify(column, options.categorical_threshold);
            if classification.ambiguous {
                warn!(
                    column = %column.name(),
                    distinct = classification.distinct,
                    threshold = options.categorical_threshold,
                    variant = %classification.variant,
                    "classification near threshold"
                );
                advisories.push(Advisory::ClassificationAmbiguity {
                    column: column.name().to_string(),
                    distinct: classification.distinct,
                    threshold: options.categorical_threshold,
                    variant: classification.variant,
                });
            }
            let variant = classification.variant;
            let expression = options.statistics.resolve(column.name(), variant);
            let template = StatTemplate::parse(expression)?;
            template.validate(variant, column.name(), &self.functions)?;
            let plan = ColumnPlan::new(column, variant, template, options.digits_for(column.name()))?;
            let test_name = options.comparator.tests.get(column.name()).map(String::as_str);
            if comparing
                && let Some(name) = test_name
                && !self.tests.contains(name)
            {
                return Err(SpecError::UnknownTest {
                    name: name.to_string(),
                    column: column.name().to_string(),
                }
                .into());
            }
            planned.push((column, plan, test_name));
        }

        // Compute.
        let ctx = EvalContext {
            functions: &self.functions,
            percent_digits: options.percent_digits,
            placeholder: &options.missing_placeholder,
        };
        let mut variables = Vec::with_capacity(planned.len());
        for (column, plan, test_name) in &planned {
            let mut cells = Vec::new();
            let mut missing = Vec::new();
            for stratum in strata.iter() {
                let view = ColumnView::new(column, &stratum.rows);
                cells.push(evaluate(&view, plan, &ctx)?);
                missing.push(missing_cell(&view));
            }
            let missing_total = column.missing_count();
            debug!(
                column = %column.name(),
                variant = %plan.variant,
                strata = cells.len(),
                missing = missing_total,
                "evaluated column"
            );

            let mut summary = VariableSummary {
                name: column.name().to_string(),
                label: column.meta.display_label().to_string(),
                variant: plan.variant,
                cells,
                missing,
                missing_total,
                n: column.len() - missing_total,
                legend: plan.template.legend(),
                test: None,
                p_value: None,
            };
            if comparing {
                self.run_comparison(
                    &mut summary,
                    &mut advisories,
                    column,
                    plan,
                    *test_name,
                    &strata,
                    &group,
                    options,
                )?;
            }
            variables.push(summary);
        }

        let compared: Vec<usize> = (0..variables.len())
            .filter(|&index| variables[index].p_value.is_some())
            .collect();
        let raw: Vec<f64> = compared
            .iter()
            .filter_map(|&index| variables[index].p_value)
            .collect();
        let adjusted = adjust_p_values(&raw, options.comparator.p_adjust);
        for (&index, p_value) in compared.iter().zip(adjusted) {
            variables[index].p_value = Some(p_value);
        }

        let report = SummaryReport {
            variants: variables
                .iter()
                .map(|variable| (variable.name.clone(), variable.variant))
                .collect(),
            table: assemble(
                AssemblyInput {
                    strata: &strata,
                    variables,
                    p_adjust: options.comparator.p_adjust,
                },
                &options.layout(),
            ),
            advisories,
        };
        info!(
            variables = report.variants.len(),
            rows = report.table.rows.len(),
            advisories = report.advisories.len(),
            "summary complete"
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_comparison(
        &self,
        summary: &mut VariableSummary,
        advisories: &mut Vec<Advisory>,
        column: &Column,
        plan: &ColumnPlan,
        test_name: Option<&str>,
        strata: &Strata,
        group: &str,
        options: &SummaryOptions,
    ) -> Result<()> {
        let samples = stratum_samples(column, strata);
        let levels = if plan.variant.is_count_based() {
            ordered_levels(column)
        } else {
            Vec::new()
        };
        let input = TestInput {
            column: column.name(),
            group,
            variant: plan.variant,
            samples: &samples,
            levels: &levels,
            options: &options.comparator,
        };
        let test: Arc<dyn ComparisonTest> = self.tests.select(&input, test_name)?;
        match compare(test.as_ref(), &input) {
            Ok(comparison) => {
                debug!(
                    column = %column.name(),
                    test = %comparison.test,
                    p_value = comparison.p_value,
                    "comparison complete"
                );
                summary.test = Some(comparison.test);
                summary.p_value = Some(comparison.p_value);
            }
            Err(source) => {
                let test = test.description();
                if options.comparator.on_failure == TestFailurePolicy::Abort {
                    return Err(SummaryError::Test {
                        column: column.name().to_string(),
                        source,
                    });
                }
                warn!(
                    column = %column.name(),
                    test = %test,
                    error = %source,
                    "comparison failed, leaving p-value blank"
                );
                advisories.push(Advisory::TestFailed {
                    column: column.name().to_string(),
                    test: test.clone(),
                    reason: source.to_string(),
                });
                summary.test = Some(test);
            }
        }
        Ok(())
    }
}

/// Builds the summary table of `dataset` with the built-in tests and no
/// statistic functions.
pub fn summarize(dataset: &Dataset, options: &SummaryOptions) -> Result<SummaryReport> {
    Summarizer::new().summarize(dataset, options)
}

/// Columns to summarize: `include` in its order, else every column; the
/// grouping column is never summarized.
fn selected_columns<'a>(dataset: &'a Dataset, options: &SummaryOptions) -> Result<Vec<&'a Column>> {
    let by = options.by.as_deref();
    match &options.include {
        Some(names) => names
            .iter()
            .filter(|name| Some(name.as_str()) != by)
            .map(|name| {
                dataset.column(name).ok_or_else(|| {
                    SummaryError::from(SpecError::UnknownColumn {
                        setting: "include".to_string(),
                        column: name.clone(),
                    })
                })
            })
            .collect(),
        None => Ok(dataset
            .columns()
            .iter()
            .filter(|column| Some(column.name()) != by)
            .collect()),
    }
}

/// Per-column settings must name dataset columns.
fn check_column_settings(dataset: &Dataset, options: &SummaryOptions) -> Result<()> {
    if options.missing != MissingRow::Never && options.missing_text.trim().is_empty() {
        return Err(SpecError::InvalidOption {
            option: "missing_text".to_string(),
            reason: "missing rows need a non-empty label".to_string(),
        }
        .into());
    }
    let settings = [
        ("statistic", options.statistics.columns.keys().collect::<BTreeSet<_>>()),
        ("digits", options.digits.keys().collect()),
        ("test", options.comparator.tests.keys().collect()),
    ];
    for (setting, columns) in settings {
        if let Some(column) = columns.into_iter().find(|column| !dataset.contains(column)) {
            return Err(SpecError::UnknownColumn {
                setting: setting.to_string(),
                column: column.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Non-missing values of `column` in each level stratum.
fn stratum_samples(column: &Column, strata: &Strata) -> Vec<StratumSample> {
    let numeric = !matches!(column.data, ColumnData::Text(_));
    strata
        .groups
        .iter()
        .map(|stratum| {
            let view = ColumnView::new(column, &stratum.rows);
            StratumSample {
                label: stratum.label.clone(),
                numbers: numeric.then(|| view.numbers()),
                keys: stratum
                    .rows
                    .iter()
                    .filter_map(|&row| value_key(&column.data, row))
                    .collect(),
            }
        })
        .collect()
}
