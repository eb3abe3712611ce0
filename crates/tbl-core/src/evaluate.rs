//! Statistic evaluation for one column within one stratum.

use std::collections::BTreeMap;

use tbl_common::{format_fixed, format_numeric, logical_label, parse_bool, parse_f64};
use tbl_model::{Column, ColumnData, DeclaredKind, SpecError, SummaryCell, Variant};

use crate::descriptive;
use crate::functions::StatFunctionRegistry;
use crate::template::{StatTemplate, StatToken};
use crate::view::{ColumnView, ordered_levels};

/// Everything needed to evaluate one column, resolved once per run.
#[derive(Debug, Clone)]
pub struct ColumnPlan {
    pub variant: Variant,
    pub template: StatTemplate,
    /// Categorical levels in display order.
    pub levels: Vec<String>,
    /// Level counted by a dichotomous row.
    pub dichotomous_level: Option<String>,
    /// Decimal places for continuous statistics.
    pub digits: usize,
}

impl ColumnPlan {
    /// Resolves levels and the dichotomous level for `column`.
    pub fn new(
        column: &Column,
        variant: Variant,
        template: StatTemplate,
        digits: usize,
    ) -> Result<Self, SpecError> {
        if variant == Variant::Continuous && matches!(column.data, ColumnData::Text(_)) {
            return Err(SpecError::ContinuousNonNumeric {
                column: column.name().to_string(),
            });
        }
        let levels = match variant {
            Variant::Categorical => ordered_levels(column),
            Variant::Continuous | Variant::Dichotomous => Vec::new(),
        };
        let dichotomous_level = match variant {
            Variant::Dichotomous => Some(dichotomous_level(column)?),
            Variant::Categorical | Variant::Continuous => None,
        };
        Ok(Self {
            variant,
            template,
            levels,
            dichotomous_level,
            digits,
        })
    }
}

/// Level counted by a dichotomous summary of `column`.
///
/// A declared level wins and must be able to match a value of the column:
/// a number for numeric columns, `TRUE`/`FALSE` or `1`/`0` for logical
/// ones. Otherwise logical columns use `TRUE`, numeric
/// columns `1` and text columns a `yes` level in any letter case.
pub fn dichotomous_level(column: &Column) -> Result<String, SpecError> {
    if let DeclaredKind::Dichotomous { level: Some(level) } = &column.meta.kind {
        let key = match column.data {
            ColumnData::Numeric(_) => parse_f64(level).map(format_numeric),
            ColumnData::Logical(_) => parse_bool(level)
                .or_else(|| match parse_f64(level) {
                    Some(value) if value == 1.0 => Some(true),
                    Some(value) if value == 0.0 => Some(false),
                    _ => None,
                })
                .map(|flag| logical_label(flag).to_string()),
            ColumnData::Text(_) => (!level.trim().is_empty()).then(|| level.clone()),
        };
        return key.ok_or_else(|| SpecError::DichotomousLevel {
            column: column.name().to_string(),
        });
    }
    match column.data {
        ColumnData::Logical(_) => Ok("TRUE".to_string()),
        ColumnData::Numeric(_) => Ok("1".to_string()),
        ColumnData::Text(_) => ordered_levels(column)
            .into_iter()
            .find(|level| level.eq_ignore_ascii_case("yes"))
            .ok_or_else(|| SpecError::DichotomousLevel {
                column: column.name().to_string(),
            }),
    }
}

/// Shared evaluation settings.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub functions: &'a StatFunctionRegistry,
    pub percent_digits: usize,
    /// Shown for undefined statistics.
    pub placeholder: &'a str,
}

/// Cell of one categorical level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCell {
    pub level: String,
    pub cell: SummaryCell,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Continuous and dichotomous columns.
    Single(SummaryCell),
    /// Categorical columns, one cell per level in plan order.
    PerLevel(Vec<LevelCell>),
}

impl Evaluation {
    pub fn single(&self) -> Option<&SummaryCell> {
        match self {
            Evaluation::Single(cell) => Some(cell),
            Evaluation::PerLevel(_) => None,
        }
    }

    pub fn levels(&self) -> &[LevelCell] {
        match self {
            Evaluation::Single(_) => &[],
            Evaluation::PerLevel(levels) => levels,
        }
    }

    pub fn level(&self, level: &str) -> Option<&SummaryCell> {
        self.levels()
            .iter()
            .find(|entry| entry.level == level)
            .map(|entry| &entry.cell)
    }
}

/// Missingness counts of a stratum, shared by every variant.
#[derive(Debug, Clone, Copy)]
struct Missingness {
    observed: usize,
    missing: usize,
}

impl Missingness {
    fn of(view: &ColumnView<'_>) -> Self {
        Self {
            observed: view.len(),
            missing: view.missing_count(),
        }
    }

    fn value(self, token: &StatToken) -> Option<f64> {
        let non_missing = self.observed - self.missing;
        match token {
            StatToken::NObs => Some(self.observed as f64),
            StatToken::NMiss => Some(self.missing as f64),
            StatToken::NNonmiss => Some(non_missing as f64),
            StatToken::PMiss => percent(self.missing, self.observed),
            StatToken::PNonmiss => percent(non_missing, self.observed),
            _ => None,
        }
    }
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Evaluates the plan's expression over the rows of `view`.
///
/// Missing values are excluded from every statistic and only counted by the
/// missingness tokens. Undefined statistics render as the placeholder.
pub fn evaluate(
    view: &ColumnView<'_>,
    plan: &ColumnPlan,
    ctx: &EvalContext<'_>,
) -> Result<Evaluation, SpecError> {
    let missingness = Missingness::of(view);
    match plan.variant {
        Variant::Continuous => {
            let values = view.numbers();
            let sorted = descriptive::sorted(&values);
            let mut resolved = Vec::new();
            for token in plan.template.tokens() {
                let value = match token {
                    StatToken::Median => descriptive::median(&sorted),
                    StatToken::Mean => descriptive::mean(&values),
                    StatToken::Sd => descriptive::std_dev(&values),
                    StatToken::Var => descriptive::variance(&values),
                    StatToken::Min => descriptive::min(&values),
                    StatToken::Max => descriptive::max(&values),
                    StatToken::Percentile(q) => descriptive::percentile(&sorted, f64::from(*q) / 100.0),
                    StatToken::Function(name) => {
                        let function = ctx.functions.get(name).ok_or_else(|| SpecError::UnknownToken {
                            token: name.clone(),
                            template: plan.template.source().to_string(),
                        })?;
                        if values.is_empty() {
                            None
                        } else {
                            function.compute(&values).filter(|value| value.is_finite())
                        }
                    }
                    other => missingness.value(other),
                };
                resolved.push((token.name(), value));
            }
            Ok(Evaluation::Single(build_cell(plan, ctx, resolved)))
        }
        Variant::Dichotomous => {
            let counts = view.level_counts();
            let level = plan.dichotomous_level.as_deref().unwrap_or("TRUE");
            Ok(Evaluation::Single(level_cell(plan, ctx, &counts, level, missingness)))
        }
        Variant::Categorical => {
            let counts = view.level_counts();
            let cells = plan
                .levels
                .iter()
                .map(|level| LevelCell {
                    level: level.clone(),
                    cell: level_cell(plan, ctx, &counts, level, missingness),
                })
                .collect();
            Ok(Evaluation::PerLevel(cells))
        }
    }
}

fn level_cell(
    plan: &ColumnPlan,
    ctx: &EvalContext<'_>,
    counts: &BTreeMap<String, usize>,
    level: &str,
    missingness: Missingness,
) -> SummaryCell {
    let total = missingness.observed - missingness.missing;
    let count = counts.get(level).copied().unwrap_or(0);
    let resolved = plan
        .template
        .tokens()
        .map(|token| {
            let value = match token {
                StatToken::Count => Some(count as f64),
                StatToken::Total => Some(total as f64),
                StatToken::Percent => percent(count, total),
                other => missingness.value(other),
            };
            (token.name(), value)
        })
        .collect();
    build_cell(plan, ctx, resolved)
}

fn build_cell(
    plan: &ColumnPlan,
    ctx: &EvalContext<'_>,
    resolved: Vec<(String, Option<f64>)>,
) -> SummaryCell {
    let mut values = resolved.iter();
    let text = plan.template.render(|token| {
        let value = values.next().and_then(|(_, value)| *value);
        format_value(token, value, plan.digits, ctx)
    });
    SummaryCell::new(text, resolved)
}

fn format_value(token: &StatToken, value: Option<f64>, digits: usize, ctx: &EvalContext<'_>) -> String {
    match value {
        None => ctx.placeholder.to_string(),
        Some(value) if token.is_count() => format!("{}", value.round() as i64),
        Some(value) if token.is_percent() => format_fixed(value, ctx.percent_digits),
        Some(value) => format_fixed(value, digits),
    }
}

/// Cell of the missing-count row: `N_miss` of the stratum.
pub fn missing_cell(view: &ColumnView<'_>) -> SummaryCell {
    let missing = view.missing_count();
    SummaryCell::new(
        missing.to_string(),
        vec![("N_miss".to_string(), Some(missing as f64))],
    )
}
