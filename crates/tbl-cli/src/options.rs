//! Summary options and column overrides from CLI flags.
//!
//! Precedence: flags, then the `--config` file, then built-in defaults.
//! Column overrides (`--label`, `--type`, `--levels`) are applied after the
//! metadata sidecar.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tbl_model::{
    CategoricalLayout, Dataset, DeclaredKind, MissingRow, MultiSampleTest, PAdjust, SummaryOptions,
    TestFailurePolicy, TwoSampleTest,
};

use crate::cli::{MissingArg, MultiSampleArg, PAdjustArg, SummarizeArgs, TestFailureArg, TwoSampleArg};

/// Splits a `COLUMN=VALUE` flag value.
pub fn parse_assignment(raw: &str, flag: &str) -> Result<(String, String)> {
    let (column, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--{flag} expects COLUMN=VALUE, got '{raw}'"))?;
    let column = column.trim();
    if column.is_empty() {
        bail!("--{flag} expects COLUMN=VALUE, got '{raw}'");
    }
    Ok((column.to_string(), value.to_string()))
}

/// Reads a JSON options file; missing fields keep their defaults.
pub fn load_config(path: &Path) -> Result<SummaryOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
}

/// Builds the run options from the config file and flags.
pub fn build_options(args: &SummarizeArgs) -> Result<SummaryOptions> {
    let mut options = match &args.config {
        Some(path) => load_config(path)?,
        None => SummaryOptions::default(),
    };

    if let Some(by) = &args.by {
        options.by = Some(by.clone());
    }
    if !args.include.is_empty() {
        options.include = Some(args.include.clone());
    }
    options.overall |= args.overall;
    options.n_column |= args.add_n;
    options.n_header |= args.n_header;
    options.comparator.enabled |= args.add_p;
    if args.inline_levels {
        options.categorical_layout = CategoricalLayout::Inline;
    }

    for raw in &args.tests {
        let (column, test) = parse_assignment(raw, "test")?;
        options.comparator.tests.insert(column, test.trim().to_string());
    }
    for raw in &args.stats {
        let (column, expression) = parse_assignment(raw, "stat")?;
        options.statistics.columns.insert(column, expression);
    }
    if let Some(expression) = &args.continuous_stat {
        options.statistics.all_continuous = Some(expression.clone());
    }
    if let Some(expression) = &args.categorical_stat {
        options.statistics.all_categorical = Some(expression.clone());
    }

    if let Some(threshold) = args.threshold {
        options.categorical_threshold = threshold;
    }
    if let Some(digits) = args.percent_digits {
        options.percent_digits = digits;
    }
    if let Some(digits) = args.digits {
        options.continuous_digits = digits;
    }
    for raw in &args.column_digits {
        let (column, digits) = parse_assignment(raw, "column-digits")?;
        let digits = digits
            .trim()
            .parse::<usize>()
            .with_context(|| format!("--column-digits value for '{column}'"))?;
        options.digits.insert(column, digits);
    }

    if let Some(missing) = args.missing {
        options.missing = match missing {
            MissingArg::IfAny => MissingRow::IfAny,
            MissingArg::Always => MissingRow::Always,
            MissingArg::Never => MissingRow::Never,
        };
    }
    if let Some(text) = &args.missing_text {
        options.missing_text = text.clone();
    }
    if let Some(text) = &args.placeholder {
        options.missing_placeholder = text.clone();
    }

    if let Some(test) = args.two_sample {
        options.comparator.two_sample = match test {
            TwoSampleArg::Wilcoxon => TwoSampleTest::Wilcoxon,
            TwoSampleArg::WelchT => TwoSampleTest::WelchT,
        };
    }
    if let Some(test) = args.multi_sample {
        options.comparator.multi_sample = match test {
            MultiSampleArg::Kruskal => MultiSampleTest::Kruskal,
            MultiSampleArg::Anova => MultiSampleTest::Anova,
        };
    }
    if let Some(method) = args.p_adjust {
        options.comparator.p_adjust = match method {
            PAdjustArg::None => PAdjust::None,
            PAdjustArg::Bonferroni => PAdjust::Bonferroni,
            PAdjustArg::Holm => PAdjust::Holm,
            PAdjustArg::Fdr => PAdjust::Fdr,
        };
    }
    if let Some(seed) = args.seed {
        options.comparator.seed = Some(seed);
    }
    if let Some(policy) = args.on_test_failure {
        options.comparator.on_failure = match policy {
            TestFailureArg::Blank => TestFailurePolicy::Blank,
            TestFailureArg::Abort => TestFailurePolicy::Abort,
        };
    }

    Ok(options)
}

/// Applies `--label`, `--type` and `--levels` to the dataset.
pub fn apply_column_overrides(dataset: &mut Dataset, args: &SummarizeArgs) -> Result<()> {
    for raw in &args.labels {
        let (column, label) = parse_assignment(raw, "label")?;
        column_meta(dataset, &column, "label")?.label = Some(label);
    }
    for raw in &args.kinds {
        let (column, kind) = parse_assignment(raw, "type")?;
        let kind = kind
            .parse::<DeclaredKind>()
            .map_err(|reason| anyhow!("--type for '{column}': {reason}"))?;
        column_meta(dataset, &column, "type")?.kind = kind;
    }
    for raw in &args.levels {
        let (column, levels) = parse_assignment(raw, "levels")?;
        let levels = levels
            .split(',')
            .map(str::trim)
            .filter(|level| !level.is_empty())
            .map(str::to_string)
            .collect();
        column_meta(dataset, &column, "levels")?.levels = Some(levels);
    }
    Ok(())
}

fn column_meta<'a>(
    dataset: &'a mut Dataset,
    column: &str,
    flag: &str,
) -> Result<&'a mut tbl_model::ColumnMeta> {
    dataset
        .meta_mut(column)
        .ok_or_else(|| anyhow!("--{flag} names unknown column '{column}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbl_model::Column;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("age={mean} ({sd})", "stat").unwrap(),
            ("age".to_string(), "{mean} ({sd})".to_string())
        );
        assert_eq!(
            parse_assignment("a=b=c", "label").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_assignment("age", "test").is_err());
        assert!(parse_assignment("=x", "test").is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = SummarizeArgs {
            by: Some("am".to_string()),
            include: vec!["mpg".to_string(), "cyl".to_string()],
            add_p: true,
            tests: vec!["mpg=welch-t".to_string()],
            stats: vec!["mpg={mean} ({sd})".to_string()],
            column_digits: vec!["mpg=2".to_string()],
            p_adjust: Some(PAdjustArg::Holm),
            missing: Some(MissingArg::Always),
            inline_levels: true,
            seed: Some(7),
            ..SummarizeArgs::default()
        };
        let options = build_options(&args).unwrap();
        assert_eq!(options.by.as_deref(), Some("am"));
        assert_eq!(
            options.include,
            Some(vec!["mpg".to_string(), "cyl".to_string()])
        );
        assert!(options.comparator.enabled);
        assert_eq!(
            options.comparator.tests.get("mpg").map(String::as_str),
            Some("welch-t")
        );
        assert_eq!(
            options.statistics.columns.get("mpg").map(String::as_str),
            Some("{mean} ({sd})")
        );
        assert_eq!(options.digits_for("mpg"), 2);
        assert_eq!(options.comparator.p_adjust, PAdjust::Holm);
        assert_eq!(options.missing, MissingRow::Always);
        assert_eq!(options.categorical_layout, CategoricalLayout::Inline);
        assert_eq!(options.comparator.seed, Some(7));
        assert_eq!(options.categorical_threshold, 10);
    }

    #[test]
    fn test_bad_column_digits() {
        let args = SummarizeArgs {
            column_digits: vec!["mpg=two".to_string()],
            ..SummarizeArgs::default()
        };
        assert!(build_options(&args).is_err());
    }

    #[test]
    fn test_column_overrides() {
        let mut dataset = Dataset::new(vec![
            Column::text("arm", vec![Some("low"), Some("high")]),
            Column::numeric("vs", vec![Some(0.0), Some(1.0)]),
        ])
        .unwrap();
        let args = SummarizeArgs {
            labels: vec!["arm=Treatment arm".to_string()],
            kinds: vec!["vs=dichotomous:1".to_string()],
            levels: vec!["arm=low, high".to_string()],
            ..SummarizeArgs::default()
        };
        apply_column_overrides(&mut dataset, &args).unwrap();
        let arm = dataset.column("arm").unwrap();
        assert_eq!(arm.meta.display_label(), "Treatment arm");
        assert_eq!(
            arm.meta.levels,
            Some(vec!["low".to_string(), "high".to_string()])
        );
        assert_eq!(
            dataset.column("vs").unwrap().meta.kind,
            DeclaredKind::Dichotomous {
                level: Some("1".to_string())
            }
        );

        let unknown = SummarizeArgs {
            labels: vec!["gear=Gears".to_string()],
            ..SummarizeArgs::default()
        };
        let err = apply_column_overrides(&mut dataset, &unknown).unwrap_err();
        assert!(err.to_string().contains("unknown column 'gear'"));
    }
}
