use std::time::Instant;

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{info, info_span};

use tbl_core::{Summarizer, SummaryReport, TestRegistry};
use tbl_ingest::load_dataset;

use crate::cli::{OutputFormatArg, SummarizeArgs};
use crate::options::{apply_column_overrides, build_options};
use crate::render::{apply_table_style, render_markdown, render_text};

/// Outcome of `tbl-summary summarize`.
#[derive(Debug)]
pub struct SummaryRun {
    pub report: SummaryReport,
    /// Report rendered in the requested output format.
    pub rendered: String,
}

pub fn run_summarize(args: &SummarizeArgs) -> Result<SummaryRun> {
    let span = info_span!("summarize_csv", path = %args.csv.display());
    let _guard = span.enter();
    let started = Instant::now();

    let (mut dataset, applied) = load_dataset(&args.csv, args.metadata.as_deref())
        .with_context(|| format!("load {}", args.csv.display()))?;
    if applied.has_changes() {
        info!(
            labelled = applied.labelled.len(),
            typed = applied.typed.len(),
            leveled = applied.leveled.len(),
            "applied column metadata"
        );
    }
    apply_column_overrides(&mut dataset, args)?;
    let options = build_options(args)?;

    let report = Summarizer::new()
        .summarize(&dataset, &options)
        .context("build summary table")?;

    let rendered = match args.format {
        OutputFormatArg::Text => render_text(&report.table),
        OutputFormatArg::Markdown => render_markdown(&report.table),
        OutputFormatArg::Json => {
            serde_json::to_string_pretty(&report).context("serialize report")?
        }
    };
    info!(
        rows = report.table.rows.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "summary rendered"
    );
    Ok(SummaryRun { report, rendered })
}

/// Table of the comparison tests a run can name with `--test`.
pub fn tests_table(registry: &TestRegistry) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Test", "Description"]);
    apply_table_style(&mut table);
    for (name, description) in registry.entries() {
        table.add_row(vec![name.to_string(), description]);
    }
    table
}

pub fn run_tests() -> Result<()> {
    println!("{}", tests_table(&TestRegistry::default()));
    Ok(())
}
