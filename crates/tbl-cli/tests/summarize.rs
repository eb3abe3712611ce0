//! End-to-end tests for the summarize command.

use std::fs;
use std::path::PathBuf;

use tbl_cli::cli::{OutputFormatArg, SummarizeArgs};
use tbl_cli::commands::{run_summarize, tests_table};
use tbl_core::TestRegistry;
use tempfile::TempDir;

const CSV: &str = "\
age,arm,response
34,placebo,yes
51,active,no
47,placebo,no
NA,active,yes
62,active,yes
";

fn fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("trial.csv");
    fs::write(&path, CSV).expect("write csv");
    path
}

fn args(csv: PathBuf) -> SummarizeArgs {
    SummarizeArgs {
        csv,
        by: Some("arm".to_string()),
        levels: vec!["arm=placebo,active".to_string()],
        labels: vec!["age=Age (years)".to_string()],
        kinds: vec!["age=continuous".to_string()],
        ..SummarizeArgs::default()
    }
}

#[test]
fn markdown_output() {
    let dir = TempDir::new().expect("temp dir");
    let args = SummarizeArgs {
        format: OutputFormatArg::Markdown,
        stats: vec!["age={mean}".to_string()],
        ..args(fixture(&dir))
    };
    let run = run_summarize(&args).expect("summarize");
    let lines: Vec<&str> = run.rendered.lines().collect();
    assert_eq!(
        lines[0],
        "| **Characteristic** | **placebo** | **active** |"
    );
    assert_eq!(lines[2], "| Age (years) | 40.5 | 56.5 |");
    assert_eq!(lines[3], "| &nbsp;&nbsp;Unknown | 0 | 1 |");
    assert!(run.rendered.contains("| &nbsp;&nbsp;yes | 1 (50.0%) | 2 (66.7%) |"));
}

#[test]
fn json_output_round_trips() {
    let dir = TempDir::new().expect("temp dir");
    let args = SummarizeArgs {
        format: OutputFormatArg::Json,
        add_p: true,
        ..args(fixture(&dir))
    };
    let run = run_summarize(&args).expect("summarize");
    let value: serde_json::Value = serde_json::from_str(&run.rendered).expect("json");
    assert_eq!(value["table"]["columns"][2]["heading"], "p-value");
    assert_eq!(value["variants"][0][0], "age");
}

#[test]
fn metadata_sidecar_and_config_file() {
    let dir = TempDir::new().expect("temp dir");
    let csv = fixture(&dir);
    let metadata = dir.path().join("trial.meta.json");
    fs::write(
        &metadata,
        r#"{"columns": [{"name": "response", "label": "Responder", "kind": "dichotomous"}]}"#,
    )
    .expect("write metadata");
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{"overall": true, "include": ["response"]}"#).expect("write config");

    let args = SummarizeArgs {
        metadata: Some(metadata),
        config: Some(config),
        format: OutputFormatArg::Markdown,
        ..args(csv)
    };
    let run = run_summarize(&args).expect("summarize");
    assert_eq!(
        run.report.table.headings(),
        vec!["placebo", "active", "Overall"]
    );
    let row = run.report.table.variable_row("response").expect("row");
    assert_eq!(row.label, "Responder");
    assert_eq!(row.cells, vec!["1 (50.0%)", "2 (66.7%)", "3 (60.0%)"]);
}

#[test]
fn unknown_test_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let args = SummarizeArgs {
        add_p: true,
        tests: vec!["age=bootstrap".to_string()],
        ..args(fixture(&dir))
    };
    let err = run_summarize(&args).expect_err("unknown test");
    assert!(format!("{err:#}").contains("unknown comparison test 'bootstrap'"));
}

#[test]
fn missing_csv_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = run_summarize(&args(dir.path().join("absent.csv"))).expect_err("missing file");
    assert!(format!("{err:#}").contains("file not found"));
}

#[test]
fn tests_listing() {
    let rendered = tests_table(&TestRegistry::default()).to_string();
    for name in ["wilcoxon", "welch-t", "kruskal", "chi-square", "fisher", "permutation"] {
        assert!(rendered.contains(name), "missing {name}");
    }
}
