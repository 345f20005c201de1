//! Basic CLI E2E tests.
//!
//! Tests invoke the compiled binary and verify outputs end to end:
//! split a small log, run the engine over it, evaluate the results.

use std::path::Path;
use std::process::Command;

fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_caseflow-cli"))
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn write_sample_log(path: &Path) {
    let rows = "case,event,state,completeTime,isCancelled\n\
        A,NEW,InProgress,2024-01-02 09:00:00,false\n\
        B,NEW,InProgress,2024-01-03 09:00:00,false\n\
        A,FIN,InProgress,2024-02-10 09:00:00,false\n\
        A,RELEASE,InProgress,2024-02-11 09:00:00,false\n\
        A,CODE OK,InProgress,2024-02-12 09:00:00,false\n\
        A,BILLED,Billed,2024-02-13 09:00:00,false\n\
        B,STORNO,Cancelled,2024-03-05 09:00:00,true\n";
    std::fs::write(path, rows).unwrap();
}

#[test]
fn help_lists_subcommands() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for subcommand in ["split", "run", "evaluate", "config"] {
        assert!(stdout.contains(subcommand), "missing subcommand {subcommand}");
    }
}

#[test]
fn config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("caseflow.toml");

    let (_, _, code) = run_cli(&["config", "init", "--path", config_path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(config_path.exists());

    let (stdout, _, code) = run_cli(&["config", "show", "--config", config_path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("granularity"));
    assert!(stdout.contains("max_silence_days"));
}

#[test]
fn split_run_evaluate_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("log.csv");
    let logs_dir = dir.path().join("logs");
    let output_dir = dir.path().join("out");
    write_sample_log(&input);

    let (_, stderr, code) = run_cli(&[
        "split",
        "--input",
        input.to_str().unwrap(),
        "--output-dir",
        logs_dir.to_str().unwrap(),
        "--granularity",
        "monthly",
        "--initial-months",
        "1",
    ]);
    assert_eq!(code, 0, "split failed: {stderr}");
    assert!(logs_dir.join("initial_log.csv").exists());

    let (stdout, stderr, code) = run_cli(&[
        "run",
        "--logs-dir",
        logs_dir.to_str().unwrap(),
        "--output-dir",
        output_dir.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "run failed: {stderr}");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["cases_processed"], 2);
    assert_eq!(summary["complete_cases"], 1);
    assert_eq!(summary["cancelled_cases"], 1);
    assert!(output_dir.join("case_snapshots.csv").exists());
    assert!(output_dir.join("window_reports.csv").exists());

    let (stdout, stderr, code) = run_cli(&[
        "evaluate",
        "--windows",
        output_dir.join("window_reports.csv").to_str().unwrap(),
        "--cases",
        output_dir.join("case_snapshots.csv").to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "evaluate failed: {stderr}");
    let evaluation: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(evaluation["windows"].as_array().unwrap().len() >= 2);
    assert!(evaluation["weighted"]["weighted_accuracy"].is_number());
}
