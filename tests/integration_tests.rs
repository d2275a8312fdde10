//! Integration tests: CLI smoke tests and short end-to-end monitoring runs.

mod common;

use std::fs;

use serde_json::Value;
use tempfile::TempDir;

fn seeded_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("nested/deeper")).unwrap();
    fs::write(tmp.path().join("a.log"), vec![0u8; 400]).unwrap();
    fs::write(tmp.path().join("nested/b.log"), vec![0u8; 350]).unwrap();
    fs::write(tmp.path().join("nested/deeper/c.log"), vec![0u8; 250]).unwrap();
    tmp
}

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"], &[]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: tgm [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_flag_prints_version() {
    let result = common::run_cli_case("version_flag_prints_version", &["--version"], &[]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("tgm"), "log: {}", result.log_path.display());
}

#[test]
fn completions_generate_for_bash() {
    let result = common::run_cli_case("completions_generate_for_bash", &["completions", "bash"], &[]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("tgm"), "log: {}", result.log_path.display());
}

#[test]
fn count_without_monitor_path_fails_before_sampling() {
    let result = common::run_cli_case(
        "count_without_monitor_path_fails_before_sampling",
        &["count", "--duration", "1", "--intervals", "1"],
        &[],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(
        result.stderr.contains("MONITOR_PATH"),
        "missing env hint; log: {}",
        result.log_path.display()
    );
}

#[test]
fn count_rejects_file_as_monitor_path() {
    let tmp = seeded_tree();
    let file = tmp.path().join("a.log");
    let result = common::run_cli_case(
        "count_rejects_file_as_monitor_path",
        &["count", "--duration", "1", "--intervals", "1"],
        &[("MONITOR_PATH", file.to_str().unwrap())],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(
        result.stderr.contains("not a valid directory"),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn count_rejects_non_positive_interval() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "count_rejects_non_positive_interval",
        &["count", "--duration", "1", "--intervals", "0"],
        &[("MONITOR_PATH", tmp.path().to_str().unwrap())],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn growth_rejects_missing_path() {
    let result = common::run_cli_case(
        "growth_rejects_missing_path",
        &["growth", "--path", "/definitely/not/a/real/tgm/path", "--duration", "1"],
        &[],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("TGM-1005"), "log: {}", result.log_path.display());
}

#[test]
fn invalid_cadence_is_a_user_error() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "invalid_cadence_is_a_user_error",
        &[
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "1",
            "--cadence-ms",
            "0",
        ],
        &[],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("TGM-1001"), "log: {}", result.log_path.display());
}

#[test]
fn explicit_missing_config_file_fails() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "explicit_missing_config_file_fails",
        &[
            "--config",
            "/no/such/tgm-config.toml",
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "0",
        ],
        &[],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("TGM-1002"), "log: {}", result.log_path.display());
}

#[test]
fn short_growth_run_saves_report() {
    let tmp = seeded_tree();
    let out = TempDir::new().unwrap();
    let result = common::run_cli_case(
        "short_growth_run_saves_report",
        &[
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "0.0001",
            "--cadence-ms",
            "100",
            "--output-dir",
            out.path().to_str().unwrap(),
        ],
        &[],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("FILE GROWTH REPORT"),
        "log: {}",
        result.log_path.display()
    );
    assert!(result.stdout.contains("1000.00 B"), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("Report saved to:"),
        "log: {}",
        result.log_path.display()
    );

    let reports: Vec<_> = fs::read_dir(out.path())
        .unwrap()
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("growth_report_") && name.ends_with(".txt"))
        .collect();
    assert_eq!(reports.len(), 1, "log: {}", result.log_path.display());
    let saved = fs::read_to_string(out.path().join(&reports[0])).unwrap();
    assert!(saved.contains("FORECAST (Based on actual run rate)"));
}

#[test]
fn report_save_failure_keeps_exit_status_zero() {
    let tmp = seeded_tree();
    let blocker = tmp.path().join("a.log");
    let result = common::run_cli_case(
        "report_save_failure_keeps_exit_status_zero",
        &[
            "growth",
            "--path",
            tmp.path().join("nested").to_str().unwrap(),
            "--duration",
            "0",
            "--output-dir",
            blocker.to_str().unwrap(),
        ],
        &[],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stderr.contains("Error saving report"),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn growth_json_output_is_single_object() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "growth_json_output_is_single_object",
        &[
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "0",
            "--no-save",
            "--json",
        ],
        &[],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["mode"], "aggregate");
    assert_eq!(payload["start"]["total_bytes"], 1000);
    assert_eq!(payload["start"]["file_count"], 3);
    assert_eq!(payload["delta"]["net_files"], 0);
    assert_eq!(payload["forecast"]["files"]["per_second"], 0.0);
    assert!(payload["report_path"].is_null());
}

#[test]
fn shallow_growth_counts_direct_children_only() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "shallow_growth_counts_direct_children_only",
        &[
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "0",
            "--shallow",
            "--no-save",
        ],
        &[("TGM_OUTPUT_FORMAT", "json")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["end"]["file_count"], 1);
    assert_eq!(payload["end"]["total_bytes"], 400);
}

#[test]
fn short_count_run_prints_final_report() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "short_count_run_prints_final_report",
        &[
            "count",
            "--duration",
            "0.01",
            "--intervals",
            "5",
            "0.001",
            "--recursive",
            "--cadence-ms",
            "100",
        ],
        &[("MONITOR_PATH", tmp.path().to_str().unwrap())],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("FINAL REPORT"), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("  - @ 5 min: 3.00"),
        "log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("  - Difference: 0 (End - Start)"),
        "log: {}",
        result.log_path.display()
    );
    assert!(result.stdout.contains("  - Added: 0"), "log: {}", result.log_path.display());
}

#[test]
fn count_json_reports_membership_mode() {
    let tmp = seeded_tree();
    let result = common::run_cli_case(
        "count_json_reports_membership_mode",
        &["--json", "count", "--duration", "0", "--intervals", "1", "1"],
        &[("MONITOR_PATH", tmp.path().to_str().unwrap())],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(payload["mode"], "membership");
    // Non-recursive: only a.log is a direct child file.
    assert_eq!(payload["end"]["file_count"], 1);
    assert!(payload["end"]["total_bytes"].is_null());
    assert_eq!(payload["interval_averages"].as_array().unwrap().len(), 2);
    assert_eq!(payload["running_totals"]["added"], 0);
    assert_eq!(payload["churn"]["added_per_minute"], 0.0);
}

#[test]
fn activity_log_records_run_events() {
    let tmp = seeded_tree();
    let log_dir = TempDir::new().unwrap();
    let log_file = log_dir.path().join("activity.jsonl");
    let result = common::run_cli_case(
        "activity_log_records_run_events",
        &[
            "growth",
            "--path",
            tmp.path().to_str().unwrap(),
            "--duration",
            "0",
            "--no-save",
        ],
        &[
            ("TGM_LOGGING_JSONL_ENABLED", "true"),
            ("TGM_PATHS_JSONL_LOG", log_file.to_str().unwrap()),
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());

    let events: Vec<String> = fs::read_to_string(&log_file)
        .unwrap()
        .lines()
        .map(|line| {
            let value: Value = serde_json::from_str(line).unwrap();
            value["event"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(events, vec!["run_start", "sample", "run_complete"]);
}
