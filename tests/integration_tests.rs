//! Integration tests: CLI smoke tests and full generate → persist → evaluate
//! scenarios.

mod common;

use std::fs;
use std::path::Path;

use pwfuzz::prelude::*;
use serde_json::Value;

fn write_results(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("write result file");
    path.to_string_lossy().into_owned()
}

// ──────────────────── CLI smoke ────────────────────

#[test]
fn help_command_prints_usage() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in("help_command_prints_usage", home.path(), &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: pwfuzz [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let home = tempfile::tempdir().unwrap();
    let result =
        common::run_cli_case_in("version_command_prints_version", home.path(), &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains(env!("CARGO_PKG_VERSION")),
        "log: {}",
        result.log_path.display()
    );
}

#[test]
fn categories_lists_all_seven() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in("categories_json", home.path(), &["categories", "--json"]);
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    let payload = result.last_json();
    let categories = payload["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 7);
    let passing: Vec<&Value> = categories
        .iter()
        .filter(|c| c["expected"] == true)
        .collect();
    assert_eq!(passing.len(), 1);
    assert_eq!(passing[0]["id"], "all-valid");
}

#[test]
fn check_reports_verdict_and_violations() {
    let home = tempfile::tempdir().unwrap();
    let ok = common::run_cli_case_in("check_ok", home.path(), &["check", "Aa1$Aa1$", "--json"]);
    assert_eq!(ok.code(), 0, "log: {}", ok.log_path.display());
    assert_eq!(ok.last_json()["conforms"], true);

    let bad = common::run_cli_case_in("check_bad", home.path(), &["check", "Aa1$Aa1$#", "--json"]);
    assert_eq!(bad.code(), 1, "log: {}", bad.log_path.display());
    let payload = bad.last_json();
    assert_eq!(payload["conforms"], false);
    assert_eq!(payload["violations"][0]["kind"], "illegal_character");
}

#[test]
fn config_path_reports_missing_default() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in("config_path", home.path(), &["config", "path", "--json"]);
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    let payload = result.last_json();
    assert_eq!(payload["exists"], false);
    assert!(
        payload["path"]
            .as_str()
            .unwrap()
            .ends_with(".config/pwfuzz/config.toml")
    );
}

#[test]
fn missing_explicit_config_is_user_error() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in(
        "missing_explicit_config",
        home.path(),
        &["--config", "/nonexistent/pwfuzz.toml", "run", "--all"],
    );
    assert_eq!(result.code(), 1, "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PWF-1002"), "log: {}", result.log_path.display());
}

// ──────────────────── run ────────────────────

#[test]
fn seeded_run_writes_every_result() {
    let home = tempfile::tempdir().unwrap();
    let results = home.path().join("out").join("results.csv");
    let results_arg = results.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "seeded_run_writes_every_result",
        home.path(),
        &[
            "run", "--all", "-n", "50", "--seed", "7", "--results", &results_arg, "--json",
        ],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());

    let payload = result.last_json();
    assert_eq!(payload["aborted"], false);
    assert_eq!(payload["summary"]["processed"], 350);
    assert_eq!(payload["summary"]["mismatches"], 0);

    let contents = fs::read_to_string(&results).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("password,expected,actual"));
    let report = Evaluator::new().evaluate_path(&results).unwrap();
    assert_eq!(report.total, 350);
    assert_eq!(report.mismatches, 0);
}

#[test]
fn seeded_runs_are_byte_identical_for_single_category() {
    let home = tempfile::tempdir().unwrap();
    let mut outputs = Vec::new();
    for attempt in 0..2 {
        let path = home.path().join(format!("run-{attempt}.csv"));
        let path_arg = path.to_string_lossy().into_owned();
        let result = common::run_cli_case_in(
            "seeded_single_category",
            home.path(),
            &["run", "--valid", "-n", "1", "--seed", "0", "--results", &path_arg],
        );
        assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
        outputs.push(fs::read_to_string(&path).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0].lines().count(), 2);
    assert!(outputs[0].lines().nth(1).unwrap().ends_with(",true,true"));
}

#[test]
fn run_then_evaluate_succeeds() {
    let home = tempfile::tempdir().unwrap();
    let results = home.path().join("results.csv");
    let results_arg = results.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "run_then_evaluate",
        home.path(),
        &[
            "run", "--illegal", "--length", "-n", "40", "--evaluate", "--results", &results_arg,
            "--json",
        ],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    let payload = result.last_json();
    assert_eq!(payload["command"], "eval");
    assert_eq!(payload["total"], 80);
    assert_eq!(payload["mismatches"], 0);
}

#[test]
fn fail_fast_run_with_conforming_validator_completes() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in(
        "fail_fast_run_with_conforming_validator_completes",
        home.path(),
        &["run", "--all", "-n", "20", "--fail-fast", "--seed", "5", "--json"],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    let payload = result.last_json();
    assert_eq!(payload["aborted"], false);
    assert_eq!(payload["summary"]["processed"], 140);

    let report = Evaluator::new()
        .evaluate_path(&home.path().join("results.csv"))
        .unwrap();
    assert_eq!(report.total, 140);
}

#[test]
fn env_overrides_repetitions() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_with_env(
        "env_overrides_repetitions",
        home.path(),
        &["run", "--all", "--json"],
        &[("PWF_RUN_REPETITIONS", "3")],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    assert_eq!(result.last_json()["summary"]["processed"], 21);
    assert!(home.path().join("results.csv").exists());
}

#[test]
fn config_file_selects_categories() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("pwfuzz.toml");
    fs::write(
        &config,
        "[run]\ncategories = [\"missing-upper\", \"missing-lower\"]\nrepetitions = 5\n",
    )
    .unwrap();
    let config_arg = config.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "config_file_selects_categories",
        home.path(),
        &["--config", &config_arg, "run", "--json"],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    let payload = result.last_json();
    let summary = &payload["summary"];
    assert_eq!(summary["processed"], 10);
    let ids: Vec<&str> = summary["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["category"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["missing-upper", "missing-lower"]);
}

#[test]
fn zero_repetitions_rejected() {
    let home = tempfile::tempdir().unwrap();
    let result =
        common::run_cli_case_in("zero_repetitions", home.path(), &["run", "--all", "-n", "0"]);
    assert_eq!(result.code(), 1, "log: {}", result.log_path.display());
    assert!(result.stderr.contains("repetitions"), "log: {}", result.log_path.display());
}

#[test]
fn event_log_records_run_lifecycle() {
    let home = tempfile::tempdir().unwrap();
    let events = home.path().join("logs").join("events.jsonl");
    let events_arg = events.to_string_lossy().into_owned();
    let result = common::run_cli_case_in(
        "event_log_records_run_lifecycle",
        home.path(),
        &[
            "--event-log", &events_arg, "run", "--numbers", "-n", "20",
            "--checkpoint-interval", "5", "--json",
        ],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());

    let lines: Vec<Value> = fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.first().unwrap()["event"], "run_start");
    assert!(lines[0]["config_hash"].as_str().is_some());
    assert_eq!(
        lines.iter().filter(|l| l["event"] == "checkpoint").count(),
        4
    );
    assert_eq!(lines.last().unwrap()["event"], "run_complete");
}

#[test]
fn human_run_echoes_configuration() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_with_env(
        "human_run_echoes_configuration",
        home.path(),
        &["run", "--length", "-n", "10", "--show-progress"],
        &[("PWF_OUTPUT_FORMAT", "human")],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Test repeat count:       10"));
    assert!(result.stdout.contains("Test too-short:          true"));
    assert!(result.stdout.contains("--- SHOULD FAIL LENGTH --- Ran 10 out of 10 tests"));
    assert!(result.stdout.contains("Total time to run tests:"));
}

#[test]
fn human_run_reports_category_completion_without_progress_flag() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_with_env(
        "human_run_reports_category_completion_without_progress_flag",
        home.path(),
        &["run", "--valid", "--numbers", "-n", "12", "--checkpoint-interval", "6"],
        &[("PWF_OUTPUT_FORMAT", "human")],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    assert!(result.stdout.contains("--- SHOULD PASS --- Ran 12 out of 12 tests"));
    assert!(result.stdout.contains("--- SHOULD FAIL NUMBER --- Ran 12 out of 12 tests"));
    assert!(!result.stdout.contains("--- OVERALL ---"));
}

#[test]
fn human_progress_uses_overall_label() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_with_env(
        "human_progress_uses_overall_label",
        home.path(),
        &["run", "--valid", "-n", "10", "--checkpoint-interval", "5", "--show-progress"],
        &[("PWF_OUTPUT_FORMAT", "human")],
    );
    assert_eq!(result.code(), 0, "log: {}", result.log_path.display());
    assert!(result.stdout.contains("--- OVERALL --- Ran 5 out of 10 tests (50.00%)"));
}

// ──────────────────── eval ────────────────────

#[test]
fn eval_exit_code_is_mismatch_count() {
    let home = tempfile::tempdir().unwrap();
    let path = write_results(
        home.path(),
        "mixed.csv",
        "password,expected,actual\n\
         Aa1$Aa1$,true,true\n\
         aa1$aa1$,false,true\n\
         \"a,b c\",false,TRUE\n\
         Zz9!Zz9!,True,false\n\
         short,false,false\n",
    );
    let result = common::run_cli_case_in("eval_mismatches", home.path(), &["eval", &path, "--json"]);
    assert_eq!(result.code(), 3, "log: {}", result.log_path.display());
    let payload = result.last_json();
    assert_eq!(payload["total"], 5);
    assert_eq!(payload["mismatches"], 3);
    assert_eq!(payload["passed"], 2);
    assert_eq!(payload["discrepancies"][1]["password"], "a,b c");
    assert_eq!(payload["sha256"].as_str().unwrap().len(), 64);
}

#[test]
fn eval_exit_code_saturates() {
    let home = tempfile::tempdir().unwrap();
    let mut body = String::from("password,expected,actual\n");
    for i in 0..200 {
        body.push_str(&format!("p{i},false,true\n"));
    }
    let path = write_results(home.path(), "many.csv", &body);
    let result = common::run_cli_case_in(
        "eval_saturates",
        home.path(),
        &["eval", &path, "--max-listed", "3", "--json"],
    );
    assert_eq!(result.code(), 125, "log: {}", result.log_path.display());
    let payload = result.last_json();
    assert_eq!(payload["mismatches"], 200);
    assert_eq!(payload["discrepancies"].as_array().unwrap().len(), 3);
    assert_eq!(payload["omitted_discrepancies"], 197);
}

#[test]
fn eval_malformed_row_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    let path = write_results(
        home.path(),
        "broken.csv",
        "password,expected,actual\nAa1$Aa1$,true,true\nonly,two\n",
    );
    let result = common::run_cli_case_in("eval_malformed", home.path(), &["eval", &path]);
    assert_eq!(result.code(), 2, "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PWF-2001"), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("line 3"), "log: {}", result.log_path.display());
}

#[test]
fn eval_human_lists_discrepancies() {
    let home = tempfile::tempdir().unwrap();
    let path = write_results(
        home.path(),
        "one.csv",
        "password,expected,actual\nabcdefgh,false,true\n",
    );
    let result = common::run_cli_case_with_env(
        "eval_human",
        home.path(),
        &["eval", &path, "--no-color"],
        &[("PWF_OUTPUT_FORMAT", "human")],
    );
    assert_eq!(result.code(), 1, "log: {}", result.log_path.display());
    assert!(
        result
            .stdout
            .contains("abcdefgh did not meet expectations (Expected result of false, got true)")
    );
    assert!(result.stdout.contains("Total number of tests ran: 1"));
    assert!(result.stdout.contains("Number of passing tests: 0 (0.00%)"));
}

#[test]
fn eval_missing_file_is_runtime_error() {
    let home = tempfile::tempdir().unwrap();
    let result = common::run_cli_case_in("eval_missing", home.path(), &["eval"]);
    assert_eq!(result.code(), 2, "log: {}", result.log_path.display());
    assert!(result.stderr.contains("PWF-3002"), "log: {}", result.log_path.display());
}

// ──────────────────── library pipeline ────────────────────

#[test]
fn live_mismatch_count_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");

    // Accepts anything without a comma: valid cases agree, most negative
    // cases become mismatches.
    let validator = |candidate: &str| !candidate.contains(',');
    let plan = RunPlan::new(TestCategory::ALL, 300).unwrap().with_seed(Some(99));

    let live = {
        let mut sink = CsvResultSink::create(&path).unwrap();
        let outcome = Orchestrator::new(plan, validator)
            .run(&mut sink, &mut NoopObserver)
            .unwrap();
        assert_eq!(sink.rows_written(), 2_100);
        outcome.summary().mismatches
    };
    assert!(live > 0);

    let report = Evaluator::new().evaluate_path(&path).unwrap();
    assert_eq!(report.total, 2_100);
    assert_eq!(report.mismatches, live);
}

#[test]
fn fail_fast_leaves_mismatch_as_last_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    let plan = RunPlan::new([TestCategory::AllValid, TestCategory::TooShort], 5_000)
        .unwrap()
        .with_fail_fast(true);

    let outcome = {
        let mut sink = CsvResultSink::create(&path).unwrap();
        Orchestrator::new(plan, |candidate: &str| candidate.len() >= 4)
            .run(&mut sink, &mut NoopObserver)
            .unwrap()
    };

    let RunOutcome::Aborted {
        summary, mismatch, ..
    } = outcome
    else {
        panic!("expected fail-fast abort");
    };
    let report = Evaluator::new().evaluate_path(&path).unwrap();
    assert_eq!(report.total, summary.processed);
    assert_eq!(report.mismatches, 1);
    assert_eq!(report.discrepancies[0].password, mismatch.password);
}
