//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use pwfuzz::core::config::Config;
use pwfuzz::core::errors::PwfError;
use pwfuzz::generator::category::TestCategory;
use pwfuzz::harness::orchestrator::{Orchestrator, RunOutcome};
use pwfuzz::harness::plan::RunPlan;
use pwfuzz::harness::progress::{
    CategoryStats, Checkpoint, ProgressObserver, RunSummary, format_elapsed,
};
use pwfuzz::logger::events::EventLog;
use pwfuzz::policy::validator::PolicyRule;
use pwfuzz::results::evaluator::{EvaluationReport, Evaluator};
use pwfuzz::results::record::TestResult;
use pwfuzz::results::sink::CsvResultSink;

/// Exit status of a generation run stopped by fail-fast.
const FAIL_FAST_EXIT_CODE: i32 = 1;

/// pwfuzz: adversarial conformance harness for a password policy.
#[derive(Debug, Parser)]
#[command(
    name = "pwfuzz",
    author,
    version,
    about = "Password policy conformance fuzzer",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Result file to write or evaluate.
    #[arg(long, global = true, value_name = "PATH")]
    results: Option<PathBuf>,
    /// Append structured run events to this JSONL file.
    #[arg(long, global = true, value_name = "PATH")]
    event_log: Option<PathBuf>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Generate, score and persist test cases.
    Run(RunArgs),
    /// Re-score an existing result file.
    Eval(EvalArgs),
    /// List test categories and their generation profiles.
    Categories,
    /// Check a single password against the reference policy.
    Check(CheckArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
#[allow(clippy::struct_excessive_bools)]
struct RunArgs {
    /// Run every category.
    #[arg(long)]
    all: bool,
    /// Run a category by id (repeatable).
    #[arg(long = "category", value_name = "ID")]
    categories: Vec<TestCategory>,
    /// Conforming passwords that should pass.
    #[arg(long)]
    valid: bool,
    /// Passwords missing an uppercase letter.
    #[arg(long)]
    uppercase: bool,
    /// Passwords missing a lowercase letter.
    #[arg(long)]
    lowercase: bool,
    /// Passwords missing a digit.
    #[arg(long)]
    numbers: bool,
    /// Passwords missing a legal special character.
    #[arg(long)]
    special: bool,
    /// Passwords containing illegal characters.
    #[arg(long)]
    illegal: bool,
    /// Passwords below the minimum length.
    #[arg(long)]
    length: bool,
    /// Cases per category.
    #[arg(short = 'n', long, value_name = "N")]
    repetitions: Option<u64>,
    /// Print progress checkpoints and per-category completion.
    #[arg(long)]
    show_progress: bool,
    /// Stop at the first mismatch.
    #[arg(long)]
    fail_fast: bool,
    /// Seed generators for a reproducible run.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Results between progress checkpoints.
    #[arg(long, value_name = "K")]
    checkpoint_interval: Option<u64>,
    /// Evaluate the result file after a completed run.
    #[arg(long)]
    evaluate: bool,
}

impl RunArgs {
    /// Categories chosen on the command line; empty when none were named.
    fn selected_categories(&self) -> Vec<TestCategory> {
        if self.all {
            return TestCategory::ALL.to_vec();
        }
        let toggles = [
            (self.valid, TestCategory::AllValid),
            (self.uppercase, TestCategory::MissingUpper),
            (self.lowercase, TestCategory::MissingLower),
            (self.numbers, TestCategory::MissingDigit),
            (self.special, TestCategory::MissingLegalSpecial),
            (self.illegal, TestCategory::HasIllegalChars),
            (self.length, TestCategory::TooShort),
        ];
        let mut selected = self.categories.clone();
        selected.extend(toggles.iter().filter(|(on, _)| *on).map(|(_, c)| *c));
        selected.sort_unstable();
        selected.dedup();
        selected
    }
}

#[derive(Debug, Clone, Args, Default)]
struct EvalArgs {
    /// Result file to evaluate (defaults to the configured results file).
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
    /// Maximum discrepancies to list.
    #[arg(long, value_name = "N")]
    max_listed: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct CheckArgs {
    /// Candidate password.
    #[arg(value_name = "PASSWORD", allow_hyphen_values = true)]
    password: String,
}

#[derive(Debug, Clone, Args, Default)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Validate the effective configuration.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input or configuration.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<PwfError> for CliError {
    fn from(value: PwfError) -> Self {
        if value.is_config_error() {
            Self::User(value.to_string())
        } else {
            Self::Runtime(value.to_string())
        }
    }
}

/// Dispatch CLI commands. Returns the process exit code on success.
pub fn run(cli: &Cli) -> Result<i32, CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Run(args) => run_generation(cli, args),
        Command::Eval(args) => run_eval(cli, args),
        Command::Categories => run_categories(cli).map(|()| 0),
        Command::Check(args) => run_check(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(0)
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration resolution
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = &cli.results {
        config.paths.results_file.clone_from(path);
    }
    if let Some(path) = &cli.event_log {
        config.paths.event_log = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

fn apply_run_args(config: &mut Config, args: &RunArgs) -> Result<(), CliError> {
    let selected = args.selected_categories();
    if !selected.is_empty() {
        config.run.categories = selected;
    }
    if let Some(n) = args.repetitions {
        config.run.repetitions = n;
    }
    if let Some(k) = args.checkpoint_interval {
        config.run.checkpoint_interval = k;
    }
    if args.seed.is_some() {
        config.run.seed = args.seed;
    }
    config.run.fail_fast |= args.fail_fast;
    config.run.show_progress |= args.show_progress;
    config.validate()?;
    Ok(())
}

fn open_event_log(config: &Config) -> Result<Option<EventLog>, CliError> {
    let Some(path) = &config.paths.event_log else {
        return Ok(None);
    };
    let hash = config.stable_hash()?;
    Ok(Some(
        EventLog::open(path).with_context(Some(hash), &config.paths.results_file),
    ))
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Prints progress for a human or JSON consumer and forwards every event to
/// the optional event log.
struct CliObserver {
    mode: OutputMode,
    show_progress: bool,
    log: Option<EventLog>,
}

impl ProgressObserver for CliObserver {
    fn on_start(&mut self, plan: &RunPlan) {
        if let Some(log) = self.log.as_mut() {
            log.on_start(plan);
        }
    }

    fn on_checkpoint(&mut self, checkpoint: &Checkpoint) {
        if let Some(log) = self.log.as_mut() {
            log.on_checkpoint(checkpoint);
        }
        if !self.show_progress {
            return;
        }
        match self.mode {
            OutputMode::Human => println!(
                "--- OVERALL --- Ran {} out of {} tests ({:.2}%) in {}",
                checkpoint.processed,
                checkpoint.total,
                checkpoint.percent(),
                format_elapsed(checkpoint.elapsed)
            ),
            OutputMode::Json => emit_best_effort(&json!({
                "event": "checkpoint",
                "processed": checkpoint.processed,
                "total": checkpoint.total,
                "percent": checkpoint.percent(),
                "elapsed_ms": millis(checkpoint.elapsed),
            })),
        }
    }

    fn on_mismatch(&mut self, category: TestCategory, result: &TestResult) {
        if let Some(log) = self.log.as_mut() {
            log.on_mismatch(category, result);
        }
    }

    fn on_category_complete(&mut self, stats: &CategoryStats, elapsed: Duration) {
        if let Some(log) = self.log.as_mut() {
            log.on_category_complete(stats, elapsed);
        }
        match self.mode {
            OutputMode::Human => println!(
                "--- {} --- Ran {} out of {} tests (100.00%) in {}",
                stats.category.label(),
                stats.cases,
                stats.cases,
                format_elapsed(elapsed)
            ),
            // JSON category lines only with --show-progress.
            OutputMode::Json if !self.show_progress => {}
            OutputMode::Json => emit_best_effort(&json!({
                "event": "category_complete",
                "category": stats.category.id(),
                "cases": stats.cases,
                "mismatches": stats.mismatches,
                "elapsed_ms": millis(elapsed),
            })),
        }
    }

    fn on_finish(&mut self, summary: &RunSummary, aborted: bool) {
        if let Some(log) = self.log.as_mut() {
            log.on_finish(summary, aborted);
        }
    }
}

fn run_generation(cli: &Cli, args: &RunArgs) -> Result<i32, CliError> {
    let mut config = load_config(cli)?;
    apply_run_args(&mut config, args)?;
    let plan = config.run_plan()?;
    let mode = output_mode(cli);

    if mode == OutputMode::Human {
        print_run_banner(&config, &plan, args.evaluate);
    }

    let results_path = config.paths.results_file.clone();
    let mut sink = CsvResultSink::create(&results_path)?;
    let mut observer = CliObserver {
        mode,
        show_progress: config.run.show_progress,
        log: open_event_log(&config)?,
    };

    let rule = PolicyRule::standard();
    let outcome = match Orchestrator::new(plan, rule.clone()).run(&mut sink, &mut observer) {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(log) = observer.log.as_mut() {
                log.error(&e);
            }
            return Err(e.into());
        }
    };

    finish_run(
        mode,
        &rule,
        outcome,
        &results_path,
        args.evaluate,
        observer.log.as_mut(),
    )
}

/// Report the outcome and pick the process exit code.
fn finish_run(
    mode: OutputMode,
    rule: &PolicyRule,
    outcome: RunOutcome,
    results_path: &Path,
    evaluate: bool,
    log: Option<&mut EventLog>,
) -> Result<i32, CliError> {
    match outcome {
        RunOutcome::Aborted {
            summary,
            category,
            mismatch,
        } => {
            report_abort(mode, rule, &summary, category, &mismatch, results_path)?;
            Ok(FAIL_FAST_EXIT_CODE)
        }
        RunOutcome::Completed(summary) => {
            report_completion(mode, &summary, results_path)?;
            if evaluate {
                let report = evaluate_file(results_path, None, log)?;
                print_report(mode, &report)?;
                Ok(report.exit_code())
            } else {
                Ok(0)
            }
        }
    }
}

fn print_run_banner(config: &Config, plan: &RunPlan, evaluate: bool) {
    let enabled = |category: TestCategory| plan.categories().contains(&category);
    println!("Results file:            {}", config.paths.results_file.display());
    println!("Evaluate after run:      {evaluate}");
    println!(
        "Run all tests:           {}",
        plan.categories().len() == TestCategory::ALL.len()
    );
    for category in TestCategory::ALL {
        println!(
            "{:<25}{}",
            format!("Test {}:", category.id()),
            enabled(category)
        );
    }
    println!("Show progress:           {}", config.run.show_progress);
    println!("Exit on fail:            {}", plan.fail_fast());
    println!("Test repeat count:       {}", plan.repetitions());
    if let Some(seed) = plan.seed() {
        println!("Seed:                    {seed}");
    }
    println!();
}

fn report_abort(
    mode: OutputMode,
    rule: &PolicyRule,
    summary: &RunSummary,
    category: TestCategory,
    mismatch: &TestResult,
    results_path: &Path,
) -> Result<(), CliError> {
    let violations = rule.check(&mismatch.password).err().unwrap_or_default();
    match mode {
        OutputMode::Human => {
            println!(
                "{} Password {} failed (Expected {}, got {}) in category {}",
                "FAIL".red().bold(),
                mismatch.password,
                mismatch.expected,
                mismatch.actual,
                category.id()
            );
            for violation in &violations {
                println!("  - {violation}");
            }
            println!(
                "Stopped after {} of {} tests; results so far in {}",
                summary.processed,
                summary.total,
                results_path.display()
            );
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "run",
                "aborted": true,
                "category": category.id(),
                "mismatch": mismatch,
                "violations": violations,
                "summary": summary,
                "elapsed_ms": millis(summary.elapsed),
                "results_file": results_path.to_string_lossy(),
            }))?;
        }
    }
    Ok(())
}

fn report_completion(
    mode: OutputMode,
    summary: &RunSummary,
    results_path: &Path,
) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            println!(
                "Total time to run tests: {}",
                format_elapsed(summary.elapsed)
            );
            println!(
                "Wrote {} results to {}",
                summary.processed,
                results_path.display()
            );
            if summary.mismatches > 0 {
                println!(
                    "{} {} results disagreed with their expected verdict",
                    "WARN".yellow().bold(),
                    summary.mismatches
                );
            }
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "run",
                "aborted": false,
                "summary": summary,
                "elapsed_ms": millis(summary.elapsed),
                "results_file": results_path.to_string_lossy(),
            }))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// eval
// ---------------------------------------------------------------------------

fn run_eval(cli: &Cli, args: &EvalArgs) -> Result<i32, CliError> {
    let config = load_config(cli)?;
    let path = args
        .file
        .clone()
        .unwrap_or_else(|| config.paths.results_file.clone());
    let mut log = open_event_log(&config)?;
    let report = evaluate_file(&path, args.max_listed, log.as_mut())?;
    print_report(output_mode(cli), &report)?;
    Ok(report.exit_code())
}

fn evaluate_file(
    path: &Path,
    max_listed: Option<usize>,
    log: Option<&mut EventLog>,
) -> Result<EvaluationReport, CliError> {
    let evaluator = max_listed.map_or_else(Evaluator::new, |n| {
        Evaluator::new().with_retain_limit(n)
    });
    match evaluator.evaluate_path(path) {
        Ok(report) => {
            if let Some(log) = log {
                log.eval_complete(&report);
            }
            Ok(report)
        }
        Err(e) => {
            if let Some(log) = log {
                log.error(&e);
            }
            Err(e.into())
        }
    }
}

fn print_report(mode: OutputMode, report: &EvaluationReport) -> Result<(), CliError> {
    match mode {
        OutputMode::Human => {
            for d in &report.discrepancies {
                println!(
                    "{} did not meet expectations (Expected result of {}, got {}) [line {}]",
                    d.password, d.expected, d.actual, d.line
                );
            }
            if report.omitted_discrepancies > 0 {
                println!(
                    "... {} more discrepancies not listed",
                    report.omitted_discrepancies
                );
            }
            println!("Total number of tests ran: {}", report.total);
            let verdict = if report.is_success() {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            println!(
                "Number of passing tests: {} ({:.2}%) {verdict}",
                report.passed(),
                report.pass_percentage()
            );
            println!("SHA-256: {}", report.sha256);
            println!(
                "Total time to evaluate test results: {}",
                format_elapsed(report.elapsed)
            );
        }
        OutputMode::Json => {
            let mut payload = serde_json::to_value(report)?;
            if let Value::Object(map) = &mut payload {
                map.insert("command".to_string(), json!("eval"));
                map.insert("passed".to_string(), json!(report.passed()));
                map.insert(
                    "pass_percentage".to_string(),
                    json!(report.pass_percentage()),
                );
                map.insert("exit_code".to_string(), json!(report.exit_code()));
            }
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// categories / check
// ---------------------------------------------------------------------------

fn run_categories(cli: &Cli) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            for category in TestCategory::ALL {
                let profile = category.profile();
                let expect = if category.expected_verdict() {
                    "pass".green()
                } else {
                    "fail".red()
                };
                println!(
                    "{:<22} {expect} length {}..={}  {}",
                    category.id(),
                    profile
                        .truncation()
                        .map_or(profile.min_untruncated_length(), |t| t.min),
                    profile.max_length(),
                    category.description()
                );
            }
        }
        OutputMode::Json => {
            let categories: Vec<Value> = TestCategory::ALL
                .iter()
                .map(|category| {
                    let profile = category.profile();
                    json!({
                        "id": category.id(),
                        "label": category.label(),
                        "description": category.description(),
                        "expected": category.expected_verdict(),
                        "max_length": profile.max_length(),
                    })
                })
                .collect();
            write_json_line(&json!({
                "command": "categories",
                "categories": categories,
            }))?;
        }
    }
    Ok(())
}

fn run_check(cli: &Cli, args: &CheckArgs) -> Result<i32, CliError> {
    let rule = PolicyRule::standard();
    let violations = rule.check(&args.password).err().unwrap_or_default();
    let conforms = violations.is_empty();

    match output_mode(cli) {
        OutputMode::Human => {
            if conforms {
                println!("{} password conforms to the policy", "PASS".green().bold());
            } else {
                println!("{} password violates the policy", "FAIL".red().bold());
                for violation in &violations {
                    println!("  - {violation}");
                }
            }
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "check",
                "conforms": conforms,
                "length": args.password.chars().count(),
                "violations": violations,
            }))?;
        }
    }
    Ok(i32::from(!conforms))
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<i32, CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    }))?;
                }
            }
            Ok(0)
        }
        Some(ConfigCommand::Show) => {
            let config = load_config(cli)?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Internal(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    }))?;
                }
            }
            Ok(0)
        }
        Some(ConfigCommand::Validate) => match load_config(cli) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        write_json_line(&json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        }))?;
                    }
                }
                Ok(0)
            }
            Err(e) => {
                if output_mode(cli) == OutputMode::Json {
                    write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "error": e.to_string(),
                    }))?;
                }
                Err(e)
            }
        },
    }
}

// ---------------------------------------------------------------------------
// output helpers
// ---------------------------------------------------------------------------

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

/// Progress lines are advisory; a closed stdout must not abort the run.
fn emit_best_effort(payload: &Value) {
    let _ = write_json_line(payload);
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("PWF_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
