//! Top-level CLI definition and dispatch.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use tree_growth_monitor::control::clock::SystemClock;
use tree_growth_monitor::control::signals::SignalHandler;
use tree_growth_monitor::core::config::{Config, env_var, monitor_path_from};
use tree_growth_monitor::core::errors::TgmError;
use tree_growth_monitor::core::paths::{RootKind, resolve_monitor_root};
use tree_growth_monitor::logger::jsonl::{ActivityLog, EventType, JsonlConfig, LogEntry, Severity};
use tree_growth_monitor::monitor::aggregate::IntervalSpec;
use tree_growth_monitor::monitor::sampler::{RunResult, Sampler, SamplerConfig, Termination};
use tree_growth_monitor::report::format::{format_duration, format_size};
use tree_growth_monitor::report::persist::persist_report;
use tree_growth_monitor::report::render::{render_census, render_growth, run_to_json};
use tree_growth_monitor::scanner::snapshot::SnapshotMode;
use tree_growth_monitor::scanner::walker::{SnapshotSource, TreeWalker, WalkerConfig};

/// Tree Growth Monitor: sample a directory tree and report how it changes.
#[derive(Debug, Parser)]
#[command(
    name = "tgm",
    author,
    version,
    about = "Tree Growth Monitor - sample a directory tree and report how it grows",
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
    /// Log every sample to stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Print only the final report.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Override the sampling cadence in milliseconds.
    #[arg(long, global = true, value_name = "MS")]
    cadence_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Track total size and file count of a path over a number of hours.
    Growth(GrowthArgs),
    /// Track file membership of $MONITOR_PATH over a number of minutes.
    Count(CountArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
struct GrowthArgs {
    /// File or directory to monitor.
    #[arg(long, value_name = "PATH")]
    path: PathBuf,
    /// Monitoring window in hours (fractions allowed).
    #[arg(long, value_name = "HOURS")]
    duration: f64,
    /// Only inspect direct children of the path.
    #[arg(long)]
    shallow: bool,
    /// Directory for the saved report (overrides report.output_dir).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Do not save the report to a file.
    #[arg(long)]
    no_save: bool,
}

#[derive(Debug, Clone, Args)]
struct CountArgs {
    /// Monitoring window in minutes (fractions allowed).
    #[arg(long, value_name = "MINUTES")]
    duration: f64,
    /// "First N minutes" windows for average file counts.
    #[arg(long, required = true, num_args = 1.., value_name = "MINUTES")]
    intervals: Vec<f64>,
    /// Include subdirectories.
    #[arg(long)]
    recursive: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Target shell.
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

impl From<TgmError> for CliError {
    fn from(err: TgmError) -> Self {
        match err {
            TgmError::Serialization { .. } => Self::Internal(err.to_string()),
            _ if err.is_config_error() => Self::User(err.to_string()),
            _ => Self::Runtime(err.to_string()),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Growth(args) => run_growth(cli, args),
        Command::Count(args) => run_count(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ms) = cli.cadence_ms {
        config.sampling.cadence_ms = ms;
        config.validate()?;
    }
    Ok(config)
}

fn run_growth(cli: &Cli, args: &GrowthArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mode = output_mode(cli);
    let root = resolve_monitor_root(&args.path, RootKind::FileOrDirectory)?;
    let max_duration = SamplerConfig::duration_from_secs(args.duration * 3_600.0)?;
    let sampler_config =
        SamplerConfig::new(config.sampling.cadence(), max_duration, IntervalSpec::default())?;

    let walker = TreeWalker::new(WalkerConfig {
        root,
        recursive: !args.shallow,
        mode: SnapshotMode::Aggregate,
        parallelism: config.scanner.parallelism,
    });

    if mode == OutputMode::Human && !cli.quiet {
        println!("{}", "Starting File Growth Monitor".bold());
        println!("Target Path: {}", walker.root().display());
        println!(
            "Duration: {} hours ({})",
            args.duration,
            format_duration(max_duration)
        );
        println!("Calculating initial stats... please wait.");
    }

    let (result, mut log) = execute_run(cli, &config, &walker, sampler_config, mode)?;
    let report = render_growth(&result);

    let save = config.report.save_growth_report && !args.no_save;
    let saved = if save {
        let dir = args
            .output_dir
            .clone()
            .unwrap_or_else(|| config.report.output_dir.clone());
        Some(save_report(&dir, &result, &report, &mut log))
    } else {
        None
    };
    log.flush();

    match mode {
        OutputMode::Human => {
            println!("{report}");
            match saved {
                Some(Ok(path)) => {
                    println!("\n{} {}", "Report saved to:".green(), path.display());
                }
                Some(Err(err)) => {
                    eprintln!("\n{} {err}", "Error saving report:".red());
                }
                None => {}
            }
        }
        OutputMode::Json => {
            let mut payload = run_to_json(&result);
            payload["report_path"] = match &saved {
                Some(Ok(path)) => json!(path.to_string_lossy()),
                _ => Value::Null,
            };
            if let Some(Err(err)) = &saved {
                payload["report_error"] = json!(err.to_string());
            }
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_count(cli: &Cli, args: &CountArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let mode = output_mode(cli);
    let raw_root = monitor_path_from(env_var).map_err(|err| {
        CliError::User(format!(
            "{err}\nset it before running, e.g. export MONITOR_PATH=/path/to/monitor"
        ))
    })?;
    let root = resolve_monitor_root(&raw_root, RootKind::Directory)?;
    let intervals = IntervalSpec::new(&args.intervals)?;
    let max_duration = SamplerConfig::duration_from_secs(args.duration * 60.0)?;
    let sampler_config = SamplerConfig::new(config.sampling.cadence(), max_duration, intervals)?;

    let walker = TreeWalker::new(WalkerConfig {
        root,
        recursive: args.recursive,
        mode: SnapshotMode::Membership,
        parallelism: config.scanner.parallelism,
    });

    if mode == OutputMode::Human && !cli.quiet {
        println!("{} {}", "Starting monitor on:".bold(), walker.root().display());
        println!("Recursive: {}", args.recursive);
        println!("Duration: {} minutes", args.duration);
        println!(
            "Intervals for Avg Total: {:?} minutes",
            sampler_config.intervals.minutes()
        );
    }

    let (result, mut log) = execute_run(cli, &config, &walker, sampler_config, mode)?;
    log.flush();

    match mode {
        OutputMode::Human => println!("\n{}", render_census(&result)),
        OutputMode::Json => write_json_line(&run_to_json(&result))?,
    }
    Ok(())
}

/// Drive one monitoring run with signal-based cancellation and activity logging.
fn execute_run(
    cli: &Cli,
    config: &Config,
    source: &dyn SnapshotSource,
    sampler_config: SamplerConfig,
    mode: OutputMode,
) -> Result<(RunResult, ActivityLog), CliError> {
    let mut log = if config.logging.jsonl_enabled {
        ActivityLog::open(JsonlConfig::at(config.paths.jsonl_log.clone()))
    } else {
        ActivityLog::disabled()
    };

    let run_mode = source.mode();
    let mode_label = mode_label(run_mode);
    let mut start = LogEntry::new(EventType::RunStart, Severity::Info).with_path(source.root());
    start.mode = Some(mode_label.to_string());
    start.config_hash = config.stable_hash().ok();
    start.details = Some(format!(
        "duration_ms={} cadence_ms={}",
        sampler_config.max_duration.as_millis(),
        config.sampling.cadence_ms
    ));
    log.record(&start);

    if mode == OutputMode::Human && !cli.quiet {
        println!("Press Ctrl+C to stop early (report will be generated).");
    }

    let signals = SignalHandler::install();
    let cancel = signals.token();
    let verbose = cli.verbose;

    let result = Sampler::new(sampler_config)
        .with_observer(|event| {
            let mut entry = if let Some(message) = &event.error {
                let mut entry = LogEntry::new(EventType::PathError, Severity::Warning);
                entry.error_message = Some(message.clone());
                entry
            } else {
                LogEntry::new(EventType::Sample, Severity::Info)
            };
            entry.tick = Some(event.tick);
            entry.file_count = Some(event.file_count);
            entry.total_bytes = event.total_bytes;
            entry.added = event.diff.map(|d| d.added);
            entry.removed = event.diff.map(|d| d.removed);
            log.record(&entry.with_elapsed(event.offset));

            if verbose {
                eprintln!("{}", progress_line(event.tick, event.offset, event.file_count, event.total_bytes));
            }
        })
        .run(source, &SystemClock, &cancel);

    let (event, severity) = match result.termination {
        Termination::Completed => (EventType::RunComplete, Severity::Info),
        Termination::Cancelled => (EventType::RunCancelled, Severity::Warning),
    };
    let mut done = LogEntry::new(event, severity)
        .with_path(&result.root)
        .with_elapsed(result.elapsed());
    done.mode = Some(mode_label.to_string());
    done.tick = Some(result.ticks);
    done.file_count = Some(result.end_snapshot.file_count());
    done.total_bytes = result.end_snapshot.total_bytes();
    done.added = result.running_totals.map(|t| t.added);
    done.removed = result.running_totals.map(|t| t.removed);
    if result.path_errors > 0 {
        done.details = Some(format!("path_errors={}", result.path_errors));
    }
    log.record(&done);

    if result.was_cancelled() && mode == OutputMode::Human {
        println!("\n{}", "Monitoring stopped by user.".yellow());
    }
    Ok((result, log))
}

fn save_report(
    dir: &Path,
    result: &RunResult,
    report: &str,
    log: &mut ActivityLog,
) -> Result<PathBuf, TgmError> {
    match persist_report(dir, &result.ended_at, report) {
        Ok(path) => {
            log.record(&LogEntry::new(EventType::ReportSaved, Severity::Info).with_path(&path));
            Ok(path)
        }
        Err(err) => {
            eprintln!("[TGM-REPORT] {err}");
            log.record(
                &LogEntry::new(EventType::ReportSaveFailed, Severity::Error)
                    .with_path(dir)
                    .with_error(&err),
            );
            Err(err)
        }
    }
}

fn progress_line(tick: u64, offset: Duration, file_count: u64, total_bytes: Option<u64>) -> String {
    #[allow(clippy::cast_precision_loss)]
    let size = total_bytes.map_or_else(String::new, |b| format!(" size={}", format_size(b as f64)));
    format!(
        "[TGM-SAMPLER] tick={tick} t+{} files={file_count}{size}",
        format_duration(offset)
    )
}

const fn mode_label(mode: SnapshotMode) -> &'static str {
    match mode {
        SnapshotMode::Aggregate => "aggregate",
        SnapshotMode::Membership => "membership",
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("TGM_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}
