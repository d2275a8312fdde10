//! Text and JSON rendering of a finished run.

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::fmt::Write as _;

use serde_json::{Value, json};

use crate::monitor::forecast::{Horizon, RateForecast};
use crate::monitor::sampler::{RunResult, Termination};
use crate::report::format::{format_duration, format_signed, format_size, format_timestamp};

const GROWTH_WIDTH: usize = 50;
const TABLE_WIDTH: usize = 76;
const CENSUS_WIDTH: usize = 40;

fn rule(ch: char, width: usize) -> String {
    std::iter::repeat_n(ch, width).collect()
}

fn termination_label(termination: Termination) -> &'static str {
    match termination {
        Termination::Completed => "completed",
        Termination::Cancelled => "stopped early",
    }
}

/// Size-growth report (aggregate mode).
#[must_use]
pub fn render_growth(result: &RunResult) -> String {
    let delta = result.delta();
    let forecast = result.forecast();
    let start_bytes = result.start_snapshot.total_bytes().unwrap_or(0);
    let end_bytes = result.end_snapshot.total_bytes().unwrap_or(0);
    let bytes = forecast
        .bytes
        .clone()
        .unwrap_or_else(|| RateForecast::from_change(0.0, 0.0));

    let heavy = rule('=', GROWTH_WIDTH);
    let light = rule('-', GROWTH_WIDTH);
    let table = rule('-', TABLE_WIDTH);

    let mut out = String::new();
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "{:^width$}", "FILE GROWTH REPORT", width = GROWTH_WIDTH);
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "Target Path      : {}", result.root.display());
    let _ = writeln!(out, "Start Time       : {}", format_timestamp(&result.started_at));
    let _ = writeln!(out, "End Time         : {}", format_timestamp(&result.ended_at));
    let _ = writeln!(out, "Actual Duration  : {}", format_duration(result.elapsed()));
    let _ = writeln!(out, "Status           : {}", termination_label(result.termination));
    let _ = writeln!(out, "Samples          : {}", result.ticks);
    if result.path_errors > 0 {
        let _ = writeln!(out, "Unreadable Ticks : {}", result.path_errors);
    }
    let _ = writeln!(out, "{light}");
    let _ = writeln!(out, "GROWTH STATISTICS");
    let _ = writeln!(out, "{light}");
    let _ = writeln!(
        out,
        "{:<20} | {:<15} | {:<15} | {:<15}",
        "Metric", "Start", "End", "Growth (Net)"
    );
    let _ = writeln!(out, "{table}");
    let _ = writeln!(
        out,
        "{:<20} | {:<15} | {:<15} | {:<15}",
        "Size",
        format_size(start_bytes as f64),
        format_size(end_bytes as f64),
        format_size(delta.net_bytes.unwrap_or(0) as f64)
    );
    let _ = writeln!(
        out,
        "{:<20} | {:<15} | {:<15} | {:<15}",
        "File Count",
        result.start_snapshot.file_count(),
        result.end_snapshot.file_count(),
        format_signed(delta.net_files)
    );
    let _ = writeln!(out, "{table}");
    let _ = writeln!(
        out,
        "Growth Rate      : {}/sec ({}/hour)",
        format_size(bytes.per_second),
        format_size(bytes.per_hour)
    );
    let _ = writeln!(
        out,
        "File Rate        : {:.2} files/hour",
        forecast.files.per_hour
    );
    let _ = writeln!(out, "{light}");
    let _ = writeln!(out, "FORECAST (Based on actual run rate)");
    let _ = writeln!(out, "{light}");
    for horizon in Horizon::ALL {
        let label = format!("{} Growth", horizon.label());
        let _ = writeln!(
            out,
            "{label:<17}: {} ({:.0} files)",
            format_size(bytes.projection(horizon)),
            forecast.files.projection(horizon)
        );
    }
    let _ = write!(out, "{heavy}");
    out
}

/// File-count report (membership mode).
#[must_use]
pub fn render_census(result: &RunResult) -> String {
    let heavy = rule('=', CENSUS_WIDTH);
    let light = rule('-', CENSUS_WIDTH);
    let delta = result.delta();

    let mut out = String::new();
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "{:^width$}", "FINAL REPORT", width = CENSUS_WIDTH);
    let _ = writeln!(out, "{heavy}");
    let _ = writeln!(out, "Monitoring Path: {}", result.root.display());
    let _ = writeln!(out, "Start Time: {}", format_timestamp(&result.started_at));
    let _ = writeln!(out, "End Time: {}", format_timestamp(&result.ended_at));
    let _ = writeln!(
        out,
        "Total Execution Time: {:.2} minutes",
        result.elapsed().as_secs_f64() / 60.0
    );
    let _ = writeln!(out, "Status: {}", termination_label(result.termination));
    let _ = writeln!(out, "{light}");

    let _ = writeln!(out, "Average Total Files:");
    if result.interval_averages.is_empty() {
        let _ = writeln!(out, "  (no intervals requested)");
    }
    for interval in &result.interval_averages {
        match interval.average {
            Some(avg) => {
                let _ = writeln!(out, "  - @ {} min: {avg:.2}", interval.minutes);
            }
            None => {
                let _ = writeln!(out, "  - @ {} min: N/A (Not enough data)", interval.minutes);
            }
        }
    }
    let _ = writeln!(out, "{light}");

    let _ = writeln!(out, "File Count Difference:");
    let _ = writeln!(out, "  - Start: {}", result.start_snapshot.file_count());
    let _ = writeln!(out, "  - End: {}", result.end_snapshot.file_count());
    let _ = writeln!(out, "  - Difference: {} (End - Start)", delta.net_files);

    if let Some(totals) = result.running_totals {
        let churn = result.churn();
        let per_minute = |rate: Option<f64>| {
            rate.map_or_else(|| "N/A".to_string(), |r| format!("{r:.2}/min"))
        };
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "File Churn:");
        let _ = writeln!(
            out,
            "  - Added: {} ({})",
            totals.added,
            per_minute(churn.and_then(|c| c.added_per_minute))
        );
        let _ = writeln!(
            out,
            "  - Removed: {} ({})",
            totals.removed,
            per_minute(churn.and_then(|c| c.removed_per_minute))
        );
    }
    if result.path_errors > 0 {
        let _ = writeln!(out, "Unreadable Ticks: {}", result.path_errors);
    }
    let _ = write!(out, "{heavy}");
    out
}

/// Machine-readable summary for `--json` output.
#[must_use]
pub fn run_to_json(result: &RunResult) -> Value {
    let delta = result.delta();
    json!({
        "root": result.root.to_string_lossy(),
        "mode": result.mode,
        "termination": result.termination,
        "started_at": result.started_at.to_rfc3339(),
        "ended_at": result.ended_at.to_rfc3339(),
        "elapsed_seconds": result.elapsed().as_secs_f64(),
        "ticks": result.ticks,
        "path_errors": result.path_errors,
        "start": {
            "file_count": result.start_snapshot.file_count(),
            "total_bytes": result.start_snapshot.total_bytes(),
        },
        "end": {
            "file_count": result.end_snapshot.file_count(),
            "total_bytes": result.end_snapshot.total_bytes(),
        },
        "delta": delta,
        "running_totals": result.running_totals,
        "churn": result.churn(),
        "interval_averages": result.interval_averages,
        "forecast": result.forecast(),
    })
}
