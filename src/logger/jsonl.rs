//! JSONL activity log: one self-contained JSON object per line, per run event.
//!
//! Each line goes out in one `write_all` through a `LineWriter`, so a
//! concurrent `tail -f` never sees a partial line.
//!
//! On open or write failure the writer moves to the fallback path, then to
//! stderr with a `[TGM-JSONL]` prefix, then drops entries. Logging failures
//! never fail the run.

#![allow(missing_docs)]

use std::fs::{self, File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TgmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Activity events emitted over the life of one monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    Sample,
    PathError,
    RunComplete,
    RunCancelled,
    ReportSaved,
    ReportSaveFailed,
}

/// A single JSONL log entry. Only `ts`, `event`, and `severity` are always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    /// Monitored root or written report path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `aggregate` or `membership`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Offset from run start, or total run length on completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: format_utc_now(),
            event,
            severity,
            path: None,
            mode: None,
            tick: None,
            elapsed_ms: None,
            file_count: None,
            total_bytes: None,
            added: None,
            removed: None,
            config_hash: None,
            error_code: None,
            error_message: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn with_error(mut self, err: &TgmError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.error_message = Some(err.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct JsonlConfig {
    pub path: PathBuf,
    pub fallback_path: Option<PathBuf>,
    /// A log already this large at open is moved aside to `<path>.1`. Default: 10 MiB.
    pub max_size_bytes: u64,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("activity.jsonl"),
            fallback_path: Some(std::env::temp_dir().join("tgm-activity.jsonl")),
            max_size_bytes: 10 * 1024 * 1024,
        }
    }
}

impl JsonlConfig {
    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }
}

enum Sink {
    File { path: PathBuf, out: LineWriter<File> },
    Stderr,
    Discard,
}

/// Append-only JSONL writer for one run.
pub struct JsonlWriter {
    sink: Sink,
    /// Untried log paths; `pop()` yields the next preference.
    remaining: Vec<PathBuf>,
    max_size_bytes: u64,
}

impl JsonlWriter {
    /// Open the first usable log path, falling back to stderr.
    pub fn open(config: JsonlConfig) -> Self {
        let mut remaining: Vec<PathBuf> = config.fallback_path.into_iter().collect();
        remaining.push(config.path);
        let mut writer = Self {
            sink: Sink::Stderr,
            remaining,
            max_size_bytes: config.max_size_bytes,
        };
        writer.next_sink();
        writer
    }

    pub fn write_entry(&mut self, entry: &LogEntry) {
        let line = match serde_json::to_string(entry) {
            Ok(json) => format!("{json}\n"),
            Err(e) => {
                let _ = writeln!(io::stderr(), "[TGM-JSONL] serialize error: {e}");
                return;
            }
        };
        loop {
            match &mut self.sink {
                Sink::File { path, out } => {
                    let Err(e) = out.write_all(line.as_bytes()) else {
                        return;
                    };
                    let _ = writeln!(
                        io::stderr(),
                        "[TGM-JSONL] write to {} failed: {e}",
                        path.display()
                    );
                    self.next_sink();
                }
                Sink::Stderr => {
                    if write!(io::stderr(), "[TGM-JSONL] {line}").is_err() {
                        self.sink = Sink::Discard;
                    }
                    return;
                }
                Sink::Discard => return,
            }
        }
    }

    pub fn flush(&mut self) {
        if let Sink::File { out, .. } = &mut self.sink
            && out.flush().is_err()
        {
            self.next_sink();
        }
    }

    /// `"file"`, `"stderr"`, or `"discard"`.
    pub fn state(&self) -> &'static str {
        match self.sink {
            Sink::File { .. } => "file",
            Sink::Stderr => "stderr",
            Sink::Discard => "discard",
        }
    }

    /// The file currently receiving entries, if any.
    pub fn active_path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File { path, .. } => Some(path),
            _ => None,
        }
    }

    fn next_sink(&mut self) {
        while let Some(path) = self.remaining.pop() {
            match open_log(&path, self.max_size_bytes) {
                Ok(file) => {
                    self.sink = Sink::File {
                        path,
                        out: LineWriter::new(file),
                    };
                    return;
                }
                Err(e) => {
                    let _ = writeln!(io::stderr(), "[TGM-JSONL] {e}");
                }
            }
        }
        let _ = writeln!(io::stderr(), "[TGM-JSONL] no writable log path, using stderr");
        self.sink = Sink::Stderr;
    }
}

/// Run-scoped activity log; a disabled log accepts and drops every entry.
pub struct ActivityLog {
    writer: Option<JsonlWriter>,
}

impl ActivityLog {
    pub fn open(config: JsonlConfig) -> Self {
        Self {
            writer: Some(JsonlWriter::open(config)),
        }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    pub fn record(&mut self, entry: &LogEntry) {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_entry(entry);
        }
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush();
        }
    }
}

/// Open `path` for appending, first moving an oversized log to `<path>.1`.
fn open_log(path: &Path, max_size_bytes: u64) -> Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| TgmError::io(parent, source))?;
    }
    if fs::metadata(path).is_ok_and(|m| m.len() >= max_size_bytes) {
        let _ = fs::rename(path, previous_generation(path));
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| TgmError::io(path, source))
}

/// `activity.jsonl` -> `activity.jsonl.1`.
fn previous_generation(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}

fn format_utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
