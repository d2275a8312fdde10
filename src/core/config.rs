//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TgmError};

/// Environment variable naming the membership-mode monitoring root.
pub const MONITOR_PATH_ENV: &str = "MONITOR_PATH";

/// Upper bound on the sampling cadence (one hour).
const MAX_CADENCE_MS: u64 = 3_600_000;

/// Full TGM configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub scanner: ScannerConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Sampling loop cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Milliseconds between consecutive snapshots.
    pub cadence_ms: u64,
}

/// Snapshot collector tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Worker threads used by recursive walks.
    pub parallelism: usize,
}

/// Where and whether growth reports are written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub save_growth_report: bool,
}

/// Activity log switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub jsonl_enabled: bool,
}

/// Filesystem paths used by tgm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { cadence_ms: 1_000 }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            parallelism: std::thread::available_parallelism()
                .map_or(2, |n| n.get().saturating_div(2).max(1)),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            save_growth_report: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            jsonl_enabled: true,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[TGM-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("tgm").join("config.toml"),
            jsonl_log: home_dir
                .join(".local")
                .join("share")
                .join("tgm")
                .join("activity.jsonl"),
        }
    }
}

impl SamplingConfig {
    #[must_use]
    pub fn cadence(&self) -> Duration {
        Duration::from_millis(self.cadence_ms)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TgmError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(TgmError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic hash of the effective config for the activity log.
    ///
    /// FNV-1a over the canonical JSON form, stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("TGM_SAMPLING_CADENCE_MS") {
            self.sampling.cadence_ms = parse_env("TGM_SAMPLING_CADENCE_MS", &raw)?;
        }
        if let Some(raw) = lookup("TGM_SCANNER_PARALLELISM") {
            self.scanner.parallelism = parse_env("TGM_SCANNER_PARALLELISM", &raw)?;
        }
        if let Some(raw) = lookup("TGM_REPORT_OUTPUT_DIR") {
            self.report.output_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("TGM_REPORT_SAVE_GROWTH_REPORT") {
            self.report.save_growth_report = parse_env("TGM_REPORT_SAVE_GROWTH_REPORT", &raw)?;
        }
        if let Some(raw) = lookup("TGM_LOGGING_JSONL_ENABLED") {
            self.logging.jsonl_enabled = parse_env("TGM_LOGGING_JSONL_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("TGM_PATHS_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn normalize_paths(&mut self) {
        for path in [&mut self.report.output_dir, &mut self.paths.jsonl_log] {
            let trimmed = path
                .to_str()
                .filter(|s| s.len() > 1)
                .and_then(|s| s.strip_suffix('/'))
                .map(PathBuf::from);
            if let Some(trimmed) = trimmed {
                *path = trimmed;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling.cadence_ms == 0 || self.sampling.cadence_ms > MAX_CADENCE_MS {
            return Err(TgmError::InvalidConfig {
                details: format!(
                    "sampling.cadence_ms must be in [1, {MAX_CADENCE_MS}], got {}",
                    self.sampling.cadence_ms
                ),
            });
        }
        if self.scanner.parallelism == 0 {
            return Err(TgmError::InvalidConfig {
                details: "scanner.parallelism must be >= 1".to_string(),
            });
        }
        if self.report.output_dir.as_os_str().is_empty() {
            return Err(TgmError::InvalidConfig {
                details: "report.output_dir must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolve the membership-mode root from `MONITOR_PATH`.
///
/// Unset and blank values are both treated as missing.
pub fn monitor_path_from<F>(mut lookup: F) -> Result<PathBuf>
where
    F: FnMut(&str) -> Option<String>,
{
    lookup(MONITOR_PATH_ENV)
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
        .ok_or(TgmError::MissingEnv {
            name: MONITOR_PATH_ENV,
        })
}

/// Process-environment lookup that ignores blank values.
pub fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| TgmError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
