//! TGM-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TgmError>;

/// Top-level error type for the tree growth monitor.
#[derive(Debug, Error)]
pub enum TgmError {
    #[error("[TGM-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TGM-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[TGM-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TGM-1004] environment variable '{name}' is not set")]
    MissingEnv { name: &'static str },

    #[error("[TGM-1005] invalid monitoring root {path}: {details}")]
    InvalidPath { path: PathBuf, details: String },

    #[error("[TGM-2001] cannot access monitoring root {path}: {source}")]
    PathAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TGM-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[TGM-2201] failed to save report to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TGM-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[TGM-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl TgmError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "TGM-1001",
            Self::MissingConfig { .. } => "TGM-1002",
            Self::ConfigParse { .. } => "TGM-1003",
            Self::MissingEnv { .. } => "TGM-1004",
            Self::InvalidPath { .. } => "TGM-1005",
            Self::PathAccess { .. } => "TGM-2001",
            Self::Serialization { .. } => "TGM-2101",
            Self::Persistence { .. } => "TGM-2201",
            Self::Io { .. } => "TGM-3002",
            Self::Runtime { .. } => "TGM-3900",
        }
    }

    /// Configuration failures are fatal and raised before sampling starts.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::MissingEnv { .. }
                | Self::InvalidPath { .. }
        )
    }

    /// Whether a later attempt (e.g. the next sampling tick) might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::PathAccess { .. } | Self::Io { .. } | Self::Persistence { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for an unreadable monitoring root.
    #[must_use]
    pub fn path_access(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::PathAccess {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for TgmError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TgmError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
