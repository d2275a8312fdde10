//! Monitoring-root resolution and path normalization.

use std::env;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{Result, TgmError};

/// Which kinds of filesystem object a monitoring root may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A directory or a single regular file.
    FileOrDirectory,
    /// Directories only.
    Directory,
}

/// Resolve a path to an absolute, normalized path.
///
/// Existing paths are canonicalized (symlinks in the root itself are resolved
/// once, here, so every later snapshot sees the same identity prefix).
/// Nonexistent paths are made absolute relative to CWD and `..`/`.` components
/// are resolved syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// Validate a user-supplied monitoring root before any sampling starts.
///
/// Returns the canonical absolute root on success. A missing path, or a path of
/// the wrong kind, is a configuration error.
pub fn resolve_monitor_root(path: &Path, kind: RootKind) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(TgmError::InvalidPath {
            path: path.to_path_buf(),
            details: "path is empty".to_string(),
        });
    }

    let resolved = resolve_absolute_path(path);
    let meta = std::fs::metadata(&resolved).map_err(|err| TgmError::InvalidPath {
        path: path.to_path_buf(),
        details: format!("path does not exist or is not accessible ({err})"),
    })?;

    match kind {
        RootKind::Directory if !meta.is_dir() => Err(TgmError::InvalidPath {
            path: path.to_path_buf(),
            details: "not a valid directory".to_string(),
        }),
        RootKind::FileOrDirectory if !meta.is_dir() && !meta.is_file() => {
            Err(TgmError::InvalidPath {
                path: path.to_path_buf(),
                details: "neither a regular file nor a directory".to_string(),
            })
        }
        _ => Ok(resolved),
    }
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}
