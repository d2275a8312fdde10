//! Saving growth reports to disk.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::core::errors::{Result, TgmError};

/// `growth_report_<YYYYMMDD_HHMMSS>.txt`, stamped with local time.
#[must_use]
pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("growth_report_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Write `contents` into `dir` under a timestamped name and return the full path.
///
/// The file is written to a temporary sibling and renamed into place so a
/// partially written report is never visible under the final name.
pub fn persist_report(dir: &Path, at: &DateTime<Local>, contents: &str) -> Result<PathBuf> {
    let target = dir.join(report_file_name(at));
    let staging = dir.join(format!(".{}.tmp", report_file_name(at)));

    let write = || -> std::io::Result<()> {
        fs::create_dir_all(dir)?;
        let mut file = fs::File::create(&staging)?;
        file.write_all(contents.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&staging, &target)
    };

    write().map_err(|source| {
        let _ = fs::remove_file(&staging);
        TgmError::Persistence {
            path: target.clone(),
            source,
        }
    })?;
    Ok(target)
}
