//! Point-in-time observations of a monitored tree.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::path::PathBuf;

use serde::Serialize;

/// Which kind of snapshot a run collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotMode {
    /// Byte size + file count (size-growth reports).
    Aggregate,
    /// Full file-identity set (count/diff reports).
    Membership,
}

/// Aggregate byte size and regular-file count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSnapshot {
    pub total_bytes: u64,
    pub total_files: u64,
}

/// Set of absolute file paths present at sampling time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSnapshot {
    pub files: HashSet<PathBuf>,
}

/// One observation of the monitored tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Aggregate(AggregateSnapshot),
    Membership(MembershipSnapshot),
}

/// Files added and removed between two consecutive membership snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub added: u64,
    pub removed: u64,
}

impl MembershipSnapshot {
    #[must_use]
    pub fn new(files: HashSet<PathBuf>) -> Self {
        Self { files }
    }

    /// `added = |next - self|`, `removed = |self - next|`.
    #[must_use]
    pub fn diff(&self, next: &Self) -> SnapshotDiff {
        SnapshotDiff {
            added: next.files.difference(&self.files).count() as u64,
            removed: self.files.difference(&next.files).count() as u64,
        }
    }
}

impl Snapshot {
    /// A zeroed snapshot, substituted when the root cannot be read.
    #[must_use]
    pub fn empty(mode: SnapshotMode) -> Self {
        match mode {
            SnapshotMode::Aggregate => Self::Aggregate(AggregateSnapshot::default()),
            SnapshotMode::Membership => Self::Membership(MembershipSnapshot::default()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> SnapshotMode {
        match self {
            Self::Aggregate(_) => SnapshotMode::Aggregate,
            Self::Membership(_) => SnapshotMode::Membership,
        }
    }

    #[must_use]
    pub fn file_count(&self) -> u64 {
        match self {
            Self::Aggregate(agg) => agg.total_files,
            Self::Membership(members) => members.files.len() as u64,
        }
    }

    /// Total bytes; membership snapshots do not measure size.
    #[must_use]
    pub fn total_bytes(&self) -> Option<u64> {
        match self {
            Self::Aggregate(agg) => Some(agg.total_bytes),
            Self::Membership(_) => None,
        }
    }

    #[must_use]
    pub fn as_membership(&self) -> Option<&MembershipSnapshot> {
        match self {
            Self::Membership(members) => Some(members),
            Self::Aggregate(_) => None,
        }
    }
}
