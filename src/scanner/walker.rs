//! Snapshot collector: walks a monitored root and reduces it to one snapshot.
//!
//! Recursive walks fan out over a small pool of worker threads. Each worker
//! keeps a private partial result and hands it back exactly once when the work
//! queue drains, so the final totals are a single-writer reduction rather than
//! contended shared counters.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;

use crate::core::errors::{Result, TgmError};
use crate::scanner::snapshot::{AggregateSnapshot, MembershipSnapshot, Snapshot, SnapshotMode};

/// How long an idle worker waits for queued directories before re-checking
/// whether the walk has finished.
const IDLE_POLL: Duration = Duration::from_millis(5);

/// Anything that can produce snapshots of a monitored tree.
///
/// The sampling loop only depends on this trait, so a scripted source (tests)
/// or an event-driven one can stand in for [`TreeWalker`].
pub trait SnapshotSource {
    fn mode(&self) -> SnapshotMode;
    fn root(&self) -> &Path;
    /// Take one snapshot. Fails only when the root itself is unreadable.
    fn collect(&self) -> Result<Snapshot>;
}

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub root: PathBuf,
    pub recursive: bool,
    pub mode: SnapshotMode,
    pub parallelism: usize,
}

/// Filesystem-backed snapshot collector.
///
/// Safety invariants:
/// - Symbolic links are never counted and never traversed, in either mode
/// - Only regular files contribute to counts and sizes
/// - Unreadable entries and subdirectories are skipped, never fatal
#[derive(Debug, Clone)]
pub struct TreeWalker {
    config: WalkerConfig,
}

/// Per-worker accumulation, merged once at the end of a walk.
#[derive(Debug, Default)]
struct Partial {
    total_bytes: u64,
    total_files: u64,
    files: Vec<PathBuf>,
}

impl Partial {
    fn merge(&mut self, other: Self) {
        self.total_bytes = self.total_bytes.saturating_add(other.total_bytes);
        self.total_files = self.total_files.saturating_add(other.total_files);
        self.files.extend(other.files);
    }

    fn into_snapshot(self, mode: SnapshotMode) -> Snapshot {
        match mode {
            SnapshotMode::Aggregate => Snapshot::Aggregate(AggregateSnapshot {
                total_bytes: self.total_bytes,
                total_files: self.total_files,
            }),
            SnapshotMode::Membership => {
                Snapshot::Membership(MembershipSnapshot::new(self.files.into_iter().collect()))
            }
        }
    }
}

impl TreeWalker {
    #[must_use]
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &WalkerConfig {
        &self.config
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let root = &self.config.root;
        let mode = self.config.mode;

        let meta = fs::metadata(root).map_err(|source| TgmError::path_access(root, source))?;
        if meta.is_file() {
            return Ok(single_file_snapshot(root, &meta, mode));
        }
        if !meta.is_dir() {
            return Ok(Snapshot::empty(mode));
        }

        // The root listing is the only read whose failure is reported.
        let entries = fs::read_dir(root).map_err(|source| TgmError::path_access(root, source))?;

        let mut total = Partial::default();
        let mut subdirs = Vec::new();
        scan_entries(
            entries,
            mode,
            &mut total,
            self.config.recursive.then_some(&mut subdirs),
        );

        if !subdirs.is_empty() {
            let nested = if self.config.parallelism <= 1 {
                walk_sequential(subdirs, mode)
            } else {
                walk_parallel(subdirs, mode, self.config.parallelism)
            };
            total.merge(nested);
        }

        Ok(total.into_snapshot(mode))
    }
}

impl SnapshotSource for TreeWalker {
    fn mode(&self) -> SnapshotMode {
        self.config.mode
    }

    fn root(&self) -> &Path {
        &self.config.root
    }

    fn collect(&self) -> Result<Snapshot> {
        self.snapshot()
    }
}

fn single_file_snapshot(root: &Path, meta: &fs::Metadata, mode: SnapshotMode) -> Snapshot {
    match mode {
        SnapshotMode::Aggregate => Snapshot::Aggregate(AggregateSnapshot {
            total_bytes: meta.len(),
            total_files: 1,
        }),
        SnapshotMode::Membership => Snapshot::Membership(MembershipSnapshot::new(
            std::iter::once(root.to_path_buf()).collect(),
        )),
    }
}

fn walk_sequential(mut stack: Vec<PathBuf>, mode: SnapshotMode) -> Partial {
    let mut partial = Partial::default();
    while let Some(dir) = stack.pop() {
        scan_directory(&dir, mode, &mut partial, Some(&mut stack));
    }
    partial
}

fn walk_parallel(seeds: Vec<PathBuf>, mode: SnapshotMode, parallelism: usize) -> Partial {
    let (work_tx, work_rx) = channel::unbounded::<PathBuf>();
    let (result_tx, result_rx) = channel::unbounded::<Partial>();

    // Track queued-but-unfinished directories so workers know when to stop.
    let in_flight = AtomicUsize::new(seeds.len());
    for dir in seeds {
        let _ = work_tx.send(dir);
    }

    thread::scope(|scope| {
        for _ in 0..parallelism {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let result_tx = result_tx.clone();
            let in_flight = &in_flight;
            scope.spawn(move || {
                walker_thread(&work_rx, &work_tx, &result_tx, in_flight, mode);
            });
        }
    });
    drop(result_tx);

    let mut total = Partial::default();
    for partial in result_rx.iter() {
        total.merge(partial);
    }
    total
}

/// Worker thread: pulls directories, scans them, queues subdirectories, and
/// reports its private partial once the queue has drained.
fn walker_thread(
    work_rx: &channel::Receiver<PathBuf>,
    work_tx: &channel::Sender<PathBuf>,
    result_tx: &channel::Sender<Partial>,
    in_flight: &AtomicUsize,
    mode: SnapshotMode,
) {
    let mut partial = Partial::default();
    let mut children = Vec::new();

    loop {
        match work_rx.recv_timeout(IDLE_POLL) {
            Ok(dir) => {
                scan_directory(&dir, mode, &mut partial, Some(&mut children));
                // Children are counted before this directory is retired, so the
                // counter cannot touch zero while work remains.
                in_flight.fetch_add(children.len(), Ordering::AcqRel);
                for child in children.drain(..) {
                    let _ = work_tx.send(child);
                }
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                if in_flight.load(Ordering::Acquire) == 0 {
                    break;
                }
            }
            Err(channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    let _ = result_tx.send(partial);
}

fn scan_directory(
    dir: &Path,
    mode: SnapshotMode,
    partial: &mut Partial,
    subdirs: Option<&mut Vec<PathBuf>>,
) {
    // Vanished or unreadable subdirectory: skip the subtree.
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    scan_entries(entries, mode, partial, subdirs);
}

fn scan_entries(
    entries: fs::ReadDir,
    mode: SnapshotMode,
    partial: &mut Partial,
    mut subdirs: Option<&mut Vec<PathBuf>>,
) {
    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        // file_type() does not follow symlinks and is usually free.
        let Ok(ft) = entry.file_type() else {
            continue;
        };
        if ft.is_symlink() {
            continue;
        }
        if ft.is_dir() {
            if let Some(pending) = subdirs.as_deref_mut() {
                pending.push(entry.path());
            }
            continue;
        }
        if !ft.is_file() {
            continue;
        }

        match mode {
            SnapshotMode::Aggregate => {
                // A file that vanished between listing and stat is skipped.
                if let Ok(meta) = entry.metadata() {
                    partial.total_bytes = partial.total_bytes.saturating_add(meta.len());
                    partial.total_files += 1;
                }
            }
            SnapshotMode::Membership => {
                partial.total_files += 1;
                partial.files.push(entry.path());
            }
        }
    }
}
