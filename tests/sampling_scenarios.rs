//! End-to-end sampling scenarios: real tree walks, deterministic time.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tree_growth_monitor::prelude::*;

fn write_files(dir: &Path, count: usize, bytes_each: usize) {
    for i in 0..count {
        fs::write(dir.join(format!("f{i:02}.dat")), vec![7u8; bytes_each]).unwrap();
    }
}

fn walker(root: &Path, mode: SnapshotMode, recursive: bool) -> TreeWalker {
    TreeWalker::new(WalkerConfig {
        root: root.to_path_buf(),
        recursive,
        mode,
        parallelism: 2,
    })
}

fn sampler_config(cadence_secs: u64, max_secs: u64, intervals: &[f64]) -> SamplerConfig {
    SamplerConfig::new(
        Duration::from_secs(cadence_secs),
        Duration::from_secs(max_secs),
        IntervalSpec::new(intervals).unwrap(),
    )
    .unwrap()
}

/// 10 files / 1000 bytes; after one tick, +2 files (300 bytes) and -1 file (50 bytes).
fn seed_ten_files(root: &Path) {
    fs::write(root.join("small.dat"), vec![0u8; 50]).unwrap();
    fs::write(root.join("medium.dat"), vec![0u8; 150]).unwrap();
    write_files(root, 8, 100);
}

fn ten_file_clock(root: &Path) -> ManualClock {
    let mutate_root = root.to_path_buf();
    ManualClock::new().with_sleep_hook(move |_| {
        fs::write(mutate_root.join("new-a.dat"), vec![1u8; 150]).unwrap();
        fs::write(mutate_root.join("new-b.dat"), vec![1u8; 150]).unwrap();
        fs::remove_file(mutate_root.join("small.dat")).unwrap();
    })
}

#[test]
fn ten_file_growth_scenario() {
    let tmp = TempDir::new().unwrap();
    seed_ten_files(tmp.path());
    let clock = ten_file_clock(tmp.path());

    let source = walker(tmp.path(), SnapshotMode::Aggregate, true);
    let result = Sampler::new(sampler_config(10, 10, &[])).run(&source, &clock, &CancelToken::new());

    assert_eq!(result.termination, Termination::Completed);
    assert_eq!(result.ticks, 2);
    assert_eq!(result.start_snapshot.total_bytes(), Some(1_000));
    assert_eq!(result.start_snapshot.file_count(), 10);
    assert_eq!(result.end_snapshot.total_bytes(), Some(1_250));
    assert_eq!(result.end_snapshot.file_count(), 11);

    let delta = result.delta();
    assert_eq!(delta.net_bytes, Some(250));
    assert_eq!(delta.net_files, 1);

    let bytes = result.forecast().bytes.unwrap();
    assert!((bytes.per_second - 25.0).abs() < 1e-9);
    assert!((bytes.projection(Horizon::Day) - 2_160_000.0).abs() < 1e-3);
    assert!(render_growth(&result).contains("250.00 B"));
}

#[test]
fn ten_file_membership_scenario() {
    let tmp = TempDir::new().unwrap();
    seed_ten_files(tmp.path());
    let clock = ten_file_clock(tmp.path());

    let source = walker(tmp.path(), SnapshotMode::Membership, true);
    let result = Sampler::new(sampler_config(10, 10, &[])).run(&source, &clock, &CancelToken::new());

    assert_eq!(result.running_totals, Some(RunningTotals { added: 2, removed: 1 }));
    assert_eq!(result.delta().net_files, 1);
    assert_eq!(result.delta().net_bytes, None);
}

#[test]
fn membership_churn_over_real_tree() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_files(&root, 4, 1);

    let mutate_root = root.clone();
    let clock = ManualClock::new().with_sleep_hook(move |elapsed| match elapsed.as_secs() {
        1 => fs::write(mutate_root.join("late.dat"), b"x").unwrap(),
        2 => {
            fs::remove_file(mutate_root.join("f00.dat")).unwrap();
            fs::remove_file(mutate_root.join("f01.dat")).unwrap();
        }
        3 => fs::remove_file(mutate_root.join("late.dat")).unwrap(),
        _ => {}
    });

    let source = walker(&root, SnapshotMode::Membership, false);
    let result = Sampler::new(sampler_config(1, 4, &[])).run(&source, &clock, &CancelToken::new());

    let totals = result.running_totals.unwrap();
    assert_eq!(totals.added, 1);
    assert_eq!(totals.removed, 3);
    assert_eq!(result.delta().net_files, -2);
    assert_eq!(
        totals.added as i64 - totals.removed as i64,
        result.delta().net_files
    );

    let churn = result.churn().unwrap();
    assert_eq!(churn.added_per_minute, Some(15.0));
    assert_eq!(churn.removed_per_minute, Some(45.0));
}

#[test]
fn interval_scenario_one_five_ten_minutes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_files(&root, 5, 1);

    // Counts 5 @ 0 min, 7 @ 3 min, 9 @ 6 min.
    let mutate_root = root.clone();
    let clock = ManualClock::new().with_sleep_hook(move |elapsed| {
        let minute = elapsed.as_secs() / 60;
        if minute == 3 || minute == 6 {
            for i in 0..2 {
                fs::write(mutate_root.join(format!("m{minute}-{i}.dat")), b"x").unwrap();
            }
        }
    });

    let source = walker(&root, SnapshotMode::Membership, true);
    let result = Sampler::new(sampler_config(180, 360, &[10.0, 1.0, 5.0]))
        .run(&source, &clock, &CancelToken::new());

    let averages: Vec<(f64, Option<f64>)> = result
        .interval_averages
        .iter()
        .map(|a| (a.minutes, a.average))
        .collect();
    assert_eq!(
        averages,
        vec![(1.0, Some(5.0)), (5.0, Some(6.0)), (10.0, Some(7.0))]
    );
}

#[test]
fn interval_longer_than_run_uses_all_samples() {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), 3, 1);
    let source = walker(tmp.path(), SnapshotMode::Membership, false);
    let clock = ManualClock::new();

    let result = Sampler::new(sampler_config(1, 3, &[0.05, 600.0]))
        .run(&source, &clock, &CancelToken::new());

    assert_eq!(result.history.len(), 4);
    assert_eq!(result.interval_averages[0].samples, 4);
    assert_eq!(result.interval_averages[1].samples, 4);
    assert_eq!(result.interval_averages[1].average, Some(3.0));
}

#[test]
fn immediate_cancellation_has_no_nan() {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), 2, 10);
    let source = walker(tmp.path(), SnapshotMode::Aggregate, true);
    let clock = ManualClock::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = Sampler::new(sampler_config(1, 3_600, &[1.0])).run(&source, &clock, &cancel);

    assert!(result.was_cancelled());
    assert_eq!(result.elapsed(), Duration::ZERO);
    let fc = result.forecast();
    assert_eq!(fc.files.per_second, 0.0);
    for horizon in Horizon::ALL {
        assert!(fc.bytes.as_ref().unwrap().projection(horizon).is_finite());
    }
    let text = render_growth(&result);
    assert!(!text.contains("NaN"));
    assert!(!text.contains("inf"));
}

#[test]
fn cancellation_from_another_thread_stops_run() {
    let tmp = TempDir::new().unwrap();
    write_files(tmp.path(), 1, 1);
    let source = walker(tmp.path(), SnapshotMode::Aggregate, false);
    let cancel = CancelToken::new();
    let remote = cancel.clone();

    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        remote.cancel();
    });
    let config = SamplerConfig::new(
        Duration::from_millis(20),
        Duration::from_secs(30),
        IntervalSpec::default(),
    )
    .unwrap();
    let result = Sampler::new(config).run(&source, &SystemClock, &cancel);
    handle.join().unwrap();

    assert_eq!(result.termination, Termination::Cancelled);
    assert!(result.elapsed() < Duration::from_secs(10));
    assert!(result.ticks >= 2);
}

#[test]
fn vanished_root_is_recorded_as_empty_ticks() {
    let tmp = TempDir::new().unwrap();
    let root: PathBuf = tmp.path().join("watched");
    fs::create_dir(&root).unwrap();
    write_files(&root, 3, 10);

    let doomed = root.clone();
    let clock = Arc::new(ManualClock::new().with_sleep_hook(move |elapsed| {
        if elapsed == Duration::from_secs(2) {
            fs::remove_dir_all(&doomed).unwrap();
        }
    }));

    let source = walker(&root, SnapshotMode::Aggregate, true);
    let result = Sampler::new(sampler_config(1, 3, &[])).run(&source, &clock, &CancelToken::new());

    assert_eq!(result.path_errors, 2);
    assert_eq!(result.end_snapshot.file_count(), 0);
    let counts: Vec<u64> = result.history.entries().iter().map(|e| e.file_count).collect();
    assert_eq!(counts, vec![3, 3, 0, 0]);
}
