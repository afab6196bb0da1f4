//! Integration tests for the backfill orchestrator, driven by an in-memory
//! artifact source. No network.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::NaiveDate;
use econ_archive_core::{
    fetch_day, run_backfill, ArchiveStore, Artifact, ArtifactSource, DateKey, DayOutcome,
    FetchError, Layout, SilentProgress,
};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_data_dir(tag: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "econ_backfill_{tag}_{}_{id}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn key(y: i32, m: u32, d: u32) -> DateKey {
    DateKey::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn fake_body(key: &DateKey, artifact: Artifact) -> Vec<u8> {
    match artifact {
        Artifact::Summary => serde_json::json!({ "date": key.to_string(), "items": {} })
            .to_string()
            .into_bytes(),
        // Opaque bytes with a gzip magic prefix; never decompressed.
        Artifact::Ships | Artifact::Log => vec![0x1f, 0x8b, 0x08, 0x00, 0x01, 0x02, 0x03],
    }
}

/// In-memory source: `(day, artifact) -> body`; anything absent is a 404.
struct MapSource {
    bodies: HashMap<(DateKey, Artifact), Vec<u8>>,
    calls: AtomicUsize,
}

impl MapSource {
    fn new() -> Self {
        Self {
            bodies: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn publish_day(&mut self, key: DateKey) {
        for artifact in Artifact::ALL {
            self.bodies
                .insert((key, artifact), fake_body(&key, artifact));
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ArtifactSource for MapSource {
    fn fetch(&self, key: &DateKey, artifact: Artifact) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(&(*key, artifact))
            .cloned()
            .ok_or(FetchError::NotFound {
                key: *key,
                artifact,
            })
    }
}

#[test]
fn three_day_backfill_writes_every_artifact() {
    let root = temp_data_dir("three_day");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 25)) {
        source.publish_day(k);
    }

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 25),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    assert!(summary.all_succeeded());

    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 25)) {
        assert!(store.is_complete(&k), "day {k} should be complete");
        let body = fs::read(store.artifact_path(&k, Artifact::Summary)).unwrap();
        assert_eq!(body, fake_body(&k, Artifact::Summary), "bodies are verbatim");
    }
    assert_eq!(store.read_latest(), Some(key(2022, 11, 25)));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn complete_day_is_skipped_without_network_calls() {
    let root = temp_data_dir("skip");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 25)) {
        source.publish_day(k);
    }

    // 2022_11_24 already has all three files on disk.
    let existing = key(2022, 11, 24);
    store.ensure_day_dir(&existing).unwrap();
    for artifact in Artifact::ALL {
        store
            .write_artifact(&existing, artifact, &fake_body(&existing, artifact))
            .unwrap();
    }

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 25),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);
    // Only the two missing days hit the source: 2 days x 3 artifacts.
    assert_eq!(source.calls(), 6);
    assert_eq!(store.read_latest(), Some(key(2022, 11, 25)));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn rerun_over_a_complete_archive_fetches_nothing() {
    let root = temp_data_dir("rerun");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 25)) {
        source.publish_day(k);
    }

    run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 25),
        5,
        &SilentProgress,
    )
    .unwrap();
    let calls_after_first = source.calls();

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 25),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(source.calls(), calls_after_first, "second run is all skips");
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 0);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn unpublished_day_is_counted_failed_and_run_continues() {
    let root = temp_data_dir("missing");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    // 2022_11_26 is never published.
    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 25)) {
        source.publish_day(k);
    }

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 26),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);

    // The failed day's directory exists but holds no files.
    let missing = key(2022, 11, 26);
    let dir = store.day_dir(&missing);
    assert!(dir.is_dir());
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    assert!(!store.is_complete(&missing));

    // The pointer still moves to the end day.
    assert_eq!(store.read_latest(), Some(missing));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn partially_published_day_gets_no_partial_files() {
    let root = temp_data_dir("partial");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    // Only the summary exists remotely; ships.json.gz will 404.
    let k = key(2022, 11, 26);
    source
        .bodies
        .insert((k, Artifact::Summary), fake_body(&k, Artifact::Summary));

    let outcome = fetch_day(&store, &source, &k).unwrap();

    assert!(matches!(
        outcome,
        DayOutcome::Failed(FetchError::NotFound { .. })
    ));
    assert_eq!(fs::read_dir(store.day_dir(&k)).unwrap().count(), 0);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn pointer_moves_even_when_the_end_day_failed() {
    let root = temp_data_dir("pointer");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let source = MapSource::new(); // nothing published at all

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 24),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.failed, 2);
    assert_eq!(store.read_latest(), Some(key(2022, 11, 24)));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn pointer_replaces_a_plain_directory_left_behind() {
    let root = temp_data_dir("pointer_dir");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    source.publish_day(key(2022, 11, 23));

    // Simulate a pointer that was materialized as a real directory.
    fs::create_dir_all(root.join("latest")).unwrap();

    run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 23),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(store.read_latest(), Some(key(2022, 11, 23)));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn single_worker_processes_the_whole_range() {
    let root = temp_data_dir("single_worker");
    let store = ArchiveStore::new(&root, Layout::DayDirs);
    let mut source = MapSource::new();
    for k in DateKey::range(key(2022, 11, 23), key(2022, 11, 27)) {
        source.publish_day(k);
    }

    let summary = run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 27),
        1,
        &SilentProgress,
    )
    .unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 5);

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn flat_layout_backfill_writes_date_suffixed_files() {
    let root = temp_data_dir("flat");
    let store = ArchiveStore::new(&root, Layout::Flat);
    let mut source = MapSource::new();
    source.publish_day(key(2022, 11, 23));

    run_backfill(
        &store,
        &source,
        key(2022, 11, 23),
        key(2022, 11, 23),
        5,
        &SilentProgress,
    )
    .unwrap();

    assert!(root.join("summary_2022_11_23.json").is_file());
    assert!(root.join("ships_2022_11_23.json.gz").is_file());
    assert!(root.join("log_2022_11_23.json.gz").is_file());
    assert_eq!(store.read_latest(), Some(key(2022, 11, 23)));

    let _ = fs::remove_dir_all(&root);
}
