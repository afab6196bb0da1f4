//! Historical backfill orchestrator.
//!
//! Enumerates every day from the start key to the end key inclusive,
//! dispatches each onto a bounded worker pool, and swaps the `latest`
//! pointer once after all workers have joined. One day's failure or delay
//! never blocks the others; only filesystem errors abort the run.

use std::sync::mpsc;

use crate::date_key::DateKey;
use crate::fetch::fetch_day;
use crate::progress::FetchProgress;
use crate::remote::{ArtifactSource, FetchError};
use crate::store::ArchiveStore;

/// Aggregate result of a backfill run.
#[derive(Debug, Clone)]
pub struct BackfillSummary {
    /// Days considered.
    pub total: usize,
    /// Downloads plus skips.
    pub succeeded: usize,
    /// Days left incomplete by a network failure.
    pub failed: usize,
    /// The day the latest pointer references after the run.
    pub end_key: DateKey,
}

impl BackfillSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Run the backfill over `[start, end]` with `workers` parallel fetches.
///
/// Days are partitioned across the pool; no two workers touch the same
/// day's files, so no locking is needed. Results are gathered over a
/// channel in completion order. The pointer swap happens on the calling
/// thread, unconditionally, after the pool has joined — even when the end
/// day itself failed or was skipped.
pub fn run_backfill(
    store: &ArchiveStore,
    source: &dyn ArtifactSource,
    start: DateKey,
    end: DateKey,
    workers: usize,
    progress: &dyn FetchProgress,
) -> Result<BackfillSummary, FetchError> {
    let keys: Vec<DateKey> = DateKey::range(start, end).collect();
    let total = keys.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("econ-fetch-{i}"))
        .build()
        .expect("failed to build fetch worker pool");

    let (tx, rx) = mpsc::channel();
    pool.scope(|scope| {
        for key in &keys {
            let tx = tx.clone();
            scope.spawn(move |_| {
                progress.on_start(key);
                let result = fetch_day(store, source, key);
                if let Ok(outcome) = &result {
                    progress.on_day(key, outcome);
                }
                let _ = tx.send(result);
            });
        }
    });
    drop(tx);

    let mut succeeded = 0;
    let mut failed = 0;
    let mut fatal = None;
    for result in rx {
        match result {
            Ok(outcome) if outcome.is_success() => succeeded += 1,
            Ok(_) => failed += 1,
            Err(err) => {
                fatal.get_or_insert(err);
            }
        }
    }
    if let Some(err) = fatal {
        return Err(err);
    }

    store.replace_latest(&end)?;

    let summary = BackfillSummary {
        total,
        succeeded,
        failed,
        end_key: end,
    };
    progress.on_batch_complete(&summary);
    Ok(summary)
}
