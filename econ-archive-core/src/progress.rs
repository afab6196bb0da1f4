//! Console progress reporting for fetch runs.

use crate::backfill::BackfillSummary;
use crate::date_key::DateKey;
use crate::fetch::DayOutcome;

/// Progress callbacks for multi-day operations. Days complete in whatever
/// order the workers finish them.
pub trait FetchProgress: Send + Sync {
    /// Called when a day's fetch begins.
    fn on_start(&self, key: &DateKey);

    /// Called when a day's fetch finishes.
    fn on_day(&self, key: &DateKey, outcome: &DayOutcome);

    /// Called once after the latest pointer has moved.
    fn on_batch_complete(&self, summary: &BackfillSummary);
}

/// Prints one line per day and a final summary to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    // Start lines from parallel workers interleave; report at completion only.
    fn on_start(&self, _key: &DateKey) {}

    fn on_day(&self, key: &DateKey, outcome: &DayOutcome) {
        match outcome {
            DayOutcome::Downloaded => println!("  OK: {key}"),
            DayOutcome::Skipped => println!("  SKIP: {key} (already complete)"),
            DayOutcome::Failed(err) => println!("  FAIL: {key}: {err}"),
        }
    }

    fn on_batch_complete(&self, summary: &BackfillSummary) {
        println!(
            "\nBackfill complete: {}/{} succeeded, {} failed",
            summary.succeeded, summary.total, summary.failed
        );
        println!("latest -> {}", summary.end_key);
    }
}

/// Discards all progress events.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _key: &DateKey) {}
    fn on_day(&self, _key: &DateKey, _outcome: &DayOutcome) {}
    fn on_batch_complete(&self, _summary: &BackfillSummary) {}
}
