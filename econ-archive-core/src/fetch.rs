//! Fetch-or-skip for a single day.

use crate::date_key::DateKey;
use crate::remote::{Artifact, ArtifactSource, FetchError};
use crate::store::ArchiveStore;

/// What happened to one day.
#[derive(Debug)]
pub enum DayOutcome {
    /// All three artifacts were fetched and written.
    Downloaded,
    /// The day was already complete on disk; no network calls were made.
    Skipped,
    /// A network-level failure left the day incomplete. The run continues.
    Failed(FetchError),
}

impl DayOutcome {
    /// Downloads and skips both count as success in the run summary.
    pub fn is_success(&self) -> bool {
        !matches!(self, DayOutcome::Failed(_))
    }
}

/// Ensure one day's artifacts exist locally, fetching any that are absent.
///
/// Network failures are contained in the returned outcome; filesystem
/// errors propagate.
pub fn fetch_day(
    store: &ArchiveStore,
    source: &dyn ArtifactSource,
    key: &DateKey,
) -> Result<DayOutcome, FetchError> {
    store.ensure_day_dir(key)?;

    if store.is_complete(key) {
        return Ok(DayOutcome::Skipped);
    }

    // Fetch all three bodies before writing anything, so a 404 partway
    // through leaves the day directory empty rather than partially written.
    let mut bodies = Vec::with_capacity(Artifact::ALL.len());
    for artifact in Artifact::ALL {
        match source.fetch(key, artifact) {
            Ok(bytes) => bodies.push((artifact, bytes)),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => return Ok(DayOutcome::Failed(err)),
        }
    }

    for (artifact, bytes) in bodies {
        store.write_artifact(key, artifact, &bytes)?;
    }

    Ok(DayOutcome::Downloaded)
}
