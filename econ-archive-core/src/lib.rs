//! Econ Archive core — mirror a daily published economy dataset.
//!
//! This crate contains everything except the CLI surface:
//! - Date keys (`YEAR_MONTH_DAY`, unpadded) shared by URLs and directory names
//! - Remote artifact source over blocking HTTP, with an explicit retry policy
//! - On-disk day store with atomic writes and a `latest` pointer
//! - Fetch-or-skip routine for a single day
//! - Backfill orchestrator with a bounded worker pool

pub mod backfill;
pub mod config;
pub mod date_key;
pub mod fetch;
pub mod progress;
pub mod remote;
pub mod store;

pub use backfill::{run_backfill, BackfillSummary};
pub use config::{ArchiveConfig, ConfigError, RetryConfig};
pub use date_key::DateKey;
pub use fetch::{fetch_day, DayOutcome};
pub use progress::{FetchProgress, SilentProgress, StdoutProgress};
pub use remote::{Artifact, ArtifactSource, FetchError, HttpSource, RetryPolicy};
pub use store::{ArchiveStore, DayStatus, Layout};
