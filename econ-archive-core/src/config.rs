//! Run configuration.
//!
//! `Default` reproduces the constants the scheduled jobs run with; a TOML
//! file or CLI flags can override any of them.

use crate::date_key::DateKey;
use crate::remote::{RetryPolicy, DEFAULT_BASE_URL};
use crate::store::Layout;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Retry settings as they appear in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_secs: u64,
}

impl Default for RetryConfig {
    /// The backfill contract: a single attempt per artifact.
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff_secs: 0,
        }
    }
}

impl RetryConfig {
    /// The daily single-day policy: three attempts, ten minutes apart.
    pub fn daily() -> Self {
        Self {
            max_attempts: 3,
            backoff_secs: 600,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_secs(self.backoff_secs),
        }
    }
}

/// Archive-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Remote endpoint serving `{base_url}/{DateKey}/{artifact}`.
    pub base_url: String,

    /// Local data root.
    pub data_dir: PathBuf,

    /// First day with published data.
    pub start_date: NaiveDate,

    /// Worker pool size for the backfill.
    pub workers: usize,

    /// On-disk layout.
    pub layout: Layout,

    /// Retry policy for remote fetches. Last so TOML serialization emits
    /// scalar values before the table.
    pub retry: RetryConfig,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            start_date: NaiveDate::from_ymd_opt(2022, 11, 23).unwrap(),
            workers: 5,
            layout: Layout::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn start_key(&self) -> DateKey {
        DateKey::new(self.start_date)
    }
}
