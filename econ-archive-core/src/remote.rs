//! Remote artifact source.
//!
//! The `ArtifactSource` trait abstracts the published endpoint so the fetch
//! and backfill routines can be driven against a mock in tests. `HttpSource`
//! is the production implementation over a blocking reqwest client.

use crate::date_key::DateKey;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Endpoint serving `{base}/{DateKey}/{artifact}`.
pub const DEFAULT_BASE_URL: &str = "https://pub.drednot.io/prod/econ";

/// The three files published for each day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    Summary,
    Ships,
    Log,
}

impl Artifact {
    /// Fetch order: summary first, then the two compressed dumps.
    pub const ALL: [Artifact; 3] = [Artifact::Summary, Artifact::Ships, Artifact::Log];

    /// File name on the remote endpoint; also the canonical local name.
    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::Summary => "summary.json",
            Artifact::Ships => "ships.json.gz",
            Artifact::Log => "log.json.gz",
        }
    }

    /// Stem for the flat layout (`summary_2022_11_23.json`).
    pub fn stem(&self) -> &'static str {
        match self {
            Artifact::Summary => "summary",
            Artifact::Ships => "ships",
            Artifact::Log => "log",
        }
    }

    /// Extension for the flat layout, including the leading dot.
    pub fn ext(&self) -> &'static str {
        match self {
            Artifact::Summary => ".json",
            Artifact::Ships | Artifact::Log => ".json.gz",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Structured error types for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The remote has no published data for this day. Expected for future
    /// and never-published dates; informational, never retried.
    #[error("no data published for {key}/{artifact}")]
    NotFound { key: DateKey, artifact: Artifact },

    /// Any other non-2xx status. Transient; contained to the day.
    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// Connect/timeout/transport failure. Transient; contained to the day.
    #[error("network error: {0}")]
    Network(String),

    /// Filesystem failure. Systemic; aborts the whole run.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Per-day network failures are contained; filesystem errors abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Io(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Explicit retry configuration for remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff — the backfill contract.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// The daily fetch policy: three attempts, ten minutes apart.
    pub fn daily() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(600),
        }
    }

    /// Run `op` up to `max_attempts` times, sleeping `backoff` between
    /// attempts. `NotFound` returns immediately — absence of a published
    /// day is not transient.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, FetchError>,
    ) -> Result<T, FetchError> {
        let mut last_error = None;
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                std::thread::sleep(self.backoff);
            }
            match op() {
                Ok(value) => return Ok(value),
                Err(err @ FetchError::NotFound { .. }) => return Err(err),
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error
            .unwrap_or_else(|| FetchError::Network("no fetch attempts configured".into())))
    }
}

/// Trait for remote artifact sources.
///
/// The store layer sits beside this trait — sources don't know where bodies
/// end up on disk.
pub trait ArtifactSource: Send + Sync {
    /// Fetch one artifact's body for one day, verbatim.
    fn fetch(&self, key: &DateKey, artifact: Artifact) -> Result<Vec<u8>, FetchError>;
}

/// Production source: blocking HTTP GET against the published endpoint.
pub struct HttpSource {
    client: reqwest::blocking::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("econ-archive/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
        }
    }

    fn artifact_url(&self, key: &DateKey, artifact: Artifact) -> String {
        format!("{}/{key}/{}", self.base_url, artifact.file_name())
    }

    fn fetch_once(
        &self,
        url: &str,
        key: &DateKey,
        artifact: Artifact,
    ) -> Result<Vec<u8>, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                key: *key,
                artifact,
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}

impl ArtifactSource for HttpSource {
    fn fetch(&self, key: &DateKey, artifact: Artifact) -> Result<Vec<u8>, FetchError> {
        let url = self.artifact_url(key, artifact);
        self.retry.run(|| self.fetch_once(&url, key, artifact))
    }
}
