//! On-disk day store.
//!
//! Canonical layout: one directory per day,
//! `{root}/{DateKey}/{summary.json, ships.json.gz, log.json.gz}`, plus a
//! `latest` pointer at `{root}/latest`.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Completeness probe: a day is complete iff all three files exist;
//!   contents are never inspected
//! - Latest-pointer replacement that tolerates a pre-existing symlink or
//!   plain directory at the pointer path
//! - A date-suffixed flat layout kept as a configuration flag

use crate::date_key::DateKey;
use crate::remote::{Artifact, FetchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// How artifacts are laid out under the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One directory per day: `{root}/{key}/summary.json`.
    #[default]
    DayDirs,
    /// Date-suffixed files directly under the root: `{root}/summary_{key}.json`.
    Flat,
}

/// Completeness of one stored day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayStatus {
    pub key: DateKey,
    pub complete: bool,
}

/// The local artifact store.
pub struct ArchiveStore {
    root: PathBuf,
    layout: Layout,
}

impl ArchiveStore {
    pub fn new(root: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Directory that holds a day's artifacts. In the flat layout every day
    /// shares the root.
    pub fn day_dir(&self, key: &DateKey) -> PathBuf {
        match self.layout {
            Layout::DayDirs => self.root.join(key.to_string()),
            Layout::Flat => self.root.clone(),
        }
    }

    pub fn artifact_path(&self, key: &DateKey, artifact: Artifact) -> PathBuf {
        match self.layout {
            Layout::DayDirs => self.day_dir(key).join(artifact.file_name()),
            Layout::Flat => self
                .root
                .join(format!("{}_{key}{}", artifact.stem(), artifact.ext())),
        }
    }

    /// Idempotent create of the day's directory.
    pub fn ensure_day_dir(&self, key: &DateKey) -> Result<(), FetchError> {
        fs::create_dir_all(self.day_dir(key))?;
        Ok(())
    }

    /// True iff all three artifact files exist. This is the sole idempotency
    /// signal.
    pub fn is_complete(&self, key: &DateKey) -> bool {
        Artifact::ALL
            .iter()
            .all(|artifact| self.artifact_path(key, *artifact).exists())
    }

    /// Write one artifact body verbatim. Atomic: the body lands in a .tmp
    /// sibling first and is renamed into place.
    pub fn write_artifact(
        &self,
        key: &DateKey,
        artifact: Artifact,
        bytes: &[u8],
    ) -> Result<(), FetchError> {
        let path = self.artifact_path(key, artifact);
        let tmp = tmp_sibling(&path);

        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            FetchError::Io(e)
        })?;
        Ok(())
    }

    /// Path of the latest pointer: `{root}/latest`, or `{root}/latest.json`
    /// in the flat layout (where it references the summary file).
    pub fn latest_path(&self) -> PathBuf {
        match self.layout {
            Layout::DayDirs => self.root.join("latest"),
            Layout::Flat => self.root.join("latest.json"),
        }
    }

    fn latest_target(&self, key: &DateKey) -> String {
        match self.layout {
            Layout::DayDirs => key.to_string(),
            Layout::Flat => format!("summary_{key}.json"),
        }
    }

    /// Replace the latest pointer so it references `key`. Whatever sits at
    /// the pointer path — symlink or plain directory — is removed first.
    /// Exactly one pointer exists at a time.
    pub fn replace_latest(&self, key: &DateKey) -> Result<(), FetchError> {
        let link = self.latest_path();
        if let Ok(meta) = fs::symlink_metadata(&link) {
            if meta.file_type().is_symlink() {
                fs::remove_file(&link)?;
            } else if meta.is_dir() {
                fs::remove_dir_all(&link)?;
            } else {
                fs::remove_file(&link)?;
            }
        }
        create_pointer(&link, &self.latest_target(key))?;
        Ok(())
    }

    /// Resolve the latest pointer back to a day key, if one is set.
    pub fn read_latest(&self) -> Option<DateKey> {
        let target = read_pointer(&self.latest_path())?;
        match self.layout {
            Layout::DayDirs => target.parse().ok(),
            Layout::Flat => target
                .strip_prefix("summary_")?
                .strip_suffix(".json")?
                .parse()
                .ok(),
        }
    }

    /// Enumerate stored days and their completeness, ascending by key.
    pub fn scan(&self) -> Result<Vec<DayStatus>, FetchError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = BTreeSet::new();
        for entry in entries {
            let name = entry?.file_name().to_string_lossy().into_owned();
            match self.layout {
                Layout::DayDirs => {
                    // The `latest` pointer and stray files don't parse as keys.
                    if let Ok(key) = name.parse::<DateKey>() {
                        keys.insert(key);
                    }
                }
                Layout::Flat => {
                    for artifact in Artifact::ALL {
                        let Some(rest) = name.strip_prefix(artifact.stem()) else {
                            continue;
                        };
                        let Some(rest) = rest.strip_prefix('_') else {
                            continue;
                        };
                        let Some(date_part) = rest.strip_suffix(artifact.ext()) else {
                            continue;
                        };
                        if let Ok(key) = date_part.parse::<DateKey>() {
                            keys.insert(key);
                        }
                    }
                }
            }
        }

        Ok(keys
            .into_iter()
            .map(|key| DayStatus {
                complete: self.is_complete(&key),
                key,
            })
            .collect())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
fn create_pointer(link: &Path, target: &str) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Symlinks need elevated privileges on Windows; a plain file holding the
/// target name keeps the pointer contract.
#[cfg(not(unix))]
fn create_pointer(link: &Path, target: &str) -> io::Result<()> {
    fs::write(link, target)
}

#[cfg(unix)]
fn read_pointer(link: &Path) -> Option<String> {
    let target = fs::read_link(link).ok()?;
    Some(target.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn read_pointer(link: &Path) -> Option<String> {
    fs::read_to_string(link).ok()
}
