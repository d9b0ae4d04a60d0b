use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::seed::{sample_snapshot, seed_snapshot, SeedList};
use crate::types::Snapshot;

/// Why the persisted snapshot was not used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Missing,
    Unreadable(String),
    Malformed(String),
    /// Parsed fine but holds no projects.
    Empty,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::Missing => f.write_str("no snapshot yet"),
            FallbackReason::Unreadable(e) => write!(f, "snapshot unreadable: {e}"),
            FallbackReason::Malformed(e) => write!(f, "snapshot malformed: {e}"),
            FallbackReason::Empty => f.write_str("snapshot has no projects"),
        }
    }
}

/// What stood in for the persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackSource {
    SeedList,
    BuiltinSample,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Persisted,
    Fallback {
        reason: FallbackReason,
        source: FallbackSource,
    },
}

#[derive(Debug, Clone)]
pub struct Loaded {
    pub snapshot: Snapshot,
    pub outcome: LoadOutcome,
}

/// The latest aggregated tree on disk, plus the seed list it falls back to.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    seed_path: Option<PathBuf>,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>, seed_path: Option<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted snapshot, or the seed snapshot, or the built-in sample.
    /// Never fails; `timestamp` stamps whichever fallback gets built.
    pub fn load(&self, timestamp: &str) -> Loaded {
        let reason = match self.read_persisted() {
            Ok(snapshot) if !snapshot.projects.is_empty() => {
                info!(path = %self.path.display(), projects = snapshot.projects.len(), "loaded snapshot");
                return Loaded {
                    snapshot,
                    outcome: LoadOutcome::Persisted,
                };
            }
            Ok(_) => FallbackReason::Empty,
            Err(reason) => reason,
        };

        let (snapshot, source) = match self.read_seed() {
            Some(seed) => (seed_snapshot(&seed, timestamp), FallbackSource::SeedList),
            None => (sample_snapshot(timestamp), FallbackSource::BuiltinSample),
        };
        match reason {
            FallbackReason::Missing => info!(?source, "{reason}, using fallback"),
            _ => warn!(?source, path = %self.path.display(), "{reason}, using fallback"),
        }
        Loaded {
            snapshot,
            outcome: LoadOutcome::Fallback { reason, source },
        }
    }

    /// Replaces the persisted snapshot. Readers see either the old or the new file.
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let body = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.path, &body)
    }

    fn read_persisted(&self) -> Result<Snapshot, FallbackReason> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(FallbackReason::Missing),
            Err(e) => return Err(FallbackReason::Unreadable(e.to_string())),
        };
        serde_json::from_str(&content).map_err(|e| FallbackReason::Malformed(e.to_string()))
    }

    fn read_seed(&self) -> Option<SeedList> {
        SeedList::read_usable(self.seed_path.as_ref()?)
    }
}

/// Writes `body` to a temporary file next to `path` and renames it into place.
/// The result keeps the permissions of the file it replaces, or gets 0644 when new.
pub fn write_atomic(path: &Path, body: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory: {}", dir.display()))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(body)?;
    tmp.flush()?;
    let perms = fs::metadata(path).ok().map(|m| m.permissions()).or_else(new_file_permissions);
    if let Some(perms) = perms {
        tmp.as_file()
            .set_permissions(perms)
            .with_context(|| format!("failed to set permissions for {}", path.display()))?;
    }
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_everything_yields_sample() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("snap.json"), Some(dir.path().join("seed.json")));
        let loaded = store.load("t");
        assert_eq!(
            loaded.outcome,
            LoadOutcome::Fallback {
                reason: FallbackReason::Missing,
                source: FallbackSource::BuiltinSample
            }
        );
        assert_eq!(loaded.snapshot.projects.len(), 15);
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_leaves_files_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let fresh = dir.path().join("board.html");
        write_atomic(&fresh, b"<html></html>").unwrap();
        assert_eq!(mode(&fresh), 0o644);

        let existing = dir.path().join("snap.json");
        fs::write(&existing, "{}").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o640)).unwrap();
        SnapshotStore::new(&existing, None).save(&Snapshot::new(vec![], "t")).unwrap();
        assert_eq!(mode(&existing), 0o640);
    }
}
