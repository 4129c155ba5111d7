//! Per-file staleness tracking
//!
//! The [`StampStore`] remembers the modification time and size of every file
//! the pipeline has processed successfully. Work on a file is bracketed by a
//! check/commit pair:
//!
//! ```rust,ignore
//! let stamp = stamps.check(&catalog).await?;
//! if stamp.is_unchanged() {
//!     return Ok(previous);
//! }
//! let stats = merge(&catalog).await?; // early exit: stamp dropped, nothing recorded
//! stamps.commit(stamp);
//! ```
//!
//! [`StampStore::check`] returns a [`Stamp`] token holding the signal observed
//! at check time. Only [`StampStore::commit`] records it; dropping the token on
//! an error path leaves the stored fingerprint untouched so the next run
//! retries the file.
//!
//! A verdict of [`Verdict::Unchanged`] requires both the modification time and
//! the size to match the stored fingerprint exactly. The force-rescan toggle
//! makes every check report [`Verdict::Changed`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::core::SweepError;

/// Cheap change signal of a file: modification time and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFingerprint {
    /// Seconds since the Unix epoch (negative before it)
    pub mtime_secs: i64,
    /// Sub-second part of the modification time
    pub mtime_nanos: u32,
    /// File size in bytes
    pub size: u64,
}

impl FileFingerprint {
    pub fn from_metadata(metadata: &Metadata) -> std::io::Result<Self> {
        let modified = metadata.modified()?;
        let (mtime_secs, mtime_nanos) = match modified.duration_since(UNIX_EPOCH) {
            Ok(d) => (i64::try_from(d.as_secs()).unwrap_or(i64::MAX), d.subsec_nanos()),
            Err(e) => {
                let d = e.duration();
                (-i64::try_from(d.as_secs()).unwrap_or(i64::MAX), d.subsec_nanos())
            }
        };
        Ok(Self {
            mtime_secs,
            mtime_nanos,
            size: metadata.len(),
        })
    }

    /// Reads the current fingerprint of `path`.
    pub async fn read(path: &Path) -> Result<Self, SweepError> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SweepError::missing("file", path));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self::from_metadata(&metadata)?)
    }
}

/// Result of comparing a file against its stored fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Stored fingerprint matches exactly; skip the file
    Unchanged,
    /// No stored fingerprint, a mismatch, or a forced rescan; reprocess
    Changed,
}

/// Token for one unit of work on one file.
///
/// Produced by [`StampStore::check`], consumed by [`StampStore::commit`].
#[must_use = "a stamp records nothing unless committed"]
#[derive(Debug)]
pub struct Stamp {
    path: PathBuf,
    observed: FileFingerprint,
    verdict: Verdict,
}

impl Stamp {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_unchanged(&self) -> bool {
        self.verdict == Verdict::Unchanged
    }

    pub fn is_changed(&self) -> bool {
        self.verdict == Verdict::Changed
    }
}

/// Persistent fingerprint table, keyed by absolute path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StampStore {
    #[serde(default)]
    fingerprints: BTreeMap<PathBuf, FileFingerprint>,

    #[serde(skip)]
    force_rescan: bool,
}

impl StampStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn set_force_rescan(&mut self, force: bool) {
        self.force_rescan = force;
    }

    pub const fn force_rescan(&self) -> bool {
        self.force_rescan
    }

    fn key(path: &Path) -> PathBuf {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }

    /// Compares the current signal of `path` with the stored fingerprint.
    ///
    /// # Errors
    ///
    /// [`SweepError::MissingInput`] if the file does not exist.
    pub async fn check(&self, path: &Path) -> Result<Stamp, SweepError> {
        let key = Self::key(path);
        let observed = FileFingerprint::read(&key).await?;

        let verdict = if self.force_rescan {
            Verdict::Changed
        } else {
            match self.fingerprints.get(&key) {
                Some(stored) if *stored == observed => Verdict::Unchanged,
                _ => Verdict::Changed,
            }
        };

        tracing::trace!(target: "stamps", "{}: {:?}", key.display(), verdict);
        Ok(Stamp {
            path: key,
            observed,
            verdict,
        })
    }

    /// Records the signal observed when `stamp` was checked.
    pub fn commit(&mut self, stamp: Stamp) {
        tracing::trace!(target: "stamps", "commit {}", stamp.path.display());
        self.fingerprints.insert(stamp.path, stamp.observed);
    }

    /// Drops the stored fingerprint so the next check reports a change.
    pub fn forget(&mut self, path: &Path) {
        self.fingerprints.remove(&Self::key(path));
    }

    pub fn fingerprint(&self, path: &Path) -> Option<&FileFingerprint> {
        self.fingerprints.get(&Self::key(path))
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn set_mtime(path: &Path, offset_secs: u64) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000 + offset_secs))
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_file_is_changed() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("de.po");
        std::fs::write(&file, "msgid \"\"").unwrap();

        let store = StampStore::new();
        let stamp = store.check(&file).await.unwrap();
        assert_eq!(stamp.verdict(), Verdict::Changed);
    }

    #[tokio::test]
    async fn test_commit_then_unchanged() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("de.po");
        std::fs::write(&file, "content").unwrap();

        let mut store = StampStore::new();
        let stamp = store.check(&file).await.unwrap();
        store.commit(stamp);

        assert!(store.check(&file).await.unwrap().is_unchanged());
    }

    #[tokio::test]
    async fn test_dropped_stamp_records_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("index.page");
        std::fs::write(&file, "<page/>").unwrap();

        let mut store = StampStore::new();
        let result: Result<(), SweepError> = async {
            let stamp = store.check(&file).await?;
            let parsed: Result<(), SweepError> = Err(SweepError::parse("index.page", "broken"));
            parsed?;
            store.commit(stamp);
            Ok(())
        }
        .await;
        assert!(result.is_err());
        assert!(store.is_empty());
        assert!(store.check(&file).await.unwrap().is_changed());
    }

    #[tokio::test]
    async fn test_mtime_change_detected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("LINGUAS");
        std::fs::write(&file, "de\n").unwrap();
        set_mtime(&file, 0);

        let mut store = StampStore::new();
        let stamp = store.check(&file).await.unwrap();
        store.commit(stamp);

        set_mtime(&file, 10);
        assert!(store.check(&file).await.unwrap().is_changed());
    }

    #[tokio::test]
    async fn test_size_change_with_same_mtime_detected() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("LINGUAS");
        std::fs::write(&file, "de\n").unwrap();
        set_mtime(&file, 0);

        let mut store = StampStore::new();
        let stamp = store.check(&file).await.unwrap();
        store.commit(stamp);

        std::fs::write(&file, "de fr\n").unwrap();
        set_mtime(&file, 0);
        assert!(store.check(&file).await.unwrap().is_changed());
    }

    #[tokio::test]
    async fn test_force_rescan() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("C.page");
        std::fs::write(&file, "x").unwrap();

        let mut store = StampStore::new();
        let stamp = store.check(&file).await.unwrap();
        store.commit(stamp);

        store.set_force_rescan(true);
        assert!(store.check(&file).await.unwrap().is_changed());
    }

    #[tokio::test]
    async fn test_missing_file_is_missing_input() {
        let temp = TempDir::new().unwrap();
        let err = StampStore::new().check(&temp.path().join("gone.po")).await.unwrap_err();
        assert!(matches!(err, SweepError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn test_serde_skips_force_flag() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.page");
        std::fs::write(&file, "x").unwrap();

        let mut store = StampStore::new();
        store.set_force_rescan(true);
        let stamp = store.check(&file).await.unwrap();
        store.commit(stamp);

        let json = serde_json::to_string(&store).unwrap();
        let restored: StampStore = serde_json::from_str(&json).unwrap();
        assert!(!restored.force_rescan());
        assert_eq!(restored.fingerprint(&file), store.fingerprint(&file));
    }
}
