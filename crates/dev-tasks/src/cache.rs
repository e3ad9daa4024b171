//! Per-target fingerprint cache

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use dev_core::config::CACHE_DIR_NAME;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fingerprint::{FingerprintError, Fingerprinter, Snapshot};
use crate::target::TargetSpec;

/// Persisted fingerprints of a target's last successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Target name
    #[serde(rename = "name")]
    pub target_name: String,
    /// Reserved for captured output, always empty
    #[serde(default)]
    pub output: String,
    /// Source fingerprints
    #[serde(rename = "hashes", default)]
    pub fingerprints: Snapshot,
}

impl CacheRecord {
    /// Create a record for a target
    pub fn new(target_name: impl Into<String>, fingerprints: Snapshot) -> Self {
        Self {
            target_name: target_name.into(),
            output: String::new(),
            fingerprints,
        }
    }

    /// Whether a freshly computed snapshot matches this record exactly
    pub fn matches(&self, current: &Snapshot) -> bool {
        self.fingerprints == *current
    }
}

/// Cache records stored as one JSON file per target
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Cache directory
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Create a cache store backed by a directory
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Create a cache store in `<root>/.dev`
    pub fn default_dir(root: &Path) -> Self {
        Self::new(root.join(CACHE_DIR_NAME))
    }

    /// Get the cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the record for a target
    pub fn record_path(&self, target_name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", target_name))
    }

    /// Load the record for a target.
    ///
    /// Missing, unreadable and malformed records all count as "not cached".
    pub fn load(&self, target_name: &str) -> Option<CacheRecord> {
        let path = self.record_path(target_name);

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(target_name, "no cache record");
                return None;
            }
            Err(e) => {
                warn!(target_name, path = %path.display(), error = %e, "cache record unreadable, ignoring");
                return None;
            }
        };

        match serde_json::from_str::<CacheRecord>(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(target_name, path = %path.display(), error = %e, "cache record malformed, ignoring");
                None
            }
        }
    }

    /// Whether the stored record for a target matches `current`
    pub fn is_valid(&self, target_name: &str, current: &Snapshot) -> bool {
        let valid = self
            .load(target_name)
            .is_some_and(|record| record.matches(current));
        debug!(target_name, valid, "cache validity checked");
        valid
    }

    /// Record the current fingerprints of a target's sources.
    ///
    /// Does nothing for targets without caching. Returns the path written.
    pub fn save(
        &self,
        target: &TargetSpec,
        fingerprinter: &Fingerprinter,
    ) -> Result<Option<PathBuf>, CacheError> {
        if !target.cache_enabled {
            debug!(target_name = %target.name, "caching disabled, not saving");
            return Ok(None);
        }

        let fingerprints = fingerprinter.fingerprint(&target.sources)?;
        let record = CacheRecord::new(&target.name, fingerprints);
        let path = self.write(&record)?;

        info!(target_name = %target.name, path = %path.display(), paths = record.fingerprints.len(), "cache saved");
        Ok(Some(path))
    }

    /// Write a record, replacing any previous one
    pub fn write(&self, record: &CacheRecord) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| CacheError::CreateDir {
            path: self.cache_dir.clone(),
            source,
        })?;

        let path = self.record_path(&record.target_name);
        let json = serde_json::to_string_pretty(record).map_err(CacheError::Json)?;

        let mut file = fs::File::create(&path).map_err(|source| CacheError::Write {
            target: record.target_name.clone(),
            source,
        })?;
        file.write_all(json.as_bytes())
            .map_err(|source| CacheError::Write {
                target: record.target_name.clone(),
                source,
            })?;

        Ok(path)
    }
}

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Cache directory could not be created
    #[error("Can't create cache directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record file could not be written
    #[error("Can't save cache for target {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization error
    #[error("Cache serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sources could not be fingerprinted
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_target() -> TargetSpec {
        TargetSpec::new("build")
            .with_command("echo hi")
            .with_source("src/*.go")
            .with_cache(true)
    }

    fn setup() -> (TempDir, Fingerprinter, CacheStore) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src/main.go"), "package main").unwrap();
        let fingerprinter = Fingerprinter::new(temp.path());
        let store = CacheStore::default_dir(temp.path());
        (temp, fingerprinter, store)
    }

    #[test]
    fn test_record_path() {
        let store = CacheStore::default_dir(Path::new("/project"));
        assert_eq!(
            store.record_path("build"),
            Path::new("/project").join(".dev").join("build.json")
        );
    }

    #[test]
    fn test_save_and_validate() {
        let (_temp, fingerprinter, store) = setup();
        let target = build_target();

        let path = store.save(&target, &fingerprinter).unwrap().unwrap();
        assert!(path.exists());

        let current = fingerprinter.fingerprint(&target.sources).unwrap();
        assert!(store.is_valid("build", &current));

        let record = store.load("build").unwrap();
        assert_eq!(record.target_name, "build");
        assert_eq!(record.output, "");
        assert_eq!(record.fingerprints.len(), 1);
    }

    #[test]
    fn test_record_json_fields() {
        let (_temp, fingerprinter, store) = setup();
        let path = store.save(&build_target(), &fingerprinter).unwrap().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["name"], "build");
        assert_eq!(value["output"], "");
        assert!(value["hashes"].is_object());
    }

    #[test]
    fn test_save_disabled_is_noop() {
        let (_temp, fingerprinter, store) = setup();
        let target = build_target().with_cache(false);

        assert!(store.save(&target, &fingerprinter).unwrap().is_none());
        assert!(!store.cache_dir().exists());
    }

    #[test]
    fn test_missing_record_is_invalid() {
        let (_temp, _fingerprinter, store) = setup();
        assert!(store.load("build").is_none());
        assert!(!store.is_valid("build", &Snapshot::new()));
    }

    #[test]
    fn test_corrupt_record_is_invalid() {
        let (_temp, _fingerprinter, store) = setup();
        fs::create_dir_all(store.cache_dir()).unwrap();
        fs::write(store.record_path("build"), "{not json").unwrap();

        assert!(store.load("build").is_none());
        assert!(!store.is_valid("build", &Snapshot::new()));
    }

    #[test]
    fn test_any_difference_invalidates() {
        let (_temp, _fingerprinter, store) = setup();
        let mut stored = Snapshot::new();
        stored.insert("a.txt", "aaa");
        stored.insert("b.txt", "bbb");
        store.write(&CacheRecord::new("build", stored.clone())).unwrap();

        assert!(store.is_valid("build", &stored));

        let mut changed = stored.clone();
        changed.insert("b.txt", "ccc");
        assert!(!store.is_valid("build", &changed));

        let mut added = stored.clone();
        added.insert("c.txt", "ccc");
        assert!(!store.is_valid("build", &added));

        let mut removed = Snapshot::new();
        removed.insert("a.txt", "aaa");
        assert!(!store.is_valid("build", &removed));
    }

    #[test]
    fn test_save_overwrites() {
        let (temp, fingerprinter, store) = setup();
        let target = build_target();

        store.save(&target, &fingerprinter).unwrap();
        fs::write(temp.path().join("src/util.go"), "package main").unwrap();
        store.save(&target, &fingerprinter).unwrap();

        assert_eq!(store.load("build").unwrap().fingerprints.len(), 2);
    }

    #[test]
    fn test_save_fails_when_directory_is_a_file() {
        let (temp, fingerprinter, _store) = setup();
        let blocker = temp.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();
        let store = CacheStore::new(blocker);

        let err = store.save(&build_target(), &fingerprinter).unwrap_err();
        assert!(matches!(err, CacheError::CreateDir { .. }));
    }
}
