//! Content fingerprints of target sources

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// Prefix of directory digests
const DIR_DIGEST_PREFIX: &str = "h1:";

/// Resolved source path → content digest.
///
/// Comparison is full key/value equality; the order patterns were listed in
/// has no effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, String>);

impl Snapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the digest of a path
    pub fn insert(&mut self, path: impl Into<String>, digest: impl Into<String>) {
        self.0.insert(path.into(), digest.into());
    }

    /// Iterate over (path, digest) pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of paths
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no path was matched
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Computes snapshots for source patterns relative to a project root
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    root: PathBuf,
}

impl Fingerprinter {
    /// Create a fingerprinter for a project root
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root patterns are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expand every pattern and digest each matched path.
    ///
    /// Patterns matching nothing contribute nothing. Any path that can't be
    /// read fails the whole snapshot.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn fingerprint(&self, patterns: &[String]) -> Result<Snapshot, FingerprintError> {
        let mut snapshot = Snapshot::new();

        for pattern in patterns {
            let matched = self.expand(pattern)?;
            if matched.is_empty() {
                debug!(pattern = %pattern, "pattern matched nothing");
            }
            for path in matched {
                let digest = hash_path(&path)?;
                trace!(path = %path.display(), digest = %digest, "hashed source");
                snapshot.insert(self.key_for(&path), digest);
            }
        }

        debug!(paths = snapshot.len(), "sources fingerprinted");
        Ok(snapshot)
    }

    /// Expand a single pattern to the paths it matches
    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>, FingerprintError> {
        let full_pattern = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            let root = glob::Pattern::escape(&self.root.to_string_lossy());
            Path::new(&root).join(pattern).to_string_lossy().to_string()
        };

        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let paths =
            glob::glob_with(&full_pattern, options).map_err(|source| FingerprintError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;

        paths
            .map(|entry| {
                entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    FingerprintError::Unreadable {
                        path,
                        source: e.into(),
                    }
                })
            })
            .collect()
    }

    /// Snapshot key for a path: relative to the root when under it
    fn key_for(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

/// Digest a file or a whole directory tree
pub fn hash_path(path: &Path) -> Result<String, FingerprintError> {
    let metadata = fs::metadata(path).map_err(|e| FingerprintError::unreadable(path, e))?;
    if metadata.is_dir() {
        hash_dir(path)
    } else {
        hash_file(path).map(|digest| BASE64.encode(digest))
    }
}

/// SHA-256 of a file's bytes
fn hash_file(path: &Path) -> Result<Vec<u8>, FingerprintError> {
    let mut file = fs::File::open(path).map_err(|e| FingerprintError::unreadable(path, e))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| FingerprintError::unreadable(path, e))?;
    Ok(hasher.finalize().to_vec())
}

/// Digest of a directory tree.
///
/// Every non-directory entry below `dir` contributes a line
/// `"<hex sha256>  <relative/name>\n"`; lines are sorted by name and the
/// summary is hashed again. Only names and contents take part.
fn hash_dir(dir: &Path) -> Result<String, FingerprintError> {
    let mut files: Vec<(String, PathBuf)> = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            FingerprintError::Unreadable {
                path,
                source: e.into(),
            }
        })?;

        if entry.file_type().is_dir() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .unwrap_or(entry.path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push((relative, entry.into_path()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = String::new();
    for (name, path) in &files {
        let digest = hash_file(path)?;
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        summary.push_str(&hex);
        summary.push_str("  ");
        summary.push_str(name);
        summary.push('\n');
    }

    let digest = Sha256::digest(summary.as_bytes());
    Ok(format!("{}{}", DIR_DIGEST_PREFIX, BASE64.encode(digest)))
}

/// Fingerprinting errors
#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    /// Source pattern is not a valid glob
    #[error("Invalid source pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Source path could not be read
    #[error("Can't open src {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FingerprintError {
    fn unreadable(path: &Path, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }
}
