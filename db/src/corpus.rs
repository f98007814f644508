//! Decklist corpus stored as plain-text files.
//!
//! Layout: `<root>/<format>/<archetype>/decklist_<n>.txt`, one decklist per
//! file. Format and archetype directory names are normalized (lower-case,
//! spaces replaced with `_`). Files are read in file-name order, which is the
//! order they were stored in.

use std::path::{Path, PathBuf};

use deckstats_core::{DecklistSource, normalize_format};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, StoreError};

/// Root directory of a decklist corpus.
///
/// # Examples
///
/// ```no_run
/// use deckstats_core::DecklistSource;
/// use deckstats_db::CorpusDir;
///
/// let corpus = CorpusDir::new("decklists");
/// let blobs = corpus.list_decklist_blobs("Premodern", "Goblins").unwrap();
/// println!("{} decklists", blobs.len());
/// ```
#[derive(Debug, Clone)]
pub struct CorpusDir {
    root: PathBuf,
}

impl CorpusDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding one archetype's decklists.
    pub fn archetype_dir(&self, format: &str, archetype: &str) -> PathBuf {
        self.root
            .join(normalize_format(format))
            .join(normalize_format(archetype))
    }

    /// Lists the archetype directories of a format, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCorpus`] if the format directory does not
    /// exist, or [`StoreError::IoError`] if it cannot be read.
    pub fn archetypes(&self, format: &str) -> Result<Vec<String>> {
        let dir = self.root.join(normalize_format(format));
        if !dir.is_dir() {
            return Err(StoreError::InvalidCorpus {
                path: dir,
                reason: "format directory not found".to_string(),
            });
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Stores decklists as `decklist_<index>.txt`, the index zero-padded to
    /// the number of digits of the decklist count.
    ///
    /// Returns the written paths in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::IoError`] if the directory or a file cannot be
    /// written.
    pub fn store_blobs<S: AsRef<str>>(&self, format: &str, archetype: &str, blobs: &[S]) -> Result<Vec<PathBuf>> {
        let dir = self.archetype_dir(format, archetype);
        std::fs::create_dir_all(&dir)?;
        let width = blobs.len().to_string().len();
        let mut paths = Vec::with_capacity(blobs.len());
        for (i, blob) in blobs.iter().enumerate() {
            let path = dir.join(format!("decklist_{i:0width$}.txt"));
            std::fs::write(&path, blob.as_ref())?;
            paths.push(path);
        }
        debug!(dir = %dir.display(), count = paths.len(), "stored decklists");
        Ok(paths)
    }
}

impl DecklistSource for CorpusDir {
    type Error = StoreError;

    fn list_decklist_blobs(&self, format: &str, archetype: &str) -> Result<Vec<String>> {
        let dir = self.archetype_dir(format, archetype);
        if !dir.is_dir() {
            return Err(StoreError::InvalidCorpus {
                path: dir,
                reason: "archetype directory not found".to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt") {
                files.push(path);
            }
        }
        files.sort();

        let mut blobs = Vec::with_capacity(files.len());
        for path in &files {
            blobs.push(std::fs::read_to_string(path)?);
        }
        debug!(dir = %dir.display(), count = blobs.len(), "read decklist corpus");
        Ok(blobs)
    }
}

/// SHA-256 hex digest identifying an ordered set of decklist blobs.
///
/// Each blob is hashed with its byte length as prefix, so moving text
/// between blobs changes the fingerprint.
///
/// # Examples
///
/// ```
/// use deckstats_db::corpus_fingerprint;
///
/// let a = corpus_fingerprint(&["4 A", "2 B"]);
/// assert_eq!(a.len(), 64);
/// assert_ne!(a, corpus_fingerprint(&["2 B", "4 A"]));
/// assert_ne!(a, corpus_fingerprint(&["4 A2 B"]));
/// ```
pub fn corpus_fingerprint<S: AsRef<str>>(blobs: &[S]) -> String {
    let mut hasher = Sha256::new();
    for blob in blobs {
        let bytes = blob.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    format!("{:x}", hasher.finalize())
}
