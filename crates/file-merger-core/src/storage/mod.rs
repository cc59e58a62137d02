//! Flat-directory storage for merged documents.
//!
//! ## Unique names without a race
//!
//! A document is first written to a hidden staging file in the storage
//! directory. Only once it is complete and synced is it moved onto
//! `base.pdf`, `base_1.pdf`, `base_2.pdf`, … with a no-clobber rename, taking
//! the first candidate that does not exist yet. This yields the same sequence
//! as an existence check would, but two concurrent savers can never be handed
//! the same name, and a saved name never shows partial content.
//!
//! The staging file is deleted when a [`StagedFile`] is dropped without
//! being committed, so a failed merge leaves nothing behind.

pub mod naming;

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
pub use naming::{candidate_name, normalize_base_name, validate_file_name};

const STAGING_PREFIX: &str = ".merging-";
const STAGING_SUFFIX: &str = ".part";

/// A saved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub file_name: String,
    pub directory: PathBuf,
}

impl SavedFile {
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Directory holding saved documents.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the storage directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    /// Open a staging file for a document to be saved as `base.pdf`,
    /// `base_1.pdf`, …
    ///
    /// `base` must already be normalized (see [`normalize_base_name`]).
    pub fn stage(&self, base: &str) -> Result<StagedFile> {
        validate_file_name(&candidate_name(base, 0))?;
        self.ensure_dir()?;

        let file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.dir)
            .map_err(|e| {
                Error::Storage(format!(
                    "Failed to create staging file in {}: {}",
                    self.dir.display(),
                    e
                ))
            })?;
        debug!("Staging {} at {}", base, file.path().display());

        Ok(StagedFile {
            base: base.to_string(),
            dir: self.dir.clone(),
            writer: BufWriter::new(file),
        })
    }

    /// Resolve a saved file name to its path, rejecting anything that is
    /// not a plain file name.
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        let file_name = validate_file_name(file_name)?;
        Ok(self.dir.join(file_name))
    }

    /// Read a saved document back by name.
    pub fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(file_name)?;
        if !path.is_file() {
            return Err(Error::NotFound(file_name.to_string()));
        }

        std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotFound(file_name.to_string()),
            _ => Error::Storage(format!("Failed to read {}: {}", path.display(), e)),
        })
    }
}

/// A document being written, not yet visible under its final name.
pub struct StagedFile {
    base: String,
    dir: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl StagedFile {
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Writer for the file content.
    pub fn writer(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flush and sync the content, then move it onto the first free name.
    pub fn commit(self) -> Result<String> {
        let mut file = self.writer.into_inner().map_err(|e| {
            Error::Storage(format!("Failed to write staging file: {}", e.error()))
        })?;
        file.as_file()
            .sync_all()
            .map_err(|e| Error::Storage(format!("Failed to sync staging file: {e}")))?;

        for attempt in 0_u64.. {
            let file_name = candidate_name(&self.base, attempt);
            let path = self.dir.join(&file_name);

            match file.persist_noclobber(&path) {
                Ok(_) => {
                    debug!("Committed {}", path.display());
                    return Ok(file_name);
                }
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => file = e.file,
                Err(e) => {
                    return Err(Error::Storage(format!(
                        "Failed to save {}: {}",
                        path.display(),
                        e.error
                    )));
                }
            }
        }

        Err(Error::Storage(format!("No free file name for '{}'", self.base)))
    }
}

impl std::fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFile")
            .field("base", &self.base)
            .field("staging", &self.writer.get_ref().path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("files"));
        (dir, store)
    }

    fn save(store: &FileStore, base: &str, content: &[u8]) -> String {
        let mut staged = store.stage(base).unwrap();
        staged.writer().write_all(content).unwrap();
        staged.commit().unwrap()
    }

    fn entries(store: &FileStore) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(store.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_unique_name_sequence() {
        let (_dir, store) = store();

        assert_eq!(save(&store, "report", b"1"), "report.pdf");
        assert_eq!(save(&store, "report", b"2"), "report_1.pdf");
        assert_eq!(save(&store, "report", b"3"), "report_2.pdf");
        assert_eq!(save(&store, "other", b"4"), "other.pdf");
    }

    #[test]
    fn test_commit_skips_existing_files() {
        let (_dir, store) = store();
        store.ensure_dir().unwrap();
        std::fs::write(store.dir().join("report.pdf"), b"x").unwrap();
        std::fs::write(store.dir().join("report_1.pdf"), b"x").unwrap();

        assert_eq!(save(&store, "report", b"new"), "report_2.pdf");
        assert_eq!(store.read("report.pdf").unwrap(), b"x");
        assert_eq!(store.read("report_2.pdf").unwrap(), b"new");
    }

    #[test]
    fn test_concurrent_saves_get_distinct_names() {
        let (_dir, store) = store();

        let mut first = store.stage("same").unwrap();
        let mut second = store.stage("same").unwrap();
        first.writer().write_all(b"first").unwrap();
        second.writer().write_all(b"second").unwrap();

        assert_eq!(second.commit().unwrap(), "same.pdf");
        assert_eq!(first.commit().unwrap(), "same_1.pdf");
        assert_eq!(store.read("same.pdf").unwrap(), b"second");
        assert_eq!(store.read("same_1.pdf").unwrap(), b"first");
    }

    #[test]
    fn test_staged_content_is_not_visible_before_commit() {
        let (_dir, store) = store();

        let mut staged = store.stage("pending").unwrap();
        staged.writer().write_all(b"partial").unwrap();
        staged.writer().flush().unwrap();

        assert!(store.read("pending.pdf").unwrap_err().is_not_found());

        staged.writer().write_all(b" and the rest").unwrap();
        assert_eq!(staged.commit().unwrap(), "pending.pdf");
        assert_eq!(store.read("pending.pdf").unwrap(), b"partial and the rest");
        assert_eq!(entries(&store), vec!["pending.pdf"]);
    }

    #[test]
    fn test_uncommitted_file_is_removed() {
        let (_dir, store) = store();

        {
            let mut staged = store.stage("draft").unwrap();
            staged.writer().write_all(b"partial").unwrap();
        }

        assert!(entries(&store).is_empty());
        assert_eq!(save(&store, "draft", b"final"), "draft.pdf");
    }

    #[test]
    fn test_read_round_trip() {
        let (_dir, store) = store();
        let name = save(&store, "doc", b"%PDF-1.5 content");
        assert_eq!(store.read(&name).unwrap(), b"%PDF-1.5 content");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let (_dir, store) = store();
        assert!(store.read("never-saved.pdf").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_rejects_traversal() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("secret.pdf"), b"secret").unwrap();

        assert!(matches!(
            store.read("../secret.pdf"),
            Err(Error::InvalidFileName(_))
        ));
        assert!(matches!(store.read(".."), Err(Error::InvalidFileName(_))));
    }

    #[test]
    fn test_stage_rejects_unsafe_base() {
        let (_dir, store) = store();

        for base in ["../escape", "line\nbreak"] {
            assert!(matches!(
                store.stage(base),
                Err(Error::InvalidFileName(_))
            ));
        }
    }
}
