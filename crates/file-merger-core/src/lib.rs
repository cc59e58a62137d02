//! File Merger Core Library
//!
//! This library combines uploaded files of mixed type into a single PDF:
//! - PDF pages copied verbatim, in order
//! - PNG/JPEG images placed one per page, scaled to fit
//! - Plain text laid out one paragraph per line
//! - Merged documents saved under collision-free names and read back

pub mod config;
pub mod error;
pub mod input;
pub mod merge;
pub mod pdf;
pub mod storage;
pub mod util;

pub use config::{AppConfig, LayoutConfig, ServerConfig, StorageConfig, DEFAULT_UPLOAD_DIR};
pub use error::{Error, Result};
pub use input::{InputFile, SourceKind};
pub use merge::{MergeReport, MergePipeline, MergedDocument, ProgressCallback};
pub use pdf::{Element, ImageXObject, OutputDocument, PageGeometry};
pub use storage::{FileStore, SavedFile, StagedFile};

use tracing::info;

/// Front end for the merge operations: merge to bytes, merge and save, and
/// read back saved documents.
#[derive(Debug, Clone)]
pub struct FileMerger {
    pipeline: MergePipeline,
    store: FileStore,
    config: AppConfig,
}

/// Result of [`FileMerger::merge_and_save`]
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub saved: SavedFile,
    pub report: MergeReport,
}

impl FileMerger {
    /// Create a merger with the given configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            pipeline: MergePipeline::new(config.layout),
            store: FileStore::new(config.storage.upload_dir.clone()),
            config,
        })
    }

    /// Merge files into an in-memory PDF
    pub fn merge_to_bytes(&self, files: &[InputFile]) -> Result<MergedDocument> {
        self.pipeline.merge(files)
    }

    /// Merge files and save the result in the storage directory.
    ///
    /// `file_name` is the requested base name; see
    /// [`storage::normalize_base_name`] for how it is cleaned up.
    pub fn merge_and_save(
        &self,
        files: &[InputFile],
        file_name: Option<&str>,
    ) -> Result<SaveOutcome> {
        self.merge_and_save_with_progress(files, file_name, None)
    }

    /// Like [`Self::merge_and_save`], reporting progress after each file
    pub fn merge_and_save_with_progress(
        &self,
        files: &[InputFile],
        file_name: Option<&str>,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<SaveOutcome> {
        let base = storage::normalize_base_name(file_name);

        // Dropping the staged file on any error below removes it
        let mut staged = self.store.stage(&base)?;
        let report = self.pipeline.merge_into(files, staged.writer(), progress)?;
        let file_name = staged.commit()?;

        info!(
            "Saved {} ({} pages) to {}",
            file_name,
            report.pages,
            self.store.dir().display()
        );

        Ok(SaveOutcome {
            saved: SavedFile {
                file_name,
                directory: self.store.dir().to_path_buf(),
            },
            report,
        })
    }

    /// Read a previously saved document
    pub fn retrieve(&self, file_name: &str) -> Result<Vec<u8>> {
        self.store.read(file_name)
    }

    pub const fn store(&self) -> &FileStore {
        &self.store
    }

    pub const fn pipeline(&self) -> &MergePipeline {
        &self.pipeline
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }
}
