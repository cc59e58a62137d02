//! The merge pipeline: ordered conversion of mixed inputs into one PDF.
//!
//! Inputs are processed strictly in the order given. Each file is dispatched
//! on its extension:
//! - `pdf`: all pages copied in source order
//! - `png`/`jpg`/`jpeg`: the image on its own page, scaled to fit
//! - `txt`: one paragraph per line, then a page break
//! - anything else: skipped with a warning
//!
//! A failure on any supported file aborts the whole merge.

pub mod appenders;

use std::io::Write;

use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::input::{InputFile, SourceKind};
use crate::pdf::OutputDocument;

/// Progress callback, invoked with (files processed, total files).
pub type ProgressCallback<'a> = &'a (dyn Fn(usize, usize) + Send + Sync);

/// What a merge did with each input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Pages in the finished document
    pub pages: usize,
    /// Names of inputs that contributed content (or were empty text files)
    pub merged: Vec<String>,
    /// Names of inputs skipped for having an unsupported extension
    pub skipped: Vec<String>,
}

/// A finished merge held in memory.
#[derive(Debug, Clone)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub report: MergeReport,
}

/// Merges input files into a single PDF using one page layout.
#[derive(Debug, Clone, Default)]
pub struct MergePipeline {
    layout: LayoutConfig,
}

impl MergePipeline {
    pub const fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    pub const fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Merge into an in-memory PDF.
    pub fn merge(&self, files: &[InputFile]) -> Result<MergedDocument> {
        self.merge_with_progress(files, None)
    }

    /// Merge into an in-memory PDF, reporting progress after each file.
    pub fn merge_with_progress(
        &self,
        files: &[InputFile],
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<MergedDocument> {
        let mut bytes = Vec::new();
        let report = self.merge_into(files, &mut bytes, progress)?;
        Ok(MergedDocument { bytes, report })
    }

    /// Merge and serialize the finished PDF into `writer`.
    ///
    /// The document is finalized exactly once, after every input has been
    /// appended. On error nothing is guaranteed about what reached `writer`.
    pub fn merge_into<W: Write>(
        &self,
        files: &[InputFile],
        writer: &mut W,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<MergeReport> {
        let mut doc = OutputDocument::new(&self.layout);
        let mut report = MergeReport::default();
        let total = files.len();

        for (index, file) in files.iter().enumerate() {
            if Self::append(&mut doc, file)? {
                report.merged.push(file.name().to_string());
            } else {
                report.skipped.push(file.name().to_string());
            }

            if let Some(callback) = progress {
                callback(index + 1, total);
            }
        }

        report.pages = doc.write_to(writer)?;

        debug!(
            "Merged {} files into {} pages ({} skipped)",
            report.merged.len(),
            report.pages,
            report.skipped.len()
        );

        Ok(report)
    }

    /// Append one file. Returns false if its type is unsupported.
    fn append(doc: &mut OutputDocument, file: &InputFile) -> Result<bool> {
        match file.kind() {
            SourceKind::Pdf => {
                let pages = appenders::append_pdf(doc, file)?;
                debug!("Appended {} ({} pages)", file.name(), pages);
            }
            SourceKind::Image(format) => {
                for element in appenders::image_elements(file, format)? {
                    doc.push(element)?;
                }
                debug!("Appended image {}", file.name());
            }
            SourceKind::Text => {
                let elements = appenders::text_elements(file);
                debug!("Appended {} ({} lines)", file.name(), elements.len() - 1);
                for element in elements {
                    doc.push(element)?;
                }
            }
            SourceKind::Unsupported(extension) => {
                warn!("Unsupported file type '{}', skipping {}", extension, file.name());
                return Ok(false);
            }
        }

        Ok(true)
    }
}
