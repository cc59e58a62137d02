//! Uploaded input files and extension-based type dispatch.

use std::path::Path;

use image::ImageFormat;

use crate::error::{Error, Result};

/// One file to merge: its original name and raw content.
#[derive(Clone)]
pub struct InputFile {
    name: String,
    bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            Error::Storage(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lower-cased suffix after the last '.', or empty if there is none.
    pub fn extension(&self) -> String {
        self.name
            .rfind('.')
            .map(|idx| self.name[idx + 1..].to_lowercase())
            .unwrap_or_default()
    }

    pub fn kind(&self) -> SourceKind {
        SourceKind::from_extension(&self.extension())
    }
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

/// How an input file contributes to the merged document.
///
/// Decided purely by extension; content is never sniffed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Pages are copied verbatim
    Pdf,
    /// Decoded and placed on its own page
    Image(ImageFormat),
    /// One paragraph per line
    Text,
    /// Skipped; carries the offending extension
    Unsupported(String),
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" => Self::Image(ImageFormat::Png),
            "jpg" | "jpeg" => Self::Image(ImageFormat::Jpeg),
            "txt" => Self::Text,
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub const fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}
