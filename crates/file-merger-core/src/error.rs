use thiserror::Error;

/// Unified error type for file-merger-core
///
/// This enum encompasses all error cases that can occur in the library:
/// - Input decoding (corrupt PDFs, undecodable images)
/// - Output document assembly and serialization
/// - Storage operations (naming, saving, retrieval)
/// - Configuration operations (loading, validation)
/// - General I/O operations
///
/// Files of an unsupported type are not an error: the pipeline skips them.
#[derive(Error, Debug)]
pub enum Error {
    // ==========================================================================
    // Input Errors
    // ==========================================================================
    /// A file with a supported extension could not be decoded
    #[error("malformed input '{file}': {reason}")]
    MalformedInput { file: String, reason: String },

    // ==========================================================================
    // PDF Errors
    // ==========================================================================
    /// Error from the lopdf library while assembling the output
    #[error("lopdf error: {0}")]
    Lopdf(String),

    /// Failed to serialize the output PDF
    #[error("failed to save PDF: {0}")]
    PdfSave(String),

    // ==========================================================================
    // Storage Errors
    // ==========================================================================
    /// Requested saved file does not exist
    #[error("file not found: {0}")]
    NotFound(String),

    /// File name is empty or would escape the storage directory
    #[error("invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Directory creation or disk write failed
    #[error("storage failure: {0}")]
    Storage(String),

    // ==========================================================================
    // Configuration Errors
    // ==========================================================================
    /// Failed to load configuration file
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Invalid configuration value
    #[error("invalid config value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    // ==========================================================================
    // I/O Errors
    // ==========================================================================
    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(file: &str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedInput {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the requested resource does not exist.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
