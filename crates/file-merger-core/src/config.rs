use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default directory for saved merge results, relative to the working directory
pub const DEFAULT_UPLOAD_DIR: &str = "resources/files";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory where merged documents are saved and served from
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from(DEFAULT_UPLOAD_DIR)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
        }
    }
}

/// Page layout for generated content (images and text).
///
/// Pages copied from source PDFs keep their own geometry.
/// Units are PDF points (1/72 inch). Defaults are A4 with 36pt margins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f32,

    #[serde(default = "default_page_height")]
    pub page_height: f32,

    /// Margin applied on every side of the page
    #[serde(default = "default_margin")]
    pub margin: f32,

    /// Body text size in points
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

const fn default_page_width() -> f32 {
    595.0
}

const fn default_page_height() -> f32 {
    842.0
}

const fn default_margin() -> f32 {
    36.0
}

const fn default_font_size() -> f32 {
    12.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
            font_size: default_font_size(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

const fn default_max_upload_bytes() -> usize {
    100 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations (~/.config/file-merger/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("file-merger").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        tracing::debug!("No config file found, using defaults");
        Self::default()
    }

    /// Check that the layout leaves a usable printable area.
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;

        if layout.page_width <= 0.0 || layout.page_height <= 0.0 {
            return Err(invalid("layout.page_width", "page dimensions must be positive"));
        }
        if layout.margin < 0.0 {
            return Err(invalid("layout.margin", "margin must not be negative"));
        }
        if layout.page_width - 2.0 * layout.margin <= 0.0
            || layout.page_height - 2.0 * layout.margin <= 0.0
        {
            return Err(invalid("layout.margin", "margins leave no printable area"));
        }
        if layout.font_size <= 0.0 {
            return Err(invalid("layout.font_size", "font size must be positive"));
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(invalid("storage.upload_dir", "directory must not be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::ConfigInvalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
