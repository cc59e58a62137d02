use anyhow::{Context, Result};
use file_merger_core::{AppConfig, FileMerger};

/// Global application state
pub struct AppState {
    pub merger: FileMerger,
}

impl AppState {
    /// Build the merger and make sure the storage directory exists.
    pub fn new(config: AppConfig) -> Result<Self> {
        let merger = FileMerger::new(config).context("Invalid configuration")?;
        merger
            .store()
            .ensure_dir()
            .context("Failed to prepare storage directory")?;

        Ok(Self { merger })
    }

    pub const fn config(&self) -> &AppConfig {
        self.merger.config()
    }
}
