//! Error types for CLI operations.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Log file or directory does not exist
    #[error("Log source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Directory contains no supported log files
    #[error("No log files (*.jsonl, *.ndjson) found in {}", path.display())]
    NoSources { path: PathBuf },

    /// Log file could not be opened
    #[error("Failed to open log file {}: {message}", path.display())]
    OpenSource { path: PathBuf, message: String },

    /// Run interrupted before the report was produced
    #[error("Run interrupted by shutdown signal")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn source_not_found(path: &Path) -> Self {
        Self::SourceNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn no_sources(path: &Path) -> Self {
        Self::NoSources {
            path: path.to_path_buf(),
        }
    }

    pub fn open_source(path: &Path, message: impl Into<String>) -> Self {
        Self::OpenSource {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
