//! Source selection by file extension

use std::path::Path;

use contracts::MessageSource;

use crate::error::{IngestionError, Result};
use crate::jsonl::JsonlSource;

/// Extensions handled by [`open_source`]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jsonl", "ndjson"];

/// Open a recorded log as a message source
///
/// # Errors
/// Unsupported extensions and unreadable files.
pub fn open_source(path: &Path) -> Result<Box<dyn MessageSource>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "jsonl" | "ndjson" => Ok(Box::new(JsonlSource::open(path)?)),
        _ => Err(IngestionError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        }),
    }
}

/// Whether `path` has an extension [`open_source`] understands
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let err = open_source(Path::new("drive.mcap")).err().unwrap();
        assert!(matches!(err, IngestionError::UnsupportedFormat { .. }));
        assert!(!is_supported(Path::new("drive.mcap")));
        assert!(is_supported(Path::new("drive.JSONL")));
    }

    #[test]
    fn test_open_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ndjson");
        std::fs::write(&path, "{\"topic\":\"/t\",\"log_time\":1,\"message\":{}}\n").unwrap();
        let mut source = open_source(&path).unwrap();
        assert!(source.next_message().unwrap().is_some());
        assert!(source.next_message().unwrap().is_none());
    }
}
