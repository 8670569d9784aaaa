//! Layered error definitions
//!
//! Categorized by source: config / source / sample / sink

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Task definition cannot be compiled (directive, type, strategy, expression)
    #[error("config error in task '{task_id}': {message}")]
    Config { task_id: String, message: String },

    // ===== Source Errors =====
    /// Message source unreadable or corrupt
    #[error("source '{source_name}' error: {message}")]
    Source {
        source_name: String,
        message: String,
    },

    // ===== Sample Errors =====
    /// Per-sample extraction/evaluation failure
    #[error(transparent)]
    Sample(#[from] SampleError),

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create task compile error
    pub fn config(task_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            task_id: task_id.into(),
            message: message.into(),
        }
    }

    /// Create source error
    pub fn source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error was raised while loading or compiling configuration
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::Config { .. }
        )
    }
}

/// Per-sample failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleErrorKind {
    FieldNotFound,
    ByteRange,
    Cast,
    Expression,
}

impl SampleErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldNotFound => "field_not_found",
            Self::ByteRange => "byte_range",
            Self::Cast => "cast",
            Self::Expression => "expression",
        }
    }
}

impl std::fmt::Display for SampleErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-sample extraction/evaluation error
///
/// Caught at the sample boundary; the sample is excluded and processing continues.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// A path segment is absent from the message
    #[error("field '{path}' not found: {reason}")]
    FieldNotFound { path: String, reason: String },

    /// Requested byte range exceeds the buffer
    #[error("byte range [{start}, {end}) of field '{path}' exceeds buffer length {len}")]
    ByteRange {
        path: String,
        start: usize,
        end: usize,
        len: usize,
    },

    /// Source value cannot be interpreted as the requested type
    #[error("cannot cast field '{path}' to {target}: {reason}")]
    Cast {
        path: String,
        target: String,
        reason: String,
    },

    /// Expression evaluation failed
    #[error("expression error: {0}")]
    Expression(String),
}

impl SampleError {
    pub fn field_not_found(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FieldNotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn cast(
        path: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Cast {
            path: path.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    pub fn expression(message: impl Into<String>) -> Self {
        Self::Expression(message.into())
    }

    pub fn kind(&self) -> SampleErrorKind {
        match self {
            Self::FieldNotFound { .. } => SampleErrorKind::FieldNotFound,
            Self::ByteRange { .. } => SampleErrorKind::ByteRange,
            Self::Cast { .. } => SampleErrorKind::Cast,
            Self::Expression(_) => SampleErrorKind::Expression,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_error_kind() {
        let err = SampleError::ByteRange {
            path: "data".into(),
            start: 4,
            end: 12,
            len: 8,
        };
        assert_eq!(err.kind(), SampleErrorKind::ByteRange);
        assert!(err.to_string().contains("[4, 12)"));
    }

    #[test]
    fn test_config_classification() {
        assert!(ContractError::config("t", "bad type").is_config());
        assert!(ContractError::config_validation("analyses", "empty").is_config());
        assert!(!ContractError::source("a.jsonl", "corrupt").is_config());
    }

    #[test]
    fn test_sample_error_converts() {
        let err: ContractError = SampleError::expression("division by zero").into();
        assert_eq!(err.to_string(), "expression error: division by zero");
    }
}
