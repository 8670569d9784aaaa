//! Reporter error types

use thiserror::Error;

/// Reporter-specific errors
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Unknown sink kind requested
    #[error("unknown report sink '{0}' (expected log, markdown, csv or json)")]
    UnknownSink(String),

    /// JSON serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReporterError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap as the cross-crate sink write error
    pub fn into_contract(self, sink_name: &str) -> contracts::ContractError {
        contracts::ContractError::sink_write(sink_name, self.to_string())
    }
}
