//! MessageRecord - message source output
//!
//! Decoding the log container is the source's job; the core only sees decoded records.

use serde::Serialize;

use crate::{ContractError, FieldValue};

/// A decoded, topic-tagged, timestamped message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageRecord {
    /// Topic the message was published on
    pub topic: String,

    /// Log time (nanoseconds)
    pub timestamp: u64,

    /// Decoded field tree
    pub payload: FieldValue,
}

impl MessageRecord {
    pub fn new(topic: impl Into<String>, timestamp: u64, payload: FieldValue) -> Self {
        Self {
            topic: topic.into(),
            timestamp,
            payload,
        }
    }
}

/// Ordered, finite message source
///
/// One source usually corresponds to one recorded log file.
///
/// # Example
///
/// ```ignore
/// let mut source: Box<dyn MessageSource> = open_source(path)?;
/// while let Some(message) = source.next_message()? {
///     println!("{} @ {}", message.topic, message.timestamp);
/// }
/// ```
pub trait MessageSource: Send {
    /// Source name (file path or label, used for logging)
    fn name(&self) -> &str;

    /// Next message in stream order, `None` once exhausted
    ///
    /// # Errors
    /// Returns `ContractError::Source` when the source is unreadable or corrupt.
    fn next_message(&mut self) -> Result<Option<MessageRecord>, ContractError>;
}
