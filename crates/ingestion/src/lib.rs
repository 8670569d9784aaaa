//! # Ingestion
//!
//! Message source module.
//!
//! Responsibilities:
//! - Read recorded logs into decoded, topic-tagged `MessageRecord`s
//! - Map the JSON value tree onto `FieldValue` (including byte buffers)
//! - Surface unreadable or corrupt input as `ContractError::Source`
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::open_source;
//!
//! let mut source = open_source(Path::new("drive_01.jsonl"))?;
//! while let Some(message) = source.next_message()? {
//!     println!("{} @ {}", message.topic, message.timestamp);
//! }
//! ```
//!
//! ## In-memory Testing
//!
//! ```ignore
//! use ingestion::MemorySource;
//!
//! let source = MemorySource::periodic("mem", "/imu", 0, 100.0, 500, |i| payload(i));
//! ```

mod convert;
mod error;
mod jsonl;
mod memory;
mod metrics;
mod source;

// Re-exports
pub use contracts::{MessageRecord, MessageSource};
pub use convert::json_to_field;
pub use error::{IngestionError, Result};
pub use jsonl::JsonlSource;
pub use memory::MemorySource;
pub use metrics::{MetricsSnapshot, SourceMetrics};
pub use source::{is_supported, open_source, SUPPORTED_EXTENSIONS};
