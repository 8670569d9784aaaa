//! Report sink implementations

mod csv;
mod json;
mod log;
mod markdown;

pub use csv::{CsvSink, DIAGNOSTICS_FILE};
pub use json::{JsonSink, JSON_FILE};
pub use log::LogSink;
pub use markdown::{render as render_markdown, MarkdownSink, MARKDOWN_FILE};
