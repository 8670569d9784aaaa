//! # Reporter
//!
//! 报告输出模块。
//!
//! 负责：
//! - 消费完成的 `RunReport`
//! - Fan-out 到多个 sinks（日志、Markdown、CSV、JSON）
//! - 单个 sink 失败不影响其他 sink

pub mod dispatcher;
pub mod error;
pub mod format;
pub mod handle;
pub mod sinks;

pub use contracts::{ReportSink, RunReport};
pub use dispatcher::{ReportDispatcher, SinkKind};
pub use error::ReporterError;
pub use handle::SinkHandle;
pub use sinks::{CsvSink, JsonSink, LogSink, MarkdownSink};
