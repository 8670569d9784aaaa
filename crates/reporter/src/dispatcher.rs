//! ReportDispatcher - fan-out of a finished run to every sink

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use contracts::{ContractError, ReportSink, RunReport};
use tracing::{error, info, instrument};

use crate::error::ReporterError;
use crate::handle::SinkHandle;
use crate::sinks::{CsvSink, JsonSink, LogSink, MarkdownSink};

/// Built-in sink kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Log,
    Markdown,
    Csv,
    Json,
}

impl SinkKind {
    pub const ALL: [SinkKind; 4] = [Self::Log, Self::Markdown, Self::Csv, Self::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::Markdown => "markdown",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = ReporterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "markdown" | "md" => Ok(Self::Markdown),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ReporterError::UnknownSink(other.to_string())),
        }
    }
}

/// Dispatches a finished run to all registered sinks
///
/// Every sink runs on its own worker; a failing sink is logged and does not
/// stop the others.
#[derive(Default)]
pub struct ReportDispatcher {
    handles: Vec<SinkHandle>,
}

impl ReportDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in sinks, writing files into `output_dir`
    #[instrument(
        name = "report_dispatcher_create",
        skip(kinds),
        fields(output_dir = %output_dir.display())
    )]
    pub fn from_kinds(kinds: &[SinkKind], output_dir: &Path) -> Result<Self, ReporterError> {
        let mut dispatcher = Self::new();
        for kind in kinds {
            dispatcher = match kind {
                SinkKind::Log => dispatcher.with_sink(LogSink::new("log")),
                SinkKind::Markdown => dispatcher.with_sink(
                    MarkdownSink::new("markdown", output_dir)
                        .map_err(|e| ReporterError::sink_creation("markdown", e.to_string()))?,
                ),
                SinkKind::Csv => dispatcher.with_sink(
                    CsvSink::new("csv", output_dir)
                        .map_err(|e| ReporterError::sink_creation("csv", e.to_string()))?,
                ),
                SinkKind::Json => dispatcher.with_sink(
                    JsonSink::new("json", output_dir)
                        .map_err(|e| ReporterError::sink_creation("json", e.to_string()))?,
                ),
            };
        }
        Ok(dispatcher)
    }

    /// Register a sink and start its worker
    pub fn with_sink<S: ReportSink + Send + 'static>(mut self, sink: S) -> Self {
        self.handles.push(SinkHandle::spawn(sink));
        self
    }

    pub fn sink_names(&self) -> Vec<&str> {
        self.handles.iter().map(SinkHandle::name).collect()
    }

    /// Write `report` to every sink and wait for all of them
    ///
    /// # Errors
    /// The first sink error, after every sink has been tried.
    #[instrument(
        name = "report_dispatcher_dispatch",
        skip_all,
        fields(sinks = self.handles.len())
    )]
    pub async fn dispatch(self, report: RunReport) -> Result<(), ContractError> {
        let report = Arc::new(report);
        let mut first_error = None;

        for handle in &self.handles {
            if let Err(e) = handle.submit(Arc::clone(&report)).await {
                error!(sink = %handle.name(), error = %e, "Report not delivered");
                first_error.get_or_insert(e);
            }
        }

        let total = self.handles.len();
        let mut failed = 0usize;
        for handle in self.handles {
            let name = handle.name().to_string();
            if let Err(e) = handle.finish().await {
                failed += 1;
                error!(sink = %name, error = %e, "Sink failed");
                first_error.get_or_insert(e);
            }
        }

        info!(sinks = total, failed, "Report dispatch complete");
        first_error.map_or(Ok(()), Err)
    }
}
