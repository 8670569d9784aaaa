//! MarkdownSink - writes `result.md`

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use contracts::{AnalysisOutcome, ContractError, ReportSink, RunReport, TaskReport};
use tracing::{debug, error, instrument};

use crate::error::ReporterError;
use crate::format::{optional, significant, utc_time, SIGNIFICANT_DIGITS};

/// Report file name
pub const MARKDOWN_FILE: &str = "result.md";

/// Sink that renders the run as a Markdown document
pub struct MarkdownSink {
    name: String,
    path: PathBuf,
}

impl MarkdownSink {
    /// Create the sink, creating `output_dir` if needed
    pub fn new(name: impl Into<String>, output_dir: &Path) -> Result<Self, ReporterError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            name: name.into(),
            path: output_dir.join(MARKDOWN_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, report: &RunReport) -> Result<(), ContractError> {
        fs::write(&self.path, render(report)).map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ReporterError::from(e).into_contract(&self.name)
        })
    }
}

impl ReportSink for MarkdownSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "markdown_sink_write",
        skip(self, report),
        fields(sink = %self.name, tasks = report.tasks.len())
    )]
    async fn write(&mut self, report: &RunReport) -> Result<(), ContractError> {
        self.persist(report)?;
        debug!(path = %self.path.display(), "Markdown report written");
        Ok(())
    }

    #[instrument(name = "markdown_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Render the whole report
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();
    let stats = &report.stats;

    let _ = writeln!(out, "# Telemetry Analysis Report\n");
    let _ = writeln!(out, "## Overview\n");
    let _ = writeln!(out, "| Item | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Sources | {} |", stats.sources);
    let _ = writeln!(out, "| Messages read | {} |", stats.messages_read);
    let _ = writeln!(out, "| Messages analyzed | {} |", stats.messages_matched);
    let _ = writeln!(out, "| Samples accepted | {} |", stats.samples_accepted);
    let _ = writeln!(out, "| Samples rejected | {} |", stats.samples_rejected);

    let start = report.tasks.iter().filter_map(|t| t.result.first_timestamp).min();
    let end = report.tasks.iter().filter_map(|t| t.result.last_timestamp).max();
    if let (Some(start), Some(end)) = (start, end) {
        let _ = writeln!(out, "| Start time | {} |", utc_time(start));
        let _ = writeln!(out, "| End time | {} |", utc_time(end));
        let span = end.saturating_sub(start) as f64 / 1e9;
        let _ = writeln!(
            out,
            "| Log span (s) | {} |",
            significant(span, SIGNIFICANT_DIGITS)
        );
    }
    let _ = writeln!(
        out,
        "| Processing time (s) | {} |",
        significant(stats.duration.as_secs_f64(), SIGNIFICANT_DIGITS)
    );

    for task in &report.tasks {
        render_task(&mut out, task);
    }
    out
}

fn render_task(out: &mut String, task: &TaskReport) {
    let result = &task.result;

    let _ = writeln!(out, "\n## {}\n", result.task_id);
    let _ = writeln!(out, "- Topic: `{}`", result.topic_name);
    let _ = writeln!(out, "- Analysis: `{}`", result.analysis_type);
    let _ = writeln!(out, "- Fields: {}", task.field_names.join(", "));
    let _ = writeln!(
        out,
        "- Messages: {}, samples: {}, errors: {}",
        result.message_count,
        result.sample_count,
        result.error_count()
    );

    match &result.outcome {
        AnalysisOutcome::Passthrough { rows } => {
            let _ = writeln!(out, "\n{} rows retained, see `{}.csv`.", rows.len(), result.task_id);
        }
        AnalysisOutcome::BasicStats { stats } => {
            let _ = writeln!(out, "\n| Count | Mean | Std | Min | Max |");
            let _ = writeln!(out, "|---|---|---|---|---|");
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                stats.count,
                optional(stats.mean),
                optional(stats.std_dev),
                optional(stats.min),
                optional(stats.max)
            );
        }
        AnalysisOutcome::Timestamp(ts) => {
            let _ = writeln!(out, "\n| Statistic | Value |");
            let _ = writeln!(out, "|---|---|");
            let rows = [
                ("Specified frequency (Hz)", Some(ts.specified_frequency_hz)),
                ("Observed frequency (Hz)", ts.observed_frequency_hz),
                ("Frequency deviation (Hz)", ts.frequency_deviation_hz),
                ("Frequency deviation (%)", ts.frequency_deviation_pct),
                ("Expected period (s)", Some(ts.expected_period_s)),
                ("Mean period (s)", ts.period_s.mean),
                ("Jitter (s)", ts.jitter_s),
                ("Drift min (s)", ts.drift_min_s),
                ("Drift max (s)", ts.drift_max_s),
                ("Instantaneous frequency mean (Hz)", ts.instantaneous_frequency_hz.mean),
                ("Instantaneous frequency std (Hz)", ts.instantaneous_frequency_hz.std_dev),
                ("Phase deviation mean (s)", ts.phase_deviation_s.mean),
                ("Phase deviation std (s)", ts.phase_deviation_s.std_dev),
                ("Phase deviation min (s)", ts.phase_deviation_s.min),
                ("Phase deviation max (s)", ts.phase_deviation_s.max),
            ];
            for (label, value) in rows {
                let _ = writeln!(out, "| {label} | {} |", optional(value));
            }
            let _ = writeln!(out, "| Periods analyzed | {} |", ts.period_s.count);
            let _ = writeln!(out, "| Timestamp anomalies | {} |", ts.anomaly_count);
        }
    }

    if !result.error_counts.is_empty() {
        let _ = writeln!(out, "\n| Error kind | Count |");
        let _ = writeln!(out, "|---|---|");
        for (kind, count) in &result.error_counts {
            let _ = writeln!(out, "| {kind} | {count} |");
        }
    }
}
