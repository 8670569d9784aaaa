//! JsonSink - writes `summary.json`

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use contracts::{AnalysisResult, ContractError, PipelineStats, ReportSink, RunReport};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::error::ReporterError;

/// Summary file name
pub const JSON_FILE: &str = "summary.json";

#[derive(Serialize)]
struct Summary<'a> {
    generated_at: String,
    stats: &'a PipelineStats,
    results: Vec<&'a AnalysisResult>,
}

/// Sink that serializes every AnalysisResult
pub struct JsonSink {
    name: String,
    path: PathBuf,
}

impl JsonSink {
    pub fn new(name: impl Into<String>, output_dir: &Path) -> Result<Self, ReporterError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            name: name.into(),
            path: output_dir.join(JSON_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, report: &RunReport) -> Result<(), ReporterError> {
        let summary = Summary {
            generated_at: Utc::now().to_rfc3339(),
            stats: &report.stats,
            results: report.tasks.iter().map(|t| &t.result).collect(),
        };
        let file = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(file, &summary)?;
        Ok(())
    }
}

impl ReportSink for JsonSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_sink_write",
        skip(self, report),
        fields(sink = %self.name, tasks = report.tasks.len())
    )]
    async fn write(&mut self, report: &RunReport) -> Result<(), ContractError> {
        self.persist(report).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            e.into_contract(&self.name)
        })?;
        debug!(path = %self.path.display(), "JSON summary written");
        Ok(())
    }

    #[instrument(name = "json_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::fixtures::sample_report;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_json_sink_write() {
        let dir = tempdir().unwrap();
        let mut sink = JsonSink::new("json", dir.path()).unwrap();
        sink.write(&sample_report()).await.unwrap();

        let text = fs::read_to_string(sink.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["stats"]["messages_read"], 5);
        let results = value["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["task_id"], "speed");
        assert_eq!(results[0]["outcome"]["kind"], "basic_stats");
        assert_eq!(results[0]["outcome"]["stats"]["mean"], 1.5);
        assert_eq!(results[1]["outcome"]["observed_frequency_hz"], 100.0);
    }
}
