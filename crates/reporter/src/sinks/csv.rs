//! CsvSink - per-task value series and rejected samples as CSV
//!
//! - `<task_id>.csv`: `timestamp_ns`, one `raw_<field>` column per declared
//!   field, `computed_value`
//! - `diagnostics.csv`: every rejected sample of every task

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, ReportSink, RunReport, TaskReport};
use tracing::{debug, error, instrument};

use crate::error::ReporterError;
use crate::format::{csv_field, file_stem};

/// Diagnostics file name
pub const DIAGNOSTICS_FILE: &str = "diagnostics.csv";

/// Sink that writes CSV files into a directory
pub struct CsvSink {
    name: String,
    output_dir: PathBuf,
}

impl CsvSink {
    /// Create the sink, creating `output_dir` if needed
    pub fn new(name: impl Into<String>, output_dir: &Path) -> Result<Self, ReporterError> {
        fs::create_dir_all(output_dir)?;
        Ok(Self {
            name: name.into(),
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Path of the series file for `task_id`
    pub fn task_path(&self, task_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", file_stem(task_id)))
    }

    fn write_task(&self, task: &TaskReport) -> Result<(), ReporterError> {
        let path = self.task_path(&task.result.task_id);
        let mut out = BufWriter::new(File::create(&path)?);

        let mut header = vec!["timestamp_ns".to_string()];
        header.extend(
            task.field_names
                .iter()
                .map(|f| csv_field(&format!("raw_{f}"))),
        );
        header.push("computed_value".to_string());
        writeln!(out, "{}", header.join(","))?;

        for sample in task.series.iter() {
            let mut row = vec![sample.timestamp.to_string()];
            row.extend(task.field_names.iter().map(|f| {
                sample
                    .values
                    .get(f)
                    .map(|v| csv_field(&v.to_string()))
                    .unwrap_or_default()
            }));
            row.push(sample.computed_value.to_string());
            writeln!(out, "{}", row.join(","))?;
        }

        out.flush()?;
        debug!(path = %path.display(), rows = task.series.len(), "Series written");
        Ok(())
    }

    fn write_diagnostics(&self, report: &RunReport) -> Result<(), ReporterError> {
        let mut out = BufWriter::new(File::create(self.output_dir.join(DIAGNOSTICS_FILE))?);
        writeln!(out, "task_id,timestamp_ns,kind,message")?;
        for d in report.diagnostics() {
            writeln!(
                out,
                "{},{},{},{}",
                csv_field(&d.task_id),
                d.timestamp,
                d.kind,
                csv_field(&d.message)
            )?;
        }
        out.flush()?;
        Ok(())
    }

    fn persist(&self, report: &RunReport) -> Result<(), ReporterError> {
        for task in &report.tasks {
            self.write_task(task)?;
        }
        self.write_diagnostics(report)
    }
}

impl ReportSink for CsvSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "csv_sink_write",
        skip(self, report),
        fields(sink = %self.name, tasks = report.tasks.len())
    )]
    async fn write(&mut self, report: &RunReport) -> Result<(), ContractError> {
        self.persist(report).map_err(|e| {
            error!(sink = %self.name, error = %e, "Write failed");
            e.into_contract(&self.name)
        })
    }

    #[instrument(name = "csv_sink_close", skip(self))]
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
    async fn test_csv_sink_write() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new("csv", dir.path()).unwrap();
        sink.write(&sample_report()).await.unwrap();

        let speed = fs::read_to_string(sink.task_path("speed")).unwrap();
        let lines: Vec<&str> = speed.lines().collect();
        assert_eq!(lines[0], "timestamp_ns,raw_speed,computed_value");
        assert_eq!(lines[1], "1700000000000000000,1,1");
        assert_eq!(lines[2], "1700000000010000000,2,2");
        assert_eq!(lines.len(), 3);

        let diagnostics = fs::read_to_string(dir.path().join(DIAGNOSTICS_FILE)).unwrap();
        let lines: Vec<&str> = diagnostics.lines().collect();
        assert_eq!(lines[0], "task_id,timestamp_ns,kind,message");
        assert!(lines[1].starts_with("speed,1700000000005000000,byte_range,"));
    }

    #[tokio::test]
    async fn test_unwritable_directory_fails() {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::new("csv", dir.path()).unwrap();
        fs::remove_dir_all(dir.path()).unwrap();

        let err = sink.write(&sample_report()).await.unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }
}
