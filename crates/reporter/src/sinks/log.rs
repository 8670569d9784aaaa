//! LogSink - logs the per-task summary via tracing

use contracts::{AnalysisOutcome, ContractError, ReportSink, RunReport, TaskReport};
use tracing::{info, instrument, warn};

/// Sink that logs task summaries
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_task(&self, task: &TaskReport) {
        let result = &task.result;
        info!(
            sink = %self.name,
            task_id = %result.task_id,
            topic = %result.topic_name,
            strategy = %result.strategy,
            messages = result.message_count,
            samples = result.sample_count,
            errors = result.error_count(),
            "Task result"
        );

        match &result.outcome {
            AnalysisOutcome::Passthrough { rows } => {
                info!(task_id = %result.task_id, rows = rows.len(), "Passthrough rows");
            }
            AnalysisOutcome::BasicStats { stats } => {
                info!(task_id = %result.task_id, stats = %stats, "Value statistics");
            }
            AnalysisOutcome::Timestamp(ts) => {
                info!(
                    task_id = %result.task_id,
                    expected_hz = ts.specified_frequency_hz,
                    observed_hz = ?ts.observed_frequency_hz,
                    jitter_s = ?ts.jitter_s,
                    period_s = %ts.period_s,
                    "Timestamp statistics"
                );
                if ts.anomaly_count > 0 {
                    warn!(
                        task_id = %result.task_id,
                        anomalies = ts.anomaly_count,
                        "Non-increasing timestamps detected"
                    );
                }
            }
        }
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, report),
        fields(sink = %self.name, tasks = report.tasks.len())
    )]
    async fn write(&mut self, report: &RunReport) -> Result<(), ContractError> {
        for task in &report.tasks {
            self.log_task(task);
        }
        info!(
            sink = %self.name,
            sources = report.stats.sources,
            messages = report.stats.messages_read,
            rejection_rate = report.stats.rejection_rate(),
            "Run summary"
        );
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_write() {
        let mut sink = LogSink::new("test_log");
        assert!(sink.write(&RunReport::default()).await.is_ok());
        assert!(sink.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}
