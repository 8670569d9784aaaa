//! RunReport - Orchestrator output
//!
//! Everything the report writers need after a completed run.

use std::time::Duration;

use serde::Serialize;

use crate::{AnalysisResult, SampleDiagnostic, ValueSeries};

/// Per-task report
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    /// Declared field paths, in configuration order
    pub field_names: Vec<String>,

    /// Analysis result
    pub result: AnalysisResult,

    /// Frozen value series (empty when series retention is disabled)
    #[serde(skip)]
    pub series: ValueSeries,

    /// Rejected samples
    pub diagnostics: Vec<SampleDiagnostic>,
}

/// Report of a completed run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Task reports in configuration order
    pub tasks: Vec<TaskReport>,

    /// Run statistics
    pub stats: PipelineStats,
}

impl RunReport {
    /// Iterate over every diagnostic of every task
    pub fn diagnostics(&self) -> impl Iterator<Item = &SampleDiagnostic> {
        self.tasks.iter().flat_map(|t| t.diagnostics.iter())
    }

    /// Look up a task report by id
    pub fn task(&self, task_id: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|t| t.result.task_id == task_id)
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Message sources processed
    pub sources: usize,

    /// Messages read from all sources
    pub messages_read: u64,

    /// Messages routed to at least one task
    pub messages_matched: u64,

    /// Samples accepted across tasks
    pub samples_accepted: u64,

    /// Samples rejected across tasks
    pub samples_rejected: u64,

    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl PipelineStats {
    /// Message throughput
    pub fn messages_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.messages_read as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Rejected samples as percentage of all samples
    pub fn rejection_rate(&self) -> f64 {
        let total = self.samples_accepted + self.samples_rejected;
        if total > 0 {
            (self.samples_rejected as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates() {
        let stats = PipelineStats {
            messages_read: 100,
            samples_accepted: 90,
            samples_rejected: 10,
            duration: Duration::from_secs(2),
            ..Default::default()
        };
        assert!((stats.messages_per_sec() - 50.0).abs() < 1e-9);
        assert!((stats.rejection_rate() - 10.0).abs() < 1e-9);
        assert_eq!(PipelineStats::default().rejection_rate(), 0.0);
    }
}
