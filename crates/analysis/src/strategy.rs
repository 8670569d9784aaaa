//! Analysis strategies

use contracts::{AnalysisOutcome, ExtractedSample};
use tracing::trace;

use crate::kind::AnalysisKind;
use crate::stats::RunningStats;
use crate::timestamp::TimestampAnalyzer;

/// Streaming strategy state for one task
///
/// Samples are consumed in arrival order; `finalize` runs once after the
/// message stream is exhausted.
#[derive(Debug, Clone)]
pub enum AnalysisStrategy {
    None { rows: Vec<ExtractedSample> },
    BasicStats(RunningStats),
    Timestamp(TimestampAnalyzer),
}

impl AnalysisStrategy {
    pub fn new(kind: &AnalysisKind) -> Self {
        match *kind {
            AnalysisKind::None => Self::None { rows: Vec::new() },
            AnalysisKind::BasicStats => Self::BasicStats(RunningStats::new()),
            AnalysisKind::Timestamp { frequency_hz, unit } => {
                Self::Timestamp(TimestampAnalyzer::new(frequency_hz, unit))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::None { .. } => "none",
            Self::BasicStats(_) => "basic_stats",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Fold one accepted sample into the strategy state
    pub fn consume(&mut self, sample: &ExtractedSample) {
        trace!(
            strategy = self.name(),
            timestamp = sample.timestamp,
            value = %sample.computed_value,
            "Consuming sample"
        );
        match self {
            Self::None { rows } => rows.push(sample.clone()),
            Self::BasicStats(stats) => stats.push(sample.computed_value.as_f64()),
            Self::Timestamp(analyzer) => analyzer.push(sample.computed_value),
        }
    }

    pub fn finalize(self) -> AnalysisOutcome {
        match self {
            Self::None { rows } => AnalysisOutcome::Passthrough { rows },
            Self::BasicStats(stats) => AnalysisOutcome::BasicStats {
                stats: (&stats).into(),
            },
            Self::Timestamp(analyzer) => AnalysisOutcome::Timestamp(analyzer.finalize()),
        }
    }
}
