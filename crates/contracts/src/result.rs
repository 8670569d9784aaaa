//! AnalysisResult - Analysis Strategy output
//!
//! Terminal artifact of a task, produced once after the message pass completes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ExtractedSample, SampleErrorKind};

/// Final result of one analysis task
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub task_id: String,
    pub topic_name: String,

    /// Strategy name (`none` / `basic_stats` / `timestamp`)
    pub strategy: String,

    /// Analysis type as written in configuration
    pub analysis_type: String,

    /// Messages routed to the task
    pub message_count: u64,

    /// Samples that survived extraction and evaluation
    pub sample_count: u64,

    /// Timestamp of the first accepted sample (ns)
    pub first_timestamp: Option<u64>,

    /// Timestamp of the last accepted sample (ns)
    pub last_timestamp: Option<u64>,

    /// Rejected samples per error kind
    pub error_counts: BTreeMap<SampleErrorKind, u64>,

    /// Strategy output
    pub outcome: AnalysisOutcome,
}

impl AnalysisResult {
    /// Total rejected samples
    pub fn error_count(&self) -> u64 {
        self.error_counts.values().sum()
    }
}

/// Strategy-specific output
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// One row per retained sample, no aggregation
    Passthrough { rows: Vec<ExtractedSample> },

    /// Summary statistics of the computed values
    BasicStats { stats: StatsSummary },

    /// Period / frequency / jitter analysis of a timestamp series
    Timestamp(TimestampSummary),
}

impl AnalysisOutcome {
    /// Flattened `name -> value` view of the summary statistics
    ///
    /// Absent statistics are left out. Passthrough yields only the row count.
    pub fn summary_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        match self {
            Self::Passthrough { rows } => {
                map.insert("rows".to_string(), rows.len() as f64);
            }
            Self::BasicStats { stats } => stats.insert_into(&mut map, ""),
            Self::Timestamp(ts) => {
                map.insert(
                    "specified_frequency_hz".to_string(),
                    ts.specified_frequency_hz,
                );
                map.insert("expected_period_s".to_string(), ts.expected_period_s);
                map.insert("anomaly_count".to_string(), ts.anomaly_count as f64);
                let optional = [
                    ("jitter_s", ts.jitter_s),
                    ("drift_min_s", ts.drift_min_s),
                    ("drift_max_s", ts.drift_max_s),
                    ("observed_frequency_hz", ts.observed_frequency_hz),
                    ("frequency_deviation_hz", ts.frequency_deviation_hz),
                    ("frequency_deviation_pct", ts.frequency_deviation_pct),
                ];
                for (name, value) in optional {
                    if let Some(v) = value {
                        map.insert(name.to_string(), v);
                    }
                }
                ts.period_s.insert_into(&mut map, "period_s.");
                ts.instantaneous_frequency_hz
                    .insert_into(&mut map, "frequency_hz.");
                ts.phase_deviation_s
                    .insert_into(&mut map, "phase_deviation_s.");
            }
        }
        map
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSummary {
    pub count: u64,
    pub mean: Option<f64>,
    /// Population standard deviation
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl StatsSummary {
    fn insert_into(&self, map: &mut BTreeMap<String, f64>, prefix: &str) {
        map.insert(format!("{prefix}count"), self.count as f64);
        let fields = [
            ("mean", self.mean),
            ("std", self.std_dev),
            ("min", self.min),
            ("max", self.max),
        ];
        for (name, value) in fields {
            if let Some(v) = value {
                map.insert(format!("{prefix}{name}"), v);
            }
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mean, self.std_dev, self.min, self.max) {
            (Some(mean), Some(std), Some(min), Some(max)) => write!(
                f,
                "min={:.6}, max={:.6}, mean={:.6}, std={:.6} (n={})",
                min, max, mean, std, self.count
            ),
            _ => write!(f, "N/A"),
        }
    }
}

/// Unit of the timestamps fed into the `timestamp` strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// Parse the short unit name used in analysis parameters
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ns" => Some(Self::Nanoseconds),
            "us" => Some(Self::Microseconds),
            "ms" => Some(Self::Milliseconds),
            "s" => Some(Self::Seconds),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
        }
    }

    /// Number of ticks of this unit in one second
    pub fn ticks_per_second(&self) -> f64 {
        match self {
            Self::Nanoseconds => 1e9,
            Self::Microseconds => 1e6,
            Self::Milliseconds => 1e3,
            Self::Seconds => 1.0,
        }
    }
}

/// Timestamp analysis summary
///
/// Period statistics only cover positive periods; non-positive ones are
/// counted in `anomaly_count`. All durations are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimestampSummary {
    pub specified_frequency_hz: f64,
    pub expected_period_s: f64,
    pub unit: TimeUnit,

    /// Inter-sample periods
    pub period_s: StatsSummary,

    /// Standard deviation of the period
    pub jitter_s: Option<f64>,

    /// Shortest period
    pub drift_min_s: Option<f64>,

    /// Longest period
    pub drift_max_s: Option<f64>,

    /// `1 / mean period`
    pub observed_frequency_hz: Option<f64>,

    /// Observed minus specified frequency
    pub frequency_deviation_hz: Option<f64>,

    /// Deviation relative to the specified frequency, in percent
    pub frequency_deviation_pct: Option<f64>,

    /// Per-period instantaneous frequency
    pub instantaneous_frequency_hz: StatsSummary,

    /// Deviation of each sample from the ideal grid anchored at the first sample
    pub phase_deviation_s: StatsSummary,

    /// Out-of-order or duplicate timestamps
    pub anomaly_count: u64,
}
