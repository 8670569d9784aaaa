//! ExtractedSample / ValueSeries - extraction output

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{ContractError, FieldValue, Number, SampleError, SampleErrorKind};

/// One message's extraction result for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedSample {
    /// Message log time (nanoseconds)
    pub timestamp: u64,

    /// Field path -> raw extracted/cast value
    pub values: BTreeMap<String, FieldValue>,

    /// Result of the task's expression
    pub computed_value: Number,
}

/// Task-scoped, append-only sequence of samples in message arrival order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValueSeries {
    samples: Vec<ExtractedSample>,
    #[serde(skip)]
    frozen: bool,
}

impl ValueSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample
    ///
    /// # Errors
    /// Fails once the series has been frozen.
    pub fn push(&mut self, sample: ExtractedSample) -> Result<(), ContractError> {
        if self.frozen {
            return Err(ContractError::Other(
                "cannot append to a frozen value series".to_string(),
            ));
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Mark the series immutable (message stream exhausted)
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[ExtractedSample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractedSample> {
        self.samples.iter()
    }

    pub fn first_timestamp(&self) -> Option<u64> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.samples.last().map(|s| s.timestamp)
    }
}

/// Structured record of a rejected sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleDiagnostic {
    pub task_id: String,
    /// Timestamp of the message the sample came from
    pub timestamp: u64,
    pub kind: SampleErrorKind,
    pub message: String,
}

impl SampleDiagnostic {
    pub fn from_error(task_id: impl Into<String>, timestamp: u64, error: &SampleError) -> Self {
        Self {
            task_id: task_id.into(),
            timestamp,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64) -> ExtractedSample {
        ExtractedSample {
            timestamp: ts,
            values: BTreeMap::new(),
            computed_value: Number::Int(ts as i64),
        }
    }

    #[test]
    fn test_series_preserves_arrival_order() {
        let mut series = ValueSeries::new();
        for ts in [30, 10, 20] {
            series.push(sample(ts)).unwrap();
        }
        let order: Vec<u64> = series.iter().map(|s| s.timestamp).collect();
        assert_eq!(order, vec![30, 10, 20]);
        assert_eq!(series.first_timestamp(), Some(30));
        assert_eq!(series.last_timestamp(), Some(20));
    }

    #[test]
    fn test_frozen_series_rejects_push() {
        let mut series = ValueSeries::new();
        series.push(sample(1)).unwrap();
        series.freeze();
        assert!(series.is_frozen());
        assert!(series.push(sample(2)).is_err());
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_diagnostic_from_error() {
        let err = SampleError::field_not_found("pose.x", "missing member 'x'");
        let diag = SampleDiagnostic::from_error("task", 42, &err);
        assert_eq!(diag.kind, SampleErrorKind::FieldNotFound);
        assert_eq!(diag.timestamp, 42);
        assert!(diag.message.contains("pose.x"));
    }
}
