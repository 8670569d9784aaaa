//! Source units
//!
//! One unit drains one message source on a blocking thread and extracts a
//! sample for every task whose topic matches. Units never touch strategy
//! state; the pipeline folds their batches in source order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ContractError, ExtractedSample, MessageRecord, MessageSource, SampleError};
use observability::{record_message_read, record_source_duration_ms};
use tracing::{debug, info};

use crate::task::AnalysisTask;

/// Compiled tasks plus the topic index
#[derive(Debug)]
pub(crate) struct TaskRouter {
    tasks: Vec<Arc<AnalysisTask>>,
    by_topic: HashMap<String, Vec<usize>>,
}

impl TaskRouter {
    pub(crate) fn new(tasks: Vec<Arc<AnalysisTask>>) -> Self {
        let mut by_topic: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            by_topic
                .entry(task.topic_name().to_string())
                .or_default()
                .push(idx);
        }
        Self { tasks, by_topic }
    }

    pub(crate) fn tasks(&self) -> &[Arc<AnalysisTask>] {
        &self.tasks
    }

    pub(crate) fn topics(&self) -> impl Iterator<Item = &str> {
        self.by_topic.keys().map(String::as_str)
    }

    /// Indices of the tasks subscribed to `topic`, in configuration order
    pub(crate) fn matching(&self, topic: &str) -> &[usize] {
        self.by_topic.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Extract one sample per matching task
    pub(crate) fn route(&self, message: &MessageRecord) -> Vec<RoutedSample> {
        self.matching(&message.topic)
            .iter()
            .map(|&task| RoutedSample {
                task,
                timestamp: message.timestamp,
                outcome: self.tasks[task].plan().extract(message),
            })
            .collect()
    }
}

/// Extraction outcome of one message for one task
#[derive(Debug)]
pub(crate) struct RoutedSample {
    pub task: usize,
    pub timestamp: u64,
    pub outcome: Result<ExtractedSample, SampleError>,
}

/// Everything a unit produced from its source, in arrival order
#[derive(Debug, Default)]
pub(crate) struct SourceBatch {
    pub source_name: String,
    pub messages_read: u64,
    pub messages_matched: u64,
    pub samples: Vec<RoutedSample>,
    pub duration: Duration,
}

/// Drain `source` completely
///
/// # Errors
/// The first `ContractError::Source` the source reports.
pub(crate) fn process_source(
    mut source: Box<dyn MessageSource>,
    router: &TaskRouter,
) -> Result<SourceBatch, ContractError> {
    let start = Instant::now();
    let mut batch = SourceBatch {
        source_name: source.name().to_string(),
        ..Default::default()
    };

    debug!(source = %batch.source_name, "Source unit started");

    while let Some(message) = source.next_message()? {
        batch.messages_read += 1;
        record_message_read(&batch.source_name);

        let routed = router.route(&message);
        if !routed.is_empty() {
            batch.messages_matched += 1;
            batch.samples.extend(routed);
        }
    }

    batch.duration = start.elapsed();
    record_source_duration_ms(&batch.source_name, batch.duration.as_secs_f64() * 1000.0);

    info!(
        source = %batch.source_name,
        messages = batch.messages_read,
        matched = batch.messages_matched,
        duration_ms = batch.duration.as_millis() as u64,
        "Source exhausted"
    );

    Ok(batch)
}
