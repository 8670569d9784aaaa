//! Task Pipeline - drives every task over every source
//!
//! Sources are drained concurrently by independent units; their batches are
//! folded into the task states strictly in the order the sources were given,
//! so order-dependent strategies see the same sequence as a sequential run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use analysis::AnalysisStrategy;
use contracts::{
    AnalysisConfig, AnalysisResult, AnalysisTaskConfig, ContractError, ExtractedSample,
    MessageSource, PipelineStats, RunReport, SampleDiagnostic, SampleError, SampleErrorKind,
    TaskReport, ValueSeries,
};
use observability::{
    record_run_stats, record_sample_accepted, record_sample_rejected, record_task_result,
};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::task::AnalysisTask;
use crate::unit::{process_source, SourceBatch, TaskRouter};

/// Pipeline options
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum number of sources drained at the same time
    pub concurrency: usize,

    /// Keep every accepted sample in the task's `ValueSeries`
    pub retain_series: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            retain_series: true,
        }
    }
}

/// Compiled tasks ready to run over message sources
#[derive(Debug, Clone)]
pub struct TaskPipeline {
    router: Arc<TaskRouter>,
    options: PipelineOptions,
}

impl TaskPipeline {
    /// Compile every task before any message is read
    ///
    /// # Errors
    /// The first task that fails to compile.
    pub fn new(configs: &[AnalysisTaskConfig]) -> Result<Self, ContractError> {
        let tasks = configs
            .iter()
            .map(|config| AnalysisTask::compile(config).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        info!(tasks = tasks.len(), "Task pipeline compiled");

        Ok(Self {
            router: Arc::new(TaskRouter::new(tasks)),
            options: PipelineOptions::default(),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ContractError> {
        Self::new(&config.analyses)
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn tasks(&self) -> &[Arc<AnalysisTask>] {
        self.router.tasks()
    }

    /// Topics at least one task subscribes to
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.router.topics()
    }

    /// Run all tasks over `sources` and produce the report
    ///
    /// # Errors
    /// A `ContractError::Source` from any unit aborts the whole run.
    #[instrument(
        name = "pipeline_run",
        skip_all,
        fields(sources = sources.len(), tasks = self.tasks().len())
    )]
    pub async fn run(
        &self,
        sources: Vec<Box<dyn MessageSource>>,
    ) -> Result<RunReport, ContractError> {
        let start = Instant::now();
        let source_count = sources.len();
        let mut handles = self.spawn_units(sources).into_iter();

        let mut states: Vec<TaskState> = self
            .tasks()
            .iter()
            .map(|task| TaskState::new(Arc::clone(task), self.options.retain_series))
            .collect();
        let mut stats = PipelineStats {
            sources: source_count,
            ..Default::default()
        };

        while let Some(handle) = handles.next() {
            let batch = match join_unit(handle).await {
                Ok(batch) => batch,
                Err(e) => {
                    for pending in handles {
                        pending.abort();
                    }
                    warn!(error = %e, "Run aborted");
                    return Err(e);
                }
            };
            fold_batch(&mut states, &mut stats, batch)?;
        }

        let tasks: Vec<TaskReport> = states.into_iter().map(TaskState::finish).collect();
        stats.duration = start.elapsed();
        record_run_stats(&stats);

        info!(
            messages = stats.messages_read,
            accepted = stats.samples_accepted,
            rejected = stats.samples_rejected,
            duration_secs = stats.duration.as_secs_f64(),
            "Run complete"
        );

        Ok(RunReport { tasks, stats })
    }

    fn spawn_units(
        &self,
        sources: Vec<Box<dyn MessageSource>>,
    ) -> Vec<JoinHandle<Result<SourceBatch, ContractError>>> {
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));

        sources
            .into_iter()
            .map(|source| {
                let router = Arc::clone(&self.router);
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|e| ContractError::Other(e.to_string()))?;
                    let name = source.name().to_string();
                    tokio::task::spawn_blocking(move || process_source(source, &router))
                        .await
                        .map_err(|e| ContractError::source(name, format!("unit failed: {e}")))?
                })
            })
            .collect()
    }
}

async fn join_unit(
    handle: JoinHandle<Result<SourceBatch, ContractError>>,
) -> Result<SourceBatch, ContractError> {
    handle
        .await
        .map_err(|e| ContractError::Other(format!("source unit join failed: {e}")))?
}

fn fold_batch(
    states: &mut [TaskState],
    stats: &mut PipelineStats,
    batch: SourceBatch,
) -> Result<(), ContractError> {
    stats.messages_read += batch.messages_read;
    stats.messages_matched += batch.messages_matched;

    for routed in batch.samples {
        let state = &mut states[routed.task];
        state.message_count += 1;
        match routed.outcome {
            Ok(sample) => {
                state.accept(sample)?;
                stats.samples_accepted += 1;
            }
            Err(e) => {
                state.reject(routed.timestamp, &e);
                stats.samples_rejected += 1;
            }
        }
    }
    Ok(())
}

/// Mutable per-task state during one run
struct TaskState {
    task: Arc<AnalysisTask>,
    strategy: AnalysisStrategy,
    retain_series: bool,
    series: ValueSeries,
    diagnostics: Vec<SampleDiagnostic>,
    error_counts: BTreeMap<SampleErrorKind, u64>,
    message_count: u64,
    sample_count: u64,
    first_timestamp: Option<u64>,
    last_timestamp: Option<u64>,
}

impl TaskState {
    fn new(task: Arc<AnalysisTask>, retain_series: bool) -> Self {
        Self {
            strategy: task.strategy(),
            task,
            retain_series,
            series: ValueSeries::new(),
            diagnostics: Vec::new(),
            error_counts: BTreeMap::new(),
            message_count: 0,
            sample_count: 0,
            first_timestamp: None,
            last_timestamp: None,
        }
    }

    fn accept(&mut self, sample: ExtractedSample) -> Result<(), ContractError> {
        self.strategy.consume(&sample);
        self.sample_count += 1;
        self.first_timestamp.get_or_insert(sample.timestamp);
        self.last_timestamp = Some(sample.timestamp);
        record_sample_accepted(self.task.id());

        if self.retain_series {
            self.series.push(sample)?;
        }
        Ok(())
    }

    fn reject(&mut self, timestamp: u64, error: &SampleError) {
        let kind = error.kind();
        warn!(
            task_id = %self.task.id(),
            timestamp,
            kind = %kind,
            error = %error,
            "Sample rejected"
        );
        record_sample_rejected(self.task.id(), kind);

        *self.error_counts.entry(kind).or_default() += 1;
        self.diagnostics
            .push(SampleDiagnostic::from_error(self.task.id(), timestamp, error));
    }

    fn finish(mut self) -> TaskReport {
        self.series.freeze();
        let strategy = self.strategy.name().to_string();

        let result = AnalysisResult {
            task_id: self.task.id().to_string(),
            topic_name: self.task.topic_name().to_string(),
            strategy,
            analysis_type: self.task.analysis_type().to_string(),
            message_count: self.message_count,
            sample_count: self.sample_count,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
            error_counts: self.error_counts,
            outcome: self.strategy.finalize(),
        };
        record_task_result(&result);

        info!(
            task_id = %result.task_id,
            messages = result.message_count,
            samples = result.sample_count,
            errors = result.error_count(),
            "Task finalized"
        );

        TaskReport {
            field_names: self.task.field_names().to_vec(),
            result,
            series: self.series,
            diagnostics: self.diagnostics,
        }
    }
}
