//! 运行指标记录模块
//!
//! 基于 `metrics` facade 记录消息读取、样本接受/拒绝、任务结果和报告写出。
//! 未安装 recorder 时所有调用都是空操作。

use contracts::{AnalysisResult, PipelineStats, SampleErrorKind};
use metrics::{counter, gauge, histogram};

/// 记录一条已读取的消息
pub fn record_message_read(source: &str) {
    counter!("telemetry_analyzer_messages_read_total", "source" => source.to_string())
        .increment(1);
}

/// 记录一个被接受的样本
pub fn record_sample_accepted(task_id: &str) {
    counter!("telemetry_analyzer_samples_accepted_total", "task_id" => task_id.to_string())
        .increment(1);
}

/// 记录一个被拒绝的样本（按错误类别区分）
pub fn record_sample_rejected(task_id: &str, kind: SampleErrorKind) {
    counter!(
        "telemetry_analyzer_samples_rejected_total",
        "task_id" => task_id.to_string(),
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// 记录单个消息源的处理耗时
pub fn record_source_duration_ms(source: &str, duration_ms: f64) {
    histogram!("telemetry_analyzer_source_duration_ms", "source" => source.to_string())
        .record(duration_ms);
}

/// 将任务结果导出为 gauge
///
/// 每个统计量一条 `stat` 标签，例如 `period_s.mean`、`jitter_s`。
pub fn record_task_result(result: &AnalysisResult) {
    let task_id = result.task_id.clone();

    gauge!("telemetry_analyzer_task_messages", "task_id" => task_id.clone())
        .set(result.message_count as f64);
    gauge!("telemetry_analyzer_task_samples", "task_id" => task_id.clone())
        .set(result.sample_count as f64);

    for (stat, value) in result.outcome.summary_map() {
        gauge!(
            "telemetry_analyzer_task_stat",
            "task_id" => task_id.clone(),
            "stat" => stat
        )
        .set(value);
    }
}

/// 记录报告写出结果
pub fn record_report_written(sink: &str, success: bool) {
    let status = if success { "ok" } else { "error" };
    counter!(
        "telemetry_analyzer_reports_written_total",
        "sink" => sink.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录整次运行的汇总
pub fn record_run_stats(stats: &PipelineStats) {
    gauge!("telemetry_analyzer_run_sources").set(stats.sources as f64);
    gauge!("telemetry_analyzer_run_messages_matched").set(stats.messages_matched as f64);
    gauge!("telemetry_analyzer_run_messages_per_sec").set(stats.messages_per_sec());
    gauge!("telemetry_analyzer_run_rejection_rate").set(stats.rejection_rate());
    histogram!("telemetry_analyzer_run_duration_ms")
        .record(stats.duration.as_secs_f64() * 1000.0);
}
