//! # Orchestrator
//!
//! 任务编排：编译分析任务，按 topic 路由消息，驱动抽取与分析策略。
//!
//! ## 流程
//!
//! 1. `TaskPipeline::new` 编译全部任务（任一失败即返回，不读取任何消息）
//! 2. 每个消息源由独立单元在阻塞线程上读取并抽取样本，并发数受限
//! 3. 按消息源给定顺序合并结果，依次喂给各任务的分析策略
//! 4. 全部消息源结束后冻结序列、完成策略，生成 `RunReport`
//!
//! 任一消息源返回 SourceError 时整个运行中止。
//!
//! ## 使用示例
//!
//! ```ignore
//! use orchestrator::{PipelineOptions, TaskPipeline};
//!
//! let pipeline = TaskPipeline::from_config(&config)?
//!     .with_options(PipelineOptions { concurrency: 4, retain_series: true });
//! let report = pipeline.run(sources).await?;
//! for task in &report.tasks {
//!     println!("{}: {} samples", task.result.task_id, task.result.sample_count);
//! }
//! ```

mod pipeline;
mod task;
mod unit;

pub use pipeline::{PipelineOptions, TaskPipeline};
pub use task::AnalysisTask;
