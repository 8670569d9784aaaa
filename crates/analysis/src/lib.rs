//! # Analysis
//!
//! 分析策略：对一个任务的 computed_value 序列做流式统计。
//!
//! 负责：
//! - 解析 `analysis_type` 字符串（`none` / `basic_stats` / `timestamp(freq:HZ)`）
//! - 逐样本增量累积（Welford 在线统计）
//! - 消息流结束后输出 `AnalysisOutcome`
//!
//! ## 使用示例
//!
//! ```ignore
//! use analysis::{AnalysisKind, AnalysisStrategy};
//!
//! let kind = AnalysisKind::parse("imu_rate", "timestamp(freq:100)")?;
//! let mut strategy = AnalysisStrategy::new(&kind);
//!
//! for sample in series.iter() {
//!     strategy.consume(sample);
//! }
//!
//! let outcome = strategy.finalize();
//! ```

mod kind;
mod stats;
mod strategy;
mod timestamp;

// Re-exports
pub use kind::AnalysisKind;
pub use stats::RunningStats;
pub use strategy::AnalysisStrategy;
pub use timestamp::TimestampAnalyzer;
