//! # Telemetry Analyzer CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载、校验与任务编译
//! - 日志文件发现与分析运行
//! - 报告输出与优雅关闭处理

mod cli;
mod commands;
mod error;
mod sources;
mod summary;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_analysis, run_info, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Metrics exporter is started by `run` only
    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry Analyzer CLI starting"
    );

    let result = match &cli.command {
        Commands::Run(args) => run_analysis(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
