//! `run` command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use orchestrator::{PipelineOptions, TaskPipeline};
use reporter::{ReportDispatcher, SinkKind};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::sources::{collect_sources, open_sources};
use crate::summary::print_summary;

/// Execute the `run` command
pub async fn run_analysis(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // 任务在读取任何消息之前编译
    let pipeline = TaskPipeline::from_config(&config)
        .context("Failed to compile analysis tasks")?
        .with_options(PipelineOptions {
            concurrency: args.concurrency.max(1),
            retain_series: !args.no_series,
        });

    let files = collect_sources(&args.source)?;

    info!(
        tasks = pipeline.tasks().len(),
        files = files.len(),
        concurrency = pipeline.options().concurrency,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_plan(&pipeline, &files);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!(port = args.metrics_port, "Metrics endpoint available");
    }

    let sources = open_sources(&files)?;
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting analysis...");

    let report = tokio::select! {
        result = pipeline.run(sources) => result.context("Analysis run failed")?,
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping run...");
            return Err(CliError::Interrupted.into());
        }
    };

    let writes_files = args.sinks.iter().any(|kind| *kind != SinkKind::Log);
    let result_dir = result_dir(&args.output_dir);
    print_summary(&report, writes_files.then_some(result_dir.as_path()));

    let dispatcher = ReportDispatcher::from_kinds(&args.sinks, &result_dir)
        .context("Failed to create report sinks")?;
    dispatcher
        .dispatch(report)
        .await
        .context("Failed to write reports")?;

    info!("Telemetry Analyzer finished");
    Ok(())
}

/// `<output_dir>/<YYYYmmdd_HHMMSS>`
fn result_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(Local::now().format("%Y%m%d_%H%M%S").to_string())
}

/// Wait for Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print compiled tasks and log files for dry-run mode
fn print_plan(pipeline: &TaskPipeline, files: &[PathBuf]) {
    println!("\n=== Analysis Plan ===\n");
    println!("Tasks ({}):", pipeline.tasks().len());
    for task in pipeline.tasks() {
        println!(
            "  - {} <- {} [{}]",
            task.id(),
            task.topic_name(),
            task.kind()
        );
        println!("      expression: {}", task.plan().residual());
    }

    println!("\nLog files ({}):", files.len());
    for file in files {
        println!("  - {}", file.display());
    }
    println!();
}
