//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use orchestrator::{AnalysisTask, TaskPipeline};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::sources::{collect_sources, open_sources};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    tasks: Vec<TaskInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<SourceInfo>,
}

#[derive(Serialize)]
struct TaskInfo {
    id: String,
    topic_name: String,
    analysis: String,
    expression: String,
    fields: Vec<FieldInfo>,
}

#[derive(Serialize)]
struct FieldInfo {
    path: String,
    directive: String,
}

#[derive(Serialize)]
struct SourceInfo {
    files: Vec<String>,
    messages: u64,
    topics: Vec<TopicInfo>,
}

#[derive(Serialize)]
struct TopicInfo {
    topic: String,
    messages: u64,
    tasks: Vec<String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let pipeline =
        TaskPipeline::from_config(&config).context("Failed to compile analysis tasks")?;

    let source = match &args.source {
        Some(path) => Some(scan_source(path, &pipeline)?),
        None => None,
    };

    let info = ConfigInfo {
        tasks: pipeline.tasks().iter().map(|t| task_info(t)).collect(),
        source,
    };

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn task_info(task: &AnalysisTask) -> TaskInfo {
    let fields = task
        .field_names()
        .iter()
        .map(|path| FieldInfo {
            path: path.clone(),
            directive: task
                .plan()
                .directive(path)
                .map(|d| d.mode.to_string())
                .unwrap_or_default(),
        })
        .collect();

    TaskInfo {
        id: task.id().to_string(),
        topic_name: task.topic_name().to_string(),
        analysis: task.kind().to_string(),
        expression: task.plan().residual().to_string(),
        fields,
    }
}

/// Count messages per topic across every log file of `path`
fn scan_source(path: &std::path::Path, pipeline: &TaskPipeline) -> Result<SourceInfo> {
    let files = collect_sources(path)?;
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut messages = 0u64;

    for mut source in open_sources(&files)? {
        while let Some(message) = source.next_message()? {
            messages += 1;
            *counts.entry(message.topic).or_default() += 1;
        }
    }

    let topics = counts
        .into_iter()
        .map(|(topic, messages)| TopicInfo {
            tasks: pipeline
                .tasks()
                .iter()
                .filter(|t| t.topic_name() == topic)
                .map(|t| t.id().to_string())
                .collect(),
            topic,
            messages,
        })
        .collect();

    Ok(SourceInfo {
        files: files.iter().map(|f| f.display().to_string()).collect(),
        messages,
        topics,
    })
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Analysis Tasks ({}) ===\n", info.tasks.len());
    for task in &info.tasks {
        println!("  {} <- {}", task.id, task.topic_name);
        println!("    analysis:   {}", task.analysis);
        println!("    expression: {}", task.expression);
        for field in &task.fields {
            println!("    field:      {} ({})", field.path, field.directive);
        }
    }

    if let Some(source) = &info.source {
        println!(
            "\n=== Log Source ({} files, {} messages) ===\n",
            source.files.len(),
            source.messages
        );
        for topic in &source.topics {
            let tasks = if topic.tasks.is_empty() {
                "-".to_string()
            } else {
                topic.tasks.join(", ")
            };
            println!("  {:<40} {:>10}  {}", topic.topic, topic.messages, tasks);
        }
    }
    println!();
}
