//! `validate` command implementation.

use anyhow::{Context, Result};
use orchestrator::TaskPipeline;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    task_count: usize,
    topic_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();
    let invalid = |error: String| ValidationResult {
        valid: false,
        config_path: config_path.clone(),
        error: Some(error),
        warnings: None,
        summary: None,
    };

    if !args.config.exists() {
        return invalid(format!("File not found: {}", args.config.display()));
    }

    // 结构校验
    let config = match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => return invalid(e.to_string()),
    };

    // 编译校验：指令、类型、表达式、分析类型
    let pipeline = match TaskPipeline::from_config(&config) {
        Ok(pipeline) => pipeline,
        Err(e) => return invalid(e.to_string()),
    };

    let warnings = collect_warnings(&pipeline);
    ValidationResult {
        valid: true,
        config_path: config_path.clone(),
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary: Some(ConfigSummary {
            version: format!("{:?}", config.version),
            task_count: pipeline.tasks().len(),
            topic_count: pipeline.topics().count(),
        }),
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(pipeline: &TaskPipeline) -> Vec<String> {
    let mut warnings = Vec::new();

    for task in pipeline.tasks() {
        let unused: Vec<&str> = task.plan().unreferenced_fields().collect();
        if !unused.is_empty() {
            warnings.push(format!(
                "Task '{}' declares fields not used in parse_string: {}",
                task.id(),
                unused.join(", ")
            ));
        }
        if task.kind().name() == "none" {
            warnings.push(format!(
                "Task '{}' has no analysis strategy - values are only passed through",
                task.id()
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Tasks: {}", summary.task_count);
            println!("  Topics: {}", summary.topic_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn validate_file(dir: &Path, content: &str) -> ValidationResult {
        let path = dir.join("analysis.toml");
        std::fs::write(&path, content).unwrap();
        validate_config(&ValidateArgs {
            config: path,
            json: false,
        })
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let dir = tempdir().unwrap();
        let result = validate_file(
            dir.path(),
            r#"
[[analyses]]
id = "speed"
topic_name = "/status"
field_names = ["speed", "mode"]
parse_string = "speed * 3.6"
"#,
        );
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("mode"));
        assert_eq!(result.summary.unwrap().task_count, 1);
    }

    #[test]
    fn test_unused_field_matched_by_name_not_substring() {
        let dir = tempdir().unwrap();
        let result = validate_file(
            dir.path(),
            r#"
[[analyses]]
id = "wheel"
topic_name = "/status"
field_names = ["a", "ab"]
parse_string = "ab * 2"
analysis_type = "basic_stats"
"#,
        );
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].ends_with(": a"), "{}", warnings[0]);
    }

    #[test]
    fn test_compile_error_is_invalid() {
        let dir = tempdir().unwrap();
        let result = validate_file(
            dir.path(),
            r#"
[[analyses]]
id = "raw"
topic_name = "/can"
field_names = ["data"]
parse_string = "data(byte:0-2,type:int24)"
analysis_type = "basic_stats"
"#,
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("raw"));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&ValidateArgs {
            config: "/definitely/missing.toml".into(),
            json: true,
        });
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
