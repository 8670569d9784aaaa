//! 配置校验模块
//!
//! 校验规则：
//! - analyses 非空
//! - 任务 id 非空且唯一
//! - topic_name / parse_string 非空
//! - field_names 非空，且每个字段名非空、不重复
//!
//! parse_string 与 analysis_type 的语义校验在任务编译阶段完成。

use std::collections::HashSet;

use contracts::{AnalysisConfig, AnalysisTaskConfig, ContractError};

/// 校验 AnalysisConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AnalysisConfig) -> Result<(), ContractError> {
    if config.analyses.is_empty() {
        return Err(ContractError::config_validation(
            "analyses",
            "at least one analysis task is required",
        ));
    }
    validate_task_ids(config)?;
    for (idx, task) in config.analyses.iter().enumerate() {
        validate_task(idx, task)?;
    }
    Ok(())
}

/// 校验任务 id 唯一性
fn validate_task_ids(config: &AnalysisConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, task) in config.analyses.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("analyses[{idx}].id"),
                "task id cannot be empty",
            ));
        }
        if !seen.insert(task.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("analyses[id={}]", task.id),
                "duplicate task id",
            ));
        }
    }
    Ok(())
}

/// 校验单个任务的必填字段
fn validate_task(idx: usize, task: &AnalysisTaskConfig) -> Result<(), ContractError> {
    let field = |name: &str| format!("analyses[{idx}].{name}");

    if task.topic_name.trim().is_empty() {
        return Err(ContractError::config_validation(
            field("topic_name"),
            "topic_name cannot be empty",
        ));
    }
    if task.parse_string.trim().is_empty() {
        return Err(ContractError::config_validation(
            field("parse_string"),
            "parse_string cannot be empty",
        ));
    }
    if task.field_names.is_empty() {
        return Err(ContractError::config_validation(
            field("field_names"),
            "at least one field name is required",
        ));
    }

    let mut seen = HashSet::new();
    for name in &task.field_names {
        if name.is_empty() {
            return Err(ContractError::config_validation(
                field("field_names"),
                "field names cannot be empty",
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(ContractError::config_validation(
                field("field_names"),
                format!("duplicate field name '{name}'"),
            ));
        }
    }
    Ok(())
}
