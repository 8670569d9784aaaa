//! AnalysisConfig - Config Loader output
//!
//! Describes the analysis tasks to run over a message stream.

use serde::{Deserialize, Deserializer, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Analysis task definitions
    pub analyses: Vec<AnalysisTaskConfig>,
}

/// A single analysis task as written in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisTaskConfig {
    /// Unique task identifier
    pub id: String,

    /// Topic whose messages feed this task
    pub topic_name: String,

    /// Declared field paths, either a list or a comma-separated string
    #[serde(deserialize_with = "deserialize_field_names")]
    pub field_names: Vec<String>,

    /// Expression over the declared fields with optional directives
    pub parse_string: String,

    /// Strategy name and parameters, e.g. `timestamp(freq:100)`
    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,
}

impl AnalysisTaskConfig {
    pub fn new(
        id: impl Into<String>,
        topic_name: impl Into<String>,
        field_names: &[&str],
        parse_string: impl Into<String>,
        analysis_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic_name: topic_name.into(),
            field_names: field_names.iter().map(|s| s.to_string()).collect(),
            parse_string: parse_string.into(),
            analysis_type: analysis_type.into(),
        }
    }
}

fn default_analysis_type() -> String {
    "none".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldNamesRepr {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_field_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let names = match FieldNamesRepr::deserialize(deserializer)? {
        FieldNamesRepr::List(list) => list.into_iter().map(|s| s.trim().to_string()).collect(),
        FieldNamesRepr::Joined(joined) => joined
            .split(',')
            .map(|s| s.trim().to_string())
            .collect(),
    };
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_joined_string() {
        let json = r#"{
            "id": "t",
            "topic_name": "/imu",
            "field_names": "header.stamp.sec, header.stamp.nanosec",
            "parse_string": "header.stamp.sec"
        }"#;
        let task: AnalysisTaskConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            task.field_names,
            vec!["header.stamp.sec".to_string(), "header.stamp.nanosec".to_string()]
        );
        assert_eq!(task.analysis_type, "none");
    }

    #[test]
    fn test_field_names_list() {
        let json = r#"{
            "id": "t",
            "topic_name": "/imu",
            "field_names": [" data ", "len"],
            "parse_string": "data",
            "analysis_type": "basic_stats"
        }"#;
        let task: AnalysisTaskConfig = serde_json::from_str(json).unwrap();
        assert_eq!(task.field_names, vec!["data".to_string(), "len".to_string()]);
        assert_eq!(task.analysis_type, "basic_stats");
    }
}
