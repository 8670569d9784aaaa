//! AnalysisTask - compiled task definition

use analysis::{AnalysisKind, AnalysisStrategy};
use contracts::{AnalysisTaskConfig, ContractError};
use extraction::ExtractionPlan;
use tracing::debug;

/// A task compiled once before any message is read
///
/// Immutable after `compile`; shared between source units behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AnalysisTask {
    config: AnalysisTaskConfig,
    kind: AnalysisKind,
    plan: ExtractionPlan,
}

impl AnalysisTask {
    /// Compile the analysis type and the parse string of one task
    ///
    /// # Errors
    /// `ContractError::Config` naming the task id.
    pub fn compile(config: &AnalysisTaskConfig) -> Result<Self, ContractError> {
        let kind = AnalysisKind::parse(&config.id, &config.analysis_type)?;
        let plan = ExtractionPlan::compile(&config.id, &config.field_names, &config.parse_string)?;

        debug!(
            task_id = %config.id,
            topic = %config.topic_name,
            analysis = %kind,
            "Task compiled"
        );

        Ok(Self {
            config: config.clone(),
            kind,
            plan,
        })
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn topic_name(&self) -> &str {
        &self.config.topic_name
    }

    pub fn field_names(&self) -> &[String] {
        &self.config.field_names
    }

    pub fn parse_string(&self) -> &str {
        &self.config.parse_string
    }

    /// Analysis type as written in configuration
    pub fn analysis_type(&self) -> &str {
        &self.config.analysis_type
    }

    pub fn kind(&self) -> &AnalysisKind {
        &self.kind
    }

    pub fn plan(&self) -> &ExtractionPlan {
        &self.plan
    }

    /// Fresh strategy state for one run
    pub fn strategy(&self) -> AnalysisStrategy {
        AnalysisStrategy::new(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile() {
        let config = AnalysisTaskConfig::new(
            "wheel",
            "/can",
            &["data"],
            "data(byte:0-2,type:uint16) / 100",
            "basic_stats",
        );
        let task = AnalysisTask::compile(&config).unwrap();
        assert_eq!(task.id(), "wheel");
        assert_eq!(task.topic_name(), "/can");
        assert_eq!(task.kind(), &AnalysisKind::BasicStats);
        assert_eq!(task.strategy().name(), "basic_stats");
        assert!(task.plan().directive("data").is_some());
    }

    #[test]
    fn test_unknown_analysis_type() {
        let config = AnalysisTaskConfig::new("t", "/x", &["v"], "v", "histogram");
        let err = AnalysisTask::compile(&config).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("t"));
    }

    #[test]
    fn test_unknown_target_type() {
        let config = AnalysisTaskConfig::new("t", "/x", &["v"], "v(type:int128)", "none");
        assert!(AnalysisTask::compile(&config).unwrap_err().is_config());
    }
}
