use serde::{Deserialize, Serialize};
use crate::datasource::BatchRequest;
use crate::error::{DqError, Result};
use super::action::ActionConfig;

const CHECKPOINT_CLASS_NAMES: &[&str] = &["Checkpoint", "SimpleCheckpoint"];

fn default_config_version() -> f64 {
    1.0
}

fn default_class_name() -> String {
    "Checkpoint".to_string()
}

/// Store the result, then refresh the docs.
pub fn default_action_list() -> Vec<ActionConfig> {
    vec![
        ActionConfig::store_validation_result(),
        ActionConfig::update_data_docs(),
    ]
}

/// A batch/suite pairing; unset fields fall back to the checkpoint's own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CheckpointValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_request: Option<BatchRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation_suite_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub name: String,
    #[serde(default = "default_config_version")]
    pub config_version: f64,
    #[serde(default = "default_class_name")]
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expectation_suite_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_request: Option<BatchRequest>,
    #[serde(default = "default_action_list")]
    pub action_list: Vec<ActionConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<CheckpointValidation>,
}

impl CheckpointConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_version: default_config_version(),
            class_name: default_class_name(),
            run_name_template: None,
            expectation_suite_name: None,
            batch_request: None,
            action_list: default_action_list(),
            validations: Vec::new(),
        }
    }

    pub fn with_run_name_template(mut self, template: impl Into<String>) -> Self {
        self.run_name_template = Some(template.into());
        self
    }

    pub fn with_expectation_suite_name(mut self, suite_name: impl Into<String>) -> Self {
        self.expectation_suite_name = Some(suite_name.into());
        self
    }

    pub fn with_batch_request(mut self, batch_request: BatchRequest) -> Self {
        self.batch_request = Some(batch_request);
        self
    }

    pub fn with_action_list(mut self, action_list: Vec<ActionConfig>) -> Self {
        self.action_list = action_list;
        self
    }

    pub fn with_validation(mut self, validation: CheckpointValidation) -> Self {
        self.validations.push(validation);
        self
    }

    pub fn to_yaml_str(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: CheckpointConfig = serde_yaml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        crate::store::validate_name("checkpoint", &self.name)?;
        if !CHECKPOINT_CLASS_NAMES.contains(&self.class_name.as_str()) {
            return Err(DqError::Checkpoint(format!(
                "checkpoint '{}' has unsupported class_name '{}'",
                self.name, self.class_name
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for action in &self.action_list {
            if !seen.insert(action.name.as_str()) {
                return Err(DqError::Checkpoint(format!(
                    "checkpoint '{}' has duplicate action name '{}'",
                    self.name, action.name
                )));
            }
        }
        Ok(())
    }

    /// Resolve every (batch request, suite) pair this checkpoint validates.
    pub fn resolved_validations(&self) -> Result<Vec<(BatchRequest, String)>> {
        let entries = if self.validations.is_empty() {
            vec![CheckpointValidation::default()]
        } else {
            self.validations.clone()
        };

        entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let batch_request = entry
                    .batch_request
                    .or_else(|| self.batch_request.clone())
                    .ok_or_else(|| {
                        DqError::Checkpoint(format!(
                            "checkpoint '{}' validation {} has no batch_request",
                            self.name, i
                        ))
                    })?;
                let suite_name = entry
                    .expectation_suite_name
                    .or_else(|| self.expectation_suite_name.clone())
                    .ok_or_else(|| {
                        DqError::Checkpoint(format!(
                            "checkpoint '{}' validation {} has no expectation_suite_name",
                            self.name, i
                        ))
                    })?;
                Ok((batch_request, suite_name))
            })
            .collect()
    }
}
