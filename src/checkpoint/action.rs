use std::path::PathBuf;
use serde::{Deserialize, Serialize};

pub const STORE_VALIDATION_RESULT: &str = "store_validation_result";
pub const UPDATE_DATA_DOCS: &str = "update_data_docs";

/// One entry of a checkpoint's `action_list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub name: String,
    pub action: ActionSpec,
}

impl ActionConfig {
    pub fn new(name: impl Into<String>, action: ActionSpec) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }

    pub fn store_validation_result() -> Self {
        Self::new(STORE_VALIDATION_RESULT, ActionSpec::StoreValidationResultAction)
    }

    pub fn update_data_docs() -> Self {
        Self::new(UPDATE_DATA_DOCS, ActionSpec::UpdateDataDocsAction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum ActionSpec {
    StoreValidationResultAction,
    UpdateDataDocsAction,
}

impl ActionSpec {
    pub fn class_name(&self) -> &'static str {
        match self {
            ActionSpec::StoreValidationResultAction => "StoreValidationResultAction",
            ActionSpec::UpdateDataDocsAction => "UpdateDataDocsAction",
        }
    }
}

/// What an executed action left behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name")]
pub enum ActionOutcome {
    StoreValidationResultAction { path: PathBuf },
    UpdateDataDocsAction { pages: Vec<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub name: String,
    pub outcome: ActionOutcome,
}

impl ActionResult {
    pub fn paths(&self) -> Vec<&PathBuf> {
        match &self.outcome {
            ActionOutcome::StoreValidationResultAction { path } => vec![path],
            ActionOutcome::UpdateDataDocsAction { pages } => pages.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_yaml_shape() {
        let yaml = serde_yaml::to_string(&ActionConfig::store_validation_result()).unwrap();
        assert!(yaml.contains("name: store_validation_result"));
        assert!(yaml.contains("class_name: StoreValidationResultAction"));
    }

    #[test]
    fn test_unknown_class_name_rejected() {
        let yaml = "name: notify\naction:\n  class_name: SlackNotificationAction\n";
        assert!(serde_yaml::from_str::<ActionConfig>(yaml).is_err());
    }
}
