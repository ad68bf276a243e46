use std::path::PathBuf;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::expectation::ValidationResult;
use crate::store::ValidationResultIdentifier;
use super::action::{ActionOutcome, ActionResult};
use super::config::CheckpointConfig;
use super::run_name::RunIdentifier;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRunResult {
    pub validation_result_identifier: ValidationResultIdentifier,
    pub validation_result: ValidationResult,
    pub actions_results: Vec<ActionResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub run_uuid: Uuid,
    pub run_id: RunIdentifier,
    pub checkpoint_config: CheckpointConfig,
    pub run_results: Vec<CheckpointRunResult>,
    pub success: bool,
}

impl CheckpointResult {
    pub fn new(run_id: RunIdentifier, checkpoint_config: CheckpointConfig, run_results: Vec<CheckpointRunResult>) -> Self {
        Self {
            run_uuid: Uuid::new_v4(),
            success: run_results.iter().all(|r| r.validation_result.success),
            run_id,
            checkpoint_config,
            run_results,
        }
    }

    pub fn name(&self) -> &str {
        &self.checkpoint_config.name
    }

    pub fn validation_results(&self) -> impl Iterator<Item = &ValidationResult> {
        self.run_results.iter().map(|r| &r.validation_result)
    }

    pub fn list_validation_result_identifiers(&self) -> Vec<&ValidationResultIdentifier> {
        self.run_results.iter().map(|r| &r.validation_result_identifier).collect()
    }

    /// Validation pages written by `UpdateDataDocsAction`, one per run result that has one.
    pub fn validation_pages(&self) -> Vec<&PathBuf> {
        self.run_results
            .iter()
            .filter_map(|r| {
                r.actions_results.iter().find_map(|a| match &a.outcome {
                    ActionOutcome::UpdateDataDocsAction { pages } => pages.first(),
                    _ => None,
                })
            })
            .collect()
    }

    pub fn stored_paths(&self) -> Vec<&PathBuf> {
        self.run_results
            .iter()
            .flat_map(|r| r.actions_results.iter())
            .filter_map(|a| match &a.outcome {
                ActionOutcome::StoreValidationResultAction { path } => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn evaluated_count(&self) -> usize {
        self.validation_results()
            .map(|r| r.statistics.evaluated_expectations)
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        self.validation_results().map(|r| r.failed_count()).sum()
    }
}
