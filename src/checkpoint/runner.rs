use chrono::{DateTime, Utc};
use tracing::{debug, info};
use crate::context::DataContext;
use crate::error::{DqError, Result};
use crate::expectation::ValidationResult;
use crate::store::ValidationResultIdentifier;
use crate::validator::validate_batch;
use super::action::{ActionConfig, ActionOutcome, ActionResult, ActionSpec};
use super::config::CheckpointConfig;
use super::result::{CheckpointResult, CheckpointRunResult};
use super::run_name::{render_run_name, RunIdentifier};

/// A checkpoint bound to the context it reads batches and suites from.
pub struct Checkpoint<'a> {
    context: &'a DataContext,
    config: CheckpointConfig,
}

impl<'a> Checkpoint<'a> {
    pub fn new(context: &'a DataContext, config: CheckpointConfig) -> Self {
        Self { context, config }
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    pub fn run(&self) -> Result<CheckpointResult> {
        self.run_at(Utc::now())
    }

    pub fn run_at(&self, run_time: DateTime<Utc>) -> Result<CheckpointResult> {
        self.config.check()?;

        let run_name = self
            .config
            .run_name_template
            .as_deref()
            .map(|template| render_run_name(template, run_time))
            .transpose()?;
        let run_id = RunIdentifier::new(run_name, run_time);

        info!("Running checkpoint '{}' ({})", self.config.name, run_id);

        let mut run_results = Vec::new();
        for (batch_request, suite_name) in self.config.resolved_validations()? {
            let batch = self.context.get_batch(&batch_request)?;
            let suite = self
                .context
                .get_expectation_suite(&suite_name)
                .map_err(|e| match e {
                    DqError::SuiteNotFound(name) => DqError::Checkpoint(format!(
                        "checkpoint '{}' references missing expectation suite '{}'",
                        self.config.name, name
                    )),
                    other => other,
                })?;

            let mut result = validate_batch(&batch, &suite);
            result.meta.run_id = Some(run_id.clone());
            result.meta.checkpoint_name = Some(self.config.name.clone());
            let identifier = ValidationResultIdentifier::from_result(&result);

            info!(
                "Validated '{}' against batch '{}': {}/{} expectations passed",
                suite_name,
                batch.id,
                result.passed_count(),
                result.statistics.evaluated_expectations
            );

            let mut actions_results = Vec::with_capacity(self.config.action_list.len());
            for action in &self.config.action_list {
                let outcome = self.execute_action(action, &result).map_err(|e| DqError::Action {
                    name: action.name.clone(),
                    message: e.to_string(),
                })?;
                actions_results.push(ActionResult {
                    name: action.name.clone(),
                    outcome,
                });
            }

            run_results.push(CheckpointRunResult {
                validation_result_identifier: identifier,
                validation_result: result,
                actions_results,
            });
        }

        let checkpoint_result = CheckpointResult::new(run_id, self.config.clone(), run_results);
        info!(
            "Checkpoint '{}' finished: {}",
            self.config.name,
            if checkpoint_result.success { "success" } else { "failed" }
        );
        Ok(checkpoint_result)
    }

    fn execute_action(&self, action: &ActionConfig, result: &ValidationResult) -> Result<ActionOutcome> {
        debug!("Executing action '{}' ({})", action.name, action.action.class_name());
        match action.action {
            ActionSpec::StoreValidationResultAction => {
                let (_, path) = self.context.store_validation_result(result)?;
                Ok(ActionOutcome::StoreValidationResultAction { path })
            }
            ActionSpec::UpdateDataDocsAction => {
                let pages = self.context.update_data_docs_for(result)?;
                Ok(ActionOutcome::UpdateDataDocsAction { pages })
            }
        }
    }
}
