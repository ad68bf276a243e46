//! A declarative run of the whole authoring flow: load a CSV, register it,
//! build and save a suite, run a checkpoint, build docs and optionally write
//! a profiling page.

use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::checkpoint::{default_action_list, ActionConfig, CheckpointConfig, CheckpointResult};
use crate::context::DataContext;
use crate::dataset::{read_csv, CsvReadOptions};
use crate::error::{DqError, Result};
use crate::expectation::{ExpectationConfig, ExpectationValidationResult};
use crate::profile::render_profiling_page;
use crate::store::write_bytes_atomic;

const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStep {
    pub path: PathBuf,
    #[serde(flatten)]
    pub options: CsvReadOptions,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetMode {
    /// Load once and register the data in memory.
    #[default]
    Dataframe,
    /// Register the file path; every batch re-reads it.
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasourceStep {
    pub name: String,
    pub asset: String,
    #[serde(default)]
    pub mode: AssetMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteStep {
    pub name: String,
    #[serde(default)]
    pub discard_failed: bool,
    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointStep {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name_template: Option<String>,
    #[serde(default = "default_action_list")]
    pub action_list: Vec<ActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileStep {
    pub output: PathBuf,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dataset: DatasetStep,
    pub datasource: DatasourceStep,
    pub suite: SuiteStep,
    pub checkpoint: CheckpointStep,
    #[serde(default = "default_true")]
    pub build_docs: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileStep>,
    /// Relative paths in the file resolve against this directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub row_count: usize,
    pub column_count: usize,
    pub preview: String,
    pub expectation_results: Vec<ExpectationValidationResult>,
    pub suite_path: PathBuf,
    pub checkpoint_yaml: String,
    pub checkpoint_result: CheckpointResult,
    pub docs_index: Option<PathBuf>,
    pub profile_path: Option<PathBuf>,
}

impl PipelineReport {
    pub fn success(&self) -> bool {
        self.checkpoint_result.success
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| DqError::Pipeline(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_yaml_str(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(content)?;
        if config.suite.expectations.is_empty() {
            return Err(DqError::Pipeline(format!(
                "suite '{}' declares no expectations",
                config.suite.name
            )));
        }
        Ok(config)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn run(&self, context: &mut DataContext) -> Result<PipelineReport> {
        let dataset_path = self.resolve(&self.dataset.path);
        let frame = read_csv(&dataset_path, &self.dataset.options)?;
        let row_count = frame.row_count();
        let column_count = frame.column_count();
        let preview = frame.render_table(PREVIEW_ROWS);
        info!("Pipeline loaded {} rows x {} columns", row_count, column_count);

        let ds = &self.datasource;
        context.add_or_update_datasource(&ds.name)?;
        let mut request = match ds.mode {
            AssetMode::Dataframe => context.add_dataframe_asset(&ds.name, &ds.asset, frame)?,
            AssetMode::Csv => {
                context.add_csv_asset(&ds.name, &ds.asset, dataset_path, self.dataset.options.clone())?
            }
        };
        if let Some(limit) = ds.limit {
            request = request.with_limit(limit);
        }

        context.add_or_update_expectation_suite(&self.suite.name)?;
        let mut validator = context.get_validator(&request, &self.suite.name)?;
        let expectation_results = self
            .suite
            .expectations
            .iter()
            .map(|config| validator.expect(config.clone()))
            .collect::<Result<Vec<_>>>()?;
        let suite_path = validator.save_expectation_suite(self.suite.discard_failed)?;

        let mut checkpoint = CheckpointConfig::new(&self.checkpoint.name)
            .with_expectation_suite_name(&self.suite.name)
            .with_batch_request(request)
            .with_action_list(self.checkpoint.action_list.clone());
        if let Some(template) = &self.checkpoint.run_name_template {
            checkpoint = checkpoint.with_run_name_template(template);
        }
        context.add_or_update_checkpoint(&checkpoint)?;
        let checkpoint_yaml = checkpoint.to_yaml_str()?;
        let checkpoint_result = context.run_checkpoint(&checkpoint.name)?;

        let docs_index = if self.build_docs {
            Some(context.build_data_docs()?.index)
        } else {
            None
        };

        let profile_path = match &self.profile {
            Some(step) => {
                let profiling = context.profile(&batch_request_of(&checkpoint)?)?;
                let output = self.resolve(&step.output);
                write_bytes_atomic(&output, render_profiling_page(&profiling).as_bytes())?;
                info!("Wrote profiling page to {}", output.display());
                Some(output)
            }
            None => None,
        };

        Ok(PipelineReport {
            row_count,
            column_count,
            preview,
            expectation_results,
            suite_path,
            checkpoint_yaml,
            checkpoint_result,
            docs_index,
            profile_path,
        })
    }
}

fn batch_request_of(config: &CheckpointConfig) -> Result<crate::datasource::BatchRequest> {
    config
        .batch_request
        .clone()
        .ok_or_else(|| DqError::Pipeline(format!("checkpoint '{}' has no batch request", config.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Compression;

    const PIPELINE: &str = r#"
dataset:
  path: data/trips.csv.gz
  header: true
  infer_schema: true
datasource:
  name: spark_df
  asset: trips_df
suite:
  name: trips
  discard_failed: false
  expectations:
    - expectation_type: expect_column_values_to_not_be_null
      column: passenger_count
    - expectation_type: expect_column_values_to_be_between
      column: trip_distance
      min_value: 0
      max_value: 100
checkpoint:
  name: my_checkpoint
  run_name_template: "%Y%m%d-%H%M%S-my-run-name-template"
profile:
  output: profile.html
"#;

    #[test]
    fn test_parse_pipeline() {
        let config = PipelineConfig::from_yaml_str(PIPELINE).unwrap();
        assert!(config.dataset.options.header);
        assert!(config.dataset.options.infer_schema);
        assert_eq!(config.dataset.options.compression, Compression::Auto);
        assert_eq!(config.datasource.mode, AssetMode::Dataframe);
        assert_eq!(config.suite.expectations.len(), 2);
        assert_eq!(config.checkpoint.action_list.len(), 2);
        assert!(config.build_docs);
    }

    #[test]
    fn test_rejects_empty_suite() {
        let yaml = PIPELINE.replace(
            "  expectations:\n    - expectation_type: expect_column_values_to_not_be_null\n      column: passenger_count\n    - expectation_type: expect_column_values_to_be_between\n      column: trip_distance\n      min_value: 0\n      max_value: 100\n",
            "  expectations: []\n",
        );
        assert!(matches!(PipelineConfig::from_yaml_str(&yaml), Err(DqError::Pipeline(_))));
    }
}
