mod config;

use std::fmt;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::checkpoint::{Checkpoint, CheckpointConfig, CheckpointResult};
use crate::dataset::{CsvReadOptions, DataFrame};
use crate::datasource::{Batch, BatchRequest, Datasource};
use crate::docs::{DataDocsBuildReport, DataDocsSite};
use crate::error::{DqError, Result};
use crate::expectation::{ExpectationSuite, ValidationResult};
use crate::profile::{BasicDatasetProfiler, ProfilingResult};
use crate::store::{
    validate_name, CheckpointStore, ExpectationsStore, ValidationResultIdentifier, ValidationsStore,
};
use crate::validator::Validator;

pub use config::{ContextConfig, StoreLocations, CONTEXT_CONFIG_FILE};

/// Filesystem-backed project holding datasources, suites, checkpoints,
/// validation results and the data docs site.
pub struct DataContext {
    root: PathBuf,
    config: ContextConfig,
    expectations: ExpectationsStore,
    validations: ValidationsStore,
    checkpoints: CheckpointStore,
    docs: DataDocsSite,
}

impl DataContext {
    /// Open the context at `root`, creating it on first use.
    pub fn get_context(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let config_path = root.join(CONTEXT_CONFIG_FILE);

        let config = if config_path.is_file() {
            debug!("Loading context config from {}", config_path.display());
            ContextConfig::load(&config_path)?
        } else {
            info!("Initializing data context at {}", root.display());
            create_dir_all(&root)?;
            let config = ContextConfig::default();
            config.save(&config_path)?;
            config
        };

        let stores = &config.stores;
        let context = Self {
            expectations: ExpectationsStore::new(root.join(&stores.expectations)),
            validations: ValidationsStore::new(root.join(&stores.validations)),
            checkpoints: CheckpointStore::new(root.join(&stores.checkpoints)),
            docs: DataDocsSite::new(root.join(&stores.data_docs)),
            root,
            config,
        };

        for dir in [
            context.expectations.base_dir(),
            context.validations.base_dir(),
            context.checkpoints.base_dir(),
            context.docs.root(),
        ] {
            create_dir_all(dir)?;
        }

        Ok(context)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONTEXT_CONFIG_FILE)
    }

    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path())
    }

    pub fn expectations_store(&self) -> &ExpectationsStore {
        &self.expectations
    }

    pub fn validations_store(&self) -> &ValidationsStore {
        &self.validations
    }

    pub fn checkpoint_store(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn docs_site(&self) -> &DataDocsSite {
        &self.docs
    }

    // Datasources

    /// Create the datasource, replacing any existing one of the same name.
    pub fn add_or_update_datasource(&mut self, name: &str) -> Result<&mut Datasource> {
        validate_name("datasource", name)?;
        if self.config.datasources.contains_key(name) {
            info!("Replacing datasource '{}'", name);
        }
        self.config
            .datasources
            .insert(name.to_string(), Datasource::new(name));
        self.save_config()?;
        self.datasource_mut(name)
    }

    /// Changes made through the returned reference are persisted by `save_config`.
    pub fn datasource_mut(&mut self, name: &str) -> Result<&mut Datasource> {
        self.config
            .datasources
            .get_mut(name)
            .ok_or_else(|| DqError::DatasourceNotFound(name.to_string()))
    }

    pub fn get_datasource(&self, name: &str) -> Result<&Datasource> {
        self.config
            .datasources
            .get(name)
            .ok_or_else(|| DqError::DatasourceNotFound(name.to_string()))
    }

    pub fn list_datasources(&self) -> Vec<&Datasource> {
        self.config.datasources.values().collect()
    }

    /// Register in-memory data. An existing dataframe asset of the same name
    /// gets the new data attached.
    pub fn add_dataframe_asset(
        &mut self,
        datasource_name: &str,
        asset_name: &str,
        dataframe: DataFrame,
    ) -> Result<BatchRequest> {
        let datasource = self.datasource_mut(datasource_name)?;
        if datasource.get_asset(asset_name).map(|a| a.is_in_memory()).unwrap_or(false) {
            datasource.remove_asset(asset_name);
        }
        let request = datasource
            .add_dataframe_asset(asset_name, dataframe)?
            .build_batch_request();
        self.save_config()?;
        Ok(request)
    }

    pub fn add_csv_asset(
        &mut self,
        datasource_name: &str,
        asset_name: &str,
        path: impl Into<PathBuf>,
        options: CsvReadOptions,
    ) -> Result<BatchRequest> {
        let request = self
            .datasource_mut(datasource_name)?
            .add_csv_asset(asset_name, path, options)?
            .build_batch_request();
        self.save_config()?;
        Ok(request)
    }

    pub fn get_batch(&self, request: &BatchRequest) -> Result<Batch> {
        let asset = self
            .get_datasource(&request.datasource_name)?
            .get_asset(&request.data_asset_name)?;
        let batch = Batch::new(request.clone(), asset.load()?)?;
        debug!("Loaded batch '{}' ({} rows)", batch.id, batch.data.row_count());
        Ok(batch)
    }

    // Expectation suites

    /// Create the suite empty, overwriting any existing suite of that name.
    pub fn add_or_update_expectation_suite(&self, name: &str) -> Result<ExpectationSuite> {
        let suite = ExpectationSuite::new(name);
        self.expectations.save(&suite)?;
        Ok(suite)
    }

    pub fn add_expectation_suite(&self, name: &str) -> Result<ExpectationSuite> {
        if self.expectations.exists(name) {
            return Err(DqError::DuplicateSuite(name.to_string()));
        }
        self.add_or_update_expectation_suite(name)
    }

    pub fn get_expectation_suite(&self, name: &str) -> Result<ExpectationSuite> {
        self.expectations.load(name)
    }

    pub fn save_expectation_suite(&self, suite: &ExpectationSuite) -> Result<PathBuf> {
        self.expectations.save(suite)
    }

    pub fn list_expectation_suite_names(&self) -> Result<Vec<String>> {
        self.expectations.list()
    }

    pub fn delete_expectation_suite(&self, name: &str) -> Result<()> {
        self.expectations.delete(name)
    }

    pub fn get_validator(&self, request: &BatchRequest, suite_name: &str) -> Result<Validator> {
        let batch = self.get_batch(request)?;
        let suite = self.get_expectation_suite(suite_name)?;
        Ok(Validator::new(batch, suite, self.expectations.clone()))
    }

    // Checkpoints

    pub fn add_or_update_checkpoint(&self, config: &CheckpointConfig) -> Result<PathBuf> {
        config.check()?;
        self.checkpoints.save(config)
    }

    pub fn get_checkpoint(&self, name: &str) -> Result<Checkpoint<'_>> {
        Ok(Checkpoint::new(self, self.checkpoints.load(name)?))
    }

    pub fn list_checkpoints(&self) -> Result<Vec<String>> {
        self.checkpoints.list()
    }

    pub fn delete_checkpoint(&self, name: &str) -> Result<()> {
        self.checkpoints.delete(name)
    }

    pub fn run_checkpoint(&self, name: &str) -> Result<CheckpointResult> {
        self.get_checkpoint(name)?.run()
    }

    // Validation results

    pub fn store_validation_result(&self, result: &ValidationResult) -> Result<(ValidationResultIdentifier, PathBuf)> {
        self.validations.save(result)
    }

    pub fn get_validation_result(&self, id: &ValidationResultIdentifier) -> Result<ValidationResult> {
        self.validations.load(id)
    }

    pub fn list_validation_results(&self) -> Result<Vec<ValidationResultIdentifier>> {
        self.validations.list()
    }

    // Data docs

    fn stored_validations(&self) -> Result<Vec<ValidationResult>> {
        self.validations
            .list()?
            .iter()
            .map(|id| self.validations.load(id))
            .collect()
    }

    pub fn build_data_docs(&self) -> Result<DataDocsBuildReport> {
        let suites = self.expectations.load_all()?;
        let validations = self.stored_validations()?;
        self.docs.build(&suites, &validations)
    }

    /// Render one validation page, every page the index links to that is
    /// missing or stale, and the index. Returns the validation page first and
    /// the index last.
    pub fn update_data_docs_for(&self, result: &ValidationResult) -> Result<Vec<PathBuf>> {
        let page = self.docs.write_validation_page(result)?;

        let suites = self.expectations.load_all()?;
        let mut validations = self.stored_validations()?;
        let id = ValidationResultIdentifier::from_result(result);
        if !validations
            .iter()
            .any(|v| ValidationResultIdentifier::from_result(v) == id)
        {
            validations.push(result.clone());
        }
        let mut pages = vec![page];
        for stored in &validations {
            let stored_id = ValidationResultIdentifier::from_result(stored);
            if stored_id != id && !self.docs.validation_page_path(&stored_id).is_file() {
                pages.push(self.docs.write_validation_page(stored)?);
            }
        }
        for suite in &suites {
            pages.push(self.docs.write_suite_page(suite)?);
        }
        pages.push(self.docs.write_index(&suites, &validations)?);

        debug!("Updated data docs page {}", pages[0].display());
        Ok(pages)
    }

    /// Validation pages of a checkpoint run, rendering any the run did not write.
    pub fn view_validation_result(&self, result: &CheckpointResult) -> Result<Vec<PathBuf>> {
        result
            .run_results
            .iter()
            .map(|run| {
                let path = self.docs.validation_page_path(&run.validation_result_identifier);
                if path.is_file() {
                    Ok(path)
                } else {
                    self.docs.write_validation_page(&run.validation_result)
                }
            })
            .collect()
    }

    // Profiling

    pub fn profile(&self, request: &BatchRequest) -> Result<ProfilingResult> {
        let batch = self.get_batch(request)?;
        let suite_name = format!("{}.profile", request.data_asset_name);
        Ok(BasicDatasetProfiler::profile(&batch.data, &suite_name, &batch.id))
    }
}

impl fmt::Display for DataContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suites = self.expectations.list().map(|s| s.len()).unwrap_or(0);
        let checkpoints = self.checkpoints.list().map(|c| c.len()).unwrap_or(0);
        write!(
            f,
            "DataContext(root={}, datasources={}, expectation_suites={}, checkpoints={})",
            self.root.display(),
            self.config.datasources.len(),
            suites,
            checkpoints
        )
    }
}
