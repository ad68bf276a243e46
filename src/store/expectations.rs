use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::error::{DqError, Result};
use crate::expectation::ExpectationSuite;
use super::atomic::write_json_atomic;
use super::{list_stems, validate_name};

/// Suites as pretty JSON, one file per suite: `<base>/<suite>.json`.
#[derive(Debug, Clone)]
pub struct ExpectationsStore {
    base_dir: PathBuf,
}

impl ExpectationsStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, suite_name: &str) -> Result<PathBuf> {
        validate_name("expectation suite", suite_name)?;
        Ok(self.base_dir.join(format!("{}.json", suite_name)))
    }

    pub fn exists(&self, suite_name: &str) -> bool {
        self.path_for(suite_name).is_ok_and(|path| path.is_file())
    }

    pub fn save(&self, suite: &ExpectationSuite) -> Result<PathBuf> {
        let path = self.path_for(suite.name())?;
        write_json_atomic(&path, suite)?;
        info!(
            "Saved expectation suite '{}' ({} expectations) to {}",
            suite.name(),
            suite.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn load(&self, suite_name: &str) -> Result<ExpectationSuite> {
        let path = self.path_for(suite_name)?;
        let content = fs::read_to_string(&path)
            .map_err(|_| DqError::SuiteNotFound(suite_name.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        list_stems(&self.base_dir, "json")
    }

    pub fn load_all(&self) -> Result<Vec<ExpectationSuite>> {
        self.list()?.iter().map(|name| self.load(name)).collect()
    }

    pub fn delete(&self, suite_name: &str) -> Result<()> {
        let path = self.path_for(suite_name)?;
        if !path.is_file() {
            return Err(DqError::SuiteNotFound(suite_name.to_string()));
        }
        fs::remove_file(path)?;
        info!("Deleted expectation suite '{}'", suite_name);
        Ok(())
    }
}
