use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::datasource::Datasource;
use crate::error::Result;
use crate::store::write_bytes_atomic;

pub const CONTEXT_CONFIG_FILE: &str = "dqcheck.yml";

/// Store directories, relative to the context root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLocations {
    #[serde(default = "StoreLocations::default_expectations")]
    pub expectations: PathBuf,
    #[serde(default = "StoreLocations::default_validations")]
    pub validations: PathBuf,
    #[serde(default = "StoreLocations::default_checkpoints")]
    pub checkpoints: PathBuf,
    #[serde(default = "StoreLocations::default_data_docs")]
    pub data_docs: PathBuf,
}

impl StoreLocations {
    fn default_expectations() -> PathBuf {
        PathBuf::from("expectations")
    }

    fn default_validations() -> PathBuf {
        PathBuf::from("uncommitted/validations")
    }

    fn default_checkpoints() -> PathBuf {
        PathBuf::from("checkpoints")
    }

    fn default_data_docs() -> PathBuf {
        PathBuf::from("uncommitted/data_docs/local_site")
    }
}

impl Default for StoreLocations {
    fn default() -> Self {
        Self {
            expectations: Self::default_expectations(),
            validations: Self::default_validations(),
            checkpoints: Self::default_checkpoints(),
            data_docs: Self::default_data_docs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_config_version")]
    pub config_version: f64,
    #[serde(default)]
    pub stores: StoreLocations,
    #[serde(default)]
    pub datasources: BTreeMap<String, Datasource>,
}

fn default_config_version() -> f64 {
    1.0
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            stores: StoreLocations::default(),
            datasources: BTreeMap::new(),
        }
    }
}

impl ContextConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let mut config: ContextConfig = serde_yaml::from_str(content)?;
        for (name, datasource) in config.datasources.iter_mut() {
            datasource.restore_names(name);
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        write_bytes_atomic(path, yaml.as_bytes())
    }
}
