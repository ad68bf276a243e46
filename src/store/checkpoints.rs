use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use crate::checkpoint::CheckpointConfig;
use crate::error::{DqError, Result};
use super::atomic::write_bytes_atomic;
use super::{list_stems, validate_name};

#[derive(Debug, Clone)]
pub struct CheckpointStore {
    base_dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name("checkpoint", name)?;
        Ok(self.base_dir.join(format!("{}.yml", name)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    pub fn save(&self, config: &CheckpointConfig) -> Result<PathBuf> {
        let path = self.path_for(&config.name)?;
        write_bytes_atomic(&path, config.to_yaml_str()?.as_bytes())?;
        info!("Saved checkpoint '{}' to {}", config.name, path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<CheckpointConfig> {
        let path = self.path_for(name)?;
        let content = fs::read_to_string(&path)
            .map_err(|_| DqError::CheckpointNotFound(name.to_string()))?;
        CheckpointConfig::from_yaml_str(&content)
    }

    pub fn list(&self) -> Result<Vec<String>> {
        list_stems(&self.base_dir, "yml")
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(DqError::CheckpointNotFound(name.to_string()));
        }
        fs::remove_file(path)?;
        info!("Deleted checkpoint '{}'", name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());

        let config = CheckpointConfig::new("nightly")
            .with_run_name_template("%Y%m%d-%H%M%S-nightly")
            .with_expectation_suite_name("trips");
        store.save(&config).unwrap();

        assert!(store.exists("nightly"));
        assert_eq!(store.load("nightly").unwrap(), config);
        assert_eq!(store.list().unwrap(), vec!["nightly".to_string()]);

        store.delete("nightly").unwrap();
        assert!(matches!(store.load("nightly"), Err(DqError::CheckpointNotFound(_))));
    }

    #[test]
    fn test_rejects_names_outside_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoints"));
        let outside = dir.path().join("victim.yml");
        fs::write(&outside, "name: victim\n").unwrap();

        assert!(matches!(store.delete("../victim"), Err(DqError::InvalidName(_))));
        assert!(matches!(store.load("../victim"), Err(DqError::InvalidName(_))));
        assert!(outside.is_file());
    }
}
