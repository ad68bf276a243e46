use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use glob::glob;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::checkpoint::RunIdentifier;
use crate::error::{DqError, Result};
use crate::expectation::ValidationResult;
use super::atomic::write_json_atomic;
use super::{escaped_dir, path_segment, validate_name};

/// Location of one stored validation result:
/// `<suite>/<run_name>/<run_time>/<batch_id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationResultIdentifier {
    pub expectation_suite_name: String,
    pub run_name: String,
    pub run_time: String,
    pub batch_id: String,
}

impl ValidationResultIdentifier {
    pub fn new(suite_name: &str, run_id: &RunIdentifier, batch_id: &str) -> Self {
        Self {
            expectation_suite_name: suite_name.to_string(),
            run_name: path_segment(run_id.run_name_key()),
            run_time: run_id.run_time_key(),
            batch_id: path_segment(batch_id),
        }
    }

    pub fn from_result(result: &ValidationResult) -> Self {
        let run_id = result
            .meta
            .run_id
            .clone()
            .unwrap_or_else(|| RunIdentifier::new(None, result.meta.validation_time));
        Self::new(&result.meta.expectation_suite_name, &run_id, &result.meta.batch_id)
    }

    pub fn relative_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(&self.expectation_suite_name)
            .join(&self.run_name)
            .join(&self.run_time)
            .join(format!("{}.{}", self.batch_id, extension))
    }

    /// Every segment must stay a single path component inside the store.
    pub fn check(&self) -> Result<()> {
        validate_name("expectation suite", &self.expectation_suite_name)?;
        for segment in [&self.run_name, &self.run_time, &self.batch_id] {
            if segment.as_str() != path_segment(segment) {
                return Err(DqError::InvalidName(format!(
                    "validation result identifier segment '{}' is not a plain file name",
                    segment
                )));
            }
        }
        Ok(())
    }

    fn from_relative_path(relative: &Path) -> Option<Self> {
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        if parts.len() != 4 {
            return None;
        }
        let batch_id = Path::new(&parts[3]).file_stem()?.to_string_lossy().to_string();
        Some(Self {
            expectation_suite_name: parts[0].clone(),
            run_name: parts[1].clone(),
            run_time: parts[2].clone(),
            batch_id,
        })
    }
}

impl fmt::Display for ValidationResultIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.expectation_suite_name, self.run_name, self.run_time, self.batch_id
        )
    }
}

#[derive(Debug, Clone)]
pub struct ValidationsStore {
    base_dir: PathBuf,
}

impl ValidationsStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, id: &ValidationResultIdentifier) -> Result<PathBuf> {
        id.check()?;
        Ok(self.base_dir.join(id.relative_path("json")))
    }

    pub fn save(&self, result: &ValidationResult) -> Result<(ValidationResultIdentifier, PathBuf)> {
        let id = ValidationResultIdentifier::from_result(result);
        let path = self.path_for(&id)?;
        write_json_atomic(&path, result)?;
        info!("Stored validation result {} at {}", id, path.display());
        Ok((id, path))
    }

    pub fn load(&self, id: &ValidationResultIdentifier) -> Result<ValidationResult> {
        let path = self.path_for(id)?;
        let content = fs::read_to_string(&path)
            .map_err(|_| DqError::ValidationNotFound(id.to_string()))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Stored identifiers, newest run first.
    pub fn list(&self) -> Result<Vec<ValidationResultIdentifier>> {
        let pattern = escaped_dir(&self.base_dir).join("*").join("*").join("*").join("*.json");
        let pattern_str = pattern.to_string_lossy();

        let mut ids: Vec<ValidationResultIdentifier> = glob(&pattern_str)?
            .filter_map(|r| r.ok())
            .filter_map(|path| {
                let relative = path.strip_prefix(&self.base_dir).ok()?;
                let id = ValidationResultIdentifier::from_relative_path(relative);
                if id.is_none() {
                    warn!("Ignoring unexpected file in validations store: {}", path.display());
                }
                id
            })
            .collect();

        ids.sort_by(|a, b| {
            b.run_time
                .cmp(&a.run_time)
                .then_with(|| a.expectation_suite_name.cmp(&b.expectation_suite_name))
                .then_with(|| a.batch_id.cmp(&b.batch_id))
        });
        Ok(ids)
    }

    pub fn list_for_suite(&self, suite_name: &str) -> Result<Vec<ValidationResultIdentifier>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|id| id.expectation_suite_name == suite_name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use crate::expectation::ValidationMeta;

    fn result_at(suite: &str, run_name: Option<&str>, hour: u32) -> ValidationResult {
        let mut meta = ValidationMeta::new(suite, "ds-trips");
        let run_time = Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap();
        meta.run_id = Some(RunIdentifier::new(run_name.map(|s| s.to_string()), run_time));
        ValidationResult::new(vec![], meta)
    }

    #[test]
    fn test_identifier_path() {
        let result = result_at("trips", Some("20240115-100000-nightly"), 10);
        let id = ValidationResultIdentifier::from_result(&result);
        assert_eq!(
            id.relative_path("json"),
            PathBuf::from("trips/20240115-100000-nightly/20240115T100000.000000Z/ds-trips.json")
        );
    }

    #[test]
    fn test_missing_run_name_uses_placeholder() {
        let id = ValidationResultIdentifier::from_result(&result_at("trips", None, 10));
        assert_eq!(id.run_name, "__none__");
    }

    #[test]
    fn test_load_rejects_identifier_outside_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ValidationsStore::new(dir.path());
        let mut id = ValidationResultIdentifier::from_result(&result_at("trips", Some("a"), 9));
        id.run_name = "..".to_string();
        assert!(matches!(store.load(&id), Err(DqError::InvalidName(_))));

        id.run_name = "a".to_string();
        id.expectation_suite_name = "../trips".to_string();
        assert!(matches!(store.load(&id), Err(DqError::InvalidName(_))));
    }

    #[test]
    fn test_save_load_and_list_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = ValidationsStore::new(dir.path());

        let (older, _) = store.save(&result_at("trips", Some("a"), 9)).unwrap();
        let (newer, path) = store.save(&result_at("trips", Some("b"), 11)).unwrap();
        assert!(path.is_file());

        let listed = store.list().unwrap();
        assert_eq!(listed, vec![newer.clone(), older]);
        assert_eq!(store.load(&newer).unwrap().meta.expectation_suite_name, "trips");
        assert_eq!(store.list_for_suite("other").unwrap().len(), 0);
    }
}
