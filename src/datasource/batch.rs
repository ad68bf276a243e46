use std::collections::BTreeMap;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::dataset::DataFrame;
use crate::error::{DqError, Result};

const LIMIT_OPTION: &str = "limit";

/// Identifies the slice of an asset a validation runs against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub datasource_name: String,
    pub data_asset_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl BatchRequest {
    pub fn new(datasource_name: impl Into<String>, data_asset_name: impl Into<String>) -> Self {
        Self {
            datasource_name: datasource_name.into(),
            data_asset_name: data_asset_name.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.options.insert(LIMIT_OPTION.to_string(), serde_json::Value::from(limit));
        self
    }

    pub fn limit(&self) -> Result<Option<usize>> {
        for key in self.options.keys() {
            if key != LIMIT_OPTION {
                return Err(DqError::Dataset(format!("unsupported batch option '{}'", key)));
            }
        }

        match self.options.get(LIMIT_OPTION) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .map(|n| Some(n as usize))
                .ok_or_else(|| DqError::Dataset(format!("batch option 'limit' must be a non-negative integer, got {}", value))),
        }
    }

    /// `<datasource>-<asset>`, suffixed with a short options hash when options are set.
    pub fn batch_id(&self) -> String {
        let base = format!("{}-{}", self.datasource_name, self.data_asset_name);
        if self.options.is_empty() {
            return base;
        }

        let options_json = serde_json::to_string(&self.options).unwrap_or_default();
        let digest = format!("{:x}", Sha256::digest(options_json.as_bytes()));
        format!("{}-{}", base, &digest[..12])
    }
}

#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub request: BatchRequest,
    pub data: Arc<DataFrame>,
    pub loaded_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(request: BatchRequest, data: Arc<DataFrame>) -> Result<Self> {
        let data = match request.limit()? {
            Some(limit) if limit < data.row_count() => Arc::new(data.head(limit)),
            _ => data,
        };

        Ok(Self {
            id: request.batch_id(),
            request,
            data,
            loaded_at: Utc::now(),
        })
    }

    pub fn head(&self, n: usize) -> DataFrame {
        self.data.head(n)
    }
}
