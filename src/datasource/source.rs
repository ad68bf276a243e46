use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::dataset::{read_csv, CsvReadOptions, DataFrame};
use crate::error::{DqError, Result};
use super::batch::BatchRequest;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetKind {
    /// Data handed over in memory; only the definition is persisted.
    Dataframe,
    /// CSV file re-read on every batch load.
    Csv {
        path: PathBuf,
        #[serde(default)]
        options: CsvReadOptions,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataAsset {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub datasource_name: String,
    #[serde(flatten)]
    pub kind: AssetKind,
    #[serde(skip)]
    dataframe: Option<Arc<DataFrame>>,
}

impl DataAsset {
    pub fn build_batch_request(&self) -> BatchRequest {
        BatchRequest::new(self.datasource_name.clone(), self.name.clone())
    }

    pub fn load(&self) -> Result<Arc<DataFrame>> {
        match &self.kind {
            AssetKind::Dataframe => self.dataframe.clone().ok_or_else(|| {
                DqError::Dataset(format!(
                    "dataframe asset '{}' has no data in this session; add it again with add_dataframe_asset",
                    self.name
                ))
            }),
            AssetKind::Csv { path, options } => Ok(Arc::new(read_csv(path, options)?)),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.kind, AssetKind::Dataframe)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Datasource {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    assets: BTreeMap<String, DataAsset>,
}

impl Datasource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assets: BTreeMap::new(),
        }
    }

    /// Re-populate the names that are keys rather than fields in the config file.
    pub(crate) fn restore_names(&mut self, name: &str) {
        self.name = name.to_string();
        for (asset_name, asset) in self.assets.iter_mut() {
            asset.name = asset_name.clone();
            asset.datasource_name = name.to_string();
        }
    }

    pub fn add_dataframe_asset(&mut self, name: &str, dataframe: DataFrame) -> Result<&DataAsset> {
        info!(
            "Adding dataframe asset '{}' to '{}' ({} rows)",
            name,
            self.name,
            dataframe.row_count()
        );
        self.insert_asset(name, AssetKind::Dataframe, Some(Arc::new(dataframe)))
    }

    pub fn add_csv_asset(
        &mut self,
        name: &str,
        path: impl Into<PathBuf>,
        options: CsvReadOptions,
    ) -> Result<&DataAsset> {
        let path = path.into();
        info!("Adding CSV asset '{}' to '{}' ({})", name, self.name, path.display());
        self.insert_asset(name, AssetKind::Csv { path, options }, None)
    }

    fn insert_asset(
        &mut self,
        name: &str,
        kind: AssetKind,
        dataframe: Option<Arc<DataFrame>>,
    ) -> Result<&DataAsset> {
        crate::store::validate_name("data asset", name)?;
        if self.assets.contains_key(name) {
            return Err(DqError::DuplicateAsset(format!("{}.{}", self.name, name)));
        }

        let asset = DataAsset {
            name: name.to_string(),
            datasource_name: self.name.clone(),
            kind,
            dataframe,
        };

        Ok(self.assets.entry(name.to_string()).or_insert(asset))
    }

    pub fn get_asset(&self, name: &str) -> Result<&DataAsset> {
        self.assets
            .get(name)
            .ok_or_else(|| DqError::AssetNotFound(format!("{}.{}", self.name, name)))
    }

    pub fn remove_asset(&mut self, name: &str) -> bool {
        self.assets.remove(name).is_some()
    }

    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.keys().map(|k| k.as_str()).collect()
    }

    pub fn assets(&self) -> impl Iterator<Item = &DataAsset> {
        self.assets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Column, ColumnType, Value};

    fn frame() -> DataFrame {
        DataFrame::new(vec![Column::new("a", ColumnType::Integer, vec![Value::Int(1)])]).unwrap()
    }

    #[test]
    fn test_add_dataframe_asset_and_batch_request() {
        let mut ds = Datasource::new("my_spark_in_memory_datasource");
        let asset = ds.add_dataframe_asset("yellow_tripdata", frame()).unwrap();
        let req = asset.build_batch_request();
        assert_eq!(req.datasource_name, "my_spark_in_memory_datasource");
        assert_eq!(req.data_asset_name, "yellow_tripdata");
        assert_eq!(asset.load().unwrap().row_count(), 1);
    }

    #[test]
    fn test_duplicate_asset_rejected() {
        let mut ds = Datasource::new("ds");
        ds.add_dataframe_asset("a", frame()).unwrap();
        assert!(matches!(
            ds.add_dataframe_asset("a", frame()),
            Err(DqError::DuplicateAsset(_))
        ));
    }

    #[test]
    fn test_dataframe_asset_without_data_fails_to_load() {
        let yaml = "assets:\n  trips:\n    type: dataframe\n";
        let mut ds: Datasource = serde_yaml::from_str(yaml).unwrap();
        ds.restore_names("ds");
        let asset = ds.get_asset("trips").unwrap();
        assert!(asset.is_in_memory());
        assert!(asset.load().is_err());
    }

    #[test]
    fn test_csv_asset_roundtrips_through_yaml() {
        let mut ds = Datasource::new("files");
        ds.add_csv_asset("trips", "data/trips.csv.gz", CsvReadOptions::new().infer_schema(true))
            .unwrap();

        let yaml = serde_yaml::to_string(&ds).unwrap();
        let mut restored: Datasource = serde_yaml::from_str(&yaml).unwrap();
        restored.restore_names("files");

        let asset = restored.get_asset("trips").unwrap();
        assert_eq!(asset.datasource_name, "files");
        match &asset.kind {
            AssetKind::Csv { path, options } => {
                assert_eq!(path, &PathBuf::from("data/trips.csv.gz"));
                assert!(options.infer_schema);
            }
            _ => panic!("Expected Csv"),
        }
    }
}
