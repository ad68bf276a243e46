use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqError {
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Datasource not found: {0}")]
    DatasourceNotFound(String),

    #[error("Data asset not found: {0}")]
    AssetNotFound(String),

    #[error("Data asset already exists: {0}")]
    DuplicateAsset(String),

    #[error("Expectation suite not found: {0}")]
    SuiteNotFound(String),

    #[error("Expectation suite already exists: {0}")]
    DuplicateSuite(String),

    #[error("Invalid expectation configuration: {0}")]
    InvalidExpectation(String),

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Action '{name}' failed: {message}")]
    Action { name: String, message: String },

    #[error("Validation result not found: {0}")]
    ValidationNotFound(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, DqError>;
