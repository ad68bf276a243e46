pub mod error;
pub mod dataset;
pub mod datasource;
pub mod expectation;
pub mod validator;
pub mod store;
pub mod checkpoint;
pub mod docs;
pub mod profile;
pub mod context;
pub mod pipeline;
pub mod diff;

pub use error::{DqError, Result};
pub use dataset::{Column, ColumnType, Compression, CsvReadOptions, DataFrame, Field, Schema, Value, read_csv, read_csv_from_reader};
pub use datasource::{AssetKind, Batch, BatchRequest, DataAsset, Datasource};
pub use expectation::{
    Expectation, ExpectationConfig, ExpectationSuite, ExpectationChecker,
    ExpectationValidationResult, ValidationResult, ValidationStatistics,
};
pub use validator::{Validator, validate_batch};
pub use store::{CheckpointStore, ExpectationsStore, ValidationResultIdentifier, ValidationsStore};
pub use checkpoint::{
    ActionConfig, ActionSpec, Checkpoint, CheckpointConfig, CheckpointResult, RunIdentifier,
};
pub use docs::{DataDocsBuildReport, DataDocsSite};
pub use profile::{BasicDatasetProfiler, ProfilingResult, render_profiling_page};
pub use context::{ContextConfig, DataContext};
pub use pipeline::{PipelineConfig, PipelineReport};
pub use diff::{format_suite_diff, format_text_diff, has_changes};
