mod run_name;
mod action;
mod config;
mod result;
mod runner;

pub use run_name::{render_run_name, RunIdentifier, NO_RUN_NAME};
pub use action::{ActionConfig, ActionOutcome, ActionResult, ActionSpec, STORE_VALIDATION_RESULT, UPDATE_DATA_DOCS};
pub use config::{default_action_list, CheckpointConfig, CheckpointValidation};
pub use result::{CheckpointResult, CheckpointRunResult};
pub use runner::Checkpoint;
