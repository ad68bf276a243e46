use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::error::{DqError, Result};

/// Path segment used for runs that have no name.
pub const NO_RUN_NAME: &str = "__none__";

const RUN_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunIdentifier {
    #[serde(default)]
    pub run_name: Option<String>,
    pub run_time: DateTime<Utc>,
}

impl RunIdentifier {
    pub fn new(run_name: Option<String>, run_time: DateTime<Utc>) -> Self {
        Self { run_name, run_time }
    }

    pub fn now(run_name: Option<String>) -> Self {
        Self::new(run_name, Utc::now())
    }

    pub fn run_name_key(&self) -> &str {
        self.run_name.as_deref().unwrap_or(NO_RUN_NAME)
    }

    pub fn run_time_key(&self) -> String {
        self.run_time.format(RUN_TIME_FORMAT).to_string()
    }
}

impl std::fmt::Display for RunIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}", self.run_name_key(), self.run_time_key())
    }
}

/// Render a strftime run-name template at `run_time`.
pub fn render_run_name(template: &str, run_time: DateTime<Utc>) -> Result<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(DqError::Checkpoint(format!(
            "invalid run_name_template '{}'",
            template
        )));
    }
    Ok(run_time.format_with_items(items.iter()).to_string())
}
