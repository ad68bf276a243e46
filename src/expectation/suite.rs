use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use super::types::{Expectation, ExpectationConfig};

pub const VERSION_META_KEY: &str = "dqcheck_version";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Replaced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSuite {
    pub expectation_suite_name: String,
    #[serde(default)]
    pub expectations: Vec<ExpectationConfig>,
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ExpectationSuite {
    pub fn new(name: impl Into<String>) -> Self {
        let mut meta = BTreeMap::new();
        meta.insert(
            VERSION_META_KEY.to_string(),
            serde_json::Value::String(env!("CARGO_PKG_VERSION").to_string()),
        );

        Self {
            expectation_suite_name: name.into(),
            expectations: Vec::new(),
            meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.expectation_suite_name
    }

    pub fn len(&self) -> usize {
        self.expectations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// Append, or replace in place an expectation with the same type and column.
    pub fn add_expectation(&mut self, config: impl Into<ExpectationConfig>) -> AddOutcome {
        let config = config.into();
        match self.expectations.iter_mut().find(|e| e.is_equivalent_to(&config)) {
            Some(existing) => {
                *existing = config;
                AddOutcome::Replaced
            }
            None => {
                self.expectations.push(config);
                AddOutcome::Added
            }
        }
    }

    pub fn add_expectations(&mut self, configs: impl IntoIterator<Item = ExpectationConfig>) {
        for config in configs {
            self.add_expectation(config);
        }
    }

    pub fn find_expectation(&self, expectation_type: &str, column: Option<&str>) -> Option<&ExpectationConfig> {
        self.expectations
            .iter()
            .find(|e| e.expectation_type() == expectation_type && e.column() == column)
    }

    pub fn remove_expectation(&mut self, expectation_type: &str, column: Option<&str>) -> bool {
        let before = self.expectations.len();
        self.expectations
            .retain(|e| !(e.expectation_type() == expectation_type && e.column() == column));
        self.expectations.len() != before
    }

    pub fn expectations_for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Expectation> {
        self.expectations
            .iter()
            .filter(move |e| e.column() == Some(column))
            .map(|e| &e.expectation)
    }
}
