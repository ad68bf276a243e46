use std::collections::BTreeMap;
use std::path::PathBuf;
use serde_json::Value as JsonValue;
use tracing::{info, warn};
use crate::dataset::{ColumnType, DataFrame};
use crate::datasource::Batch;
use crate::error::Result;
use crate::expectation::{
    Expectation, ExpectationChecker, ExpectationConfig, ExpectationSuite,
    ExpectationValidationResult, ValidationMeta, ValidationResult,
};
use crate::store::ExpectationsStore;

type DomainKey = (String, Option<String>);

fn domain_key(config: &ExpectationConfig) -> DomainKey {
    (config.expectation_type().to_string(), config.column().map(str::to_string))
}

/// Evaluate a whole suite against one batch.
pub fn validate_batch(batch: &Batch, suite: &ExpectationSuite) -> ValidationResult {
    let checker = ExpectationChecker::new(&batch.data);
    let results = checker.run_checks(&suite.expectations);

    let mut meta = ValidationMeta::new(suite.name(), batch.id.clone());
    meta.datasource_name = Some(batch.request.datasource_name.clone());
    meta.data_asset_name = Some(batch.request.data_asset_name.clone());
    ValidationResult::new(results, meta)
}

/// Interactive suite authoring against a loaded batch. Every expectation is
/// evaluated as soon as it is added.
pub struct Validator {
    batch: Batch,
    suite: ExpectationSuite,
    store: ExpectationsStore,
    outcomes: BTreeMap<DomainKey, bool>,
}

impl Validator {
    pub fn new(batch: Batch, suite: ExpectationSuite, store: ExpectationsStore) -> Self {
        Self {
            batch,
            suite,
            store,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    pub fn suite(&self) -> &ExpectationSuite {
        &self.suite
    }

    pub fn head(&self, n: usize) -> DataFrame {
        self.batch.head(n)
    }

    /// Add (or replace) an expectation and return its immediate result.
    pub fn expect(&mut self, expectation: impl Into<ExpectationConfig>) -> Result<ExpectationValidationResult> {
        let config = expectation.into();
        config.expectation.validate()?;

        let result = ExpectationChecker::new(&self.batch.data).run_check(&config);
        self.outcomes.insert(domain_key(&config), result.success);
        self.suite.add_expectation(config);
        Ok(result)
    }

    pub fn expect_column_values_to_not_be_null(&mut self, column: &str) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::not_null(column))
    }

    pub fn expect_column_values_to_be_between(
        &mut self,
        column: &str,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::between(column, min_value, max_value))
    }

    pub fn expect_column_to_exist(&mut self, column: &str) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::ExpectColumnToExist {
            column: column.to_string(),
        })
    }

    pub fn expect_column_values_to_be_in_set(
        &mut self,
        column: &str,
        value_set: Vec<JsonValue>,
    ) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::ExpectColumnValuesToBeInSet {
            column: column.to_string(),
            value_set,
            mostly: None,
        })
    }

    pub fn expect_column_values_to_be_unique(&mut self, column: &str) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::ExpectColumnValuesToBeUnique {
            column: column.to_string(),
            mostly: None,
        })
    }

    pub fn expect_column_values_to_be_in_type_list(
        &mut self,
        column: &str,
        type_list: Vec<ColumnType>,
    ) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::ExpectColumnValuesToBeInTypeList {
            column: column.to_string(),
            type_list,
        })
    }

    pub fn expect_table_row_count_to_be_between(
        &mut self,
        min_value: Option<u64>,
        max_value: Option<u64>,
    ) -> Result<ExpectationValidationResult> {
        self.expect(Expectation::ExpectTableRowCountToBeBetween { min_value, max_value })
    }

    /// Evaluate every expectation currently in the suite.
    pub fn validate(&self) -> ValidationResult {
        validate_batch(&self.batch, &self.suite)
    }

    /// Persist the suite. With `discard_failed`, expectations whose latest
    /// evaluation in this validator failed are left out of the saved suite.
    pub fn save_expectation_suite(&mut self, discard_failed: bool) -> Result<PathBuf> {
        if discard_failed {
            let outcomes = &self.outcomes;
            let before = self.suite.len();
            self.suite.expectations.retain(|config| {
                let keep = outcomes.get(&domain_key(config)).copied().unwrap_or(true);
                if !keep {
                    warn!(
                        "Discarding failed expectation {} on {}",
                        config.expectation_type(),
                        config.column().unwrap_or("<table>")
                    );
                }
                keep
            });
            let discarded = before - self.suite.len();
            if discarded > 0 {
                info!("Discarded {} failed expectation(s) from '{}'", discarded, self.suite.name());
            }
        }
        self.store.save(&self.suite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::dataset::{Column, Value};
    use crate::datasource::BatchRequest;

    fn batch() -> Batch {
        let frame = DataFrame::new(vec![
            Column::new(
                "passenger_count",
                ColumnType::Integer,
                vec![Value::Int(1), Value::Null, Value::Int(3)],
            ),
            Column::new(
                "trip_distance",
                ColumnType::Double,
                vec![Value::Float(1.5), Value::Float(2.0), Value::Float(50.0)],
            ),
        ])
        .unwrap();
        Batch::new(BatchRequest::new("ds", "trips"), Arc::new(frame)).unwrap()
    }

    #[test]
    fn test_expect_evaluates_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let mut validator = Validator::new(batch(), ExpectationSuite::new("trips"), ExpectationsStore::new(dir.path()));

        let not_null = validator.expect_column_values_to_not_be_null("passenger_count").unwrap();
        assert!(!not_null.success);
        assert_eq!(not_null.result.unexpected_count, Some(1));

        let between = validator
            .expect_column_values_to_be_between("trip_distance", Some(0.0), Some(100.0))
            .unwrap();
        assert!(between.success);
        assert_eq!(validator.suite().len(), 2);
    }

    #[test]
    fn test_invalid_configuration_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut validator = Validator::new(batch(), ExpectationSuite::new("trips"), ExpectationsStore::new(dir.path()));
        assert!(validator.expect_column_values_to_be_between("trip_distance", None, None).is_err());
        assert!(validator.suite().is_empty());
    }

    #[test]
    fn test_save_discarding_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpectationsStore::new(dir.path());
        let mut validator = Validator::new(batch(), ExpectationSuite::new("trips"), store.clone());

        validator.expect_column_values_to_not_be_null("passenger_count").unwrap();
        validator.expect_column_values_to_not_be_null("trip_distance").unwrap();
        validator.save_expectation_suite(true).unwrap();

        let saved = store.load("trips").unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved.expectations[0].column(), Some("trip_distance"));
    }

    #[test]
    fn test_save_keeping_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExpectationsStore::new(dir.path());
        let mut validator = Validator::new(batch(), ExpectationSuite::new("trips"), store.clone());

        validator.expect_column_values_to_not_be_null("passenger_count").unwrap();
        validator.save_expectation_suite(false).unwrap();
        assert_eq!(store.load("trips").unwrap().len(), 1);
    }

    #[test]
    fn test_validate_whole_suite() {
        let dir = tempfile::tempdir().unwrap();
        let mut validator = Validator::new(batch(), ExpectationSuite::new("trips"), ExpectationsStore::new(dir.path()));
        validator.expect_column_to_exist("trip_distance").unwrap();
        validator.expect_column_values_to_be_unique("trip_distance").unwrap();

        let result = validator.validate();
        assert!(result.success);
        assert_eq!(result.statistics.evaluated_expectations, 2);
        assert_eq!(result.meta.data_asset_name.as_deref(), Some("trips"));
    }
}
