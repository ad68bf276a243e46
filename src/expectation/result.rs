use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::checkpoint::RunIdentifier;
use super::types::ExpectationConfig;

/// Counts and samples gathered while evaluating one expectation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResultDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_percent_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unexpected_percent_nonmissing: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partial_unexpected_list: Vec<serde_json::Value>,
}

impl ExpectationResultDetails {
    pub fn observed(value: impl Into<serde_json::Value>) -> Self {
        Self {
            observed_value: Some(value.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
    pub raised_exception: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationValidationResult {
    pub success: bool,
    pub expectation_config: ExpectationConfig,
    #[serde(default)]
    pub result: ExpectationResultDetails,
    #[serde(default)]
    pub exception_info: ExceptionInfo,
}

impl ExpectationValidationResult {
    pub fn passed(config: ExpectationConfig, result: ExpectationResultDetails) -> Self {
        Self {
            success: true,
            expectation_config: config,
            result,
            exception_info: ExceptionInfo::default(),
        }
    }

    pub fn failed(config: ExpectationConfig, result: ExpectationResultDetails) -> Self {
        Self {
            success: false,
            expectation_config: config,
            result,
            exception_info: ExceptionInfo::default(),
        }
    }

    pub fn errored(config: ExpectationConfig, message: impl Into<String>) -> Self {
        Self {
            success: false,
            expectation_config: config,
            result: ExpectationResultDetails::default(),
            exception_info: ExceptionInfo {
                raised_exception: true,
                exception_message: Some(message.into()),
            },
        }
    }

    pub fn raised_exception(&self) -> bool {
        self.exception_info.raised_exception
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatistics {
    pub evaluated_expectations: usize,
    pub successful_expectations: usize,
    pub unsuccessful_expectations: usize,
    pub success_percent: Option<f64>,
}

impl ValidationStatistics {
    pub fn from_results(results: &[ExpectationValidationResult]) -> Self {
        let evaluated = results.len();
        let successful = results.iter().filter(|r| r.success).count();
        let success_percent = if evaluated > 0 {
            Some(successful as f64 / evaluated as f64 * 100.0)
        } else {
            None
        };

        Self {
            evaluated_expectations: evaluated,
            successful_expectations: successful,
            unsuccessful_expectations: evaluated - successful,
            success_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationMeta {
    pub expectation_suite_name: String,
    pub batch_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasource_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_asset_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunIdentifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_name: Option<String>,
    pub validation_time: DateTime<Utc>,
    pub dqcheck_version: String,
}

impl ValidationMeta {
    pub fn new(expectation_suite_name: impl Into<String>, batch_id: impl Into<String>) -> Self {
        Self {
            expectation_suite_name: expectation_suite_name.into(),
            batch_id: batch_id.into(),
            datasource_name: None,
            data_asset_name: None,
            run_id: None,
            checkpoint_name: None,
            validation_time: Utc::now(),
            dqcheck_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Outcome of validating a whole suite against one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub success: bool,
    pub results: Vec<ExpectationValidationResult>,
    pub statistics: ValidationStatistics,
    pub meta: ValidationMeta,
}

impl ValidationResult {
    pub fn new(results: Vec<ExpectationValidationResult>, meta: ValidationMeta) -> Self {
        let statistics = ValidationStatistics::from_results(&results);
        Self {
            success: results.iter().all(|r| r.success),
            results,
            statistics,
            meta,
        }
    }

    pub fn passed_count(&self) -> usize {
        self.statistics.successful_expectations
    }

    pub fn failed_count(&self) -> usize {
        self.statistics.unsuccessful_expectations
    }

    pub fn failed_results(&self) -> impl Iterator<Item = &ExpectationValidationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn errored_count(&self) -> usize {
        self.results.iter().filter(|r| r.raised_exception()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Expectation;

    fn config(column: &str) -> ExpectationConfig {
        ExpectationConfig::new(Expectation::not_null(column))
    }

    #[test]
    fn test_result_passed() {
        let result = ExpectationValidationResult::passed(config("a"), ExpectationResultDetails::default());
        assert!(result.success);
        assert!(!result.raised_exception());
    }

    #[test]
    fn test_result_errored() {
        let result = ExpectationValidationResult::errored(config("a"), "Column not found: a");
        assert!(!result.success);
        assert!(result.raised_exception());
        assert_eq!(result.exception_info.exception_message.as_deref(), Some("Column not found: a"));
    }

    #[test]
    fn test_empty_validation_is_successful() {
        let validation = ValidationResult::new(vec![], ValidationMeta::new("suite", "batch"));
        assert!(validation.success);
        assert_eq!(validation.statistics.evaluated_expectations, 0);
        assert!(validation.statistics.success_percent.is_none());
    }

    #[test]
    fn test_statistics() {
        let results = vec![
            ExpectationValidationResult::passed(config("a"), ExpectationResultDetails::default()),
            ExpectationValidationResult::failed(config("b"), ExpectationResultDetails::default()),
            ExpectationValidationResult::errored(config("c"), "boom"),
            ExpectationValidationResult::passed(config("d"), ExpectationResultDetails::default()),
        ];
        let validation = ValidationResult::new(results, ValidationMeta::new("suite", "batch"));

        assert!(!validation.success);
        assert_eq!(validation.passed_count(), 2);
        assert_eq!(validation.failed_count(), 2);
        assert_eq!(validation.errored_count(), 1);
        assert_eq!(validation.statistics.success_percent, Some(50.0));
        assert_eq!(validation.failed_results().count(), 2);
    }
}
