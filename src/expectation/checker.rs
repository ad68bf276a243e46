use std::collections::{HashMap, HashSet};
use tracing::debug;
use crate::dataset::{Column, DataFrame, Value};
use crate::error::{DqError, Result};
use super::result::{ExpectationResultDetails, ExpectationValidationResult};
use super::types::{Expectation, ExpectationConfig};

const PARTIAL_UNEXPECTED_LIMIT: usize = 20;

struct Outcome {
    success: bool,
    details: ExpectationResultDetails,
}

/// Which values a column-map expectation looks at.
#[derive(Clone, Copy, PartialEq)]
enum MapDomain {
    /// Only non-null values are evaluated.
    NonNull,
    /// Every row is evaluated, nulls included.
    AllRows,
}

/// Evaluates expectations against an in-memory batch.
pub struct ExpectationChecker<'a> {
    frame: &'a DataFrame,
}

impl<'a> ExpectationChecker<'a> {
    pub fn new(frame: &'a DataFrame) -> Self {
        Self { frame }
    }

    pub fn run_checks(&self, configs: &[ExpectationConfig]) -> Vec<ExpectationValidationResult> {
        configs.iter().map(|config| self.run_check(config)).collect()
    }

    /// Evaluation errors (missing column, bad configuration) become failed
    /// results carrying the exception message instead of aborting the run.
    pub fn run_check(&self, config: &ExpectationConfig) -> ExpectationValidationResult {
        let outcome = config
            .expectation
            .validate()
            .and_then(|_| self.evaluate(&config.expectation));

        match outcome {
            Ok(Outcome { success, details }) => {
                debug!(
                    "{} on {}: {}",
                    config.expectation_type(),
                    config.column().unwrap_or("<table>"),
                    if success { "passed" } else { "failed" }
                );
                if success {
                    ExpectationValidationResult::passed(config.clone(), details)
                } else {
                    ExpectationValidationResult::failed(config.clone(), details)
                }
            }
            Err(e) => {
                debug!("{} raised: {}", config.expectation_type(), e);
                ExpectationValidationResult::errored(config.clone(), e.to_string())
            }
        }
    }

    fn evaluate(&self, expectation: &Expectation) -> Result<Outcome> {
        match expectation {
            Expectation::ExpectTableRowCountToBeBetween { min_value, max_value } => {
                let count = self.frame.row_count() as u64;
                Ok(Outcome {
                    success: within(count, *min_value, *max_value),
                    details: ExpectationResultDetails::observed(count),
                })
            }
            Expectation::ExpectTableColumnsToMatchOrderedList { column_list } => {
                let observed: Vec<String> = self.frame.column_names().iter().map(|c| c.to_string()).collect();
                Ok(Outcome {
                    success: &observed == column_list,
                    details: ExpectationResultDetails::observed(observed),
                })
            }
            Expectation::ExpectColumnToExist { column } => Ok(Outcome {
                success: self.frame.column(column).is_some(),
                details: ExpectationResultDetails::default(),
            }),
            Expectation::ExpectColumnValuesToNotBeNull { column, mostly } => {
                self.check_map(column, *mostly, MapDomain::AllRows, &|v: &Value| v.is_null())
            }
            Expectation::ExpectColumnValuesToBeNull { column, mostly } => {
                self.check_map(column, *mostly, MapDomain::AllRows, &|v: &Value| !v.is_null())
            }
            Expectation::ExpectColumnValuesToBeBetween {
                column,
                min_value,
                max_value,
                strict_min,
                strict_max,
                mostly,
            } => self.check_map(column, *mostly, MapDomain::NonNull, &|v: &Value| match v.as_f64() {
                Some(x) => !in_range(x, *min_value, *max_value, *strict_min, *strict_max),
                None => true,
            }),
            Expectation::ExpectColumnValuesToBeInSet { column, value_set, mostly } => {
                self.check_map(column, *mostly, MapDomain::NonNull, &|v: &Value| {
                    !value_set.iter().any(|literal| v.matches_json(literal))
                })
            }
            Expectation::ExpectColumnValuesToBeUnique { column, mostly } => {
                let col = self.column(column)?;
                let mut counts: HashMap<String, usize> = HashMap::new();
                for v in col.non_null() {
                    *counts.entry(value_key(v)).or_default() += 1;
                }
                let duplicated: HashSet<String> = counts
                    .into_iter()
                    .filter(|(_, n)| *n > 1)
                    .map(|(k, _)| k)
                    .collect();
                Ok(map_outcome(col, *mostly, MapDomain::NonNull, &|v: &Value| {
                    duplicated.contains(&value_key(v))
                }))
            }
            Expectation::ExpectColumnValuesToBeInTypeList { column, type_list } => {
                let col = self.column(column)?;
                Ok(Outcome {
                    success: type_list.contains(&col.column_type),
                    details: ExpectationResultDetails::observed(col.column_type.as_str()),
                })
            }
            Expectation::ExpectColumnMeanToBeBetween { column, min_value, max_value } => {
                let col = self.column(column)?;
                let numbers: Vec<f64> = col.non_null().filter_map(|v| v.as_f64()).collect();
                if numbers.is_empty() {
                    return Ok(Outcome {
                        success: false,
                        details: ExpectationResultDetails::observed(serde_json::Value::Null),
                    });
                }
                let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
                Ok(Outcome {
                    success: in_range(mean, *min_value, *max_value, false, false),
                    details: ExpectationResultDetails::observed(mean),
                })
            }
            Expectation::ExpectColumnUniqueValueCountToBeBetween { column, min_value, max_value } => {
                let col = self.column(column)?;
                let distinct = col.non_null().map(value_key).collect::<HashSet<_>>().len() as u64;
                Ok(Outcome {
                    success: within(distinct, *min_value, *max_value),
                    details: ExpectationResultDetails::observed(distinct),
                })
            }
        }
    }

    fn column(&self, name: &str) -> Result<&'a Column> {
        self.frame
            .column(name)
            .ok_or_else(|| DqError::ColumnNotFound(name.to_string()))
    }

    fn check_map(
        &self,
        column: &str,
        mostly: Option<f64>,
        domain: MapDomain,
        is_unexpected: &dyn Fn(&Value) -> bool,
    ) -> Result<Outcome> {
        let col = self.column(column)?;
        Ok(map_outcome(col, mostly, domain, is_unexpected))
    }
}

/// Shared evaluation of the column-map expectations.
fn map_outcome(
    col: &Column,
    mostly: Option<f64>,
    domain: MapDomain,
    is_unexpected: &dyn Fn(&Value) -> bool,
) -> Outcome {
    let element_count = col.len();
    let missing_count = col.null_count();
    let nonmissing = element_count - missing_count;

    let mut unexpected_count = 0usize;
    let mut partial = Vec::new();
    for value in &col.values {
        if domain == MapDomain::NonNull && value.is_null() {
            continue;
        }
        if is_unexpected(value) {
            unexpected_count += 1;
            if partial.len() < PARTIAL_UNEXPECTED_LIMIT {
                partial.push(value.to_json());
            }
        }
    }

    let denominator = match domain {
        MapDomain::NonNull => nonmissing,
        MapDomain::AllRows => element_count,
    };

    let success = if denominator == 0 {
        true
    } else {
        let ratio = 1.0 - unexpected_count as f64 / denominator as f64;
        // tolerate float noise in the ratio
        ratio + 1e-9 >= mostly.unwrap_or(1.0)
    };

    let details = ExpectationResultDetails {
        observed_value: None,
        element_count: Some(element_count),
        missing_count: Some(missing_count),
        missing_percent: Some(percent(missing_count, element_count)),
        unexpected_count: Some(unexpected_count),
        unexpected_percent: Some(percent(unexpected_count, denominator)),
        unexpected_percent_total: Some(percent(unexpected_count, element_count)),
        unexpected_percent_nonmissing: Some(percent(unexpected_count, nonmissing)),
        partial_unexpected_list: partial,
    };

    Outcome { success, details }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn within(value: u64, min: Option<u64>, max: Option<u64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

fn in_range(x: f64, min: Option<f64>, max: Option<f64>, strict_min: bool, strict_max: bool) -> bool {
    let above = match min {
        Some(m) if strict_min => x > m,
        Some(m) => x >= m,
        None => true,
    };
    let below = match max {
        Some(m) if strict_max => x < m,
        Some(m) => x <= m,
        None => true,
    };
    above && below
}

/// Key used for distinct/unique counting; numbers compare by numeric value.
pub(crate) fn value_key(v: &Value) -> String {
    match v {
        Value::Int(i) => format!("n:{}", *i as f64),
        Value::Float(f) => format!("n:{}", f),
        other => format!("{}:{}", other.type_name(), other),
    }
}
