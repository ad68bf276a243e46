use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::dataset::{Column, ColumnType, DataFrame, Value};
use crate::expectation::{
    value_key, Expectation, ExpectationChecker, ExpectationSuite, ValidationMeta, ValidationResult,
};

const TOP_VALUES: usize = 10;
pub const PROFILER_META_KEY: &str = "profiler";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: serde_json::Value,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub column_type: ColumnType,
    pub row_count: usize,
    pub null_count: usize,
    pub null_percent: f64,
    pub distinct_count: usize,
    pub distinct_percent: f64,
    pub top_values: Vec<ValueCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
}

impl ColumnProfile {
    /// Share of non-null rows, in [0, 1].
    pub fn completeness(&self) -> f64 {
        if self.row_count == 0 {
            1.0
        } else {
            (self.row_count - self.null_count) as f64 / self.row_count as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Profile, the suite generated from it and that suite's validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilingResult {
    pub profile: DatasetProfile,
    pub suite: ExpectationSuite,
    pub validation: ValidationResult,
}

pub struct BasicDatasetProfiler;

impl BasicDatasetProfiler {
    pub fn profile(frame: &DataFrame, suite_name: &str, batch_id: &str) -> ProfilingResult {
        let profile = Self::describe(frame);
        let suite = Self::build_suite(&profile, frame, suite_name);

        let results = ExpectationChecker::new(frame).run_checks(&suite.expectations);
        let validation = ValidationResult::new(results, ValidationMeta::new(suite_name, batch_id));

        info!(
            "Profiled {} rows x {} columns into {} expectations",
            profile.row_count,
            profile.column_count,
            suite.len()
        );

        ProfilingResult {
            profile,
            suite,
            validation,
        }
    }

    pub fn describe(frame: &DataFrame) -> DatasetProfile {
        DatasetProfile {
            row_count: frame.row_count(),
            column_count: frame.column_count(),
            columns: frame.columns().iter().map(profile_column).collect(),
        }
    }

    /// Expectations that pin down what was observed.
    pub fn build_suite(profile: &DatasetProfile, frame: &DataFrame, suite_name: &str) -> ExpectationSuite {
        let mut suite = ExpectationSuite::new(suite_name);
        suite
            .meta
            .insert(PROFILER_META_KEY.to_string(), serde_json::json!("BasicDatasetProfiler"));

        let rows = profile.row_count as u64;
        suite.add_expectation(Expectation::ExpectTableRowCountToBeBetween {
            min_value: Some(rows),
            max_value: Some(rows),
        });
        suite.add_expectation(Expectation::ExpectTableColumnsToMatchOrderedList {
            column_list: frame.column_names().iter().map(|c| c.to_string()).collect(),
        });

        for column in &profile.columns {
            suite.add_expectation(Expectation::ExpectColumnToExist {
                column: column.name.clone(),
            });
            suite.add_expectation(Expectation::ExpectColumnValuesToBeInTypeList {
                column: column.name.clone(),
                type_list: vec![column.column_type],
            });

            let completeness = column.completeness();
            let mostly = if completeness >= 1.0 {
                None
            } else {
                Some((completeness * 1000.0).floor() / 1000.0)
            };
            suite.add_expectation(Expectation::ExpectColumnValuesToNotBeNull {
                column: column.name.clone(),
                mostly,
            });

            let distinct = column.distinct_count as u64;
            suite.add_expectation(Expectation::ExpectColumnUniqueValueCountToBeBetween {
                column: column.name.clone(),
                min_value: Some(distinct),
                max_value: Some(distinct),
            });

            if let Some(numeric) = &column.numeric {
                suite.add_expectation(Expectation::ExpectColumnValuesToBeBetween {
                    column: column.name.clone(),
                    min_value: Some(numeric.min),
                    max_value: Some(numeric.max),
                    strict_min: false,
                    strict_max: false,
                    mostly: None,
                });
                suite.add_expectation(Expectation::ExpectColumnMeanToBeBetween {
                    column: column.name.clone(),
                    min_value: Some(numeric.mean),
                    max_value: Some(numeric.mean),
                });
            }
        }

        suite
    }
}

fn profile_column(column: &Column) -> ColumnProfile {
    let row_count = column.len();
    let null_count = column.null_count();

    let mut counts: HashMap<String, (Value, usize)> = HashMap::new();
    for value in column.non_null() {
        counts
            .entry(value_key(value))
            .or_insert_with(|| (value.clone(), 0))
            .1 += 1;
    }
    let distinct_count = counts.len();

    let mut top: Vec<(String, Value, usize)> = counts
        .into_iter()
        .map(|(key, (value, count))| (key, value, count))
        .collect();
    top.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    let top_values = top
        .into_iter()
        .take(TOP_VALUES)
        .map(|(_, value, count)| ValueCount {
            value: value.to_json(),
            count,
        })
        .collect();

    let numeric = if column.column_type.is_numeric() {
        numeric_summary(column)
    } else {
        None
    };

    ColumnProfile {
        name: column.name.clone(),
        column_type: column.column_type,
        row_count,
        null_count,
        null_percent: percent(null_count, row_count),
        distinct_count,
        distinct_percent: percent(distinct_count, row_count - null_count),
        top_values,
        numeric,
    }
}

fn numeric_summary(column: &Column) -> Option<NumericSummary> {
    let numbers: Vec<f64> = column.non_null().filter_map(|v| v.as_f64()).collect();
    if numbers.is_empty() {
        return None;
    }

    let n = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / n;

    let mut sorted = numbers.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    let std_dev = if numbers.len() > 1 {
        let variance = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    Some(NumericSummary {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        median,
        std_dev,
    })
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                "fare",
                ColumnType::Double,
                vec![Value::Float(2.0), Value::Float(4.0), Value::Null, Value::Float(4.0)],
            ),
            Column::new(
                "vendor",
                ColumnType::String,
                vec![
                    Value::Str("a".into()),
                    Value::Str("b".into()),
                    Value::Str("a".into()),
                    Value::Str("a".into()),
                ],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_statistics() {
        let profile = BasicDatasetProfiler::describe(&frame());
        let fare = &profile.columns[0];
        assert_eq!(fare.null_count, 1);
        assert_eq!(fare.null_percent, 25.0);
        assert_eq!(fare.distinct_count, 2);

        let numeric = fare.numeric.as_ref().unwrap();
        assert_eq!(numeric.min, 2.0);
        assert_eq!(numeric.max, 4.0);
        assert_eq!(numeric.median, 4.0);
        assert!((numeric.mean - 10.0 / 3.0).abs() < 1e-12);

        let vendor = &profile.columns[1];
        assert!(vendor.numeric.is_none());
        assert_eq!(vendor.top_values[0], ValueCount { value: serde_json::json!("a"), count: 3 });
    }

    #[test]
    fn test_generated_suite_passes_on_profiled_data() {
        let result = BasicDatasetProfiler::profile(&frame(), "trips.profile", "profile-batch");
        assert!(result.validation.success, "{:?}", result.validation.failed_results().collect::<Vec<_>>());
        assert!(result.suite.find_expectation("expect_column_mean_to_be_between", Some("fare")).is_some());
        assert!(result.suite.find_expectation("expect_column_mean_to_be_between", Some("vendor")).is_none());
    }

    #[test]
    fn test_not_null_mostly_tracks_completeness() {
        let result = BasicDatasetProfiler::profile(&frame(), "p", "b");
        let config = result
            .suite
            .find_expectation("expect_column_values_to_not_be_null", Some("fare"))
            .unwrap();
        assert_eq!(config.expectation.mostly(), Some(0.75));
    }
}
