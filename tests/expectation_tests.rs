use dqcheck::dataset::{read_csv, CsvReadOptions, DataFrame};
use dqcheck::expectation::{Expectation, ExpectationChecker, ExpectationConfig, ExpectationSuite};
use dqcheck::DataContext;
use std::path::Path;

fn trips() -> DataFrame {
    read_csv(Path::new("tests/fixtures/trips.csv"), &CsvReadOptions::new().infer_schema(true)).unwrap()
}

fn check(df: &DataFrame, expectation: Expectation) -> dqcheck::ExpectationValidationResult {
    ExpectationChecker::new(df).run_check(&ExpectationConfig::new(expectation))
}

#[test]
fn test_not_null_catches_planted_null() {
    let df = trips();
    let result = check(&df, Expectation::not_null("passenger_count"));

    assert!(!result.success);
    assert_eq!(result.result.element_count, Some(10));
    assert_eq!(result.result.unexpected_count, Some(1));
    assert!((result.result.unexpected_percent.unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(result.result.partial_unexpected_list, vec![serde_json::Value::Null]);
}

#[test]
fn test_not_null_passes_on_complete_column() {
    let df = trips();
    assert!(check(&df, Expectation::not_null("trip_distance")).success);
}

#[test]
fn test_not_null_with_mostly() {
    let df = trips();
    let result = check(
        &df,
        Expectation::ExpectColumnValuesToNotBeNull {
            column: "passenger_count".to_string(),
            mostly: Some(0.9),
        },
    );
    assert!(result.success);
}

#[test]
fn test_between_catches_planted_outlier() {
    let df = trips();
    let result = check(&df, Expectation::between("trip_distance", Some(0.0), Some(100.0)));

    assert!(!result.success);
    assert_eq!(result.result.unexpected_count, Some(1));
    assert_eq!(result.result.partial_unexpected_list, vec![serde_json::json!(150.5)]);
}

#[test]
fn test_between_ignores_nulls() {
    let df = trips();
    let result = check(&df, Expectation::between("passenger_count", Some(1.0), Some(6.0)));

    assert!(result.success);
    assert_eq!(result.result.missing_count, Some(1));
    assert_eq!(result.result.unexpected_count, Some(0));
}

#[test]
fn test_between_on_string_columns_parses_numbers() {
    let df = read_csv(Path::new("tests/fixtures/trips.csv"), &CsvReadOptions::default()).unwrap();
    let result = check(&df, Expectation::between("trip_distance", Some(0.0), Some(100.0)));
    assert_eq!(result.result.unexpected_count, Some(1));
}

#[test]
fn test_in_set() {
    let df = trips();
    let strict = check(
        &df,
        Expectation::ExpectColumnValuesToBeInSet {
            column: "store_and_fwd_flag".to_string(),
            value_set: vec![serde_json::json!("N")],
            mostly: None,
        },
    );
    assert!(!strict.success);
    assert_eq!(strict.result.unexpected_count, Some(1));

    let relaxed = check(
        &df,
        Expectation::ExpectColumnValuesToBeInSet {
            column: "store_and_fwd_flag".to_string(),
            value_set: vec![serde_json::json!("N"), serde_json::json!("Y")],
            mostly: None,
        },
    );
    assert!(relaxed.success);
}

#[test]
fn test_table_expectations() {
    let df = trips();
    let rows = check(
        &df,
        Expectation::ExpectTableRowCountToBeBetween {
            min_value: Some(1),
            max_value: Some(10),
        },
    );
    assert!(rows.success);
    assert_eq!(rows.result.observed_value, Some(serde_json::json!(10)));

    let exists = check(
        &df,
        Expectation::ExpectColumnToExist {
            column: "fare_amount".to_string(),
        },
    );
    assert!(exists.success);
}

#[test]
fn test_missing_column_is_reported_not_raised() {
    let df = trips();
    let result = check(&df, Expectation::not_null("tip_amount"));

    assert!(!result.success);
    assert!(result.raised_exception());
    assert!(result
        .exception_info
        .exception_message
        .as_deref()
        .unwrap_or_default()
        .contains("tip_amount"));
}

#[test]
fn test_suite_round_trip_through_context() {
    let dir = tempfile::tempdir().unwrap();
    let context = DataContext::get_context(dir.path()).unwrap();

    let mut suite = ExpectationSuite::new("validate_trips");
    suite.add_expectation(Expectation::not_null("passenger_count"));
    suite.add_expectation(Expectation::between("trip_distance", Some(0.0), Some(100.0)));
    suite.add_expectation(
        ExpectationConfig::new(Expectation::ExpectColumnValuesToBeInSet {
            column: "store_and_fwd_flag".to_string(),
            value_set: vec![serde_json::json!("N"), serde_json::json!("Y")],
            mostly: Some(0.95),
        })
        .with_meta("notes", serde_json::json!("flag is Y or N")),
    );
    context.save_expectation_suite(&suite).unwrap();

    let reloaded = context.get_expectation_suite("validate_trips").unwrap();
    assert_eq!(reloaded, suite);
}

#[test]
fn test_suite_replaces_same_domain() {
    let mut suite = ExpectationSuite::new("s");
    suite.add_expectation(Expectation::between("trip_distance", Some(0.0), Some(100.0)));
    suite.add_expectation(Expectation::between("trip_distance", Some(0.0), Some(200.0)));
    assert_eq!(suite.len(), 1);
    assert!(ExpectationChecker::new(&trips())
        .run_check(&suite.expectations[0])
        .success);
}
