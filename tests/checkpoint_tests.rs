use chrono::{TimeZone, Utc};
use dqcheck::checkpoint::{ActionConfig, ActionOutcome, CheckpointConfig, UPDATE_DATA_DOCS};
use dqcheck::dataset::{read_csv, CsvReadOptions};
use dqcheck::datasource::BatchRequest;
use dqcheck::{DataContext, DqError};
use std::path::{Path, PathBuf};

const TEMPLATE: &str = "%Y%m%d-%H%M%S-my-run-name-template";

fn files_under(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let pattern = dir.join("**").join(format!("*.{}", extension));
    glob::glob(&pattern.to_string_lossy())
        .unwrap()
        .filter_map(|p| p.ok())
        .collect()
}

/// A context with the fixture registered as an in-memory asset and a suite
/// holding the two authored expectations.
fn setup(root: &Path) -> (DataContext, BatchRequest) {
    let mut context = DataContext::get_context(root).unwrap();
    let df = read_csv(
        Path::new("tests/fixtures/trips.csv"),
        &CsvReadOptions::new().infer_schema(true),
    )
    .unwrap();

    context.add_or_update_datasource("spark_df").unwrap();
    let request = context.add_dataframe_asset("spark_df", "trips_df", df).unwrap();

    context.add_or_update_expectation_suite("validate_trips").unwrap();
    let mut validator = context.get_validator(&request, "validate_trips").unwrap();
    validator.expect_column_values_to_not_be_null("passenger_count").unwrap();
    validator
        .expect_column_values_to_be_between("trip_distance", Some(0.0), Some(100.0))
        .unwrap();
    validator.save_expectation_suite(false).unwrap();

    (context, request)
}

fn checkpoint(request: &BatchRequest, actions: Vec<ActionConfig>) -> CheckpointConfig {
    CheckpointConfig::new("my_checkpoint")
        .with_run_name_template(TEMPLATE)
        .with_expectation_suite_name("validate_trips")
        .with_batch_request(request.clone())
        .with_action_list(actions)
}

fn run_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
}

#[test]
fn test_run_with_store_and_docs_actions() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    let config = checkpoint(
        &request,
        vec![ActionConfig::store_validation_result(), ActionConfig::update_data_docs()],
    );
    context.add_or_update_checkpoint(&config).unwrap();

    let result = context.get_checkpoint("my_checkpoint").unwrap().run_at(run_time()).unwrap();

    assert!(!result.success);
    assert_eq!(result.run_id.run_name.as_deref(), Some("20240115-103000-my-run-name-template"));
    assert_eq!(result.run_results.len(), 1);

    let validation = &result.run_results[0].validation_result;
    assert_eq!(validation.statistics.evaluated_expectations, 2);
    assert_eq!(validation.statistics.unsuccessful_expectations, 2);
    assert_eq!(validation.meta.checkpoint_name.as_deref(), Some("my_checkpoint"));

    let stored = files_under(&dir.path().join("uncommitted/validations"), "json");
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0],
        dir.path().join(
            "uncommitted/validations/validate_trips/20240115-103000-my-run-name-template/20240115T103000.000000Z/spark_df-trips_df.json"
        )
    );

    let docs_root = dir.path().join("uncommitted/data_docs/local_site");
    let pages = files_under(&docs_root, "html");
    assert_eq!(pages.len(), 3);
    assert!(docs_root.join("index.html").is_file());
    assert!(docs_root.join("expectations/validate_trips.html").is_file());
    assert_eq!(result.validation_pages().len(), 1);
    assert!(result.validation_pages()[0].is_file());

    let index = std::fs::read_to_string(docs_root.join("index.html")).unwrap();
    assert!(index.contains("validate_trips"));
    assert!(index.contains("Failed"));
}

#[test]
fn test_run_without_docs_action_writes_no_pages() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    context
        .add_or_update_checkpoint(&checkpoint(&request, vec![ActionConfig::store_validation_result()]))
        .unwrap();
    let result = context.run_checkpoint("my_checkpoint").unwrap();

    assert_eq!(files_under(&dir.path().join("uncommitted/validations"), "json").len(), 1);
    assert!(files_under(&dir.path().join("uncommitted/data_docs/local_site"), "html").is_empty());
    assert_eq!(result.run_results[0].actions_results.len(), 1);
    assert!(matches!(
        result.run_results[0].actions_results[0].outcome,
        ActionOutcome::StoreValidationResultAction { .. }
    ));
}

#[test]
fn test_run_without_store_action_stores_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    context
        .add_or_update_checkpoint(&checkpoint(&request, vec![ActionConfig::update_data_docs()]))
        .unwrap();
    let result = context.run_checkpoint("my_checkpoint").unwrap();

    assert!(files_under(&dir.path().join("uncommitted/validations"), "json").is_empty());
    assert!(result.stored_paths().is_empty());
    assert_eq!(result.validation_pages().len(), 1);
}

#[test]
fn test_empty_action_list_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    context.add_or_update_checkpoint(&checkpoint(&request, vec![])).unwrap();
    let result = context.run_checkpoint("my_checkpoint").unwrap();

    assert_eq!(result.run_results.len(), 1);
    assert!(files_under(&dir.path().join("uncommitted/validations"), "json").is_empty());
    assert!(files_under(&dir.path().join("uncommitted/data_docs/local_site"), "html").is_empty());
}

#[test]
fn test_discard_failed_makes_checkpoint_pass() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    let mut validator = context.get_validator(&request, "validate_trips").unwrap();
    validator.expect_column_values_to_not_be_null("passenger_count").unwrap();
    validator.expect_column_values_to_not_be_null("trip_distance").unwrap();
    validator.save_expectation_suite(true).unwrap();

    let suite = context.get_expectation_suite("validate_trips").unwrap();
    // the between expectation was loaded, not re-evaluated, so it stays
    assert_eq!(suite.len(), 2);

    let mut fresh = context.get_validator(&request, "validate_trips").unwrap();
    fresh.expect_column_values_to_be_between("trip_distance", Some(0.0), Some(200.0)).unwrap();
    fresh.save_expectation_suite(true).unwrap();

    context.add_or_update_checkpoint(&checkpoint(&request, vec![])).unwrap();
    let result = context.run_checkpoint("my_checkpoint").unwrap();
    assert!(result.success);
}

#[test]
fn test_checkpoint_yaml_round_trip_through_store() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    let config = checkpoint(
        &request,
        vec![ActionConfig::store_validation_result(), ActionConfig::update_data_docs()],
    );
    context.add_or_update_checkpoint(&config).unwrap();

    let yaml = std::fs::read_to_string(dir.path().join("checkpoints/my_checkpoint.yml")).unwrap();
    assert!(yaml.contains("run_name_template:"));
    assert!(yaml.contains("my-run-name-template"));
    assert!(yaml.contains("class_name: StoreValidationResultAction"));

    let loaded = context.get_checkpoint("my_checkpoint").unwrap();
    assert_eq!(loaded.config(), &config);
    assert_eq!(context.list_checkpoints().unwrap(), vec!["my_checkpoint".to_string()]);
}

#[test]
fn test_missing_suite_is_checkpoint_error() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    let config = checkpoint(&request, vec![]).with_expectation_suite_name("no_such_suite");
    context.add_or_update_checkpoint(&config).unwrap();

    let err = context.run_checkpoint("my_checkpoint").unwrap_err();
    assert!(matches!(err, DqError::Checkpoint(_)));
}

#[test]
fn test_invalid_template_is_checkpoint_error() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    let config = checkpoint(&request, vec![]).with_run_name_template("run-%");
    context.add_or_update_checkpoint(&config).unwrap();

    assert!(matches!(context.run_checkpoint("my_checkpoint"), Err(DqError::Checkpoint(_))));
}

#[test]
fn test_build_data_docs_and_view() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    context
        .add_or_update_checkpoint(&checkpoint(&request, vec![ActionConfig::store_validation_result()]))
        .unwrap();
    let result = context.run_checkpoint("my_checkpoint").unwrap();

    let report = context.build_data_docs().unwrap();
    assert_eq!(report.suite_pages.len(), 1);
    assert_eq!(report.validation_pages.len(), 1);
    assert!(report.index.is_file());

    let viewed = context.view_validation_result(&result).unwrap();
    assert_eq!(viewed, report.validation_pages);

    let stored = context.list_validation_results().unwrap();
    assert_eq!(stored.len(), 1);
    let reloaded = context.get_validation_result(&stored[0]).unwrap();
    let original = &result.run_results[0].validation_result;
    assert_eq!(reloaded.meta, original.meta);
    assert_eq!(reloaded.success, original.success);
    assert_eq!(reloaded.results.len(), original.results.len());
}

#[test]
fn test_docs_index_has_no_dead_links() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    // an earlier run stored a result without rendering docs
    context
        .add_or_update_checkpoint(&checkpoint(&request, vec![ActionConfig::store_validation_result()]))
        .unwrap();
    context.get_checkpoint("my_checkpoint").unwrap().run_at(run_time()).unwrap();

    context
        .add_or_update_checkpoint(&checkpoint(
            &request,
            vec![ActionConfig::store_validation_result(), ActionConfig::update_data_docs()],
        ))
        .unwrap();
    let later = run_time() + chrono::Duration::hours(1);
    context.get_checkpoint("my_checkpoint").unwrap().run_at(later).unwrap();

    let docs_root = dir.path().join("uncommitted/data_docs/local_site");
    let index = std::fs::read_to_string(docs_root.join("index.html")).unwrap();
    let links: Vec<&str> = index
        .split("href=\"")
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter(|href| href.ends_with(".html"))
        .collect();

    assert_eq!(links.len(), 3);
    for link in links {
        assert!(docs_root.join(link).is_file(), "dead link {}", link);
    }
}

#[test]
fn test_failing_action_reports_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let (context, request) = setup(dir.path());

    // a file where the validation pages directory belongs
    let docs_root = dir.path().join("uncommitted/data_docs/local_site");
    std::fs::write(docs_root.join("validations"), "").unwrap();

    context
        .add_or_update_checkpoint(&checkpoint(&request, vec![ActionConfig::update_data_docs()]))
        .unwrap();

    match context.run_checkpoint("my_checkpoint") {
        Err(DqError::Action { name, message }) => {
            assert_eq!(name, UPDATE_DATA_DOCS);
            assert!(!message.is_empty());
        }
        other => panic!("expected action error, got {:?}", other.map(|r| r.success)),
    }
}
