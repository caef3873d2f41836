//! Integration tests for the loan preprocessing pipeline.
//!
//! These tests run the full pipeline over the fixture tables in
//! `tests/fixtures` and check the written output, checkpoints and reports.

use loan_processing::checkpoint::{CATEGORICAL_CHECKPOINT, NUMERIC_CHECKPOINT};
use loan_processing::utils::{column_names, float_values, int_values};
use loan_processing::{
    CheckpointStore, ExchangeRateTable, Pipeline, PipelineConfig, PipelineResult,
    PreprocessingError, PreprocessingStage, ReportGenerator, schema,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn loan_fixture() -> PathBuf {
    fixtures_path().join("loan_sample.csv")
}

fn rates_fixture() -> PathBuf {
    fixtures_path().join("eur_usd.csv")
}

fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig::builder()
        .output_dir(dir.join("output"))
        .output_name("loans")
        .checkpoint_dir(dir.join("checkpoints"))
        .build()
        .unwrap()
}

fn run(config: PipelineConfig, loans: &Path) -> Result<PipelineResult, PreprocessingError> {
    Pipeline::builder()
        .config(config)
        .build()
        .unwrap()
        .process_files(loans, rates_fixture())
}

fn fixture_rates() -> ExchangeRateTable {
    let config = PipelineConfig::default();
    ExchangeRateTable::load(&rates_fixture(), config.rates_separator(), &config.rate_column)
        .unwrap()
}

/// Row index of the record with the given id.
fn row_of(table: &DataFrame, id: f64) -> usize {
    float_values(table, schema::ID)
        .unwrap()
        .iter()
        .position(|v| *v == Some(id))
        .unwrap_or_else(|| panic!("record {} not in table", id))
}

fn float_at(table: &DataFrame, column: &str, row: usize) -> f64 {
    float_values(table, column).unwrap()[row].unwrap()
}

fn int_at(table: &DataFrame, column: &str, row: usize) -> i64 {
    int_values(table, column).unwrap()[row].unwrap()
}

/// Copy the loan fixture into `dir`, rewriting its text first.
fn modified_fixture(dir: &Path, edit: impl Fn(String) -> String) -> PathBuf {
    let content = fs::read_to_string(loan_fixture()).unwrap();
    let path = dir.join("loans_modified.csv");
    fs::write(&path, edit(content)).unwrap();
    path
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_pipeline_writes_ordered_numeric_table() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();

    let output_file = result.output_file.clone().unwrap();
    assert_eq!(output_file, dir.path().join("output").join("loans.csv"));
    assert!(output_file.exists());

    let written = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(output_file))
        .unwrap()
        .finish()
        .unwrap();

    assert_eq!(column_names(&written), schema::output_layout("USD", "EUR", false));
    assert_eq!(written.height(), 9);
    for column in written.get_columns() {
        assert!(
            column.dtype().is_primitive_numeric(),
            "column '{}' is {:?}",
            column.name(),
            column.dtype()
        );
        assert_eq!(column.null_count(), 0, "column '{}' has nulls", column.name());
    }

    let ids: Vec<f64> = float_values(&written, schema::ID)
        .unwrap()
        .into_iter()
        .flatten()
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(ids, sorted);
    assert_eq!(ids.first(), Some(&1071570.0));
}

#[test]
fn test_row_count_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();
    let summary = &result.summary;

    assert_eq!(summary.rows_before, 9);
    assert_eq!(summary.rows_after, 9);
    assert_eq!(summary.header_before.len(), 14);
    assert_eq!(summary.header_after, schema::output_layout("USD", "EUR", false));
    assert_eq!(summary.dropped_columns, vec!["grade", "url"]);
    assert_eq!(summary.exchange_rates.len(), 12);
    assert!(summary.resumed_groups.is_empty());
    assert!(!result.processing_steps.is_empty());
}

#[test]
fn test_empty_record_resolves_to_worst_case() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();
    let table = &result.table;
    let row = row_of(table, 1075269.0);

    assert_eq!(int_at(table, schema::LOAN_STATUS, row), 0);
    assert_eq!(int_at(table, schema::VERIFICATION_STATUS, row), 0);
    assert_eq!(int_at(table, schema::TERM_OUT, row), 60);
    assert_eq!(int_at(table, schema::STATE_OUT, row), 0);
    assert_eq!(int_at(table, schema::ISSUE_DATE_OUT, row), 0);

    // H1 ranks after every observed subgrade
    assert_eq!(int_at(table, schema::SUB_GRADE, row), 8);
    assert_eq!(result.summary.subgrade_encoding.get("H1"), Some(&8));

    assert_eq!(float_at(table, "loan_amnt_USD", row), 10000.0);
    assert_eq!(float_at(table, "funded_amnt_USD", row), 2400.0);
    assert_eq!(float_at(table, "installment_USD", row), 339.31);
    assert_eq!(float_at(table, "total_pymnt_USD", row), 12231.89);
    assert!((float_at(table, schema::INTEREST_RATE, row) - 0.1864).abs() < 1e-12);
}

#[test]
fn test_missing_subgrade_takes_worst_of_its_grade() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();
    let table = &result.table;

    let b5 = result.summary.subgrade_encoding["B5"];
    assert_eq!(int_at(table, schema::SUB_GRADE, row_of(table, 1071570.0)), b5);
    assert_eq!(int_at(table, schema::SUB_GRADE, row_of(table, 1075358.0)), b5);
}

#[test]
fn test_issue_month_selects_exchange_rate() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();
    let table = &result.table;
    let rates = fixture_rates();

    let march = row_of(table, 1077430.0);
    assert_eq!(int_at(table, schema::ISSUE_DATE_OUT, march), 3);
    assert_eq!(float_at(table, schema::EXCHANGE_RATE_OUT, march), 1.4160);
    assert_eq!(
        float_at(table, "loan_amnt_EUR", march),
        2500.0 / 1.4160
    );

    let undated = row_of(table, 1076863.0);
    assert_eq!(int_at(table, schema::ISSUE_DATE_OUT, undated), 0);
    assert_eq!(float_at(table, schema::EXCHANGE_RATE_OUT, undated), rates.mean());
    assert_eq!(result.summary.mean_exchange_rate, rates.mean());
    assert!(
        result
            .summary
            .warnings
            .iter()
            .any(|w| w.contains("mean exchange rate"))
    );
}

#[test]
fn test_rerun_is_byte_identical() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = run(config_in(first_dir.path()), &loan_fixture()).unwrap();
    let second = run(config_in(second_dir.path()), &loan_fixture()).unwrap();

    let first_bytes = fs::read(first.output_file.unwrap()).unwrap();
    let second_bytes = fs::read(second.output_file.unwrap()).unwrap();
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn test_in_memory_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("output"))
        .write_checkpoints(false)
        .save_to_disk(false)
        .build()
        .unwrap();

    let result = run(config, &loan_fixture()).unwrap();

    assert!(result.output_file.is_none());
    assert_eq!(result.table.height(), 9);
    assert!(!dir.path().join("output").exists());
}

#[test]
fn test_distinct_reference_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let loans = modified_fixture(dir.path(), |content| {
        content.replace("loan_id=1077501", "loan_id=9999999")
    });

    let result = run(config_in(dir.path()), &loans).unwrap();

    assert_eq!(
        column_names(&result.table),
        schema::output_layout("USD", "EUR", true)
    );
    assert_eq!(result.summary.dropped_columns, vec!["grade"]);
    let row = row_of(&result.table, 1077501.0);
    assert_eq!(int_at(&result.table, schema::REFERENCE_OUT, row), 9999999);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_strict_regions_rejects_unknown_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("output"))
        .output_name("loans")
        .checkpoint_dir(dir.path().join("checkpoints"))
        .strict_regions(true)
        .build()
        .unwrap();

    let err = run(config, &loan_fixture()).unwrap_err();

    assert!(matches!(err, PreprocessingError::UnmappedCategory { .. }));
    assert_eq!(err.column(), Some(schema::ADDR_STATE));
    assert!(!dir.path().join("output").join("loans.csv").exists());
}

#[test]
fn test_missing_rates_file_writes_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::builder()
        .config(config_in(dir.path()))
        .build()
        .unwrap();

    let result = pipeline.process_files(loan_fixture(), dir.path().join("missing.csv"));

    assert!(result.is_err());
    assert!(!dir.path().join("output").join("loans.csv").exists());
}

#[test]
fn test_short_rate_table_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let content = fs::read_to_string(rates_fixture()).unwrap();
    let short: Vec<&str> = content.lines().take(12).collect();
    let rates = dir.path().join("short_rates.csv");
    fs::write(&rates, short.join("\n")).unwrap();

    let pipeline = Pipeline::builder()
        .config(config_in(dir.path()))
        .build()
        .unwrap();
    let err = pipeline.process_files(loan_fixture(), &rates).unwrap_err();

    assert!(matches!(err, PreprocessingError::SchemaMismatch { .. }));
    assert!(!dir.path().join("output").join("loans.csv").exists());
}

#[test]
fn test_missing_identifier_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let loans = modified_fixture(dir.path(), |content| {
        content.replacen("1077175;Nov-11", ";Nov-11", 1)
    });

    let err = run(config_in(dir.path()), &loans).unwrap_err();

    assert!(matches!(
        err,
        PreprocessingError::MissingIdentifier { rows: 1, .. }
    ));
}

#[test]
fn test_unknown_grade_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let loans = modified_fixture(dir.path(), |content| {
        content.replacen("12.69;121.45;B;;", "12.69;121.45;Z;;", 1)
    });

    let err = run(config_in(dir.path()), &loans).unwrap_err();

    assert!(matches!(err, PreprocessingError::UnmappedCategory { .. }));
    assert_eq!(err.column(), Some(schema::GRADE));
    assert!(!dir.path().join("output").join("loans.csv").exists());
}

#[test]
fn test_unknown_column_fails_schema_check() {
    let dir = tempfile::tempdir().unwrap();
    let loans = modified_fixture(dir.path(), |content| {
        content.replacen("total_pymnt", "total_rec_prncp", 1)
    });

    let err = run(config_in(dir.path()), &loans).unwrap_err();

    assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
}

// ============================================================================
// Checkpoints
// ============================================================================

#[test]
fn test_checkpoints_are_written_and_resumed() {
    let dir = tempfile::tempdir().unwrap();
    let first = run(config_in(dir.path()), &loan_fixture()).unwrap();

    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    assert!(store.exists(CATEGORICAL_CHECKPOINT));
    assert!(store.exists(NUMERIC_CHECKPOINT));
    assert!(store.notes_path(CATEGORICAL_CHECKPOINT).is_file());

    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("resumed"))
        .output_name("loans")
        .checkpoint_dir(dir.path().join("checkpoints"))
        .resume_from_checkpoints(true)
        .build()
        .unwrap();
    let resumed = run(config, &loan_fixture()).unwrap();

    assert_eq!(
        resumed.summary.resumed_groups,
        vec![CATEGORICAL_CHECKPOINT, NUMERIC_CHECKPOINT]
    );
    assert_eq!(resumed.table, first.table);
    assert!(!resumed.summary.subgrade_encoding.is_empty());
    assert_eq!(resumed.summary.subgrade_encoding, first.summary.subgrade_encoding);
    assert_eq!(resumed.summary.warnings, first.summary.warnings);
    assert!(
        resumed
            .summary
            .warnings
            .iter()
            .any(|w| w.contains("unrecognised state codes"))
    );

    let first_report =
        ReportGenerator::build_report(Some(&loan_fixture()), Some(&rates_fixture()), &first);
    let resumed_report =
        ReportGenerator::build_report(Some(&loan_fixture()), Some(&rates_fixture()), &resumed);
    assert_eq!(resumed_report.imputations, first_report.imputations);
    assert_eq!(resumed_report.subgrade_encoding, first_report.subgrade_encoding);
    assert_eq!(
        fs::read(first.output_file.unwrap()).unwrap(),
        fs::read(resumed.output_file.unwrap()).unwrap()
    );
}

#[test]
fn test_resume_without_checkpoints_recomputes() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("output"))
        .checkpoint_dir(dir.path().join("checkpoints"))
        .resume_from_checkpoints(true)
        .build()
        .unwrap();

    let result = run(config, &loan_fixture()).unwrap();

    assert!(result.summary.resumed_groups.is_empty());
    assert_eq!(result.table.height(), 9);
}

#[test]
fn test_resume_rejects_mismatched_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    let stale = df!("id" => &[1.0, 2.0], "unexpected" => &[3.0, 4.0]).unwrap();
    store.save(NUMERIC_CHECKPOINT, &stale).unwrap();

    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("output"))
        .output_name("loans")
        .checkpoint_dir(dir.path().join("checkpoints"))
        .resume_from_checkpoints(true)
        .build()
        .unwrap();
    let err = run(config, &loan_fixture()).unwrap_err();

    assert_eq!(err.error_code(), "CHECKPOINT_FAILED");
    assert!(!dir.path().join("output").join("loans.csv").exists());
}

#[test]
fn test_disabled_checkpoints_are_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::builder()
        .output_dir(dir.path().join("output"))
        .checkpoint_dir(dir.path().join("checkpoints"))
        .write_checkpoints(false)
        .build()
        .unwrap();

    run(config, &loan_fixture()).unwrap();

    let store = CheckpointStore::new(dir.path().join("checkpoints"));
    assert!(!store.exists(CATEGORICAL_CHECKPOINT));
    assert!(!store.exists(NUMERIC_CHECKPOINT));
}

// ============================================================================
// Progress and Reports
// ============================================================================

#[test]
fn test_progress_reports_every_stage() {
    let dir = tempfile::tempdir().unwrap();
    let stages = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&stages);

    Pipeline::builder()
        .config(config_in(dir.path()))
        .on_progress(move |update| seen.lock().unwrap().push(update.stage))
        .build()
        .unwrap()
        .process_files(loan_fixture(), rates_fixture())
        .unwrap();

    let stages = stages.lock().unwrap();
    assert_eq!(stages.first(), Some(&PreprocessingStage::Loading));
    assert_eq!(stages.last(), Some(&PreprocessingStage::Complete));
    for stage in [
        PreprocessingStage::Classification,
        PreprocessingStage::CategoricalEncoding,
        PreprocessingStage::CurrencyConversion,
        PreprocessingStage::Checkpointing,
        PreprocessingStage::Assembly,
        PreprocessingStage::Writing,
    ] {
        assert!(stages.contains(&stage), "missing stage {:?}", stage);
    }
}

#[test]
fn test_run_report_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(config_in(dir.path()), &loan_fixture()).unwrap();

    let report =
        ReportGenerator::build_report(Some(&loan_fixture()), Some(&rates_fixture()), &result);
    let generator = ReportGenerator::new(dir.path().join("output"), "loans".to_string());
    let path = generator.write_report_to_file(&report).unwrap();

    assert_eq!(path, dir.path().join("output").join("loans_report.json"));
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(parsed["rows_before"], 9);
    assert_eq!(parsed["rows_after"], 9);
    assert_eq!(parsed["dropped_columns"][1], "url");
    assert!(
        parsed["imputations"]
            .as_array()
            .unwrap()
            .iter()
            .any(|i| i["column"] == "funded_amnt" && i["missing"] == 2)
    );
}
