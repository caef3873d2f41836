//! Main preprocessing pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the loan preprocessing workflow.

use crate::checkpoint::{CATEGORICAL_CHECKPOINT, CheckpointStore, NUMERIC_CHECKPOINT};
use crate::cleaner::DataCleaner;
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::currency::{CurrencyNormalizer, ExchangeRateTable};
use crate::encoders::tables::UNKNOWN_MONTH;
use crate::encoders::{CategoricalEncoder, ReferenceCheck};
use crate::error::{PreprocessingError, Result};
use crate::imputers::{CategoricalImputer, Imputation, WorstCaseImputer};
use crate::loader;
use crate::pipeline::assembler::TableAssembler;
use crate::pipeline::progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::{ColumnClassifier, ColumnGroups};
use crate::reporting::ReportGenerator;
use crate::schema::{self, NUMERIC_RULES};
use crate::types::{
    ActionType, ColumnClassification, ColumnSummary, PipelineResult, PreprocessingAction,
    PreprocessingSummary,
};
use crate::utils::{column_names, float_values, int_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Raw categorical columns that survive encoding: raw name, output name, encoding.
const CATEGORICAL_OUTPUTS: &[(&str, &str, &str)] = &[
    (schema::ISSUE_DATE, schema::ISSUE_DATE_OUT, "month code 0-12"),
    (schema::LOAN_STATUS, schema::LOAN_STATUS, "binary outcome"),
    (schema::TERM, schema::TERM_OUT, "months"),
    (schema::SUB_GRADE, schema::SUB_GRADE, "lexical rank"),
    (schema::VERIFICATION_STATUS, schema::VERIFICATION_STATUS, "binary outcome"),
    (schema::ADDR_STATE, schema::STATE_OUT, "region bucket 0-4"),
];

/// Summary facts of a column group, saved beside its checkpoint so a
/// resumed run reports the same imputations, warnings and encodings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct GroupNotes {
    imputations: Vec<Imputation>,
    warnings: Vec<String>,
    #[serde(default)]
    subgrade_encoding: BTreeMap<String, i64>,
}

/// The main preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use loan_processing::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().output_dir("out").build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process_files("loan-data.csv", "EUR-USD.csv")?;
///
/// println!("{} records written", result.table.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cleaner: DataCleaner,
    encoder: CategoricalEncoder,
    normalizer: CurrencyNormalizer,
    checkpoints: CheckpointStore,
    reporter: ReportGenerator,
}

// Ensure Pipeline is Send (can be moved to a worker thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both input tables from disk and run the whole pipeline.
    ///
    /// No output file is written unless every stage succeeds.
    pub fn process_files(
        &self,
        loan_path: impl AsRef<Path>,
        rates_path: impl AsRef<Path>,
    ) -> Result<PipelineResult> {
        let started = Instant::now();
        let outcome = self
            .load_inputs(loan_path.as_ref(), rates_path.as_ref())
            .and_then(|(raw, rates, loading_ms)| self.run(raw, &rates, started, Some(loading_ms)));
        self.finish(outcome)
    }

    /// Run the pipeline over an already loaded raw table.
    ///
    /// `raw` must hold every column as text, the way [`loader::load_text_table`]
    /// reads it.
    pub fn process(&self, raw: DataFrame, rates: &ExchangeRateTable) -> Result<PipelineResult> {
        let outcome = self.run(raw, rates, Instant::now(), None);
        self.finish(outcome)
    }

    /// Load, clean and classify the loan table without transforming anything.
    pub fn inspect(&self, loan_path: impl AsRef<Path>) -> Result<ColumnClassification> {
        let raw = loader::load_text_table(loan_path.as_ref(), self.config.loan_separator())?;
        let (raw, _) = self.cleaner.clean(raw)?;
        ColumnClassifier::classify(&raw)
    }

    fn finish(&self, outcome: Result<PipelineResult>) -> Result<PipelineResult> {
        match outcome {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Preprocessed {} records",
                    result.table.height()
                )));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn load_inputs(
        &self,
        loan_path: &Path,
        rates_path: &Path,
    ) -> Result<(DataFrame, ExchangeRateTable, u64)> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Loading,
            0.0,
            "Loading input tables...",
        ));
        info!("Step 1: Loading input tables...");

        let raw = loader::load_text_table(loan_path, self.config.loan_separator())?;
        let rates = ExchangeRateTable::load(
            rates_path,
            self.config.rates_separator(),
            &self.config.rate_column,
        )?;

        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Loading,
            1.0,
            format!("Loaded {} loan records", raw.height()),
        ));
        Ok((raw, rates, elapsed_ms(started)))
    }

    fn run(
        &self,
        raw: DataFrame,
        rates: &ExchangeRateTable,
        started: Instant,
        loading_ms: Option<u64>,
    ) -> Result<PipelineResult> {
        info!("Starting preprocessing pipeline...");

        let mut summary = PreprocessingSummary::new();
        if let Some(ms) = loading_ms {
            summary.record_stage(PreprocessingStage::Loading.key(), ms);
        }
        summary.rows_before = raw.height();
        summary.header_before = column_names(&raw);
        summary.exchange_rates = rates.rates().to_vec();
        summary.mean_exchange_rate = rates.mean();

        let mut processing_steps: Vec<String> = Vec::new();

        let (classification, groups) = self.classify(raw, &mut summary, &mut processing_steps)?;
        let ColumnGroups {
            numeric,
            categorical,
        } = groups;

        let ids = float_values(&numeric, schema::ID)?;
        let categorical =
            self.categorical_group(categorical, &ids, &mut summary, &mut processing_steps)?;

        let issue_months = issue_months(&categorical)?;
        let numeric = self.numeric_group(
            numeric,
            &classification,
            &issue_months,
            rates,
            &mut summary,
            &mut processing_steps,
        )?;

        let table = self.assemble(&numeric, &categorical, &mut summary)?;

        let output_file = if self.config.save_to_disk {
            Some(self.write_output(&table, &mut summary)?)
        } else {
            debug!("Skipping output file (save_to_disk disabled)");
            None
        };

        summary.duration_ms = elapsed_ms(started);
        info!(
            "Pipeline finished in {}ms: {} records, {} columns, {} values imputed",
            summary.duration_ms,
            table.height(),
            table.width(),
            summary.total_imputed()
        );

        Ok(PipelineResult {
            table,
            output_file,
            processing_steps,
            summary,
        })
    }

    // ========================================================================
    // Stages
    // ========================================================================

    fn classify(
        &self,
        raw: DataFrame,
        summary: &mut PreprocessingSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<(ColumnClassification, ColumnGroups)> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Classification,
            0.0,
            "Classifying columns...",
        ));
        info!("Step 2: Cleaning and classifying columns...");

        let (raw, cleaning_actions) = self.cleaner.clean(raw)?;
        processing_steps.extend(cleaning_actions);

        let classification = ColumnClassifier::classify(&raw)?;
        schema::validate_classification(&classification)?;

        for profile in &classification.column_profiles {
            if profile.unparseable_count > 0 {
                summary.add_warning(format!(
                    "Column '{}': {} non-numeric tokens treated as missing (e.g. {:?})",
                    profile.name, profile.unparseable_count, profile.sample_values
                ));
            }
            summary.add_column_summary(ColumnSummary::new(
                &profile.name,
                profile.group,
                profile.missing_count + profile.unparseable_count,
            ));
            summary.add_action(PreprocessingAction::new(
                ActionType::ColumnClassified,
                &profile.name,
                format!("Classified as {}", profile.group.as_str()),
            ));
        }

        let numeric_count = classification.numeric_columns().len();
        let categorical_count = classification.categorical_columns().len();
        processing_steps.push(format!(
            "Classified {} numeric and {} categorical columns",
            numeric_count, categorical_count
        ));

        let groups = ColumnClassifier::split(&raw, &classification)?;
        WorstCaseImputer::check_identifier(&groups.numeric)?;

        summary.record_stage(PreprocessingStage::Classification.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Classification,
            1.0,
            format!(
                "{} numeric, {} categorical columns",
                numeric_count, categorical_count
            ),
        ));
        Ok((classification, groups))
    }

    fn categorical_group(
        &self,
        mut categorical: DataFrame,
        ids: &[Option<f64>],
        summary: &mut PreprocessingSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        if self.should_resume(CATEGORICAL_CHECKPOINT) {
            let reference =
                CategoricalEncoder::check_reference(&string_values(&categorical, schema::URL)?, ids)?;
            let keep_reference = reference != ReferenceCheck::Redundant;
            let (frame, notes) = self.resume_group(
                CATEGORICAL_CHECKPOINT,
                &schema::categorical_layout(keep_reference),
                categorical.height(),
                summary,
            )?;
            apply_notes(summary, notes);
            note_categorical_outputs(
                summary,
                &CategoricalEncoder::dropped_columns(&reference),
                keep_reference,
            );
            return Ok(frame);
        }

        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::CategoricalEncoding,
            0.0,
            "Imputing and encoding categorical columns...",
        ));
        info!("Step 3: Imputing and encoding categorical columns...");

        let imputations = CategoricalImputer::impute(&mut categorical, processing_steps)?;

        let encoded = self.encoder.encode(&categorical, ids, processing_steps)?;
        let keep_reference = encoded.frame.column(schema::REFERENCE_OUT).is_ok();
        let notes = GroupNotes {
            imputations,
            warnings: encoded.warnings,
            subgrade_encoding: encoded.subgrade_encoding.into_codes(),
        };
        apply_notes(summary, notes.clone());
        note_categorical_outputs(summary, &encoded.dropped_columns, keep_reference);

        summary.record_stage(
            PreprocessingStage::CategoricalEncoding.key(),
            elapsed_ms(started),
        );
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::CategoricalEncoding,
            1.0,
            format!("Encoded {} categorical columns", encoded.frame.width()),
        ));

        self.persist(CATEGORICAL_CHECKPOINT, encoded.frame, &notes, summary)
    }

    fn numeric_group(
        &self,
        mut numeric: DataFrame,
        classification: &ColumnClassification,
        issue_months: &[i64],
        rates: &ExchangeRateTable,
        summary: &mut PreprocessingSummary,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        let unknown = issue_months.iter().filter(|m| **m == UNKNOWN_MONTH).count();
        if unknown > 0 {
            summary.add_warning(format!(
                "Policy note: {} records without issue month use the mean exchange rate {:.4} instead of a worst-case rate",
                unknown,
                rates.mean()
            ));
        }

        if self.should_resume(NUMERIC_CHECKPOINT) {
            let layout =
                schema::numeric_layout(&self.config.source_currency, &self.config.target_currency);
            let (frame, notes) =
                self.resume_group(NUMERIC_CHECKPOINT, &layout, numeric.height(), summary)?;
            apply_notes(summary, notes);
            self.note_numeric_outputs(summary);
            return Ok(frame);
        }

        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::NumericImputation,
            0.0,
            "Imputing numeric columns...",
        ));
        info!("Step 4: Imputing numeric columns...");

        let imputations = WorstCaseImputer::impute(&mut numeric, classification, processing_steps)?;
        let resolved = imputations.iter().map(|i| i.count).sum::<usize>();
        let notes = GroupNotes {
            imputations,
            ..GroupNotes::default()
        };
        apply_notes(summary, notes.clone());

        summary.record_stage(PreprocessingStage::NumericImputation.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::NumericImputation,
            1.0,
            format!("Resolved {} missing numeric values", resolved),
        ));

        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::CurrencyConversion,
            0.0,
            "Converting monetary columns...",
        ));
        info!("Step 5: Converting monetary columns...");

        let converted = self
            .normalizer
            .normalize(&numeric, issue_months, rates, processing_steps)?;
        self.note_numeric_outputs(summary);

        summary.record_stage(
            PreprocessingStage::CurrencyConversion.key(),
            elapsed_ms(started),
        );
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::CurrencyConversion,
            1.0,
            format!(
                "Converted monetary columns from {} to {}",
                self.config.source_currency, self.config.target_currency
            ),
        ));

        self.persist(NUMERIC_CHECKPOINT, converted, &notes, summary)
    }

    fn assemble(
        &self,
        numeric: &DataFrame,
        categorical: &DataFrame,
        summary: &mut PreprocessingSummary,
    ) -> Result<DataFrame> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Assembly,
            0.0,
            "Assembling output table...",
        ));
        info!("Step 6: Assembling output table...");

        let keep_reference = categorical.column(schema::REFERENCE_OUT).is_ok();
        let layout = schema::output_layout(
            &self.config.source_currency,
            &self.config.target_currency,
            keep_reference,
        );
        let table = TableAssembler::assemble(numeric, categorical, &layout)?;

        if table.height() != summary.rows_before {
            return Err(PreprocessingError::Internal(format!(
                "output has {} records but the input had {}",
                table.height(),
                summary.rows_before
            )));
        }

        summary.rows_after = table.height();
        summary.header_after = column_names(&table);

        summary.record_stage(PreprocessingStage::Assembly.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Assembly,
            1.0,
            format!("Assembled {} x {} table", table.height(), table.width()),
        ));
        Ok(table)
    }

    fn write_output(&self, table: &DataFrame, summary: &mut PreprocessingSummary) -> Result<PathBuf> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Writing,
            0.0,
            "Writing output table...",
        ));
        info!("Step 7: Writing output table...");

        let path = self.reporter.write_table(table)?;

        summary.record_stage(PreprocessingStage::Writing.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Writing,
            1.0,
            format!("Output saved: {}", path.display()),
        ));
        Ok(path)
    }

    // ========================================================================
    // Checkpoints
    // ========================================================================

    fn should_resume(&self, name: &str) -> bool {
        if !self.config.resume_from_checkpoints {
            return false;
        }
        let exists = self.checkpoints.exists(name);
        if !exists {
            debug!("No checkpoint '{}' to resume from, recomputing", name);
        }
        exists
    }

    fn resume_group(
        &self,
        name: &str,
        layout: &[String],
        rows: usize,
        summary: &mut PreprocessingSummary,
    ) -> Result<(DataFrame, GroupNotes)> {
        let started = Instant::now();
        self.report_progress(ProgressUpdate::with_sub_stage(
            PreprocessingStage::Checkpointing,
            name,
            0.0,
            format!("Resuming from '{}'...", name),
        ));

        let frame = self.checkpoints.load_with_header(name, layout)?;
        if frame.height() != rows {
            return Err(PreprocessingError::Checkpoint {
                name: name.to_string(),
                reason: format!("holds {} records but the input has {}", frame.height(), rows),
            });
        }
        let notes: GroupNotes = self.checkpoints.load_notes(name)?;

        let path = self.checkpoints.path(name);
        info!("Resumed '{}' from {}", name, path.display());
        summary.resumed_groups.push(name.to_string());
        summary.add_action(PreprocessingAction::new(
            ActionType::CheckpointLoaded,
            name,
            format!("Loaded from {}", path.display()),
        ));

        summary.record_stage(PreprocessingStage::Checkpointing.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::with_sub_stage(
            PreprocessingStage::Checkpointing,
            name,
            1.0,
            format!("Resumed '{}'", name),
        ));
        Ok((frame, notes))
    }

    /// Persist a finished group and continue from the reloaded copy.
    fn persist(
        &self,
        name: &str,
        frame: DataFrame,
        notes: &GroupNotes,
        summary: &mut PreprocessingSummary,
    ) -> Result<DataFrame> {
        if !self.config.write_checkpoints {
            debug!("Skipping checkpoint '{}' (checkpoints disabled)", name);
            return Ok(frame);
        }

        let started = Instant::now();
        self.report_progress(ProgressUpdate::with_sub_stage(
            PreprocessingStage::Checkpointing,
            name,
            0.0,
            format!("Writing '{}'...", name),
        ));

        let reloaded = self.checkpoints.checkpoint(name, &frame)?;
        self.checkpoints.save_notes(name, notes)?;
        summary.add_action(PreprocessingAction::new(
            ActionType::CheckpointWritten,
            name,
            format!(
                "Persisted {} records x {} columns to {}",
                reloaded.height(),
                reloaded.width(),
                self.checkpoints.path(name).display()
            ),
        ));

        summary.record_stage(PreprocessingStage::Checkpointing.key(), elapsed_ms(started));
        self.report_progress(ProgressUpdate::with_sub_stage(
            PreprocessingStage::Checkpointing,
            name,
            1.0,
            format!("Checkpoint '{}' written", name),
        ));
        Ok(reloaded)
    }

    // ========================================================================
    // Summary bookkeeping
    // ========================================================================

    fn note_numeric_outputs(&self, summary: &mut PreprocessingSummary) {
        for rule in NUMERIC_RULES {
            if rule.monetary {
                let source = schema::currency_label(rule.column, &self.config.source_currency);
                let target = schema::currency_label(rule.column, &self.config.target_currency);
                if let Some(column) = summary.column_summary_mut(rule.column) {
                    column.output_name = Some(source.clone());
                }
                summary.add_action(PreprocessingAction::new(
                    ActionType::ColumnRenamed,
                    rule.column,
                    format!("Relabeled as '{}'", source),
                ));
                summary.add_action(PreprocessingAction::new(
                    ActionType::ColumnDerived,
                    target,
                    format!("Converted from '{}' at the issue-month rate", source),
                ));
            } else if rule.percentage {
                summary.add_action(PreprocessingAction::new(
                    ActionType::DataNormalized,
                    rule.column,
                    "Rescaled from percent to fraction",
                ));
            }
        }
        summary.add_action(PreprocessingAction::new(
            ActionType::ColumnDerived,
            schema::EXCHANGE_RATE_OUT,
            "Exchange rate applied to each record",
        ));
    }
}

fn apply_notes(summary: &mut PreprocessingSummary, notes: GroupNotes) {
    note_imputations(summary, &notes.imputations);
    for warning in notes.warnings {
        summary.add_warning(warning);
    }
    if !notes.subgrade_encoding.is_empty() {
        summary.subgrade_encoding = notes.subgrade_encoding;
    }
}

fn note_imputations(summary: &mut PreprocessingSummary, imputations: &[Imputation]) {
    for imputation in imputations {
        if let Some(column) = summary.column_summary_mut(&imputation.column) {
            column.imputed += imputation.count;
            column.imputation_method =
                Some(format!("{} ({})", imputation.substitute, imputation.rule));
        }
        summary.add_action(
            PreprocessingAction::new(
                ActionType::ValueImputed,
                &imputation.column,
                format!(
                    "Filled {} missing values with {}",
                    imputation.count, imputation.substitute
                ),
            )
            .with_details(imputation.rule.clone()),
        );
    }
}

fn note_categorical_outputs(
    summary: &mut PreprocessingSummary,
    dropped: &[(String, String)],
    keep_reference: bool,
) {
    for (raw, output, encoding) in CATEGORICAL_OUTPUTS {
        if let Some(column) = summary.column_summary_mut(raw) {
            column.output_name = Some(output.to_string());
            column.encoding = Some(encoding.to_string());
        }
        if raw != output {
            summary.add_action(PreprocessingAction::new(
                ActionType::ColumnRenamed,
                *raw,
                format!("Relabeled as '{}'", output),
            ));
        }
        summary.add_action(PreprocessingAction::new(
            ActionType::CategoriesEncoded,
            *output,
            format!("Encoded as {}", encoding),
        ));
    }

    if keep_reference {
        if let Some(column) = summary.column_summary_mut(schema::URL) {
            column.output_name = Some(schema::REFERENCE_OUT.to_string());
            column.encoding = Some("loan id".to_string());
        }
        summary.add_action(PreprocessingAction::new(
            ActionType::ColumnRenamed,
            schema::URL,
            format!("Relabeled as '{}'", schema::REFERENCE_OUT),
        ));
    }

    for (column, reason) in dropped {
        if let Some(summary_entry) = summary.column_summary_mut(column) {
            summary_entry.mark_removed(reason.clone());
        }
        summary.dropped_columns.push(column.clone());
        summary.add_action(PreprocessingAction::new(
            ActionType::ColumnRemoved,
            column,
            reason.clone(),
        ));
    }
}

/// Encoded issue months of the categorical group, one per record.
fn issue_months(categorical: &DataFrame) -> Result<Vec<i64>> {
    int_values(categorical, schema::ISSUE_DATE_OUT)?
        .into_iter()
        .collect::<Option<Vec<i64>>>()
        .ok_or_else(|| {
            PreprocessingError::Internal(format!(
                "'{}' has records without a month code",
                schema::ISSUE_DATE_OUT
            ))
        })
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use loan_processing::{ProgressReporter, ProgressUpdate};
    /// use std::sync::Arc;
    ///
    /// struct MyReporter;
    ///
    /// impl ProgressReporter for MyReporter {
    ///     fn report(&self, update: ProgressUpdate) {
    ///         println!("{}: {}", update.stage.display_name(), update.message);
    ///     }
    /// }
    ///
    /// let pipeline = Pipeline::builder()
    ///     .progress_reporter(Arc::new(MyReporter))
    ///     .build()?;
    /// ```
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let reporter = ReportGenerator::new(config.output_dir.clone(), config.output_name.clone());

        Ok(Pipeline {
            progress_reporter: self.progress_reporter,
            cleaner: DataCleaner,
            encoder: CategoricalEncoder::new(config.strict_regions),
            normalizer: CurrencyNormalizer::new(
                config.source_currency.clone(),
                config.target_currency.clone(),
            ),
            checkpoints: CheckpointStore::new(config.checkpoint_dir.clone()),
            reporter,
            config,
        })
    }
}
