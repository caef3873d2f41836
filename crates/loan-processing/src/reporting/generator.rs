use crate::error::Result;
use crate::types::{ColumnSummary, PipelineResult};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Run Report Types
// ============================================================================

/// Report of a single pipeline run, for CLI and library output.
///
/// Use this for both JSON output (`--json`) and file writing (`--emit-report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,

    pub input_file: Option<String>,
    pub rates_file: Option<String>,
    pub output_file: Option<String>,

    pub rows_before: usize,
    pub rows_after: usize,
    pub header_before: Vec<String>,
    pub header_after: Vec<String>,

    pub dropped_columns: Vec<String>,

    /// Substitutions per column, only for columns that had missing values.
    pub imputations: Vec<ImputationReport>,

    /// Lexical-rank codes of the observed subgrades.
    pub subgrade_encoding: BTreeMap<String, i64>,

    /// Monthly exchange rates, January first.
    pub exchange_rates: Vec<f64>,
    pub mean_exchange_rate: f64,

    pub resumed_groups: Vec<String>,

    /// Data-quality findings and policy notes.
    pub warnings: Vec<String>,

    pub duration_ms: u64,
    pub stage_durations_ms: BTreeMap<String, u64>,

    pub processing_steps: Vec<String>,
    pub column_summaries: Vec<ColumnSummary>,
}

/// Missing-value substitution applied to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    pub column: String,
    pub missing: usize,
    pub imputed: usize,
    pub substitute: Option<String>,
}

/// Writes the processed table and run reports into the output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: String,
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: String) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    /// Path the processed table is written to.
    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.csv", self.output_name))
    }

    /// Path the JSON run report is written to.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_report.json", self.output_name))
    }

    /// Write the processed table as comma-delimited text with a header row.
    ///
    /// The file is written next to its final name and renamed into place,
    /// so an interrupted write never leaves a partial output table.
    pub fn write_table(&self, table: &DataFrame) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self.table_path();
        let tmp_path = output_path.with_extension("csv.tmp");

        if let Err(e) = Self::write_csv(table, &tmp_path)
            .and_then(|_| fs::rename(&tmp_path, &output_path).map_err(Into::into))
        {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                debug!("Could not remove {}: {}", tmp_path.display(), cleanup);
            }
            return Err(e);
        }

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    fn write_csv(table: &DataFrame, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        let mut table = table.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut table)?;
        file.sync_all()?;
        Ok(())
    }

    /// Build a run report from pipeline results.
    pub fn build_report(
        input_file: Option<&Path>,
        rates_file: Option<&Path>,
        result: &PipelineResult,
    ) -> RunReport {
        let summary = &result.summary;

        let imputations = summary
            .column_summaries
            .iter()
            .filter(|c| c.missing_before > 0 || c.imputed > 0)
            .map(|c| ImputationReport {
                column: c.name.clone(),
                missing: c.missing_before,
                imputed: c.imputed,
                substitute: c.imputation_method.clone(),
            })
            .collect();

        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.map(|p| p.display().to_string()),
            rates_file: rates_file.map(|p| p.display().to_string()),
            output_file: result
                .output_file
                .as_ref()
                .map(|p| p.display().to_string()),
            rows_before: summary.rows_before,
            rows_after: summary.rows_after,
            header_before: summary.header_before.clone(),
            header_after: summary.header_after.clone(),
            dropped_columns: summary.dropped_columns.clone(),
            imputations,
            subgrade_encoding: summary.subgrade_encoding.clone(),
            exchange_rates: summary.exchange_rates.clone(),
            mean_exchange_rate: summary.mean_exchange_rate,
            resumed_groups: summary.resumed_groups.clone(),
            warnings: summary.warnings.clone(),
            duration_ms: summary.duration_ms,
            stage_durations_ms: summary.stage_durations_ms.clone(),
            processing_steps: result.processing_steps.clone(),
            column_summaries: summary.column_summaries.clone(),
        }
    }

    /// Write a run report to `<output_name>_report.json` in the output directory.
    pub fn write_report_to_file(&self, report: &RunReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.report_path();
        let mut file = File::create(&report_path)?;
        let json = serde_json::to_string_pretty(report)?;
        file.write_all(json.as_bytes())?;

        debug!("Report size: {} bytes", json.len());
        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
