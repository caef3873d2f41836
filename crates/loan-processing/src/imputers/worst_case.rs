//! Worst-case imputation for the numeric column group.
//!
//! Imputation runs as two independent passes. [`WorstCaseImputer::fill_sentinel`]
//! marks every missing entry with a sentinel larger than any observed value,
//! and [`WorstCaseImputer::resolve_sentinel`] replaces the marker with the
//! column's least favourable observed extreme.

use super::Imputation;
use crate::error::{PreprocessingError, Result};
use crate::profiler::overall_max;
use crate::schema::{self, NUMERIC_RULES, WorstCase};
use crate::types::ColumnClassification;
use crate::utils::{fill_numeric_nulls, replace_numeric_value};
use polars::prelude::*;
use tracing::{debug, info};

/// Worst-case imputer for the numeric group.
pub struct WorstCaseImputer;

impl WorstCaseImputer {
    /// A value strictly greater than every non-missing value of the group.
    ///
    /// `max + 1` stops growing past 2^53, so the sentinel is `2 * |max| + 1`.
    /// Recomputed from the frame it is given, never cached.
    pub fn sentinel(numeric: &DataFrame) -> Result<f64> {
        let series: Vec<&Series> = numeric
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series())
            .collect();
        let max = overall_max(series)?.ok_or_else(|| PreprocessingError::UndefinedStatistic {
            column: "<numeric group>".to_string(),
            rule: "sentinel above the overall maximum".to_string(),
        })?;

        let sentinel = max.abs() * 2.0 + 1.0;
        if !sentinel.is_finite() || sentinel <= max {
            return Err(PreprocessingError::UndefinedStatistic {
                column: "<numeric group>".to_string(),
                rule: format!("no finite sentinel above the overall maximum {}", max),
            });
        }
        Ok(sentinel)
    }

    /// Fail when the record identifier is missing on any row.
    pub fn check_identifier(numeric: &DataFrame) -> Result<()> {
        let missing = crate::utils::series(numeric, schema::ID)?.null_count();
        if missing > 0 {
            return Err(PreprocessingError::MissingIdentifier {
                column: schema::ID.to_string(),
                rows: missing,
            });
        }
        Ok(())
    }

    /// First pass: replace every missing entry of the imputable columns with `sentinel`.
    ///
    /// Returns the number of entries marked per column.
    pub fn fill_sentinel(numeric: &mut DataFrame, sentinel: f64) -> Result<Vec<(String, usize)>> {
        let mut marked = Vec::with_capacity(NUMERIC_RULES.len());
        for rule in NUMERIC_RULES {
            let series = crate::utils::series(numeric, rule.column)?;
            let missing = series.null_count();
            let filled = fill_numeric_nulls(series, sentinel)?;
            numeric.replace(rule.column, filled)?;
            debug!("Column '{}': {} entries marked missing", rule.column, missing);
            marked.push((rule.column.to_string(), missing));
        }
        Ok(marked)
    }

    /// Second pass: replace `sentinel` with each column's worst-case statistic.
    ///
    /// Statistics come from the classification of the raw table, so they
    /// never include the sentinel itself.
    pub fn resolve_sentinel(
        numeric: &mut DataFrame,
        sentinel: f64,
        classification: &ColumnClassification,
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<Imputation>> {
        let mut imputations = Vec::new();

        for rule in NUMERIC_RULES {
            let stats = classification.stats(rule.column).ok_or_else(|| {
                PreprocessingError::UndefinedStatistic {
                    column: rule.column.to_string(),
                    rule: rule.worst_case.as_str().to_string(),
                }
            })?;
            let substitute = match rule.worst_case {
                WorstCase::Min => stats.min,
                WorstCase::Max => stats.max,
            };

            let series = crate::utils::series(numeric, rule.column)?;
            let (resolved, count) = replace_numeric_value(series, sentinel, substitute)?;
            numeric.replace(rule.column, resolved)?;

            if count > 0 {
                processing_steps.push(format!(
                    "Filled {} missing values in '{}' with the {} ({})",
                    count,
                    rule.column,
                    rule.worst_case.as_str(),
                    substitute
                ));
                imputations.push(Imputation {
                    column: rule.column.to_string(),
                    count,
                    substitute: substitute.to_string(),
                    rule: rule.worst_case.as_str().to_string(),
                });
            }
        }

        Ok(imputations)
    }

    /// Fail if any numeric value still equals `sentinel`.
    pub fn verify_resolved(numeric: &DataFrame, sentinel: f64) -> Result<()> {
        for column in numeric.get_columns() {
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            let remaining = series.f64()?.into_iter().flatten().filter(|v| *v == sentinel).count();
            if remaining > 0 {
                return Err(PreprocessingError::Internal(format!(
                    "{} sentinel values left unresolved in column '{}'",
                    remaining,
                    column.name()
                )));
            }
        }
        Ok(())
    }

    /// Run both passes over the numeric group.
    pub fn impute(
        numeric: &mut DataFrame,
        classification: &ColumnClassification,
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<Imputation>> {
        info!("Imputing numeric columns with worst-case values...");
        Self::check_identifier(numeric)?;

        let sentinel = Self::sentinel(numeric)?;
        debug!("Sentinel value: {}", sentinel);

        Self::fill_sentinel(numeric, sentinel)?;
        let imputations =
            Self::resolve_sentinel(numeric, sentinel, classification, processing_steps)?;
        Self::verify_resolved(numeric, sentinel)?;

        info!(
            "Resolved {} missing numeric values",
            imputations.iter().map(|i| i.count).sum::<usize>()
        );
        Ok(imputations)
    }
}
