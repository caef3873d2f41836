//! Currency normalization of the numeric group.
//!
//! Each record gets an exchange rate from its issue month. Every monetary
//! column is kept under a source-currency label and followed by its
//! converted counterpart under a target-currency label.

mod rates;

pub use rates::ExchangeRateTable;

use crate::error::{PreprocessingError, Result};
use crate::schema::{self, NUMERIC_RULES};
use crate::utils::float_values;
use polars::prelude::*;
use tracing::{debug, info};

/// Converts monetary columns into a second currency.
pub struct CurrencyNormalizer {
    source_currency: String,
    target_currency: String,
}

impl CurrencyNormalizer {
    pub fn new(source_currency: impl Into<String>, target_currency: impl Into<String>) -> Self {
        Self {
            source_currency: source_currency.into(),
            target_currency: target_currency.into(),
        }
    }

    /// Per-record exchange rate from the encoded issue months.
    pub fn record_rates(issue_months: &[i64], table: &ExchangeRateTable) -> Result<Vec<f64>> {
        issue_months
            .iter()
            .map(|month| table.rate_for_month(*month))
            .collect()
    }

    /// Source value expressed in the target currency.
    pub fn convert(values: &[f64], rates: &[f64]) -> Vec<f64> {
        values.iter().zip(rates).map(|(v, r)| v / r).collect()
    }

    /// Build the converted numeric group in output order.
    ///
    /// `numeric` must be fully imputed. Percentage columns are rescaled to
    /// fractions here and nowhere else.
    pub fn normalize(
        &self,
        numeric: &DataFrame,
        issue_months: &[i64],
        table: &ExchangeRateTable,
        processing_steps: &mut Vec<String>,
    ) -> Result<DataFrame> {
        info!(
            "Converting monetary columns from {} to {}...",
            self.source_currency, self.target_currency
        );

        if issue_months.len() != numeric.height() {
            return Err(PreprocessingError::ShapeMismatch {
                numeric_rows: numeric.height(),
                categorical_rows: issue_months.len(),
            });
        }

        let rates = Self::record_rates(issue_months, table)?;
        let unknown = issue_months.iter().filter(|m| **m == 0).count();
        debug!(
            "{} records without issue month use the mean rate {}",
            unknown,
            table.mean()
        );

        let mut columns = vec![numeric.column(schema::ID)?.clone()];
        let mut rates_columns = Vec::new();

        for rule in NUMERIC_RULES {
            let values = complete_values(numeric, rule.column)?;
            if rule.monetary {
                let converted = Self::convert(&values, &rates);
                let source_label = schema::currency_label(rule.column, &self.source_currency);
                let target_label = schema::currency_label(rule.column, &self.target_currency);
                processing_steps.push(format!(
                    "Converted '{}' into '{}' and relabeled the source '{}'",
                    rule.column, target_label, source_label
                ));
                columns.push(Column::new(source_label.into(), values));
                columns.push(Column::new(target_label.into(), converted));
            } else if rule.percentage {
                let fractions: Vec<f64> = values.iter().map(|v| v / 100.0).collect();
                processing_steps.push(format!(
                    "Rescaled '{}' from percent to fraction",
                    rule.column
                ));
                rates_columns.push(Column::new(rule.column.into(), fractions));
            } else {
                rates_columns.push(Column::new(rule.column.into(), values));
            }
        }

        columns.extend(rates_columns);
        columns.push(Column::new(schema::EXCHANGE_RATE_OUT.into(), rates));
        processing_steps.push(format!(
            "Added '{}' with the rate used per record",
            schema::EXCHANGE_RATE_OUT
        ));

        Ok(DataFrame::new(columns)?)
    }
}

/// Values of a column that must not contain missing entries anymore.
fn complete_values(numeric: &DataFrame, column: &str) -> Result<Vec<f64>> {
    float_values(numeric, column)?
        .into_iter()
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            PreprocessingError::Internal(format!(
                "'{}' still has missing values before conversion",
                column
            ))
        })
}
