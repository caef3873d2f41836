//! Monthly exchange-rate table.

use crate::config::RateColumn;
use crate::error::{PreprocessingError, Result};
use crate::loader;
use crate::utils::parse_numeric_string;
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Rate of each calendar month, January first.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRateTable {
    rates: [f64; 12],
    mean: f64,
}

impl ExchangeRateTable {
    /// Build the table from exactly twelve positive rates.
    pub fn from_rates(rates: Vec<f64>) -> Result<Self> {
        let count = rates.len();
        let rates: [f64; 12] = rates.try_into().map_err(|_| {
            PreprocessingError::schema(
                "<exchange rates>",
                format!("expected 12 monthly rates, found {}", count),
            )
        })?;
        if let Some(bad) = rates.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(PreprocessingError::schema(
                "<exchange rates>",
                format!("rate {} is not a positive number", bad),
            ));
        }

        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        Ok(Self { rates, mean })
    }

    /// Read the rate column out of a text table.
    pub fn from_frame(df: &DataFrame, column: &RateColumn) -> Result<Self> {
        let series = match column {
            RateColumn::Index(index) => df
                .get_columns()
                .get(*index)
                .map(|c| c.as_materialized_series())
                .ok_or_else(|| {
                    PreprocessingError::schema(
                        format!("<exchange rates column {}>", column),
                        format!("table has only {} columns", df.width()),
                    )
                })?,
            RateColumn::Name(name) => crate::utils::series(df, name)?,
        };
        let name = series.name().to_string();
        let text = series.cast(&DataType::String)?;

        let rates = text
            .str()?
            .into_iter()
            .map(|v| {
                v.and_then(parse_numeric_string).ok_or_else(|| {
                    PreprocessingError::schema(
                        name.as_str(),
                        format!("non-numeric exchange rate {:?}", v.unwrap_or("")),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        Self::from_rates(rates).map_err(|e| match e {
            PreprocessingError::SchemaMismatch { reason, .. } => {
                PreprocessingError::schema(name.as_str(), reason)
            }
            other => other,
        })
    }

    /// Load the table from a delimited file.
    pub fn load(path: &Path, separator: u8, column: &RateColumn) -> Result<Self> {
        let df = loader::load_text_table(path, separator)?;
        let table = Self::from_frame(&df, column)?;
        info!(
            "Loaded 12 monthly exchange rates (mean {:.4}) from column {}",
            table.mean, column
        );
        Ok(table)
    }

    /// Rate for an encoded issue month: 1-12 pick the month, 0 the mean.
    pub fn rate_for_month(&self, month: i64) -> Result<f64> {
        match month {
            0 => Ok(self.mean),
            1..=12 => Ok(self.rates[(month - 1) as usize]),
            other => Err(PreprocessingError::Internal(format!(
                "issue month code {} outside 0-12",
                other
            ))),
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn rates(&self) -> &[f64; 12] {
        &self.rates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const RATES_CSV: &str = "Date,Open,High,Close,Volume\n\
        2015-01,1.2,1.21,1.13,0\n2015-02,1.13,1.15,1.12,0\n2015-03,1.12,1.12,1.08,0\n\
        2015-04,1.08,1.1,1.07,0\n2015-05,1.07,1.14,1.11,0\n2015-06,1.11,1.13,1.12,0\n\
        2015-07,1.12,1.12,1.1,0\n2015-08,1.1,1.17,1.11,0\n2015-09,1.11,1.15,1.12,0\n\
        2015-10,1.12,1.15,1.1,0\n2015-11,1.1,1.1,1.06,0\n2015-12,1.06,1.1,1.09,0\n";

    #[test]
    fn test_from_frame_by_index_and_name() {
        let df = loader::read_text_table(Cursor::new(RATES_CSV), b',').unwrap();

        let by_index = ExchangeRateTable::from_frame(&df, &RateColumn::Index(3)).unwrap();
        let by_name =
            ExchangeRateTable::from_frame(&df, &RateColumn::Name("Close".to_string())).unwrap();
        assert_eq!(by_index, by_name);
        assert_eq!(by_index.rate_for_month(3).unwrap(), 1.08);
        assert_eq!(by_index.rate_for_month(12).unwrap(), 1.09);
    }

    #[test]
    fn test_unknown_month_uses_mean() {
        let table = ExchangeRateTable::from_rates(vec![1.0; 11].into_iter().chain([2.2]).collect())
            .unwrap();
        assert!((table.rate_for_month(0).unwrap() - 1.1).abs() < 1e-12);
        assert!(table.rate_for_month(13).is_err());
    }

    #[test]
    fn test_wrong_row_count() {
        let err = ExchangeRateTable::from_rates(vec![1.1; 11]).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
    }

    #[test]
    fn test_non_positive_or_text_rate() {
        let mut rates = vec![1.1; 12];
        rates[4] = 0.0;
        assert!(ExchangeRateTable::from_rates(rates).is_err());

        let csv = RATES_CSV.replace("1.08,0", "n/a,0");
        let df = loader::read_text_table(Cursor::new(csv), b',').unwrap();
        let err = ExchangeRateTable::from_frame(&df, &RateColumn::Index(3)).unwrap_err();
        assert_eq!(err.column(), Some("Close"));
    }

    #[test]
    fn test_missing_rate_column() {
        let df = loader::read_text_table(Cursor::new(RATES_CSV), b',').unwrap();
        assert!(ExchangeRateTable::from_frame(&df, &RateColumn::Index(9)).is_err());
        assert!(ExchangeRateTable::from_frame(&df, &RateColumn::Name("Rate".to_string())).is_err());
    }
}
