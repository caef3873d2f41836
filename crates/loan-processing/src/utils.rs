//! Shared utilities for the loan preprocessing pipeline.
//!
//! This module contains common helper functions used across multiple modules
//! to reduce code duplication and ensure consistency.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

// =============================================================================
// Column Access Utilities
// =============================================================================

/// Borrow a column as a materialized `Series`, naming it in the error if absent.
pub fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))
}

/// Collect a string column into owned optional values.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = series(df, name)?;
    let values = series.str()?;
    Ok(values
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Collect a float column into optional values.
pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = series(df, name)?;
    let values = series.f64()?;
    Ok(values.into_iter().collect())
}

/// Collect an integer column into optional values.
pub fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = series(df, name)?;
    let values = series.i64()?;
    Ok(values.into_iter().collect())
}

/// Column names of a frame as owned strings, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Try to parse a raw token as a finite numeric value (f64).
///
/// Only surrounding whitespace is tolerated; `NaN` and infinities are
/// rejected so they can never reach the statistics.
///
/// # Example
///
/// ```rust,ignore
/// use loan_processing::utils::parse_numeric_string;
///
/// assert_eq!(parse_numeric_string(" 1234.5 "), Some(1234.5));
/// assert_eq!(parse_numeric_string("36 months"), None);
/// ```
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a label for case- and whitespace-insensitive comparison.
///
/// `"Late (31-120 days)"` and `"late(31-120 days)"` normalize identically.
pub fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let values = series.f64()?;
    let filled: Vec<f64> = values
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let values = series.str()?;
    let filled: Vec<&str> = values
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Replace every occurrence of `from` in a numeric Series with `to`.
///
/// Returns the new Series and the number of replaced entries.
pub fn replace_numeric_value(series: &Series, from: f64, to: f64) -> PolarsResult<(Series, usize)> {
    let values = series.f64()?;
    let mut replaced = 0;
    let out: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| match v {
            Some(x) if x == from => {
                replaced += 1;
                Some(to)
            }
            other => other,
        })
        .collect();
    Ok((Series::new(series.name().clone(), out), replaced))
}

/// Collect sample values from a Series (non-null values only).
pub fn collect_sample_values(series: &Series, max_samples: usize) -> Vec<String> {
    let non_null = series.drop_nulls();
    if non_null.is_empty() {
        return Vec::new();
    }

    let sample_size = std::cmp::min(max_samples, non_null.len());
    let mut samples = Vec::with_capacity(sample_size);

    for i in 0..sample_size {
        if let Ok(val) = non_null.get(i) {
            match val {
                AnyValue::String(s) => samples.push(s.to_string()),
                other => samples.push(format!("{}", other)),
            }
        }
    }

    samples
}

/// Keep the first `max_samples` distinct values, preserving first-seen order.
pub fn distinct_samples<I, S>(values: I, max_samples: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut samples: Vec<String> = Vec::new();
    for value in values {
        if samples.len() >= max_samples {
            break;
        }
        let value = value.as_ref();
        if !samples.iter().any(|s| s == value) {
            samples.push(value.to_string());
        }
    }
    samples
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string("  13.56 "), Some(13.56));
        assert_eq!(parse_numeric_string("-100"), Some(-100.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("Jan-15"), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("inf"), None);
        assert_eq!(parse_numeric_string("36 months"), None);
    }

    #[test]
    fn test_normalize_label() {
        assert_eq!(
            normalize_label("Late (31-120 days)"),
            normalize_label("late(31-120 days)")
        );
        assert_eq!(normalize_label(" Charged  Off "), "chargedoff");
    }

    #[test]
    fn test_fill_numeric_nulls() {
        let series = Series::new("test".into(), &[Some(1.0), None, Some(3.0)]);
        let filled = fill_numeric_nulls(&series, 0.0).unwrap();

        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 0.0);
        assert_eq!(filled.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("test".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "b").unwrap();
        let values: Vec<Option<&str>> = filled.str().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some("a"), Some("b")]);
    }

    #[test]
    fn test_replace_numeric_value() {
        let series = Series::new("test".into(), &[9.0, 1.0, 9.0]);
        let (replaced, count) = replace_numeric_value(&series, 9.0, 2.0).unwrap();

        assert_eq!(count, 2);
        let values: Vec<Option<f64>> = replaced.f64().unwrap().into_iter().collect();
        assert_eq!(values, vec![Some(2.0), Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_collect_sample_values() {
        let series = Series::new("test".into(), &[Some("a"), None, Some("b"), Some("c")]);
        let samples = collect_sample_values(&series, 5);
        assert_eq!(samples, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_distinct_samples() {
        let samples = distinct_samples(["ZZ", "XX", "ZZ", "YY"], 2);
        assert_eq!(samples, vec!["ZZ", "XX"]);
    }

    #[test]
    fn test_column_accessors() {
        let df = df!(
            "id" => &[1i64, 2],
            "amount" => &[Some(1.5), None],
            "state" => &[Some("CA"), None],
        )
        .unwrap();

        assert_eq!(int_values(&df, "id").unwrap(), vec![Some(1), Some(2)]);
        assert_eq!(float_values(&df, "amount").unwrap(), vec![Some(1.5), None]);
        assert_eq!(
            string_values(&df, "state").unwrap(),
            vec![Some("CA".to_string()), None]
        );
        assert!(matches!(
            series(&df, "absent"),
            Err(PreprocessingError::ColumnNotFound(_))
        ));
        assert_eq!(column_names(&df), vec!["id", "amount", "state"]);
    }
}
