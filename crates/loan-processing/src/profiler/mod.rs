//! Column classification for the raw loan table.
//!
//! This module provides functionality for:
//! - Partitioning columns into numeric and categorical groups
//! - Per-column missing and unparseable counts
//! - Descriptive statistics `(min, mean, max)` for numeric columns
//! - Splitting the raw table into the two typed column groups

mod statistics;

pub(crate) use statistics::overall_max;

use crate::error::Result;
use crate::types::{ColumnClassification, ColumnGroup, ColumnProfile};
use crate::utils::{collect_sample_values, distinct_samples, parse_numeric_string};
use polars::prelude::*;
use tracing::{debug, info, warn};

const SAMPLE_SIZE: usize = 5;

/// The raw table split into its two typed column groups.
#[derive(Debug, Clone)]
pub struct ColumnGroups {
    /// `Float64` columns; missing and unparseable tokens are null.
    pub numeric: DataFrame,
    /// Cleaned `String` columns; missing tokens are null.
    pub categorical: DataFrame,
}

/// Classifier deciding, once per dataset, which group each column belongs to.
pub struct ColumnClassifier;

impl ColumnClassifier {
    /// Classify every column of a raw text table.
    ///
    /// A column is numeric when at least one of its non-missing tokens parses
    /// as a number. A column without any parseable token, including one with
    /// no values at all, is categorical and has no statistics.
    pub fn classify(df: &DataFrame) -> Result<ColumnClassification> {
        info!("Classifying {} columns...", df.width());

        let mut column_profiles = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            column_profiles.push(Self::profile_column(series)?);
        }

        let classification = ColumnClassification {
            rows: df.height(),
            column_profiles,
        };
        info!(
            "Classified {} numeric and {} categorical columns",
            classification.numeric_columns().len(),
            classification.categorical_columns().len()
        );
        Ok(classification)
    }

    fn profile_column(series: &Series) -> Result<ColumnProfile> {
        let name = series.name().to_string();
        let text = series.cast(&DataType::String)?;
        let parsed = parse_series(&text)?;

        let missing_count = text.null_count();
        let parsed_count = parsed.len() - parsed.null_count();
        let unparseable_count = text.len() - missing_count - parsed_count;

        let (group, stats) = if parsed_count > 0 {
            (ColumnGroup::Numeric, statistics::column_stats(&parsed)?)
        } else {
            (ColumnGroup::Categorical, None)
        };

        if group == ColumnGroup::Numeric && unparseable_count > 0 {
            let str_values = text.str()?;
            let bad = distinct_samples(
                str_values
                    .into_iter()
                    .flatten()
                    .filter(|v| parse_numeric_string(v).is_none()),
                SAMPLE_SIZE,
            );
            warn!(
                "Column '{}': {} non-numeric tokens will be treated as missing: {:?}",
                name, unparseable_count, bad
            );
        }

        debug!(
            "Column '{}' -> {} (missing: {}, stats: {:?})",
            name,
            group.as_str(),
            missing_count,
            stats
        );

        Ok(ColumnProfile {
            sample_values: collect_sample_values(&text, SAMPLE_SIZE),
            name,
            group,
            missing_count,
            unparseable_count,
            stats,
        })
    }

    /// Split the raw table into typed numeric and categorical groups.
    ///
    /// Both groups keep the row order and the header order of the raw table.
    pub fn split(df: &DataFrame, classification: &ColumnClassification) -> Result<ColumnGroups> {
        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for profile in &classification.column_profiles {
            let series = crate::utils::series(df, &profile.name)?;
            let text = series.cast(&DataType::String)?;
            match profile.group {
                ColumnGroup::Numeric => numeric.push(Column::from(parse_series(&text)?)),
                ColumnGroup::Categorical => categorical.push(Column::from(text)),
            }
        }

        Ok(ColumnGroups {
            numeric: DataFrame::new(numeric)?,
            categorical: DataFrame::new(categorical)?,
        })
    }
}

/// Parse a text series into `Float64`; unparseable tokens become null.
fn parse_series(text: &Series) -> Result<Series> {
    let values: Vec<Option<f64>> = text
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_numeric_string))
        .collect();
    Ok(Series::new(text.name().clone(), values))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_table() -> DataFrame {
        df!(
            "id" => &[Some("3"), Some("1"), Some("2")],
            "loan_amnt" => &[Some("5000"), None, Some("oops")],
            "issue_d" => &[Some("Jan-15"), None, Some("Mar-15")],
            "empty" => &[None::<&str>, None, None],
        )
        .unwrap()
    }

    #[test]
    fn test_classify_partitions_columns() {
        let classification = ColumnClassifier::classify(&raw_table()).unwrap();

        assert_eq!(classification.rows, 3);
        assert_eq!(classification.numeric_columns(), vec!["id", "loan_amnt"]);
        assert_eq!(classification.categorical_columns(), vec!["issue_d", "empty"]);
    }

    #[test]
    fn test_classify_counts_and_stats() {
        let classification = ColumnClassifier::classify(&raw_table()).unwrap();

        let amount = classification.profile("loan_amnt").unwrap();
        assert_eq!(amount.missing_count, 1);
        assert_eq!(amount.unparseable_count, 1);
        let stats = amount.stats.unwrap();
        assert_eq!((stats.min, stats.mean, stats.max), (5000.0, 5000.0, 5000.0));

        let id = classification.stats("id").unwrap();
        assert_eq!((id.min, id.mean, id.max), (1.0, 2.0, 3.0));
    }

    #[test]
    fn test_all_missing_column_has_no_stats() {
        let classification = ColumnClassifier::classify(&raw_table()).unwrap();
        let empty = classification.profile("empty").unwrap();

        assert_eq!(empty.group, ColumnGroup::Categorical);
        assert!(empty.stats.is_none());
        assert_eq!(empty.missing_count, 3);
    }

    #[test]
    fn test_split_types_groups() {
        let df = raw_table();
        let classification = ColumnClassifier::classify(&df).unwrap();
        let groups = ColumnClassifier::split(&df, &classification).unwrap();

        assert_eq!(groups.numeric.height(), 3);
        assert_eq!(groups.categorical.height(), 3);
        assert_eq!(
            groups.numeric.column("loan_amnt").unwrap().dtype(),
            &DataType::Float64
        );

        let amounts: Vec<Option<f64>> = crate::utils::float_values(&groups.numeric, "loan_amnt").unwrap();
        assert_eq!(amounts, vec![Some(5000.0), None, None]);
        assert_eq!(
            groups.categorical.column("issue_d").unwrap().dtype(),
            &DataType::String
        );
    }
}
