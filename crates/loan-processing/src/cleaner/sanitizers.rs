//! Token sanitization applied to the raw table before classification.

use crate::error::Result;
use polars::prelude::*;
use tracing::debug;

/// Strip padding whitespace from every string column and turn empty tokens into nulls.
///
/// Returns the cleaned frame and the number of tokens that became null.
pub(crate) fn normalize_tokens(df: DataFrame) -> Result<(DataFrame, usize)> {
    let mut df = df;
    let column_names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    debug!("Stripping whitespace and nulling empty tokens...");

    let mut total_emptied = 0;
    for col_name in &column_names {
        let series = df.column(col_name)?.as_materialized_series();
        if series.dtype() != &DataType::String {
            continue;
        }
        let (cleaned, emptied) = strip_series(series)?;
        total_emptied += emptied;
        df.replace(col_name, cleaned)?;
    }

    debug!("{} empty tokens marked as missing", total_emptied);
    Ok((df, total_emptied))
}

/// Trim a string Series; blank tokens become null.
pub(crate) fn strip_series(series: &Series) -> Result<(Series, usize)> {
    let str_series = series.str()?;
    let mut cleaned_values = Vec::with_capacity(str_series.len());
    let mut emptied = 0;

    for opt_val in str_series.into_iter() {
        match opt_val.map(str::trim) {
            Some("") => {
                emptied += 1;
                cleaned_values.push(None);
            }
            Some(val) => cleaned_values.push(Some(val.to_string())),
            None => cleaned_values.push(None),
        }
    }

    Ok((
        Series::new(series.name().clone(), cleaned_values),
        emptied,
    ))
}
