//! Descriptive statistics for numeric columns.

use crate::error::Result;
use crate::types::ColumnStats;
use polars::prelude::*;

/// Compute `(min, mean, max)` ignoring missing entries.
///
/// Returns `None` when the series has no non-missing values, so callers
/// cannot mistake an undefined mean for a real one.
pub(crate) fn column_stats(series: &Series) -> Result<Option<ColumnStats>> {
    let float_series = series.cast(&DataType::Float64)?;
    let non_null = float_series.drop_nulls();
    if non_null.is_empty() {
        return Ok(None);
    }

    let min = non_null.min::<f64>()?;
    let max = non_null.max::<f64>()?;
    let mean = non_null.mean();

    Ok(match (min, mean, max) {
        (Some(min), Some(mean), Some(max)) => Some(ColumnStats { min, mean, max }),
        _ => None,
    })
}

/// Largest value across several numeric series, ignoring missing entries.
pub(crate) fn overall_max<'a, I>(series: I) -> Result<Option<f64>>
where
    I: IntoIterator<Item = &'a Series>,
{
    let mut overall: Option<f64> = None;
    for s in series {
        if let Some(max) = s.cast(&DataType::Float64)?.max::<f64>()? {
            overall = Some(overall.map_or(max, |current| current.max(max)));
        }
    }
    Ok(overall)
}
