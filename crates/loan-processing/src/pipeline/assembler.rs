//! Assembly of the two transformed column groups into the output table.

use crate::error::{PreprocessingError, Result};
use crate::schema;
use polars::prelude::*;
use tracing::{debug, info};

/// Merges the numeric and categorical groups into one ordered table.
pub struct TableAssembler;

impl TableAssembler {
    /// Merge both groups row by row, order the columns as `layout`, and
    /// sort the rows by record identifier.
    ///
    /// The sort is stable: records sharing an identifier keep their input order.
    pub fn assemble(
        numeric: &DataFrame,
        categorical: &DataFrame,
        layout: &[String],
    ) -> Result<DataFrame> {
        if numeric.height() != categorical.height() {
            return Err(PreprocessingError::ShapeMismatch {
                numeric_rows: numeric.height(),
                categorical_rows: categorical.height(),
            });
        }

        info!(
            "Assembling {} numeric and {} categorical columns over {} rows",
            numeric.width(),
            categorical.width(),
            numeric.height()
        );

        let merged = numeric.hstack(categorical.get_columns())?;
        let ordered = merged.select(layout.iter().map(|c| c.as_str()))?;
        let sorted = ordered.sort(
            [schema::ID],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        Self::verify_numeric(&sorted)?;
        debug!("Assembled table shape: {:?}", sorted.shape());
        Ok(sorted)
    }

    /// Fail unless every column is numeric and complete.
    pub fn verify_numeric(df: &DataFrame) -> Result<()> {
        for column in df.get_columns() {
            if !matches!(column.dtype(), DataType::Int64 | DataType::Float64) {
                return Err(PreprocessingError::Internal(format!(
                    "output column '{}' has non-numeric type {}",
                    column.name(),
                    column.dtype()
                )));
            }
            if column.null_count() > 0 {
                return Err(PreprocessingError::Internal(format!(
                    "output column '{}' has {} missing values",
                    column.name(),
                    column.null_count()
                )));
            }
        }
        Ok(())
    }
}
