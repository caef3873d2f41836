//! Raw token cleaning for the loaded loan table.
//!
//! The loan export pads fields with whitespace and encodes missing values as
//! empty fields. Cleaning normalizes both so every later stage can treat
//! null as the single representation of "missing".

mod sanitizers;

use crate::error::Result;
use polars::prelude::*;
use tracing::{debug, info};

/// Data cleaner for the raw loan table.
pub struct DataCleaner;

impl DataCleaner {
    /// Normalize every raw token of the table.
    ///
    /// Row count and column order are preserved. Returns the cleaned table
    /// and a list of human-readable cleaning actions.
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, Vec<String>)> {
        info!("Normalizing raw tokens...");
        let rows = df.height();

        let (df, emptied) = sanitizers::normalize_tokens(df)?;
        debug!("Normalized {} rows", rows);

        let actions = if emptied > 0 {
            vec![format!(
                "Marked {} blank tokens as missing across {} rows",
                emptied, rows
            )]
        } else {
            vec!["No blank tokens found".to_string()]
        };

        Ok((df, actions))
    }
}
