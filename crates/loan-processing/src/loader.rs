//! Delimited-text loading for the loan table and the exchange-rate table.
//!
//! Schema inference is disabled: every column arrives as `String` so the
//! classifier, not the CSV reader, decides what is numeric.

use crate::error::{PreprocessingError, Result, ResultExt};
use polars::io::mmap::MmapBytesReader;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

fn read_options(separator: u8) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"')),
        )
}

/// Load a delimited file with every column read as text.
pub fn load_text_table(path: &Path, separator: u8) -> Result<DataFrame> {
    if !path.exists() {
        return Err(PreprocessingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )));
    }

    info!("Loading {}", path.display());
    let df = read_options(separator)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Failed to open {}", path.display()))?
        .finish()
        .context(format!("Failed to parse {}", path.display()))?;

    let df = trim_header(df)?;
    debug!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Load delimited text from any in-memory reader, every column as text.
pub fn read_text_table<R: MmapBytesReader>(reader: R, separator: u8) -> Result<DataFrame> {
    let df = read_options(separator)
        .into_reader_with_file_handle(reader)
        .finish()?;
    trim_header(df)
}

/// Strip padding whitespace from column names.
fn trim_header(mut df: DataFrame) -> Result<DataFrame> {
    let padded: Vec<String> = df
        .get_column_names()
        .into_iter()
        .filter(|n| n.trim() != n.as_str())
        .map(|n| n.to_string())
        .collect();

    for name in padded {
        let trimmed = name.trim().to_string();
        if df.get_column_index(&trimmed).is_some() {
            return Err(PreprocessingError::schema(
                trimmed,
                "column appears more than once in the header",
            ));
        }
        df.rename(&name, trimmed.into())?;
    }
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_every_column_is_text() {
        let csv = "id;loan_amnt;issue_d\n1;5000;Jan-15\n2;;Mar-15\n";
        let df = read_text_table(Cursor::new(csv), b';').unwrap();

        assert_eq!(df.height(), 2);
        for column in df.get_columns() {
            assert_eq!(column.dtype(), &DataType::String);
        }
    }

    #[test]
    fn test_header_padding_is_stripped() {
        let csv = " id ; loan_amnt\n1;5000\n";
        let df = read_text_table(Cursor::new(csv), b';').unwrap();
        assert_eq!(
            crate::utils::column_names(&df),
            vec!["id".to_string(), "loan_amnt".to_string()]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_text_table(Path::new("/definitely/not/here.csv"), b';').unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        std::fs::write(&path, "Date,Open,High,Close\n2015-01,1.2,1.3,1.1\n").unwrap();

        let df = load_text_table(&path, b',').unwrap();
        assert_eq!(df.width(), 4);
        assert_eq!(df.height(), 1);
    }
}
