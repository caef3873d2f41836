//! Custom error types for the loan preprocessing pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Every
//! transformation failure names the offending column and the rule that
//! rejected it, so a failed run can be diagnosed without re-running it.
//!
//! Errors are serializable, allowing them to be embedded in the JSON run
//! report or printed by the CLI in `--json` mode.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the preprocessing pipeline.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// A column required by a fixed rule is absent, misclassified, or has no rule.
    #[error("Schema mismatch on column '{column}': {reason}")]
    SchemaMismatch { column: String, reason: String },

    /// Numeric and categorical groups disagree on row count before assembly.
    #[error(
        "Shape mismatch: numeric group has {numeric_rows} rows, categorical group has {categorical_rows}"
    )]
    ShapeMismatch {
        numeric_rows: usize,
        categorical_rows: usize,
    },

    /// A statistic required by a rule could not be computed.
    #[error("Undefined statistic for column '{column}' (rule: {rule}): no non-missing values")]
    UndefinedStatistic { column: String, rule: String },

    /// A categorical value has no entry in the encoding rule for its column.
    #[error("Unmapped category in column '{column}' (rule: {rule}): {samples:?}")]
    UnmappedCategory {
        column: String,
        rule: String,
        samples: Vec<String>,
    },

    /// The primary record identifier is missing on some rows.
    #[error("Identifier column '{column}' is missing on {rows} rows")]
    MissingIdentifier { column: String, rows: usize },

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A checkpoint could not be written or read back.
    #[error("Checkpoint '{name}' failed: {reason}")]
    Checkpoint { name: String, reason: String },

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PreprocessingError>,
    },
}

impl PreprocessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PreprocessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for a schema mismatch on `column`.
    pub fn schema(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Get a stable error code for machine consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SchemaMismatch { .. } => "SCHEMA_MISMATCH",
            Self::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            Self::UndefinedStatistic { .. } => "UNDEFINED_STATISTIC",
            Self::UnmappedCategory { .. } => "UNMAPPED_CATEGORY",
            Self::MissingIdentifier { .. } => "MISSING_IDENTIFIER",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::Checkpoint { .. } => "CHECKPOINT_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// The column this error is about, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::SchemaMismatch { column, .. }
            | Self::UndefinedStatistic { column, .. }
            | Self::UnmappedCategory { column, .. }
            | Self::MissingIdentifier { column, .. } => Some(column.as_str()),
            Self::ColumnNotFound(column) => Some(column.as_str()),
            Self::WithContext { source, .. } => source.column(),
            _ => None,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for preprocessing operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PreprocessingError::Polars(e).with_context(context))
    }
}
