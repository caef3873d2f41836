//! Configuration types for the loan preprocessing pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Column of the exchange-rate table that holds the monthly rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateColumn {
    /// Zero-based column position.
    Index(usize),
    /// Column header name.
    Name(String),
}

impl Default for RateColumn {
    fn default() -> Self {
        RateColumn::Index(3)
    }
}

impl fmt::Display for RateColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateColumn::Index(i) => write!(f, "#{}", i),
            RateColumn::Name(name) => write!(f, "'{}'", name),
        }
    }
}

/// Parses a bare integer as a position, anything else as a header name.
impl FromStr for RateColumn {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigValidationError::EmptyValue("rate_column".to_string()));
        }
        Ok(match s.parse::<usize>() {
            Ok(index) => RateColumn::Index(index),
            Err(_) => RateColumn::Name(s.to_string()),
        })
    }
}

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use loan_processing::config::{PipelineConfig, RateColumn};
///
/// let config = PipelineConfig::builder()
///     .rate_column(RateColumn::Name("EUR/USD".to_string()))
///     .output_dir("out")
///     .write_checkpoints(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Field delimiter of the loan table.
    /// Default: ';'
    pub loan_delimiter: char,

    /// Field delimiter of the exchange-rate table.
    /// Default: ','
    pub rates_delimiter: char,

    /// Which exchange-rate column holds the monthly rate.
    /// Default: Index(3)
    pub rate_column: RateColumn,

    /// Currency of the raw monetary columns, used as label suffix.
    /// Default: "USD"
    pub source_currency: String,

    /// Currency of the derived monetary columns, used as label suffix.
    /// Default: "EUR"
    pub target_currency: String,

    /// Output directory for the processed table and reports.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Output file name (without extension).
    /// Default: "loan-data-preprocessed"
    pub output_name: String,

    /// Directory holding the per-group checkpoints.
    /// Default: "checkpoints"
    pub checkpoint_dir: PathBuf,

    /// Whether to persist each column group before assembly.
    /// Default: true
    pub write_checkpoints: bool,

    /// Whether an existing checkpoint replaces recomputation of its group.
    /// Default: false
    pub resume_from_checkpoints: bool,

    /// Whether an unrecognised state code aborts the run instead of
    /// falling into the unknown region.
    /// Default: false
    pub strict_regions: bool,

    /// Whether to write the processed table to disk.
    /// When false, results are kept in memory only.
    /// Default: true
    pub save_to_disk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            loan_delimiter: ';',
            rates_delimiter: ',',
            rate_column: RateColumn::default(),
            source_currency: "USD".to_string(),
            target_currency: "EUR".to_string(),
            output_dir: PathBuf::from("output"),
            output_name: "loan-data-preprocessed".to_string(),
            checkpoint_dir: PathBuf::from("checkpoints"),
            write_checkpoints: true,
            resume_from_checkpoints: false,
            strict_regions: false,
            save_to_disk: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_delimiter("loan_delimiter", self.loan_delimiter)?;
        validate_delimiter("rates_delimiter", self.rates_delimiter)?;

        if self.source_currency.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue(
                "source_currency".to_string(),
            ));
        }
        if self.target_currency.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue(
                "target_currency".to_string(),
            ));
        }
        if self.source_currency == self.target_currency {
            return Err(ConfigValidationError::SameCurrency(
                self.source_currency.clone(),
            ));
        }
        if self.output_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyValue("output_name".to_string()));
        }
        if let RateColumn::Name(name) = &self.rate_column
            && name.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyValue("rate_column".to_string()));
        }

        Ok(())
    }

    /// Loan delimiter as the single byte the CSV reader expects.
    pub fn loan_separator(&self) -> u8 {
        self.loan_delimiter as u8
    }

    /// Exchange-rate delimiter as the single byte the CSV reader expects.
    pub fn rates_separator(&self) -> u8 {
        self.rates_delimiter as u8
    }
}

fn validate_delimiter(field: &str, delimiter: char) -> Result<(), ConfigValidationError> {
    if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
        return Err(ConfigValidationError::InvalidDelimiter {
            field: field.to_string(),
            value: delimiter,
        });
    }
    Ok(())
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid delimiter for '{field}': {value:?} (must be a single ASCII character other than quote or newline)")]
    InvalidDelimiter { field: String, value: char },

    #[error("'{0}' must not be empty")]
    EmptyValue(String),

    #[error("Source and target currency are both '{0}'")]
    SameCurrency(String),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    loan_delimiter: Option<char>,
    rates_delimiter: Option<char>,
    rate_column: Option<RateColumn>,
    source_currency: Option<String>,
    target_currency: Option<String>,
    output_dir: Option<PathBuf>,
    output_name: Option<String>,
    checkpoint_dir: Option<PathBuf>,
    write_checkpoints: Option<bool>,
    resume_from_checkpoints: Option<bool>,
    strict_regions: Option<bool>,
    save_to_disk: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the loan table delimiter.
    pub fn loan_delimiter(mut self, delimiter: char) -> Self {
        self.loan_delimiter = Some(delimiter);
        self
    }

    /// Set the exchange-rate table delimiter.
    pub fn rates_delimiter(mut self, delimiter: char) -> Self {
        self.rates_delimiter = Some(delimiter);
        self
    }

    /// Select the exchange-rate column by position or header name.
    pub fn rate_column(mut self, column: RateColumn) -> Self {
        self.rate_column = Some(column);
        self
    }

    pub fn source_currency(mut self, code: impl Into<String>) -> Self {
        self.source_currency = Some(code.into());
        self
    }

    pub fn target_currency(mut self, code: impl Into<String>) -> Self {
        self.target_currency = Some(code.into());
        self
    }

    /// Set the output directory for the processed table and reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Set the output file name (without extension).
    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }

    pub fn checkpoint_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(path.into());
        self
    }

    /// Enable or disable persisting the column groups before assembly.
    pub fn write_checkpoints(mut self, write: bool) -> Self {
        self.write_checkpoints = Some(write);
        self
    }

    /// Load existing checkpoints instead of recomputing their groups.
    pub fn resume_from_checkpoints(mut self, resume: bool) -> Self {
        self.resume_from_checkpoints = Some(resume);
        self
    }

    /// Treat unrecognised state codes as fatal.
    pub fn strict_regions(mut self, strict: bool) -> Self {
        self.strict_regions = Some(strict);
        self
    }

    /// Enable or disable saving the processed table to disk.
    ///
    /// When false, the pipeline keeps results in memory only and skips
    /// writing the output file. Checkpoints are governed separately.
    pub fn save_to_disk(mut self, save: bool) -> Self {
        self.save_to_disk = Some(save);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            loan_delimiter: self.loan_delimiter.unwrap_or(defaults.loan_delimiter),
            rates_delimiter: self.rates_delimiter.unwrap_or(defaults.rates_delimiter),
            rate_column: self.rate_column.unwrap_or(defaults.rate_column),
            source_currency: self.source_currency.unwrap_or(defaults.source_currency),
            target_currency: self.target_currency.unwrap_or(defaults.target_currency),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            output_name: self.output_name.unwrap_or(defaults.output_name),
            checkpoint_dir: self.checkpoint_dir.unwrap_or(defaults.checkpoint_dir),
            write_checkpoints: self.write_checkpoints.unwrap_or(defaults.write_checkpoints),
            resume_from_checkpoints: self
                .resume_from_checkpoints
                .unwrap_or(defaults.resume_from_checkpoints),
            strict_regions: self.strict_regions.unwrap_or(defaults.strict_regions),
            save_to_disk: self.save_to_disk.unwrap_or(defaults.save_to_disk),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.loan_delimiter, ';');
        assert_eq!(config.rates_delimiter, ',');
        assert_eq!(config.rate_column, RateColumn::Index(3));
        assert_eq!(config.source_currency, "USD");
        assert_eq!(config.target_currency, "EUR");
        assert_eq!(config.output_name, "loan-data-preprocessed");
        assert!(config.write_checkpoints);
        assert!(!config.resume_from_checkpoints);
        assert!(!config.strict_regions);
    }

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.loan_separator(), b';');
        assert_eq!(config.rates_separator(), b',');
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PipelineConfig::builder()
            .loan_delimiter(',')
            .rate_column(RateColumn::Name("EUR/USD".to_string()))
            .output_name("loans")
            .write_checkpoints(false)
            .strict_regions(true)
            .build()
            .unwrap();

        assert_eq!(config.loan_separator(), b',');
        assert_eq!(config.rate_column, RateColumn::Name("EUR/USD".to_string()));
        assert_eq!(config.output_name, "loans");
        assert!(!config.write_checkpoints);
        assert!(config.strict_regions);
    }

    #[test]
    fn test_validation_invalid_delimiter() {
        let result = PipelineConfig::builder().loan_delimiter('"').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter { .. }
        ));

        let result = PipelineConfig::builder().rates_delimiter('€').build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidDelimiter { .. }
        ));
    }

    #[test]
    fn test_validation_same_currency() {
        let result = PipelineConfig::builder()
            .source_currency("EUR")
            .target_currency("EUR")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::SameCurrency(_)
        ));
    }

    #[test]
    fn test_validation_empty_output_name() {
        let result = PipelineConfig::builder().output_name("  ").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyValue(_)
        ));
    }

    #[test]
    fn test_rate_column_from_str() {
        assert_eq!("3".parse::<RateColumn>().unwrap(), RateColumn::Index(3));
        assert_eq!(
            " EUR/USD ".parse::<RateColumn>().unwrap(),
            RateColumn::Name("EUR/USD".to_string())
        );
        assert!("".parse::<RateColumn>().is_err());
    }

    #[test]
    fn test_pipeline_config_from_json() {
        let json = r#"{
            "loan_delimiter": ";",
            "rates_delimiter": ",",
            "rate_column": { "Name": "rate" },
            "source_currency": "USD",
            "target_currency": "GBP",
            "output_dir": "custom_output",
            "output_name": "my_loans",
            "checkpoint_dir": "ckpt",
            "write_checkpoints": false,
            "resume_from_checkpoints": true,
            "strict_regions": true,
            "save_to_disk": false
        }"#;

        let config: PipelineConfig =
            serde_json::from_str(json).expect("Should deserialize from JSON");

        assert_eq!(config.rate_column, RateColumn::Name("rate".to_string()));
        assert_eq!(config.target_currency, "GBP");
        assert_eq!(config.output_dir.to_str().unwrap(), "custom_output");
        assert_eq!(config.checkpoint_dir.to_str().unwrap(), "ckpt");
        assert!(!config.write_checkpoints);
        assert!(config.resume_from_checkpoints);
        assert!(config.strict_regions);
        assert!(!config.save_to_disk);
        assert!(config.validate().is_ok());
    }
}
