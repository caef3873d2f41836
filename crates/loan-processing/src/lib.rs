//! Loan Data Preprocessing Library
//!
//! Turns a raw loan export into a fully numeric, analysis-ready table,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! The pipeline runs strictly forward over an in-memory table:
//!
//! - **Classification**: every column is assigned once to the numeric or categorical group
//! - **Worst-case imputation**: missing values take the value least favourable to the applicant
//! - **Categorical encoding**: binary outcomes, month codes, lexical-rank subgrades, region buckets
//! - **Currency normalization**: monetary columns converted at the issue-month exchange rate
//! - **Checkpoints**: each transformed group is persisted and can be resumed from
//! - **Assembly**: one ordered table sorted by record identifier
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use loan_processing::{Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::builder()
//!     .output_dir("output")
//!     .checkpoint_dir("checkpoints")
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process_files("loan-data.csv", "EUR-USD.csv")?;
//!
//! println!("Wrote {:?}", result.output_file);
//! println!("Imputed {} values", result.summary.total_imputed());
//! ```
//!
//! # Configuration
//!
//! Use [`PipelineConfig`] to customize input parsing and output locations:
//!
//! ```rust,ignore
//! use loan_processing::config::*;
//!
//! let config = PipelineConfig::builder()
//!     .loan_delimiter(';')
//!     .rate_column(RateColumn::Index(3))
//!     .source_currency("USD")
//!     .target_currency("EUR")
//!     .resume_from_checkpoints(true)
//!     .strict_regions(false)
//!     .build()?;
//! ```
//!
//! # Errors
//!
//! Every failure is a [`PreprocessingError`] naming the offending column and
//! rule where there is one. There is no partial success: on error no output
//! file is written.

pub mod checkpoint;
pub mod cleaner;
pub mod config;
pub mod currency;
pub mod encoders;
pub mod error;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use checkpoint::CheckpointStore;
pub use cleaner::DataCleaner;
pub use config::{ConfigValidationError, PipelineConfig, PipelineConfigBuilder, RateColumn};
pub use currency::{CurrencyNormalizer, ExchangeRateTable};
pub use encoders::{CategoricalEncoder, EncodedCategoricals, LexicalRankEncoding, ReferenceCheck};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use imputers::{CategoricalImputer, Imputation, WorstCaseImputer};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PreprocessingStage, ProgressReporter,
    ProgressUpdate, TableAssembler,
};
pub use profiler::{ColumnClassifier, ColumnGroups};
pub use reporting::{ImputationReport, ReportGenerator, RunReport};
pub use types::{
    ActionType, ColumnClassification, ColumnGroup, ColumnProfile, ColumnStats, ColumnSummary,
    PipelineResult, PreprocessingAction, PreprocessingSummary,
};
pub use utils::{fill_numeric_nulls, fill_string_nulls, parse_numeric_string};
