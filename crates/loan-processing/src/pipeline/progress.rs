//! Progress reporting for the preprocessing pipeline.
//!
//! Progress is informational: the pipeline runs to completion or failure
//! and never polls the reporter for instructions.
//!
//! # Example
//!
//! ```rust,ignore
//! use loan_processing::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process_files("loan-data.csv", "EUR-USD.csv");
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the preprocessing pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStage {
    /// Reading the loan and exchange-rate tables
    Loading,
    /// Partitioning columns into numeric and categorical groups
    Classification,
    /// Imputing and encoding the categorical group
    CategoricalEncoding,
    /// Imputing the numeric group
    NumericImputation,
    /// Deriving exchange rates and converted monetary columns
    CurrencyConversion,
    /// Persisting or reloading the column groups
    Checkpointing,
    /// Merging, ordering and sorting the output table
    Assembly,
    /// Writing the output table
    Writing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PreprocessingStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Loading => "Loading Data",
            Self::Classification => "Classifying Columns",
            Self::CategoricalEncoding => "Encoding Categories",
            Self::NumericImputation => "Imputing Numbers",
            Self::CurrencyConversion => "Converting Currency",
            Self::Checkpointing => "Checkpointing",
            Self::Assembly => "Assembling Table",
            Self::Writing => "Writing Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Loading => 0.10,
            Self::Classification => 0.10,
            Self::CategoricalEncoding => 0.20,
            Self::NumericImputation => 0.15,
            Self::CurrencyConversion => 0.15,
            Self::Checkpointing => 0.10,
            Self::Assembly => 0.10,
            Self::Writing => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Loading => 0.0,
            Self::Classification => 0.10,
            Self::CategoricalEncoding => 0.20,
            Self::NumericImputation => 0.40,
            Self::CurrencyConversion => 0.55,
            Self::Checkpointing => 0.70,
            Self::Assembly => 0.80,
            Self::Writing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }

    /// Key used for this stage in timing maps.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Classification => "classification",
            Self::CategoricalEncoding => "categorical_encoding",
            Self::NumericImputation => "numeric_imputation",
            Self::CurrencyConversion => "currency_conversion",
            Self::Checkpointing => "checkpointing",
            Self::Assembly => "assembly",
            Self::Writing => "writing",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

/// Progress update with optional sub-stage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PreprocessingStage,

    /// Optional sub-stage description (e.g., "checkpoint-numeric")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PreprocessingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a new progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: PreprocessingStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PreprocessingStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(PreprocessingStage::Failed, 0.0, message)
    }
}

/// Trait for receiving progress updates during preprocessing.
///
/// Implementations must be `Send + Sync` so a pipeline can run on a worker
/// thread while reporting to the caller's thread.
pub trait ProgressReporter: Send + Sync {
    /// Called once or twice per stage. Implementations should not block.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
