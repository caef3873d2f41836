use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

// ============================================================================
// Classification Types
// ============================================================================

/// Group a column belongs to, decided once by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnGroup {
    Numeric,
    Categorical,
}

impl ColumnGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

/// Descriptive statistics of a numeric column, computed ignoring missing entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub group: ColumnGroup,
    /// Rows with an empty token.
    pub missing_count: usize,
    /// Non-empty tokens that did not parse as a number (numeric columns only).
    pub unparseable_count: usize,
    /// `None` when the column has no numeric values at all.
    pub stats: Option<ColumnStats>,
    pub sample_values: Vec<String>,
}

/// Output of the column classifier: a partition of the header plus statistics.
///
/// Both name lists keep header order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnClassification {
    pub rows: usize,
    pub column_profiles: Vec<ColumnProfile>,
}

impl ColumnClassification {
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns_in(ColumnGroup::Numeric)
    }

    pub fn categorical_columns(&self) -> Vec<&str> {
        self.columns_in(ColumnGroup::Categorical)
    }

    fn columns_in(&self, group: ColumnGroup) -> Vec<&str> {
        self.column_profiles
            .iter()
            .filter(|p| p.group == group)
            .map(|p| p.name.as_str())
            .collect()
    }

    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.column_profiles.iter().find(|p| p.name == column)
    }

    /// Statistics for `column`, or `None` if unknown or undefined.
    pub fn stats(&self, column: &str) -> Option<ColumnStats> {
        self.profile(column).and_then(|p| p.stats)
    }
}

// ============================================================================
// Pipeline Result
// ============================================================================

#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Fully numeric, assembled output table sorted by identifier.
    pub table: DataFrame,
    /// Path of the written output file, when saving to disk.
    pub output_file: Option<PathBuf>,
    /// Human-readable log of every transformation, in execution order.
    pub processing_steps: Vec<String>,
    pub summary: PreprocessingSummary,
}

// ============================================================================
// Preprocessing Summary Types
// ============================================================================

/// Human-readable summary of what the pipeline did.
///
/// Serialized as part of the run report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessingSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Per-stage execution time in milliseconds, keyed by stage name.
    pub stage_durations_ms: BTreeMap<String, u64>,

    pub rows_before: usize,
    pub rows_after: usize,

    pub header_before: Vec<String>,
    pub header_after: Vec<String>,

    /// Columns removed permanently (redundant reference, subsumed grade).
    pub dropped_columns: Vec<String>,

    /// The 12 monthly exchange rates used, January first.
    pub exchange_rates: Vec<f64>,
    /// Rate applied to records with an unknown issue month.
    pub mean_exchange_rate: f64,

    /// Lexical-rank encoding built for the subgrade column.
    pub subgrade_encoding: BTreeMap<String, i64>,

    /// Column groups that were loaded from a checkpoint instead of recomputed.
    pub resumed_groups: Vec<String>,

    /// List of actions taken during preprocessing.
    pub actions: Vec<PreprocessingAction>,

    /// Per-column summaries of changes.
    pub column_summaries: Vec<ColumnSummary>,

    /// Data-quality findings and policy notes.
    pub warnings: Vec<String>,
}

impl PreprocessingSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: PreprocessingAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Add a column summary.
    pub fn add_column_summary(&mut self, summary: ColumnSummary) {
        self.column_summaries.push(summary);
    }

    pub fn column_summary_mut(&mut self, name: &str) -> Option<&mut ColumnSummary> {
        self.column_summaries.iter_mut().find(|c| c.name == name)
    }

    /// Add `millis` to the time spent in `stage`.
    pub fn record_stage(&mut self, stage: impl Into<String>, millis: u64) {
        *self.stage_durations_ms.entry(stage.into()).or_insert(0) += millis;
    }

    /// Total number of values substituted across all columns.
    pub fn total_imputed(&self) -> usize {
        self.column_summaries.iter().map(|c| c.imputed).sum()
    }
}

/// A single action taken during preprocessing.
///
/// Actions form an audit trail of every transformation applied to the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Target of the action (column name or "dataset").
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
    /// Additional details (e.g., substitute value, rule used).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl PreprocessingAction {
    /// Create a new preprocessing action.
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
            details: None,
        }
    }

    /// Add details to the action.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Types of actions that can be taken during preprocessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A column was assigned to the numeric or categorical group.
    ColumnClassified,
    /// Missing values were replaced with a worst-case substitute.
    ValueImputed,
    /// Categories were encoded to integers.
    CategoriesEncoded,
    /// A column was removed from the dataset.
    ColumnRemoved,
    /// A column was renamed.
    ColumnRenamed,
    /// A new column was derived from existing ones.
    ColumnDerived,
    /// Values were rescaled to another unit.
    DataNormalized,
    /// A column group was persisted.
    CheckpointWritten,
    /// A column group was loaded from a previous run.
    CheckpointLoaded,
}

impl ActionType {
    /// Get a human-readable display name for the action type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColumnClassified => "Column Classified",
            Self::ValueImputed => "Value Imputed",
            Self::CategoriesEncoded => "Categories Encoded",
            Self::ColumnRemoved => "Column Removed",
            Self::ColumnRenamed => "Column Renamed",
            Self::ColumnDerived => "Column Derived",
            Self::DataNormalized => "Data Normalized",
            Self::CheckpointWritten => "Checkpoint Written",
            Self::CheckpointLoaded => "Checkpoint Loaded",
        }
    }
}

/// Summary of changes made to a single raw column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Name of the raw column.
    pub name: String,
    pub group: ColumnGroup,
    /// Name in the output table, if the column survives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    /// Number of missing values before preprocessing.
    pub missing_before: usize,
    /// Number of values substituted by the worst-case policy.
    pub imputed: usize,
    /// Substitute used for missing values, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputation_method: Option<String>,
    /// Encoding rule applied (categorical columns only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Whether the column was removed.
    pub was_removed: bool,
    /// Reason for removal, if removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_reason: Option<String>,
}

impl ColumnSummary {
    /// Create a new column summary with default values.
    pub fn new(name: impl Into<String>, group: ColumnGroup, missing_before: usize) -> Self {
        let name = name.into();
        Self {
            output_name: Some(name.clone()),
            name,
            group,
            missing_before,
            imputed: 0,
            imputation_method: None,
            encoding: None,
            was_removed: false,
            removal_reason: None,
        }
    }

    /// Mark the column as removed with a reason.
    pub fn mark_removed(&mut self, reason: impl Into<String>) {
        self.was_removed = true;
        self.output_name = None;
        self.removal_reason = Some(reason.into());
    }
}

// ============================================================================
// Tests
// ============================================================================
