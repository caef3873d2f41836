//! Imputation module for handling missing values.
//!
//! Every missing value resolves to the interpretation least favourable to
//! the applicant, per column:
//! - Worst-case numeric imputation (sentinel fill, then min/max resolution)
//! - Worst-case categorical imputation (fixed per-column policies)

mod categorical;
mod worst_case;

pub use categorical::CategoricalImputer;
pub use worst_case::WorstCaseImputer;

use serde::{Deserialize, Serialize};

/// Record of the substitutions made in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Imputation {
    pub column: String,
    /// Number of entries that were missing and got substituted.
    pub count: usize,
    /// The substitute, rendered as text.
    pub substitute: String,
    /// The policy that chose the substitute.
    pub rule: String,
}
