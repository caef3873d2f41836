//! The known loan column set and the static rules bound to it.
//!
//! Every transformation in the pipeline is keyed by column name through the
//! tables here. Adding a numeric column means adding a row to
//! [`NUMERIC_RULES`], not a new branch.

use crate::error::{PreprocessingError, Result};
use crate::types::{ColumnClassification, ColumnGroup};

pub const ID: &str = "id";
pub const ISSUE_DATE: &str = "issue_d";
pub const LOAN_AMOUNT: &str = "loan_amnt";
pub const LOAN_STATUS: &str = "loan_status";
pub const FUNDED_AMOUNT: &str = "funded_amnt";
pub const TERM: &str = "term";
pub const INTEREST_RATE: &str = "int_rate";
pub const INSTALLMENT: &str = "installment";
pub const GRADE: &str = "grade";
pub const SUB_GRADE: &str = "sub_grade";
pub const VERIFICATION_STATUS: &str = "verification_status";
pub const URL: &str = "url";
pub const ADDR_STATE: &str = "addr_state";
pub const TOTAL_PAYMENT: &str = "total_pymnt";

pub const ISSUE_DATE_OUT: &str = "issue_date";
pub const TERM_OUT: &str = "term_months";
pub const STATE_OUT: &str = "state_address";
pub const EXCHANGE_RATE_OUT: &str = "exchange_rate";
pub const REFERENCE_OUT: &str = "loan_reference";

/// Which observed extreme is least favourable for a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorstCase {
    Min,
    Max,
}

impl WorstCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorstCase::Min => "column minimum",
            WorstCase::Max => "column maximum",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NumericRule {
    pub column: &'static str,
    pub worst_case: WorstCase,
    /// Converted into the target currency.
    pub monetary: bool,
    /// Stored in percent and rescaled to a fraction.
    pub percentage: bool,
}

const fn rule(column: &'static str, worst_case: WorstCase, monetary: bool) -> NumericRule {
    NumericRule {
        column,
        worst_case,
        monetary,
        percentage: false,
    }
}

/// Worst-case policies of the imputable numeric columns, in header order.
pub const NUMERIC_RULES: &[NumericRule] = &[
    rule(LOAN_AMOUNT, WorstCase::Max, true),
    rule(FUNDED_AMOUNT, WorstCase::Min, true),
    NumericRule {
        column: INTEREST_RATE,
        worst_case: WorstCase::Max,
        monetary: false,
        percentage: true,
    },
    rule(INSTALLMENT, WorstCase::Max, true),
    rule(TOTAL_PAYMENT, WorstCase::Max, true),
];

/// Categorical columns in header order.
pub const CATEGORICAL_COLUMNS: &[&str] = &[
    ISSUE_DATE,
    LOAN_STATUS,
    TERM,
    GRADE,
    SUB_GRADE,
    VERIFICATION_STATUS,
    URL,
    ADDR_STATE,
];

pub fn numeric_rule(column: &str) -> Option<&'static NumericRule> {
    NUMERIC_RULES.iter().find(|r| r.column == column)
}

pub fn monetary_columns() -> impl Iterator<Item = &'static str> {
    NUMERIC_RULES.iter().filter(|r| r.monetary).map(|r| r.column)
}

/// Group a known column must be classified into, `None` for unknown columns.
pub fn expected_group(column: &str) -> Option<ColumnGroup> {
    if column == ID || numeric_rule(column).is_some() {
        Some(ColumnGroup::Numeric)
    } else if CATEGORICAL_COLUMNS.contains(&column) {
        Some(ColumnGroup::Categorical)
    } else {
        None
    }
}

/// Check that the classified header matches the known column set exactly.
pub fn validate_classification(classification: &ColumnClassification) -> Result<()> {
    for profile in &classification.column_profiles {
        match expected_group(&profile.name) {
            None => {
                return Err(PreprocessingError::schema(
                    &profile.name,
                    "no transformation rule for this column",
                ));
            }
            Some(group) if group != profile.group => {
                return Err(PreprocessingError::schema(
                    &profile.name,
                    format!(
                        "expected a {} column, classified as {} (samples: {:?})",
                        group.as_str(),
                        profile.group.as_str(),
                        profile.sample_values
                    ),
                ));
            }
            Some(_) => {}
        }
    }

    let required = std::iter::once(ID)
        .chain(NUMERIC_RULES.iter().map(|r| r.column))
        .chain(CATEGORICAL_COLUMNS.iter().copied());
    for column in required {
        if classification.profile(column).is_none() {
            return Err(PreprocessingError::schema(
                column,
                "column is missing from the loan table",
            ));
        }
    }

    Ok(())
}

pub fn currency_label(column: &str, currency: &str) -> String {
    format!("{}_{}", column, currency)
}

/// Column order of the numeric group after currency conversion.
pub fn numeric_layout(source_currency: &str, target_currency: &str) -> Vec<String> {
    let mut layout = vec![ID.to_string()];
    for column in monetary_columns() {
        layout.push(currency_label(column, source_currency));
        layout.push(currency_label(column, target_currency));
    }
    layout.push(INTEREST_RATE.to_string());
    layout.push(EXCHANGE_RATE_OUT.to_string());
    layout
}

/// Column order of the encoded categorical group.
pub fn categorical_layout(keep_reference: bool) -> Vec<String> {
    let mut layout: Vec<String> = [
        ISSUE_DATE_OUT,
        LOAN_STATUS,
        TERM_OUT,
        SUB_GRADE,
        VERIFICATION_STATUS,
        STATE_OUT,
    ]
    .iter()
    .map(|c| c.to_string())
    .collect();
    if keep_reference {
        layout.push(REFERENCE_OUT.to_string());
    }
    layout
}

/// Full output column order.
pub fn output_layout(
    source_currency: &str,
    target_currency: &str,
    keep_reference: bool,
) -> Vec<String> {
    let mut layout = numeric_layout(source_currency, target_currency);
    layout.extend(categorical_layout(keep_reference));
    layout
}
