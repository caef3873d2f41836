//! Fixed lookup tables used by the categorical rules.
//!
//! Membership sets are data: adding a region or a bad status label is an
//! edit to one of the arrays below.

use crate::utils::normalize_label;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Month abbreviations in calendar order; the code of a month is its position + 1.
pub const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Code of an absent issue date.
pub const UNKNOWN_MONTH: i64 = 0;

/// Loan status labels encoded as the bad outcome.
pub const BAD_LOAN_STATUS: &[&str] = &["Charged Off", "Default", "Late (31-120 days)"];

/// Verification labels encoded as the bad outcome.
pub const BAD_VERIFICATION: &[&str] = &["Not Verified"];

/// Reserved bucket for missing or unrecognised states.
pub const UNKNOWN_REGION: i64 = 0;

/// Region buckets as `(code, name, member state codes)`.
pub const REGIONS: &[(i64, &str, &[&str])] = &[
    (
        1,
        "West",
        &[
            "WA", "OR", "CA", "NV", "ID", "MT", "WY", "UT", "CO", "AZ", "NM", "HI", "AK",
        ],
    ),
    (
        2,
        "South",
        &[
            "TX", "OK", "AR", "LA", "MS", "AL", "TN", "KY", "FL", "GA", "SC", "NC", "VA", "WV",
            "MD", "DE", "DC",
        ],
    ),
    (
        3,
        "Midwest",
        &[
            "ND", "SD", "NE", "KS", "MN", "IA", "MO", "WI", "IL", "IN", "MI", "OH",
        ],
    ),
    (4, "East", &["PA", "NY", "NJ", "CT", "MA", "VT", "NH", "ME", "RI"]),
];

/// Prefix of a loan detail-page reference; the loan id follows it.
pub const URL_PREFIX: &str = "https://www.lendingclub.com/browse/loanDetail.action?loan_id=";

/// Letter grades from best to worst.
pub const GRADES: &[&str] = &["A", "B", "C", "D", "E", "F", "G"];

/// Subgrade suffix of the worst subgrade within a grade.
pub const WORST_SUBGRADE_SUFFIX: &str = "5";

/// Worst subgrade across the whole scale, one step beyond `G5`.
pub const WORST_SUBGRADE: &str = "H1";

static REGION_BY_STATE: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    REGIONS
        .iter()
        .flat_map(|(code, _, states)| states.iter().map(move |s| (*s, *code)))
        .collect()
});

static MONTH_BY_ABBREVIATION: Lazy<HashMap<String, i64>> = Lazy::new(|| {
    MONTHS
        .iter()
        .enumerate()
        .map(|(i, m)| (m.to_ascii_lowercase(), i as i64 + 1))
        .collect()
});

static TERM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)\s*(?:months?)?$").expect("Invalid regex: term"));

/// A binary good/bad mapping over normalized labels.
pub struct BinaryRule {
    pub name: &'static str,
    bad: HashSet<String>,
}

impl BinaryRule {
    fn new(name: &'static str, labels: &[&str]) -> Self {
        Self {
            name,
            bad: labels.iter().map(|l| normalize_label(l)).collect(),
        }
    }

    /// 0 for a bad label, 1 for anything else.
    pub fn encode(&self, label: &str) -> i64 {
        if self.bad.contains(&normalize_label(label)) {
            0
        } else {
            1
        }
    }
}

pub static LOAN_STATUS_RULE: Lazy<BinaryRule> =
    Lazy::new(|| BinaryRule::new("loan status good/bad", BAD_LOAN_STATUS));

pub static VERIFICATION_RULE: Lazy<BinaryRule> =
    Lazy::new(|| BinaryRule::new("verification good/bad", BAD_VERIFICATION));

/// Month code of an issue-date token such as `Mar-15`.
///
/// Only the text before the first `-` is looked up, case-insensitively.
pub fn month_code(token: &str) -> Option<i64> {
    let abbreviation = token.split('-').next().unwrap_or(token).trim();
    MONTH_BY_ABBREVIATION
        .get(&abbreviation.to_ascii_lowercase())
        .copied()
}

/// Region bucket of a state code, `None` for a code in no bucket.
pub fn region_code(state: &str) -> Option<i64> {
    REGION_BY_STATE
        .get(state.trim().to_ascii_uppercase().as_str())
        .copied()
}

/// Number of months in a term token such as `36 months`.
pub fn term_months(token: &str) -> Option<i64> {
    TERM_PATTERN
        .captures(token.trim())
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Loan id carried by a detail-page reference, prefix stripped.
pub fn reference_id(url: &str) -> &str {
    let url = url.trim();
    url.strip_prefix(URL_PREFIX).unwrap_or(url)
}
