//! Worst-case imputation for the categorical column group.
//!
//! Policies per column:
//! - loan status: missing is the bad outcome
//! - term: missing is the longest observed term
//! - subgrade: worst subgrade of the grade, or the worst overall without a grade
//! - verification status: missing is "not verified"
//! - state: left missing, the region encoder assigns the reserved unknown bucket

use super::Imputation;
use crate::encoders::tables::{
    BAD_LOAN_STATUS, BAD_VERIFICATION, GRADES, WORST_SUBGRADE, WORST_SUBGRADE_SUFFIX,
    term_months,
};
use crate::error::{PreprocessingError, Result};
use crate::schema;
use crate::utils::{distinct_samples, fill_string_nulls, string_values};
use polars::prelude::*;
use tracing::{debug, info};

/// Worst-case imputer for the categorical group.
pub struct CategoricalImputer;

impl CategoricalImputer {
    /// Apply every categorical policy to the group.
    pub fn impute(
        categorical: &mut DataFrame,
        processing_steps: &mut Vec<String>,
    ) -> Result<Vec<Imputation>> {
        info!("Imputing categorical columns with worst-case categories...");

        let mut imputations = Vec::new();
        let bad_status = BAD_LOAN_STATUS[0];
        imputations.extend(Self::fill_constant(
            categorical,
            schema::LOAN_STATUS,
            bad_status,
            "missing status is the bad outcome",
            processing_steps,
        )?);
        imputations.extend(Self::impute_term(categorical, processing_steps)?);
        imputations.extend(Self::impute_subgrade(categorical, processing_steps)?);
        imputations.extend(Self::fill_constant(
            categorical,
            schema::VERIFICATION_STATUS,
            BAD_VERIFICATION[0],
            "missing verification is not verified",
            processing_steps,
        )?);

        let unknown_states = crate::utils::series(categorical, schema::ADDR_STATE)?.null_count();
        if unknown_states > 0 {
            debug!(
                "Column '{}': {} missing states kept for the unknown region",
                schema::ADDR_STATE,
                unknown_states
            );
            imputations.push(Imputation {
                column: schema::ADDR_STATE.to_string(),
                count: unknown_states,
                substitute: "unknown region".to_string(),
                rule: "missing state is never imputed to a real region".to_string(),
            });
        }

        Ok(imputations)
    }

    fn fill_constant(
        categorical: &mut DataFrame,
        column: &str,
        value: &str,
        rule: &str,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<Imputation>> {
        let series = crate::utils::series(categorical, column)?;
        let missing = series.null_count();
        if missing == 0 {
            return Ok(None);
        }

        let filled = fill_string_nulls(series, value)?;
        categorical.replace(column, filled)?;
        processing_steps.push(format!(
            "Filled {} missing values in '{}' with '{}'",
            missing, column, value
        ));

        Ok(Some(Imputation {
            column: column.to_string(),
            count: missing,
            substitute: value.to_string(),
            rule: rule.to_string(),
        }))
    }

    /// Missing terms become the longest term observed in the column.
    fn impute_term(
        categorical: &mut DataFrame,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<Imputation>> {
        let values = string_values(categorical, schema::TERM)?;
        if values.iter().all(Option::is_some) {
            return Ok(None);
        }

        let longest = values
            .iter()
            .flatten()
            .filter_map(|token| term_months(token).map(|months| (months, token)))
            .max_by_key(|(months, _)| *months)
            .map(|(_, token)| token.clone())
            .ok_or_else(|| PreprocessingError::UndefinedStatistic {
                column: schema::TERM.to_string(),
                rule: "longest observed term".to_string(),
            })?;

        Self::fill_constant(
            categorical,
            schema::TERM,
            &longest,
            "missing term is the longest observed term",
            processing_steps,
        )
    }

    /// Missing subgrades become the worst subgrade of their grade, or the
    /// worst subgrade overall when the grade is missing too.
    fn impute_subgrade(
        categorical: &mut DataFrame,
        processing_steps: &mut Vec<String>,
    ) -> Result<Option<Imputation>> {
        let grades = string_values(categorical, schema::GRADE)?;
        let subgrades = string_values(categorical, schema::SUB_GRADE)?;

        // an unknown grade would derive a subgrade ranked beyond the overall worst
        let unknown: Vec<&str> = grades
            .iter()
            .flatten()
            .map(|g| g.as_str())
            .filter(|g| !GRADES.contains(&g.to_ascii_uppercase().as_str()))
            .collect();
        if !unknown.is_empty() {
            return Err(PreprocessingError::UnmappedCategory {
                column: schema::GRADE.to_string(),
                rule: format!("letter grades {}-{}", GRADES[0], GRADES[GRADES.len() - 1]),
                samples: distinct_samples(unknown, 5),
            });
        }

        let mut within_grade = 0;
        let mut overall = 0;
        let resolved: Vec<String> = subgrades
            .into_iter()
            .zip(grades)
            .map(|(subgrade, grade)| match (subgrade, grade) {
                (Some(subgrade), _) => subgrade,
                (None, Some(grade)) => {
                    within_grade += 1;
                    format!("{}{}", grade.to_ascii_uppercase(), WORST_SUBGRADE_SUFFIX)
                }
                (None, None) => {
                    overall += 1;
                    WORST_SUBGRADE.to_string()
                }
            })
            .collect();

        let count = within_grade + overall;
        if count == 0 {
            return Ok(None);
        }

        categorical.replace(
            schema::SUB_GRADE,
            Series::new(schema::SUB_GRADE.into(), resolved),
        )?;
        processing_steps.push(format!(
            "Filled {} missing subgrades in '{}': {} from their grade, {} with '{}'",
            count,
            schema::SUB_GRADE,
            within_grade,
            overall,
            WORST_SUBGRADE
        ));

        Ok(Some(Imputation {
            column: schema::SUB_GRADE.to_string(),
            count,
            substitute: format!("<grade>{} or {}", WORST_SUBGRADE_SUFFIX, WORST_SUBGRADE),
            rule: "worst subgrade within the grade, else worst overall".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn categorical_group() -> DataFrame {
        df!(
            "issue_d" => &[Some("Jan-15"), None, Some("Mar-15")],
            "loan_status" => &[Some("Current"), None, Some("Fully Paid")],
            "term" => &[Some("36 months"), None, Some("60 months")],
            "grade" => &[Some("B"), Some("C"), None],
            "sub_grade" => &[Some("B2"), None, None],
            "verification_status" => &[Some("Verified"), None, Some("Source Verified")],
            "url" => &[Some("1"), Some("2"), Some("3")],
            "addr_state" => &[Some("CA"), Some("NY"), None],
        )
        .unwrap()
    }

    fn column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
        string_values(df, name).unwrap()
    }

    #[test]
    fn test_worst_case_policies() {
        let mut df = categorical_group();
        let mut steps = Vec::new();
        let imputations = CategoricalImputer::impute(&mut df, &mut steps).unwrap();

        assert_eq!(column(&df, "loan_status")[1].as_deref(), Some("Charged Off"));
        assert_eq!(column(&df, "term")[1].as_deref(), Some("60 months"));
        assert_eq!(
            column(&df, "sub_grade"),
            vec![
                Some("B2".to_string()),
                Some("C5".to_string()),
                Some("H1".to_string())
            ]
        );
        assert_eq!(
            column(&df, "verification_status")[1].as_deref(),
            Some("Not Verified")
        );
        assert_eq!(column(&df, "addr_state")[2], None);

        let columns: Vec<&str> = imputations.iter().map(|i| i.column.as_str()).collect();
        assert_eq!(
            columns,
            vec![
                "loan_status",
                "term",
                "sub_grade",
                "verification_status",
                "addr_state"
            ]
        );
    }

    #[test]
    fn test_complete_group_is_untouched() {
        let mut df = df!(
            "loan_status" => &["Current"],
            "term" => &["36 months"],
            "grade" => &["A"],
            "sub_grade" => &["A1"],
            "verification_status" => &["Verified"],
            "addr_state" => &["CA"],
        )
        .unwrap();
        let before = df.clone();

        let imputations = CategoricalImputer::impute(&mut df, &mut Vec::new()).unwrap();
        assert!(imputations.is_empty());
        assert!(df.equals(&before));
    }

    #[test]
    fn test_unknown_grade_is_unmapped() {
        let mut df = df!(
            "loan_status" => &["Current", "Current"],
            "term" => &["36 months", "60 months"],
            "grade" => &["A", "Z"],
            "sub_grade" => &[Some("A1"), None],
            "verification_status" => &["Verified", "Verified"],
            "addr_state" => &["CA", "NY"],
        )
        .unwrap();

        let err = CategoricalImputer::impute(&mut df, &mut Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "UNMAPPED_CATEGORY");
        assert_eq!(err.column(), Some("grade"));
        assert!(err.to_string().contains("Z"));
    }

    #[test]
    fn test_term_without_observations_is_undefined() {
        let mut df = df!(
            "loan_status" => &["Current"],
            "term" => &[None::<&str>],
            "grade" => &["A"],
            "sub_grade" => &["A1"],
            "verification_status" => &["Verified"],
            "addr_state" => &["CA"],
        )
        .unwrap();

        let err = CategoricalImputer::impute(&mut df, &mut Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "UNDEFINED_STATISTIC");
        assert_eq!(err.column(), Some("term"));
    }
}
