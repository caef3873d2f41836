//! Integer encoding of the imputed categorical group.

use super::lexical::LexicalRankEncoding;
use super::tables::{
    self, BinaryRule, LOAN_STATUS_RULE, UNKNOWN_MONTH, UNKNOWN_REGION, VERIFICATION_RULE,
};
use crate::error::{PreprocessingError, Result};
use crate::schema;
use crate::utils::{distinct_samples, parse_numeric_string, string_values};
use polars::prelude::*;
use tracing::{debug, info, warn};

const SAMPLE_SIZE: usize = 5;

/// Outcome of comparing the detail-page reference against the identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceCheck {
    /// Every present reference equals the record identifier.
    Redundant,
    /// At least one reference differs; the parsed references are kept.
    Distinct(Vec<i64>),
}

/// The encoded categorical group plus everything learned while encoding it.
#[derive(Debug, Clone)]
pub struct EncodedCategoricals {
    /// `Int64` columns in output order.
    pub frame: DataFrame,
    pub subgrade_encoding: LexicalRankEncoding,
    /// Removed raw columns with the reason for removal.
    pub dropped_columns: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

/// Encoder applying the fixed per-column rules.
pub struct CategoricalEncoder {
    strict_regions: bool,
}

impl CategoricalEncoder {
    pub fn new(strict_regions: bool) -> Self {
        Self { strict_regions }
    }

    /// Encode the imputed categorical group.
    ///
    /// `ids` is the record identifier column, used to decide whether the
    /// reference column is redundant.
    pub fn encode(
        &self,
        categorical: &DataFrame,
        ids: &[Option<f64>],
        processing_steps: &mut Vec<String>,
    ) -> Result<EncodedCategoricals> {
        info!("Encoding {} categorical columns...", categorical.width());
        let mut warnings = Vec::new();

        let issue_months = Self::encode_issue_month(&string_values(categorical, schema::ISSUE_DATE)?)?;
        let status = Self::encode_binary(
            &LOAN_STATUS_RULE,
            &string_values(categorical, schema::LOAN_STATUS)?,
        );
        let terms = Self::encode_term(&string_values(categorical, schema::TERM)?)?;
        let (subgrades, subgrade_encoding) =
            Self::encode_subgrade(&string_values(categorical, schema::SUB_GRADE)?)?;
        let verification = Self::encode_binary(
            &VERIFICATION_RULE,
            &string_values(categorical, schema::VERIFICATION_STATUS)?,
        );
        let (regions, region_warning) =
            self.encode_region(&string_values(categorical, schema::ADDR_STATE)?)?;
        warnings.extend(region_warning);

        processing_steps.push(format!(
            "Encoded '{}' as month codes 0-12 and relabeled it '{}'",
            schema::ISSUE_DATE,
            schema::ISSUE_DATE_OUT
        ));
        processing_steps.push(format!(
            "Encoded '{}' and '{}' as good (1) / bad (0)",
            schema::LOAN_STATUS,
            schema::VERIFICATION_STATUS
        ));
        processing_steps.push(format!(
            "Encoded '{}' as months and relabeled it '{}'",
            schema::TERM,
            schema::TERM_OUT
        ));
        processing_steps.push(format!(
            "Encoded '{}' by lexical rank over {} observed subgrades",
            schema::SUB_GRADE,
            subgrade_encoding.len()
        ));
        processing_steps.push(format!(
            "Bucketed '{}' into regions 0-4 and relabeled it '{}'",
            schema::ADDR_STATE,
            schema::STATE_OUT
        ));

        let mut columns = vec![
            Column::new(schema::ISSUE_DATE_OUT.into(), issue_months),
            Column::new(schema::LOAN_STATUS.into(), status),
            Column::new(schema::TERM_OUT.into(), terms),
            Column::new(schema::SUB_GRADE.into(), subgrades),
            Column::new(schema::VERIFICATION_STATUS.into(), verification),
            Column::new(schema::STATE_OUT.into(), regions),
        ];

        let reference = Self::check_reference(&string_values(categorical, schema::URL)?, ids)?;
        let dropped_columns = Self::dropped_columns(&reference);
        match reference {
            ReferenceCheck::Redundant => {
                processing_steps.push(format!(
                    "Dropped '{}': every reference equals '{}'",
                    schema::URL,
                    schema::ID
                ));
            }
            ReferenceCheck::Distinct(references) => {
                let message = format!(
                    "Column '{}' differs from '{}'; kept as '{}'",
                    schema::URL,
                    schema::ID,
                    schema::REFERENCE_OUT
                );
                warn!("{}", message);
                warnings.push(message);
                columns.push(Column::new(schema::REFERENCE_OUT.into(), references));
            }
        }

        for (column, reason) in &dropped_columns {
            debug!("Dropped '{}': {}", column, reason);
        }

        Ok(EncodedCategoricals {
            frame: DataFrame::new(columns)?,
            subgrade_encoding,
            dropped_columns,
            warnings,
        })
    }

    /// Raw columns that do not survive encoding, with the reason.
    pub fn dropped_columns(reference: &ReferenceCheck) -> Vec<(String, String)> {
        let mut dropped = vec![(
            schema::GRADE.to_string(),
            format!("Subsumed by '{}'", schema::SUB_GRADE),
        )];
        if *reference == ReferenceCheck::Redundant {
            dropped.push((
                schema::URL.to_string(),
                format!("Identical to '{}'", schema::ID),
            ));
        }
        dropped
    }

    /// Month code 1-12 from a `Mon-YY` token; missing is 0.
    pub fn encode_issue_month(values: &[Option<String>]) -> Result<Vec<i64>> {
        let mut unmapped = Vec::new();
        let codes: Vec<i64> = values
            .iter()
            .map(|v| match v {
                None => UNKNOWN_MONTH,
                Some(token) => tables::month_code(token).unwrap_or_else(|| {
                    unmapped.push(token.as_str());
                    UNKNOWN_MONTH
                }),
            })
            .collect();

        if !unmapped.is_empty() {
            return Err(PreprocessingError::UnmappedCategory {
                column: schema::ISSUE_DATE.to_string(),
                rule: "month abbreviation".to_string(),
                samples: distinct_samples(unmapped, SAMPLE_SIZE),
            });
        }
        Ok(codes)
    }

    /// Binary good/bad code; a missing label is the bad outcome.
    pub fn encode_binary(rule: &BinaryRule, values: &[Option<String>]) -> Vec<i64> {
        values
            .iter()
            .map(|v| v.as_deref().map_or(0, |label| rule.encode(label)))
            .collect()
    }

    /// Term length in months from a `<n> months` token.
    pub fn encode_term(values: &[Option<String>]) -> Result<Vec<i64>> {
        let mut unmapped = Vec::new();
        let codes: Vec<i64> = values
            .iter()
            .map(|v| {
                let token = v.as_deref().unwrap_or("");
                tables::term_months(token).unwrap_or_else(|| {
                    unmapped.push(token);
                    0
                })
            })
            .collect();

        if !unmapped.is_empty() {
            return Err(PreprocessingError::UnmappedCategory {
                column: schema::TERM.to_string(),
                rule: "'<n> months' term".to_string(),
                samples: distinct_samples(unmapped, SAMPLE_SIZE),
            });
        }
        Ok(codes)
    }

    /// Lexical-rank codes, fitted on the values present.
    pub fn encode_subgrade(values: &[Option<String>]) -> Result<(Vec<i64>, LexicalRankEncoding)> {
        if values.iter().any(Option::is_none) {
            return Err(PreprocessingError::Internal(format!(
                "'{}' still has missing values after imputation",
                schema::SUB_GRADE
            )));
        }

        let encoding = LexicalRankEncoding::fit(values.iter().flatten());
        let codes = values
            .iter()
            .flatten()
            .map(|v| {
                encoding.encode(v).ok_or_else(|| {
                    PreprocessingError::Internal(format!("subgrade '{}' missing from its own encoding", v))
                })
            })
            .collect::<Result<Vec<i64>>>()?;
        Ok((codes, encoding))
    }

    /// Region bucket per state; missing and unrecognised states get the unknown bucket.
    ///
    /// With strict regions an unrecognised state is an error instead.
    pub fn encode_region(&self, values: &[Option<String>]) -> Result<(Vec<i64>, Option<String>)> {
        let mut unmapped = Vec::new();
        let codes: Vec<i64> = values
            .iter()
            .map(|v| match v {
                None => UNKNOWN_REGION,
                Some(state) => tables::region_code(state).unwrap_or_else(|| {
                    unmapped.push(state.as_str());
                    UNKNOWN_REGION
                }),
            })
            .collect();

        if unmapped.is_empty() {
            return Ok((codes, None));
        }

        let samples = distinct_samples(unmapped.iter(), SAMPLE_SIZE);
        if self.strict_regions {
            return Err(PreprocessingError::UnmappedCategory {
                column: schema::ADDR_STATE.to_string(),
                rule: "region bucketing".to_string(),
                samples,
            });
        }

        let message = format!(
            "Column '{}': {} unrecognised state codes assigned to the unknown region: {:?}",
            schema::ADDR_STATE,
            unmapped.len(),
            samples
        );
        warn!("{}", message);
        Ok((codes, Some(message)))
    }

    /// Compare the detail-page reference with the identifier row by row.
    ///
    /// Rows without a reference carry no conflicting information and are
    /// skipped by the comparison.
    pub fn check_reference(urls: &[Option<String>], ids: &[Option<f64>]) -> Result<ReferenceCheck> {
        if urls.len() != ids.len() {
            return Err(PreprocessingError::ShapeMismatch {
                numeric_rows: ids.len(),
                categorical_rows: urls.len(),
            });
        }

        let references: Vec<Option<f64>> = urls
            .iter()
            .map(|u| u.as_deref().and_then(|u| parse_numeric_string(tables::reference_id(u))))
            .collect();

        let redundant = urls
            .iter()
            .zip(references.iter().zip(ids))
            .all(|(url, (reference, id))| url.is_none() || (reference.is_some() && reference == id));
        if redundant {
            return Ok(ReferenceCheck::Redundant);
        }

        let bad: Vec<&str> = urls
            .iter()
            .zip(&references)
            .filter(|(_, r)| !matches!(r, Some(v) if v.fract() == 0.0))
            .map(|(u, _)| u.as_deref().unwrap_or("<missing>"))
            .collect();
        if !bad.is_empty() {
            return Err(PreprocessingError::UnmappedCategory {
                column: schema::URL.to_string(),
                rule: "detail-page reference".to_string(),
                samples: distinct_samples(bad, SAMPLE_SIZE),
            });
        }

        Ok(ReferenceCheck::Distinct(
            references.into_iter().flatten().map(|v| v as i64).collect(),
        ))
    }
}
