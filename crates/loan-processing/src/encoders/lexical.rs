//! Data-derived lexical-rank encoding.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from distinct observed values to consecutive codes starting at 1,
/// in lexical order of the values.
///
/// The mapping is built from the values present at run time, so a category
/// absent from the data shifts the codes after it instead of leaving a hole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalRankEncoding {
    codes: BTreeMap<String, i64>,
}

impl LexicalRankEncoding {
    /// Build the encoding from a corpus of observed values.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        let codes = distinct
            .into_iter()
            .zip(1_i64..)
            .collect();
        Self { codes }
    }

    /// Code of `value`, `None` if it was not part of the corpus.
    pub fn encode(&self, value: &str) -> Option<i64> {
        self.codes.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &BTreeMap<String, i64> {
        &self.codes
    }

    pub fn into_codes(self) -> BTreeMap<String, i64> {
        self.codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_is_contiguous_bijection() {
        let encoding = LexicalRankEncoding::fit(["B2", "A1", "H1", "A1", "B2", "C3"]);

        assert_eq!(encoding.len(), 4);
        let codes: Vec<i64> = encoding.codes().values().copied().collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
        assert_eq!(encoding.encode("A1"), Some(1));
        assert_eq!(encoding.encode("B2"), Some(2));
        assert_eq!(encoding.encode("C3"), Some(3));
        assert_eq!(encoding.encode("H1"), Some(4));
        assert_eq!(encoding.encode("D1"), None);
    }

    #[test]
    fn test_full_scale_encodes_one_to_thirty_six() {
        let mut scale: Vec<String> = Vec::new();
        for grade in ['A', 'B', 'C', 'D', 'E', 'F', 'G'] {
            for step in 1..=5 {
                scale.push(format!("{}{}", grade, step));
            }
        }
        scale.push("H1".to_string());

        let encoding = LexicalRankEncoding::fit(&scale);
        assert_eq!(encoding.encode("A1"), Some(1));
        assert_eq!(encoding.encode("G5"), Some(35));
        assert_eq!(encoding.encode("H1"), Some(36));
    }

    #[test]
    fn test_empty_corpus() {
        let encoding = LexicalRankEncoding::fit(Vec::<String>::new());
        assert!(encoding.is_empty());
    }
}
