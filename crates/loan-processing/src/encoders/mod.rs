//! Categorical encoding module.
//!
//! Every categorical column becomes an integer column under one of four
//! strategies:
//! - Binary outcome mapping (loan status, verification status)
//! - Fixed ordinal mapping (issue month, term length)
//! - Data-derived lexical-rank mapping (subgrade)
//! - Region bucketing (state)

mod categorical;
mod lexical;
pub mod tables;

pub use categorical::{CategoricalEncoder, EncodedCategoricals, ReferenceCheck};
pub use lexical::LexicalRankEncoding;
