//! Report generation module.
//!
//! This module writes the processed loan table and builds run reports.
//!
//! # Run Reports
//!
//! Use [`RunReport`] to produce a unified report suitable for:
//! - JSON output to stdout (`--json` CLI flag)
//! - JSON file output (`--emit-report` CLI flag)
//! - Programmatic access in library mode
//!
//! # Example
//!
//! ```rust,ignore
//! use loan_processing::reporting::ReportGenerator;
//! use std::path::{Path, PathBuf};
//!
//! let report = ReportGenerator::build_report(
//!     Some(Path::new("loan-data.csv")),
//!     Some(Path::new("EUR-USD.csv")),
//!     &pipeline_result,
//! );
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! let generator = ReportGenerator::new(PathBuf::from("output"), "loans".to_string());
//! generator.write_report_to_file(&report)?;
//! ```

mod generator;

pub use generator::{ImputationReport, ReportGenerator, RunReport};
