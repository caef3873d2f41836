//! Pipeline module.
//!
//! This module provides the main preprocessing pipeline and related components.

mod assembler;
mod builder;
pub mod progress;

pub use assembler::TableAssembler;
pub use builder::{Pipeline, PipelineBuilder};
pub use progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
