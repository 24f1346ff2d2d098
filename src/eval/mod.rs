#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! From build artifacts to a verdict and its indicators.

/// Assignment grading policy
pub mod assignment;
/// Indicator codes, values and student visibility
pub mod indicators;
/// The evaluation pipeline
pub mod pipeline;
/// The immutable build verdict
pub mod verdict;

pub use assignment::{AssignmentPolicy, LeaderboardType, TestVisibility};
pub use indicators::{Indicator, IndicatorRecord, IndicatorValue};
pub use pipeline::{BuildArtifacts, BuildExecution, Evaluation, EvaluationPipeline, compute_indicators};
pub use verdict::BuildVerdict;
