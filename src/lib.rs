//! # dropgrade
//!
//! Evaluates programming-assignment submissions from the output of a Maven
//! build: console diagnostics, surefire test reports and JaCoCo coverage
//! become a verdict and a list of indicators, which then drive the
//! submission lifecycle, plagiarism signalling, leaderboards and CSV exports.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Console output parsing for Java and Kotlin builds
pub mod build;
/// Process-wide evaluation settings
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Error types
pub mod error;
/// Verdicts, indicators and the evaluation pipeline
pub mod eval;
/// For all parsers used
pub mod parsers;
/// Leaderboards and CSV export
pub mod ranking;
/// Test and coverage reports
pub mod report;
/// Signalling of similar groups
pub mod signal;
/// Submission lifecycle
pub mod submission;
/// Shared identifiers and small value types
pub mod types;
/// Utility functions for loading artifacts from disk
pub mod util;

pub use error::{EvalError, InfrastructureFailure};
pub use eval::{AssignmentPolicy, BuildArtifacts, Evaluation, EvaluationPipeline};
