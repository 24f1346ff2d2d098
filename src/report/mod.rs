#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reading test and coverage reports.

/// JaCoCo CSV coverage
pub mod coverage;
/// Surefire XML reports
pub mod junit;
/// Per-tier summaries
pub mod summary;
/// Minimal XML tree used by the surefire grammar
pub mod xml;

pub use coverage::{CoverageResult, extract as extract_coverage, parse_jacoco_csv};
pub use junit::{TestCaseResult, TestClassReport, TestOutcome, parse_surefire_xml};
pub use summary::{TestResults, TestSummary, TestVisibilityTier, TierRules, aggregate};
