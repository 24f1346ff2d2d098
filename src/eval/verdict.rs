#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    build::{CheckCategory, Diagnostic, DiagnosticKind, ParsedOutput},
    report::{CoverageResult, TestResults, TestSummary, TestVisibilityTier},
};

/// Everything one build invocation produced. Built once by the pipeline and
/// never changed afterwards; a rebuild yields a new verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildVerdict {
    /// Classified console findings.
    diagnostics:             Vec<Diagnostic>,
    /// Whether the style checker ran.
    style_check_active:      bool,
    /// Whether PMD reported anything.
    static_analysis_active:  bool,
    /// A non-compiler, non-test-runner goal failed.
    fatal_execution_failure: bool,
    /// Test reports and per-tier summaries.
    tests:                   TestResults,
    /// Line coverage, when the assignment computes it.
    coverage:                Option<CoverageResult>,
}

impl BuildVerdict {
    /// Combines the parsed console output, test results and coverage.
    pub fn new(parsed: ParsedOutput, tests: TestResults, coverage: Option<CoverageResult>) -> Self {
        Self {
            diagnostics: parsed.diagnostics,
            style_check_active: parsed.style_check_active,
            static_analysis_active: parsed.pmd_active,
            fatal_execution_failure: parsed.fatal,
            tests,
            coverage,
        }
    }

    /// Returns all findings.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterates over the findings of one kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diag| diag.kind() == kind)
    }

    /// Whether a category's check ran.
    pub fn check_active(&self, category: CheckCategory) -> bool {
        match category {
            CheckCategory::Compilation => true,
            CheckCategory::StyleCheck => self.style_check_active,
            CheckCategory::StaticAnalysis => self.static_analysis_active,
        }
    }

    /// True when the code did not compile.
    pub fn has_compilation_errors(&self) -> bool {
        self.diagnostics_of(DiagnosticKind::CompilationError)
            .next()
            .is_some()
    }

    /// True when style or static analysis found something.
    pub fn has_quality_findings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.kind().is_quality())
    }

    /// True when the build stopped on an unexpected goal.
    pub fn is_fatal(&self) -> bool {
        self.fatal_execution_failure
    }

    /// Returns the test results.
    pub fn tests(&self) -> &TestResults {
        &self.tests
    }

    /// Returns the summary of a tier, absent when no test of that tier ran.
    pub fn summary(&self, tier: TestVisibilityTier) -> Option<&TestSummary> {
        self.tests.summary(tier)
    }

    /// Returns every tier summary.
    pub fn summaries(&self) -> &BTreeMap<TestVisibilityTier, TestSummary> {
        self.tests.summaries()
    }

    /// Returns the coverage, if computed.
    pub fn coverage(&self) -> Option<&CoverageResult> {
        self.coverage.as_ref()
    }
}
