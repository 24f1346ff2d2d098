#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    RawBuildOutput, detekt,
    diagnostic::{Diagnostic, DiagnosticKind},
    toolchain::{Sentinels, StyleTool, ToolchainProfile},
};
use crate::{constants::maven, parsers::parser};

/// Categories of findings the parser knows how to extract.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckCategory {
    /// javac/kotlinc errors. Always active: a clean compile prints no errors.
    Compilation,
    /// checkstyle (Java) or detekt (Kotlin).
    StyleCheck,
    /// PMD.
    StaticAnalysis,
}

/// Everything the console output tells us, independent of test reports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParsedOutput {
    /// Findings in category order: compilation, style, static analysis.
    pub diagnostics:        Vec<Diagnostic>,
    /// Whether the style checker's start sentinel appeared.
    pub style_check_active: bool,
    /// Whether any PMD line appeared.
    pub pmd_active:         bool,
    /// A goal other than the compiler or the test runner failed.
    pub fatal:              bool,
}

impl ParsedOutput {
    /// Reports whether a category's check ran at all, as opposed to running
    /// and finding nothing.
    pub fn check_active(&self, category: CheckCategory) -> bool {
        match category {
            CheckCategory::Compilation => true,
            CheckCategory::StyleCheck => self.style_check_active,
            CheckCategory::StaticAnalysis => self.pmd_active,
        }
    }

    /// Iterates over the findings of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |diag| diag.kind() == kind)
    }

    /// True when the compiler reported at least one error.
    pub fn has_compilation_errors(&self) -> bool {
        self.of_kind(DiagnosticKind::CompilationError)
            .next()
            .is_some()
    }
}

/// Extracts classified diagnostics from Maven console output.
#[derive(Debug, Clone)]
pub struct OutputParser {
    /// Sentinels of the assignment's toolchain.
    sentinels:      Sentinels,
    /// Absolute path of the mavenized project, stripped from messages.
    project_folder: String,
}

impl OutputParser {
    /// Creates a parser for one toolchain and project folder.
    ///
    /// * `profile`: the assignment's toolchain
    /// * `project_folder`: absolute path the build ran in, without trailing
    ///   slash
    pub fn new(profile: ToolchainProfile, project_folder: impl Into<String>) -> Self {
        let project_folder = project_folder.into();
        Self {
            sentinels:      profile.sentinels(),
            project_folder: project_folder.trim_end_matches('/').to_string(),
        }
    }

    /// Parses one build's output. Pure: equal inputs give equal results.
    pub fn parse(&self, output: &RawBuildOutput) -> ParsedOutput {
        let lines = output.lines();
        let mut diagnostics = self.compilation_errors(lines);

        let style_range = sentinel_range(
            lines,
            |line| self.sentinels.is_style_start(line),
            |line| self.sentinels.is_style_end(line),
        );
        let style_check_active = style_range.is_some();
        if let Some(range) = style_range {
            debug!(lines = range.len(), "found style-check output");
            diagnostics.extend(self.style_warnings(range));
        }

        let pmd = pmd_failures(lines);
        let pmd_active = !pmd.is_empty();
        diagnostics.extend(pmd);

        ParsedOutput {
            diagnostics,
            style_check_active,
            pmd_active,
            fatal: is_fatal(lines),
        }
    }

    /// Compiler errors from main and test sources.
    fn compilation_errors(&self, lines: &[String]) -> Vec<Diagnostic> {
        let mut errors = Vec::new();

        if let Some(range) =
            sentinel_range(lines, self.sentinels.compile_start, Sentinels::is_compile_end)
        {
            debug!(lines = range.len(), "found compilation output");
            errors.extend(self.error_listing(range));
        }

        if let Some(start) = self.sentinels.test_compile_start
            && let Some(range) = sentinel_range(lines, start, Sentinels::is_test_compile_end)
        {
            debug!(lines = range.len(), "found test-compilation output");
            errors.extend(self.error_listing(range));
        }

        errors
    }

    /// Keeps error and continuation lines of a compiler listing.
    fn error_listing(&self, range: &[String]) -> Vec<Diagnostic> {
        let folder = self.sentinels.profile.source_folder();
        let main_prefix = format!("{}{}/src/main/{folder}/", maven::ERROR_PREFIX, self.project_folder);
        let test_prefix = format!("{}{}/src/test/{folder}/", maven::ERROR_PREFIX, self.project_folder);

        range
            .iter()
            .filter(|line| {
                line.starts_with(maven::ERROR_PREFIX) || line.starts_with(maven::CONTINUATION_PREFIX)
            })
            .map(|line| {
                let message = line
                    .replace(&main_prefix, "")
                    .replace(&test_prefix, "[TEST] ");
                Diagnostic::classify(DiagnosticKind::CompilationError, message)
            })
            .collect()
    }

    /// Findings of the toolchain's style checker.
    fn style_warnings(&self, range: &[String]) -> Vec<Diagnostic> {
        let folder = self.sentinels.profile.source_folder();
        match self.sentinels.style {
            StyleTool::Checkstyle => {
                let prefix =
                    format!("{}{}/src/main/{folder}/", maven::WARN_PREFIX, self.project_folder);
                range
                    .iter()
                    .filter(|line| line.starts_with(maven::WARN_PREFIX))
                    .map(|line| {
                        Diagnostic::classify(DiagnosticKind::StyleWarning, line.replace(&prefix, ""))
                    })
                    .collect()
            }
            StyleTool::Detekt => {
                let prefix = format!("{}/src/main/{folder}/", self.project_folder);
                range
                    .iter()
                    .filter(|line| line.starts_with('\t'))
                    .map(|line| {
                        let finding = line.replace('\t', "").replace(&prefix, "");
                        Diagnostic::classify(DiagnosticKind::StyleWarning, detekt::translate(&finding))
                    })
                    .collect()
            }
        }
    }
}

/// Returns the lines strictly between the first start sentinel and the first
/// end sentinel after it. An unterminated range runs to the end of the
/// output. `None` when the start sentinel never appears.
fn sentinel_range<'a>(
    lines: &'a [String],
    is_start: impl Fn(&str) -> bool,
    is_end: impl Fn(&str) -> bool,
) -> Option<&'a [String]> {
    let start = lines.iter().position(|line| is_start(line.as_str()))? + 1;
    let end = lines[start..]
        .iter()
        .position(|line| is_end(line.as_str()))
        .map_or(lines.len(), |offset| start + offset);
    Some(&lines[start..end])
}

/// One diagnostic per `[INFO] PMD Failure` line.
fn pmd_failures(lines: &[String]) -> Vec<Diagnostic> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix(maven::PMD_FAILURE))
        .map(|rest| {
            let message = rest.strip_prefix(':').unwrap_or(rest).trim();
            Diagnostic::classify(DiagnosticKind::StaticAnalysisFailure, message)
        })
        .collect()
}

/// A core Maven goal failed, and it was neither the compiler nor surefire.
fn is_fatal(lines: &[String]) -> bool {
    let core_failures: Vec<_> = lines
        .iter()
        .filter(|line| line.starts_with(maven::FAILED_GOAL_PREFIX))
        .filter_map(|line| parser::failed_goal(line).ok())
        .filter(|goal| goal.group == maven::CORE_PLUGIN_GROUP)
        .collect();

    let fatal = !core_failures.is_empty() && !core_failures.iter().any(|goal| goal.is_expected());
    if fatal {
        debug!(goals = ?core_failures, "build stopped on an unexpected goal");
    }
    fatal
}
