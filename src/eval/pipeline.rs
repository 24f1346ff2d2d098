#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use super::{
    assignment::{AssignmentPolicy, TestVisibility},
    indicators::{Indicator, IndicatorRecord, IndicatorValue},
    verdict::BuildVerdict,
};
use crate::{
    build::{CheckCategory, OutputParser, RawBuildOutput},
    config::EvalSettings,
    constants::TRIMMED_OUTPUT_MARKER,
    error::{EvalError, InfrastructureFailure},
    report::{self, TestClassReport, TestVisibilityTier},
};

/// What the build executor reports about one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
pub struct BuildExecution {
    /// Captured console lines.
    pub output:             RawBuildOutput,
    /// The run exceeded its wall-clock budget.
    pub timed_out:          bool,
    /// Submitted code tripped the security guard.
    pub security_violation: bool,
}

/// Everything the evaluation needs from one build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct BuildArtifacts {
    /// The executor's report.
    pub execution:        BuildExecution,
    /// Surefire XML reports, one per executed test class.
    pub test_reports:     Vec<String>,
    /// JaCoCo CSV reports.
    pub coverage_reports: Vec<String>,
    /// Absolute path of the mavenized project.
    pub project_folder:   String,
    /// Problems found in the upload's layout before building.
    pub structure_errors: Vec<String>,
}

/// Outcome of evaluating one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The verdict; absent when the project structure was rejected.
    verdict:          Option<BuildVerdict>,
    /// Indicators in report order.
    indicators:       Vec<IndicatorRecord>,
    /// Structure problems that stopped the evaluation.
    structure_errors: Vec<String>,
}

impl Evaluation {
    /// Returns the verdict, if the build was evaluated.
    pub fn verdict(&self) -> Option<&BuildVerdict> {
        self.verdict.as_ref()
    }

    /// Returns the indicators, in report order.
    pub fn indicators(&self) -> &[IndicatorRecord] {
        &self.indicators
    }

    /// Returns the structure problems.
    pub fn structure_errors(&self) -> &[String] {
        &self.structure_errors
    }

    /// Returns one indicator's record.
    pub fn indicator(&self, indicator: Indicator) -> Option<&IndicatorRecord> {
        self.indicators
            .iter()
            .find(|record| record.indicator == indicator)
    }

    /// True when the given indicator is NOK.
    pub fn has_nok(&self, indicator: Indicator) -> bool {
        self.indicator(indicator)
            .is_some_and(|record| record.value == IndicatorValue::Nok)
    }

    /// A fatal build never passes; otherwise every indicator must be OK.
    pub fn is_passing(&self) -> bool {
        match &self.verdict {
            Some(verdict) if verdict.is_fatal() => false,
            Some(_) => self.indicators.iter().all(IndicatorRecord::is_ok),
            None => false,
        }
    }

    /// Indicators a student may see.
    pub fn student_view(&self, hidden_visibility: Option<TestVisibility>) -> Vec<IndicatorRecord> {
        self.indicators
            .iter()
            .filter_map(|record| record.student_view(hidden_visibility))
            .collect()
    }

    /// Passing teacher tests.
    pub fn teacher_progress(&self) -> Option<u32> {
        self.verdict
            .as_ref()
            .and_then(|verdict| verdict.summary(TestVisibilityTier::Teacher))
            .map(|summary| summary.progress())
    }
}

/// Turns build artifacts into verdicts and indicators.
#[derive(Debug, Clone, Default)]
pub struct EvaluationPipeline {
    /// Thresholds and naming prefixes.
    settings: EvalSettings,
}

impl EvaluationPipeline {
    /// Creates a pipeline with explicit settings.
    pub fn new(settings: EvalSettings) -> Self {
        Self { settings }
    }

    /// Returns the settings.
    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }

    /// Rejects runs that must not be parsed, in order: timeout, security
    /// violation, runaway output. Output the executor already trimmed counts
    /// as runaway whatever its length.
    pub fn check_infrastructure(&self, execution: &BuildExecution) -> Result<(), InfrastructureFailure> {
        if execution.timed_out {
            return Err(InfrastructureFailure::Timeout);
        }
        if execution.security_violation {
            return Err(InfrastructureFailure::IllegalAccess);
        }
        let lines = execution.output.len();
        let trimmed = execution
            .output
            .lines()
            .last()
            .is_some_and(|line| line == TRIMMED_OUTPUT_MARKER);
        if trimmed || lines >= self.settings.too_much_output_threshold {
            return Err(InfrastructureFailure::TooMuchOutput { lines });
        }
        Ok(())
    }

    /// Parses console output, test reports and coverage into a verdict.
    pub fn build_verdict(
        &self,
        artifacts: &BuildArtifacts,
        policy: &AssignmentPolicy,
    ) -> Result<BuildVerdict, EvalError> {
        let parsed = OutputParser::new(policy.toolchain, artifacts.project_folder.as_str())
            .parse(&artifacts.execution.output);

        let reports = artifacts
            .test_reports
            .iter()
            .map(|xml| report::parse_surefire_xml(xml))
            .collect::<Result<Vec<TestClassReport>, _>>()
            .inspect_err(|e| warn!(assignment = %policy.id, "{e}"))?;

        let rules = policy.tier_rules_for(
            reports.iter().map(|r| r.full_class_name.as_str()),
            &self.settings,
        );
        let tests = report::aggregate(reports, &rules, policy.mandatory_suffix());

        let coverage = if policy.calculate_student_tests_coverage {
            report::extract_coverage(&artifacts.coverage_reports)
                .inspect_err(|e| warn!(assignment = %policy.id, "{e}"))?
        } else {
            None
        };

        Ok(BuildVerdict::new(parsed, tests, coverage))
    }

    /// Evaluates one build.
    ///
    /// A rejected project structure stops before the build output is looked
    /// at. Infrastructure failures come back as
    /// [`EvalError::Infrastructure`] and produce no verdict.
    pub fn evaluate(
        &self,
        artifacts: &BuildArtifacts,
        policy: &AssignmentPolicy,
    ) -> Result<Evaluation, EvalError> {
        if !artifacts.structure_errors.is_empty() {
            info!(
                assignment = %policy.id,
                errors = artifacts.structure_errors.len(),
                "project structure rejected"
            );
            return Ok(Evaluation {
                verdict:          None,
                indicators:       vec![IndicatorRecord::new(
                    Indicator::ProjectStructure,
                    IndicatorValue::Nok,
                )],
                structure_errors: artifacts.structure_errors.clone(),
            });
        }

        if let Err(failure) = self.check_infrastructure(&artifacts.execution) {
            warn!(assignment = %policy.id, "{failure}");
            return Err(failure.into());
        }

        let verdict = self.build_verdict(artifacts, policy)?;
        let indicators = compute_indicators(&verdict, policy);
        let summary = indicators
            .iter()
            .map(|r| format!("{}={}", r.indicator.code(), r.value))
            .collect::<Vec<_>>()
            .join(",");
        info!(
            assignment = %policy.id,
            indicators = %summary,
            fatal = verdict.is_fatal(),
            max_memory_mb = policy.effective_max_memory_mb(&self.settings),
            "evaluated build"
        );

        Ok(Evaluation {
            verdict: Some(verdict),
            indicators,
            structure_errors: Vec::new(),
        })
    }
}

/// Derives the ordered indicator list of a verdict.
///
/// A fatal verdict only reports the project structure. Code quality and test
/// indicators need a successful compile.
pub fn compute_indicators(verdict: &BuildVerdict, policy: &AssignmentPolicy) -> Vec<IndicatorRecord> {
    let mut indicators = vec![IndicatorRecord::new(Indicator::ProjectStructure, IndicatorValue::Ok)];
    if verdict.is_fatal() {
        return indicators;
    }

    let compiled = !verdict.has_compilation_errors();
    indicators.push(IndicatorRecord::new(
        Indicator::Compilation,
        IndicatorValue::from_pass(compiled),
    ));
    if !compiled {
        return indicators;
    }

    if verdict.check_active(CheckCategory::StyleCheck)
        || verdict.check_active(CheckCategory::StaticAnalysis)
    {
        indicators.push(IndicatorRecord::new(
            Indicator::CodeQuality,
            IndicatorValue::from_pass(!verdict.has_quality_findings()),
        ));
    }

    if policy.accepts_student_tests {
        let summary = verdict.summary(TestVisibilityTier::Student);
        let value = match summary {
            Some(summary) if summary.has_failures() => IndicatorValue::Nok,
            Some(summary) if summary.total_tests >= policy.min_student_tests() => IndicatorValue::Ok,
            _ => IndicatorValue::NotEnoughTests,
        };
        indicators.push(match summary {
            Some(summary) => IndicatorRecord::with_summary(Indicator::StudentUnitTests, value, summary),
            None => IndicatorRecord::new(Indicator::StudentUnitTests, value),
        });
    }

    for (tier, indicator) in [
        (TestVisibilityTier::Teacher, Indicator::TeacherUnitTests),
        (TestVisibilityTier::Hidden, Indicator::HiddenUnitTests),
    ] {
        if let Some(summary) = verdict.summary(tier) {
            indicators.push(IndicatorRecord::with_summary(
                indicator,
                IndicatorValue::from_pass(!summary.has_failures()),
                summary,
            ));
        }
    }

    indicators
}
