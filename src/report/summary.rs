#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tabled::Tabled;

use super::junit::TestClassReport;
use crate::constants::{HIDDEN_TEST_PREFIX, TEACHER_TEST_PREFIX};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Who wrote a test class, which decides who gets to see its results.
pub enum TestVisibilityTier {
    /// Tests shipped with the submission.
    Student,
    /// Public tests supplied by the teacher.
    Teacher,
    /// Teacher tests whose details students never see.
    Hidden,
}

impl TestVisibilityTier {
    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            TestVisibilityTier::Student => "STUDENT",
            TestVisibilityTier::Teacher => "TEACHER",
            TestVisibilityTier::Hidden => "HIDDEN",
        }
    }
}

impl Serialize for TestVisibilityTier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TestVisibilityTier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "STUDENT" => Ok(TestVisibilityTier::Student),
            "TEACHER" => Ok(TestVisibilityTier::Teacher),
            "HIDDEN" => Ok(TestVisibilityTier::Hidden),
            other => Err(de::Error::custom(format!("Unknown test tier: {other}"))),
        }
    }
}

impl Display for TestVisibilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit lookup table from test class to tier. Classes listed in neither
/// set are student tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierRules {
    /// Public teacher test classes, simple or fully-qualified names.
    teacher_classes: BTreeSet<String>,
    /// Hidden teacher test classes, simple or fully-qualified names.
    hidden_classes:  BTreeSet<String>,
}

impl TierRules {
    /// Builds the table from explicit class lists.
    pub fn new<I, J, S, T>(teacher_classes: I, hidden_classes: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            teacher_classes: teacher_classes.into_iter().map(Into::into).collect(),
            hidden_classes:  hidden_classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Builds the table from the `TestTeacher*` / `TestTeacherHidden*` naming
    /// convention. When student tests are not accepted every non-hidden class
    /// counts as a teacher test.
    pub fn from_naming_convention<'a>(
        class_names: impl IntoIterator<Item = &'a str>,
        accepts_student_tests: bool,
    ) -> Self {
        Self::from_prefixes(class_names, accepts_student_tests, TEACHER_TEST_PREFIX, HIDDEN_TEST_PREFIX)
    }

    /// Same as [`TierRules::from_naming_convention`] with configurable
    /// prefixes.
    pub fn from_prefixes<'a>(
        class_names: impl IntoIterator<Item = &'a str>,
        accepts_student_tests: bool,
        teacher_prefix: &str,
        hidden_prefix: &str,
    ) -> Self {
        let mut rules = Self::default();
        for full_name in class_names {
            let simple = full_name.rsplit('.').next().unwrap_or(full_name);
            if simple.starts_with(hidden_prefix) {
                rules.hidden_classes.insert(full_name.to_string());
            } else if !accepts_student_tests || simple.starts_with(teacher_prefix) {
                rules.teacher_classes.insert(full_name.to_string());
            }
        }
        rules
    }

    /// Returns the tier of a report.
    pub fn tier_of(&self, report: &TestClassReport) -> TestVisibilityTier {
        let listed = |set: &BTreeSet<String>| {
            set.contains(&report.class_name) || set.contains(&report.full_class_name)
        };
        if listed(&self.hidden_classes) {
            TestVisibilityTier::Hidden
        } else if listed(&self.teacher_classes) {
            TestVisibilityTier::Teacher
        } else {
            TestVisibilityTier::Student
        }
    }
}

#[derive(Tabled, Serialize, Deserialize, Clone, Debug, PartialEq)]
/// Totals of one tier
pub struct TestSummary {
    /// * `tier`: which tests these are
    #[tabled(rename = "Tier")]
    pub tier:            TestVisibilityTier,
    /// * `total_tests`: executed tests, skipped ones excluded
    #[tabled(rename = "Tests")]
    pub total_tests:     u32,
    /// * `failures`: assertion failures
    #[tabled(rename = "Failures")]
    pub failures:        u32,
    /// * `errors`: unexpected exceptions
    #[tabled(rename = "Errors")]
    pub errors:          u32,
    /// * `elapsed_seconds`: summed class time
    #[tabled(rename = "Time (s)")]
    pub elapsed_seconds: f64,
    /// * `mandatory_pass`: passing mandatory tests (teacher tier only)
    #[tabled(skip)]
    pub mandatory_pass:  u32,
    /// * `mandatory_fail`: failing mandatory tests (teacher tier only)
    #[tabled(skip)]
    pub mandatory_fail:  u32,
}

impl TestSummary {
    /// An empty summary for a tier that ran.
    fn empty(tier: TestVisibilityTier) -> Self {
        Self {
            tier,
            total_tests: 0,
            failures: 0,
            errors: 0,
            elapsed_seconds: 0.0,
            mandatory_pass: 0,
            mandatory_fail: 0,
        }
    }

    /// Passing tests. Never negative, never above `total_tests`.
    pub fn progress(&self) -> u32 {
        self.total_tests
            .saturating_sub(self.failures + self.errors)
    }

    /// True when some test failed or threw.
    pub fn has_failures(&self) -> bool {
        self.failures + self.errors > 0
    }
}

impl Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tests run: {}, Failures: {}, Errors: {}, Time elapsed: {:.3} sec",
            self.total_tests, self.failures, self.errors, self.elapsed_seconds
        )
    }
}

/// A report together with the tier it was classified into.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TieredReport {
    /// Tier assigned by the [`TierRules`].
    pub tier:   TestVisibilityTier,
    /// The parsed report.
    pub report: TestClassReport,
}

/// All test reports of one build, classified and summed per tier.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct TestResults {
    /// Classified reports, in input order.
    reports:   Vec<TieredReport>,
    /// One summary per tier that executed at least one test.
    summaries: BTreeMap<TestVisibilityTier, TestSummary>,
}

impl TestResults {
    /// Returns the summary of a tier, absent when no test of that tier ran.
    pub fn summary(&self, tier: TestVisibilityTier) -> Option<&TestSummary> {
        self.summaries.get(&tier)
    }

    /// Returns every summary.
    pub fn summaries(&self) -> &BTreeMap<TestVisibilityTier, TestSummary> {
        &self.summaries
    }

    /// Returns the classified reports.
    pub fn reports(&self) -> &[TieredReport] {
        &self.reports
    }

    /// Teacher plus hidden time when both ran, otherwise whichever ran.
    pub fn combined_elapsed(&self) -> Option<f64> {
        let teacher = self.summary(TestVisibilityTier::Teacher);
        let hidden = self.summary(TestVisibilityTier::Hidden);
        match (teacher, hidden) {
            (None, None) => None,
            (t, h) => Some(
                t.map_or(0.0, |s| s.elapsed_seconds) + h.map_or(0.0, |s| s.elapsed_seconds),
            ),
        }
    }

    /// Sorted, distinct names of the methods of a tier that failed or threw.
    pub fn failing_test_names(&self, tier: TestVisibilityTier) -> Vec<String> {
        self.reports_of(tier)
            .flat_map(|report| report.cases.iter())
            .filter(|case| case.outcome.is_failing())
            .map(|case| case.test_method.clone())
            .sorted()
            .dedup()
            .collect()
    }

    /// Failure blocks of a tier as shown to students, `None` when everything
    /// passed.
    pub fn failure_details(&self, tier: TestVisibilityTier, package: Option<&str>) -> Option<String> {
        let rendered: String = self
            .reports_of(tier)
            .flat_map(|report| {
                report
                    .cases
                    .iter()
                    .filter(|case| case.outcome.is_failing())
                    .map(|case| case.render_failure(&report.full_class_name, package))
            })
            .join("\n");
        if rendered.is_empty() { None } else { Some(rendered) }
    }

    /// Explains why the student tests do not reach the required minimum, or
    /// `None` when they do.
    pub fn not_enough_student_tests_message(&self, min_tests: u32) -> Option<String> {
        match self.summary(TestVisibilityTier::Student) {
            None => Some(format!(
                "The submission doesn't include unit tests. The assignment requires a minimum of \
                 {min_tests} tests."
            )),
            Some(summary) if summary.total_tests < min_tests => Some(format!(
                "The submission only includes {} unit tests. The assignment requires a minimum of \
                 {min_tests} tests.",
                summary.total_tests
            )),
            Some(_) => None,
        }
    }

    /// Iterates over the reports of one tier.
    fn reports_of(&self, tier: TestVisibilityTier) -> impl Iterator<Item = &TestClassReport> {
        self.reports
            .iter()
            .filter(move |tiered| tiered.tier == tier)
            .map(|tiered| &tiered.report)
    }
}

/// Classifies every report and sums them per tier. Mandatory counts only
/// apply to the teacher tier, matching method names ending in
/// `mandatory_suffix`.
pub fn aggregate(
    reports: Vec<TestClassReport>,
    rules: &TierRules,
    mandatory_suffix: Option<&str>,
) -> TestResults {
    let mut summaries = BTreeMap::new();
    let mut tiered = Vec::with_capacity(reports.len());

    for report in reports {
        let tier = rules.tier_of(&report);
        let summary = summaries
            .entry(tier)
            .or_insert_with(|| TestSummary::empty(tier));
        summary.total_tests += report.total_tests();
        summary.failures += report.failures();
        summary.errors += report.errors();
        summary.elapsed_seconds += report.elapsed_seconds;

        if tier == TestVisibilityTier::Teacher
            && let Some(suffix) = mandatory_suffix.filter(|s| !s.is_empty())
        {
            for case in report
                .cases
                .iter()
                .filter(|case| case.test_method.ends_with(suffix))
            {
                if case.outcome.is_failing() {
                    summary.mandatory_fail += 1;
                } else {
                    summary.mandatory_pass += 1;
                }
            }
        }

        tiered.push(TieredReport { tier, report });
    }
    // classes whose cases were all skipped leave no summary behind
    summaries.retain(|_, summary| summary.total_tests > 0);

    TestResults {
        reports: tiered,
        summaries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::junit::{TestCaseResult, TestOutcome};

    fn report(full: &str, outcomes: &[(&str, TestOutcome)], elapsed: f64) -> TestClassReport {
        let simple = full.rsplit('.').next().unwrap().to_string();
        TestClassReport {
            class_name:      simple.clone(),
            full_class_name: full.to_string(),
            cases:           outcomes
                .iter()
                .map(|(name, outcome)| {
                    TestCaseResult::builder()
                        .test_class(simple.clone())
                        .test_method(*name)
                        .outcome(*outcome)
                        .build()
                })
                .collect(),
            skipped:         0,
            elapsed_seconds: elapsed,
        }
    }

    #[test]
    fn naming_convention_depends_on_student_tests() {
        let names = ["org.x.TestTeacherA", "org.x.TestTeacherHiddenB", "org.x.MyTests"];
        let with_students = TierRules::from_naming_convention(names, true);
        let without_students = TierRules::from_naming_convention(names, false);

        let mine = report("org.x.MyTests", &[("t", TestOutcome::Success)], 0.1);
        assert_eq!(with_students.tier_of(&mine), TestVisibilityTier::Student);
        assert_eq!(without_students.tier_of(&mine), TestVisibilityTier::Teacher);

        let hidden = report("org.x.TestTeacherHiddenB", &[("t", TestOutcome::Success)], 0.1);
        assert_eq!(without_students.tier_of(&hidden), TestVisibilityTier::Hidden);
    }

    #[test]
    fn summaries_exist_only_for_tiers_that_ran() {
        let rules = TierRules::new(["TestTeacherA"], Vec::<String>::new());
        let results = aggregate(
            vec![report(
                "org.x.TestTeacherA",
                &[("a", TestOutcome::Success), ("b", TestOutcome::Failure), ("c", TestOutcome::Error)],
                0.5,
            )],
            &rules,
            None,
        );
        let teacher = results
            .summary(TestVisibilityTier::Teacher)
            .expect("teacher summary");
        assert_eq!(teacher.progress(), 1);
        assert!(results.summary(TestVisibilityTier::Hidden).is_none());
        assert!(results.summary(TestVisibilityTier::Student).is_none());
        assert_eq!(results.combined_elapsed(), Some(0.5));
        assert_eq!(
            teacher.to_string(),
            "Tests run: 3, Failures: 1, Errors: 1, Time elapsed: 0.500 sec"
        );
    }

    #[test]
    fn fully_skipped_classes_leave_no_summary() {
        let rules = TierRules::new(["TestTeacherA"], ["TestTeacherHiddenB"]);
        let mut skipped = report("TestTeacherHiddenB", &[], 0.0);
        skipped.skipped = 2;
        let results = aggregate(
            vec![report("TestTeacherA", &[("a", TestOutcome::Success)], 0.2), skipped],
            &rules,
            None,
        );
        assert!(results.summary(TestVisibilityTier::Hidden).is_none());
        assert_eq!(results.summaries().len(), 1);
        assert_eq!(results.reports().len(), 2);
        assert_eq!(results.combined_elapsed(), Some(0.2));
    }

    #[test]
    fn mandatory_counts_only_teacher_tier() {
        let rules = TierRules::new(["TestTeacherA"], ["TestTeacherHiddenB"]);
        let results = aggregate(
            vec![
                report(
                    "TestTeacherA",
                    &[("fuel_MANDATORY", TestOutcome::Success), ("move_MANDATORY", TestOutcome::Failure), ("extra", TestOutcome::Failure)],
                    1.0,
                ),
                report("TestTeacherHiddenB", &[("edge_MANDATORY", TestOutcome::Failure)], 2.0),
            ],
            &rules,
            Some("_MANDATORY"),
        );
        let teacher = results.summary(TestVisibilityTier::Teacher).unwrap();
        assert_eq!((teacher.mandatory_pass, teacher.mandatory_fail), (1, 1));
        let hidden = results.summary(TestVisibilityTier::Hidden).unwrap();
        assert_eq!((hidden.mandatory_pass, hidden.mandatory_fail), (0, 0));
        assert_eq!(results.combined_elapsed(), Some(3.0));
        assert_eq!(
            results.failing_test_names(TestVisibilityTier::Teacher),
            vec!["extra".to_string(), "move_MANDATORY".to_string()]
        );
    }

    #[test]
    fn student_minimum_messages() {
        let results = TestResults::default();
        assert_eq!(
            results.not_enough_student_tests_message(2).as_deref(),
            Some("The submission doesn't include unit tests. The assignment requires a minimum of 2 tests.")
        );

        let rules = TierRules::default();
        let results = aggregate(vec![report("MyTest", &[("a", TestOutcome::Success)], 0.1)], &rules, None);
        assert_eq!(
            results.not_enough_student_tests_message(2).as_deref(),
            Some("The submission only includes 1 unit tests. The assignment requires a minimum of 2 tests.")
        );
        assert!(results.not_enough_student_tests_message(1).is_none());
    }
}
