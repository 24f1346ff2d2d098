#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::{build::ToolchainProfile, config::EvalSettings, report::TierRules};

/// How much of the hidden teacher tests a student may see.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestVisibility {
    /// The indicator is not shown at all.
    HideEverything,
    /// Only OK/NOK is shown.
    ShowOkNok,
    /// OK/NOK plus the number of passing tests.
    ShowProgress,
}

/// Ordering of the assignment leaderboard.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaderboardType {
    /// Most passing teacher tests first.
    #[default]
    TestsOk,
    /// Ties broken by the fastest test run.
    Ellapsed,
    /// Ties broken by the highest line coverage.
    Coverage,
}

/// The grading policy of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
#[serde(default)]
pub struct AssignmentPolicy {
    /// Assignment id.
    pub id: String,
    /// Package of the assignment sources; stack frames outside it are hidden.
    pub package_name: Option<String>,
    /// Toolchain the project is built with.
    pub toolchain: ToolchainProfile,
    /// Whether students ship their own tests.
    pub accepts_student_tests: bool,
    /// Minimum number of student tests.
    pub min_student_tests: Option<u32>,
    /// Whether line coverage of the student tests is computed.
    pub calculate_student_tests_coverage: bool,
    /// Visibility of the hidden-tests indicator to students.
    pub hidden_tests_visibility: Option<TestVisibility>,
    /// Suffix of mandatory teacher test methods.
    pub mandatory_tests_suffix: Option<String>,
    /// Memory budget of the build, in megabytes.
    pub max_memory_mb: Option<u32>,
    /// Minutes a group must wait between submissions.
    pub cooloff_period: Option<i64>,
    /// Leaderboard ordering; `TestsOk` when unset.
    pub leaderboard_type: Option<LeaderboardType>,
    /// Submissions after this instant are overdue.
    pub due_date: Option<DateTime<Utc>>,
    /// Explicit test-class tiers; the naming convention is used when unset.
    pub tier_rules: Option<TierRules>,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        AssignmentPolicy::builder().build()
    }
}

impl AssignmentPolicy {
    /// Returns the leaderboard ordering, defaulting to `TestsOk`.
    pub fn leaderboard(&self) -> LeaderboardType {
        self.leaderboard_type.unwrap_or_default()
    }

    /// Returns the memory budget, falling back to the configured default.
    pub fn effective_max_memory_mb(&self, settings: &EvalSettings) -> u32 {
        self.max_memory_mb
            .unwrap_or(settings.default_max_memory_mb)
    }

    /// Returns the minimum number of student tests (0 when unset).
    pub fn min_student_tests(&self) -> u32 {
        self.min_student_tests.unwrap_or(0)
    }

    /// Returns the mandatory suffix, if a non-empty one is configured.
    pub fn mandatory_suffix(&self) -> Option<&str> {
        self.mandatory_tests_suffix
            .as_deref()
            .filter(|suffix| !suffix.is_empty())
    }

    /// True when a submission made at `submitted_at` is late.
    pub fn is_overdue(&self, submitted_at: DateTime<Utc>) -> bool {
        self.due_date
            .is_some_and(|due| submitted_at > due)
    }

    /// Resolves the tier table for a set of executed test classes.
    pub fn tier_rules_for<'a>(
        &self,
        class_names: impl IntoIterator<Item = &'a str>,
        settings: &EvalSettings,
    ) -> TierRules {
        match &self.tier_rules {
            Some(rules) => rules.clone(),
            None => TierRules::from_prefixes(
                class_names,
                self.accepts_student_tests,
                &settings.teacher_prefix,
                &settings.hidden_prefix,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn policy_reads_partial_json() {
        let policy: AssignmentPolicy = serde_json::from_str(
            r#"{"id":"sample","toolchain":"KOTLIN","accepts_student_tests":true,
                "hidden_tests_visibility":"SHOW_OK_NOK","leaderboard_type":"ELLAPSED"}"#,
        )
        .expect("policy json");
        assert_eq!(policy.toolchain, ToolchainProfile::Kotlin);
        assert_eq!(policy.hidden_tests_visibility, Some(TestVisibility::ShowOkNok));
        assert_eq!(policy.leaderboard(), LeaderboardType::Ellapsed);
        assert_eq!(policy.effective_max_memory_mb(&EvalSettings::default()), 512);

        let limited = AssignmentPolicy::builder().max_memory_mb(Some(1024)).build();
        assert_eq!(limited.effective_max_memory_mb(&EvalSettings::default()), 1024);
    }

    #[test]
    fn overdue_only_after_due_date() {
        let due = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let policy = AssignmentPolicy::builder().due_date(Some(due)).build();
        assert!(!policy.is_overdue(due));
        assert!(policy.is_overdue(due + chrono::Duration::seconds(1)));
        assert!(!AssignmentPolicy::default().is_overdue(due));
    }
}
