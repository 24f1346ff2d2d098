#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::BTreeMap;

use itertools::Itertools;
use tracing::warn;
use typed_builder::TypedBuilder;

use crate::{
    constants::CSV_DATE_FORMAT,
    eval::{AssignmentPolicy, Indicator},
    report::{TestSummary, TestVisibilityTier},
    submission::{SubmissionRecord, SubmissionStatus},
    types::{GroupId, ProjectGroup},
};

/// Columns every export starts with.
const FIXED_HEADERS: [&str; 6] = [
    "submission id",
    "student id",
    "student name",
    "project structure",
    "compilation",
    "code quality",
];

/// Rounds up to two decimals, ignoring binary noise below a millionth of a
/// cent.
fn round_up_cents(seconds: f64) -> f64 {
    let cents = (seconds * 100.0 * 1e6).round() / 1e6;
    cents.ceil() / 100.0
}

/// CSV export of the final submissions of one assignment.
#[derive(TypedBuilder)]
#[builder(doc)]
pub struct CsvExport<'a> {
    /// Grading policy of the assignment.
    policy:           &'a AssignmentPolicy,
    /// Every submission to the assignment; finals are picked from these and
    /// the rest only count towards `# submissions`.
    submissions:      &'a [SubmissionRecord],
    /// Groups and their authors.
    groups:           &'a [ProjectGroup],
    /// Whether to add the `ellapsed` column.
    #[builder(default = true)]
    include_ellapsed: bool,
}

impl CsvExport<'_> {
    /// Final, non-deleted submissions by id, one per group. A group with
    /// several finals keeps the one with the latest status date.
    fn finals(&self) -> Vec<&SubmissionRecord> {
        let mut per_group: BTreeMap<GroupId, &SubmissionRecord> = BTreeMap::new();
        for record in self
            .submissions
            .iter()
            .filter(|r| r.marked_as_final && r.status != SubmissionStatus::Deleted)
        {
            per_group
                .entry(record.group_id)
                .and_modify(|best| {
                    if (record.status_date, record.id) > (best.status_date, best.id) {
                        *best = record;
                    }
                })
                .or_insert(record);
        }
        per_group
            .into_values()
            .sorted_by_key(|r| r.id)
            .collect()
    }

    /// True when some final submission ran tests of `tier`.
    fn any_has_tier(&self, tier: TestVisibilityTier) -> bool {
        self.finals()
            .into_iter()
            .any(|r| summary_of(r, tier).is_some())
    }

    /// The header row.
    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = FIXED_HEADERS.to_vec();
        if self.policy.accepts_student_tests {
            headers.push("student tests");
        }
        if self.any_has_tier(TestVisibilityTier::Teacher) {
            headers.push("teacher tests");
        }
        if self.any_has_tier(TestVisibilityTier::Hidden) {
            headers.push("hidden tests");
        }
        if self.policy.calculate_student_tests_coverage {
            headers.push("coverage");
        }
        if self.include_ellapsed {
            headers.push("ellapsed");
        }
        headers.push("submission date");
        headers.push("# submissions");
        if self.policy.mandatory_suffix().is_some() {
            headers.push("# mandatory");
        }
        headers.push("overdue");
        headers
    }

    /// One row per author of each final submission.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let groups: BTreeMap<GroupId, &ProjectGroup> = self
            .groups
            .iter()
            .map(|g| (g.id, g))
            .collect();
        let with_teacher = self.any_has_tier(TestVisibilityTier::Teacher);
        let with_hidden = self.any_has_tier(TestVisibilityTier::Hidden);

        let mut rows = Vec::new();
        for record in self.finals() {
            let Some(group) = groups.get(&record.group_id) else {
                warn!(group = record.group_id, "final submission of an unknown group skipped");
                continue;
            };

            let mut shared = Vec::new();
            for indicator in [Indicator::ProjectStructure, Indicator::Compilation, Indicator::CodeQuality] {
                shared.push(indicator_cell(record, indicator));
            }
            if self.policy.accepts_student_tests {
                shared.push(progress_cell(record, TestVisibilityTier::Student));
            }
            if with_teacher {
                shared.push(progress_cell(record, TestVisibilityTier::Teacher));
            }
            if with_hidden {
                shared.push(progress_cell(record, TestVisibilityTier::Hidden));
            }
            if self.policy.calculate_student_tests_coverage {
                shared.push(
                    record
                        .evaluation
                        .as_ref()
                        .and_then(|e| e.verdict())
                        .and_then(|v| v.coverage())
                        .map(|c| c.percent_line_coverage.to_string())
                        .unwrap_or_default(),
                );
            }
            if self.include_ellapsed {
                shared.push(
                    record
                        .evaluation
                        .as_ref()
                        .and_then(|e| e.verdict())
                        .and_then(|v| v.tests().combined_elapsed())
                        .map(|e| format!("{:.2}", round_up_cents(e)))
                        .unwrap_or_default(),
                );
            }
            shared.push(
                record
                    .submission_date
                    .format(CSV_DATE_FORMAT)
                    .to_string(),
            );

            for author in &group.authors {
                let mut row = vec![group.id.to_string(), author.user_id.clone(), author.name.clone()];
                row.extend(shared.iter().cloned());
                row.push(self.submissions_by(&author.user_id).to_string());
                if self.policy.mandatory_suffix().is_some() {
                    let mandatory = summary_of(record, TestVisibilityTier::Teacher)
                        .map_or(0, |s| s.mandatory_pass);
                    row.push(mandatory.to_string());
                }
                row.push(
                    self.policy
                        .is_overdue(record.submission_date)
                        .to_string(),
                );
                rows.push(row);
            }
        }
        rows
    }

    /// Non-deleted submissions uploaded by one student.
    fn submissions_by(&self, user_id: &str) -> usize {
        self.submissions
            .iter()
            .filter(|r| r.submitter_id == user_id && r.status != SubmissionStatus::Deleted)
            .count()
    }

    /// The whole file, `;`-separated and newline-terminated.
    pub fn render(&self) -> String {
        let mut out = self.headers().join(";");
        out.push('\n');
        for row in self.rows() {
            out.push_str(&row.join(";"));
            out.push('\n');
        }
        out
    }
}

/// Summary of one tier of a submission's verdict.
fn summary_of(record: &SubmissionRecord, tier: TestVisibilityTier) -> Option<&TestSummary> {
    record
        .evaluation
        .as_ref()
        .and_then(|e| e.verdict())
        .and_then(|v| v.summary(tier))
}

/// An indicator's value, empty when it was not produced.
fn indicator_cell(record: &SubmissionRecord, indicator: Indicator) -> String {
    record
        .evaluation
        .as_ref()
        .and_then(|e| e.indicator(indicator))
        .map(|r| r.value.as_str().to_string())
        .unwrap_or_default()
}

/// Passing tests of a tier, empty when it did not run.
fn progress_cell(record: &SubmissionRecord, tier: TestVisibilityTier) -> String {
    summary_of(record, tier)
        .map(|s| s.progress().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellapsed_rounds_up() {
        assert_eq!(format!("{:.2}", round_up_cents(0.1)), "0.10");
        assert_eq!(format!("{:.2}", round_up_cents(0.101)), "0.11");
        assert_eq!(format!("{:.2}", round_up_cents(1.0)), "1.00");
        assert_eq!(format!("{:.2}", round_up_cents(2.345)), "2.35");
    }
}
