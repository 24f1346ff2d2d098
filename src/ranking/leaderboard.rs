#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{borrow::Cow, cmp::Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{
    constants::CSV_DATE_FORMAT,
    eval::LeaderboardType,
    submission::SubmissionRecord,
    types::{GroupId, SubmissionId},
};

/// A submission that made it onto the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedSubmission {
    /// The group.
    pub group_id:         GroupId,
    /// The ranked submission.
    pub submission_id:    SubmissionId,
    /// Passing teacher tests.
    pub teacher_progress: u32,
    /// Teacher plus hidden test time, in seconds.
    pub ellapsed:         Option<f64>,
    /// Line coverage percentage.
    pub coverage:         Option<u8>,
    /// Last status change, the final tie-breaker.
    pub status_date:      DateTime<Utc>,
}

impl RankedSubmission {
    /// Reads the ranking data of a submission. Only validated submissions
    /// passing at least one teacher test are eligible.
    pub fn from_record(record: &SubmissionRecord) -> Option<Self> {
        if !record.status.is_validated() {
            return None;
        }
        let evaluation = record.evaluation.as_ref()?;
        let teacher_progress = evaluation.teacher_progress().filter(|p| *p > 0)?;
        let verdict = evaluation.verdict()?;
        Some(Self {
            group_id: record.group_id,
            submission_id: record.id,
            teacher_progress,
            ellapsed: verdict.tests().combined_elapsed(),
            coverage: verdict
                .coverage()
                .map(|c| c.percent_line_coverage),
            status_date: record.status_date,
        })
    }
}

impl Tabled for RankedSubmission {
    const LENGTH: usize = 5;

    fn fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.group_id.to_string()),
            Cow::Owned(self.teacher_progress.to_string()),
            Cow::Owned(self.ellapsed.map(|e| format!("{e:.3}")).unwrap_or_default()),
            Cow::Owned(self.coverage.map(|c| format!("{c}%")).unwrap_or_default()),
            Cow::Owned(self.status_date.format(CSV_DATE_FORMAT).to_string()),
        ]
    }

    fn headers() -> Vec<Cow<'static, str>> {
        vec![
            Cow::Borrowed("Group"),
            Cow::Borrowed("Teacher tests"),
            Cow::Borrowed("Time (s)"),
            Cow::Borrowed("Coverage"),
            Cow::Borrowed("Date"),
        ]
    }
}

/// Ascending, with absent values last.
fn cmp_present_first(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Orders two entries for a leaderboard of the given type.
pub fn compare(kind: LeaderboardType, a: &RankedSubmission, b: &RankedSubmission) -> Ordering {
    let by_progress = b.teacher_progress.cmp(&a.teacher_progress);
    let by_kind = match kind {
        LeaderboardType::TestsOk => Ordering::Equal,
        LeaderboardType::Ellapsed => cmp_present_first(a.ellapsed, b.ellapsed),
        LeaderboardType::Coverage => b
            .coverage
            .unwrap_or(0)
            .cmp(&a.coverage.unwrap_or(0)),
    };
    by_progress
        .then(by_kind)
        .then(a.status_date.cmp(&b.status_date))
}

/// Ranks the eligible submissions, best first.
pub fn leaderboard(records: &[SubmissionRecord], kind: LeaderboardType) -> Vec<RankedSubmission> {
    let mut ranked: Vec<RankedSubmission> = records
        .iter()
        .filter_map(RankedSubmission::from_record)
        .collect();
    ranked.sort_by(|a, b| compare(kind, a, b));
    ranked
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn entry(group_id: GroupId, progress: u32, ellapsed: Option<f64>, coverage: Option<u8>, minute: i64) -> RankedSubmission {
        RankedSubmission {
            group_id,
            submission_id: group_id,
            teacher_progress: progress,
            ellapsed,
            coverage,
            status_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
        }
    }

    fn order(kind: LeaderboardType, mut entries: Vec<RankedSubmission>) -> Vec<GroupId> {
        entries.sort_by(|a, b| compare(kind, a, b));
        entries.into_iter().map(|e| e.group_id).collect()
    }

    #[test]
    fn tests_ok_breaks_ties_by_date() {
        let entries = vec![entry(1, 5, None, None, 3), entry(2, 7, None, None, 9), entry(3, 5, None, None, 1)];
        assert_eq!(order(LeaderboardType::TestsOk, entries), vec![2, 3, 1]);
    }

    #[test]
    fn ellapsed_puts_missing_times_last() {
        let entries = vec![
            entry(1, 5, None, None, 0),
            entry(2, 5, Some(2.5), None, 5),
            entry(3, 5, Some(1.0), None, 9),
            entry(4, 6, None, None, 9),
        ];
        assert_eq!(order(LeaderboardType::Ellapsed, entries), vec![4, 3, 2, 1]);
    }

    #[test]
    fn coverage_treats_missing_as_zero() {
        let entries = vec![
            entry(1, 5, None, None, 0),
            entry(2, 5, None, Some(80), 5),
            entry(3, 5, None, Some(0), 1),
        ];
        assert_eq!(order(LeaderboardType::Coverage, entries), vec![2, 1, 3]);
    }
}
