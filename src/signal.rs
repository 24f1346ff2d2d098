#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Signalling of groups that look alike: identical sets of failing teacher
//! tests, or suspiciously few submissions for a high score.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tabled::Tabled;
use tracing::debug;

use crate::{
    constants::DEFAULT_INCLUSION_THRESHOLD,
    eval::Indicator,
    report::TestVisibilityTier,
    submission::SubmissionRecord,
    types::GroupId,
};

/// Failing teacher tests of a group's latest submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFailures {
    /// The group.
    pub group_id:      GroupId,
    /// Failing test method names, in any order.
    pub failing_tests: Vec<String>,
}

impl GroupFailures {
    /// Reads the failing teacher tests of a submission. Submissions that did
    /// not compile carry no signal and give `None`.
    pub fn from_record(record: &SubmissionRecord) -> Option<Self> {
        let evaluation = record.evaluation.as_ref()?;
        if !evaluation
            .indicator(Indicator::Compilation)
            .is_some_and(|c| c.is_ok())
        {
            return None;
        }
        let verdict = evaluation.verdict()?;
        Some(Self {
            group_id:      record.group_id,
            failing_tests: verdict
                .tests()
                .failing_test_names(TestVisibilityTier::Teacher),
        })
    }
}

/// Groups sharing exactly the same failing tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalledGroup {
    /// Member groups, ascending.
    pub groups:       Vec<GroupId>,
    /// The shared failing tests, sorted.
    pub failed_tests: Vec<String>,
}

/// Builds the equivalence classes of identical failing-test sets.
///
/// Order and duplicates within a group's list do not matter. Groups with no
/// failures and classes with a single member are dropped. Classes come out
/// ordered by their smallest group id.
pub fn signalled_groups(inputs: &[GroupFailures]) -> Vec<SignalledGroup> {
    let mut classes: BTreeMap<BTreeSet<&str>, BTreeSet<GroupId>> = BTreeMap::new();
    for input in inputs {
        let fingerprint: BTreeSet<&str> = input
            .failing_tests
            .iter()
            .map(String::as_str)
            .collect();
        if fingerprint.is_empty() {
            continue;
        }
        classes
            .entry(fingerprint)
            .or_default()
            .insert(input.group_id);
    }

    let mut signalled: Vec<SignalledGroup> = classes
        .into_iter()
        .filter(|(_, groups)| groups.len() > 1)
        .map(|(tests, groups)| SignalledGroup {
            groups:       groups.into_iter().collect(),
            failed_tests: tests.into_iter().map(str::to_string).collect(),
        })
        .collect();
    signalled.sort_by_key(|class| class.groups[0]);
    debug!(classes = signalled.len(), "signalled groups computed");
    signalled
}

/// Submission history of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct GroupSubmissionStats {
    /// The group.
    #[tabled(rename = "Group")]
    pub group_id:     GroupId,
    /// Tests passed by its latest submission.
    #[tabled(rename = "Passed tests")]
    pub passed_tests: u32,
    /// How many times it submitted.
    #[tabled(rename = "Submissions")]
    pub submissions:  usize,
}

impl GroupSubmissionStats {
    /// Statistics of a group's latest submission; `None` unless it compiled.
    pub fn from_record(record: &SubmissionRecord, submissions: usize) -> Option<Self> {
        let failures = GroupFailures::from_record(record)?;
        let passed_tests = record
            .evaluation
            .as_ref()
            .and_then(|evaluation| evaluation.teacher_progress())
            .unwrap_or(0);
        Some(Self {
            group_id: failures.group_id,
            passed_tests,
            submissions,
        })
    }
}

/// Submission-count statistics over the groups that pass most tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentStatistics {
    /// Mean submissions per considered group; 0 when none qualified.
    pub average:            f64,
    /// Sample standard deviation; 0 with fewer than two groups.
    pub standard_deviation: f64,
    /// Groups at or above the inclusion threshold.
    pub considered:         Vec<GroupSubmissionStats>,
}

impl AssignmentStatistics {
    /// Fewest submissions still within the norm.
    pub fn threshold(&self) -> f64 {
        self.average - self.standard_deviation
    }

    /// Considered groups that reached their score with fewer submissions than
    /// `average - standard_deviation`.
    pub fn groups_outside_norm(&self) -> Vec<GroupSubmissionStats> {
        let threshold = self.threshold();
        self.considered
            .iter()
            .filter(|stats| (stats.submissions as f64) < threshold)
            .cloned()
            .collect()
    }
}

/// Computes submission statistics over groups passing at least
/// `inclusion_threshold` percent (integer division) of `num_tests`.
pub fn compute_statistics(
    stats: &[GroupSubmissionStats],
    num_tests: u32,
    inclusion_threshold: Option<u32>,
) -> AssignmentStatistics {
    let threshold = inclusion_threshold.unwrap_or(DEFAULT_INCLUSION_THRESHOLD);
    let considered: Vec<GroupSubmissionStats> = if num_tests == 0 {
        Vec::new()
    } else {
        stats
            .iter()
            .filter(|s| s.passed_tests * 100 / num_tests >= threshold)
            .cloned()
            .collect()
    };

    let n = considered.len();
    let average = if n == 0 {
        0.0
    } else {
        considered.iter().map(|s| s.submissions as f64).sum::<f64>() / n as f64
    };
    let standard_deviation = if n > 1 {
        let squares: f64 = considered
            .iter()
            .map(|s| (s.submissions as f64 - average).powi(2))
            .sum();
        (squares / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    AssignmentStatistics {
        average,
        standard_deviation,
        considered,
    }
}
