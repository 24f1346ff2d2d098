#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::{DateTime, Duration, Utc};

use super::ledger::SubmissionRecord;
use crate::eval::{Indicator, IndicatorRecord, IndicatorValue};

/// Minutes to wait after `indicators`. A broken structure or a failed compile
/// gets the shorter of the two periods.
fn cooloff_minutes(indicators: &[IndicatorRecord], policy_minutes: i64, structure_minutes: i64) -> i64 {
    let broken = indicators.iter().any(|record| {
        matches!(record.indicator, Indicator::ProjectStructure | Indicator::Compilation)
            && record.value == IndicatorValue::Nok
    });
    if broken {
        policy_minutes.min(structure_minutes)
    } else {
        policy_minutes
    }
}

/// Returns when the group may submit again, or `None` if it already may.
///
/// `policy_minutes` is the assignment's cooloff period; without one there is
/// never a wait. Elapsed time is counted in whole minutes.
pub fn next_submission_time(
    last: &SubmissionRecord,
    policy_minutes: Option<i64>,
    structure_minutes: i64,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let policy_minutes = policy_minutes?;
    let indicators = last
        .evaluation
        .as_ref()
        .map(|evaluation| evaluation.indicators())
        .unwrap_or_default();
    let cooloff = cooloff_minutes(indicators, policy_minutes, structure_minutes);

    let elapsed = (now - last.submission_date).num_minutes();
    if elapsed < cooloff {
        Some(last.submission_date + Duration::minutes(cooloff))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn nok(indicator: Indicator) -> IndicatorRecord {
        IndicatorRecord::new(indicator, IndicatorValue::Nok)
    }

    #[test]
    fn broken_builds_wait_less() {
        assert_eq!(cooloff_minutes(&[nok(Indicator::Compilation)], 10, 2), 2);
        assert_eq!(cooloff_minutes(&[nok(Indicator::ProjectStructure)], 1, 2), 1);
        assert_eq!(cooloff_minutes(&[nok(Indicator::TeacherUnitTests)], 10, 2), 10);
        assert_eq!(cooloff_minutes(&[], 10, 2), 10);
    }

    #[test]
    fn no_policy_means_no_wait() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let record = SubmissionRecord {
            id:              1,
            group_id:        1,
            assignment_id:   "sample".into(),
            submitter_id:    "s".into(),
            status:          crate::submission::SubmissionStatus::Failed,
            submission_date: now,
            status_date:     now,
            evaluation:      None,
            failure_reason:  None,
            rebuild_of:      None,
            marked_as_final: false,
        };
        assert_eq!(next_submission_time(&record, None, 2, now), None);
        assert_eq!(
            next_submission_time(&record, Some(10), 2, now + Duration::minutes(3)),
            Some(now + Duration::minutes(10))
        );
        assert_eq!(next_submission_time(&record, Some(10), 2, now + Duration::minutes(10)), None);
    }
}
