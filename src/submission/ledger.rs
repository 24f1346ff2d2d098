#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::status::SubmissionStatus;
use crate::{
    error::EvalError,
    eval::Evaluation,
    types::{GroupId, SubmissionId},
};

/// One submission of a group to an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Record id.
    pub id:              SubmissionId,
    /// Submitting group.
    pub group_id:        GroupId,
    /// Target assignment.
    pub assignment_id:   String,
    /// Login of the student who uploaded.
    pub submitter_id:    String,
    /// Lifecycle state.
    pub status:          SubmissionStatus,
    /// When the code was submitted. Rebuild clones keep the original's date.
    pub submission_date: DateTime<Utc>,
    /// When the status last changed.
    pub status_date:     DateTime<Utc>,
    /// The evaluation, once the build succeeded.
    pub evaluation:      Option<Evaluation>,
    /// Why the evaluation failed, if it did.
    pub failure_reason:  Option<String>,
    /// The submission this one is a full rebuild of.
    pub rebuild_of:      Option<SubmissionId>,
    /// Chosen by the group as the one to grade.
    pub marked_as_final: bool,
}

impl SubmissionRecord {
    /// True when the record is for `group` and `assignment`.
    fn belongs_to(&self, group: GroupId, assignment: &str) -> bool {
        self.group_id == group && self.assignment_id == assignment
    }
}

/// Mutable state behind the ledger lock.
#[derive(Debug, Default)]
struct LedgerState {
    /// Next id handed out.
    next_id: SubmissionId,
    /// All records, by id.
    records: BTreeMap<SubmissionId, SubmissionRecord>,
}

impl LedgerState {
    /// Looks up a record for modification.
    fn record_mut(&mut self, id: SubmissionId) -> Result<&mut SubmissionRecord, EvalError> {
        self.records
            .get_mut(&id)
            .ok_or(EvalError::UnknownSubmission(id))
    }

    /// Refuses to start a build while another one for the pair is pending.
    fn ensure_nothing_pending(&self, group: GroupId, assignment: &str) -> Result<(), EvalError> {
        let pending = self
            .records
            .values()
            .any(|r| r.belongs_to(group, assignment) && r.status.is_pending());
        if pending {
            warn!(group, assignment, "submission rejected: another one is pending");
            return Err(EvalError::SubmissionPending {
                group,
                assignment: assignment.to_string(),
            });
        }
        Ok(())
    }

    /// Stores a new record and returns its id.
    fn insert(&mut self, mut record: SubmissionRecord) -> SubmissionId {
        self.next_id += 1;
        record.id = self.next_id;
        self.records.insert(record.id, record);
        self.next_id
    }
}

/// Moves `record` to `to`, touching the status date when the lifecycle asks
/// for it.
fn apply_transition(
    record: &mut SubmissionRecord,
    to: SubmissionStatus,
    now: DateTime<Utc>,
) -> Result<(), EvalError> {
    let from = record.status;
    record.status = from.transition(to)?;
    if SubmissionStatus::updates_timestamp(from, to) {
        record.status_date = now;
    }
    Ok(())
}

/// In-memory registry of submissions.
///
/// Every state change goes through one lock, so the pending check and the
/// insert it guards happen atomically.
#[derive(Debug, Default)]
pub struct SubmissionLedger {
    /// Records and id counter.
    state: Mutex<LedgerState>,
}

impl SubmissionLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a ledger from previously saved records. New ids continue
    /// after the largest one seen.
    ///
    /// When several records of one group and assignment are marked as final,
    /// only the one with the latest status date (then the highest id) keeps
    /// the flag. Deleted records never keep it.
    pub fn from_records(records: impl IntoIterator<Item = SubmissionRecord>) -> Self {
        let mut records: BTreeMap<SubmissionId, SubmissionRecord> = records
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut kept: BTreeMap<(GroupId, String), (DateTime<Utc>, SubmissionId)> = BTreeMap::new();
        for record in records.values_mut() {
            if record.status == SubmissionStatus::Deleted {
                record.marked_as_final = false;
            }
            if record.marked_as_final {
                let key = (record.group_id, record.assignment_id.clone());
                let candidate = (record.status_date, record.id);
                kept.entry(key)
                    .and_modify(|best| *best = (*best).max(candidate))
                    .or_insert(candidate);
            }
        }
        for record in records.values_mut().filter(|r| r.marked_as_final) {
            let key = (record.group_id, record.assignment_id.clone());
            if let Some(&(_, winner)) = kept.get(&key)
                && winner != record.id
            {
                warn!(
                    id = record.id,
                    final_id = winner,
                    group = record.group_id,
                    "dropping duplicate final submission"
                );
                record.marked_as_final = false;
            }
        }

        let next_id = records.keys().next_back().copied().unwrap_or(0);
        Self {
            state: Mutex::new(LedgerState { next_id, records }),
        }
    }

    /// Locks the state.
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().expect("submission ledger poisoned")
    }

    /// Registers a new submission in `Submitted`.
    pub fn submit(
        &self,
        group: GroupId,
        assignment: &str,
        submitter: &str,
        now: DateTime<Utc>,
    ) -> Result<SubmissionId, EvalError> {
        let mut state = self.lock();
        state.ensure_nothing_pending(group, assignment)?;
        let id = state.insert(SubmissionRecord {
            id:              0,
            group_id:        group,
            assignment_id:   assignment.to_string(),
            submitter_id:    submitter.to_string(),
            status:          SubmissionStatus::Submitted,
            submission_date: now,
            status_date:     now,
            evaluation:      None,
            failure_reason:  None,
            rebuild_of:      None,
            marked_as_final: false,
        });
        info!(id, group, assignment, "submission registered");
        Ok(id)
    }

    /// Applies the outcome of a build to a pending submission.
    pub fn record_evaluation(
        &self,
        id: SubmissionId,
        outcome: Result<Evaluation, EvalError>,
        now: DateTime<Utc>,
    ) -> Result<SubmissionStatus, EvalError> {
        let mut state = self.lock();
        let record = state.record_mut(id)?;
        if !record.status.is_pending() {
            return Err(EvalError::InvalidTransition {
                from: record.status,
                to:   record.status.on_success(),
            });
        }

        match outcome {
            Ok(evaluation) => {
                let target = record.status.on_success();
                apply_transition(record, target, now)?;
                record.evaluation = Some(evaluation);
                record.failure_reason = None;
            }
            Err(err) => {
                apply_transition(record, SubmissionStatus::for_failure(&err), now)?;
                warn!(id, status = %record.status, "build not evaluated: {err}");
                record.evaluation = None;
                record.failure_reason = Some(err.to_string());
            }
        }
        Ok(record.status)
    }

    /// Puts a validated submission back into `Rebuilding`, in place.
    pub fn start_rebuild(&self, id: SubmissionId, now: DateTime<Utc>) -> Result<(), EvalError> {
        let mut state = self.lock();
        let (group, assignment) = {
            let record = state
                .records
                .get(&id)
                .ok_or(EvalError::UnknownSubmission(id))?;
            record.status.transition(SubmissionStatus::Rebuilding)?;
            (record.group_id, record.assignment_id.clone())
        };
        state.ensure_nothing_pending(group, &assignment)?;
        apply_transition(state.record_mut(id)?, SubmissionStatus::Rebuilding, now)
    }

    /// Clones a submission into a new `SubmittedForRebuild` record that keeps
    /// the original's submission date. The original is left untouched.
    pub fn rebuild_full(&self, id: SubmissionId, now: DateTime<Utc>) -> Result<SubmissionId, EvalError> {
        let mut state = self.lock();
        let original = state
            .records
            .get(&id)
            .cloned()
            .ok_or(EvalError::UnknownSubmission(id))?;
        if original.status == SubmissionStatus::Deleted {
            return Err(EvalError::InvalidTransition {
                from: SubmissionStatus::Deleted,
                to:   SubmissionStatus::SubmittedForRebuild,
            });
        }
        state.ensure_nothing_pending(original.group_id, &original.assignment_id)?;

        let clone_id = state.insert(SubmissionRecord {
            status: SubmissionStatus::SubmittedForRebuild,
            status_date: now,
            evaluation: None,
            failure_reason: None,
            rebuild_of: Some(id),
            marked_as_final: false,
            ..original
        });
        info!(id = clone_id, rebuild_of = id, "full rebuild registered");
        Ok(clone_id)
    }

    /// Soft-deletes a submission. A deleted submission is never final.
    pub fn delete(&self, id: SubmissionId, now: DateTime<Utc>) -> Result<(), EvalError> {
        let mut state = self.lock();
        let record = state.record_mut(id)?;
        apply_transition(record, SubmissionStatus::Deleted, now)?;
        record.marked_as_final = false;
        Ok(())
    }

    /// Marks a submission as the group's final one, clearing the flag on every
    /// other submission of the same group to the same assignment. Deleted
    /// submissions cannot be chosen.
    pub fn mark_as_final(&self, id: SubmissionId) -> Result<(), EvalError> {
        let mut state = self.lock();
        let (group, assignment) = {
            let record = state
                .records
                .get(&id)
                .ok_or(EvalError::UnknownSubmission(id))?;
            if record.status == SubmissionStatus::Deleted {
                return Err(EvalError::UnknownSubmission(id));
            }
            (record.group_id, record.assignment_id.clone())
        };
        for record in state.records.values_mut() {
            if record.belongs_to(group, &assignment) {
                record.marked_as_final = record.id == id;
            }
        }
        Ok(())
    }

    /// Returns a copy of a record.
    pub fn get(&self, id: SubmissionId) -> Result<SubmissionRecord, EvalError> {
        self.lock()
            .records
            .get(&id)
            .cloned()
            .ok_or(EvalError::UnknownSubmission(id))
    }

    /// Non-deleted submissions to an assignment, by id.
    pub fn records(&self, assignment: &str) -> Vec<SubmissionRecord> {
        self.lock()
            .records
            .values()
            .filter(|r| r.assignment_id == assignment && r.status != SubmissionStatus::Deleted)
            .cloned()
            .collect()
    }

    /// The submission that represents each group, ordered by group id: the
    /// final one if marked, otherwise the most recent by submission date and
    /// then status date.
    pub fn latest_per_group(&self, assignment: &str) -> Vec<SubmissionRecord> {
        let mut by_group: BTreeMap<GroupId, Vec<SubmissionRecord>> = BTreeMap::new();
        for record in self.records(assignment) {
            by_group
                .entry(record.group_id)
                .or_default()
                .push(record);
        }

        by_group
            .into_values()
            .filter_map(|mut records| {
                records.sort_by(|a, b| {
                    b.submission_date
                        .cmp(&a.submission_date)
                        .then(b.status_date.cmp(&a.status_date))
                });
                match records.iter().position(|r| r.marked_as_final) {
                    Some(index) => Some(records.swap_remove(index)),
                    None => records.into_iter().next(),
                }
            })
            .collect()
    }

    /// Non-deleted submissions of a group to an assignment.
    pub fn submission_count(&self, group: GroupId, assignment: &str) -> usize {
        self.lock()
            .records
            .values()
            .filter(|r| r.belongs_to(group, assignment) && r.status != SubmissionStatus::Deleted)
            .count()
    }

    /// Non-deleted submissions uploaded by one student to an assignment.
    pub fn submissions_by_author(&self, assignment: &str, user_id: &str) -> usize {
        self.lock()
            .records
            .values()
            .filter(|r| {
                r.assignment_id == assignment
                    && r.submitter_id == user_id
                    && r.status != SubmissionStatus::Deleted
            })
            .count()
    }
}
