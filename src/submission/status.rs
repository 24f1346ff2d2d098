#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{EvalError, InfrastructureFailure};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// Lifecycle state of a submission.
pub enum SubmissionStatus {
    /// Waiting for its build.
    Submitted,
    /// Built and evaluated.
    Validated,
    /// The evaluation failed unexpectedly.
    Failed,
    /// The build ran out of time.
    AbortedByTimeout,
    /// The build printed too much.
    TooMuchOutput,
    /// The code tried something forbidden.
    IllegalAccess,
    /// Being rebuilt in place.
    Rebuilding,
    /// A full-rebuild clone waiting for its build.
    SubmittedForRebuild,
    /// A full-rebuild clone that was built and evaluated.
    ValidatedRebuilt,
    /// Soft-deleted.
    Deleted,
}

impl SubmissionStatus {
    /// Every status.
    pub const ALL: [SubmissionStatus; 10] = [
        SubmissionStatus::Submitted,
        SubmissionStatus::Validated,
        SubmissionStatus::Failed,
        SubmissionStatus::AbortedByTimeout,
        SubmissionStatus::TooMuchOutput,
        SubmissionStatus::IllegalAccess,
        SubmissionStatus::Rebuilding,
        SubmissionStatus::SubmittedForRebuild,
        SubmissionStatus::ValidatedRebuilt,
        SubmissionStatus::Deleted,
    ];

    /// Short code stored with each record.
    pub fn code(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "S",
            SubmissionStatus::Validated => "V",
            SubmissionStatus::Failed => "F",
            SubmissionStatus::AbortedByTimeout => "AT",
            SubmissionStatus::TooMuchOutput => "TO",
            SubmissionStatus::IllegalAccess => "IA",
            SubmissionStatus::Rebuilding => "R",
            SubmissionStatus::SubmittedForRebuild => "SR",
            SubmissionStatus::ValidatedRebuilt => "VR",
            SubmissionStatus::Deleted => "D",
        }
    }

    /// Human description.
    pub fn description(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "Submitted",
            SubmissionStatus::Validated => "Validated",
            SubmissionStatus::Failed => "Failed",
            SubmissionStatus::AbortedByTimeout => "Aborted by timeout",
            SubmissionStatus::TooMuchOutput => "Too much output",
            SubmissionStatus::IllegalAccess => "Illegal Access",
            SubmissionStatus::Rebuilding => "Rebuilding",
            SubmissionStatus::SubmittedForRebuild => "Submitted for rebuild",
            SubmissionStatus::ValidatedRebuilt => "Validated (Rebuilt)",
            SubmissionStatus::Deleted => "Deleted",
        }
    }

    /// True while a build for this submission may still be running.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Submitted
                | SubmissionStatus::SubmittedForRebuild
                | SubmissionStatus::Rebuilding
        )
    }

    /// True for evaluated submissions, the only ones on a leaderboard.
    pub fn is_validated(self) -> bool {
        matches!(self, SubmissionStatus::Validated | SubmissionStatus::ValidatedRebuilt)
    }

    /// Whether the lifecycle allows moving from `self` to `to`.
    pub fn can_transition_to(self, to: SubmissionStatus) -> bool {
        use SubmissionStatus::*;

        let build_failure = matches!(to, Failed | AbortedByTimeout | TooMuchOutput | IllegalAccess);
        match self {
            Deleted => false,
            _ if to == Deleted => true,
            Submitted | Rebuilding => to == Validated || build_failure,
            SubmittedForRebuild => to == ValidatedRebuilt || build_failure,
            Validated | ValidatedRebuilt => to == Rebuilding,
            Failed | AbortedByTimeout | TooMuchOutput | IllegalAccess => false,
        }
    }

    /// Validates a move, returning the new status.
    pub fn transition(self, to: SubmissionStatus) -> Result<SubmissionStatus, EvalError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(EvalError::InvalidTransition { from: self, to })
        }
    }

    /// Entering or leaving an in-place rebuild keeps the status date, so a
    /// rebuild never reorders history.
    pub fn updates_timestamp(from: SubmissionStatus, to: SubmissionStatus) -> bool {
        from != SubmissionStatus::Rebuilding && to != SubmissionStatus::Rebuilding
    }

    /// Status reached when a pending build evaluates successfully.
    pub fn on_success(self) -> SubmissionStatus {
        match self {
            SubmissionStatus::SubmittedForRebuild => SubmissionStatus::ValidatedRebuilt,
            _ => SubmissionStatus::Validated,
        }
    }

    /// Status reached when the evaluation fails. Infrastructure failures get
    /// their own status; everything else is `Failed`.
    pub fn for_failure(err: &EvalError) -> SubmissionStatus {
        match err.infrastructure() {
            Some(InfrastructureFailure::Timeout) => SubmissionStatus::AbortedByTimeout,
            Some(InfrastructureFailure::TooMuchOutput { .. }) => SubmissionStatus::TooMuchOutput,
            Some(InfrastructureFailure::IllegalAccess) => SubmissionStatus::IllegalAccess,
            None => SubmissionStatus::Failed,
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = EvalError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| EvalError::UnknownStatus(code.to_string()))
    }
}

impl Serialize for SubmissionStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}

impl Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::{SubmissionStatus::*, *};

    #[test]
    fn submitted_moves_to_evaluated_or_failure_states() {
        for to in [Validated, Failed, AbortedByTimeout, TooMuchOutput, IllegalAccess, Deleted] {
            assert!(Submitted.can_transition_to(to), "S -> {to}");
        }
        for to in [Submitted, Rebuilding, ValidatedRebuilt, SubmittedForRebuild] {
            assert!(!Submitted.can_transition_to(to), "S -> {to}");
        }
    }

    #[test]
    fn rebuild_paths() {
        assert!(Validated.can_transition_to(Rebuilding));
        assert!(ValidatedRebuilt.can_transition_to(Rebuilding));
        assert!(Rebuilding.can_transition_to(Validated));
        assert!(!Rebuilding.can_transition_to(Submitted));
        assert!(SubmittedForRebuild.can_transition_to(ValidatedRebuilt));
        assert!(!SubmittedForRebuild.can_transition_to(Validated));
        assert!(!Failed.can_transition_to(Rebuilding));
    }

    #[test]
    fn deleted_is_terminal() {
        for to in SubmissionStatus::ALL {
            assert!(matches!(
                Deleted.transition(to),
                Err(EvalError::InvalidTransition { from: Deleted, .. })
            ));
        }
        for from in SubmissionStatus::ALL.into_iter().filter(|s| *s != Deleted) {
            assert_eq!(from.transition(Deleted).unwrap(), Deleted);
        }
    }

    #[test]
    fn rebuilding_keeps_the_status_date() {
        assert!(!SubmissionStatus::updates_timestamp(Validated, Rebuilding));
        assert!(!SubmissionStatus::updates_timestamp(Rebuilding, Validated));
        assert!(SubmissionStatus::updates_timestamp(Submitted, Validated));
    }

    #[test]
    fn failures_map_to_statuses() {
        assert_eq!(
            SubmissionStatus::for_failure(&InfrastructureFailure::Timeout.into()),
            AbortedByTimeout
        );
        assert_eq!(
            SubmissionStatus::for_failure(&EvalError::malformed_report("bad xml")),
            Failed
        );
    }

    #[test]
    fn codes_parse_and_reject_unknown() {
        assert_eq!("VR".parse::<SubmissionStatus>().unwrap(), ValidatedRebuilt);
        assert!(matches!("Z".parse::<SubmissionStatus>(), Err(EvalError::UnknownStatus(_))));
        assert_eq!(serde_json::to_string(&AbortedByTimeout).unwrap(), "\"AT\"");
    }
}
