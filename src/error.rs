#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use crate::submission::status::SubmissionStatus;

/// Failures of the build infrastructure itself. None of these produce a
/// verdict; the submission jumps straight to the matching terminal status.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InfrastructureFailure {
    /// The executor exceeded its wall-clock budget.
    #[error("the build exceeded its time budget")]
    Timeout,
    /// The build printed at least the configured number of lines.
    #[error("the build produced too much output ({lines} lines)")]
    TooMuchOutput {
        /// number of console lines the executor captured
        lines: usize,
    },
    /// Submitted code tripped a disallowed-operation guard.
    #[error("the submission attempted a disallowed operation")]
    IllegalAccess,
}

/// Every error the evaluation library reports.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// The build could not be evaluated at all.
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureFailure),
    /// A surefire test report could not be parsed.
    #[error("malformed test report: {reason}")]
    MalformedReport {
        /// what the parser expected
        reason: String,
    },
    /// A JaCoCo coverage report could not be parsed.
    #[error("malformed coverage report: {reason}")]
    MalformedCoverage {
        /// what the parser expected
        reason: String,
    },
    /// A lifecycle move that the state machine forbids.
    #[error("cannot move a submission from {from} to {to}")]
    InvalidTransition {
        /// current status
        from: SubmissionStatus,
        /// requested status
        to:   SubmissionStatus,
    },
    /// Another submission of the same group is still waiting for its build.
    #[error("group {group} already has a pending submission for assignment {assignment}")]
    SubmissionPending {
        /// group id
        group:      u64,
        /// assignment id
        assignment: String,
    },
    /// No submission is registered under this id.
    #[error("unknown submission: {0}")]
    UnknownSubmission(u64),
    /// A status code that does not name any lifecycle state.
    #[error("unknown submission status code: {0}")]
    UnknownStatus(String),
    /// An indicator code that does not name any indicator.
    #[error("unknown indicator code: {0}")]
    UnknownIndicator(String),
}

impl EvalError {
    /// Builds a [`EvalError::MalformedReport`].
    pub fn malformed_report(reason: impl Into<String>) -> Self {
        EvalError::MalformedReport {
            reason: reason.into(),
        }
    }

    /// Builds a [`EvalError::MalformedCoverage`].
    pub fn malformed_coverage(reason: impl Into<String>) -> Self {
        EvalError::MalformedCoverage {
            reason: reason.into(),
        }
    }

    /// Returns the infrastructure failure wrapped by this error, if any.
    pub fn infrastructure(&self) -> Option<&InfrastructureFailure> {
        match self {
            EvalError::Infrastructure(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_failures_convert_transparently() {
        let err: EvalError = InfrastructureFailure::TooMuchOutput { lines: 30_001 }.into();
        assert_eq!(err.to_string(), "the build produced too much output (30001 lines)");
        assert_eq!(
            err.infrastructure(),
            Some(&InfrastructureFailure::TooMuchOutput { lines: 30_001 })
        );
    }

    #[test]
    fn transition_errors_name_both_states() {
        let err = EvalError::InvalidTransition {
            from: SubmissionStatus::Deleted,
            to:   SubmissionStatus::Validated,
        };
        assert_eq!(err.to_string(), "cannot move a submission from Deleted to Validated");
        assert!(err.infrastructure().is_none());
    }
}
