#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Submission lifecycle: statuses, the ledger and the cooloff rule.

/// Waiting time between submissions
pub mod cooloff;
/// In-memory submission registry
pub mod ledger;
/// Lifecycle states and transitions
pub mod status;

pub use cooloff::next_submission_time;
pub use ledger::{SubmissionLedger, SubmissionRecord};
pub use status::SubmissionStatus;
