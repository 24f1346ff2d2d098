#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Leaderboards and the final-results CSV.

/// CSV export of final submissions
pub mod export;
/// Leaderboard eligibility and ordering
pub mod leaderboard;

pub use export::CsvExport;
pub use leaderboard::{RankedSubmission, leaderboard};
