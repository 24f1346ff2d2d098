#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Reading Maven console output.

/// Translation of detekt rule ids
pub mod detekt;
/// Classified findings
pub mod diagnostic;
/// The sentinel-driven console parser
pub mod output;
/// Per-toolchain sentinel sets
pub mod toolchain;

use serde::{Deserialize, Serialize};

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use output::{CheckCategory, OutputParser, ParsedOutput};
pub use toolchain::{Sentinels, ToolchainProfile};

/// The console lines of one build invocation. Never modified once captured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawBuildOutput {
    /// Lines in the order the build printed them.
    lines: Vec<String>,
}

impl RawBuildOutput {
    /// Wraps already-split lines.
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Splits captured text into lines.
    pub fn from_text(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    /// Returns the lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of captured lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the build printed nothing.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<Vec<String>> for RawBuildOutput {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}
