#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Identifier of a project group.
pub type GroupId = u64;

/// Identifier of a submission record.
pub type SubmissionId = u64;

/// Represents a source location identified by file name, line number and
/// (when the tool prints one) column.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SourceLocation {
    /// The file the diagnostic points at, as printed by the tool.
    pub file:   String,
    /// The line number within the file.
    pub line:   u32,
    /// The column within the line.
    pub column: Option<u32>,
}

impl SourceLocation {
    /// Returns the file name for this location, without directories.
    pub fn file_name(&self) -> &str {
        self.file
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.file.as_str())
    }
}

impl Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.column {
            Some(column) => write!(f, "{}:{}:{}", self.file, self.line, column),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// A member of a project group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Author {
    /// Login of the student.
    pub user_id: String,
    /// Display name of the student.
    pub name:    String,
}

/// A group of students submitting together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct ProjectGroup {
    /// Group id.
    pub id:      GroupId,
    /// Members, in registration order.
    #[builder(default)]
    pub authors: Vec<Author>,
}
