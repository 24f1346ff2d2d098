#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    borrow::Cow,
    fmt::{self, Display},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use tabled::Tabled;
use typed_builder::TypedBuilder;

use crate::{parsers::parser, types::SourceLocation};

#[derive(Serialize, Deserialize, TypedBuilder, Clone, Debug, PartialEq, Eq)]
#[builder(field_defaults(setter(into)))]
#[builder(doc)]
/// One classified finding extracted from the build output
pub struct Diagnostic {
    /// * `kind`: which check produced the finding
    kind:     DiagnosticKind,
    /// * `message`: the line as shown to students, path prefixes removed
    message:  String,
    /// * `location`: where the finding points, when the message names a file
    #[builder(default)]
    location: Option<SourceLocation>,
}

impl Diagnostic {
    /// Builds a diagnostic and extracts its source location from the message.
    pub fn classify(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let location = locate(&message);
        Diagnostic {
            kind,
            message,
            location,
        }
    }

    /// Returns the diagnostic kind.
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    /// Returns the diagnostic message.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Returns the source location, if the message carried one.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

impl Tabled for Diagnostic {
    const LENGTH: usize = 3;

    fn fields(&self) -> Vec<Cow<'_, str>> {
        let file = match &self.location {
            Some(loc) => format!("{}:{}", loc.file_name(), loc.line),
            None => String::new(),
        };
        vec![
            Cow::Owned(self.kind.to_string()),
            Cow::Owned(file),
            Cow::Borrowed(self.message.as_str()),
        ]
    }

    fn headers() -> Vec<Cow<'static, str>> {
        vec![Cow::Borrowed("Kind"), Cow::Borrowed("File"), Cow::Borrowed("Message")]
    }
}

/// Finds the first `File.ext` + position reference in a message.
pub fn locate(message: &str) -> Option<SourceLocation> {
    let mut previous: Option<char> = None;
    for (idx, ch) in message.char_indices() {
        let boundary = previous.is_none_or(|p| !is_path_char(p));
        if boundary
            && is_path_char(ch)
            && let Ok(location) = parser::source_location(&message[idx..])
        {
            return Some(location);
        }
        previous = Some(ch);
    }
    None
}

/// Characters the grammar accepts inside a source path.
fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '\\' | '_' | '-' | '$' | '.')
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
/// Category of a diagnostic.
pub enum DiagnosticKind {
    /// javac/kotlinc error, main or test sources.
    CompilationError,
    /// checkstyle or detekt finding.
    StyleWarning,
    /// PMD rule violation.
    StaticAnalysisFailure,
}

impl DiagnosticKind {
    /// Canonical upper-case name used in serialized verdicts.
    fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::CompilationError => "COMPILATION_ERROR",
            DiagnosticKind::StyleWarning => "STYLE_WARNING",
            DiagnosticKind::StaticAnalysisFailure => "STATIC_ANALYSIS_FAILURE",
        }
    }

    /// True for findings that count against code quality.
    pub fn is_quality(self) -> bool {
        matches!(self, DiagnosticKind::StyleWarning | DiagnosticKind::StaticAnalysisFailure)
    }
}

impl Serialize for DiagnosticKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiagnosticKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.as_str() {
            "COMPILATION_ERROR" => Ok(DiagnosticKind::CompilationError),
            "STYLE_WARNING" => Ok(DiagnosticKind::StyleWarning),
            "STATIC_ANALYSIS_FAILURE" => Ok(DiagnosticKind::StaticAnalysisFailure),
            other => Err(de::Error::custom(format!("Unknown diagnostic kind: {other}"))),
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
