#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{constants::maven, parsers::parser};

/// The language toolchain an assignment is built with.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ToolchainProfile {
    /// javac + checkstyle through Maven.
    #[default]
    Java,
    /// kotlinc + detekt through Maven.
    Kotlin,
}

impl ToolchainProfile {
    /// Canonical upper-case name used in assignment files.
    pub fn as_str(self) -> &'static str {
        match self {
            ToolchainProfile::Java => "JAVA",
            ToolchainProfile::Kotlin => "KOTLIN",
        }
    }

    /// Name of the source folder under `src/main` and `src/test`.
    pub fn source_folder(self) -> &'static str {
        match self {
            ToolchainProfile::Java => "java",
            ToolchainProfile::Kotlin => "kotlin",
        }
    }

    /// Resolves the sentinel set for this toolchain.
    pub fn sentinels(self) -> Sentinels {
        match self {
            ToolchainProfile::Java => Sentinels {
                profile:            self,
                compile_start:      is_javac_error_banner,
                test_compile_start: None,
                style:              StyleTool::Checkstyle,
            },
            ToolchainProfile::Kotlin => Sentinels {
                profile:            self,
                compile_start:      is_kotlin_compile_step,
                test_compile_start: Some(is_kotlin_test_compile_failure),
                style:              StyleTool::Detekt,
            },
        }
    }
}

impl Serialize for ToolchainProfile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolchainProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.to_ascii_uppercase().as_str() {
            "JAVA" => Ok(ToolchainProfile::Java),
            "KOTLIN" => Ok(ToolchainProfile::Kotlin),
            other => Err(de::Error::custom(format!("Unknown toolchain: {other}"))),
        }
    }
}

impl Display for ToolchainProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which style checker a toolchain runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StyleTool {
    /// `[WARN]` lines between "Starting audit..." and "Audit done.".
    Checkstyle,
    /// Tab-indented findings between the detekt step header and "detekt
    /// finished".
    Detekt,
}

/// Line predicates that open and close each output category. Selected once
/// per toolchain so the parser itself never branches on the language.
#[derive(Copy, Clone, Debug)]
pub struct Sentinels {
    /// Toolchain these sentinels belong to.
    pub profile:            ToolchainProfile,
    /// Opens the compilation-error range.
    pub compile_start:      fn(&str) -> bool,
    /// Opens the test-compilation-error range, when the toolchain reports one
    /// separately.
    pub test_compile_start: Option<fn(&str) -> bool>,
    /// Style checker run by this toolchain.
    pub style:              StyleTool,
}

impl Sentinels {
    /// Closes the compilation-error range.
    pub fn is_compile_end(line: &str) -> bool {
        line.starts_with(maven::BUILD_FAILURE) || line.starts_with(maven::STEP_HEADER)
    }

    /// Closes the test-compilation-error range.
    pub fn is_test_compile_end(line: &str) -> bool {
        line.starts_with(maven::HELP_FOOTER)
    }

    /// Opens the style-check range.
    pub fn is_style_start(&self, line: &str) -> bool {
        match self.style {
            StyleTool::Checkstyle => line.starts_with(maven::CHECKSTYLE_START),
            StyleTool::Detekt => line.starts_with(maven::DETEKT_START),
        }
    }

    /// Closes the style-check range.
    pub fn is_style_end(&self, line: &str) -> bool {
        match self.style {
            StyleTool::Checkstyle => line.starts_with(maven::CHECKSTYLE_END),
            StyleTool::Detekt => line.starts_with(maven::DETEKT_END),
        }
    }
}

/// javac prints a banner before its error listing.
fn is_javac_error_banner(line: &str) -> bool {
    line.starts_with(maven::COMPILATION_ERROR_BANNER)
}

/// kotlinc has no banner; its errors follow the compile step header.
fn is_kotlin_compile_step(line: &str) -> bool {
    parser::step_header(line).is_ok_and(|header| {
        header.plugin == maven::KOTLIN_PLUGIN && header.goal == "compile" && header.has_semver()
    })
}

/// kotlinc test-compile errors are listed after the failed-goal line.
fn is_kotlin_test_compile_failure(line: &str) -> bool {
    parser::failed_goal(line).is_ok_and(|goal| {
        goal.group == maven::KOTLIN_PLUGIN_GROUP
            && goal.artifact == maven::KOTLIN_PLUGIN
            && goal.goal.contains("test-compile")
    })
}

/// A `[INFO] --- plugin:version:goal` build-step header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepHeader {
    /// Plugin artifact (or prefix) name.
    pub plugin:  String,
    /// Plugin version.
    pub version: String,
    /// Goal being executed.
    pub goal:    String,
}

impl StepHeader {
    /// True when the version reads `major.minor.patch`.
    pub fn has_semver(&self) -> bool {
        let parts: Vec<&str> = self.version.split('.').collect();
        parts.len() == 3
            && parts
                .iter()
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
    }
}

/// A `[ERROR] Failed to execute goal group:artifact:version:goal` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedGoal {
    /// Plugin group id.
    pub group:    String,
    /// Plugin artifact id.
    pub artifact: String,
    /// Goal that failed, empty when Maven did not print one.
    pub goal:     String,
}

impl FailedGoal {
    /// Splits `group:artifact[:version]:goal` coordinates.
    pub fn from_coordinates(coordinates: &str) -> Result<Self, &'static str> {
        let parts: Vec<&str> = coordinates.split(':').collect();
        if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err("group:artifact coordinates");
        }
        let goal = if parts.len() >= 3 {
            parts[parts.len() - 1]
        } else {
            ""
        };
        Ok(FailedGoal {
            group:    parts[0].to_string(),
            artifact: parts[1].to_string(),
            goal:     goal.to_string(),
        })
    }

    /// True for the goals whose failure is an expected, classified outcome
    /// (the code did not compile, or some tests failed).
    pub fn is_expected(&self) -> bool {
        self.artifact == maven::COMPILER_PLUGIN || self.artifact == maven::SUREFIRE_PLUGIN
    }
}
