#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Number of console lines at or above which a build is considered unsafe to
/// parse.
pub const DEFAULT_TOO_MUCH_OUTPUT_THRESHOLD: usize = 30_000;

/// Upper bound, in minutes, of the cooloff applied after a structure or
/// compilation failure.
pub const DEFAULT_COOLOFF_STRUCTURE_MINUTES: i64 = 2;

/// Default memory budget handed to the build executor.
pub const DEFAULT_MAX_MEMORY_MB: u32 = 512;

/// Class-name prefix of public teacher tests.
pub const TEACHER_TEST_PREFIX: &str = "TestTeacher";

/// Class-name prefix of hidden teacher tests.
pub const HIDDEN_TEST_PREFIX: &str = "TestTeacherHidden";

/// Pass rate (in percent) a group needs to take part in submission statistics.
pub const DEFAULT_INCLUSION_THRESHOLD: u32 = 75;

/// Marker the build executor appends when it trims a runaway output.
pub const TRIMMED_OUTPUT_MARKER: &str = "*** Trimmed here by DP ***";

/// Value of a student-tests indicator when too few tests were submitted.
pub const NOT_ENOUGH_TESTS: &str = "Not Enough Tests";

/// Date format used in CSV exports.
pub const CSV_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Maven console conventions shared by both toolchains.
pub mod maven {
    /// Banner that opens javac's error listing.
    pub const COMPILATION_ERROR_BANNER: &str = "[ERROR] COMPILATION ERROR :";
    /// Line printed once a failing build gives up.
    pub const BUILD_FAILURE: &str = "[INFO] BUILD FAILURE";
    /// Prefix of every build-step header.
    pub const STEP_HEADER: &str = "[INFO] --- ";
    /// Prefix of every error line.
    pub const ERROR_PREFIX: &str = "[ERROR] ";
    /// Prefix of continuation lines inside an error listing.
    pub const CONTINUATION_PREFIX: &str = "  ";
    /// Prefix Maven uses when a goal aborts the build.
    pub const FAILED_GOAL_PREFIX: &str = "[ERROR] Failed to execute goal ";
    /// Group id of the core Maven plugins.
    pub const CORE_PLUGIN_GROUP: &str = "org.apache.maven.plugins";
    /// Artifact whose failure means "the code did not compile".
    pub const COMPILER_PLUGIN: &str = "maven-compiler-plugin";
    /// Artifact whose failure means "some tests did not pass".
    pub const SUREFIRE_PLUGIN: &str = "maven-surefire-plugin";
    /// Group id of the Kotlin compiler plugin.
    pub const KOTLIN_PLUGIN_GROUP: &str = "org.jetbrains.kotlin";
    /// Artifact id of the Kotlin compiler plugin.
    pub const KOTLIN_PLUGIN: &str = "kotlin-maven-plugin";
    /// Line closing the error summary of a failed build.
    pub const HELP_FOOTER: &str = "[ERROR] -> [Help 1]";
    /// Checkstyle audit start.
    pub const CHECKSTYLE_START: &str = "[INFO] Starting audit...";
    /// Checkstyle audit end.
    pub const CHECKSTYLE_END: &str = "Audit done.";
    /// Prefix of a checkstyle finding.
    pub const WARN_PREFIX: &str = "[WARN] ";
    /// Step header of the detekt plugin.
    pub const DETEKT_START: &str = "[INFO] --- detekt-maven-plugin";
    /// Line printed once detekt is done.
    pub const DETEKT_END: &str = "detekt finished";
    /// Prefix of a PMD finding.
    pub const PMD_FAILURE: &str = "[INFO] PMD Failure";
    /// Prefix of a stack-trace frame.
    pub const STACK_FRAME: &str = "\tat";
}
