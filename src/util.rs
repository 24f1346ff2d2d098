#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::future::try_join_all;
use glob::glob;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    build::RawBuildOutput,
    eval::{AssignmentPolicy, BuildArtifacts, BuildExecution, Evaluation, EvaluationPipeline},
    submission::{SubmissionRecord, SubmissionStatus},
    types::ProjectGroup,
};

/// Console log of the build inside an artifacts directory.
pub const BUILD_OUTPUT_FILE: &str = "build-output.txt";
/// Executor flags inside an artifacts directory.
pub const EXECUTION_FILE: &str = "execution.json";
/// Structure problems found before building, one per line.
pub const STRUCTURE_ERRORS_FILE: &str = "structure-errors.txt";

/// Flags the build executor writes next to the console log.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionFlags {
    /// The run exceeded its wall-clock budget.
    pub timed_out:          bool,
    /// Submitted code tripped the security guard.
    pub security_violation: bool,
}

/// Everything known about one assignment: its policy, its groups and their
/// submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentSnapshot {
    /// The grading policy.
    pub policy:      AssignmentPolicy,
    /// Groups and their authors.
    #[serde(default)]
    pub groups:      Vec<ProjectGroup>,
    /// All submissions to the assignment.
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
}

/// Finds files named like `file_pattern` below `root_dir`, sorted by path.
///
/// * `file_pattern`: a glob for the file name, e.g. `TEST-*.xml`
/// * `search_depth`: how many `**` segments precede the file pattern
/// * `root_dir`: the root directory where search starts
pub fn find_files(file_pattern: &str, search_depth: i8, root_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pattern = root_dir.to_path_buf();

    for _ in 0..search_depth {
        pattern.push("**");
    }

    pattern.push(file_pattern);
    let pattern = pattern
        .to_str()
        .context("Could not convert root_dir to string")?
        .to_string();

    let mut files: Vec<PathBuf> = glob(&pattern)
        .context("Could not create glob")?
        .filter_map(Result::ok)
        .collect();
    files.sort();
    files.dedup();
    Ok(files)
}

/// Reads every file concurrently, keeping the input order.
pub async fn read_all(paths: Vec<PathBuf>) -> Result<Vec<String>> {
    let handles = paths
        .into_iter()
        .map(|path| {
            tokio::spawn(async move {
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Could not read {}", path.display()))
            })
        })
        .collect::<Vec<_>>();

    try_join_all(handles)
        .await
        .context("A file reader task panicked")?
        .into_iter()
        .collect()
}

/// Reads and deserializes a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Could not parse {}", path.display()))
}

/// Reads an optional file, `None` when it does not exist.
async fn read_optional(path: &Path) -> Result<Option<String>> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => tokio::fs::read_to_string(path)
            .await
            .map(Some)
            .with_context(|| format!("Could not read {}", path.display())),
        _ => Ok(None),
    }
}

/// Collects the build artifacts of one run from a directory.
///
/// The directory holds the console log, optional executor flags and
/// structure errors, and any number of `TEST-*.xml` surefire reports and
/// `jacoco*.csv` coverage reports in subfolders. `project_folder` defaults to
/// the directory itself.
pub async fn load_artifacts(dir: &Path, project_folder: Option<String>) -> Result<BuildArtifacts> {
    let console = tokio::fs::read_to_string(dir.join(BUILD_OUTPUT_FILE))
        .await
        .with_context(|| format!("Could not read {BUILD_OUTPUT_FILE} in {}", dir.display()))?;

    let flags: ExecutionFlags = match read_optional(&dir.join(EXECUTION_FILE)).await? {
        Some(text) => serde_json::from_str(&text).with_context(|| format!("Could not parse {EXECUTION_FILE}"))?,
        None => ExecutionFlags::default(),
    };

    let structure_errors: Vec<String> = read_optional(&dir.join(STRUCTURE_ERRORS_FILE))
        .await?
        .map(|text| {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let (test_reports, coverage_reports) = tokio::try_join!(
        read_all(find_files("TEST-*.xml", 1, dir)?),
        read_all(find_files("jacoco*.csv", 1, dir)?),
    )?;

    let project_folder = match project_folder {
        Some(folder) => folder,
        None => dir.display().to_string(),
    };

    Ok(BuildArtifacts::builder()
        .execution(
            BuildExecution::builder()
                .output(RawBuildOutput::from_text(&console))
                .timed_out(flags.timed_out)
                .security_violation(flags.security_violation)
                .build(),
        )
        .test_reports(test_reports)
        .coverage_reports(coverage_reports)
        .project_folder(project_folder)
        .structure_errors(structure_errors)
        .build())
}

/// Loads the artifacts in `dir` and evaluates them against `policy`.
///
/// A build that cannot be evaluated is an error naming the status the
/// submission would end in.
pub async fn evaluate_dir(
    pipeline: &EvaluationPipeline,
    policy: &AssignmentPolicy,
    dir: &Path,
    project_folder: Option<String>,
) -> Result<Evaluation> {
    let artifacts = load_artifacts(dir, project_folder)
        .await
        .context("Failed to load build artifacts")?;
    pipeline.evaluate(&artifacts, policy).map_err(|e| {
        let status = SubmissionStatus::for_failure(&e);
        anyhow::Error::new(e).context(format!("Build not evaluated ({status})"))
    })
}
