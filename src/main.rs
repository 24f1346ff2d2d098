#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # dropgrade
//! ## Introduction
//!
//! Evaluates Maven builds of assignment submissions and reports on them.
//!
//! - `dropgrade evaluate POLICY DIR` evaluates one build whose artifacts were
//!   collected into `DIR`.
//! - `dropgrade leaderboard SNAPSHOT`, `dropgrade signalled SNAPSHOT` and
//!   `dropgrade export SNAPSHOT` work on a JSON snapshot of an assignment
//!   (policy, groups and submissions).
//!
//! Thresholds are read from `DROPGRADE_*` environment variables, or from a
//! `.env` file in the working directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use colored::Colorize;
use dotenvy::dotenv;
use dropgrade::{
    config,
    eval::{AssignmentPolicy, EvaluationPipeline},
    ranking::{CsvExport, leaderboard},
    report::TestVisibilityTier,
    signal::{GroupFailures, GroupSubmissionStats, compute_statistics, signalled_groups},
    submission::{SubmissionLedger, SubmissionRecord, SubmissionStatus},
    util::{AssignmentSnapshot, evaluate_dir, load_json},
};
use tabled::{
    Table,
    settings::{Panel, Style},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Evaluate one build
    Evaluate {
        /// Assignment policy JSON
        policy:         PathBuf,
        /// Directory holding the build artifacts
        artifacts:      PathBuf,
        /// Mavenized project path as printed by the build
        project_folder: Option<String>,
        /// Print JSON instead of tables
        json:           bool,
    },
    /// Show the leaderboard
    Leaderboard {
        /// Assignment snapshot JSON
        snapshot: PathBuf,
        /// Print JSON instead of tables
        json:     bool,
    },
    /// Show groups with identical failures and submission outliers
    Signalled {
        /// Assignment snapshot JSON
        snapshot:  PathBuf,
        /// Minimum percentage of passed tests for the statistics
        threshold: Option<u32>,
    },
    /// Export final submissions as CSV
    Export {
        /// Assignment snapshot JSON
        snapshot:    PathBuf,
        /// Leave out the `ellapsed` column
        no_ellapsed: bool,
        /// Write to this file instead of stdout
        output:      Option<PathBuf>,
    },
}

/// Global options.
#[derive(Debug, Clone)]
struct Opts {
    /// Log at debug level
    verbose: bool,
    /// The command to run
    cmd:     Cmd,
}

/// Parse the command line arguments and return the options
fn options() -> Opts {
    /// parses the snapshot path
    fn snapshot() -> impl Parser<PathBuf> {
        positional::<PathBuf>("SNAPSHOT").help("Assignment snapshot (policy, groups, submissions) as JSON")
    }

    /// parses the JSON switch
    fn json() -> impl Parser<bool> {
        long("json").help("Print JSON instead of tables").switch()
    }

    let policy = positional::<PathBuf>("POLICY").help("Assignment policy as JSON");
    let artifacts = positional::<PathBuf>("DIR").help(
        "Directory with build-output.txt, optional execution.json and structure-errors.txt, \
         and TEST-*.xml / jacoco*.csv reports",
    );
    let project_folder = long("project-folder")
        .help("Mavenized project path as printed in the console log")
        .argument::<String>("PATH")
        .optional();
    let evaluate = {
        let json = json();
        construct!(Cmd::Evaluate {
            policy,
            artifacts,
            project_folder,
            json
        })
    }
    .to_options()
    .command("evaluate")
    .help("Evaluate one build and print its indicators");

    let leaderboard = {
        let snapshot = snapshot();
        let json = json();
        construct!(Cmd::Leaderboard { snapshot, json })
    }
    .to_options()
    .command("leaderboard")
    .help("Rank the latest submission of every group");

    let signalled = {
        let snapshot = snapshot();
        let threshold = long("threshold")
            .help("Minimum percentage of passed tests to be part of the statistics")
            .argument::<u32>("PERCENT")
            .optional();
        construct!(Cmd::Signalled {
            snapshot,
            threshold
        })
    }
    .to_options()
    .command("signalled")
    .help("List groups failing exactly the same tests");

    let export = {
        let snapshot = snapshot();
        let no_ellapsed = long("no-ellapsed")
            .help("Leave out the ellapsed column")
            .switch();
        let output = short('o')
            .long("output")
            .help("Write the CSV to this file")
            .argument::<PathBuf>("FILE")
            .optional();
        construct!(Cmd::Export {
            snapshot,
            no_ellapsed,
            output
        })
    }
    .to_options()
    .command("export")
    .help("Export final submissions as CSV");

    let verbose = short('v')
        .long("verbose")
        .help("Log at debug level")
        .switch();
    let cmd = construct!([evaluate, leaderboard, signalled, export]);

    construct!(Opts { verbose, cmd })
        .to_options()
        .descr("Evaluates Maven builds of assignment submissions")
        .run()
}

/// Evaluates one build and prints the result
async fn evaluate(policy: PathBuf, artifacts: PathBuf, project_folder: Option<String>, json: bool) -> Result<()> {
    let policy: AssignmentPolicy = load_json(&policy).await?;
    let pipeline = EvaluationPipeline::new(config::eval_settings()?);
    let evaluation = evaluate_dir(&pipeline, &policy, &artifacts, project_folder)
        .await
        .inspect_err(|_| eprintln!("{}", "FAIL".red().bold()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
        return Ok(());
    }

    let headline = if evaluation.is_passing() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!(
        "{}",
        Table::new(evaluation.indicators())
            .with(Panel::header(format!("Evaluation: {headline}")))
            .with(Style::modern())
    );

    println!(
        "Memory budget: {} MB",
        policy.effective_max_memory_mb(pipeline.settings())
    );

    for error in evaluation.structure_errors() {
        eprintln!("{} {error}", "structure:".yellow());
    }

    if let Some(verdict) = evaluation.verdict() {
        if !verdict.diagnostics().is_empty() {
            println!("{}", Table::new(verdict.diagnostics()).with(Style::modern()));
        }
        if !verdict.summaries().is_empty() {
            println!("{}", Table::new(verdict.summaries().values()).with(Style::modern()));
        }
        if let Some(details) = verdict
            .tests()
            .failure_details(TestVisibilityTier::Teacher, policy.package_name.as_deref())
        {
            println!("{details}");
        }
        if let Some(coverage) = verdict.coverage() {
            println!("Line coverage: {}%", coverage.percent_line_coverage);
        }
    }
    Ok(())
}

/// Prints the leaderboard of a snapshot
async fn show_leaderboard(snapshot: PathBuf, json: bool) -> Result<()> {
    let snapshot: AssignmentSnapshot = load_json(&snapshot).await?;
    let latest = latest_per_group(&snapshot);
    let ranked = leaderboard(&latest, snapshot.policy.leaderboard());

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
    } else if ranked.is_empty() {
        eprintln!("No submission passes any teacher test yet.");
    } else {
        println!(
            "{}",
            Table::new(&ranked)
                .with(Panel::header(format!("Leaderboard: {}", snapshot.policy.id)))
                .with(Style::modern())
        );
    }
    Ok(())
}

/// Prints signalled groups and submission outliers of a snapshot
async fn show_signalled(snapshot: PathBuf, threshold: Option<u32>) -> Result<()> {
    let snapshot: AssignmentSnapshot = load_json(&snapshot).await?;
    let latest = latest_per_group(&snapshot);

    let failures: Vec<GroupFailures> = latest
        .iter()
        .filter_map(GroupFailures::from_record)
        .collect();
    let classes = signalled_groups(&failures);
    if classes.is_empty() {
        println!("No groups identified as similar");
    }
    for class in &classes {
        let groups = class
            .groups
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("{} {groups}", "groups:".yellow().bold());
        println!("  failing: {}", class.failed_tests.join(", "));
    }

    let stats: Vec<GroupSubmissionStats> = latest
        .iter()
        .filter_map(|record| {
            let count = snapshot
                .submissions
                .iter()
                .filter(|r| r.group_id == record.group_id && r.status != SubmissionStatus::Deleted)
                .count();
            GroupSubmissionStats::from_record(record, count)
        })
        .collect();
    let num_tests = latest
        .iter()
        .filter_map(|r| r.evaluation.as_ref()?.verdict()?.summary(TestVisibilityTier::Teacher))
        .map(|s| s.total_tests)
        .max()
        .unwrap_or(0);
    let statistics = compute_statistics(&stats, num_tests, threshold);
    let outside = statistics.groups_outside_norm();
    if !outside.is_empty() {
        println!(
            "{}",
            Table::new(&outside)
                .with(Panel::header(format!(
                    "Average submissions: {:.2}, standard deviation: {:.2}, threshold: {:.2}",
                    statistics.average,
                    statistics.standard_deviation,
                    statistics.threshold()
                )))
                .with(Style::modern())
        );
    }
    Ok(())
}

/// Writes the CSV export of a snapshot
async fn export(snapshot: PathBuf, no_ellapsed: bool, output: Option<PathBuf>) -> Result<()> {
    let snapshot: AssignmentSnapshot = load_json(&snapshot).await?;
    let csv = CsvExport::builder()
        .policy(&snapshot.policy)
        .submissions(&snapshot.submissions)
        .groups(&snapshot.groups)
        .include_ellapsed(!no_ellapsed)
        .build()
        .render();

    match output {
        Some(path) => tokio::fs::write(&path, csv)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{csv}"),
    }
    Ok(())
}

/// The latest non-deleted submission of each group, by group id.
fn latest_per_group(snapshot: &AssignmentSnapshot) -> Vec<SubmissionRecord> {
    let ledger = SubmissionLedger::from_records(snapshot.submissions.clone());
    ledger.latest_per_group(&snapshot.policy.id)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let opts = options();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let level = if opts.verbose { Level::DEBUG } else { Level::INFO };
    let filter_layer = LevelFilter::from_level(level);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    match opts.cmd {
        Cmd::Evaluate {
            policy,
            artifacts,
            project_folder,
            json,
        } => evaluate(policy, artifacts, project_folder, json).await?,
        Cmd::Leaderboard { snapshot, json } => show_leaderboard(snapshot, json).await?,
        Cmd::Signalled {
            snapshot,
            threshold,
        } => show_signalled(snapshot, threshold).await?,
        Cmd::Export {
            snapshot,
            no_ellapsed,
            output,
        } => export(snapshot, no_ellapsed, output).await?,
    };

    Ok(())
}
