//! CLI for issue triage tooling
//!
//! Run `triage --help` for usage information.

// CLI binaries legitimately need println! for user output
#![allow(clippy::disallowed_macros)]

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use triage::coverage::{self, CoverageError, DEFAULT_THRESHOLD};
use triage::gh::DEFAULT_GH_PROGRAM;
use triage::seed::{self, DEFAULT_ISSUES_FILE};
use triage::{
    config, default_plan, runner, DryRunTracker, GhCli, Plan, RunOptions, TrackerClient,
    TriageReport, DEFAULT_ISSUE_LIMIT, DRY_RUN_PREFIX,
};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Issue tracker triage tooling")]
#[command(version)]
struct Cli {
    /// Output format: json, text
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// GitHub CLI executable
    #[arg(long, env = "TRIAGE_GH", default_value = DEFAULT_GH_PROGRAM, global = true)]
    gh: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply priority labels and milestones to existing issues
    Priority {
        /// Repository in owner/repo format
        #[arg(short, long, env = "TRIAGE_REPO")]
        repo: String,

        /// YAML plan file (defaults to the built-in roadmap)
        #[arg(long)]
        plan: Option<PathBuf>,

        /// Max open issues fetched when matching titles (at least 1)
        #[arg(
            long,
            env = "TRIAGE_ISSUE_LIMIT",
            default_value_t = DEFAULT_ISSUE_LIMIT,
            value_parser = RangedU64ValueParser::<usize>::new().range(1..)
        )]
        issue_limit: usize,

        /// Dry run - print mutations instead of sending them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Create the label palette and issues from a JSON file
    CreateIssues {
        /// Repository in owner/repo format
        #[arg(short, long, env = "TRIAGE_REPO")]
        repo: String,

        /// JSON array of {title, body, labels}
        #[arg(long, default_value = DEFAULT_ISSUES_FILE)]
        file: PathBuf,

        /// Dry run - print mutations instead of sending them
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Enforce total statement coverage of a Go coverage profile
    Coverage {
        /// Coverage profile (e.g. coverage.out)
        profile: PathBuf,

        /// Minimum total coverage in percent
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Priority {
            repo,
            plan,
            issue_limit,
            dry_run,
        } => {
            let plan = match plan {
                Some(path) => config::load_plan(&path)?,
                None => default_plan(),
            };
            let options = RunOptions { issue_limit };
            let gh = connect(&repo, &cli.gh).await?;

            let report = if dry_run {
                let tracker = DryRunTracker::new(gh);
                let report = run_priority(&tracker, &plan, options).await?;
                print_skipped(&tracker.skipped(), cli.format);
                report
            } else {
                run_priority(&gh, &plan, options).await?
            };

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print!("{}", report.render_text()),
            }
        }
        Commands::CreateIssues {
            repo,
            file,
            dry_run,
        } => {
            let issues = seed::load_issues(&file)?;
            let palette = seed::default_palette();
            let gh = connect(&repo, &cli.gh).await?;

            let report = if dry_run {
                let tracker = DryRunTracker::new(gh);
                let report = seed::seed(&tracker, &palette, &issues).await;
                print_skipped(&tracker.skipped(), cli.format);
                report
            } else {
                seed::seed(&gh, &palette, &issues).await
            };

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => print!("{}", report.render_text()),
            }
        }
        Commands::Coverage { profile, threshold } => {
            run_coverage(&profile, threshold, cli.format).await?;
        }
    }

    Ok(())
}

/// Build the `gh` client for `repo` and make sure `gh` is usable
async fn connect(repo: &str, program: &str) -> Result<GhCli> {
    let gh = GhCli::new(repo)?.with_program(program);
    gh.check_available().await?;
    Ok(gh)
}

async fn run_priority(
    tracker: &dyn TrackerClient,
    plan: &Plan,
    options: RunOptions,
) -> Result<TriageReport> {
    runner::run(tracker, plan, options)
        .await
        .context("Triage setup failed")
}

/// Show skipped mutations; stdout stays pure JSON in json mode
fn print_skipped(commands: &[String], format: OutputFormat) {
    for command in commands {
        match format {
            OutputFormat::Json => eprintln!("{DRY_RUN_PREFIX} {command}"),
            OutputFormat::Text => println!("{DRY_RUN_PREFIX} {command}"),
        }
    }
}

async fn run_coverage(profile: &Path, threshold: f64, format: OutputFormat) -> Result<()> {
    let output = coverage::run_go_cover(profile).await?;

    let verdict = match coverage::check(&output, threshold) {
        Ok(verdict) => verdict,
        Err(e @ CoverageError::MissingTotal) => {
            println!("{output}");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&verdict)?),
        OutputFormat::Text => {
            if !verdict.is_failure() {
                println!("{}", verdict.message());
            }
        }
    }

    if verdict.is_failure() {
        anyhow::bail!(verdict.message());
    }
    Ok(())
}
