#![warn(clippy::pedantic)]
// =============================================================================
// Clippy Pedantic Lint Configuration
// =============================================================================
// This crate enables clippy::pedantic for high code quality. The allows below
// are intentional choices documented by category.

// -----------------------------------------------------------------------------
// Documentation: To be addressed in a separate documentation PR
// -----------------------------------------------------------------------------
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
// -----------------------------------------------------------------------------
// API Design Choices: Intentional for consistency and future extensibility
// -----------------------------------------------------------------------------
// Methods take &self for consistency even when not currently needed
#![allow(clippy::unused_self)]
// Parameters taken by value for API flexibility
#![allow(clippy::needless_pass_by_value)]
// Not all functions need #[must_use]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
// -----------------------------------------------------------------------------
// Code Style: Acceptable pedantic style choices
// -----------------------------------------------------------------------------
// Allow module_name in type names for clarity in public API
#![allow(clippy::module_name_repetitions)]
// Allow longer functions for complex logic that shouldn't be split
#![allow(clippy::too_many_lines)]

//! # Triage
//!
//! Issue tracker tooling built on the `gh` CLI.
//!
//! ## Modules
//!
//! - [`tracker`] - `TrackerClient` capability trait and tracker data types
//! - [`gh`] - `TrackerClient` backed by the `gh` CLI
//! - [`dry_run`] - decorator that records mutations instead of sending them
//! - [`labels`] - best-effort label provisioning
//! - [`milestones`] - milestone lookup and creation by title
//! - [`issues`] - open-issue index and the two-tier issue updater
//! - [`plan`] - triage plan types and the built-in roadmap
//! - [`config`] - YAML plan files
//! - [`runner`] - applies a plan and produces a report
//! - [`seed`] - creates the label palette and issues from a JSON file
//! - [`coverage`] - Go coverage threshold gate

pub mod config;
pub mod coverage;
pub mod dry_run;
pub mod error;
pub mod gh;
pub mod issues;
pub mod labels;
pub mod milestones;
pub mod plan;
pub mod runner;
pub mod seed;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types for convenience
pub use coverage::{CoverageError, CoverageVerdict};
pub use dry_run::{DryRunTracker, DRY_RUN_PREFIX};
pub use error::TrackerError;
pub use gh::GhCli;
pub use issues::{apply, ApplyPath, IssueIndex, DEFAULT_ISSUE_LIMIT};
pub use labels::{ensure_label, LabelOutcome};
pub use milestones::resolve_or_create;
pub use plan::{default_plan, Plan, PlanBuilder, PlanEntry, Priority};
pub use runner::{run, RunOptions, TriageReport};
pub use seed::{seed, SeedReport};
pub use tracker::{
    IssueDetails, IssueSummary, LabelSpec, Milestone, MilestoneId, Mutation, NewIssue,
    RepoScope, TrackerClient,
};
