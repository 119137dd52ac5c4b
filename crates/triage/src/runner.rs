//! # Plan runner
//!
//! Applies a [`Plan`] to a repository and reports what happened to every
//! entry.
//!
//! Setup (priority labels, milestones) runs first and fails fast on a broken
//! milestone; the per-issue loop afterwards never aborts, each entry ends up
//! as updated, failed or missing.

use serde::Serialize;
use std::fmt::Write as _;
use tracing::{info, warn};

use crate::error::Result;
use crate::issues::{apply, ApplyPath, IssueIndex, DEFAULT_ISSUE_LIMIT};
use crate::labels::{ensure_label, LabelOutcome};
use crate::milestones::resolve_or_create;
use crate::plan::{Plan, Priority};
use crate::tracker::{MilestoneId, TrackerClient};

/// Knobs for a single run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Max open issues fetched for the title index
    pub issue_limit: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            issue_limit: DEFAULT_ISSUE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMilestone {
    pub title: String,
    pub id: MilestoneId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedIssue {
    pub number: u64,
    pub title: String,
    pub priority: Priority,
    pub milestone: String,
    #[serde(flatten)]
    pub path: ApplyPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedIssue {
    pub number: u64,
    pub title: String,
    pub error: String,
}

/// Outcome of a run, meant for operator review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TriageReport {
    pub labels: Vec<(String, LabelOutcome)>,
    pub milestones: Vec<ResolvedMilestone>,
    pub updated: Vec<UpdatedIssue>,
    pub failed: Vec<FailedIssue>,
    pub missing: Vec<String>,
}

impl TriageReport {
    /// Human-readable summary: updated, failed, then missing titles
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for issue in &self.updated {
            let _ = writeln!(
                out,
                "Updated issue #{}: {} -> {}, {}",
                issue.number, issue.title, issue.priority, issue.milestone
            );
        }
        for issue in &self.failed {
            let _ = writeln!(
                out,
                "Failed to update issue #{}: {}: {}",
                issue.number, issue.title, issue.error
            );
        }
        if !self.missing.is_empty() {
            out.push_str("Missing issues (titles not found):\n");
            for title in &self.missing {
                let _ = writeln!(out, " - {title}");
            }
        }
        let _ = writeln!(
            out,
            "Summary: {} updated, {} failed, {} missing",
            self.updated.len(),
            self.failed.len(),
            self.missing.len()
        );
        out
    }
}

/// Reconcile the tracker with `plan`.
///
/// Errors only escape from the setup phase (milestone listing or creation,
/// the issue listing). Per-issue errors are recorded in the report.
pub async fn run(
    tracker: &dyn TrackerClient,
    plan: &Plan,
    options: RunOptions,
) -> Result<TriageReport> {
    let mut report = TriageReport::default();

    for priority in Priority::ALL {
        let spec = priority.label_spec();
        let outcome = ensure_label(tracker, &spec).await;
        report.labels.push((spec.name, outcome));
    }

    for milestone in plan.milestones() {
        let id = resolve_or_create(tracker, &milestone.title, &milestone.description).await?;
        report.milestones.push(ResolvedMilestone {
            title: milestone.title.clone(),
            id,
        });
    }

    let index = IssueIndex::build(tracker, options.issue_limit).await?;
    info!(
        entries = plan.len(),
        indexed = index.len(),
        "Applying triage plan"
    );

    for entry in plan.entries() {
        let Some(number) = index.get(&entry.title) else {
            report.missing.push(entry.title.clone());
            continue;
        };

        ensure_label(tracker, &entry.priority.fallback_label_spec()).await;

        match apply(tracker, number, entry.priority.label(), &entry.milestone).await {
            Ok(path) => {
                info!(issue = number, priority = %entry.priority, milestone = %entry.milestone, "Updated issue");
                report.updated.push(UpdatedIssue {
                    number,
                    title: entry.title.clone(),
                    priority: entry.priority,
                    milestone: entry.milestone.clone(),
                    path,
                });
            }
            Err(e) => {
                warn!(issue = number, title = %entry.title, error = %e, "Failed to update issue");
                report.failed.push(FailedIssue {
                    number,
                    title: entry.title.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        updated = report.updated.len(),
        failed = report.failed.len(),
        missing = report.missing.len(),
        "Triage run complete"
    );
    Ok(report)
}
