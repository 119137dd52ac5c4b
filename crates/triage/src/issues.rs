//! # Issue index and updater
//!
//! The updater sets a priority label and a milestone on an existing issue
//! using two tiers:
//!
//! 1. a combined `gh issue edit --add-label --milestone` request;
//! 2. when that is rejected, a fallback that resolves the milestone id,
//!    reads the issue's current labels and patches the issue through the
//!    REST API with the union of old labels and the priority label.
//!
//! Both tiers only ever add labels, so re-applying the same update is a
//! no-op.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::milestones::find_milestone;
use crate::tracker::{MilestoneId, TrackerClient};

/// Default upper bound on open issues fetched for the index
pub const DEFAULT_ISSUE_LIMIT: usize = 200;

/// Title to issue-number lookup over the open issues of a repository.
///
/// Only the first `limit` open issues are fetched; anything past that reads
/// as not found. When two open issues share a title the later one in fetch
/// order wins.
#[derive(Debug, Clone, Default)]
pub struct IssueIndex {
    by_title: HashMap<String, u64>,
}

impl IssueIndex {
    /// Fetch the open-issue listing and index it by title
    pub async fn build(tracker: &dyn TrackerClient, limit: usize) -> Result<Self> {
        let issues = tracker.issues_list_open(limit).await?;
        if issues.len() >= limit {
            warn!(
                limit,
                "Open issue listing hit the fetch limit; later issues will be reported missing"
            );
        }

        let by_title: HashMap<String, u64> = issues
            .into_iter()
            .map(|issue| (issue.title, issue.number))
            .collect();

        debug!(issues = by_title.len(), "Built issue index");
        Ok(Self { by_title })
    }

    pub fn get(&self, title: &str) -> Option<u64> {
        self.by_title.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.by_title.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_title.is_empty()
    }
}

/// Which tier carried an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ApplyPath {
    /// The combined edit succeeded
    Combined,
    /// The combined edit was rejected and the REST patch was used
    Fallback { milestone_id: MilestoneId },
}

/// Add `priority_label` to issue `number` and set its milestone to
/// `milestone_title`.
///
/// Errors from the fallback tier (unknown milestone, failed patch, ...) are
/// returned to the caller; the combined edit's own failure is not.
pub async fn apply(
    tracker: &dyn TrackerClient,
    number: u64,
    priority_label: &str,
    milestone_title: &str,
) -> Result<ApplyPath> {
    match tracker
        .issue_edit_combined(number, priority_label, milestone_title)
        .await
    {
        Ok(()) => {
            debug!(issue = number, "Combined edit applied");
            return Ok(ApplyPath::Combined);
        }
        Err(e) => {
            info!(issue = number, error = %e, "Combined edit rejected, falling back to REST patch");
        }
    }

    let milestone = find_milestone(tracker, milestone_title).await?;

    let current = tracker.issue_get(number).await?;
    let labels = merge_labels(current.labels, priority_label);

    tracker.issue_patch(number, milestone, &labels).await?;
    Ok(ApplyPath::Fallback {
        milestone_id: milestone,
    })
}

/// `existing ∪ {label}`, keeping existing order and dropping duplicates
fn merge_labels(existing: Vec<String>, label: &str) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + 1);
    for name in existing {
        if !merged.contains(&name) {
            merged.push(name);
        }
    }
    if !merged.iter().any(|l| l == label) {
        merged.push(label.to_string());
    }
    merged
}
