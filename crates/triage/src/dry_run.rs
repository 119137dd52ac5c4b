//! Dry-run decorator.
//!
//! Wraps another [`TrackerClient`]: reads go to the wrapped client, every
//! mutation is recorded as the command line that would have performed it and
//! reported as successful without being sent. The binary decides where the
//! recorded lines are printed.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use crate::error::Result;
use crate::tracker::{
    IssueDetails, IssueSummary, LabelSpec, Milestone, MilestoneId, Mutation, NewIssue,
    TrackerClient,
};

/// Prefix for each skipped mutation when shown to a user
pub const DRY_RUN_PREFIX: &str = "DRY-RUN:";

/// Tracker that never mutates anything
#[derive(Debug)]
pub struct DryRunTracker<T> {
    inner: T,
    skipped: Mutex<Vec<String>>,
}

impl<T: TrackerClient> DryRunTracker<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            skipped: Mutex::new(Vec::new()),
        }
    }

    /// Command lines of the mutations skipped so far, in call order
    pub fn skipped(&self) -> Vec<String> {
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    fn skip(&self, mutation: &Mutation<'_>) {
        let line = self.inner.command_line(mutation);
        debug!(command = %line, "Skipping mutation (dry run)");
        self.skipped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }
}

#[async_trait]
impl<T: TrackerClient> TrackerClient for DryRunTracker<T> {
    async fn check_available(&self) -> Result<()> {
        self.inner.check_available().await
    }

    async fn label_exists(&self, name: &str) -> Result<bool> {
        self.inner.label_exists(name).await
    }

    async fn label_create(&self, label: &LabelSpec) -> Result<()> {
        self.skip(&Mutation::LabelCreate(label));
        Ok(())
    }

    async fn milestones_list(&self) -> Result<Vec<Milestone>> {
        self.inner.milestones_list().await
    }

    /// Reports a placeholder milestone with id `0`
    async fn milestone_create(&self, title: &str, description: &str) -> Result<Milestone> {
        self.skip(&Mutation::MilestoneCreate { title, description });
        Ok(Milestone {
            title: title.to_string(),
            id: MilestoneId(0),
        })
    }

    async fn issues_list_open(&self, limit: usize) -> Result<Vec<IssueSummary>> {
        self.inner.issues_list_open(limit).await
    }

    async fn issue_edit_combined(
        &self,
        number: u64,
        add_label: &str,
        milestone_title: &str,
    ) -> Result<()> {
        self.skip(&Mutation::IssueEdit {
            number,
            add_label,
            milestone_title,
        });
        Ok(())
    }

    async fn issue_get(&self, number: u64) -> Result<IssueDetails> {
        self.inner.issue_get(number).await
    }

    async fn issue_patch(
        &self,
        number: u64,
        milestone: MilestoneId,
        labels: &[String],
    ) -> Result<()> {
        self.skip(&Mutation::IssuePatch {
            number,
            milestone,
            labels,
        });
        Ok(())
    }

    async fn issue_create(&self, issue: &NewIssue) -> Result<String> {
        self.skip(&Mutation::IssueCreate(issue));
        Ok(String::new())
    }

    fn command_line(&self, mutation: &Mutation<'_>) -> String {
        self.inner.command_line(mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Plan, Priority};
    use crate::runner::{run, RunOptions};
    use crate::test_support::{Call, RecordingTracker};

    fn is_mutation(call: &Call) -> bool {
        matches!(
            call,
            Call::LabelCreate(_)
                | Call::MilestoneCreate(_)
                | Call::IssueEdit { .. }
                | Call::IssuePatch { .. }
                | Call::IssueCreate(_)
        )
    }

    #[tokio::test]
    async fn test_mutations_never_reach_inner() {
        let dry = DryRunTracker::new(RecordingTracker::new().with_issue(5, "Issue A", &[]));
        let plan = Plan::builder()
            .milestone("M0", "Setup")
            .assign("Issue A", Priority::P0, "M0")
            .build();

        let report = run(&dry, &plan, RunOptions::default()).await.unwrap();

        assert_eq!(report.updated.len(), 1);
        assert_eq!(
            dry.skipped(),
            vec![
                "create label 'P0' color=b60205 description='Critical path (MVP)'",
                "create label 'P1' color=d93f0b description='MVP polish/perf'",
                "create label 'P2' color=fbca04 description='Beta/optional'",
                "create milestone 'M0' state=open description='Setup'",
                "create label 'P0' color=ededed description='Priority P0'",
                "edit issue #5 add-label=P0 milestone='M0'",
            ]
        );
        let inner = dry.into_inner();
        assert_eq!(inner.count(is_mutation), 0);
        assert!(inner.calls().contains(&Call::IssuesListOpen(200)));
    }

    #[tokio::test]
    async fn test_availability_checks_inner() {
        let dry = DryRunTracker::new(RecordingTracker::new().unavailable());
        assert!(dry.check_available().await.is_err());
    }

    #[tokio::test]
    async fn test_reads_pass_through() {
        let dry = DryRunTracker::new(RecordingTracker::new().with_label("P0"));

        assert!(dry.label_exists("P0").await.unwrap());
        assert!(!dry.label_exists("P1").await.unwrap());
        assert!(dry
            .issue_create(&NewIssue {
                title: "x".to_string(),
                body: String::new(),
                labels: Vec::new(),
            })
            .await
            .unwrap()
            .is_empty());
    }
}
