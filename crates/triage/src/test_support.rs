//! In-memory tracker used by unit tests.
//!
//! Keeps a tiny model of a repository (labels, milestones, issues) and
//! records every call so tests can assert on the exact protocol.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{Result, TrackerError};
use crate::tracker::{
    IssueDetails, IssueSummary, LabelSpec, Milestone, MilestoneId, NewIssue, TrackerClient,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckAvailable,
    LabelExists(String),
    LabelCreate(String),
    MilestonesList,
    MilestoneCreate(String),
    IssuesListOpen(usize),
    IssueEdit {
        number: u64,
        label: String,
        milestone: String,
    },
    IssueGet(u64),
    IssuePatch {
        number: u64,
        milestone: MilestoneId,
        labels: Vec<String>,
    },
    IssueCreate(String),
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<Call>,
    labels: Vec<String>,
    milestones: Vec<Milestone>,
    issues: Vec<IssueSummary>,
    issue_labels: HashMap<u64, Vec<String>>,
    issue_milestones: HashMap<u64, String>,
    failing_edits: HashSet<u64>,
    failing_patches: HashSet<u64>,
    failing_creates: HashSet<String>,
    deny_label_create: bool,
    fail_label_lookup: bool,
    malformed_milestone_create: bool,
    unavailable: bool,
}

#[derive(Debug, Default)]
pub struct RecordingTracker {
    state: Mutex<State>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(self, f: impl FnOnce(&mut State)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_label(self, name: &str) -> Self {
        self.configure(|s| s.labels.push(name.to_string()))
    }

    pub fn with_milestone(self, title: &str, id: u64) -> Self {
        self.configure(|s| {
            s.milestones.push(Milestone {
                title: title.to_string(),
                id: MilestoneId(id),
            });
        })
    }

    pub fn with_issue(self, number: u64, title: &str, labels: &[&str]) -> Self {
        self.configure(|s| {
            s.issues.push(IssueSummary {
                number,
                title: title.to_string(),
            });
            s.issue_labels
                .insert(number, labels.iter().map(|l| (*l).to_string()).collect());
        })
    }

    pub fn fail_edit(self, number: u64) -> Self {
        self.configure(|s| {
            s.failing_edits.insert(number);
        })
    }

    pub fn fail_patch(self, number: u64) -> Self {
        self.configure(|s| {
            s.failing_patches.insert(number);
        })
    }

    pub fn fail_issue_create(self, title: &str) -> Self {
        self.configure(|s| {
            s.failing_creates.insert(title.to_string());
        })
    }

    pub fn deny_label_create(self) -> Self {
        self.configure(|s| s.deny_label_create = true)
    }

    pub fn fail_label_lookup(self) -> Self {
        self.configure(|s| s.fail_label_lookup = true)
    }

    pub fn malformed_milestone_create(self) -> Self {
        self.configure(|s| s.malformed_milestone_create = true)
    }

    pub fn unavailable(self) -> Self {
        self.configure(|s| s.unavailable = true)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.state.lock().unwrap().labels.iter().any(|l| l == name)
    }

    pub fn issue_labels(&self, number: u64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .issue_labels
            .get(&number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn issue_milestone(&self, number: u64) -> Option<String> {
        self.state.lock().unwrap().issue_milestones.get(&number).cloned()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn command_error(command: &str, stderr: &str) -> TrackerError {
    TrackerError::Command {
        command: command.to_string(),
        stderr: stderr.to_string(),
    }
}

#[async_trait]
impl TrackerClient for RecordingTracker {
    async fn check_available(&self) -> Result<()> {
        self.record(Call::CheckAvailable);
        if self.state.lock().unwrap().unavailable {
            return Err(TrackerError::Unavailable("gh CLI not found".to_string()));
        }
        Ok(())
    }

    async fn label_exists(&self, name: &str) -> Result<bool> {
        self.record(Call::LabelExists(name.to_string()));
        let state = self.state.lock().unwrap();
        if state.fail_label_lookup {
            return Err(command_error("gh label list", "HTTP 502"));
        }
        Ok(state.labels.iter().any(|l| l == name))
    }

    async fn label_create(&self, label: &LabelSpec) -> Result<()> {
        self.record(Call::LabelCreate(label.name.clone()));
        let mut state = self.state.lock().unwrap();
        if state.deny_label_create {
            return Err(command_error("gh label create", "permission denied"));
        }
        state.labels.push(label.name.clone());
        Ok(())
    }

    async fn milestones_list(&self) -> Result<Vec<Milestone>> {
        self.record(Call::MilestonesList);
        Ok(self.state.lock().unwrap().milestones.clone())
    }

    async fn milestone_create(&self, title: &str, _description: &str) -> Result<Milestone> {
        self.record(Call::MilestoneCreate(title.to_string()));
        let mut state = self.state.lock().unwrap();
        if state.malformed_milestone_create {
            return Err(TrackerError::MilestoneCreation {
                title: title.to_string(),
                reason: "expected value at line 1 column 1".to_string(),
            });
        }
        let id = state.milestones.iter().map(|m| m.id.0).max().unwrap_or(0) + 1;
        let created = Milestone {
            title: title.to_string(),
            id: MilestoneId(id),
        };
        state.milestones.push(created.clone());
        Ok(created)
    }

    async fn issues_list_open(&self, limit: usize) -> Result<Vec<IssueSummary>> {
        self.record(Call::IssuesListOpen(limit));
        Ok(self
            .state
            .lock()
            .unwrap()
            .issues
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn issue_edit_combined(
        &self,
        number: u64,
        add_label: &str,
        milestone_title: &str,
    ) -> Result<()> {
        self.record(Call::IssueEdit {
            number,
            label: add_label.to_string(),
            milestone: milestone_title.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_edits.contains(&number) {
            return Err(command_error("gh issue edit", "GraphQL: could not set milestone"));
        }
        let labels = state.issue_labels.entry(number).or_default();
        if !labels.iter().any(|l| l == add_label) {
            labels.push(add_label.to_string());
        }
        state
            .issue_milestones
            .insert(number, milestone_title.to_string());
        Ok(())
    }

    async fn issue_get(&self, number: u64) -> Result<IssueDetails> {
        self.record(Call::IssueGet(number));
        Ok(IssueDetails {
            number,
            labels: self.issue_labels(number),
        })
    }

    async fn issue_patch(
        &self,
        number: u64,
        milestone: MilestoneId,
        labels: &[String],
    ) -> Result<()> {
        self.record(Call::IssuePatch {
            number,
            milestone,
            labels: labels.to_vec(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_patches.contains(&number) {
            return Err(TrackerError::Patch {
                number,
                reason: "HTTP 422: Validation Failed".to_string(),
            });
        }
        state.issue_labels.insert(number, labels.to_vec());
        let title = state
            .milestones
            .iter()
            .find(|m| m.id == milestone)
            .map(|m| m.title.clone())
            .unwrap_or_default();
        state.issue_milestones.insert(number, title);
        Ok(())
    }

    async fn issue_create(&self, issue: &NewIssue) -> Result<String> {
        self.record(Call::IssueCreate(issue.title.clone()));
        let mut state = self.state.lock().unwrap();
        if state.failing_creates.contains(&issue.title) {
            return Err(command_error("gh issue create", "label not found"));
        }
        let number = state.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        state.issues.push(IssueSummary {
            number,
            title: issue.title.clone(),
        });
        state.issue_labels.insert(number, issue.labels.clone());
        Ok(format!("https://github.com/o/r/issues/{number}"))
    }
}
