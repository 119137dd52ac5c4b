//! # Tracker Client
//!
//! Capability interface over an issue tracker. The synchronizer, the seeder
//! and the dry-run decorator only ever talk to a tracker through this trait,
//! so none of them know whether a real `gh` process sits behind it.
//!
//! A client is bound to a single repository scope when it is constructed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrackerError};

/// Tracker-assigned milestone id (GitHub's milestone `number`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MilestoneId(pub u64);

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A milestone as listed by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(rename = "number")]
    pub id: MilestoneId,
}

/// A label definition used when provisioning labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub name: String,

    /// Hex color without the leading `#`
    pub color: String,

    #[serde(default)]
    pub description: String,
}

impl LabelSpec {
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
            description: description.into(),
        }
    }
}

/// Entry of the open-issue listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
}

/// The parts of a single issue the fallback update path needs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDetails {
    pub number: u64,
    pub labels: Vec<String>,
}

/// An issue to be created by the seeder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIssue {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub labels: Vec<String>,
}

/// Repository scope in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoScope {
    owner: String,
    name: String,
}

impl RepoScope {
    /// Parse an `owner/name` string
    pub fn parse(repo: &str) -> Result<Self> {
        let parts: Vec<&str> = repo.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(TrackerError::InvalidRepo(repo.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A write a [`TrackerClient`] can perform, described without performing it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation<'a> {
    LabelCreate(&'a LabelSpec),
    MilestoneCreate {
        title: &'a str,
        description: &'a str,
    },
    IssueEdit {
        number: u64,
        add_label: &'a str,
        milestone_title: &'a str,
    },
    IssuePatch {
        number: u64,
        milestone: MilestoneId,
        labels: &'a [String],
    },
    IssueCreate(&'a NewIssue),
}

impl fmt::Display for Mutation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabelCreate(label) => write!(
                f,
                "create label '{}' color={} description='{}'",
                label.name, label.color, label.description
            ),
            Self::MilestoneCreate { title, description } => write!(
                f,
                "create milestone '{title}' state=open description='{description}'"
            ),
            Self::IssueEdit {
                number,
                add_label,
                milestone_title,
            } => write!(
                f,
                "edit issue #{number} add-label={add_label} milestone='{milestone_title}'"
            ),
            Self::IssuePatch {
                number,
                milestone,
                labels,
            } => write!(
                f,
                "patch issue #{number} milestone={milestone} labels=[{}]",
                labels.join(", ")
            ),
            Self::IssueCreate(issue) => write!(
                f,
                "create issue '{}' labels=[{}]",
                issue.title,
                issue.labels.join(", ")
            ),
        }
    }
}

/// Issue/label/milestone operations against one repository.
///
/// Calls are issued one at a time by every caller in this crate; an
/// implementation does not need to handle overlapping requests.
#[async_trait]
pub trait TrackerClient: Send + Sync {
    /// Fail when the underlying tool is missing or unauthenticated
    async fn check_available(&self) -> Result<()>;

    async fn label_exists(&self, name: &str) -> Result<bool>;

    async fn label_create(&self, label: &LabelSpec) -> Result<()>;

    async fn milestones_list(&self) -> Result<Vec<Milestone>>;

    async fn milestone_create(&self, title: &str, description: &str) -> Result<Milestone>;

    /// List open issues, at most `limit` of them
    async fn issues_list_open(&self, limit: usize) -> Result<Vec<IssueSummary>>;

    /// Add `add_label` and set the milestone by title in a single request
    async fn issue_edit_combined(
        &self,
        number: u64,
        add_label: &str,
        milestone_title: &str,
    ) -> Result<()>;

    async fn issue_get(&self, number: u64) -> Result<IssueDetails>;

    /// Set the milestone by id and replace the label set
    async fn issue_patch(&self, number: u64, milestone: MilestoneId, labels: &[String])
        -> Result<()>;

    /// Create an issue, returning the tracker's reference (URL) for it
    async fn issue_create(&self, issue: &NewIssue) -> Result<String>;

    /// Command line that would perform `mutation`
    fn command_line(&self, mutation: &Mutation<'_>) -> String {
        mutation.to_string()
    }
}
