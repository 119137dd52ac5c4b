//! Error types for tracker operations.

use thiserror::Error;

/// Errors surfaced by a [`TrackerClient`](crate::tracker::TrackerClient) and
/// the synchronizer built on top of it.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The `gh` binary could not be spawned at all
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `gh` ran but exited unsuccessfully
    #[error("{command} failed: {stderr}")]
    Command { command: String, stderr: String },

    /// The CLI is missing or not authenticated
    #[error("tracker client unavailable: {0}")]
    Unavailable(String),

    /// Repository scope is not in `owner/name` form
    #[error("invalid repository '{0}', expected 'owner/name'")]
    InvalidRepo(String),

    /// Tracker returned data that does not match the expected structure
    #[error("malformed response from {context}: {source}")]
    MalformedResponse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Creating a milestone did not yield a usable id
    #[error("failed to create milestone '{title}': {reason}")]
    MilestoneCreation { title: String, reason: String },

    /// Fallback path could not find the milestone by title
    #[error("milestone not found: {0}")]
    MilestoneNotFound(String),

    /// The final fallback mutation of an issue failed
    #[error("failed to patch issue #{number}: {reason}")]
    Patch { number: u64, reason: String },
}

impl TrackerError {
    pub(crate) fn malformed(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
