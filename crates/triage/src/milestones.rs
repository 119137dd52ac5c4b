//! Milestone resolution by title.

use std::collections::HashMap;
use tracing::info;

use crate::error::{Result, TrackerError};
use crate::tracker::{MilestoneId, TrackerClient};

/// Title to id mapping of every milestone currently in the repository
pub async fn milestone_ids(tracker: &dyn TrackerClient) -> Result<HashMap<String, MilestoneId>> {
    Ok(tracker
        .milestones_list()
        .await?
        .into_iter()
        .map(|ms| (ms.title, ms.id))
        .collect())
}

/// Look up a milestone by title without creating it.
///
/// Every call lists the milestones afresh.
pub async fn find_milestone(tracker: &dyn TrackerClient, title: &str) -> Result<MilestoneId> {
    milestone_ids(tracker)
        .await?
        .get(title)
        .copied()
        .ok_or_else(|| TrackerError::MilestoneNotFound(title.to_string()))
}

/// Return the id of the milestone named `title`, creating an open milestone
/// with `description` when none exists.
///
/// An unparseable create response is returned as
/// [`TrackerError::MilestoneCreation`].
pub async fn resolve_or_create(
    tracker: &dyn TrackerClient,
    title: &str,
    description: &str,
) -> Result<MilestoneId> {
    if let Some(id) = milestone_ids(tracker).await?.get(title) {
        return Ok(*id);
    }

    info!(milestone = %title, "Milestone missing, creating");
    let created = tracker.milestone_create(title, description).await?;
    Ok(created.id)
}
