//! Best-effort label provisioning.
//!
//! Labels are a precondition for editing issues, not the goal of a run, so
//! nothing in here ever returns an error: a label that cannot be created is
//! reported with a warning and the caller carries on.

use serde::Serialize;
use tracing::{debug, warn};

use crate::tracker::{LabelSpec, TrackerClient};

/// What [`ensure_label`] ended up doing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum LabelOutcome {
    /// Label was already present
    Existing,
    /// Label was missing and has been created
    Created,
    /// Label was missing and creation failed (permission denied, ...)
    Failed(String),
}

/// Make sure `label` exists, creating it when absent.
///
/// A failed existence query is treated as "absent".
pub async fn ensure_label(tracker: &dyn TrackerClient, label: &LabelSpec) -> LabelOutcome {
    match tracker.label_exists(&label.name).await {
        Ok(true) => return LabelOutcome::Existing,
        Ok(false) => {}
        Err(e) => debug!(label = %label.name, error = %e, "Label lookup failed, assuming absent"),
    }

    match tracker.label_create(label).await {
        Ok(()) => LabelOutcome::Created,
        Err(e) => {
            warn!(label = %label.name, error = %e, "Failed to create label");
            LabelOutcome::Failed(e.to_string())
        }
    }
}

/// Ensure every label in `labels`, in order
pub async fn ensure_labels(
    tracker: &dyn TrackerClient,
    labels: &[LabelSpec],
) -> Vec<(String, LabelOutcome)> {
    let mut outcomes = Vec::with_capacity(labels.len());
    for label in labels {
        let outcome = ensure_label(tracker, label).await;
        outcomes.push((label.name.clone(), outcome));
    }
    outcomes
}
