//! # Issue seeding
//!
//! Creates the standard topic labels and a batch of issues read from a JSON
//! file (an array of `{title, body, labels}` objects).
//!
//! Issues are created without any duplicate check; seeding the same file
//! twice creates every issue twice.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::labels::{ensure_labels, LabelOutcome};
use crate::tracker::{LabelSpec, NewIssue, TrackerClient};

/// Default location of the issues file, relative to the working directory
pub const DEFAULT_ISSUES_FILE: &str = "tools/issues.json";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read issues file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid issues file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Topic labels every seeded repository gets
pub fn default_palette() -> Vec<LabelSpec> {
    [
        ("epic", "5319e7", "High-level epic"),
        ("backend", "1d76db", "Go services and ingestion"),
        ("ingestion", "0052cc", "Fetching and cursors"),
        ("normalization", "0e8a16", "Decoders and mapping"),
        ("enrichment", "c2e0c6", "EOA/contract, metadata, labels"),
        ("sql", "b60205", "ClickHouse schema and queries"),
        ("api", "fbca04", "TypeScript API"),
        ("embeddings", "5319e7", "Vector search and models"),
        ("ops", "d93f0b", "Reliability and observability"),
        ("tooling", "c5def5", "Dev tools and CI"),
        ("testing", "0e8a16", "Fixtures and tests"),
        ("docs", "0366d6", "Documentation"),
    ]
    .into_iter()
    .map(|(name, color, description)| LabelSpec::new(name, color, description))
    .collect()
}

/// Read the issues file
pub fn load_issues(path: &Path) -> Result<Vec<NewIssue>, SeedError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| SeedError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedIssue {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedCreate {
    pub title: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub labels: Vec<(String, LabelOutcome)>,
    pub created: Vec<CreatedIssue>,
    pub failed: Vec<FailedCreate>,
    /// Number of entries skipped for having no title
    pub skipped: usize,
}

impl SeedReport {
    pub fn render_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for (name, outcome) in &self.labels {
            if let LabelOutcome::Failed(reason) = outcome {
                lines.push(format!("Warning: failed ensuring label '{name}': {reason}"));
            }
        }
        if self.skipped > 0 {
            lines.push(format!("Skipped {} issue(s) without title", self.skipped));
        }
        lines.extend(
            self.created
                .iter()
                .map(|c| format!("Created issue: {} {}", c.title, c.url).trim_end().to_string()),
        );
        lines.extend(
            self.failed
                .iter()
                .map(|f| format!("Error creating issue '{}': {}", f.title, f.error)),
        );
        lines.push(format!(
            "Summary: {} created, {} failed, {} skipped",
            self.created.len(),
            self.failed.len(),
            self.skipped
        ));
        lines.join("\n") + "\n"
    }
}

/// Ensure `palette`, then create every issue with a non-blank title.
///
/// Neither a label nor an issue failure stops the batch.
pub async fn seed(
    tracker: &dyn TrackerClient,
    palette: &[LabelSpec],
    issues: &[NewIssue],
) -> SeedReport {
    let mut report = SeedReport {
        labels: ensure_labels(tracker, palette).await,
        ..SeedReport::default()
    };

    for issue in issues {
        let title = issue.title.trim();
        if title.is_empty() {
            warn!("Skipping issue without title");
            report.skipped += 1;
            continue;
        }

        let issue = NewIssue {
            title: title.to_string(),
            body: issue.body.trim().to_string(),
            labels: issue.labels.clone(),
        };

        match tracker.issue_create(&issue).await {
            Ok(url) => {
                info!(title = %issue.title, url = %url, "Created issue");
                report.created.push(CreatedIssue {
                    title: issue.title,
                    url,
                });
            }
            Err(e) => {
                warn!(title = %issue.title, error = %e, "Failed to create issue");
                report.failed.push(FailedCreate {
                    title: issue.title,
                    error: e.to_string(),
                });
            }
        }
    }

    report
}
