//! Plan files.
//!
//! A plan can be supplied as YAML instead of using the built-in roadmap:
//!
//! ```yaml
//! milestones:
//!   - title: M0 Setup & Schema
//!     description: Scaffold, config, docker
//! entries:
//!   - title: Makefile and scripts
//!     priority: P0
//!     milestone: M0 Setup & Schema
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::plan::{MilestoneSpec, Plan, PlanEntry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read plan file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid plan file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("entry '{title}' uses milestone '{milestone}' which is not declared")]
    UndeclaredMilestone { title: String, milestone: String },
}

/// On-disk plan document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    #[serde(default)]
    pub milestones: Vec<MilestoneSpec>,
    #[serde(default)]
    pub entries: Vec<PlanEntry>,
}

impl PlanFile {
    pub fn from_yaml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate and convert into a [`Plan`]. Every entry's milestone must be
    /// declared under `milestones`.
    pub fn into_plan(self) -> Result<Plan, ConfigError> {
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| !self.milestones.iter().any(|m| m.title == e.milestone))
        {
            return Err(ConfigError::UndeclaredMilestone {
                title: entry.title.clone(),
                milestone: entry.milestone.clone(),
            });
        }

        let builder = self
            .milestones
            .into_iter()
            .fold(Plan::builder(), |b, m| b.milestone(m.title, m.description));
        Ok(self
            .entries
            .into_iter()
            .fold(builder, |b, e| b.assign(e.title, e.priority, e.milestone))
            .build())
    }
}

/// Read and validate a YAML plan file
pub fn load_plan(path: &Path) -> Result<Plan, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    PlanFile::from_yaml(path, &contents)?.into_plan()
}
