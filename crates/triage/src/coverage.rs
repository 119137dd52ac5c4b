//! # Coverage gate
//!
//! Enforces a minimum total statement coverage on a Go coverage profile by
//! reading the `total:` line of `go tool cover -func`.
//!
//! A profile with no measured statements reports `0.0%`; that case is
//! skipped rather than failed.

use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Required coverage when none is given
pub const DEFAULT_THRESHOLD: f64 = 100.0;

const EPSILON: f64 = 1e-9;

static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"total:\s*\(statements\)\s*([0-9.]+)%").expect("total line regex is valid")
});

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("failed to read coverage: {0}")]
    Tool(String),

    #[error("no total coverage line found")]
    MissingTotal,

    #[error("could not parse total coverage: {0}")]
    Unparseable(String),
}

/// Result of checking a total against the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CoverageVerdict {
    /// Nothing was measured
    Skip,
    Pass { percent: f64 },
    Fail { percent: f64, threshold: f64 },
}

impl CoverageVerdict {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Skip => "No measured statements; skipping enforcement.".to_string(),
            Self::Pass { percent } => format!("Coverage OK: {percent}%"),
            Self::Fail { percent, threshold } => {
                format!("Coverage {percent}% is below required {threshold}%")
            }
        }
    }
}

/// Extract the total percentage from `go tool cover -func` output.
///
/// When several `total:` lines are present the last one counts.
pub fn parse_total(output: &str) -> Result<f64, CoverageError> {
    let line = output
        .lines()
        .rev()
        .find(|l| l.starts_with("total:"))
        .ok_or(CoverageError::MissingTotal)?;

    TOTAL_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .ok_or_else(|| CoverageError::Unparseable(line.to_string()))
}

/// Compare `percent` against `threshold`
pub fn evaluate(percent: f64, threshold: f64) -> CoverageVerdict {
    if percent.abs() < EPSILON {
        return CoverageVerdict::Skip;
    }
    if percent + EPSILON >= threshold {
        CoverageVerdict::Pass { percent }
    } else {
        CoverageVerdict::Fail { percent, threshold }
    }
}

/// Run `go tool cover -func <profile>` and return its stdout
pub async fn run_go_cover(profile: &Path) -> Result<String, CoverageError> {
    debug!(profile = %profile.display(), "Running go tool cover");

    let output = Command::new("go")
        .args(["tool", "cover", "-func"])
        .arg(profile)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| CoverageError::Tool(e.to_string()))?;

    if !output.status.success() {
        return Err(CoverageError::Tool(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse and evaluate in one step
pub fn check(output: &str, threshold: f64) -> Result<CoverageVerdict, CoverageError> {
    Ok(evaluate(parse_total(output)?, threshold))
}
