//! # Triage plan
//!
//! Declarative mapping of issue title to priority and milestone, plus the
//! milestones that must exist before the plan is applied.
//!
//! Plans are assembled with [`PlanBuilder`] and are immutable once built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::tracker::LabelSpec;

/// Priority tier, applied to issues as a label of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::P0, Priority::P1, Priority::P2];

    /// Label name for this priority
    pub fn label(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }

    /// Label provisioned once at the start of a run
    pub fn label_spec(self) -> LabelSpec {
        let (color, description) = match self {
            Self::P0 => ("b60205", "Critical path (MVP)"),
            Self::P1 => ("d93f0b", "MVP polish/perf"),
            Self::P2 => ("fbca04", "Beta/optional"),
        };
        LabelSpec::new(self.label(), color, description)
    }

    /// Label re-ensured right before an issue is updated
    pub fn fallback_label_spec(self) -> LabelSpec {
        LabelSpec::new(self.label(), "ededed", format!("Priority {}", self.label()))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            other => Err(format!("invalid priority '{other}', expected P0, P1 or P2")),
        }
    }
}

/// A milestone that must exist for the plan to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl MilestoneSpec {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// One issue title and where it should land
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub title: String,
    pub priority: Priority,
    pub milestone: String,
}

/// Immutable triage plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    milestones: Vec<MilestoneSpec>,
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn builder() -> PlanBuilder {
        PlanBuilder::default()
    }

    pub fn milestones(&self) -> &[MilestoneSpec] {
        &self.milestones
    }

    /// Entries in application order
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn get(&self, title: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.title == title)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder merging title groups into a [`Plan`].
///
/// Assigning a title that is already present replaces its priority and
/// milestone but keeps the position of the first assignment.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    milestones: Vec<MilestoneSpec>,
    entries: Vec<PlanEntry>,
}

impl PlanBuilder {
    /// Declare a milestone; a repeated title updates the description
    pub fn milestone(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        let spec = MilestoneSpec::new(title, description);
        match self.milestones.iter_mut().find(|m| m.title == spec.title) {
            Some(existing) => *existing = spec,
            None => self.milestones.push(spec),
        }
        self
    }

    pub fn assign(
        mut self,
        title: impl Into<String>,
        priority: Priority,
        milestone: impl Into<String>,
    ) -> Self {
        let entry = PlanEntry {
            title: title.into(),
            priority,
            milestone: milestone.into(),
        };
        match self.entries.iter_mut().find(|e| e.title == entry.title) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        self
    }

    /// Assign every title in `titles` the same priority and milestone
    pub fn group<I, S>(self, priority: Priority, milestone: &str, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        titles
            .into_iter()
            .fold(self, |builder, title| builder.assign(title, priority, milestone))
    }

    pub fn build(self) -> Plan {
        Plan {
            milestones: self.milestones,
            entries: self.entries,
        }
    }
}

const M0: &str = "M0 Setup & Schema";
const M1: &str = "M1 Ingestion Core";
const M2: &str = "M2 Enrichment + API";
const M3: &str = "M3 Semantic Search (beta)";

const P0_M0: &[&str] = &[
    "Scaffold repo structure (Go-first layout)",
    "Define 12-factor configuration",
    "Tooling: docker-compose for ClickHouse (and Redis)",
    "Makefile and scripts",
    "SQL: Author ClickHouse schema.sql",
    "SQL: Add surrogate UIDs and adjust ORDER BY",
];

const P0_M1: &[&str] = &[
    "Provider client with retries/backoff and rate limiting",
    "Implement address backfill and delta cursors",
    "Fetcher: external transactions (from/to)",
    "Fetcher: ERC-20/721/1155 transfers via logs",
    "Fetcher: approvals (ERC-20/721/1155)",
    "Fetcher: internal traces",
    "Detect contract creation and persist to contracts",
    "Normalization: unify types and timestamps",
    "Decoders: ERC-20/721/1155 topics & selectors",
    "Idempotency & dedup strategy",
    "Reorg handling with N confirmations",
    "Testing: recorded RPC fixtures and CI",
    "Observability: structured JSON logs",
];

const P0_M2: &[&str] = &[
    "Enrichment: EOA vs contract via eth_getCode",
    "Enrichment: ERC-165 and metadata (name/symbol/decimals)",
    "Label registry and confidence scoring",
    "API: POST /v1/address/:address/sync",
    "API: GET /v1/address/:address/summary",
    "API: GET lists (token-transfers, approvals, dapps)",
];

const P1_M2: &[&str] = &[
    "SQL: Common queries and projections",
    "Observability: metrics and health checks",
    "Enrichment: proxy detection (EIP-1967/UUPS)",
    "Docs: finalize PRD (EN) and ADR-0001",
    "Docs: ADR-0002 Ingestion idempotency & reorg handling",
];

const P2_M3: &[&str] = &[
    "Embeddings job and storage",
    "Semantic search helpers and filters",
    "API: GET /v1/search (text + semantic)",
];

const EPICS: &[(&str, Priority, &str)] = &[
    ("Epic: Data Model & SQL", Priority::P0, M0),
    ("Epic: Tooling & CI", Priority::P0, M0),
    ("Epic: Ingestion Pipeline", Priority::P0, M1),
    ("Epic: Normalization & Decoders", Priority::P0, M1),
    ("Epic: Enrichment & Labels", Priority::P0, M2),
    ("Epic: API", Priority::P0, M2),
    ("Epic: Observability & Reliability", Priority::P1, M2),
    ("Epic: Docs", Priority::P1, M2),
    ("Epic: Embeddings & Search", Priority::P2, M3),
];

/// The project's built-in roadmap: title groups first, epics merged last
pub fn default_plan() -> Plan {
    let builder = Plan::builder()
        .milestone(M0, "Scaffold, config, docker, ClickHouse schema, Makefile")
        .milestone(
            M1,
            "Provider client, cursors, fetchers, normalization, decoders, idempotency, reorgs",
        )
        .milestone(
            M2,
            "EOA/contract, ERC-165, labels, summary + lists API, counters",
        )
        .milestone(M3, "Embeddings pipeline, ANN queries, /search API")
        .group(Priority::P0, M0, P0_M0.iter().copied())
        .group(Priority::P0, M1, P0_M1.iter().copied())
        .group(Priority::P0, M2, P0_M2.iter().copied())
        .group(Priority::P1, M2, P1_M2.iter().copied())
        .group(Priority::P2, M3, P2_M3.iter().copied());

    EPICS
        .iter()
        .fold(builder, |b, (title, priority, milestone)| {
            b.assign(*title, *priority, *milestone)
        })
        .build()
}
