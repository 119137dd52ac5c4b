//! # GitHub CLI tracker
//!
//! [`TrackerClient`] implementation that shells out to the `gh` CLI.
//!
//! ## Example
//!
//! ```no_run
//! use triage::{GhCli, TrackerClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let gh = GhCli::new("5dlabs/cto")?;
//! gh.check_available().await?;
//!
//! for issue in gh.issues_list_open(200).await? {
//!     println!("#{} {}", issue.number, issue.title);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, TrackerError};
use crate::tracker::{
    IssueDetails, IssueSummary, LabelSpec, Milestone, MilestoneId, Mutation, NewIssue,
    RepoScope, TrackerClient,
};

/// Default program name used to invoke the GitHub CLI
pub const DEFAULT_GH_PROGRAM: &str = "gh";

/// jq filter turning the milestone array into one `{title, number}` object per line
const MILESTONE_FILTER: &str = ".[] | {title: .title, number: .number}";

/// Max labels returned by the label search used for existence checks
const LABEL_SEARCH_LIMIT: &str = "100";

/// Captured result of one `gh` invocation
#[derive(Debug)]
struct GhOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Tracker client backed by the `gh` CLI
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
    repo: RepoScope,
}

impl GhCli {
    /// Create a client for `owner/name` using `gh` from `PATH`
    pub fn new(repo: &str) -> Result<Self> {
        Ok(Self {
            program: DEFAULT_GH_PROGRAM.to_string(),
            repo: RepoScope::parse(repo)?,
        })
    }

    /// Use a different executable in place of `gh`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo(&self) -> &RepoScope {
        &self.repo
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, args: &[String]) -> Result<GhOutput> {
        debug!(program = %self.program, args = ?args, "Running gh");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TrackerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        Ok(GhOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Run and require a zero exit status, returning stdout
    async fn run_checked(&self, args: &[String]) -> Result<String> {
        let output = self.run(args).await?;
        if !output.success {
            return Err(TrackerError::Command {
                command: describe(&self.program, args),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl TrackerClient for GhCli {
    async fn check_available(&self) -> Result<()> {
        let version = self.run(&["--version".to_string()]).await;
        match version {
            Ok(out) if out.success => {}
            _ => {
                return Err(TrackerError::Unavailable(format!(
                    "{} CLI not found. Install it and run '{} auth login'.",
                    self.program, self.program
                )))
            }
        }

        let auth = self.run(&["auth".to_string(), "status".to_string()]).await?;
        if !auth.success {
            return Err(TrackerError::Unavailable(format!(
                "{} is not authenticated: {}",
                self.program, auth.stderr
            )));
        }
        Ok(())
    }

    /// `gh` has no exact label lookup, so this searches and matches the
    /// name exactly. The search is fuzzy and capped at 100 results; an
    /// exact label crowded out of those results reads as absent.
    async fn label_exists(&self, name: &str) -> Result<bool> {
        let args = label_search_args(&self.repo, name);
        let stdout = self.run_checked(&args).await?;
        let labels: Vec<LabelName> = serde_json::from_str(&stdout)
            .map_err(|e| TrackerError::malformed(describe(&self.program, &args), e))?;
        Ok(labels.iter().any(|l| l.name.eq_ignore_ascii_case(name)))
    }

    async fn label_create(&self, label: &LabelSpec) -> Result<()> {
        self.run_checked(&label_create_args(&self.repo, label))
            .await?;
        info!(label = %label.name, "Created label");
        Ok(())
    }

    async fn milestones_list(&self) -> Result<Vec<Milestone>> {
        let stdout = self.run_checked(&milestones_list_args(&self.repo)).await?;
        Ok(parse_milestone_lines(&stdout))
    }

    async fn milestone_create(&self, title: &str, description: &str) -> Result<Milestone> {
        let stdout = self
            .run_checked(&milestone_create_args(&self.repo, title, description))
            .await?;
        let created = parse_created_milestone(title, &stdout)?;
        info!(milestone = %created.title, id = %created.id, "Created milestone");
        Ok(created)
    }

    async fn issues_list_open(&self, limit: usize) -> Result<Vec<IssueSummary>> {
        let args = issues_list_args(&self.repo, limit);
        let stdout = self.run_checked(&args).await?;
        serde_json::from_str(&stdout)
            .map_err(|e| TrackerError::malformed(describe(&self.program, &args), e))
    }

    async fn issue_edit_combined(
        &self,
        number: u64,
        add_label: &str,
        milestone_title: &str,
    ) -> Result<()> {
        self.run_checked(&issue_edit_args(&self.repo, number, add_label, milestone_title))
            .await?;
        Ok(())
    }

    async fn issue_get(&self, number: u64) -> Result<IssueDetails> {
        let args = issue_get_args(&self.repo, number);
        let stdout = self.run_checked(&args).await?;
        let issue: ApiIssue = serde_json::from_str(&stdout)
            .map_err(|e| TrackerError::malformed(describe(&self.program, &args), e))?;
        Ok(IssueDetails {
            number,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        })
    }

    async fn issue_patch(
        &self,
        number: u64,
        milestone: MilestoneId,
        labels: &[String],
    ) -> Result<()> {
        let output = self
            .run(&issue_patch_args(&self.repo, number, milestone, labels))
            .await?;
        if !output.success {
            return Err(TrackerError::Patch {
                number,
                reason: output.stderr,
            });
        }
        Ok(())
    }

    async fn issue_create(&self, issue: &NewIssue) -> Result<String> {
        let stdout = self
            .run_checked(&issue_create_args(&self.repo, issue))
            .await?;
        Ok(stdout.trim().to_string())
    }

    fn command_line(&self, mutation: &Mutation<'_>) -> String {
        let args = match *mutation {
            Mutation::LabelCreate(label) => label_create_args(&self.repo, label),
            Mutation::MilestoneCreate { title, description } => {
                milestone_create_args(&self.repo, title, description)
            }
            Mutation::IssueEdit {
                number,
                add_label,
                milestone_title,
            } => issue_edit_args(&self.repo, number, add_label, milestone_title),
            Mutation::IssuePatch {
                number,
                milestone,
                labels,
            } => issue_patch_args(&self.repo, number, milestone, labels),
            Mutation::IssueCreate(issue) => issue_create_args(&self.repo, issue),
        };
        shell_line(&self.program, &args)
    }
}

#[derive(Debug, Deserialize)]
struct LabelName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiIssue {
    #[serde(default)]
    labels: Vec<LabelName>,
}

#[derive(Debug, Deserialize)]
struct CreatedMilestone {
    number: u64,
    #[serde(default)]
    title: Option<String>,
}

/// Parse the line-delimited `{title, number}` objects produced by
/// [`MILESTONE_FILTER`]. Lines that are not such an object are skipped.
pub fn parse_milestone_lines(stdout: &str) -> Vec<Milestone> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Milestone>(line) {
            Ok(ms) => Some(ms),
            Err(e) => {
                debug!(line, error = %e, "Skipping unparseable milestone line");
                None
            }
        })
        .collect()
}

fn parse_created_milestone(title: &str, stdout: &str) -> Result<Milestone> {
    let created: CreatedMilestone =
        serde_json::from_str(stdout).map_err(|e| TrackerError::MilestoneCreation {
            title: title.to_string(),
            reason: format!("{e}; response: {}", stdout.trim()),
        })?;
    Ok(Milestone {
        title: created.title.unwrap_or_else(|| title.to_string()),
        id: MilestoneId(created.number),
    })
}

fn describe(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a command so it can be pasted into a POSIX shell
fn shell_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

fn strings<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn label_search_args(repo: &RepoScope, name: &str) -> Vec<String> {
    strings([
        "label",
        "list",
        "--repo",
        &repo.to_string(),
        "--search",
        name,
        "--json",
        "name",
        "--limit",
        LABEL_SEARCH_LIMIT,
    ])
}

fn label_create_args(repo: &RepoScope, label: &LabelSpec) -> Vec<String> {
    let mut args = strings([
        "label",
        "create",
        &label.name,
        "--repo",
        &repo.to_string(),
        "--color",
        &label.color,
    ]);
    if !label.description.is_empty() {
        args.extend(strings(["--description", &label.description]));
    }
    args
}

fn milestones_list_args(repo: &RepoScope) -> Vec<String> {
    strings([
        "api",
        &format!("repos/{repo}/milestones"),
        "-q",
        MILESTONE_FILTER,
    ])
}

fn milestone_create_args(repo: &RepoScope, title: &str, description: &str) -> Vec<String> {
    strings([
        "api",
        &format!("repos/{repo}/milestones"),
        "-X",
        "POST",
        "-f",
        &format!("title={title}"),
        "-f",
        "state=open",
        "-f",
        &format!("description={description}"),
    ])
}

fn issues_list_args(repo: &RepoScope, limit: usize) -> Vec<String> {
    strings([
        "issue",
        "list",
        "--repo",
        &repo.to_string(),
        "--limit",
        &limit.to_string(),
        "--state",
        "open",
        "--json",
        "number,title",
    ])
}

fn issue_edit_args(repo: &RepoScope, number: u64, label: &str, milestone: &str) -> Vec<String> {
    strings([
        "issue",
        "edit",
        &number.to_string(),
        "--repo",
        &repo.to_string(),
        "--add-label",
        label,
        "--milestone",
        milestone,
    ])
}

fn issue_get_args(repo: &RepoScope, number: u64) -> Vec<String> {
    strings(["api", &format!("repos/{repo}/issues/{number}")])
}

fn issue_patch_args(
    repo: &RepoScope,
    number: u64,
    milestone: MilestoneId,
    labels: &[String],
) -> Vec<String> {
    let mut args = strings([
        "api",
        &format!("repos/{repo}/issues/{number}"),
        "-X",
        "PATCH",
        "-f",
        &format!("milestone={milestone}"),
    ]);
    for label in labels {
        args.push("-f".to_string());
        args.push(format!("labels[]={label}"));
    }
    args
}

fn issue_create_args(repo: &RepoScope, issue: &NewIssue) -> Vec<String> {
    let mut args = strings([
        "issue",
        "create",
        "--repo",
        &repo.to_string(),
        "--title",
        &issue.title,
        "--body",
        &issue.body,
    ]);
    for label in &issue.labels {
        args.push("--label".to_string());
        args.push(label.clone());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn repo() -> RepoScope {
        RepoScope::parse("o/r").unwrap()
    }

    #[test]
    fn test_parse_milestone_lines() {
        let out = "{\"title\":\"M1\",\"number\":1}\n\n{\"title\":\"M2\",\"number\":2}\n";
        let parsed = parse_milestone_lines(out);
        assert_eq!(
            parsed,
            vec![
                Milestone {
                    title: "M1".to_string(),
                    id: MilestoneId(1)
                },
                Milestone {
                    title: "M2".to_string(),
                    id: MilestoneId(2)
                },
            ]
        );
    }

    #[test]
    fn test_parse_milestone_lines_skips_malformed() {
        let out = "not json\n{\"title\":\"M1\"}\n{\"title\":\"M3\",\"number\":3}\n";
        let parsed = parse_milestone_lines(out);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title, "M3");
    }

    #[test]
    fn test_parse_created_milestone() {
        let ms = parse_created_milestone("M9", r#"{"number": 42, "title": "M9"}"#).unwrap();
        assert_eq!(ms.id, MilestoneId(42));

        let err = parse_created_milestone("M9", "<html>oops</html>").unwrap_err();
        assert!(matches!(err, TrackerError::MilestoneCreation { ref title, .. } if title == "M9"));
    }

    #[test]
    fn test_issue_edit_args() {
        assert_eq!(
            issue_edit_args(&repo(), 10, "P0", "M1"),
            strings([
                "issue",
                "edit",
                "10",
                "--repo",
                "o/r",
                "--add-label",
                "P0",
                "--milestone",
                "M1"
            ])
        );
    }

    #[test]
    fn test_issue_patch_args_repeat_labels() {
        let labels = vec!["existing".to_string(), "P1".to_string()];
        assert_eq!(
            issue_patch_args(&repo(), 9, MilestoneId(7), &labels),
            strings([
                "api",
                "repos/o/r/issues/9",
                "-X",
                "PATCH",
                "-f",
                "milestone=7",
                "-f",
                "labels[]=existing",
                "-f",
                "labels[]=P1"
            ])
        );
    }

    #[test]
    fn test_milestone_create_args() {
        let args = milestone_create_args(&repo(), "M0 Setup & Schema", "Scaffold");
        assert_eq!(args[1], "repos/o/r/milestones");
        assert!(args.contains(&"POST".to_string()));
        assert!(args.contains(&"title=M0 Setup & Schema".to_string()));
        assert!(args.contains(&"state=open".to_string()));
        assert!(args.contains(&"description=Scaffold".to_string()));
    }

    #[test]
    fn test_issues_list_args_carry_limit() {
        let args = issues_list_args(&repo(), 200);
        let limit_pos = args.iter().position(|a| a == "--limit").unwrap();
        assert_eq!(args[limit_pos + 1], "200");
        assert!(args.contains(&"number,title".to_string()));
    }

    #[test]
    fn test_label_create_args_omit_empty_description() {
        let args = label_create_args(&repo(), &LabelSpec::new("docs", "0366d6", ""));
        assert!(!args.contains(&"--description".to_string()));

        let args = label_create_args(&repo(), &LabelSpec::new("P0", "b60205", "Critical"));
        assert!(args.ends_with(&strings(["--description", "Critical"])));
    }

    #[test]
    fn test_issue_create_args() {
        let issue = NewIssue {
            title: "Scaffold".to_string(),
            body: "Do it".to_string(),
            labels: vec!["epic".to_string(), "tooling".to_string()],
        };
        let args = issue_create_args(&repo(), &issue);
        assert_eq!(
            args.iter().filter(|a| a.as_str() == "--label").count(),
            2
        );
        assert!(args.ends_with(&strings(["--label", "epic", "--label", "tooling"])));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe("gh", &strings(["issue", "list"])),
            "gh issue list"
        );
    }

    #[test]
    fn test_with_program() {
        let gh = GhCli::new("o/r").unwrap().with_program("/opt/bin/gh");
        assert_eq!(gh.program(), "/opt/bin/gh");
        assert_eq!(gh.repo().to_string(), "o/r");
    }

    #[test]
    fn test_command_line_is_pasteable_gh() {
        let gh = GhCli::new("o/r").unwrap();
        let label = LabelSpec::new("P1", "d93f0b", "MVP polish/perf");
        assert_eq!(
            gh.command_line(&Mutation::LabelCreate(&label)),
            "gh label create P1 --repo o/r --color d93f0b --description 'MVP polish/perf'"
        );

        let labels = vec!["existing".to_string(), "P1".to_string()];
        assert_eq!(
            gh.command_line(&Mutation::IssuePatch {
                number: 9,
                milestone: MilestoneId(7),
                labels: &labels,
            }),
            "gh api repos/o/r/issues/9 -X PATCH -f milestone=7 -f 'labels[]=existing' -f 'labels[]=P1'"
        );
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("plain-word"), "plain-word");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
