//! Commit range resolution against the last successful pipeline run.

use std::fmt;

use log::{error, info, warn};

use crate::error::LookupError;
use crate::github::{RunSource, WorkflowRun};

/// Object id of git's empty tree, used as the base of a root-commit range.
pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Where a commit range starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBase {
    /// Head commit of the last successful run on the branch.
    LastSuccessfulRun(String),
    /// The push event's "before" commit.
    EventBefore(String),
    /// The head's first parent (`head~1`).
    PreviousCommit,
    /// Nothing before the head; the head is a root commit.
    Root,
}

/// A pair of revisions delimiting the changes to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRange {
    pub base: RangeBase,
    pub head: String,
}

impl CommitRange {
    /// Revision the range starts from, as git understands it.
    pub fn from_rev(&self) -> String {
        match &self.base {
            RangeBase::LastSuccessfulRun(sha) | RangeBase::EventBefore(sha) => sha.clone(),
            RangeBase::PreviousCommit => format!("{}~1", self.head),
            RangeBase::Root => EMPTY_TREE.to_string(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.base == RangeBase::Root
    }
}

impl fmt::Display for CommitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from_rev(), self.head)
    }
}

/// Inputs for range resolution, normally taken from the CI environment.
#[derive(Debug, Clone, Default)]
pub struct RangeTarget {
    pub branch: Option<String>,
    pub current_commit: String,
    pub current_run_id: Option<String>,
    pub before_commit: Option<String>,
}

/// Resolve the range of commits made since the last successful run.
///
/// Lookup problems are logged and treated as "no previous run"; this never
/// fails. `source` carries the reason when no run source could be set up.
pub fn resolve_range(
    source: Result<&dyn RunSource, &LookupError>,
    target: &RangeTarget,
) -> CommitRange {
    let head = match target.current_commit.trim() {
        "" => "HEAD".to_string(),
        sha => sha.to_string(),
    };

    if let Some(run) = find_last_successful_run(source, target) {
        info!(
            "Last successful run: #{} on {} ({})",
            run.run_number,
            run.created_at.to_rfc3339(),
            run.status.as_deref().unwrap_or("unknown status")
        );
        return CommitRange {
            base: RangeBase::LastSuccessfulRun(run.head_sha),
            head,
        };
    }

    warn!("No last successful SHA found, using fallback");

    match target.before_commit.as_deref() {
        Some(before) if is_valid_commit_hash(before) => CommitRange {
            base: RangeBase::EventBefore(before.to_string()),
            head,
        },
        _ => CommitRange {
            base: RangeBase::PreviousCommit,
            head,
        },
    }
}

fn find_last_successful_run(
    source: Result<&dyn RunSource, &LookupError>,
    target: &RangeTarget,
) -> Option<WorkflowRun> {
    let source = match source {
        Ok(source) => source,
        Err(e) => {
            error!("{e}");
            return None;
        }
    };

    let lookup = match (target.branch.as_deref(), target.current_run_id.as_deref()) {
        (None, _) => Err(LookupError::MissingEnv("GITHUB_REF_NAME")),
        (_, None) => Err(LookupError::MissingEnv("GITHUB_RUN_ID")),
        (Some(branch), Some(run_id)) => source
            .successful_runs(branch)
            .map(|runs| latest_previous_run(runs, run_id)),
    };

    match lookup {
        Ok(Some(run)) => Some(run),
        Ok(None) => {
            info!("No previous successful runs found");
            None
        }
        Err(e) => {
            error!("{e}");
            None
        }
    }
}

/// Newest run by creation time, ignoring the run currently executing.
/// On equal timestamps the run listed first by the API wins.
pub fn latest_previous_run(runs: Vec<WorkflowRun>, current_run_id: &str) -> Option<WorkflowRun> {
    runs.into_iter()
        .filter(|run| run.id.to_string() != current_run_id)
        .reduce(|best, run| if run.created_at > best.created_at { run } else { best })
}

/// A full 40-character hex commit id that is not the all-zero "no commit" id.
pub fn is_valid_commit_hash(sha: &str) -> bool {
    sha.len() == 40
        && sha.chars().all(|c| c.is_ascii_hexdigit())
        && sha.chars().any(|c| c != '0')
}
