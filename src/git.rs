use std::path::PathBuf;
use std::process::Command as GitCommand;

use crate::error::GitError;
use crate::range::{CommitRange, RangeBase, EMPTY_TREE};

const COMMIT_INFO_FORMAT: &str = "--pretty=format:Commit: %H%nAuthor: %an%nMessage: %s%n";

/// Commit log and diff for a commit range.
#[derive(Debug, Clone)]
pub struct GitContext {
    pub commit_info: String,
    pub diff: String,
}

/// A local repository queried through the `git` binary.
#[derive(Debug, Clone)]
pub struct GitRepo {
    workdir: PathBuf,
}

impl GitRepo {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        GitRepo {
            workdir: path.into(),
        }
    }

    fn command(&self, args: &[&str]) -> GitCommand {
        let mut cmd = GitCommand::new("git");
        cmd.current_dir(&self.workdir).args(args);
        cmd
    }

    /// Run a git command and capture stdout as String.
    pub fn output(&self, args: &[&str]) -> Result<String, GitError> {
        let owned_args = || args.iter().map(|a| a.to_string()).collect::<Vec<_>>();

        let output = self
            .command(args)
            .output()
            .map_err(|source| GitError::Spawn {
                args: owned_args(),
                source,
            })?;

        if !output.status.success() {
            return Err(GitError::Failed {
                args: owned_args(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Whether `rev` names a commit in this repository.
    pub fn has_commit(&self, rev: &str) -> Result<bool, GitError> {
        let spec = format!("{rev}^{{commit}}");
        let status = self
            .command(&["rev-parse", "--verify", "--quiet", &spec])
            .output()
            .map_err(|source| GitError::Spawn {
                args: vec!["rev-parse".into(), spec.clone()],
                source,
            })?
            .status;
        Ok(status.success())
    }

    /// Whether the checkout is a shallow clone with truncated history.
    pub fn is_shallow(&self) -> Result<bool, GitError> {
        let out = self.output(&["rev-parse", "--is-shallow-repository"])?;
        Ok(out.trim() == "true")
    }

    /// Number of parents recorded for `rev`.
    pub fn parent_count(&self, rev: &str) -> Result<usize, GitError> {
        let out = self.output(&["rev-list", "--parents", "-n", "1", rev])?;
        Ok(out.split_whitespace().count().saturating_sub(1))
    }

    /// Turn a "previous commit" range into a root range when the head has
    /// no parent, so the first commit of a repository can still be analyzed.
    ///
    /// A shallow clone hides parents that do exist, so there the range is
    /// left alone and git reports the missing revision itself.
    pub fn anchor(&self, range: CommitRange) -> Result<CommitRange, GitError> {
        if range.base != RangeBase::PreviousCommit || self.has_commit(&range.from_rev())? {
            return Ok(range);
        }
        if self.is_shallow()? {
            log::warn!("{} is in a shallow clone; its parent was not fetched", range.head);
            return Ok(range);
        }
        if self.parent_count(&range.head)? > 0 {
            return Ok(range);
        }

        log::warn!("{} has no parent commit, analyzing it from the root", range.head);
        Ok(CommitRange {
            base: RangeBase::Root,
            head: range.head,
        })
    }

    /// Commit log for the range, one block per commit.
    pub fn commit_info(&self, range: &CommitRange) -> Result<String, GitError> {
        let out = if range.is_root() {
            self.output(&["log", &range.head, COMMIT_INFO_FORMAT])?
        } else {
            self.output(&["log", &range.to_string(), COMMIT_INFO_FORMAT])?
        };
        Ok(out.trim().to_string())
    }

    /// Unified diff for the range.
    pub fn diff(&self, range: &CommitRange) -> Result<String, GitError> {
        let out = if range.is_root() {
            self.output(&["diff", EMPTY_TREE, &range.head])?
        } else {
            self.output(&["diff", &range.to_string()])?
        };
        Ok(out.trim().to_string())
    }

    pub fn extract(&self, range: &CommitRange) -> Result<GitContext, GitError> {
        log::info!("Retrieving commit information...");
        let commit_info = self.commit_info(range)?;
        log::info!("Commit information retrieved:\n{commit_info}");

        log::info!("Retrieving diff information...");
        let diff = self.diff(range)?;
        log::info!("Diff information retrieved.");

        Ok(GitContext { commit_info, diff })
    }

    /// Try to derive a repo identifier like "owner/repo" from `git remote.origin.url`.
    pub fn detect_repo_id(&self) -> Option<String> {
        let url = self
            .output(&["config", "--get", "remote.origin.url"])
            .ok()?;
        repo_id_from_remote(&url)
    }
}

/// Extract "owner/repo" from an SSH or HTTPS remote URL.
pub fn repo_id_from_remote(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches(".git");

    // For SSH: git@github.com:owner/repo
    // For HTTPS: https://github.com/owner/repo
    let path = if let Some(idx) = trimmed.find("://") {
        let rest = &trimmed[idx + 3..];
        match rest.find('/') {
            Some(slash) => &rest[slash + 1..],
            None => rest,
        }
    } else if let Some(idx) = trimmed.find(':') {
        &trimmed[idx + 1..]
    } else {
        trimmed
    };

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 2 {
        let owner = segments[segments.len() - 2];
        let repo = segments[segments.len() - 1];
        Some(format!("{owner}/{repo}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct TestRepo {
        dir: TempDir,
        repo: GitRepo,
    }

    impl TestRepo {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let repo = GitRepo::at(dir.path());
            repo.output(&["init", "--quiet"]).expect("git init");
            repo.output(&["config", "user.name", "Ada Lovelace"]).unwrap();
            repo.output(&["config", "user.email", "ada@example.com"]).unwrap();
            repo.output(&["config", "commit.gpgsign", "false"]).unwrap();
            TestRepo { dir, repo }
        }

        fn commit(&self, file: &str, content: &str, message: &str) -> String {
            fs::write(self.dir.path().join(file), content).unwrap();
            self.repo.output(&["add", file]).unwrap();
            self.repo.output(&["commit", "--quiet", "-m", message]).unwrap();
            self.repo.output(&["rev-parse", "HEAD"]).unwrap().trim().to_string()
        }
    }

    #[test]
    fn extracts_log_and_diff_for_range() {
        let t = TestRepo::new();
        let first = t.commit("a.txt", "one\n", "Initial commit");
        let second = t.commit("a.txt", "one\ntwo\n", "Add second line");

        let range = CommitRange {
            base: RangeBase::EventBefore(first.clone()),
            head: second.clone(),
        };
        let ctx = t.repo.extract(&range).unwrap();

        assert!(ctx.commit_info.starts_with(&format!("Commit: {second}")));
        assert!(ctx.commit_info.contains("Author: Ada Lovelace"));
        assert!(ctx.commit_info.contains("Message: Add second line"));
        assert!(!ctx.commit_info.contains("Initial commit"));
        assert!(ctx.diff.contains("+two"));
    }

    #[test]
    fn anchor_keeps_parent_range_when_parent_exists() {
        let t = TestRepo::new();
        t.commit("a.txt", "one\n", "Initial commit");
        let head = t.commit("a.txt", "two\n", "Change");

        let range = CommitRange {
            base: RangeBase::PreviousCommit,
            head: head.clone(),
        };
        let anchored = t.repo.anchor(range.clone()).unwrap();
        assert_eq!(anchored, range);
    }

    #[test]
    fn first_commit_is_analyzed_from_root() {
        let t = TestRepo::new();
        let head = t.commit("readme.md", "hello\n", "Initial commit");

        let range = CommitRange {
            base: RangeBase::PreviousCommit,
            head: head.clone(),
        };
        let anchored = t.repo.anchor(range).unwrap();
        assert!(anchored.is_root());

        let ctx = t.repo.extract(&anchored).unwrap();
        assert!(ctx.commit_info.contains("Message: Initial commit"));
        assert!(ctx.diff.contains("+hello"));
    }

    #[test]
    fn shallow_clone_is_not_treated_as_first_commit() {
        let t = TestRepo::new();
        t.commit("a.txt", "one\n", "First");
        t.commit("b.txt", "two\n", "Second");
        t.commit("c.txt", "three\n", "Third");

        let clone_dir = tempfile::tempdir().unwrap();
        let source = format!("file://{}", t.dir.path().display());
        let dest = clone_dir.path().join("shallow");
        let dest_str = dest.to_str().unwrap();
        GitRepo::at(clone_dir.path())
            .output(&["clone", "--quiet", "--depth", "1", &source, dest_str])
            .unwrap();

        let shallow = GitRepo::at(&dest);
        assert!(shallow.is_shallow().unwrap());
        let head = shallow.output(&["rev-parse", "HEAD"]).unwrap().trim().to_string();

        let range = CommitRange {
            base: RangeBase::PreviousCommit,
            head,
        };
        let anchored = shallow.anchor(range.clone()).unwrap();
        assert_eq!(anchored, range);

        let err = shallow.extract(&anchored).unwrap_err();
        assert_eq!(err.exit_code(), 128);
    }

    #[test]
    fn counts_parents() {
        let t = TestRepo::new();
        let first = t.commit("a.txt", "one\n", "First");
        let second = t.commit("a.txt", "two\n", "Second");

        assert!(!t.repo.is_shallow().unwrap());
        assert_eq!(t.repo.parent_count(&first).unwrap(), 0);
        assert_eq!(t.repo.parent_count(&second).unwrap(), 1);
    }

    #[test]
    fn bad_revision_is_fatal_with_exit_code() {
        let t = TestRepo::new();
        t.commit("a.txt", "one\n", "Initial commit");

        let range = CommitRange {
            base: RangeBase::EventBefore("2222222222222222222222222222222222222222".into()),
            head: "HEAD".into(),
        };
        let err = t.repo.extract(&range).unwrap_err();

        match &err {
            GitError::Failed { code, stderr, .. } => {
                assert_eq!(*code, Some(128));
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), 128);
    }

    #[test]
    fn parses_remote_urls() {
        assert_eq!(
            repo_id_from_remote("git@github.com:octo/widgets.git\n").as_deref(),
            Some("octo/widgets")
        );
        assert_eq!(
            repo_id_from_remote("https://github.com/octo/widgets").as_deref(),
            Some("octo/widgets")
        );
        assert_eq!(repo_id_from_remote("widgets"), None);
    }
}
