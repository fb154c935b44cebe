//! Repo facts discovery (§3 "Repo facts"): a single bounded `git rev-parse`
//! invocation at startup, matching §5's "short, bounded" blocking-operation
//! class rather than the non-blocking pipe runner in `core_process`.

use crate::error::RepoError;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RepoFacts {
    pub head: Option<String>,
    pub remote: Option<String>,
    pub cdup: PathBuf,
    pub prefix: PathBuf,
    pub git_dir: PathBuf,
    pub is_inside_work_tree: bool,
}

impl RepoFacts {
    /// Run `git rev-parse` once, in `cwd`, and parse its five requested
    /// fields plus a best-effort upstream lookup. A missing upstream is not
    /// an error -- most repos don't track one.
    pub fn discover(cwd: &std::path::Path) -> Result<RepoFacts, RepoError> {
        let output = Command::new("git")
            .args([
                "rev-parse",
                "--abbrev-ref",
                "HEAD",
                "--show-cdup",
                "--show-prefix",
                "--git-dir",
                "--is-inside-work-tree",
            ])
            .current_dir(cwd)
            .output()
            .map_err(|e| RepoError::Spawn(core_process::ProcessError::Foreground(e)))?;

        if !output.status.success() {
            return Err(RepoError::NotARepo);
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let mut lines = text.lines();
        let head = lines.next().ok_or(RepoError::MalformedOutput)?;
        let cdup = lines.next().ok_or(RepoError::MalformedOutput)?;
        let prefix = lines.next().ok_or(RepoError::MalformedOutput)?;
        let git_dir = lines.next().ok_or(RepoError::MalformedOutput)?;
        let is_inside = lines.next().ok_or(RepoError::MalformedOutput)?;

        let remote = Command::new("git")
            .args(["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])
            .current_dir(cwd)
            .output()
            .ok()
            .filter(|o| o.status.success())
            .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
            .filter(|s| !s.is_empty());

        let facts = RepoFacts {
            head: Some(head.to_string()).filter(|s| s != "HEAD"),
            remote,
            cdup: PathBuf::from(cdup),
            prefix: PathBuf::from(prefix),
            git_dir: PathBuf::from(git_dir),
            is_inside_work_tree: is_inside.trim() == "true",
        };
        debug!(target: "repo", ?facts, "discovered repo facts");
        Ok(facts)
    }

    /// Absolute git-dir, resolved against `cwd` if it was reported relative.
    pub fn absolute_git_dir(&self, cwd: &std::path::Path) -> PathBuf {
        if self.git_dir.is_absolute() {
            self.git_dir.clone()
        } else {
            cwd.join(&self.git_dir)
        }
    }
}
