//! Startup sequence (§5's "short, bounded" blocking-operation class):
//! repo-facts discovery, the two-phase config load (rc files, then VCS
//! config), and the `core.worktree` chdir dance.

use anyhow::{Context, Result};
use core_git::RepoFacts;
use core_options::{Options, VcsConfigEntry};
use std::path::PathBuf;
use std::process::Command;

pub struct Startup {
    pub facts: RepoFacts,
    pub options: Options,
    /// Previous cwd, if `core.worktree` triggered the chdir dance — restored
    /// on quit so the process leaves the directory as it found it.
    pub worktree_restore: Option<PathBuf>,
}

pub fn run() -> Result<Startup> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let facts = RepoFacts::discover(&cwd).context("not a git repository (or any parent up to the filesystem root)")?;

    let mut options = Options::default();
    core_options::load_defaults(&mut options);

    let config_output =
        Command::new("git").args(["config", "--list"]).current_dir(&cwd).output().context("spawning git config --list")?;
    let config_text = String::from_utf8_lossy(&config_output.stdout).to_string();
    let entries: Vec<VcsConfigEntry> =
        config_text.lines().filter_map(|line| line.split_once('=')).map(|(key, value)| VcsConfigEntry { key, value }).collect();

    let head_branch = facts.head.as_deref().unwrap_or("HEAD");
    let outcome = core_options::config::apply_vcs_config(&mut options, &entries, head_branch);

    let mut worktree_restore = None;
    if let Some(worktree) = outcome.core_worktree.as_deref() {
        let git_dir = facts.absolute_git_dir(&cwd);
        worktree_restore = Some(core_options::resolve_worktree(&git_dir, worktree)?);
    } else {
        // `resolve_worktree` exports GIT_DIR itself; without a worktree
        // override we still owe children an explicit GIT_DIR (§6.2).
        let git_dir = facts.absolute_git_dir(&cwd);
        // SAFETY: startup runs before any other thread is spawned.
        unsafe {
            std::env::set_var("GIT_DIR", &git_dir);
        }
    }

    Ok(Startup { facts, options, worktree_restore })
}

/// Export `LINES`/`COLUMNS` for every subprocess spawned afterward (§6.2).
pub fn export_screen_size(width: u16, height: u16) {
    // SAFETY: called from the single-threaded event loop between pipe spawns.
    unsafe {
        std::env::set_var("LINES", height.to_string());
        std::env::set_var("COLUMNS", width.to_string());
    }
}

/// Undo the `core.worktree` chdir dance on quit, best-effort.
pub fn restore_worktree(worktree_restore: Option<&PathBuf>) {
    if let Some(dir) = worktree_restore {
        let _ = std::env::set_current_dir(dir);
    }
}
