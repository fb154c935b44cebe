//! Closed failure taxonomy for the pieces of this crate that have one:
//! repo discovery at startup, and hunk/patch construction. Everything else
//! (a per-view subprocess failing mid-flight) is reported into the status
//! line and handled by the caller, not propagated as an error type -- see
//! `core_process::ProcessError` for that path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a git repository (or any parent up to mount point)")]
    NotARepo,
    #[error("failed to run git rev-parse: {0}")]
    Spawn(#[from] core_process::ProcessError),
    #[error("git rev-parse produced unparsable output")]
    MalformedOutput,
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("selected row is not part of a diff hunk")]
    NoEnclosingHunk,
    #[error("hunk has no parent diff header")]
    NoParentHeader,
    #[error("nothing to update")]
    NothingToUpdate,
    #[error("git apply failed: {0}")]
    Apply(#[from] core_process::ProcessError),
}
