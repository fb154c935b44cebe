//! Command-line parsing and argv partitioning (§6.3).
//!
//! `gitview [opts] [revs] [--] [paths]` layers a handful of subcommands and
//! an optional `+<n>` jump target on top of whatever `git log`/`git diff`
//! style revision range and pathspec the user typed, so separating "is this
//! a flag, a revision, or a path" reuses the same trick `git rev-parse`
//! itself exists for: run it three times with `--revs-only`/`--flags`/
//! `--no-revs --no-flags` and let it sort the argv out.

use anyhow::{Context, Result};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Main,
    Log,
    Show,
    Blame,
    Status,
    Stash,
    Pager,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedArgv {
    pub revs: Vec<String>,
    pub file_args: Vec<String>,
    pub diff_options: Vec<String>,
    pub blame_options: Vec<String>,
    pub jump_line: Option<usize>,
}

pub struct Cli {
    pub mode: Mode,
    pub argv: ParsedArgv,
}

pub fn print_version() {
    println!("gitview {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_help() {
    println!("usage: gitview [options] [revs] [--] [paths]");
    println!("       gitview log|show|blame|status|stash [options] [revs] [--] [paths]");
    println!("       <git-log-output> | gitview");
    println!();
    println!("  +<n>           jump to line n on open");
    println!("  -v, --version  print the version and exit");
    println!("  -h, --help     print this message and exit");
}

/// Parse `argv` (excluding argv[0]). `stdin_is_pipe` selects pager mode
/// (§6.3 `tig < <stream>`) when no mode, revision, or path was given.
pub fn parse(argv: &[String], stdin_is_pipe: bool) -> Result<Cli> {
    if argv.iter().any(|a| a == "-v" || a == "--version") {
        print_version();
        std::process::exit(0);
    }
    if argv.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        std::process::exit(0);
    }

    let mut rest = argv.to_vec();
    let mode = match rest.first().map(String::as_str) {
        Some("log") => {
            rest.remove(0);
            Mode::Log
        }
        Some("show") => {
            rest.remove(0);
            Mode::Show
        }
        Some("blame") => {
            rest.remove(0);
            Mode::Blame
        }
        Some("status") => {
            rest.remove(0);
            Mode::Status
        }
        Some("stash") => {
            rest.remove(0);
            Mode::Stash
        }
        _ => Mode::Main,
    };

    let mut jump_line = None;
    rest.retain(|a| match a.strip_prefix('+').and_then(|n| n.parse::<usize>().ok()) {
        Some(n) => {
            jump_line = Some(n);
            false
        }
        None => true,
    });

    let (before, after) = match rest.iter().position(|a| a == "--") {
        Some(idx) => (rest[..idx].to_vec(), rest[idx + 1..].to_vec()),
        None => (rest, Vec::new()),
    };

    let mut argv = partition_via_rev_parse(&before)?;
    argv.file_args.extend(after);
    argv.jump_line = jump_line;

    let read_stdin = stdin_is_pipe && mode == Mode::Main && argv.revs.is_empty() && argv.file_args.is_empty();
    let mode = if read_stdin { Mode::Pager } else { mode };

    Ok(Cli { mode, argv })
}

/// Sort a flat argument list into revisions, argv-style flags, and bare
/// words (paths) by asking `git rev-parse` three times. A non-repository
/// or pre-initial-commit worktree makes every call fail closed to an empty
/// list rather than aborting — the caller still has its own repo-facts
/// check before this ever runs.
fn partition_via_rev_parse(args: &[String]) -> Result<ParsedArgv> {
    let mut out = ParsedArgv::default();
    if args.is_empty() {
        return Ok(out);
    }

    out.revs = run_rev_parse(args, &["--revs-only"])?;
    let flags = run_rev_parse(args, &["--no-revs", "--flags"])?;
    out.file_args = run_rev_parse(args, &["--no-revs", "--no-flags"])?;
    out.diff_options = flags.clone();
    out.blame_options = flags;
    Ok(out)
}

fn run_rev_parse(args: &[String], extra: &[&str]) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("rev-parse")
        .args(extra)
        .args(args)
        .output()
        .context("spawning git rev-parse for argument partitioning")?;
    if !output.status.success() {
        return Ok(Vec::new());
    }
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).filter(|s| !s.is_empty()).collect())
}
