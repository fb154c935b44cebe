//! Config file loading, VCS config ingestion, and worktree chdir resolution.

use crate::options::Options;
use crate::tokenizer::tokenize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One warned-and-continued failure while reading a config file, already
/// formatted the way it is reported to stderr: `<path> line N: <msg> near
/// '<prefix>'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineWarning {
    pub path: String,
    pub line: usize,
    pub message: String,
    pub near: String,
}

impl std::fmt::Display for LineWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} line {}: {} near '{}'", self.path, self.line, self.message, self.near)
    }
}

/// Apply one already-tokenized config line. Returns `Ok(())` on a recognized,
/// successfully applied statement, or `Err(message)` for the caller to wrap
/// into a [`LineWarning`].
fn apply_tokens(opts: &mut Options, tokens: &[String]) -> Result<(), String> {
    match tokens.first().map(String::as_str) {
        Some("set") => {
            // Accept both `set name = value` and `set name value`.
            let rest = &tokens[1..];
            if rest.is_empty() {
                return Err("No value assigned".to_string());
            }
            let name = &rest[0];
            let value_tokens: Vec<String> = if rest.get(1).map(String::as_str) == Some("=") {
                rest[2..].to_vec()
            } else {
                rest[1..].to_vec()
            };
            opts.set_option(name, &value_tokens).map_err(|e| e.to_string())
        }
        Some("color") => {
            let rest = &tokens[1..];
            let target = rest.first().ok_or_else(|| "No value assigned".to_string())?;
            opts.set_color(target, &rest[1..]).map_err(|e| e.to_string())
        }
        Some("bind") => {
            let rest = &tokens[1..];
            if rest.len() < 3 {
                return Err("No value assigned".to_string());
            }
            opts.bind(&rest[0], &rest[1], &rest[2..]).map_err(|e| e.to_string())
        }
        Some("source") => {
            let rest = &tokens[1..];
            let path = rest.first().ok_or_else(|| "No value assigned".to_string())?;
            load_file(opts, Path::new(path));
            Ok(())
        }
        Some(other) => Err(format!("Unknown variable name '{other}'")),
        None => Ok(()),
    }
}

/// Tokenize and apply a single `set`/`color`/`bind`/`source` statement, the
/// same statement grammar [`load_file`] reads line by line. Used by the `:`
/// prompt to run a command typed interactively rather than read from a file.
pub fn apply_line(opts: &mut Options, line: &str) -> Result<(), String> {
    let tokens = tokenize(line).map_err(|e| e.to_string())?;
    apply_tokens(opts, &tokens)
}

/// Load and apply every statement in `path`, warning (not aborting) on
/// per-line errors. Missing files are silently skipped — callers that care
/// whether a file exists should check before calling.
pub fn load_file(opts: &mut Options, path: &Path) {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (idx, raw_line) in content.lines().enumerate() {
        let tokens = match tokenize(raw_line) {
            Ok(t) => t,
            Err(e) => {
                let warning = LineWarning {
                    path: path.display().to_string(),
                    line: idx + 1,
                    message: e.to_string(),
                    near: raw_line.trim().to_string(),
                };
                warn!(target: "options", "{warning}");
                continue;
            }
        };
        if tokens.is_empty() {
            continue;
        }
        if let Err(msg) = apply_tokens(opts, &tokens) {
            let near = tokens.get(1).cloned().unwrap_or_default();
            let warning = LineWarning {
                path: path.display().to_string(),
                line: idx + 1,
                message: msg,
                near,
            };
            warn!(target: "options", "{warning}");
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the system rc path: `TIGRC_SYSTEM` or a fixed platform default.
pub fn system_rc_path() -> PathBuf {
    env::var("TIGRC_SYSTEM")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/tigrc"))
}

/// Resolve the user rc path: `TIGRC_USER` or `~/.tigrc`.
pub fn user_rc_path() -> PathBuf {
    if let Ok(p) = env::var("TIGRC_USER") {
        return expand_home(&p);
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".tigrc");
    }
    PathBuf::from(".tigrc")
}

/// Load order per the command-language spec: built-in keymap bindings are
/// installed first so that any `bind` statement in a later rc file naturally
/// wins (both paths share the same overwrite-on-duplicate keymap store);
/// system rc, then user rc, then the optional env-sourced diff option list.
pub fn load_defaults(opts: &mut Options) {
    core_keymap::install_defaults(&mut opts.keymaps);
    let system = system_rc_path();
    if system.exists() {
        load_file(opts, &system);
    }
    let user = user_rc_path();
    if user.exists() {
        load_file(opts, &user);
    }
    load_diff_opts_env(opts);
}

fn load_diff_opts_env(opts: &mut Options) {
    if let Ok(raw) = env::var("TIG_DIFF_OPTS") {
        match tokenize(&raw) {
            Ok(tokens) if !tokens.is_empty() => opts.diff_options = tokens,
            Ok(_) => {}
            Err(_) => warn!(target: "options", "TIG_DIFF_OPTS malformed, ignoring"),
        }
    }
}

/// One recognized `git config --list` key/value pair, applied during the
/// second-phase VCS config load.
pub struct VcsConfigEntry<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Default, Clone)]
pub struct VcsConfigOutcome {
    pub commit_encoding: Option<String>,
    pub core_editor: Option<String>,
    pub core_worktree: Option<String>,
    pub core_abbrev: Option<i64>,
    pub tracking_remote: Option<String>,
    pub tracking_merge: Option<String>,
}

/// Apply the recognized subset of `git config --list` output. `head_branch`
/// is the current branch name, used to match `branch.<head>.remote/.merge`.
/// Unrecognized keys are ignored, matching the option loader's forgiving
/// "warn and continue" stance.
pub fn apply_vcs_config(opts: &mut Options, entries: &[VcsConfigEntry<'_>], head_branch: &str) -> VcsConfigOutcome {
    let mut outcome = VcsConfigOutcome::default();
    let tracking_prefix = format!("branch.{head_branch}.");

    for entry in entries {
        match entry.key {
            "i18n.commitencoding" => {
                if outcome.commit_encoding.is_none() {
                    outcome.commit_encoding = Some(entry.value.to_string());
                }
            }
            "gui.encoding" => outcome.commit_encoding = Some(entry.value.to_string()),
            "core.editor" => {
                outcome.core_editor = Some(entry.value.to_string());
                opts.editor = entry.value.to_string();
            }
            "core.worktree" => outcome.core_worktree = Some(entry.value.to_string()),
            "core.abbrev" => {
                if let Ok(n) = entry.value.parse::<i64>() {
                    outcome.core_abbrev = Some(n);
                    opts.id_width = n.clamp(4, 40);
                }
            }
            key if key.starts_with("tig.color.") => {
                let target = &key["tig.color.".len()..];
                let tokens: Vec<String> = entry.value.split_whitespace().map(str::to_string).collect();
                let _ = opts.set_color(target, &tokens);
            }
            key if key.starts_with("tig.bind.") => {
                let rest = &key["tig.bind.".len()..];
                if let Some((keymap, keyspec)) = rest.split_once('.') {
                    let tokens: Vec<String> = entry.value.split_whitespace().map(str::to_string).collect();
                    let _ = opts.bind(keymap, keyspec, &tokens);
                }
            }
            key if key.starts_with("tig.") => {
                let name = &key["tig.".len()..];
                let tokens: Vec<String> = entry.value.split_whitespace().map(str::to_string).collect();
                let _ = opts.set_option(name, &tokens);
            }
            key if key.starts_with("color.") => {
                let target = &key["color.".len()..];
                let tokens: Vec<String> = entry.value.split_whitespace().map(str::to_string).collect();
                let _ = opts.set_color(target, &tokens);
            }
            key if key.starts_with(tracking_prefix.as_str()) => {
                let suffix = &key[tracking_prefix.len()..];
                match suffix {
                    "remote" => outcome.tracking_remote = Some(entry.value.to_string()),
                    "merge" => outcome.tracking_merge = Some(entry.value.to_string()),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    outcome
}

/// The `core.worktree` chdir dance: save the current directory, enter
/// `git_dir`, canonicalize it, enter the configured worktree, canonicalize
/// that as the new cwd, and export `GIT_DIR`/`GIT_WORK_TREE` for children.
///
/// Returns the previous working directory on success so the caller can
/// restore it if the dance needs to be undone.
pub fn resolve_worktree(git_dir: &Path, worktree: &str) -> std::io::Result<PathBuf> {
    let previous_cwd = env::current_dir()?;

    env::set_current_dir(git_dir)?;
    let abs_git_dir = env::current_dir()?;

    env::set_current_dir(worktree)?;
    let abs_worktree = env::current_dir()?;

    unsafe {
        env::set_var("GIT_DIR", &abs_git_dir);
        env::set_var("GIT_WORK_TREE", &abs_worktree);
    }

    Ok(previous_cwd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptionError;

    #[test]
    fn config_error_reports_with_path_and_line() {
        let mut opts = Options::default();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "set tab-size = 99999\n").unwrap();
        load_file(&mut opts, tmp.path());
        // The bad line is only warned, not fatal; the default is retained.
        assert_eq!(opts.tab_size, 8);
    }

    #[test]
    fn unknown_statement_keyword_is_warned_not_fatal() {
        let mut opts = Options::default();
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "frobnicate everything\nset tab-size = 4\n").unwrap();
        load_file(&mut opts, tmp.path());
        assert_eq!(opts.tab_size, 4);
    }

    #[test]
    fn source_directive_loads_nested_file() {
        let mut opts = Options::default();
        let inner = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(inner.path(), "set tab-size = 2\n").unwrap();
        let outer = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(outer.path(), format!("source {}\n", inner.path().display())).unwrap();
        load_file(&mut opts, outer.path());
        assert_eq!(opts.tab_size, 2);
    }

    #[test]
    fn missing_file_is_silently_skipped() {
        let mut opts = Options::default();
        load_file(&mut opts, Path::new("/definitely/does/not/exist/.tigrc"));
        assert_eq!(opts.tab_size, 8);
    }

    #[test]
    fn vcs_config_core_editor_and_abbrev() {
        let mut opts = Options::default();
        let entries = [
            VcsConfigEntry { key: "core.editor", value: "nvim" },
            VcsConfigEntry { key: "core.abbrev", value: "10" },
        ];
        let outcome = apply_vcs_config(&mut opts, &entries, "main");
        assert_eq!(outcome.core_editor.as_deref(), Some("nvim"));
        assert_eq!(opts.editor, "nvim");
        assert_eq!(opts.id_width, 10);
    }

    #[test]
    fn vcs_config_gui_encoding_wins_over_commitencoding() {
        let mut opts = Options::default();
        let entries = [
            VcsConfigEntry { key: "i18n.commitencoding", value: "latin1" },
            VcsConfigEntry { key: "gui.encoding", value: "utf-8" },
        ];
        let outcome = apply_vcs_config(&mut opts, &entries, "main");
        assert_eq!(outcome.commit_encoding.as_deref(), Some("utf-8"));
    }

    #[test]
    fn vcs_config_tracking_branch_fields() {
        let mut opts = Options::default();
        let entries = [
            VcsConfigEntry { key: "branch.main.remote", value: "origin" },
            VcsConfigEntry { key: "branch.main.merge", value: "refs/heads/main" },
        ];
        let outcome = apply_vcs_config(&mut opts, &entries, "main");
        assert_eq!(outcome.tracking_remote.as_deref(), Some("origin"));
        assert_eq!(outcome.tracking_merge.as_deref(), Some("refs/heads/main"));
    }

    #[test]
    fn vcs_config_tig_color_prefix_sets_line_color() {
        let mut opts = Options::default();
        let entries = [VcsConfigEntry { key: "tig.color.diff-add", value: "green default" }];
        apply_vcs_config(&mut opts, &entries, "main");
        let info = opts.lines.color_of(crate::line_info::LineType::DiffAdd);
        assert_eq!(info.fg, crate::line_info::Color::Green);
    }

    #[test]
    fn line_warning_display_matches_spec_format() {
        let w = LineWarning {
            path: ".tigrc".to_string(),
            line: 1,
            message: OptionError::OutOfRange.to_string(),
            near: "tab-size".to_string(),
        };
        assert_eq!(w.to_string(), ".tigrc line 1: Integer value out of bound near 'tab-size'");
    }
}
