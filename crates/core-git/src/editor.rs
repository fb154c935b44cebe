//! Editor integration (§4.M). Resolving *which* command to run follows the
//! original `tig.c open_editor` precedence exactly (`GIT_EDITOR` wins over
//! even `core.editor`, which the distilled spec had ahead of `VISUAL`/
//! `EDITOR` -- see DESIGN.md): `GIT_EDITOR`, then `opt.editor` (populated
//! from `core.editor` during VCS config load), then `VISUAL`, then
//! `EDITOR`, then a fixed `vi` fallback.

use core_options::Options;
use std::path::{Path, PathBuf};

/// Resolve the editor argv (command words only, no file/line yet).
pub fn resolve_editor_argv(opt: &Options) -> Vec<String> {
    let editor = std::env::var("GIT_EDITOR")
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| Some(opt.editor.clone()).filter(|s| !s.is_empty()))
        .or_else(|| std::env::var("VISUAL").ok().filter(|s| !s.is_empty()))
        .or_else(|| std::env::var("EDITOR").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "vi".to_string());

    core_options::tokenize(&editor).unwrap_or_else(|_| vec![editor])
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

/// Build the full argv for opening `file` (optionally at `lineno`), per the
/// `editor-line-number` toggle. `lineno` of `0` means "no specific line".
pub fn build_editor_argv(opt: &Options, file: &Path, lineno: u32) -> (String, Vec<String>) {
    let mut argv = resolve_editor_argv(opt);
    if lineno > 0 && opt.editor_line_number {
        argv.push(format!("+{lineno}"));
    }
    argv.push(file.to_string_lossy().to_string());
    let program = argv.remove(0);
    (program, argv)
}

/// Spool blob content to `$TMPDIR/tigblob.<pid>.<name>` for the editor to
/// open, returning the path so the caller can unlink it once the editor
/// returns (§4.H).
pub fn spool_blob(name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    let dir = std::env::var_os("TMPDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    let path = dir.join(format!("tigblob.{}.{}", std::process::id(), name));
    std::fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_vi_when_nothing_set() {
        // SAFETY: test-only, single-threaded within this test's scope.
        unsafe {
            std::env::remove_var("GIT_EDITOR");
            std::env::remove_var("VISUAL");
            std::env::remove_var("EDITOR");
        }
        let opt = Options::default();
        assert_eq!(resolve_editor_argv(&opt), vec!["vi".to_string()]);
    }

    #[test]
    fn git_editor_env_wins_over_core_editor() {
        unsafe {
            std::env::set_var("GIT_EDITOR", "nano");
        }
        let mut opt = Options::default();
        opt.editor = "emacs".to_string();
        assert_eq!(resolve_editor_argv(&opt), vec!["nano".to_string()]);
        unsafe {
            std::env::remove_var("GIT_EDITOR");
        }
    }

    #[test]
    fn lineno_appended_only_when_enabled_and_nonzero() {
        unsafe {
            std::env::remove_var("GIT_EDITOR");
            std::env::remove_var("VISUAL");
            std::env::remove_var("EDITOR");
        }
        let opt = Options::default();
        let (program, args) = build_editor_argv(&opt, Path::new("/tmp/x.txt"), 12);
        assert_eq!(program, "vi");
        assert_eq!(args, vec!["+12".to_string(), "/tmp/x.txt".to_string()]);
    }
}
