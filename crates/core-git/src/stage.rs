//! Stage view (§4.K): a per-file diff pager opened from a status row, plus
//! the hunk-apply engine behind `StageUpdate`/`StageUpdateLine`/
//! `StatusRevert`/`StageNextHunk` that turns a selected row into a
//! `git apply`/`update-index` subprocess call.

use crate::diff::{self, DiffState};
use crate::hunk;
use crate::status::StatusSection;
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::Frame;
use core_view::{View, ViewKind, ViewOps};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Which status row a stage view was opened against. The generic `View`
/// has nowhere to stash a status entry, so the status view's `Enter`
/// handler encodes one onto `view.argv_template` and this decodes it back.
#[derive(Debug, Clone, Default)]
pub struct StageTarget {
    pub section: StatusSection,
    pub status: char,
    pub old_mode: String,
    pub old_rev: String,
    pub old_name: String,
    pub new_mode: String,
    pub new_rev: String,
    pub new_name: String,
    pub head_unborn: bool,
}

impl StageTarget {
    pub fn encode(&self) -> Vec<String> {
        vec![
            section_tag(self.section).to_string(),
            self.status.to_string(),
            self.old_mode.clone(),
            self.old_rev.clone(),
            self.old_name.clone(),
            self.new_mode.clone(),
            self.new_rev.clone(),
            self.new_name.clone(),
            if self.head_unborn { "1" } else { "0" }.to_string(),
        ]
    }

    fn decode(template: &[String]) -> Option<StageTarget> {
        Some(StageTarget {
            section: section_from_tag(template.first()?)?,
            status: template.get(1)?.chars().next()?,
            old_mode: template.get(2)?.clone(),
            old_rev: template.get(3)?.clone(),
            old_name: template.get(4)?.clone(),
            new_mode: template.get(5)?.clone(),
            new_rev: template.get(6)?.clone(),
            new_name: template.get(7)?.clone(),
            head_unborn: template.get(8).map(String::as_str) == Some("1"),
        })
    }

    fn path(&self) -> &str {
        if self.new_name.is_empty() {
            &self.old_name
        } else {
            &self.new_name
        }
    }
}

fn section_tag(section: StatusSection) -> &'static str {
    match section {
        StatusSection::Staged => "staged",
        StatusSection::Unstaged => "unstaged",
        StatusSection::Untracked => "untracked",
    }
}

fn section_from_tag(tag: &str) -> Option<StatusSection> {
    match tag {
        "staged" => Some(StatusSection::Staged),
        "unstaged" => Some(StatusSection::Unstaged),
        "untracked" => Some(StatusSection::Untracked),
        _ => None,
    }
}

pub struct StageOps {
    state: DiffState,
    target: StageTarget,
}

impl StageOps {
    pub fn new() -> Self {
        StageOps { state: DiffState::default(), target: StageTarget::default() }
    }
}

/// Exclusive end index of the hunk starting at `hunk_index`: the next
/// `@@` or `diff --git` header, or end of stream.
fn hunk_extent(lines: &[core_view::Line], hunk_index: usize) -> usize {
    (hunk_index + 1..lines.len())
        .find(|&i| matches!(lines[i].line_type, LineType::DiffChunk | LineType::DiffHeader))
        .unwrap_or(lines.len())
}

fn header_text(lines: &[core_view::Line], diff_index: usize, hunk_index: usize) -> String {
    let mut patch = String::new();
    for line in &lines[diff_index..hunk_index] {
        patch.push_str(&line.data);
        patch.push('\n');
    }
    patch
}

fn build_whole_hunk_patch(view: &View, diff_index: usize, hunk_index: usize) -> String {
    let end = hunk_extent(&view.lines, hunk_index);
    let mut patch = header_text(&view.lines, diff_index, hunk_index);
    for line in &view.lines[hunk_index..end] {
        patch.push_str(&line.data);
        patch.push('\n');
    }
    patch
}

/// Rewrite the hunk header to cover exactly `target_index` (§4.K "Hunk
/// apply" step 2, single-line case): `(0,1)` for an added row, `(1,0)` for
/// a deleted one, with `L` recomputed by walking context to that row.
fn build_single_line_patch(view: &View, diff_index: usize, hunk_index: usize, target_index: usize) -> Option<String> {
    let target = &view.lines[target_index];
    let (lineno, counts) = if target.data.starts_with('+') {
        (hunk::post_image_lineno(&view.lines, hunk_index, target_index)?, (0, 1))
    } else if target.data.starts_with('-') {
        (hunk::pre_image_lineno(&view.lines, hunk_index, target_index)?, (1, 0))
    } else {
        return None;
    };
    let mut patch = header_text(&view.lines, diff_index, hunk_index);
    patch.push_str(&format!("@@ -{lineno},{} +{lineno},{} @@\n", counts.0, counts.1));
    patch.push_str(&target.data);
    patch.push('\n');
    Some(patch)
}

/// STAGED: `update-index --index-info` lines of `<old mode> <old rev>\t<old name>\0`.
/// UNSTAGED/UNTRACKED: `update-index --add --remove --stdin`, one NUL-terminated name.
fn build_whole_file_script(target: &StageTarget) -> (Vec<&'static str>, String) {
    match target.section {
        StatusSection::Staged => {
            let stdin = format!("{} {}\t{}\0", target.old_mode, target.old_rev, target.old_name);
            (vec!["update-index", "--index-info"], stdin)
        }
        StatusSection::Unstaged | StatusSection::Untracked => {
            let stdin = format!("{}\0", target.path());
            (vec!["update-index", "--add", "--remove", "--stdin"], stdin)
        }
    }
}

fn run_git_stdin(dir: Option<&Path>, args: &[&str], stdin: &str) -> bool {
    let mut child = match Command::new("git")
        .args(args)
        .current_dir(dir.unwrap_or_else(|| Path::new(".")))
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(c) => c,
        Err(_) => return false,
    };
    if let Some(mut pipe) = child.stdin.take() {
        if pipe.write_all(stdin.as_bytes()).is_err() {
            return false;
        }
    }
    child.wait().map(|s| s.success()).unwrap_or(false)
}

fn run_git(dir: Option<&Path>, args: &[&str]) -> bool {
    Command::new("git").args(args).current_dir(dir.unwrap_or_else(|| Path::new("."))).status().map(|s| s.success()).unwrap_or(false)
}

/// Whole-file stage/unstage, used directly by the status view (no hunk is
/// ever in view there) and as the stage view's fallback when a selected
/// row has no enclosing `@@` header (new-file add, index-only staging).
pub(crate) fn whole_file_update(dir: Option<&Path>, target: &StageTarget) -> bool {
    let (args, stdin) = build_whole_file_script(target);
    run_git_stdin(dir, &args, &stdin)
}

/// §4.K "Revert": unstaged only. Previously-unmerged entries restore the
/// index via `--cacheinfo`; a to-be-deleted entry (`U` with new mode `0`)
/// uses `--force-remove` instead. Either way, `checkout --` discards the
/// working-tree copy.
pub(crate) fn whole_file_revert(dir: Option<&Path>, target: &StageTarget) -> bool {
    if target.section != StatusSection::Unstaged {
        return false;
    }
    let restored = if target.status == 'U' && target.new_mode.chars().all(|c| c == '0') {
        run_git(dir, &["update-index", "--force-remove", "--", &target.old_name])
    } else {
        run_git(dir, &["update-index", "--cacheinfo", &target.old_mode, &target.old_rev, &target.old_name])
    };
    restored && run_git(dir, &["checkout", "--", &target.old_name])
}

impl ViewOps for StageOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Stage
    }

    fn open_argv(&mut self, view: &View, _opt: &Options) -> (String, Vec<String>) {
        self.state = DiffState::default();
        self.target = StageTarget::decode(&view.argv_template).unwrap_or_default();
        let path = self.target.path().to_string();
        match (self.target.section, self.target.head_unborn, self.target.status) {
            (StatusSection::Untracked, ..) => ("cat".to_string(), vec!["--".to_string(), path]),
            (StatusSection::Staged, true, _) => {
                ("git".to_string(), vec!["diff".to_string(), "--no-color".to_string(), "--cached".to_string(), "--".to_string(), path])
            }
            (StatusSection::Staged, false, _) => (
                "git".to_string(),
                vec!["diff-index".to_string(), "--no-color".to_string(), "-p".to_string(), "--cached".to_string(), "HEAD".to_string(), "--".to_string(), path],
            ),
            (StatusSection::Unstaged, _, 'U') => (
                "git".to_string(),
                vec!["diff-files".to_string(), "--no-color".to_string(), "-p".to_string(), "--root".to_string(), "--".to_string(), self.target.old_name.clone()],
            ),
            (StatusSection::Unstaged, _, _) => {
                ("git".to_string(), vec!["diff-files".to_string(), "--no-color".to_string(), "-p".to_string(), "--".to_string(), path])
            }
        }
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw).to_string();
        let lineno = view.line_count() + 1;
        let line_type = if self.target.section == StatusSection::Untracked {
            opt.lines.classify(&text)
        } else {
            diff::reclassify(&mut self.state, &opt.lines, &text)
        };
        for line in crate::pager::split_wrapped(line_type, lineno, &text, view.width, opt.wrap_lines) {
            view.lines.push(line);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        crate::pager::draw_text_row(frame, opt, view, &line, row)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::StageUpdate | Request::StageUpdateLine | Request::StatusRevert => {
                let Some(idx) = line_index else { return Request::None };
                let cached = matches!(req, Request::StageUpdate | Request::StageUpdateLine);
                let reverse = req == Request::StatusRevert || self.target.section == StatusSection::Staged;
                let dir = view.dir.clone();

                let ok = match hunk::find_enclosing(&view.lines, idx) {
                    Some((diff_idx, hunk_idx)) => {
                        let patch = if req == Request::StageUpdateLine {
                            build_single_line_patch(view, diff_idx, hunk_idx, idx)
                        } else {
                            Some(build_whole_hunk_patch(view, diff_idx, hunk_idx))
                        };
                        match patch {
                            Some(patch) => {
                                let mut args = vec!["apply"];
                                if cached {
                                    args.push("--cached");
                                }
                                if req == Request::StageUpdateLine {
                                    args.push("--unidiff-zero");
                                }
                                if reverse {
                                    args.push("-R");
                                }
                                run_git_stdin(dir.as_deref(), &args, &patch)
                            }
                            // The selected row isn't an add/del line (e.g. context): nothing to apply.
                            None => false,
                        }
                    }
                    // No hunk in view at all: new-file add, untracked add, or an index-only stage.
                    None if req == Request::StatusRevert => whole_file_revert(dir.as_deref(), &self.target),
                    None => whole_file_update(dir.as_deref(), &self.target),
                };
                if ok { Request::Reload } else { Request::None }
            }
            Request::StageNextHunk => {
                let Some(idx) = line_index else { return Request::None };
                let next = (idx + 1..view.lines.len()).find(|&i| view.lines[i].line_type == LineType::DiffChunk);
                match next {
                    Some(i) => {
                        view.pos.lineno = i;
                        Request::None
                    }
                    None => Request::None,
                }
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, _view: &mut View, _line_index: usize) {}

    fn done(&mut self, _view: &mut View) {
        self.state = DiffState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_view::Line;

    fn diff_lines() -> Vec<Line> {
        vec![
            Line::new(LineType::DiffHeader, 0, "diff --git a/f.rs b/f.rs"),
            Line::new(LineType::DiffIndex, 0, "index aaa..bbb 100644"),
            Line::new(LineType::DiffHeader, 0, "--- a/f.rs"),
            Line::new(LineType::DiffHeader, 0, "+++ b/f.rs"),
            Line::new(LineType::DiffChunk, 0, "@@ -10,0 +10,2 @@"),
            Line::new(LineType::DiffAdd, 0, "+first"),
            Line::new(LineType::DiffAdd, 0, "+second"),
        ]
    }

    #[test]
    fn encodes_and_decodes_stage_target_round_trip() {
        let target = StageTarget {
            section: StatusSection::Staged,
            status: 'M',
            old_mode: "100644".into(),
            old_rev: "aaa".into(),
            old_name: "f.rs".into(),
            new_mode: "100644".into(),
            new_rev: "bbb".into(),
            new_name: "f.rs".into(),
            head_unborn: false,
        };
        let decoded = StageTarget::decode(&target.encode()).unwrap();
        assert_eq!(decoded.status, 'M');
        assert_eq!(decoded.path(), "f.rs");
    }

    #[test]
    fn builds_single_line_patch_for_second_added_row() {
        let mut view = View::new(ViewKind::Stage, 80, 24);
        view.lines = diff_lines();
        let patch = build_single_line_patch(&view, 0, 4, 6).unwrap();
        assert!(patch.contains("@@ -11,0 +11,1 @@"));
        assert!(patch.trim_end().ends_with("+second"));
        assert!(patch.contains("diff --git a/f.rs b/f.rs"));
    }

    #[test]
    fn builds_whole_hunk_patch_including_header_group() {
        let mut view = View::new(ViewKind::Stage, 80, 24);
        view.lines = diff_lines();
        let patch = build_whole_hunk_patch(&view, 0, 4);
        assert!(patch.contains("@@ -10,0 +10,2 @@"));
        assert!(patch.contains("+first"));
        assert!(patch.contains("+second"));
    }

    #[test]
    fn whole_file_script_picks_index_info_for_staged_and_stdin_otherwise() {
        let staged = StageTarget { section: StatusSection::Staged, old_mode: "100644".into(), old_rev: "aaa".into(), old_name: "f.rs".into(), ..Default::default() };
        let (args, stdin) = build_whole_file_script(&staged);
        assert_eq!(args, vec!["update-index", "--index-info"]);
        assert!(stdin.starts_with("100644 aaa\tf.rs"));

        let untracked = StageTarget { section: StatusSection::Untracked, new_name: "new.rs".into(), ..Default::default() };
        let (args, stdin) = build_whole_file_script(&untracked);
        assert_eq!(args, vec!["update-index", "--add", "--remove", "--stdin"]);
        assert_eq!(stdin, "new.rs\0");
    }
}
