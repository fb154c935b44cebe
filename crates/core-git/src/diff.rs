//! Diff view (§4.F): renders `git show`/`git diff` output, tracking a small
//! state machine across the stream to tell a commit title apart from a
//! diffstat row and a diffstat row apart from the patch body, and supports
//! "trace origin" (jump from a changed line to the blame view at the
//! revision that introduced it).

use crate::argv::{ArgToken, ArgvContext};
use crate::hunk;
use core_keymap::Request;
use core_options::{LineInfoTable, LineType, Options};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DiffState {
    after_commit_title: bool,
    after_diff: bool,
    combined_diff: bool,
}

/// Shared by the log view (§4.F), which streams `git log -p`-shaped text
/// through the same commit/diffstat/hunk state machine.
pub(crate) fn reclassify(state: &mut DiffState, table: &LineInfoTable, raw: &str) -> LineType {
    if raw.starts_with("diff --git") || raw.starts_with("diff --cc") || raw.starts_with("diff --combined") {
        state.after_diff = true;
        state.after_commit_title = true;
        state.combined_diff = raw.starts_with("diff --cc") || raw.starts_with("diff --combined");
        return LineType::DiffHeader;
    }
    if raw.starts_with("commit ") {
        *state = DiffState::default();
        return LineType::Commit;
    }
    if raw.starts_with("Author:") {
        return LineType::Author;
    }
    if raw.starts_with("Date:") {
        return LineType::Date;
    }
    if !state.after_commit_title && raw.starts_with("    ") {
        state.after_commit_title = true;
        return LineType::CommitTitle;
    }
    if state.after_diff {
        if raw.starts_with("@@") {
            return LineType::DiffChunk;
        }
        if raw.starts_with("+++") || raw.starts_with("---") {
            return LineType::DiffHeader;
        }
        if raw.starts_with("index ") {
            return LineType::DiffIndex;
        }
        let bytes = raw.as_bytes();
        if state.combined_diff && bytes.len() >= 2 {
            match (bytes[0], bytes[1]) {
                (b'+', b'+') => return LineType::DiffAddHighlight,
                (b'-', b'-') => return LineType::DiffDelHighlight,
                (b'+', _) => return LineType::DiffAdd,
                (b'-', _) => return LineType::DiffDel,
                _ => {}
            }
        } else if raw.starts_with('+') {
            return LineType::DiffAdd;
        } else if raw.starts_with('-') {
            return LineType::DiffDel;
        }
    } else if state.after_commit_title {
        // Between the commit title and the first `diff --git`: the
        // diffstat summary. A leading space plus `|` (or a rename arrow,
        // or a binary-blob marker) is the closest stable tell; everything
        // else in this window falls back to the generic table so a blank
        // separator line still reads as `Default`.
        let trimmed = raw.trim_start();
        if trimmed.contains('|') || trimmed.contains("=>") || trimmed.contains(" Bin ") {
            return LineType::StatHead;
        }
    }
    table.classify(raw)
}

/// Which invocation produced this diff's text, decided once at open time
/// from the context the opener stashed on the generic `View`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DiffSource {
    Commit,
    Staged,
    Unstaged,
}

fn diff_source(view: &View) -> DiffSource {
    if view.reference.is_some() {
        DiffSource::Commit
    } else if view.argv_template.first().map(String::as_str) == Some("staged") {
        DiffSource::Staged
    } else {
        DiffSource::Unstaged
    }
}

pub struct DiffOps {
    state: DiffState,
    current_commit: Option<String>,
    current_file: Option<String>,
}

impl DiffOps {
    pub fn new() -> Self {
        DiffOps { state: DiffState::default(), current_commit: None, current_file: None }
    }

    /// Scan backward from `line_index` for the enclosing `commit`/
    /// `diff --git a/X b/Y` pair, used by both `select` and trace-origin.
    fn enclosing_header(view: &View, line_index: usize) -> (Option<String>, Option<String>) {
        let mut commit = None;
        let mut file = None;
        for line in view.lines[..=line_index.min(view.lines.len().saturating_sub(1))].iter().rev() {
            if file.is_none() && line.line_type == LineType::DiffHeader && line.data.starts_with("diff --git ") {
                file = parse_diff_git_file(&line.data);
            }
            if line.line_type == LineType::Commit {
                commit = line.data.strip_prefix("commit ").map(|s| s.trim().to_string());
                break;
            }
        }
        (commit, file)
    }
}

pub(crate) fn parse_diff_git_file(header: &str) -> Option<String> {
    // `diff --git a/old/path b/new/path`; the new-side path wins.
    let rest = header.strip_prefix("diff --git ")?;
    let idx = rest.find(" b/")?;
    Some(rest[idx + 3..].to_string())
}

impl ViewOps for DiffOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Diff
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.state = DiffState::default();
        let file = view.argv_template.get(1).cloned();
        let ctx = ArgvContext {
            reference: view.reference.clone(),
            file: file.clone(),
            file_args: file.into_iter().collect(),
            ..Default::default()
        };
        let template = match diff_source(view) {
            DiffSource::Commit => ArgToken::template(&[
                "git",
                "show",
                "--pretty=fuller",
                "--no-color",
                "--no-abbrev",
                "%(diffargs)",
                "arg_diff_context",
                "arg_ignore_space",
                "%(ref)",
                "--",
                "%(fileargs)",
            ]),
            DiffSource::Staged => ArgToken::template(&[
                "git",
                "diff",
                "--no-color",
                "--cached",
                "%(diffargs)",
                "arg_diff_context",
                "arg_ignore_space",
                "--",
                "%(fileargs)",
            ]),
            DiffSource::Unstaged => ArgToken::template(&[
                "git",
                "diff",
                "--no-color",
                "%(diffargs)",
                "arg_diff_context",
                "arg_ignore_space",
                "--",
                "%(fileargs)",
            ]),
        };
        crate::argv::expand(&template, &ctx, opt)
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw).to_string();
        let lineno = view.line_count() + 1;
        let line_type = reclassify(&mut self.state, &opt.lines, &text);
        for line in crate::pager::split_wrapped(line_type, lineno, &text, view.width, opt.wrap_lines) {
            view.lines.push(line);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        crate::pager::draw_text_row(frame, opt, view, &line, row)
    }

    fn request(&mut self, view: &mut View, opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::TraceOrigin => {
                let Some(idx) = line_index else { return Request::None };
                let Some((diff_idx, hunk_idx)) = hunk::find_enclosing(&view.lines, idx) else {
                    return Request::None;
                };
                let Some(file) = parse_diff_git_file(&view.lines[diff_idx].data) else {
                    return Request::None;
                };
                let deleted = view.lines[idx].data.starts_with('-');
                let (target_ref, lineno) = if deleted {
                    let Some(n) = hunk::pre_image_lineno(&view.lines, hunk_idx, idx) else { return Request::None };
                    (format!("{}^", self.current_commit.clone().unwrap_or_else(|| "HEAD".to_string())), n)
                } else {
                    let Some(n) = hunk::post_image_lineno(&view.lines, hunk_idx, idx) else { return Request::None };
                    (self.current_commit.clone().unwrap_or_else(|| "HEAD".to_string()), n)
                };
                view.reference = Some(target_ref);
                view.argv_template = vec!["trace".to_string(), file, lineno.to_string()];
                Request::ViewBlame
            }
            Request::Edit => {
                let Some(file) = self.current_file.clone() else { return Request::None };
                let (program, args) = crate::editor::build_editor_argv(opt, std::path::Path::new(&file), 0);
                let _ = core_process::run_foreground(&program, &args, view.dir.as_ref());
                Request::None
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, view: &mut View, line_index: usize) {
        let (commit, file) = Self::enclosing_header(view, line_index);
        if commit.is_some() {
            self.current_commit = commit;
        }
        self.current_file = file;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_commit_title_stat_and_patch_body() {
        let table = LineInfoTable::new();
        let mut state = DiffState::default();
        assert_eq!(reclassify(&mut state, &table, "commit deadbeef"), LineType::Commit);
        assert_eq!(reclassify(&mut state, &table, "Author: a <a@b.c>"), LineType::Author);
        assert_eq!(reclassify(&mut state, &table, "Date:   today"), LineType::Date);
        assert_eq!(reclassify(&mut state, &table, "    fix the thing"), LineType::CommitTitle);
        assert_eq!(reclassify(&mut state, &table, " src/lib.rs | 4 ++--"), LineType::StatHead);
        assert_eq!(reclassify(&mut state, &table, "diff --git a/src/lib.rs b/src/lib.rs"), LineType::DiffHeader);
        assert_eq!(reclassify(&mut state, &table, "@@ -1,2 +1,2 @@"), LineType::DiffChunk);
        assert_eq!(reclassify(&mut state, &table, "+added"), LineType::DiffAdd);
        assert_eq!(reclassify(&mut state, &table, "-removed"), LineType::DiffDel);
    }

    #[test]
    fn combined_diff_marks_second_column_as_highlight() {
        let table = LineInfoTable::new();
        let mut state = DiffState::default();
        reclassify(&mut state, &table, "diff --cc conflicted.rs");
        assert_eq!(reclassify(&mut state, &table, "++both add"), LineType::DiffAddHighlight);
        assert_eq!(reclassify(&mut state, &table, "--both del"), LineType::DiffDelHighlight);
        assert_eq!(reclassify(&mut state, &table, "+only theirs"), LineType::DiffAdd);
    }

    #[test]
    fn parses_new_side_path_from_diff_git_header() {
        assert_eq!(parse_diff_git_file("diff --git a/old.rs b/new.rs"), Some("new.rs".to_string()));
    }
}
