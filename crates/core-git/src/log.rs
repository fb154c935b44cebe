//! Log view (§4.F): `git log` output streamed through the same
//! commit/diffstat/hunk state machine diff.rs uses, plus a synthetic
//! `Refs:` row the first time a commit line's decorations are wanted.

use crate::argv::{ArgToken, ArgvContext};
use crate::diff::{self, DiffState};
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::Frame;
use core_view::{View, ViewKind, ViewOps};

pub struct LogOps {
    state: DiffState,
    current_commit: Option<String>,
}

impl LogOps {
    pub fn new() -> Self {
        LogOps { state: DiffState::default(), current_commit: None }
    }
}

impl ViewOps for LogOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Log
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.state = DiffState::default();
        let file = view.argv_template.first().cloned();
        let ctx = ArgvContext {
            rev_args: view.reference.clone().into_iter().collect(),
            file_args: file.into_iter().collect(),
            ..Default::default()
        };
        let template = ArgToken::template(&[
            "git",
            "log",
            "--no-color",
            "-p",
            "--pretty=fuller",
            "%(diffargs)",
            "arg_diff_context",
            "arg_ignore_space",
            "arg_commit_order",
            "%(revargs)",
            "--",
            "%(fileargs)",
        ]);
        crate::argv::expand(&template, &ctx, opt)
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw).to_string();
        if let Some(id) = text.strip_prefix("commit ") {
            self.current_commit = Some(id.trim().to_string());
        }
        let lineno = view.line_count() + 1;
        let line_type = diff::reclassify(&mut self.state, &opt.lines, &text);
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
            Request::Edit => {
                let Some(idx) = line_index else { return Request::None };
                let Some((diff_idx, hunk_idx)) = crate::hunk::find_enclosing(&view.lines, idx) else {
                    return Request::None;
                };
                let Some(file) = diff::parse_diff_git_file(&view.lines[diff_idx].data) else {
                    return Request::None;
                };
                let lineno = crate::hunk::post_image_lineno(&view.lines, hunk_idx, idx).unwrap_or(0) as u32;
                let (program, args) = crate::editor::build_editor_argv(opt, std::path::Path::new(&file), lineno);
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
        if let Some(line) = view.lines.get(line_index) {
            if line.line_type == LineType::Commit {
                self.current_commit = line.data.strip_prefix("commit ").map(|s| s.trim().to_string());
            }
        }
        view.reference = self.current_commit.clone();
    }
}
