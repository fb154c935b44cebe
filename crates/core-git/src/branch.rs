//! Branch view (§4.J): one row per ref (plus a synthetic "All branches"),
//! annotated by a second `git log --all --simplify-by-decoration` pass that
//! joins author/time/title onto each ref by matching `commit <id>`.

use crate::argv::ArgToken;
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::draw::{self, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
struct BranchRow {
    name: String,
    commit: Option<String>,
    author: String,
    time: i64,
    title: String,
}

pub struct BranchOps {
    rows: Vec<BranchRow>,
    by_commit: HashMap<String, usize>,
    pending_index: Option<usize>,
    refs_loaded: bool,
}

impl BranchOps {
    pub fn new() -> Self {
        BranchOps { rows: Vec::new(), by_commit: HashMap::new(), pending_index: None, refs_loaded: false }
    }
}

impl ViewOps for BranchOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Branch
    }

    fn open_argv(&mut self, _view: &View, _opt: &Options) -> (String, Vec<String>) {
        self.rows.clear();
        self.by_commit.clear();
        self.refs_loaded = false;
        let template = ArgToken::template(&["git", "for-each-ref", "--format=%(objectname) %(refname:short)", "refs/heads", "refs/remotes"]);
        crate::argv::expand(&template, &Default::default(), &Options::default())
    }

    fn read(&mut self, view: &mut View, _opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else {
            self.refs_loaded = true;
            return;
        };
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\n', '\r']);

        if !self.refs_loaded {
            if view.lines.is_empty() {
                view.lines.push(Line::new(LineType::MainHead, 1, "All branches".to_string()));
                self.rows.push(BranchRow { name: "All branches".to_string(), ..Default::default() });
            }
            let Some((commit, name)) = text.split_once(' ') else { return };
            let lineno = view.line_count() + 1;
            view.lines.push(Line::new(LineType::Default, lineno, name.to_string()));
            self.by_commit.insert(commit.to_string(), self.rows.len());
            self.rows.push(BranchRow { name: name.to_string(), commit: Some(commit.to_string()), ..Default::default() });
            return;
        }

        if let Some(id) = text.strip_prefix("commit ") {
            self.pending_index = self.by_commit.get(id).copied();
            return;
        }
        let Some(idx) = self.pending_index else { return };
        if let Some(rest) = text.strip_prefix("author ") {
            let (name, epoch) = crate::main_view::parse_ident_line(rest);
            self.rows[idx].author = name;
            self.rows[idx].time = epoch;
        }
        if let Some(title) = text.strip_prefix("    ") {
            if self.rows[idx].title.is_empty() {
                self.rows[idx].title = title.to_string();
            }
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        let Some(branch_row) = self.rows.get(line_index) else { return true };
        let mut cursor = Cursor::new(0, row);
        if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
            return true;
        }
        if draw::draw_date(frame, &mut cursor, opt, &branch_row.time.to_string()) {
            return true;
        }
        if draw::draw_author(frame, &mut cursor, opt, &branch_row.author) {
            return true;
        }
        if draw::draw_field(frame, &mut cursor, line.line_type, &branch_row.name, branch_row.name.chars().count() as u16, draw::Align::Left, false) {
            return true;
        }
        draw::draw_commit_title(frame, &mut cursor, opt, &branch_row.title, view.col as u16)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::Enter => {
                let Some(idx) = line_index else { return Request::None };
                let Some(branch_row) = self.rows.get(idx) else { return Request::None };
                view.reference = branch_row.commit.clone().or(Some("--all".to_string()));
                Request::ViewMain
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, view: &mut View, line_index: usize) {
        if let Some(branch_row) = self.rows.get(line_index) {
            view.reference = branch_row.commit.clone();
        }
    }

    fn done(&mut self, _view: &mut View) {
        self.rows.clear();
        self.by_commit.clear();
        self.pending_index = None;
        self.refs_loaded = false;
    }
}
