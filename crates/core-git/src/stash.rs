//! Stash view (§4.G): the same raw commit-stream parser the main view
//! uses, walking `refs/stash`'s reflog instead of history, with a
//! synthetic `stash@{N}` id column that widens as entries accumulate.

use crate::argv::ArgToken;
use crate::main_view::parse_ident_line;
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::draw::{self, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};

#[derive(Debug, Clone, Default)]
struct PartialEntry {
    id: String,
    author: String,
    time: i64,
}

#[derive(Debug, Clone)]
struct StashRow {
    id: String,
    stash_ref: String,
    author: String,
    time: i64,
}

pub struct StashOps {
    pending: Option<PartialEntry>,
    waiting_for_title: bool,
    rows: Vec<StashRow>,
    id_width: u16,
}

impl StashOps {
    pub fn new() -> Self {
        StashOps { pending: None, waiting_for_title: false, rows: Vec::new(), id_width: 8 }
    }

    fn flush(&mut self, view: &mut View, title: &str) {
        let Some(pending) = self.pending.take() else { return };
        let stash_ref = format!("stash@{{{}}}", self.rows.len());
        self.id_width = self.id_width.max(stash_ref.chars().count() as u16);
        let lineno = view.line_count() + 1;
        view.lines.push(Line::new(LineType::CommitTitle, lineno, title.to_string()));
        self.rows.push(StashRow { id: pending.id, stash_ref, author: pending.author, time: pending.time });
    }
}

impl ViewOps for StashOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Stash
    }

    fn open_argv(&mut self, _view: &View, _opt: &Options) -> (String, Vec<String>) {
        self.pending = None;
        self.waiting_for_title = false;
        self.rows.clear();
        self.id_width = 8;
        let template = ArgToken::template(&["git", "log", "--no-color", "--pretty=raw", "--walk-reflogs", "refs/stash"]);
        crate::argv::expand(&template, &Default::default(), &Options::default())
    }

    fn read(&mut self, view: &mut View, _opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else {
            self.flush(view, "");
            return;
        };
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\n', '\r']);

        if let Some(rest) = text.strip_prefix("commit ") {
            if self.pending.is_some() {
                self.flush(view, "");
            }
            let id = rest.split(' ').next().unwrap_or(rest).to_string();
            self.pending = Some(PartialEntry { id, author: String::new(), time: 0 });
            self.waiting_for_title = false;
            return;
        }
        let Some(pending) = self.pending.as_mut() else { return };
        if let Some(rest) = text.strip_prefix("author ") {
            let (name, epoch) = parse_ident_line(rest);
            pending.author = name;
            pending.time = epoch;
            return;
        }
        if text.starts_with("committer ") || text.starts_with("parent ") || text.starts_with("tree ") || text.starts_with("reflog ") {
            return;
        }
        if text.is_empty() {
            self.waiting_for_title = true;
            return;
        }
        if self.waiting_for_title {
            let title = text.trim_start().to_string();
            self.waiting_for_title = false;
            self.flush(view, &title);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index) else { return true };
        let Some(stash_row) = self.rows.get(line_index) else { return true };
        let mut cursor = Cursor::new(0, row);
        if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
            return true;
        }
        if draw::draw_field(frame, &mut cursor, LineType::Default, &stash_row.stash_ref, self.id_width, draw::Align::Left, true) {
            return true;
        }
        if draw::draw_date(frame, &mut cursor, opt, &stash_row.time.to_string()) {
            return true;
        }
        if draw::draw_author(frame, &mut cursor, opt, &stash_row.author) {
            return true;
        }
        draw::draw_commit_title(frame, &mut cursor, opt, &line.data, view.col as u16)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::Enter => {
                let Some(idx) = line_index else { return Request::None };
                let Some(stash_row) = self.rows.get(idx) else { return Request::None };
                view.reference = Some(stash_row.id.clone());
                Request::ViewDiff
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, view: &mut View, line_index: usize) {
        if let Some(stash_row) = self.rows.get(line_index) {
            view.reference = Some(stash_row.id.clone());
        }
    }

    fn done(&mut self, _view: &mut View) {
        self.rows.clear();
        self.pending = None;
        self.waiting_for_title = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_two_stash_entries_with_growing_id_column() {
        let mut ops = StashOps::new();
        let mut view = View::new(ViewKind::Stash, 80, 24);
        let opt = Options::default();
        for line in ["commit abc", "author A <a@b.c> 1700000000 +0000", "", "    WIP on main"] {
            ops.read(&mut view, &opt, Some(format!("{line}\n").as_bytes()));
        }
        for line in ["commit def", "author B <b@c.d> 1700000100 +0000", "", "    WIP on topic"] {
            ops.read(&mut view, &opt, Some(format!("{line}\n").as_bytes()));
        }
        ops.read(&mut view, &opt, None);
        assert_eq!(ops.rows.len(), 2);
        assert_eq!(ops.rows[0].stash_ref, "stash@{0}");
        assert_eq!(ops.rows[1].stash_ref, "stash@{1}");
    }
}
