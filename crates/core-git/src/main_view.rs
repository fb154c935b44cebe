//! Main view (§4.G): the graph/commit table. Parses a `--pretty=raw`
//! stream incrementally, one flushed row per commit, with the ancestry
//! graph rendered alongside via [`crate::graph`].

use crate::argv::{ArgToken, ArgvContext};
use crate::graph::{self, GraphRenderer, GraphRow};
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::draw::{self, Align, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};

#[derive(Debug, Clone, Default)]
struct PartialCommit {
    id: String,
    refs: String,
    parents: Vec<String>,
    author: String,
    time: i64,
}

#[derive(Debug, Clone)]
struct CommitRow {
    id: String,
    author: String,
    time: i64,
    refs: String,
    graph: GraphRow,
}

pub struct MainOps {
    graph: GraphRenderer,
    pending: Option<PartialCommit>,
    waiting_for_title: bool,
    seen_first: bool,
    rows: Vec<Option<CommitRow>>,
}

impl MainOps {
    pub fn new() -> Self {
        MainOps { graph: GraphRenderer::new(), pending: None, waiting_for_title: false, seen_first: false, rows: Vec::new() }
    }

    fn flush(&mut self, view: &mut View, title: &str) {
        let Some(pending) = self.pending.take() else { return };
        let graph_row = self.graph.render(&pending.id, &pending.parents);
        let lineno = view.line_count() + 1;
        view.lines.push(Line::new(LineType::CommitTitle, lineno, title));
        self.rows.push(Some(CommitRow { id: pending.id, author: pending.author, time: pending.time, refs: pending.refs, graph: graph_row }));
    }

    fn push_synthetic(&mut self, view: &mut View, text: &str) {
        view.lines.push(Line::new(LineType::Title, 0, text));
        self.rows.push(None);
    }

    fn inject_virtual_changes(&mut self, view: &mut View) {
        let dir = view.dir.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
        let staged = !quiet_diff(&dir, &["diff", "--cached", "--quiet"]);
        let unstaged = !quiet_diff(&dir, &["diff", "--quiet"]);
        if staged {
            self.push_synthetic(view, "Staged changes");
        }
        if unstaged {
            self.push_synthetic(view, "Unstaged changes");
        }
    }
}

fn quiet_diff(dir: &std::path::Path, args: &[&str]) -> bool {
    std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(true)
}

pub(crate) fn parse_ident_line(rest: &str) -> (String, i64) {
    // "Name <email> 1700000000 +0000"
    let mut parts = rest.rsplitn(3, ' ');
    let _tz = parts.next().unwrap_or("");
    let epoch = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let name = parts.next().unwrap_or(rest).trim().to_string();
    (name, epoch)
}

impl ViewOps for MainOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Main
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.graph = GraphRenderer::new();
        self.pending = None;
        self.seen_first = false;
        self.rows.clear();
        let ctx = ArgvContext { rev_args: view.reference.clone().into_iter().collect(), ..Default::default() };
        let template = ArgToken::template(&["git", "log", "--no-color", "--pretty=raw", "--decorate=full", "arg_commit_order", "%(revargs)"]);
        crate::argv::expand(&template, &ctx, opt)
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
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
            if !self.seen_first {
                self.seen_first = true;
                if opt.show_changes {
                    self.inject_virtual_changes(view);
                }
            }
            let (id, refs) = match rest.split_once(" (") {
                Some((id, decor)) => (id.to_string(), decor.trim_end_matches(')').to_string()),
                None => (rest.to_string(), String::new()),
            };
            self.pending = Some(PartialCommit { id, refs, parents: Vec::new(), author: String::new(), time: 0 });
            self.waiting_for_title = false;
            return;
        }
        let Some(pending) = self.pending.as_mut() else { return };
        if let Some(rest) = text.strip_prefix("parent ") {
            pending.parents.push(rest.trim().to_string());
            return;
        }
        if let Some(rest) = text.strip_prefix("author ") {
            let (name, epoch) = parse_ident_line(rest);
            pending.author = name;
            pending.time = epoch;
            return;
        }
        if text.starts_with("committer ") || text.starts_with("tree ") {
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
        let Some(Some(commit_row)) = self.rows.get(line_index) else {
            let mut cursor = Cursor::new(0, row);
            return draw::draw_chars(frame, &mut cursor, opt, line.line_type, &line.data, frame.width, view.col as u16, false);
        };
        let mut cursor = Cursor::new(0, row);
        if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
            return true;
        }
        if draw::draw_id(frame, &mut cursor, opt, &commit_row.id) {
            return true;
        }
        let formatted_date = format_epoch(commit_row.time);
        if draw::draw_date(frame, &mut cursor, opt, &formatted_date) {
            return true;
        }
        if draw::draw_author(frame, &mut cursor, opt, &commit_row.author) {
            return true;
        }
        if opt.show_rev_graph {
            let text = graph::render_row_text(&commit_row.graph, opt.line_graphics);
            if draw::draw_graphic(frame, &mut cursor, LineType::Default, &text, true) {
                return true;
            }
        }
        if draw::draw_refs(frame, &mut cursor, opt, &commit_row.refs) {
            return true;
        }
        draw::draw_commit_title(frame, &mut cursor, opt, &line.data, view.col as u16)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::Enter => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(commit_row)) = self.rows.get(idx) else { return Request::None };
                view.reference = Some(commit_row.id.clone());
                Request::ViewDiff
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, view: &mut View, line_index: usize) {
        if let Some(Some(commit_row)) = self.rows.get(line_index) {
            view.reference = Some(commit_row.id.clone());
        }
    }

    fn done(&mut self, _view: &mut View) {
        self.rows.clear();
        self.pending = None;
        self.graph = GraphRenderer::new();
    }
}

fn format_epoch(epoch: i64) -> String {
    // A minimal, dependency-free rendering; the real formatting modes
    // (`relative`, `short`, local timezone) are an external-clock concern
    // outside this crate's scope, so we only ever show the raw epoch here.
    epoch.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ident_line_splits_name_epoch_and_tz() {
        let (name, epoch) = parse_ident_line("Jane Doe <jane@example.com> 1700000000 +0000");
        assert_eq!(name, "Jane Doe <jane@example.com>");
        assert_eq!(epoch, 1700000000);
    }

    #[test]
    fn reads_a_single_commit_into_one_row() {
        let mut ops = MainOps::new();
        let mut view = View::new(ViewKind::Main, 80, 24);
        let opt = Options::default();
        for line in ["commit abc123", "tree def", "author A <a@b.c> 1700000000 +0000", "committer A <a@b.c> 1700000000 +0000", "", "    subject line"] {
            ops.read(&mut view, &opt, Some(format!("{line}\n").as_bytes()));
        }
        ops.read(&mut view, &opt, None);
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].data, "subject line");
    }
}
