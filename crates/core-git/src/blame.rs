//! Blame view (§4.I). Two phases: the file's text first (so the view has
//! rows to paint before any commit metadata arrives), then an incremental
//! `blame --incremental` parser that joins a commit onto each line group.

use crate::argv::{ArgToken, ArgvContext};
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::draw::{self, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};
use std::collections::HashMap;

const BLAME_SENTINEL: &str = "\u{1}BLAME-INCREMENTAL-START\u{1}";

#[derive(Debug, Clone, Default)]
struct BlameCommit {
    id: String,
    author: String,
    author_time: i64,
    summary: String,
    previous: Option<(String, String)>,
    filename: String,
}

#[derive(Debug, Clone, Default)]
struct PendingRecord {
    id: String,
    current_lineno: usize,
    group_count: usize,
    author: String,
    author_time: i64,
    summary: String,
    previous: Option<(String, String)>,
}

pub struct BlameOps {
    commits: HashMap<String, BlameCommit>,
    line_commit: Vec<Option<String>>,
    pending: Option<PendingRecord>,
    file_loaded: bool,
    mixed_filenames: bool,
    blamed_filename: String,
}

impl BlameOps {
    pub fn new() -> Self {
        BlameOps {
            commits: HashMap::new(),
            line_commit: Vec::new(),
            pending: None,
            file_loaded: false,
            mixed_filenames: false,
            blamed_filename: String::new(),
        }
    }

    fn apply_record(&mut self, record: PendingRecord, filename: &str) {
        if filename != self.blamed_filename && !self.blamed_filename.is_empty() {
            self.mixed_filenames = true;
        }
        let commit = self.commits.entry(record.id.clone()).or_insert_with(|| BlameCommit {
            id: record.id.clone(),
            filename: filename.to_string(),
            ..Default::default()
        });
        if !record.author.is_empty() {
            commit.author = record.author;
        }
        if record.author_time != 0 {
            commit.author_time = record.author_time;
        }
        if !record.summary.is_empty() {
            commit.summary = record.summary;
        }
        if record.previous.is_some() {
            commit.previous = record.previous;
        }
        for offset in 0..record.group_count.max(1) {
            let idx = record.current_lineno - 1 + offset;
            if idx < self.line_commit.len() {
                self.line_commit[idx] = Some(record.id.clone());
            }
        }
    }
}

fn parse_header(raw: &str) -> Option<(String, usize, usize, usize)> {
    let mut parts = raw.split_whitespace();
    let id = parts.next()?.to_string();
    if id.len() != 40 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let orig: usize = parts.next()?.parse().ok()?;
    let current: usize = parts.next()?.parse().ok()?;
    let group: usize = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let _ = orig;
    Some((id, orig, current, group))
}

impl ViewOps for BlameOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Blame
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.file_loaded = false;
        self.commits.clear();
        self.line_commit.clear();
        self.pending = None;
        self.blamed_filename = view.argv_template.first().cloned().unwrap_or_default();
        let reference = view.reference.clone();
        let ctx = ArgvContext {
            reference: reference.clone(),
            file: Some(self.blamed_filename.clone()),
            file_args: vec![self.blamed_filename.clone()],
            ..Default::default()
        };
        let blame_template = ArgToken::template(&["git", "blame", "--incremental", "%(blameargs)", "%(ref)", "--", "%(fileargs)"]);
        let blame_stage = crate::argv::expand(&blame_template, &ctx, opt);

        // Phase 1 reads the file's text directly (the working copy unless a
        // historical revision is being blamed), so rows exist before the
        // first blame record arrives.
        let content_stage = match &reference {
            Some(ref_name) => ("git".to_string(), vec!["cat-file".to_string(), "blob".to_string(), format!("{ref_name}:{}", self.blamed_filename)]),
            None => ("cat".to_string(), vec!["--".to_string(), self.blamed_filename.clone()]),
        };

        crate::shell::chain(&[content_stage, blame_stage], BLAME_SENTINEL, core_process::Delimiter::Newline)
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\n', '\r']);

        if !self.file_loaded {
            if text == BLAME_SENTINEL {
                self.file_loaded = true;
                return;
            }
            let lineno = view.line_count() + 1;
            view.lines.push(Line::new(LineType::Default, lineno, text.to_string()));
            self.line_commit.push(None);
            return;
        }

        if let Some((id, _orig, current, group)) = parse_header(text) {
            self.pending = Some(PendingRecord { id, current_lineno: current, group_count: group, ..Default::default() });
            return;
        }
        let Some(pending) = self.pending.as_mut() else { return };
        if let Some(rest) = text.strip_prefix("author ") {
            pending.author = rest.to_string();
        } else if let Some(rest) = text.strip_prefix("author-time ") {
            pending.author_time = rest.parse().unwrap_or(0);
        } else if let Some(rest) = text.strip_prefix("summary ") {
            pending.summary = rest.to_string();
        } else if let Some(rest) = text.strip_prefix("previous ") {
            if let Some((id, name)) = rest.split_once(' ') {
                pending.previous = Some((id.to_string(), name.to_string()));
            }
        } else if let Some(filename) = text.strip_prefix("filename ") {
            let record = self.pending.take().unwrap();
            self.apply_record(record, filename);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        let mut cursor = Cursor::new(0, row);
        if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
            return true;
        }
        if let Some(Some(commit_id)) = self.line_commit.get(line_index) {
            if let Some(commit) = self.commits.get(commit_id) {
                let short_id: String = commit.id.chars().take(opt.id_width.max(4) as usize).collect();
                if draw::draw_id(frame, &mut cursor, opt, &short_id) {
                    return true;
                }
                let formatted_date = commit.author_time.to_string();
                if draw::draw_date(frame, &mut cursor, opt, &formatted_date) {
                    return true;
                }
                if draw::draw_author(frame, &mut cursor, opt, &commit.author) {
                    return true;
                }
                if self.mixed_filenames && draw::draw_filename(frame, &mut cursor, opt, &commit.filename, false) {
                    return true;
                }
            }
        }
        let remaining = frame.width.saturating_sub(cursor.x);
        draw::draw_chars(frame, &mut cursor, opt, LineType::Default, &line.data, remaining, view.col as u16, false)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::Parent => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(commit_id)) = self.line_commit.get(idx) else { return Request::None };
                let Some(commit) = self.commits.get(commit_id) else { return Request::None };
                let Some((parent_id, parent_name)) = commit.previous.clone() else { return Request::None };
                view.reference = Some(parent_id);
                view.argv_template = vec![parent_name];
                Request::ViewBlame
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, view: &mut View, line_index: usize) {
        if let Some(Some(commit_id)) = self.line_commit.get(line_index) {
            view.reference = Some(commit_id.clone());
        }
    }

    fn done(&mut self, _view: &mut View) {
        self.commits.clear();
        self.line_commit.clear();
        self.pending = None;
        self.file_loaded = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_incremental_header_line() {
        let (id, orig, current, group) = parse_header("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef 3 3 2").unwrap();
        assert_eq!(id, "deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");
        assert_eq!(orig, 3);
        assert_eq!(current, 3);
        assert_eq!(group, 2);
    }
}
