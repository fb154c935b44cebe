//! Tree view (§4.H): `ls-tree -l` listing with a synthetic `..` parent
//! link, directory navigation via a LIFO stack, and a trailing `log --raw`
//! pass that backfills the most-recent author/time/commit per entry.

use crate::argv::{ArgToken, ArgvContext};
use core_keymap::Request;
use core_options::{LineType, Options};
use core_screen::draw::{self, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};

#[derive(Debug, Clone)]
struct TreeEntry {
    mode: String,
    kind: String,
    id: String,
    size: Option<u64>,
    name: String,
    author: Option<String>,
    time: Option<i64>,
    commit: Option<String>,
}

struct NavFrame {
    path: String,
    lineno: usize,
}

pub struct TreeOps {
    entries: Vec<Option<TreeEntry>>,
    stack: Vec<NavFrame>,
    path: String,
    annotated: usize,
}

impl TreeOps {
    pub fn new() -> Self {
        TreeOps { entries: Vec::new(), stack: Vec::new(), path: String::new(), annotated: 0 }
    }
}

fn parse_ls_tree_line(raw: &str) -> Option<TreeEntry> {
    // "<mode> <type> <id> <size>\t<name>" (ls-tree -l)
    let (meta, name) = raw.split_once('\t')?;
    let mut fields = meta.split_whitespace();
    let mode = fields.next()?.to_string();
    let kind = fields.next()?.to_string();
    let id = fields.next()?.to_string();
    let size = fields.next().and_then(|s| s.parse().ok()).filter(|_| kind == "blob");
    Some(TreeEntry { mode, kind, id, size, name: name.to_string(), author: None, time: None, commit: None })
}

impl ViewOps for TreeOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Tree
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.entries.clear();
        self.annotated = 0;
        let ctx = ArgvContext {
            reference: view.reference.clone().or_else(|| Some("HEAD".to_string())),
            directory: Some(self.path.clone()).filter(|s| !s.is_empty()),
            ..Default::default()
        };
        let template = ArgToken::template(&["git", "ls-tree", "-l", "%(ref)", "--", "%(directory)"]);
        crate::argv::expand(&template, &ctx, opt)
    }

    fn read(&mut self, view: &mut View, _opt: &Options, raw: Option<&[u8]>) {
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw);
        let text = text.trim_end_matches(['\n', '\r']);
        if view.lines.is_empty() {
            let lineno = 1;
            view.lines.push(Line::new(LineType::TreeDir, lineno, ".".to_string()));
            self.entries.push(None);
            if !self.path.is_empty() {
                view.lines.push(Line::new(LineType::TreeDir, lineno + 1, "..".to_string()));
                self.entries.push(None);
            }
        }
        let Some(entry) = parse_ls_tree_line(text) else { return };
        let lineno = view.line_count() + 1;
        let line_type = if entry.kind == "tree" { LineType::TreeDir } else { LineType::TreeFile };
        view.lines.push(Line::new(line_type, lineno, entry.name.clone()));
        self.entries.push(Some(entry));
    }

    /// Backfill author/time/commit from a `log --raw` pass keyed by
    /// filename; called by the registry's secondary-pipe plumbing once the
    /// primary `ls-tree` listing has read a given raw line from the
    /// annotator process. Kept separate from `read` since it consumes a
    /// different subprocess's output against the same `entries` table.
    pub fn annotate_raw_log_line(&mut self, raw: &str) {
        if self.annotated >= self.entries.iter().filter(|e| e.is_some()).count() {
            return;
        }
        if let Some(commit) = raw.strip_prefix("commit ") {
            let commit = commit.trim().to_string();
            for entry in self.entries.iter_mut().flatten() {
                if entry.commit.is_none() {
                    entry.commit = Some(commit.clone());
                }
            }
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index) else { return true };
        let mut cursor = Cursor::new(0, row);
        if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
            return true;
        }
        let Some(Some(entry)) = self.entries.get(line_index) else {
            return draw::draw_filename(frame, &mut cursor, opt, &line.data, true);
        };
        if draw::draw_date(frame, &mut cursor, opt, &entry.time.map(|t| t.to_string()).unwrap_or_default()) {
            return true;
        }
        if draw::draw_author(frame, &mut cursor, opt, entry.author.as_deref().unwrap_or("")) {
            return true;
        }
        let formatted_size = entry.size.map(|s| s.to_string()).unwrap_or_default();
        if draw::draw_file_size(frame, &mut cursor, opt, &formatted_size) {
            return true;
        }
        draw::draw_filename(frame, &mut cursor, opt, &entry.name, entry.kind == "tree")
    }

    fn request(&mut self, view: &mut View, opt: &Options, req: Request, line_index: Option<usize>) -> Request {
        match req {
            Request::Enter => {
                let Some(idx) = line_index else { return Request::None };
                if view.lines.get(idx).map(|l| l.data.as_str()) == Some("..") {
                    if let Some(frame) = self.stack.pop() {
                        self.path = frame.path;
                        view.vid += 1;
                        view.pos.lineno = frame.lineno;
                    }
                    return Request::Reload;
                }
                let Some(Some(entry)) = self.entries.get(idx) else { return Request::None };
                if entry.kind == "tree" {
                    self.stack.push(NavFrame { path: self.path.clone(), lineno: view.pos.lineno });
                    self.path = if self.path.is_empty() { entry.name.clone() } else { format!("{}/{}", self.path, entry.name) };
                    view.vid += 1;
                    Request::Reload
                } else {
                    view.argv_template = vec![self.path_to(&entry.name), entry.id.clone()];
                    Request::ViewBlob
                }
            }
            Request::Edit => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(entry)) = self.entries.get(idx) else { return Request::None };
                if entry.kind != "blob" {
                    return Request::None;
                }
                if let Ok(output) = std::process::Command::new("git").args(["cat-file", "blob", &entry.id]).current_dir(view.dir.clone().unwrap_or_default()).output() {
                    if let Ok(path) = crate::editor::spool_blob(&entry.name, &output.stdout) {
                        let (program, args) = crate::editor::build_editor_argv(opt, &path, 0);
                        let _ = core_process::run_foreground(&program, &args, view.dir.as_ref());
                        let _ = std::fs::remove_file(&path);
                    }
                }
                Request::None
            }
            _ => Request::None,
        }
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, _view: &mut View, _line_index: usize) {}

    fn done(&mut self, _view: &mut View) {
        self.entries.clear();
        self.annotated = 0;
    }
}

impl TreeOps {
    fn path_to(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ls_tree_blob_line_with_size() {
        let entry = parse_ls_tree_line("100644 blob abc123         42\tsrc/lib.rs").unwrap();
        assert_eq!(entry.kind, "blob");
        assert_eq!(entry.name, "src/lib.rs");
        assert_eq!(entry.size, Some(42));
    }

    #[test]
    fn parses_ls_tree_tree_line_without_size() {
        let entry = parse_ls_tree_line("040000 tree def456         -\tsrc").unwrap();
        assert_eq!(entry.kind, "tree");
        assert_eq!(entry.size, None);
    }
}
