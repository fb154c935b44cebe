//! Status view (§4.K, steps 1-5): a three-stream model (staged/unstaged/
//! untracked) joined under section headers, with a header row that reports
//! what's in progress (rebase, merge, bisect, or the plain branch name).
//!
//! The three streams are three separate git invocations chained through one
//! `sh -c` pipeline (see [`crate::shell`]) since a view only owns one
//! subprocess pipe; a sentinel record marks each boundary.

use core_options::{LineType, Options};
use core_screen::draw::{self, Cursor};
use core_screen::Frame;
use core_view::{Line, View, ViewKind, ViewOps};
use std::path::Path;

const STAGE_SENTINEL: &str = "\u{1}status-stage-boundary\u{1}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusSection {
    #[default]
    Staged,
    Unstaged,
    Untracked,
}

#[derive(Debug, Clone)]
pub struct StatusEntry {
    pub section: StatusSection,
    pub status: char,
    pub old_mode: String,
    pub old_rev: String,
    pub old_name: String,
    pub new_mode: String,
    pub new_rev: String,
    pub new_name: String,
}

impl StatusEntry {
    fn display_name(&self) -> &str {
        if self.new_name.is_empty() {
            &self.old_name
        } else {
            &self.new_name
        }
    }

    fn untracked(path: &str) -> Self {
        StatusEntry {
            section: StatusSection::Untracked,
            status: '?',
            old_mode: String::new(),
            old_rev: String::new(),
            old_name: path.to_string(),
            new_mode: String::new(),
            new_rev: String::new(),
            new_name: path.to_string(),
        }
    }

    fn to_stage_target(&self, head_unborn: bool) -> crate::stage::StageTarget {
        crate::stage::StageTarget {
            section: self.section,
            status: self.status,
            old_mode: self.old_mode.clone(),
            old_rev: self.old_rev.clone(),
            old_name: self.old_name.clone(),
            new_mode: self.new_mode.clone(),
            new_rev: self.new_rev.clone(),
            new_name: self.new_name.clone(),
            head_unborn,
        }
    }

    /// A cached file on an unborn branch: nothing exists to diff against,
    /// so every cached path reads as a new file (§4.K edge case).
    fn unborn_added(path: &str) -> Self {
        StatusEntry {
            section: StatusSection::Staged,
            status: 'A',
            old_mode: String::new(),
            old_rev: String::new(),
            old_name: path.to_string(),
            new_mode: String::new(),
            new_rev: String::new(),
            new_name: path.to_string(),
        }
    }
}

/// Read the sentinel files inside `git_dir` in priority order and produce
/// the status header text (§4.K step 1).
pub fn header_text(git_dir: &Path) -> String {
    let read_head_name = || -> String {
        std::fs::read_to_string(git_dir.join("rebase-merge/head-name"))
            .ok()
            .map(|s| s.trim().trim_start_matches("refs/heads/").to_string())
            .unwrap_or_default()
    };
    if git_dir.join("rebase-apply/rebasing").exists() {
        return format!("Rebasing {}", read_head_name());
    }
    if git_dir.join("rebase-apply/applying").exists() {
        return "Applying mailbox patches".to_string();
    }
    if git_dir.join("rebase-apply").exists() {
        return "Rebasing (apply)".to_string();
    }
    if git_dir.join("rebase-merge/interactive").exists() {
        return format!("Interactive rebase {}", read_head_name());
    }
    if git_dir.join("rebase-merge").exists() {
        return format!("Rebasing {}", read_head_name());
    }
    if git_dir.join("MERGE_HEAD").exists() {
        return "Merging".to_string();
    }
    if git_dir.join("BISECT_LOG").exists() {
        return "Bisecting".to_string();
    }
    std::fs::read_to_string(git_dir.join("HEAD"))
        .ok()
        .map(|s| s.trim().trim_start_matches("ref: refs/heads/").to_string())
        .unwrap_or_else(|| "HEAD".to_string())
}

/// Parse one NUL-delimited `diff-index`/`diff-files` record pair (the
/// diff-tree metadata line, then one or two paths). Returns the entry and
/// how many path fields were consumed (1, or 2 for rename/copy).
fn parse_diff_record(meta: &str, paths: &[&str], section: StatusSection) -> Option<(StatusEntry, usize)> {
    let meta = meta.strip_prefix(':')?;
    let mut fields = meta.split(' ');
    let old_mode = fields.next()?.to_string();
    let new_mode = fields.next()?.to_string();
    let old_rev = fields.next()?.to_string();
    let new_rev = fields.next()?.to_string();
    let status_field = fields.next()?;
    let status = status_field.chars().next()?;
    let is_rename = matches!(status, 'R' | 'C');
    let consumed = if is_rename { 2 } else { 1 };
    if paths.len() < consumed {
        return None;
    }
    let (old_name, new_name) = if is_rename {
        (paths[0].to_string(), paths[1].to_string())
    } else {
        (paths[0].to_string(), paths[0].to_string())
    };
    Some((
        StatusEntry { section, status, old_mode, old_rev, old_name, new_mode, new_rev, new_name },
        consumed,
    ))
}

/// Collapse a duplicate unmerged+modified pair for the same path into one
/// `U`-status entry (§3 "Status entry").
fn collapse_unmerged(entries: Vec<StatusEntry>) -> Vec<StatusEntry> {
    let mut out: Vec<StatusEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(prior) = out.iter_mut().find(|e| e.display_name() == entry.display_name() && e.section == entry.section) {
            prior.status = 'U';
            continue;
        }
        out.push(entry);
    }
    out
}

fn head_is_unborn(dir: Option<&Path>) -> bool {
    !std::process::Command::new("git")
        .args(["rev-parse", "--verify", "-q", "HEAD"])
        .current_dir(dir.unwrap_or_else(|| Path::new(".")))
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub struct StatusOps {
    entries: Vec<Option<StatusEntry>>,
    records: Vec<String>,
    staged_raw: Vec<StatusEntry>,
    unstaged_raw: Vec<StatusEntry>,
    stream: StatusSection,
    git_dir: std::path::PathBuf,
    head_unborn: bool,
}

impl StatusOps {
    pub fn new(git_dir: std::path::PathBuf) -> Self {
        StatusOps {
            entries: Vec::new(),
            records: Vec::new(),
            staged_raw: Vec::new(),
            unstaged_raw: Vec::new(),
            stream: StatusSection::Staged,
            git_dir,
            head_unborn: false,
        }
    }

    fn push_section_header(&mut self, view: &mut View, text: &str) {
        view.lines.push(Line::new(LineType::StatHead, 0, text.to_string()));
        self.entries.push(None);
    }

    fn push_entry(&mut self, view: &mut View, entry: StatusEntry) {
        let lineno = view.line_count() + 1;
        view.lines.push(Line::new(LineType::Default, lineno, entry.display_name().to_string()));
        self.entries.push(Some(entry));
    }

    /// Parse `self.records` (one stage's worth, already sentinel-delimited
    /// by `read`) into entries for `section`, then either stash them
    /// (staged/unstaged wait for the next stage's header to be known) or
    /// render them immediately (untracked is always last).
    fn flush_stage(&mut self, view: &mut View, section: StatusSection) {
        let records = std::mem::take(&mut self.records);
        match section {
            StatusSection::Staged if self.head_unborn => {
                let parsed: Vec<StatusEntry> = records.iter().filter(|s| !s.is_empty()).map(|path| StatusEntry::unborn_added(path)).collect();
                self.push_section_header(view, if parsed.is_empty() { "Staged changes: (no files)" } else { "Staged changes:" });
                for entry in parsed {
                    self.push_entry(view, entry);
                }
            }
            StatusSection::Staged | StatusSection::Unstaged => {
                let mut parsed = Vec::new();
                let mut i = 0;
                while i < records.len() {
                    let meta = &records[i];
                    if !meta.starts_with(':') {
                        i += 1;
                        continue;
                    }
                    let remaining: Vec<&str> = records[i + 1..].iter().map(String::as_str).collect();
                    if let Some((entry, consumed)) = parse_diff_record(meta, &remaining, section) {
                        i += 1 + consumed;
                        parsed.push(entry);
                    } else {
                        i += 1;
                    }
                }
                let parsed = collapse_unmerged(parsed);
                let (label, empty_label) = if section == StatusSection::Staged {
                    ("Staged changes:", "Staged changes: (no files)")
                } else {
                    ("Unstaged changes:", "Unstaged changes: (no files)")
                };
                self.push_section_header(view, if parsed.is_empty() { empty_label } else { label });
                for entry in parsed {
                    self.push_entry(view, entry);
                }
            }
            StatusSection::Untracked => {
                let parsed: Vec<StatusEntry> = records.iter().filter(|s| !s.is_empty()).map(|path| StatusEntry::untracked(path)).collect();
                self.push_section_header(view, if parsed.is_empty() { "Untracked files: (no files)" } else { "Untracked files:" });
                for entry in parsed {
                    self.push_entry(view, entry);
                }
            }
        }
    }
}

impl ViewOps for StatusOps {
    fn kind(&self) -> ViewKind {
        ViewKind::Status
    }

    fn delimiter(&self) -> core_process::Delimiter {
        core_process::Delimiter::Nul
    }

    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>) {
        self.entries.clear();
        self.records.clear();
        self.staged_raw.clear();
        self.unstaged_raw.clear();
        self.stream = StatusSection::Staged;
        self.head_unborn = head_is_unborn(view.dir.as_deref());

        let staged_stage = if self.head_unborn {
            ("git".to_string(), vec!["ls-files".to_string(), "--cached".to_string(), "-z".to_string()])
        } else {
            ("git".to_string(), vec!["diff-index".to_string(), "--cached".to_string(), "-z".to_string(), "HEAD".to_string()])
        };
        let unstaged_stage = ("git".to_string(), vec!["diff-files".to_string(), "-z".to_string()]);
        let mut untracked_args = vec!["ls-files".to_string(), "--others".to_string(), "--exclude-standard".to_string(), "-z".to_string()];
        if !opt.status_untracked_dirs {
            untracked_args.push("--directory".to_string());
        }
        let untracked_stage = ("git".to_string(), untracked_args);

        crate::shell::chain(&[staged_stage, unstaged_stage, untracked_stage], STAGE_SENTINEL, core_process::Delimiter::Nul)
    }

    fn read(&mut self, view: &mut View, _opt: &Options, raw: Option<&[u8]>) {
        let Some(bytes) = raw else {
            self.flush_stage(view, StatusSection::Untracked);
            return;
        };
        if view.lines.is_empty() {
            let header = header_text(&self.git_dir);
            view.lines.push(Line::new(LineType::Title, 0, header));
            self.entries.push(None);
        }
        let text = String::from_utf8_lossy(bytes).to_string();
        if text == STAGE_SENTINEL {
            match self.stream {
                StatusSection::Staged => {
                    self.flush_stage(view, StatusSection::Staged);
                    self.stream = StatusSection::Unstaged;
                }
                StatusSection::Unstaged => {
                    self.flush_stage(view, StatusSection::Unstaged);
                    self.stream = StatusSection::Untracked;
                }
                StatusSection::Untracked => {}
            }
            return;
        }
        self.records.push(text);
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        let mut cursor = Cursor::new(0, row);
        let Some(Some(entry)) = self.entries.get(line_index) else {
            return draw::draw_chars(frame, &mut cursor, opt, line.line_type, &line.data, frame.width, view.col as u16, false);
        };
        let status_text = format!("{}", entry.status);
        let line_type = match entry.status {
            'U' => LineType::StatUnstaged,
            _ if entry.section == StatusSection::Staged => LineType::StatStaged,
            _ if entry.section == StatusSection::Untracked => LineType::StatUntracked,
            _ => LineType::StatUnstaged,
        };
        if draw::draw_field(frame, &mut cursor, line_type, &status_text, 1, draw::Align::Left, true) {
            return true;
        }
        let remaining = frame.width.saturating_sub(cursor.x);
        draw::draw_chars(frame, &mut cursor, opt, line_type, entry.display_name(), remaining, view.col as u16, false)
    }

    fn request(&mut self, view: &mut View, _opt: &Options, req: core_keymap::Request, line_index: Option<usize>) -> core_keymap::Request {
        use core_keymap::Request;
        match req {
            Request::Enter => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(entry)) = self.entries.get(idx) else { return Request::None };
                view.argv_template = entry.to_stage_target(self.head_unborn).encode();
                Request::ViewStage
            }
            // The status view never shows a diff body, so every stage/revert
            // key here always acts on the whole file (§4.K "Whole-file update").
            Request::StageUpdate | Request::StatusMergeRecord => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(entry)) = self.entries.get(idx) else { return Request::None };
                let target = entry.to_stage_target(self.head_unborn);
                let dir = view.dir.clone();
                if crate::stage::whole_file_update(dir.as_deref(), &target) {
                    Request::Reload
                } else {
                    Request::None
                }
            }
            Request::StatusRevert => {
                let Some(idx) = line_index else { return Request::None };
                let Some(Some(entry)) = self.entries.get(idx) else { return Request::None };
                let target = entry.to_stage_target(self.head_unborn);
                let dir = view.dir.clone();
                if crate::stage::whole_file_revert(dir.as_deref(), &target) {
                    Request::Reload
                } else {
                    Request::None
                }
            }
            Request::StageNextHunk => {
                let Some(idx) = line_index else { return Request::None };
                let next = (idx + 1..self.entries.len()).find(|&i| self.entries[i].is_some());
                if let Some(i) = next {
                    view.pos.lineno = i;
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
        self.records.clear();
        self.staged_raw.clear();
        self.unstaged_raw.clear();
        self.stream = StatusSection::Staged;
    }
}

impl StatusOps {
    pub fn entry_at(&self, line_index: usize) -> Option<&StatusEntry> {
        self.entries.get(line_index).and_then(|e| e.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_modified_record() {
        let meta = ":100644 100644 aaa bbb M";
        let (entry, consumed) = parse_diff_record(meta, &["src/lib.rs"], StatusSection::Unstaged).unwrap();
        assert_eq!(entry.status, 'M');
        assert_eq!(consumed, 1);
        assert_eq!(entry.display_name(), "src/lib.rs");
    }

    #[test]
    fn parses_rename_record_with_two_paths() {
        let meta = ":100644 100644 aaa bbb R100";
        let (entry, consumed) = parse_diff_record(meta, &["old.rs", "new.rs"], StatusSection::Staged).unwrap();
        assert_eq!(entry.status, 'R');
        assert_eq!(consumed, 2);
        assert_eq!(entry.new_name, "new.rs");
    }

    #[test]
    fn collapses_unmerged_duplicate_into_single_u_entry() {
        let entries = vec![
            StatusEntry { section: StatusSection::Unstaged, status: 'U', old_mode: String::new(), old_rev: String::new(), old_name: "a.rs".into(), new_mode: String::new(), new_rev: String::new(), new_name: "a.rs".into() },
            StatusEntry { section: StatusSection::Unstaged, status: 'M', old_mode: String::new(), old_rev: String::new(), old_name: "a.rs".into(), new_mode: String::new(), new_rev: String::new(), new_name: "a.rs".into() },
        ];
        let collapsed = collapse_unmerged(entries);
        assert_eq!(collapsed.len(), 1);
        assert_eq!(collapsed[0].status, 'U');
    }

    #[test]
    fn open_argv_chains_three_stages_through_sh() {
        let mut ops = StatusOps::new(std::path::PathBuf::from(".git"));
        let view = View::new(ViewKind::Status, 80, 24);
        let (program, args) = ops.open_argv(&view, &Options::default());
        assert_eq!(program, "sh");
        assert!(args[1].contains("diff-files"));
        assert!(args[1].contains("ls-files --others --exclude-standard"));
    }

    #[test]
    fn read_splits_stages_on_sentinel_record() {
        let mut ops = StatusOps::new(std::path::PathBuf::from(".git"));
        ops.head_unborn = false;
        let mut view = View::new(ViewKind::Status, 80, 24);
        ops.read(&mut view, &Options::default(), Some(b":100644 100644 aaa bbb M"));
        ops.read(&mut view, &Options::default(), Some(b"src/lib.rs"));
        ops.read(&mut view, &Options::default(), Some(STAGE_SENTINEL.as_bytes()));
        assert_eq!(ops.stream, StatusSection::Unstaged);
        assert!(view.lines.iter().any(|l| l.data == "Staged changes:"));
        ops.read(&mut view, &Options::default(), Some(STAGE_SENTINEL.as_bytes()));
        assert_eq!(ops.stream, StatusSection::Untracked);
        ops.read(&mut view, &Options::default(), Some(b"new_file.rs"));
        ops.read(&mut view, &Options::default(), None);
        assert!(view.lines.iter().any(|l| l.data == "new_file.rs"));
    }
}
