//! The `View` struct and the per-kind operation contract.
//!
//! `View` owns everything generic to every pane (scrolling, the line
//! array, its producing subprocess, title state); the text shown and the
//! meaning of a keypress are supplied by a `Box<dyn ViewOps>` the same way
//! the binary's action dispatcher takes `Box<dyn ActionObserver>` hooks —
//! one object per view kind, installed once at startup by `core-git`.

use crate::position::Position;
use core_keymap::Request;
use core_options::{LineType, Options};
use core_process::ProcessHandle;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Main,
    Diff,
    Log,
    Status,
    Stage,
    Tree,
    Blob,
    Blame,
    Branch,
    Stash,
    Pager,
    Help,
}

impl ViewKind {
    /// Name of the keymap this view's keys resolve through.
    pub fn keymap_name(self) -> &'static str {
        match self {
            ViewKind::Main => "main",
            ViewKind::Diff => "diff",
            ViewKind::Log => "log",
            ViewKind::Status => "status",
            ViewKind::Stage => "stage",
            ViewKind::Tree => "tree",
            ViewKind::Blob => "blob",
            ViewKind::Blame => "blame",
            ViewKind::Branch => "branch",
            ViewKind::Stash => "stash",
            ViewKind::Pager => "pager",
            ViewKind::Help => "help",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ViewKind::Main => "main",
            ViewKind::Diff => "diff",
            ViewKind::Log => "log",
            ViewKind::Status => "status",
            ViewKind::Stage => "stage",
            ViewKind::Tree => "tree",
            ViewKind::Blob => "blob",
            ViewKind::Blame => "blame",
            ViewKind::Branch => "branch",
            ViewKind::Stash => "stash",
            ViewKind::Pager => "pager",
            ViewKind::Help => "help",
        }
    }

    pub fn from_request(req: Request) -> Option<ViewKind> {
        Some(match req {
            Request::ViewMain => ViewKind::Main,
            Request::ViewDiff => ViewKind::Diff,
            Request::ViewLog => ViewKind::Log,
            Request::ViewStatus => ViewKind::Status,
            Request::ViewStage => ViewKind::Stage,
            Request::ViewTree => ViewKind::Tree,
            Request::ViewBlob => ViewKind::Blob,
            Request::ViewBlame => ViewKind::Blame,
            Request::ViewBranch => ViewKind::Branch,
            Request::ViewStash => ViewKind::Stash,
            Request::ViewPager => ViewKind::Pager,
            Request::ViewHelp => ViewKind::Help,
            _ => return None,
        })
    }
}

/// Lifecycle of a view's producing subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Unloaded,
    Loading,
    Loaded,
    Closed,
}

/// One rendered row. `data` carries the raw text; component-specific
/// structured payloads (blame commit joins, graph glyphs, status entries)
/// are kept by the owning view-kind handler, keyed by row index, rather
/// than inline here — most rows only ever need the text and a type tag.
#[derive(Debug, Clone)]
pub struct Line {
    pub line_type: LineType,
    /// 1-based logical line number; 0 marks a synthetic row (title,
    /// separator, group heading) that does not advance the counter.
    pub lineno: usize,
    pub selected: bool,
    pub dirty: bool,
    pub cleareol: bool,
    pub wrapped: bool,
    pub user_flags: u8,
    pub data: String,
}

impl Line {
    pub fn new(line_type: LineType, lineno: usize, data: impl Into<String>) -> Self {
        Line {
            line_type,
            lineno,
            selected: false,
            dirty: true,
            cleareol: false,
            wrapped: false,
            user_flags: 0,
            data: data.into(),
        }
    }

    pub fn custom(line_type: LineType, data: impl Into<String>) -> Self {
        Line::new(line_type, 0, data)
    }

    pub fn is_custom(&self) -> bool {
        self.lineno == 0
    }
}

/// Per-kind behavior: the six operations every view implements (§4.E).
/// `view` is the owning [`View`]'s generic state, passed in so a handler
/// can read position/options without owning a second copy.
pub trait ViewOps {
    fn kind(&self) -> ViewKind;

    /// Build (or rebuild, on reload) the argv for this view's producing
    /// subprocess. Template substitution has already been applied by the
    /// caller; this returns the final program + args.
    fn open_argv(&mut self, view: &View, opt: &Options) -> (String, Vec<String>);

    /// Record delimiter the producing subprocess's stdout is split on.
    /// Every handler but `status` (NUL-separated `diff-index`/`ls-files`
    /// records chained through `sh -c`) reads ordinary newline-terminated
    /// `git` output.
    fn delimiter(&self) -> core_process::Delimiter {
        core_process::Delimiter::Newline
    }

    /// Consume one freshly read line (or `None` on EOF) and append zero or
    /// more [`Line`]s to `view.lines`. `opt` is read-only here (line-type
    /// classification consults the live custom-color prefix table); actual
    /// display formatting is deferred to `draw`.
    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>);

    /// Render `line` into `frame` at row `row` of the view's visible window.
    /// `opt` supplies the formatting toggles (`show-date`, `show-author`,
    /// ...) so a toggle change only needs a redraw, not a reload. Returns
    /// `true` if the row was fully handled (the generic pager fallback in
    /// `core-screen::draw` is used when a handler returns `false`).
    fn draw(&mut self, view: &mut View, frame: &mut core_screen::Frame, opt: &Options, line_index: usize, row: u16) -> bool;

    /// Per-kind request override, run before the generic dispatcher.
    /// Returning `Request::None` means "not handled, fall through".
    fn request(&mut self, view: &mut View, opt: &Options, req: Request, line_index: Option<usize>) -> Request;

    /// Search predicate: does `line` match the active search term.
    fn grep(&self, view: &View, line_index: usize) -> bool;

    /// Side effects of moving the cursor onto `line` (updating a
    /// cross-view reference commit, etc).
    fn select(&mut self, view: &mut View, line_index: usize);

    /// Called on reload, before the line array is cleared.
    fn done(&mut self, _view: &mut View) {}
}

/// Generic per-pane state shared by every view kind.
pub struct View {
    pub kind: ViewKind,
    /// Staleness key: bumped whenever the view's argv/command template
    /// changes (new target commit, new file), forcing a reload even if
    /// the kind is already open.
    pub vid: u64,
    pub width: u16,
    pub height: u16,
    pub pos: Position,
    pub prev_pos: Option<Position>,
    pub lines: Vec<Line>,
    pub digits: u32,
    pub pipe: Option<ProcessHandle>,
    pub loading_since: Option<Instant>,
    pub state: ViewState,
    pub dir: Option<std::path::PathBuf>,
    pub env: Vec<(String, String)>,
    pub argv_template: Vec<String>,
    pub reference: Option<String>,
    pub parent: Option<ViewKind>,
    pub prev: Option<ViewKind>,
    pub col: usize,
}

impl View {
    pub fn new(kind: ViewKind, width: u16, height: u16) -> Self {
        View {
            kind,
            vid: 0,
            width,
            height,
            pos: Position::new(),
            prev_pos: None,
            lines: Vec::new(),
            digits: 1,
            pipe: None,
            loading_since: None,
            state: ViewState::Unloaded,
            dir: None,
            env: Vec::new(),
            argv_template: Vec::new(),
            reference: None,
            parent: None,
            prev: None,
            col: 0,
        }
    }

    pub fn reset(&mut self) {
        self.lines.clear();
        self.pos = Position::new();
        self.digits = 1;
        self.loading_since = None;
    }

    /// Count of non-custom lines, used for the title bar and digit width.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_loading(&self) -> bool {
        self.state == ViewState::Loading
    }

    /// Recompute `digits` from the current line count; returns `true` if it
    /// changed (callers force a full redraw when line numbers are shown).
    pub fn recompute_digits(&mut self) -> bool {
        let n = count_digits(self.line_count());
        if n != self.digits {
            self.digits = n;
            true
        } else {
            false
        }
    }

    pub fn loading_secs(&self) -> Option<u64> {
        self.loading_since.map(|t| t.elapsed().as_secs()).filter(|s| *s >= 2)
    }

    /// §4.E `restore_view_position`: on first load of the primary view jump
    /// to a requested line, else restore a saved position if the user
    /// hasn't moved the cursor since it was taken.
    pub fn restore_position(&mut self, requested_lineno: Option<usize>) {
        if let Some(lineno) = requested_lineno {
            if lineno > 0 && lineno - 1 < self.line_count() {
                self.pos.lineno = lineno - 1;
                self.pos.offset = self.pos.lineno.saturating_sub(self.height as usize / 2);
                return;
            }
        }
        if let Some(prev) = self.prev_pos.take() {
            if self.pos == Position::new() {
                self.pos = prev;
                self.pos.clamp(self.line_count(), self.height as usize);
            }
        }
    }
}

fn count_digits(n: usize) -> u32 {
    if n == 0 { 1 } else { (n as f64).log10().floor() as u32 + 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recompute_digits_detects_change() {
        let mut view = View::new(ViewKind::Log, 80, 24);
        for i in 0..9 {
            view.lines.push(Line::new(LineType::Default, i + 1, "x"));
        }
        assert!(!view.recompute_digits());
        view.lines.push(Line::new(LineType::Default, 10, "x"));
        assert!(view.recompute_digits());
        assert_eq!(view.digits, 2);
    }

    #[test]
    fn restore_position_jumps_to_requested_lineno() {
        let mut view = View::new(ViewKind::Main, 80, 24);
        for i in 0..50 {
            view.lines.push(Line::new(LineType::Default, i + 1, "x"));
        }
        view.restore_position(Some(10));
        assert_eq!(view.pos.lineno, 9);
    }

    #[test]
    fn restore_position_uses_saved_pos_when_cursor_untouched() {
        let mut view = View::new(ViewKind::Main, 80, 24);
        for i in 0..50 {
            view.lines.push(Line::new(LineType::Default, i + 1, "x"));
        }
        view.prev_pos = Some(Position { offset: 5, col: 0, lineno: 8 });
        view.restore_position(None);
        assert_eq!(view.pos.lineno, 8);
    }

    #[test]
    fn restore_position_skipped_once_cursor_has_moved() {
        let mut view = View::new(ViewKind::Main, 80, 24);
        for i in 0..50 {
            view.lines.push(Line::new(LineType::Default, i + 1, "x"));
        }
        view.pos.lineno = 3;
        view.prev_pos = Some(Position { offset: 5, col: 0, lineno: 8 });
        view.restore_position(None);
        assert_eq!(view.pos.lineno, 3);
    }

    #[test]
    fn view_kind_round_trips_through_request() {
        assert_eq!(ViewKind::from_request(Request::ViewBlame), Some(ViewKind::Blame));
        assert_eq!(ViewKind::from_request(Request::Quit), None);
    }
}
