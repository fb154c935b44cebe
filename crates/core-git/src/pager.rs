//! Generic pager (component F) and line-wrapping shared by every
//! text-streaming view (pager, diff, log, blame, tree dumps to the editor
//! spool). One input line becomes one or more rows: when `wrap_lines` is on,
//! a line wider than the view splits into continuation rows prefixed with
//! `+` in the delimiter color, a row width of `view.width - 1` leaving room
//! for that prefix.

use core_options::{LineInfoTable, LineType, Options};
use core_screen::draw::{self, Align, Cursor};
use core_screen::Frame;
use core_view::{Line, View};

/// Classify one freshly read raw line and split it into one or more rows
/// per the `wrap-lines` option, returning ready-to-append [`Line`]s.
pub fn lines_for_raw(lines_table: &LineInfoTable, lineno: usize, raw: &str, width: u16, wrap: bool) -> Vec<Line> {
    let line_type = lines_table.classify(raw);
    split_wrapped(line_type, lineno, raw, width, wrap)
}

pub fn split_wrapped(line_type: LineType, lineno: usize, raw: &str, width: u16, wrap: bool) -> Vec<Line> {
    if !wrap || width <= 1 {
        return vec![Line::new(line_type, lineno, raw)];
    }
    let budget = (width.saturating_sub(1)).max(1) as usize;
    let clusters: Vec<&str> = core_text::grapheme::iter(raw).collect();
    if clusters.len() <= budget {
        return vec![Line::new(line_type, lineno, raw)];
    }
    let mut out = Vec::new();
    let mut chunk_start = 0;
    let mut first = true;
    while chunk_start < clusters.len() {
        let end = (chunk_start + budget).min(clusters.len());
        let text: String = clusters[chunk_start..end].concat();
        let mut line = Line::new(line_type, lineno, text);
        if !first {
            line.wrapped = true;
        }
        out.push(line);
        chunk_start = end;
        first = false;
    }
    out
}

/// Draw one already-classified text row: optional line number gutter, a
/// `+` continuation marker for wrapped rows, then the text itself.
pub fn draw_text_row(frame: &mut Frame, opt: &Options, view: &View, line: &Line, row: u16) -> bool {
    let mut cursor = Cursor::new(0, row);
    if draw::draw_lineno(frame, &mut cursor, opt, view.digits as u16, line.lineno.max(1) as u32, line.lineno <= 1) {
        return true;
    }
    if line.wrapped {
        if draw::draw_field(frame, &mut cursor, LineType::Default, "+", 1, Align::Left, true) {
            return true;
        }
    }
    let remaining = frame.width.saturating_sub(cursor.x);
    draw::draw_chars(frame, &mut cursor, opt, line.line_type, &line.data, remaining, view.col as u16, false)
}

/// A bare pass-through pager: the `Pager` view (`!`-command output and
/// `tig < stream`) and the `Help` view (static keymap dump) both reduce to
/// "read lines in, classify, draw" with no extra per-row payload.
pub struct PagerOps {
    kind: core_view::ViewKind,
    help_text: Option<Vec<String>>,
}

impl PagerOps {
    pub fn pager() -> Self {
        PagerOps { kind: core_view::ViewKind::Pager, help_text: None }
    }

    /// `help_text` is pre-rendered by the caller (it needs the live
    /// `KeymapRegistry`, which this crate doesn't own) and handed over at
    /// construction; the view "loads" instantly since there's no subprocess.
    pub fn help(help_text: Vec<String>) -> Self {
        PagerOps { kind: core_view::ViewKind::Help, help_text: Some(help_text) }
    }
}

impl core_view::ViewOps for PagerOps {
    fn kind(&self) -> core_view::ViewKind {
        self.kind
    }

    fn open_argv(&mut self, _view: &View, _opt: &Options) -> (String, Vec<String>) {
        // Neither variant drives a real subprocess: Pager's argv is set by
        // whoever opened it (a `!` run-request or stdin passthrough) via
        // `view.argv_template`/env before open; Help has no argv at all.
        ("true".to_string(), Vec::new())
    }

    fn read(&mut self, view: &mut View, opt: &Options, raw: Option<&[u8]>) {
        if let Some(text) = self.help_text.take() {
            for (i, line) in text.into_iter().enumerate() {
                view.lines.push(Line::new(LineType::Default, i + 1, line));
            }
            return;
        }
        let Some(raw) = raw else { return };
        let text = String::from_utf8_lossy(raw).to_string();
        let lineno = view.line_count() + 1;
        for line in lines_for_raw(&opt.lines, lineno, &text, view.width, opt.wrap_lines) {
            view.lines.push(line);
        }
    }

    fn draw(&mut self, view: &mut View, frame: &mut Frame, opt: &Options, line_index: usize, row: u16) -> bool {
        let Some(line) = view.lines.get(line_index).cloned() else { return true };
        draw_text_row(frame, opt, view, &line, row)
    }

    fn request(&mut self, _view: &mut View, _opt: &Options, _req: core_keymap::Request, _line_index: Option<usize>) -> core_keymap::Request {
        core_keymap::Request::None
    }

    fn grep(&self, view: &View, line_index: usize) -> bool {
        view.lines.get(line_index).is_some()
    }

    fn select(&mut self, _view: &mut View, _line_index: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_long_lines_with_continuation_prefix() {
        let rows = split_wrapped(LineType::Default, 1, "abcdefghij", 5, true);
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].wrapped);
        assert!(rows[1].wrapped);
        assert_eq!(rows[0].data, "abcd");
    }

    #[test]
    fn short_lines_are_not_split() {
        let rows = split_wrapped(LineType::Default, 1, "ab", 5, true);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn wrapping_disabled_keeps_one_row_regardless_of_width() {
        let rows = split_wrapped(LineType::Default, 1, "abcdefghij", 5, false);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].data, "abcdefghij");
    }
}
