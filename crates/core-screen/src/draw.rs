//! Column-cursor draw primitives (component D).
//!
//! Every `draw_*` function appends to a row starting at `cursor.x` and
//! returns `true` when the row's visible width has been exhausted, so a
//! caller composing a line (`draw_lineno` → `draw_date` → `draw_author` →
//! … → `draw_chars`) can short-circuit the remaining fields.

use crate::{Cell, CellFlags, Frame};
use core_options::{LineGraphics, LineType, Options};
use core_text::expand_tabs;
use core_text::grapheme;

#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub x: u16,
    pub y: u16,
}

impl Cursor {
    pub fn new(x: u16, y: u16) -> Self {
        Cursor { x, y }
    }

    fn remaining(&self, frame: &Frame) -> u16 {
        frame.width.saturating_sub(self.x)
    }

    fn exhausted(&self, frame: &Frame) -> bool {
        self.x >= frame.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

fn vertical_separator(opts: &Options) -> &'static str {
    match opts.line_graphics {
        LineGraphics::Ascii => "|",
        _ => "\u{2502}",
    }
}

/// Write one grapheme cluster, advancing `cursor.x`. Caller guarantees the
/// cluster fits within the frame (`cursor.x + width <= frame.width`).
fn put_cluster(frame: &mut Frame, cursor: &mut Cursor, cluster: &str, flags: CellFlags, line_type: Option<LineType>) {
    let width = grapheme::cluster_width(cluster) as u16;
    frame.set_cluster(cursor.x, cursor.y, cluster, width, flags, line_type);
    cursor.x = cursor.x.saturating_add(width.max(1));
}

fn put_padding(frame: &mut Frame, cursor: &mut Cursor, count: u16, line_type: Option<LineType>) {
    for _ in 0..count {
        if cursor.exhausted(frame) {
            break;
        }
        put_cluster(frame, cursor, " ", CellFlags::empty(), line_type);
    }
}

/// Render `s` (already tab-expanded at `opt.tab_size` and honoring the
/// view's horizontal scroll offset `view_col`) into at most `max` columns.
/// If truncated and `use_tilde`, the final visible column becomes `~` in
/// the delimiter style. Returns `true` when the row is exhausted.
pub fn draw_chars(
    frame: &mut Frame,
    cursor: &mut Cursor,
    opts: &Options,
    line_type: LineType,
    s: &str,
    max: u16,
    view_col: u16,
    use_tilde: bool,
) -> bool {
    let expanded = expand_tabs(s, opts.tab_size as u16);
    let budget = max.min(cursor.remaining(frame));
    let mut logical_col: u16 = 0;
    let mut written: u16 = 0;
    let mut truncated = false;

    for cluster in grapheme::iter(&expanded) {
        let w = grapheme::cluster_width(cluster) as u16;
        if logical_col < view_col {
            logical_col = logical_col.saturating_add(w.max(1));
            continue;
        }
        if written.saturating_add(w.max(1)) > budget {
            truncated = true;
            break;
        }
        put_cluster(frame, cursor, cluster, CellFlags::empty(), Some(line_type));
        written = written.saturating_add(w.max(1));
        logical_col = logical_col.saturating_add(w.max(1));
    }

    if truncated && use_tilde && !cursor.exhausted(frame) {
        put_cluster(frame, cursor, "~", CellFlags::DELIMITER, Some(line_type));
    }

    cursor.exhausted(frame)
}

/// Left- or right-aligned fixed cell, `width` columns plus one trailing
/// separator space. `trim` controls whether text longer than `width` is cut
/// short (true) or allowed to overflow into the trailing space (false).
pub fn draw_field(
    frame: &mut Frame,
    cursor: &mut Cursor,
    line_type: LineType,
    s: &str,
    width: u16,
    align: Align,
    trim: bool,
) -> bool {
    if cursor.exhausted(frame) {
        return true;
    }

    let clusters: Vec<&str> = grapheme::iter(s).collect();
    let text_width: u16 = clusters.iter().map(|c| grapheme::cluster_width(c) as u16).sum();
    let cell_width = if trim { width } else { width.max(text_width) };
    let pad = cell_width.saturating_sub(text_width.min(cell_width));

    match align {
        Align::Left => {
            let mut used = 0u16;
            for cluster in &clusters {
                let w = grapheme::cluster_width(cluster) as u16;
                if used.saturating_add(w) > cell_width || cursor.exhausted(frame) {
                    break;
                }
                put_cluster(frame, cursor, cluster, CellFlags::empty(), Some(line_type));
                used = used.saturating_add(w.max(1));
            }
            put_padding(frame, cursor, pad, Some(line_type));
        }
        Align::Right => {
            put_padding(frame, cursor, pad, Some(line_type));
            let mut used = 0u16;
            for cluster in &clusters {
                let w = grapheme::cluster_width(cluster) as u16;
                if used.saturating_add(w) > cell_width || cursor.exhausted(frame) {
                    break;
                }
                put_cluster(frame, cursor, cluster, CellFlags::empty(), Some(line_type));
                used = used.saturating_add(w.max(1));
            }
        }
    }

    put_padding(frame, cursor, 1, Some(line_type));
    cursor.exhausted(frame)
}

/// Pass `chars` through unchanged (already composed ACS/Unicode glyphs),
/// optionally appending a single separator space.
pub fn draw_graphic(frame: &mut Frame, cursor: &mut Cursor, line_type: LineType, chars: &str, separator: bool) -> bool {
    for cluster in grapheme::iter(chars) {
        if cursor.exhausted(frame) {
            return true;
        }
        put_cluster(frame, cursor, cluster, CellFlags::empty(), Some(line_type));
    }
    if separator {
        put_padding(frame, cursor, 1, Some(line_type));
    }
    cursor.exhausted(frame)
}

/// Right-justify `lineno` within `max(view_digits, 3)` columns, only at the
/// first row or at `line_number_interval` multiples, followed by a vertical
/// separator glyph. A no-op (returns `false`, reserves nothing) when
/// `show_line_numbers` is off.
pub fn draw_lineno(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, view_digits: u16, lineno: u32, is_first: bool) -> bool {
    if !opts.show_line_numbers {
        return false;
    }
    let width = view_digits.max(3);
    let interval = opts.line_number_interval.max(1) as u32;
    let show_number = is_first || lineno % interval == 0;

    if show_number {
        let text = lineno.to_string();
        draw_field(frame, cursor, LineType::Default, &text, width, Align::Right, true);
    } else {
        put_padding(frame, cursor, width, Some(LineType::Default));
    }
    let sep = vertical_separator(opts);
    draw_graphic(frame, cursor, LineType::Default, sep, true)
}

/// `show-date` formatted field. `formatted` is the already-formatted date
/// text (formatting mode is `opts.show_date`, applied by the caller that has
/// the raw timestamp); this primitive only handles the toggle and width.
pub fn draw_date(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, formatted: &str) -> bool {
    use core_options::ShowDate;
    if opts.show_date == ShowDate::No {
        return false;
    }
    draw_field(frame, cursor, LineType::Date, formatted, formatted.chars().count() as u16, Align::Left, false)
}

/// `show-author` formatted field, honoring `author-width` (`0` = natural width).
pub fn draw_author(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, name: &str) -> bool {
    use core_options::ShowAuthor;
    if opts.show_author == ShowAuthor::No {
        return false;
    }
    let width = if opts.author_width > 0 { opts.author_width as u16 } else { name.chars().count() as u16 };
    draw_field(frame, cursor, LineType::Author, name, width, Align::Left, true)
}

/// Fixed-width abbreviated object id field. Reserves its cell even when
/// `show-id` is off, so sibling columns stay aligned.
pub fn draw_id(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, id: &str) -> bool {
    let width = opts.id_width.max(4) as u16;
    if !opts.show_id {
        put_padding(frame, cursor, width + 1, None);
        return cursor.exhausted(frame);
    }
    draw_field(frame, cursor, LineType::Default, id, width, Align::Left, true)
}

pub fn draw_filename(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, name: &str, is_dir: bool) -> bool {
    use core_options::ShowFilename;
    if opts.show_filename == ShowFilename::No {
        return false;
    }
    let line_type = if is_dir { LineType::TreeDir } else { LineType::TreeFile };
    let width = if opts.filename_width > 0 { opts.filename_width as u16 } else { name.chars().count() as u16 };
    draw_field(frame, cursor, line_type, name, width, Align::Left, true)
}

/// Fixed-width byte-size field, already formatted by the caller (`opt.show-file-size`
/// selects plain-bytes vs. humanized units upstream). Reserves its cell when off.
pub fn draw_file_size(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, formatted: &str) -> bool {
    use core_options::ShowFileSize;
    const WIDTH: u16 = 10;
    if opts.show_file_size == ShowFileSize::No {
        put_padding(frame, cursor, WIDTH + 1, None);
        return cursor.exhausted(frame);
    }
    draw_field(frame, cursor, LineType::Default, formatted, WIDTH, Align::Right, true)
}

pub fn draw_mode(frame: &mut Frame, cursor: &mut Cursor, mode: &str) -> bool {
    draw_field(frame, cursor, LineType::Default, mode, mode.chars().count() as u16, Align::Left, false)
}

/// Branch/tag/remote decoration list next to a commit title.
pub fn draw_refs(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, refs: &str) -> bool {
    if !opts.show_refs || refs.is_empty() {
        return false;
    }
    draw_field(frame, cursor, LineType::MainRefs, refs, refs.chars().count() as u16, Align::Left, false)
}

/// The remainder of the row: the commit subject, truncated with the
/// view's current horizontal scroll offset applied.
pub fn draw_commit_title(frame: &mut Frame, cursor: &mut Cursor, opts: &Options, title: &str, view_col: u16) -> bool {
    let remaining = frame.width.saturating_sub(cursor.x);
    draw_chars(frame, cursor, opts, LineType::CommitTitle, title, remaining, view_col, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_options::Options;

    #[test]
    fn draw_field_left_pads_to_width_plus_separator() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        draw_field(&mut frame, &mut cursor, LineType::Default, "ab", 5, Align::Left, true);
        assert_eq!(cursor.x, 6);
        assert_eq!(frame.line_clusters(0)[..2], ["a", "b"]);
    }

    #[test]
    fn draw_field_right_aligns_with_leading_padding() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        draw_field(&mut frame, &mut cursor, LineType::Default, "7", 3, Align::Right, true);
        let row = frame.line_clusters(0);
        assert_eq!(row[0], " ");
        assert_eq!(row[1], " ");
        assert_eq!(row[2], "7");
    }

    #[test]
    fn draw_lineno_disabled_is_noop() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        let opts = Options::default();
        let exhausted = draw_lineno(&mut frame, &mut cursor, &opts, 3, 1, true);
        assert!(!exhausted);
        assert_eq!(cursor.x, 0);
    }

    #[test]
    fn draw_lineno_shows_at_first_line_and_interval() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        let mut opts = Options::default();
        opts.show_line_numbers = true;
        opts.line_number_interval = 5;
        draw_lineno(&mut frame, &mut cursor, &opts, 3, 1, true);
        assert!(cursor.x > 0);
    }

    #[test]
    fn draw_chars_truncates_with_tilde() {
        let mut frame = Frame::new(5, 1);
        let mut cursor = Cursor::new(0, 0);
        let opts = Options::default();
        draw_chars(&mut frame, &mut cursor, &opts, LineType::Default, "hello world", 5, 0, true);
        let row = frame.line_clusters(0);
        assert_eq!(row.last(), Some(&"~"));
    }

    #[test]
    fn draw_chars_honors_horizontal_scroll_offset() {
        let mut frame = Frame::new(10, 1);
        let mut cursor = Cursor::new(0, 0);
        let opts = Options::default();
        draw_chars(&mut frame, &mut cursor, &opts, LineType::Default, "abcdef", 10, 2, false);
        let row = frame.line_clusters(0);
        assert_eq!(row[0], "c");
    }

    #[test]
    fn draw_id_reserves_cell_when_disabled() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        let opts = Options::default();
        assert!(!opts.show_id);
        draw_id(&mut frame, &mut cursor, &opts, "deadbee");
        assert_eq!(cursor.x, opts.id_width as u16 + 1);
    }

    #[test]
    fn draw_author_skips_entirely_when_disabled() {
        let mut frame = Frame::new(20, 1);
        let mut cursor = Cursor::new(0, 0);
        let mut opts = Options::default();
        opts.show_author = core_options::ShowAuthor::No;
        let exhausted = draw_author(&mut frame, &mut cursor, &opts, "jane");
        assert!(!exhausted);
        assert_eq!(cursor.x, 0);
    }
}
