//! Display-width and grapheme segmentation utilities.
//!
//! A content browser never edits text, only measures and truncates it for
//! display, so unlike an editor's text-buffer crate this carries no rope or
//! cursor-position machinery: just grapheme segmentation (`segment`),
//! terminal column width (`width`), and a tab-expansion helper used by the
//! screen draw primitives.

pub mod segment;
pub mod width; // unified grapheme width indirection
#[cfg(feature = "term-probe")]
pub mod width_probe; // runtime terminal probe scaffold

// Re-export primary width function for convenience in callers that already depend on core-text.
pub use width::egc_width;

/// Expand tabs in `s` to spaces, stopping each tab at the next multiple of
/// `tab_size` columns. `tab_size == 0` is treated as 1.
pub fn expand_tabs(s: &str, tab_size: u16) -> String {
    let tab_size = tab_size.max(1) as usize;
    let mut out = String::with_capacity(s.len());
    let mut col = 0usize;
    for ch in s.chars() {
        if ch == '\t' {
            let next_stop = (col / tab_size + 1) * tab_size;
            for _ in col..next_stop {
                out.push(' ');
            }
            col = next_stop;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// Grapheme-cluster helpers operating on a single line. Used by the draw
/// primitives for column-cursor accounting and by the prompt line editor.
pub mod grapheme {
    use crate::egc_width;
    use unicode_segmentation::UnicodeSegmentation;

    /// Iterate grapheme clusters in a line.
    pub fn iter(line: &str) -> impl Iterator<Item = &str> {
        line.graphemes(true)
    }

    /// Previous grapheme boundary (returns 0 if already at or below the first boundary).
    pub fn prev_boundary(line: &str, byte: usize) -> usize {
        if byte == 0 || byte > line.len() {
            return 0;
        }
        let mut last = 0;
        for (idx, _) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            last = idx;
        }
        last
    }

    /// Next grapheme boundary (returns line.len() if at or beyond the end).
    pub fn next_boundary(line: &str, byte: usize) -> usize {
        if byte >= line.len() {
            return line.len();
        }
        for (idx, _) in line.grapheme_indices(true) {
            if idx > byte {
                return idx;
            }
        }
        line.len()
    }

    /// Visual column (terminal cells) up to, but not including, `byte`.
    pub fn visual_col(line: &str, byte: usize) -> usize {
        let mut col = 0;
        for (idx, g) in line.grapheme_indices(true) {
            if idx >= byte {
                break;
            }
            col += egc_width(g) as usize;
        }
        col
    }

    /// Width in terminal cells of this grapheme cluster.
    pub fn cluster_width(g: &str) -> usize {
        egc_width(g) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tabs_stops_at_multiples() {
        assert_eq!(expand_tabs("a\tb", 8), "a       b");
        assert_eq!(expand_tabs("\t", 4), "    ");
        assert_eq!(expand_tabs("ab\tcd", 4), "ab  cd");
    }

    #[test]
    fn expand_tabs_tab_size_zero_is_one() {
        assert_eq!(expand_tabs("a\tb", 0), "a b");
    }

    #[test]
    fn grapheme_boundaries_roundtrip() {
        let s = "ab";
        let next = grapheme::next_boundary(s, 0);
        assert_eq!(grapheme::prev_boundary(s, next), 0);
    }
}
