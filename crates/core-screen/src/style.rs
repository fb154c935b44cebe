//! Style layer: per-line overlay spans applied on top of a row's base
//! line-type coloring.
//!
//! Design invariants:
//! * A `StyleSpan` never splits a grapheme cluster; callers compute visual
//!   columns using the authoritative width engine (`core-text`) before
//!   constructing spans.
//! * Spans are line-local (identified by `line`). Horizontal ranges use
//!   half-open `[start_col, end_col)` semantics in visual columns.
//! * At most one `Selection` span is expected per frame (the current row);
//!   overlap semantics beyond that are left to the caller.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleAttr {
    /// The view's current row (reverse-video highlight).
    Selection,
    /// A transient overlay (status line, search prompt) drawn over content.
    Overlay,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleSpan {
    pub line: usize,
    pub start_col: u16,
    pub end_col: u16,
    pub attr: StyleAttr,
}

impl StyleSpan {
    pub fn width(&self) -> u16 {
        self.end_col.saturating_sub(self.start_col)
    }
}

#[derive(Default, Debug)]
pub struct StyleLayer {
    pub spans: Vec<StyleSpan>,
}

impl StyleLayer {
    pub fn new() -> Self {
        Self { spans: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    pub fn push(&mut self, span: StyleSpan) {
        self.spans.push(span);
    }

    pub fn selection_span(&self) -> Option<&StyleSpan> {
        self.spans.iter().find(|s| matches!(s.attr, StyleAttr::Selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_span_basic() {
        let mut layer = StyleLayer::new();
        layer.push(StyleSpan {
            line: 0,
            start_col: 0,
            end_col: 80,
            attr: StyleAttr::Selection,
        });
        let s = layer.selection_span().expect("selection span");
        assert_eq!(s.width(), 80);
    }
}
