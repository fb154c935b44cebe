//! Screen grid and draw primitives (component D).
//!
//! A `Frame` is a grid of grapheme-cluster cells built up one row at a time
//! by the `draw` primitives, then flushed to the terminal through `writer`.
//! Leader cells carry the full cluster text and its visual width;
//! continuation cells (width 0) occupy the remaining columns of a
//! multi-column cluster and are never printed directly — emission always
//! walks leaders only, so combining marks and wide glyphs never get split.

use bitflags::bitflags;

pub mod draw;
pub mod style;
pub mod title;
pub mod writer;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CellFlags: u8 {
        const REVERSE  = 0b0000_0001; // current row highlight
        const DELIMITER = 0b0000_0010; // truncation '~' / separator glyphs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Full grapheme cluster string (leader cells only). Empty for continuation cells.
    pub cluster: String,
    /// Visual width in terminal columns. `0` designates a continuation cell.
    pub width: u8,
    pub flags: CellFlags,
    pub line_type: Option<core_options::LineType>,
}

impl Cell {
    #[inline]
    pub fn leader(cluster: &str, width: u16, flags: CellFlags, line_type: Option<core_options::LineType>) -> Self {
        Self {
            cluster: cluster.to_string(),
            width: width.max(1) as u8,
            flags,
            line_type,
        }
    }

    #[inline]
    pub fn continuation(flags: CellFlags, line_type: Option<core_options::LineType>) -> Self {
        Self {
            cluster: String::new(),
            width: 0,
            flags,
            line_type,
        }
    }

    #[inline]
    pub fn is_leader(&self) -> bool {
        self.width > 0
    }

    #[inline]
    pub fn visual_width(&self) -> u16 {
        self.width as u16
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cluster: " ".to_string(),
            width: 1,
            flags: CellFlags::empty(),
            line_type: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Frame {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); (width as usize) * (height as usize)],
        }
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Set a full cluster at (x,y) and populate continuation cells for its width.
    pub fn set_cluster(
        &mut self,
        x: u16,
        y: u16,
        cluster: &str,
        width: u16,
        flags: CellFlags,
        line_type: Option<core_options::LineType>,
    ) {
        if x >= self.width || y >= self.height {
            return;
        }
        let w = width.max(1).min(self.width - x);
        if let Some(idx) = self.index(x, y) {
            self.cells[idx] = Cell::leader(cluster, w, flags, line_type);
        }
        for dx in 1..w {
            if let Some(c_idx) = self.index(x + dx, y) {
                self.cells[c_idx] = Cell::continuation(flags, line_type);
            }
        }
    }

    /// Apply additional flags over an existing span (leader + continuations),
    /// e.g. the reverse-video highlight for the current row.
    pub fn apply_flags_span(&mut self, x: u16, y: u16, span_width: u16, flags: CellFlags) {
        let span = span_width.min(self.width.saturating_sub(x));
        for dx in 0..span {
            if let Some(idx) = self.index(x + dx, y) {
                self.cells[idx].flags |= flags;
            }
        }
    }

    /// Iterate leader cells of a row, yielding (cluster, width, flags, line_type, start_x).
    pub fn row_leaders(
        &self,
        y: u16,
    ) -> impl Iterator<Item = (&str, u16, CellFlags, Option<core_options::LineType>, u16)> {
        let width = self.width;
        let start = y as usize * width as usize;
        let cells = &self.cells;
        let mut x = 0u16;
        std::iter::from_fn(move || {
            while x < width {
                let idx = start + x as usize;
                let cell = &cells[idx];
                if cell.is_leader() {
                    let w = cell.visual_width();
                    let out = (cell.cluster.as_str(), w, cell.flags, cell.line_type, x);
                    x = x.saturating_add(w);
                    return Some(out);
                } else {
                    x += 1;
                }
            }
            None
        })
    }

    /// Collect leader cluster strings for a given row (testing / diagnostics only).
    pub fn line_clusters(&self, y: u16) -> Vec<&str> {
        if y >= self.height {
            return Vec::new();
        }
        self.row_leaders(y).map(|(c, _, _, _, _)| c).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cluster_fills_continuation_cells_for_wide_glyphs() {
        let mut frame = Frame::new(10, 1);
        frame.set_cluster(0, 0, "\u{4e2d}", 2, CellFlags::empty(), None);
        assert!(frame.cells[0].is_leader());
        assert!(!frame.cells[1].is_leader());
        assert_eq!(frame.cells[1].width, 0);
    }

    #[test]
    fn row_leaders_skip_continuations() {
        let mut frame = Frame::new(10, 1);
        frame.set_cluster(0, 0, "a", 1, CellFlags::empty(), None);
        frame.set_cluster(1, 0, "\u{4e2d}", 2, CellFlags::empty(), None);
        frame.set_cluster(3, 0, "b", 1, CellFlags::empty(), None);
        let leaders: Vec<_> = frame.row_leaders(0).map(|(c, w, _, _, x)| (c, w, x)).collect();
        assert_eq!(leaders, vec![("a", 1, 0), ("\u{4e2d}", 2, 1), ("b", 1, 3)]);
    }
}
