//! Ancestry-graph glyph renderer (§4.G). Each commit gets one column in a
//! growing set of active lanes; a commit's glyph row records, per lane,
//! whether a lane passes through, branches, merges, or terminates here.

use core_options::LineGraphics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphKind {
    /// No line in this lane on this row.
    Blank,
    /// A lane passing straight through.
    Vertical,
    /// This row's commit, in its own lane.
    Commit,
    /// A lane merging in from the right.
    MergeRight,
    /// A lane forking out to the right (a parent not yet seen).
    ForkRight,
    /// Horizontal connector between two lane columns.
    Horizontal,
}

#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    pub kind: GlyphKind,
    /// Lane index, used to pick a stable color by `lane % palette_len`.
    pub lane: usize,
}

pub type GraphRow = Vec<Glyph>;

/// Tracks active lanes (each holding the commit id it's waiting to see as a
/// parent) across calls to [`GraphRenderer::render`].
pub struct GraphRenderer {
    lanes: Vec<Option<String>>,
}

impl GraphRenderer {
    pub fn new() -> Self {
        GraphRenderer { lanes: Vec::new() }
    }

    /// Render the row for `id` with `parents`, advancing lane state.
    /// Grounded in the common column-tracking approach: find or allocate
    /// this commit's lane, emit connectors for every other still-open lane,
    /// then replace this lane with the first parent and append any extra
    /// parents as new lanes.
    pub fn render(&mut self, id: &str, parents: &[String]) -> GraphRow {
        let commit_lane = self.lanes.iter().position(|l| l.as_deref() == Some(id)).unwrap_or_else(|| {
            self.lanes.push(Some(id.to_string()));
            self.lanes.len() - 1
        });

        let mut row = Vec::with_capacity(self.lanes.len());
        for (i, lane) in self.lanes.iter().enumerate() {
            let kind = if i == commit_lane {
                GlyphKind::Commit
            } else if lane.is_some() {
                GlyphKind::Vertical
            } else {
                GlyphKind::Blank
            };
            row.push(Glyph { kind, lane: i });
        }

        match parents.split_first() {
            Some((first, rest)) => {
                self.lanes[commit_lane] = Some(first.clone());
                for extra in rest {
                    if self.lanes.iter().any(|l| l.as_deref() == Some(extra.as_str())) {
                        continue;
                    }
                    if let Some(slot) = self.lanes.iter().position(|l| l.is_none()) {
                        self.lanes[slot] = Some(extra.clone());
                    } else {
                        self.lanes.push(Some(extra.clone()));
                        row.push(Glyph { kind: GlyphKind::ForkRight, lane: self.lanes.len() - 1 });
                    }
                }
            }
            None => self.lanes[commit_lane] = None,
        }
        row
    }
}

impl Default for GraphRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph-to-character mapping for one of the three rendering modes.
pub fn glyph_char(kind: GlyphKind, mode: LineGraphics) -> char {
    match (kind, mode) {
        (GlyphKind::Blank, _) => ' ',
        (GlyphKind::Commit, _) => '*',
        (GlyphKind::Vertical, LineGraphics::Ascii) => '|',
        (GlyphKind::Vertical, LineGraphics::Utf8) => '\u{2502}',
        (GlyphKind::Vertical, LineGraphics::Default) => '|',
        (GlyphKind::MergeRight, LineGraphics::Utf8) => '\u{251c}',
        (GlyphKind::MergeRight, _) => '+',
        (GlyphKind::ForkRight, LineGraphics::Utf8) => '\u{2570}',
        (GlyphKind::ForkRight, _) => '\\',
        (GlyphKind::Horizontal, LineGraphics::Utf8) => '\u{2500}',
        (GlyphKind::Horizontal, _) => '-',
    }
}

/// Render a row to a fixed-width string (one char per lane, space-padded).
pub fn render_row_text(row: &GraphRow, mode: LineGraphics) -> String {
    row.iter().map(|g| glyph_char(g.kind, mode)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_parent_chain_reuses_the_same_lane() {
        let mut graph = GraphRenderer::new();
        let r1 = graph.render("a", &["b".to_string()]);
        let r2 = graph.render("b", &[]);
        assert_eq!(r1.len(), 1);
        assert_eq!(r1[0].kind, GlyphKind::Commit);
        assert_eq!(r2[0].kind, GlyphKind::Commit);
    }

    #[test]
    fn merge_commit_opens_a_second_lane() {
        let mut graph = GraphRenderer::new();
        graph.render("a", &["b".to_string(), "c".to_string()]);
        let row_b = graph.render("b", &[]);
        assert!(row_b.iter().any(|g| g.kind == GlyphKind::Commit));
        let row_c = graph.render("c", &[]);
        assert!(row_c.iter().any(|g| g.kind == GlyphKind::Commit));
    }

    #[test]
    fn render_row_text_uses_requested_mode() {
        let mut graph = GraphRenderer::new();
        let row = graph.render("a", &[]);
        assert_eq!(render_row_text(&row, LineGraphics::Ascii), "*");
    }
}
