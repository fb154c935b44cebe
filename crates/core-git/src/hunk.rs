//! Diff hunk header parsing and enclosing-hunk lookup, shared by the diff
//! view's "trace origin" (§4.F) and the stage engine's single-line patch
//! construction (§4.K).

use core_options::LineType;
use core_view::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkHeader {
    pub old_start: u64,
    pub old_count: u64,
    pub new_start: u64,
    pub new_count: u64,
}

/// Parse `@@ -a[,b] +c[,d] @@...`. A missing count defaults to `1`, matching
/// unified-diff convention.
pub fn parse_header(raw: &str) -> Option<HunkHeader> {
    let body = raw.strip_prefix("@@ ")?;
    let mut parts = body.splitn(3, ' ');
    let old = parts.next()?.strip_prefix('-')?;
    let new = parts.next()?.strip_prefix('+')?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some(HunkHeader { old_start, old_count, new_start, new_count })
}

fn parse_range(s: &str) -> Option<(u64, u64)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}

/// Walk backward from `line_index` to find the enclosing `@@` hunk header
/// and, further back, its parent `diff --git` header. Returns
/// `(diff_header_index, hunk_header_index)`.
pub fn find_enclosing(lines: &[Line], line_index: usize) -> Option<(usize, usize)> {
    let hunk_index = (0..=line_index).rev().find(|&i| lines[i].line_type == LineType::DiffChunk)?;
    let diff_index = (0..hunk_index).rev().find(|&i| lines[i].line_type == LineType::DiffHeader)?;
    Some((diff_index, hunk_index))
}

/// Recompute the post-image line number of `target_index` by counting
/// context (" ") and added ("+") lines from the hunk header down to (and
/// including) the target, per §4.K's single-line hunk reconstruction.
/// Returns `None` if `target_index` is a deleted line (no post-image row).
pub fn post_image_lineno(lines: &[Line], hunk_index: usize, target_index: usize) -> Option<u64> {
    let header = parse_header(&lines[hunk_index].data)?;
    if lines[target_index].data.starts_with('-') {
        return None;
    }
    let mut lineno = header.new_start;
    for idx in hunk_index + 1..=target_index {
        let text = lines[idx].data.as_str();
        if text.starts_with('-') {
            continue;
        }
        if idx == target_index {
            return Some(lineno);
        }
        lineno += 1;
    }
    None
}

/// Pre-image line number (for the delete side of "trace origin", §4.F).
pub fn pre_image_lineno(lines: &[Line], hunk_index: usize, target_index: usize) -> Option<u64> {
    let header = parse_header(&lines[hunk_index].data)?;
    if lines[target_index].data.starts_with('+') {
        return None;
    }
    let mut lineno = header.old_start;
    for idx in hunk_index + 1..=target_index {
        let text = lines[idx].data.as_str();
        if text.starts_with('+') {
            continue;
        }
        if idx == target_index {
            return Some(lineno);
        }
        lineno += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_hunk_header() {
        let h = parse_header("@@ -10,3 +10,5 @@ fn foo() {").unwrap();
        assert_eq!(h, HunkHeader { old_start: 10, old_count: 3, new_start: 10, new_count: 5 });
    }

    #[test]
    fn parses_header_with_implicit_single_line_counts() {
        let h = parse_header("@@ -7 +7 @@").unwrap();
        assert_eq!(h, HunkHeader { old_start: 7, old_count: 1, new_start: 7, new_count: 1 });
    }

    #[test]
    fn computes_post_image_lineno_for_added_row() {
        let lines = vec![
            Line::new(LineType::DiffChunk, 0, "@@ -10,0 +10,2 @@"),
            Line::new(LineType::DiffAdd, 0, "+first"),
            Line::new(LineType::DiffAdd, 0, "+second"),
        ];
        assert_eq!(post_image_lineno(&lines, 0, 2), Some(11));
    }
}
