//! Search state: a compiled pattern plus stop-at-end iteration.
//!
//! The original implementation finds the next match by decrementing an
//! unsigned line counter and relying on wraparound to detect "ran off the
//! start"; we get the identical observable behavior (search stops at the
//! boundary, it does not wrap) by using checked arithmetic instead.

use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

pub struct SearchState {
    pattern: Regex,
    pub text: String,
    pub last_direction: Direction,
}

impl SearchState {
    pub fn compile(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let compiled = RegexBuilder::new(pattern).case_insensitive(ignore_case).build()?;
        Ok(SearchState { pattern: compiled, text: pattern.to_string(), last_direction: Direction::Forward })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Find the next matching row starting from `from` (exclusive) in
    /// `direction` through `grep`, a per-view predicate over row index.
    /// Returns `None` once the search reaches the corresponding boundary
    /// without a match, rather than wrapping to the opposite end.
    pub fn find_next(&self, from: usize, total: usize, direction: Direction, grep: impl Fn(usize) -> bool) -> Option<usize> {
        if total == 0 {
            return None;
        }
        let mut cursor = from;
        loop {
            cursor = match direction {
                Direction::Forward => cursor.checked_add(1)?,
                Direction::Backward => cursor.checked_sub(1)?,
            };
            if cursor >= total {
                return None;
            }
            if grep(cursor) {
                return Some(cursor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<&'static str> {
        vec!["alpha", "beta", "gamma beta", "delta"]
    }

    #[test]
    fn find_next_forward_matches_and_stops_at_end() {
        let s = SearchState::compile("beta", false).unwrap();
        let rows = rows();
        let grep = |i: usize| s.is_match(rows[i]);
        assert_eq!(s.find_next(0, rows.len(), Direction::Forward, grep), Some(1));
        assert_eq!(s.find_next(1, rows.len(), Direction::Forward, grep), Some(2));
        assert_eq!(s.find_next(2, rows.len(), Direction::Forward, grep), None);
    }

    #[test]
    fn find_next_backward_stops_at_start_without_wrapping() {
        let s = SearchState::compile("beta", false).unwrap();
        let rows = rows();
        let grep = |i: usize| s.is_match(rows[i]);
        assert_eq!(s.find_next(2, rows.len(), Direction::Backward, grep), Some(1));
        assert_eq!(s.find_next(1, rows.len(), Direction::Backward, grep), None);
    }

    #[test]
    fn case_insensitive_search_honors_ignore_case_option() {
        let s = SearchState::compile("GAMMA", true).unwrap();
        assert!(s.is_match("gamma beta"));
        let s = SearchState::compile("GAMMA", false).unwrap();
        assert!(!s.is_match("gamma beta"));
    }
}
