//! Line-type classification and the color/attribute table attached to each
//! type (component C: static enumeration of line kinds plus user overrides
//! registered through `color` statements).

use std::fmt;

/// Named line categories. Classification walks a priority-ordered list of
/// prefix matchers and returns the first hit, defaulting to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    Default,
    DiffHeader,
    DiffIndex,
    DiffChunk,
    DiffAdd,
    DiffDel,
    DiffAddHighlight,
    DiffDelHighlight,
    Commit,
    CommitTitle,
    Author,
    Date,
    StatHead,
    StatStaged,
    StatUnstaged,
    StatUntracked,
    TreeDir,
    TreeFile,
    MainRefs,
    MainHead,
    MainTag,
    Title,
    StatusBox,
    PaletteRepeat,
    /// A user-defined category from `color "prefix" fg bg attr`.
    Custom(u32),
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Default,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Indexed(u8),
}

impl Color {
    pub fn parse(token: &str) -> Option<Color> {
        let lower = token.to_ascii_lowercase();
        Some(match lower.as_str() {
            "default" => Color::Default,
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            _ => {
                let digits = lower.strip_prefix("color").unwrap_or(lower.as_str());
                let n: u16 = digits.parse().ok()?;
                if n > 255 {
                    return None;
                }
                Color::Indexed(n as u8)
            }
        })
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attr: u16 {
        const NORMAL    = 0;
        const BOLD      = 1 << 0;
        const DIM       = 1 << 1;
        const UNDERLINE = 1 << 2;
        const REVERSE   = 1 << 3;
        const STANDOUT  = 1 << 4;
        const BLINK     = 1 << 5;
        const PROTECT   = 1 << 6;
        const ITALIC    = 1 << 7;
    }
}

impl Attr {
    pub fn parse(token: &str) -> Option<Attr> {
        Some(match token.to_ascii_lowercase().as_str() {
            "normal" => Attr::NORMAL,
            "bold" => Attr::BOLD,
            "dim" => Attr::DIM,
            "underline" => Attr::UNDERLINE,
            "reverse" => Attr::REVERSE,
            "standout" => Attr::STANDOUT,
            "blink" => Attr::BLINK,
            "protect" => Attr::PROTECT,
            "italic" => Attr::ITALIC,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineInfo {
    pub fg: Color,
    pub bg: Color,
    pub attr: Attr,
}

impl Default for LineInfo {
    fn default() -> Self {
        LineInfo {
            fg: Color::Default,
            bg: Color::Default,
            attr: Attr::NORMAL,
        }
    }
}

struct CustomEntry {
    prefix: String,
    id: u32,
}

/// Built-in prefix matchers in priority order. First match wins.
const BUILTIN_PREFIXES: &[(&str, LineType)] = &[
    ("diff --git", LineType::DiffHeader),
    ("index ", LineType::DiffIndex),
    ("@@", LineType::DiffChunk),
    ("+++", LineType::DiffHeader),
    ("---", LineType::DiffHeader),
    ("+", LineType::DiffAdd),
    ("-", LineType::DiffDel),
    ("commit ", LineType::Commit),
    ("Author:", LineType::Author),
    ("Date:", LineType::Date),
    (" ", LineType::StatHead),
];

/// Owns the classification table plus the color/attribute mapping for every
/// [`LineType`]. Custom `color "prefix" ...` entries are prepended ahead of
/// the built-ins so user overrides always win.
pub struct LineInfoTable {
    custom: Vec<CustomEntry>,
    next_custom_id: u32,
    colors: std::collections::HashMap<LineType, LineInfo>,
    custom_names: std::collections::HashMap<u32, String>,
}

impl Default for LineInfoTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LineInfoTable {
    pub fn new() -> Self {
        LineInfoTable {
            custom: Vec::new(),
            next_custom_id: 0,
            colors: std::collections::HashMap::new(),
            custom_names: std::collections::HashMap::new(),
        }
    }

    /// Register a custom prefix category (from a quoted `color` target),
    /// returning its [`LineType::Custom`] id. Re-registering the same prefix
    /// reuses the existing id.
    pub fn define_custom(&mut self, prefix: &str) -> LineType {
        if let Some(existing) = self.custom.iter().find(|e| e.prefix == prefix) {
            return LineType::Custom(existing.id);
        }
        let id = self.next_custom_id;
        self.next_custom_id += 1;
        self.custom.push(CustomEntry {
            prefix: prefix.to_string(),
            id,
        });
        self.custom_names.insert(id, prefix.to_string());
        LineType::Custom(id)
    }

    pub fn set_color(&mut self, line_type: LineType, info: LineInfo) {
        self.colors.insert(line_type, info);
    }

    pub fn color_of(&self, line_type: LineType) -> LineInfo {
        self.colors.get(&line_type).copied().unwrap_or_default()
    }

    /// Classify a raw text line, preferring custom prefixes (in registration
    /// order, longest match semantics handled by the caller picking a single
    /// best prefix) over the built-in table.
    pub fn classify(&self, line: &str) -> LineType {
        for entry in self.custom.iter().rev() {
            if line.starts_with(entry.prefix.as_str()) {
                return LineType::Custom(entry.id);
            }
        }
        for (prefix, ty) in BUILTIN_PREFIXES {
            if line.starts_with(prefix) {
                return *ty;
            }
        }
        LineType::Default
    }

    pub fn resolve_named(&self, name: &str) -> Option<LineType> {
        let lower = name.to_ascii_lowercase();
        Some(match lower.as_str() {
            "default" => LineType::Default,
            "diff-header" => LineType::DiffHeader,
            "diff-index" => LineType::DiffIndex,
            "diff-chunk" => LineType::DiffChunk,
            "diff-add" => LineType::DiffAdd,
            "diff-del" => LineType::DiffDel,
            "diff-add-highlight" => LineType::DiffAddHighlight,
            "diff-del-highlight" => LineType::DiffDelHighlight,
            "commit" => LineType::Commit,
            "commit-title" => LineType::CommitTitle,
            "author" => LineType::Author,
            "date" => LineType::Date,
            "stat-head" => LineType::StatHead,
            "stat-staged" => LineType::StatStaged,
            "stat-unstaged" => LineType::StatUnstaged,
            "stat-untracked" => LineType::StatUntracked,
            "tree-dir" => LineType::TreeDir,
            "tree-file" => LineType::TreeFile,
            "main-refs" => LineType::MainRefs,
            "main-head" => LineType::MainHead,
            "main-tag" => LineType::MainTag,
            "title" => LineType::Title,
            "status" => LineType::StatusBox,
            "palette-repeat" => LineType::PaletteRepeat,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_builtin_prefixes() {
        let table = LineInfoTable::new();
        assert_eq!(table.classify("commit deadbeef"), LineType::Commit);
        assert_eq!(table.classify("@@ -1,2 +1,2 @@"), LineType::DiffChunk);
        assert_eq!(table.classify("some other text"), LineType::Default);
    }

    #[test]
    fn custom_entries_shadow_builtins() {
        let mut table = LineInfoTable::new();
        let custom = table.define_custom("commit ");
        assert_eq!(table.classify("commit deadbeef"), custom);
    }

    #[test]
    fn redefining_same_prefix_reuses_id() {
        let mut table = LineInfoTable::new();
        let a = table.define_custom("foo");
        let b = table.define_custom("foo");
        assert_eq!(a, b);
    }

    #[test]
    fn color_round_trips() {
        let mut table = LineInfoTable::new();
        let info = LineInfo {
            fg: Color::Green,
            bg: Color::Default,
            attr: Attr::BOLD,
        };
        table.set_color(LineType::DiffAdd, info);
        assert_eq!(table.color_of(LineType::DiffAdd), info);
        assert_eq!(table.color_of(LineType::DiffDel), LineInfo::default());
    }

    #[test]
    fn parses_indexed_colors() {
        assert_eq!(Color::parse("color200"), Some(Color::Indexed(200)));
        assert_eq!(Color::parse("200"), Some(Color::Indexed(200)));
        assert_eq!(Color::parse("color300"), None);
    }
}
