//! The option store: typed fields, the `set`/`color`/`bind`/`source` command
//! language, and the dispatch table tying option names to parsers.

use crate::error::OptionError;
use crate::line_info::{Attr, Color, LineInfo, LineInfoTable};
use crate::step::{Step, parse_step};
use crate::tokenizer::tokenize;
use core_keymap::{KeySpec, KeymapRegistry, Request, RunRequest, RunRequestFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowDate {
    No,
    Default,
    Local,
    Relative,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowAuthor {
    No,
    Full,
    Abbreviated,
    Email,
    EmailUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFilename {
    No,
    Always,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFileSize {
    No,
    Default,
    Units,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreSpace {
    No,
    All,
    Some,
    AtEol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOrder {
    Default,
    Topo,
    Date,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGraphics {
    Ascii,
    Default,
    Utf8,
}

/// One statement's worth of data needed to apply it: the effective value is
/// computed and stored directly on [`Options`]; this enum exists only to let
/// `set_option` dispatch generically by kind.
enum Kind {
    Int { min: i64, max: i64 },
    Step,
    Bool,
    Enum(&'static [(&'static str, u32)]),
    BoolInt { min: i64, max: i64, default_true: i64 },
    Str,
    Argv,
}

pub struct Options {
    pub line_graphics: LineGraphics,
    pub show_date: ShowDate,
    pub show_author: ShowAuthor,
    pub show_filename: ShowFilename,
    pub show_file_size: ShowFileSize,
    pub show_rev_graph: bool,
    pub show_line_numbers: bool,
    pub show_refs: bool,
    pub show_changes: bool,
    pub show_notes: bool,
    pub notes_arg: Vec<String>,
    pub status_untracked_dirs: bool,
    pub read_git_colors: bool,
    pub wrap_lines: bool,
    pub ignore_case: bool,
    pub focus_child: bool,
    pub diff_context: i64,
    pub ignore_space: IgnoreSpace,
    pub commit_order: CommitOrder,
    pub line_number_interval: i64,
    pub horizontal_scroll: Step,
    pub split_view_height: Step,
    pub scale_vsplit_view: Step,
    pub vertical_split: bool,
    pub tab_size: i64,
    pub author_width: i64,
    pub filename_width: i64,
    pub editor: String,
    pub editor_line_number: bool,
    pub blame_options: Vec<String>,
    pub diff_options: Vec<String>,
    pub show_id: bool,
    pub id_width: i64,
    pub file_filter: bool,
    pub show_title_overflow: bool,
    pub title_overflow: i64,

    pub lines: LineInfoTable,
    pub keymaps: KeymapRegistry,
}

impl Default for Options {
    fn default() -> Self {
        let mut keymaps = KeymapRegistry::new();
        core_keymap::install_defaults(&mut keymaps);
        Options {
            line_graphics: LineGraphics::Default,
            show_date: ShowDate::Default,
            show_author: ShowAuthor::Full,
            show_filename: ShowFilename::Auto,
            show_file_size: ShowFileSize::Default,
            show_rev_graph: true,
            show_line_numbers: false,
            show_refs: true,
            show_changes: true,
            show_notes: true,
            notes_arg: Vec::new(),
            status_untracked_dirs: true,
            read_git_colors: true,
            wrap_lines: false,
            ignore_case: false,
            focus_child: true,
            diff_context: 3,
            ignore_space: IgnoreSpace::No,
            commit_order: CommitOrder::Default,
            line_number_interval: 5,
            horizontal_scroll: Step::fraction(0.50),
            split_view_height: Step::fraction(2.0 / 3.0),
            scale_vsplit_view: Step::fraction(0.5),
            vertical_split: false,
            tab_size: 8,
            author_width: 0,
            filename_width: 0,
            editor: String::new(),
            editor_line_number: true,
            blame_options: Vec::new(),
            diff_options: Vec::new(),
            show_id: false,
            id_width: 7,
            file_filter: true,
            show_title_overflow: false,
            title_overflow: 50,

            lines: LineInfoTable::new(),
            keymaps,
        }
    }
}

const ENUM_SHOW_DATE: &[(&str, u32)] = &[("no", 0), ("default", 1), ("local", 2), ("relative", 3), ("short", 4)];
const ENUM_SHOW_AUTHOR: &[(&str, u32)] =
    &[("no", 0), ("full", 1), ("abbreviated", 2), ("email", 3), ("email-user", 4)];
const ENUM_SHOW_FILENAME: &[(&str, u32)] = &[("no", 0), ("always", 1), ("auto", 2)];
const ENUM_SHOW_FILE_SIZE: &[(&str, u32)] = &[("no", 0), ("default", 1), ("units", 2)];
const ENUM_IGNORE_SPACE: &[(&str, u32)] = &[("no", 0), ("all", 1), ("some", 2), ("at-eol", 3)];
const ENUM_COMMIT_ORDER: &[(&str, u32)] = &[("default", 0), ("topo", 1), ("date", 2), ("reverse", 3)];
const ENUM_LINE_GRAPHICS: &[(&str, u32)] = &[("ascii", 0), ("default", 1), ("utf-8", 2)];

fn kind_for(name: &str) -> Option<Kind> {
    Some(match name {
        "line-graphics" => Kind::Enum(ENUM_LINE_GRAPHICS),
        "show-date" => Kind::Enum(ENUM_SHOW_DATE),
        "show-author" => Kind::Enum(ENUM_SHOW_AUTHOR),
        "show-filename" => Kind::Enum(ENUM_SHOW_FILENAME),
        "show-file-size" => Kind::Enum(ENUM_SHOW_FILE_SIZE),
        "show-rev-graph" => Kind::Bool,
        "show-line-numbers" => Kind::Bool,
        "show-refs" => Kind::Bool,
        "show-changes" => Kind::Bool,
        "show-notes" => Kind::Bool,
        "status-untracked-dirs" => Kind::Bool,
        "read-git-colors" => Kind::Bool,
        "wrap-lines" => Kind::Bool,
        "ignore-case" => Kind::Bool,
        "focus-child" => Kind::Bool,
        "diff-context" => Kind::Int { min: 0, max: 999_999 },
        "ignore-space" => Kind::Enum(ENUM_IGNORE_SPACE),
        "commit-order" => Kind::Enum(ENUM_COMMIT_ORDER),
        "line-number-interval" => Kind::Int { min: 1, max: 1024 },
        "horizontal-scroll" => Kind::Step,
        "split-view-height" => Kind::Step,
        "scale-vsplit-view" => Kind::Step,
        "vertical-split" => Kind::Bool,
        "tab-size" => Kind::Int { min: 1, max: 1024 },
        "author-width" => Kind::Int { min: 0, max: 1024 },
        "filename-width" => Kind::Int { min: 0, max: 1024 },
        "editor" => Kind::Str,
        "editor-line-number" => Kind::Bool,
        "blame-options" => Kind::Argv,
        "diff-options" => Kind::Argv,
        "show-id" => Kind::Bool,
        "id-width" => Kind::Int { min: 4, max: 40 },
        "file-filter" => Kind::Bool,
        "title-overflow" => Kind::BoolInt { min: 2, max: 1024, default_true: 50 },
        _ => return None,
    })
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Word-only bool matching used by `boolint` options. A bare `1`/`0` is left
/// unmatched here (unlike the general `bool` kind) so it falls through to the
/// `int(min,max)` branch instead of colliding with the numeric form.
fn parse_bool_word(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_enum(map: &[(&str, u32)], token: &str) -> Result<u32, OptionError> {
    let lower = token.to_ascii_lowercase();
    let mut best: Option<(usize, u32)> = None;
    for (name, id) in map {
        if name.starts_with(lower.as_str()) && (best.is_none() || name.len() < best.unwrap().0) {
            best = Some((name.len(), *id));
        }
    }
    if let Some((_, id)) = best {
        return Ok(id);
    }
    match parse_bool(token) {
        Some(true) => Ok(map[1].1),
        Some(false) => Ok(map[0].1),
        None => Err(OptionError::OutOfRange),
    }
}

fn parse_int(token: &str, min: i64, max: i64) -> Result<i64, OptionError> {
    let n: i64 = token.trim().parse().map_err(|_| OptionError::OutOfRange)?;
    if n < min || n > max { Err(OptionError::OutOfRange) } else { Ok(n) }
}

impl Options {
    /// Apply one `set <name> = <value>` statement (or bare `set <name> <value>`,
    /// both accepted by the tokenizer — the `=` token is simply ignored if
    /// present).
    pub fn set_option(&mut self, name: &str, value_tokens: &[String]) -> Result<(), OptionError> {
        let kind = kind_for(name).ok_or(OptionError::UnknownVariable)?;
        let value = value_tokens.first().ok_or(OptionError::NoValueAssigned)?;

        match kind {
            Kind::Int { min, max } => {
                let n = parse_int(value, min, max)?;
                self.assign_int(name, n);
            }
            Kind::Step => {
                let step = match parse_step(value) {
                    Ok(s) => s,
                    Err((e, fallback)) => {
                        self.assign_step(name, fallback);
                        return Err(e);
                    }
                };
                self.assign_step(name, step);
            }
            Kind::Bool => {
                let b = parse_bool(value).ok_or(OptionError::OutOfRange)?;
                self.assign_bool(name, b);
            }
            Kind::Enum(map) => {
                let id = parse_enum(map, value)?;
                self.assign_enum(name, id);
            }
            Kind::BoolInt { min, max, default_true } => {
                if let Some(b) = parse_bool_word(value) {
                    self.assign_boolint(name, b, if b { default_true } else { 0 });
                } else {
                    let n = parse_int(value, min, max)?;
                    self.assign_boolint(name, true, n);
                }
            }
            Kind::Str => {
                self.assign_str(name, value.clone());
            }
            Kind::Argv => {
                self.assign_argv(name, value_tokens.to_vec());
            }
        }

        if value_tokens.len() > 1 && !matches!(kind_for(name), Some(Kind::Argv)) {
            return Err(OptionError::TooManyArgs);
        }
        Ok(())
    }

    fn assign_int(&mut self, name: &str, n: i64) {
        match name {
            "diff-context" => self.diff_context = n,
            "line-number-interval" => self.line_number_interval = n,
            "tab-size" => self.tab_size = n,
            "author-width" => self.author_width = n,
            "filename-width" => self.filename_width = n,
            "id-width" => self.id_width = n,
            _ => {}
        }
    }

    fn assign_step(&mut self, name: &str, step: Step) {
        match name {
            "horizontal-scroll" => self.horizontal_scroll = step,
            "split-view-height" => self.split_view_height = step,
            "scale-vsplit-view" => self.scale_vsplit_view = step,
            _ => {}
        }
    }

    fn assign_bool(&mut self, name: &str, b: bool) {
        match name {
            "show-rev-graph" => self.show_rev_graph = b,
            "show-line-numbers" => self.show_line_numbers = b,
            "show-refs" => self.show_refs = b,
            "show-changes" => self.show_changes = b,
            "show-notes" => self.show_notes = b,
            "status-untracked-dirs" => self.status_untracked_dirs = b,
            "read-git-colors" => self.read_git_colors = b,
            "wrap-lines" => self.wrap_lines = b,
            "ignore-case" => self.ignore_case = b,
            "focus-child" => self.focus_child = b,
            "vertical-split" => self.vertical_split = b,
            "editor-line-number" => self.editor_line_number = b,
            "show-id" => self.show_id = b,
            "file-filter" => self.file_filter = b,
            _ => {}
        }
    }

    fn assign_enum(&mut self, name: &str, id: u32) {
        match name {
            "line-graphics" => {
                self.line_graphics = match id {
                    0 => LineGraphics::Ascii,
                    2 => LineGraphics::Utf8,
                    _ => LineGraphics::Default,
                }
            }
            "show-date" => {
                self.show_date = match id {
                    0 => ShowDate::No,
                    2 => ShowDate::Local,
                    3 => ShowDate::Relative,
                    4 => ShowDate::Short,
                    _ => ShowDate::Default,
                }
            }
            "show-author" => {
                self.show_author = match id {
                    0 => ShowAuthor::No,
                    2 => ShowAuthor::Abbreviated,
                    3 => ShowAuthor::Email,
                    4 => ShowAuthor::EmailUser,
                    _ => ShowAuthor::Full,
                }
            }
            "show-filename" => {
                self.show_filename = match id {
                    0 => ShowFilename::No,
                    1 => ShowFilename::Always,
                    _ => ShowFilename::Auto,
                }
            }
            "show-file-size" => {
                self.show_file_size = match id {
                    0 => ShowFileSize::No,
                    2 => ShowFileSize::Units,
                    _ => ShowFileSize::Default,
                }
            }
            "ignore-space" => {
                self.ignore_space = match id {
                    1 => IgnoreSpace::All,
                    2 => IgnoreSpace::Some,
                    3 => IgnoreSpace::AtEol,
                    _ => IgnoreSpace::No,
                }
            }
            "commit-order" => {
                self.commit_order = match id {
                    1 => CommitOrder::Topo,
                    2 => CommitOrder::Date,
                    3 => CommitOrder::Reverse,
                    _ => CommitOrder::Default,
                }
            }
            _ => {}
        }
    }

    fn assign_boolint(&mut self, name: &str, enabled: bool, n: i64) {
        if name == "title-overflow" {
            self.show_title_overflow = enabled;
            self.title_overflow = n;
        }
    }

    fn assign_str(&mut self, name: &str, value: String) {
        if name == "editor" {
            self.editor = value;
        }
    }

    fn assign_argv(&mut self, name: &str, tokens: Vec<String>) {
        match name {
            "blame-options" => self.blame_options = tokens,
            "diff-options" => self.diff_options = tokens,
            _ => {}
        }
    }

    /// `color <target> <fg> <bg> [attr...]`. `<target>` is either a named
    /// line category or a quoted prefix defining a custom one.
    pub fn set_color(&mut self, target: &str, rest: &[String]) -> Result<(), OptionError> {
        let line_type = self
            .lines
            .resolve_named(target)
            .unwrap_or_else(|| self.lines.define_custom(target));

        let fg = rest.first().ok_or(OptionError::NoValueAssigned)?;
        let fg = Color::parse(fg).ok_or(OptionError::UnknownColorName)?;
        let bg = match rest.get(1) {
            Some(b) => Color::parse(b).ok_or(OptionError::UnknownColorName)?,
            None => Color::Default,
        };
        let mut attr = Attr::NORMAL;
        for token in rest.iter().skip(2) {
            attr |= Attr::parse(token).ok_or(OptionError::UnknownColorAttribute)?;
        }

        self.lines.set_color(line_type, LineInfo { fg, bg, attr });
        Ok(())
    }

    /// `bind <keymap>|generic <keyspec> <request...>`. The request token may
    /// carry run-request flag prefixes (`!@?<:`); anything not resolving to a
    /// built-in [`Request`] is registered as a user run-request.
    pub fn bind(&mut self, keymap: &str, keyspec: &str, request_tokens: &[String]) -> Result<(), OptionError> {
        let key = KeySpec::parse(keyspec).ok_or(OptionError::UnknownKeyMap)?;
        let joined = request_tokens.join(" ");
        let (flags, remainder) = RunRequestFlags::parse(&joined);

        if request_tokens.len() == 1 {
            if let Some(req) = Request::from_name(&request_tokens[0]) {
                self.keymaps.bind(keymap, key, req);
                return Ok(());
            }
        }

        let argv_template = tokenize(remainder).map_err(|_| OptionError::UnmatchedQuote)?;
        if argv_template.is_empty() {
            return Err(OptionError::UnknownRequest);
        }
        self.keymaps.bind_run_request(RunRequest {
            keymap: keymap.to_string(),
            key,
            argv_template,
            flags,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_tab_size_within_range() {
        let mut opts = Options::default();
        opts.set_option("tab-size", &["4".to_string()]).unwrap();
        assert_eq!(opts.tab_size, 4);
    }

    #[test]
    fn set_tab_size_out_of_range_leaves_default() {
        let mut opts = Options::default();
        let err = opts.set_option("tab-size", &["99999".to_string()]).unwrap_err();
        assert_eq!(err, OptionError::OutOfRange);
        assert_eq!(opts.tab_size, 8);
    }

    #[test]
    fn horizontal_scroll_percent() {
        let mut opts = Options::default();
        opts.set_option("horizontal-scroll", &["100%".to_string()]).unwrap();
        assert_eq!(opts.horizontal_scroll.0, 0.99);
        assert_eq!(opts.horizontal_scroll.apply(80), 80);
    }

    #[test]
    fn title_overflow_yes_sets_default_fifty() {
        let mut opts = Options::default();
        opts.set_option("title-overflow", &["yes".to_string()]).unwrap();
        assert!(opts.show_title_overflow);
        assert_eq!(opts.title_overflow, 50);
    }

    #[test]
    fn title_overflow_numeric_sets_value() {
        let mut opts = Options::default();
        opts.set_option("title-overflow", &["80".to_string()]).unwrap();
        assert!(opts.show_title_overflow);
        assert_eq!(opts.title_overflow, 80);
    }

    #[test]
    fn title_overflow_below_range_errors() {
        let mut opts = Options::default();
        let err = opts.set_option("title-overflow", &["1".to_string()]).unwrap_err();
        assert_eq!(err, OptionError::OutOfRange);
    }

    #[test]
    fn unknown_variable_errors() {
        let mut opts = Options::default();
        let err = opts.set_option("not-a-real-option", &["1".to_string()]).unwrap_err();
        assert_eq!(err, OptionError::UnknownVariable);
    }

    #[test]
    fn enum_accepts_prefix_and_bool_fallback() {
        let mut opts = Options::default();
        opts.set_option("show-date", &["rel".to_string()]).unwrap();
        assert_eq!(opts.show_date, ShowDate::Relative);

        opts.set_option("show-date", &["no".to_string()]).unwrap();
        assert_eq!(opts.show_date, ShowDate::No);
    }

    #[test]
    fn color_statement_with_named_target() {
        let mut opts = Options::default();
        opts.set_color("diff-add", &["green".to_string(), "default".to_string(), "bold".to_string()])
            .unwrap();
        let info = opts.lines.color_of(crate::line_info::LineType::DiffAdd);
        assert_eq!(info.fg, Color::Green);
        assert!(info.attr.contains(Attr::BOLD));
    }

    #[test]
    fn color_statement_with_custom_prefix() {
        let mut opts = Options::default();
        opts.set_color("my-prefix", &["yellow".to_string()]).unwrap();
        assert_eq!(opts.lines.classify("my-prefix: hi"), opts.lines.define_custom("my-prefix"));
    }

    #[test]
    fn bind_builtin_request() {
        let mut opts = Options::default();
        opts.bind("main", "g", &["view-log".to_string()]).unwrap();
        let key = KeySpec::parse("g").unwrap();
        assert_eq!(opts.keymaps.lookup("main", &key), Some(Request::ViewLog));
    }

    #[test]
    fn bind_run_request_foreground() {
        let mut opts = Options::default();
        opts.bind("main", "g", &["!git".to_string(), "gc".to_string()]).unwrap();
        let key = KeySpec::parse("g").unwrap();
        let rr = opts.keymaps.run_request("main", &key).unwrap();
        assert!(rr.flags.foreground);
        assert_eq!(rr.argv_template, vec!["git", "gc"]);
    }
}
