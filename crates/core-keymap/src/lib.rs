//! Request enum, keyspecs, and the keymap / run-request registry (component B).
//!
//! A [`Request`] is a symbolic user action dispatched by the view engine
//! (`core-view`). A [`Keymap`] binds [`KeySpec`]s to requests for one named
//! scope (`"main"`, `"diff"`, `"status"`, ...); lookups that miss fall back to
//! the `generic` keymap. User-defined *run requests* (external shell
//! invocations bound to a key) share the same keyspec space and are checked
//! before the static request tables so user config always wins.

use core_events::{KeyToken, ModMask, NamedKey};
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Name of the keymap consulted when a view-specific map has no binding.
pub const GENERIC_KEYMAP: &str = "generic";

/// Symbolic actions the view engine and per-view handlers understand.
///
/// Disjoint from raw terminal key codes: requests are looked up *through* a
/// keymap, never compared directly against a [`KeySpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    // Navigation
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveFirstLine,
    MoveLastLine,
    Next,
    Previous,
    // Scrolling
    ScrollLineUp,
    ScrollLineDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollFirstCol,
    ScrollLeft,
    ScrollRight,
    // Splitting / focus
    OpenSplit,
    OpenDefault,
    Maximize,
    ViewClose,
    ViewNext,
    // View switches
    ViewMain,
    ViewDiff,
    ViewLog,
    ViewStatus,
    ViewStage,
    ViewTree,
    ViewBlob,
    ViewBlame,
    ViewBranch,
    ViewStash,
    ViewPager,
    ViewHelp,
    // Searching
    Search,
    SearchBack,
    FindNext,
    FindPrev,
    // Options / toggles
    Options,
    ToggleLineNumbers,
    ToggleDate,
    ToggleAuthor,
    ToggleRevGraph,
    ToggleRefs,
    ToggleChanges,
    ToggleSortField,
    ToggleSortOrder,
    ToggleFileFilter,
    ToggleIgnoreSpace,
    ToggleCommitOrder,
    // Reloading / control
    Refresh,
    Reload,
    StopLoading,
    ScreenRedraw,
    // Status / stage engine
    StageUpdate,
    StageUpdateLine,
    StatusRevert,
    StageNextHunk,
    StatusMergeRecord,
    // Blame / diff extras
    Parent,
    TraceOrigin,
    // Prompt / editing
    Enter,
    Edit,
    Prompt,
    PromptCommand,
    JumpLine,
    JumpCommit,
    Back,
    Quit,
    None,
}

impl Request {
    /// Case-insensitive lookup used by `bind` statements and `:` commands.
    pub fn from_name(name: &str) -> Option<Request> {
        let lower = name.to_ascii_lowercase();
        Some(match lower.as_str() {
            "move-up" | "line-up" => Request::MoveUp,
            "move-down" | "line-down" => Request::MoveDown,
            "move-page-up" => Request::MovePageUp,
            "move-page-down" => Request::MovePageDown,
            "move-first-line" => Request::MoveFirstLine,
            "move-last-line" => Request::MoveLastLine,
            "next" => Request::Next,
            "previous" => Request::Previous,
            "scroll-line-up" => Request::ScrollLineUp,
            "scroll-line-down" => Request::ScrollLineDown,
            "scroll-page-up" => Request::ScrollPageUp,
            "scroll-page-down" => Request::ScrollPageDown,
            "scroll-first-col" => Request::ScrollFirstCol,
            "scroll-left" => Request::ScrollLeft,
            "scroll-right" => Request::ScrollRight,
            "view-split" | "split" => Request::OpenSplit,
            "view-default" | "maximize" => Request::OpenDefault,
            "max-view" => Request::Maximize,
            "view-close" => Request::ViewClose,
            "view-next" => Request::ViewNext,
            "view-main" => Request::ViewMain,
            "view-diff" => Request::ViewDiff,
            "view-log" => Request::ViewLog,
            "view-status" => Request::ViewStatus,
            "view-stage" => Request::ViewStage,
            "view-tree" => Request::ViewTree,
            "view-blob" => Request::ViewBlob,
            "view-blame" => Request::ViewBlame,
            "view-branch" => Request::ViewBranch,
            "view-stash" => Request::ViewStash,
            "view-pager" => Request::ViewPager,
            "view-help" => Request::ViewHelp,
            "search" => Request::Search,
            "search-back" => Request::SearchBack,
            "find-next" => Request::FindNext,
            "find-prev" => Request::FindPrev,
            "options" => Request::Options,
            "toggle-line-numbers" => Request::ToggleLineNumbers,
            "toggle-date" => Request::ToggleDate,
            "toggle-author" => Request::ToggleAuthor,
            "toggle-rev-graph" => Request::ToggleRevGraph,
            "toggle-refs" => Request::ToggleRefs,
            "toggle-changes" => Request::ToggleChanges,
            "toggle-sort-field" => Request::ToggleSortField,
            "toggle-sort-order" => Request::ToggleSortOrder,
            "toggle-file-filter" => Request::ToggleFileFilter,
            "toggle-ignore-space" => Request::ToggleIgnoreSpace,
            "toggle-commit-order" => Request::ToggleCommitOrder,
            "refresh" => Request::Refresh,
            "reload" => Request::Reload,
            "stop-loading" => Request::StopLoading,
            "screen-redraw" => Request::ScreenRedraw,
            "stage-update" => Request::StageUpdate,
            "stage-update-line" => Request::StageUpdateLine,
            "status-revert" => Request::StatusRevert,
            "stage-next" => Request::StageNextHunk,
            "status-merge" => Request::StatusMergeRecord,
            "parent" => Request::Parent,
            "trace-origin" => Request::TraceOrigin,
            "enter" => Request::Enter,
            "edit" => Request::Edit,
            "prompt" => Request::Prompt,
            "jump-line" => Request::JumpLine,
            "jump-commit" => Request::JumpCommit,
            "back" => Request::Back,
            "quit" => Request::Quit,
            "none" => Request::None,
            _ => return None,
        })
    }
}

/// A parsed keyspec: either a literal key token, or a token plus modifier
/// chord built by composing `<Ctrl-X>` / `<Esc-X>` / named keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub token: KeyToken,
    pub mods: ModMask,
}

impl KeySpec {
    pub fn plain(c: char) -> Self {
        Self {
            token: KeyToken::Char(c),
            mods: ModMask::empty(),
        }
    }

    pub fn named(key: NamedKey) -> Self {
        Self {
            token: KeyToken::Named(key),
            mods: ModMask::empty(),
        }
    }

    /// Parse a keyspec token as it appears in `bind` statements: a literal
    /// printable character, or one of `<Ctrl-X>`, `<Esc-X>`, `<Space>`,
    /// `<Tab>`, `<Enter>`, `<F1>`..`<F12>`. `<Esc-X>` composes by flagging the
    /// ALT modifier bit (conventionally "adding 0x80" in byte-oriented
    /// terminals); represented here as `ModMask::ALT` over the base token.
    pub fn parse(spec: &str) -> Option<KeySpec> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }
        if !spec.starts_with('<') {
            let mut chars = spec.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            return Some(KeySpec::plain(c));
        }
        let inner = spec.strip_prefix('<')?.strip_suffix('>')?;
        let inner_lower = inner.to_ascii_lowercase();
        if let Some(rest) = inner_lower.strip_prefix("ctrl-") {
            let c = rest.chars().next()?;
            return Some(KeySpec {
                token: KeyToken::Char(c),
                mods: ModMask::CTRL,
            });
        }
        if let Some(rest) = inner_lower.strip_prefix("esc-") {
            let base = KeySpec::parse(&format!("<{rest}>"))
                .unwrap_or(KeySpec::plain(rest.chars().next().unwrap_or('\0')));
            return Some(KeySpec {
                token: base.token,
                mods: base.mods | ModMask::ALT,
            });
        }
        let named = match inner_lower.as_str() {
            "space" => Some(KeyToken::Char(' ')),
            "tab" => Some(KeyToken::Named(NamedKey::Tab)),
            "enter" | "return" => Some(KeyToken::Named(NamedKey::Enter)),
            "esc" | "escape" => Some(KeyToken::Named(NamedKey::Esc)),
            "backspace" => Some(KeyToken::Named(NamedKey::Backspace)),
            "up" => Some(KeyToken::Named(NamedKey::Up)),
            "down" => Some(KeyToken::Named(NamedKey::Down)),
            "left" => Some(KeyToken::Named(NamedKey::Left)),
            "right" => Some(KeyToken::Named(NamedKey::Right)),
            "home" => Some(KeyToken::Named(NamedKey::Home)),
            "end" => Some(KeyToken::Named(NamedKey::End)),
            "pageup" | "page-up" => Some(KeyToken::Named(NamedKey::PageUp)),
            "pagedown" | "page-down" => Some(KeyToken::Named(NamedKey::PageDown)),
            "insert" => Some(KeyToken::Named(NamedKey::Insert)),
            "delete" => Some(KeyToken::Named(NamedKey::Delete)),
            _ if inner_lower.starts_with('f') => {
                let n: u8 = inner_lower[1..].parse().ok()?;
                if (1..=12).contains(&n) {
                    Some(KeyToken::Named(NamedKey::F(n)))
                } else {
                    None
                }
            }
            _ => None,
        }?;
        Some(KeySpec {
            token: named,
            mods: ModMask::empty(),
        })
    }
}

/// Flags controlling how a user-defined run request executes (§4.B).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunRequestFlags {
    /// `!` (default when no prefix given): run in the foreground with tty handoff.
    pub foreground: bool,
    /// `@`: run silently in the background.
    pub background: bool,
    /// `?`: confirm with a yes/no prompt showing the command first.
    pub confirm: bool,
    /// `<`: exit tig after the command returns.
    pub exit: bool,
    /// `:`: treat the remainder as a prompt command instead of a shell argv.
    pub internal: bool,
    /// Binding should not be overwritten by a later duplicate `bind`.
    pub force: bool,
}

impl RunRequestFlags {
    /// Parse the leading flag-character run (if any) off a run-request token,
    /// returning the flags and the remaining command text.
    pub fn parse(token: &str) -> (RunRequestFlags, &str) {
        let mut flags = RunRequestFlags::default();
        let mut rest = token;
        loop {
            let mut chars = rest.chars();
            match chars.next() {
                Some('!') => {
                    flags.foreground = true;
                    rest = chars.as_str();
                }
                Some('@') => {
                    flags.background = true;
                    rest = chars.as_str();
                }
                Some('?') => {
                    flags.confirm = true;
                    rest = chars.as_str();
                }
                Some('<') => {
                    flags.exit = true;
                    rest = chars.as_str();
                }
                Some(':') => {
                    flags.internal = true;
                    rest = chars.as_str();
                }
                _ => break,
            }
        }
        if !flags.background && !flags.confirm && !flags.exit && !flags.internal {
            flags.foreground = true;
        }
        (flags, rest.trim())
    }
}

/// A user-defined run request: an external command (or prompt command, when
/// `flags.internal`) bound to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub keymap: String,
    pub key: KeySpec,
    pub argv_template: Vec<String>,
    pub flags: RunRequestFlags,
}

/// One named scope of keyspec -> request bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    pub name: String,
    bindings: HashMap<KeySpec, Request>,
}

impl Keymap {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bindings: HashMap::new(),
        }
    }

    pub fn bind(&mut self, key: KeySpec, req: Request) {
        self.bindings.insert(key, req);
    }

    pub fn lookup(&self, key: &KeySpec) -> Option<Request> {
        self.bindings.get(key).copied()
    }

    /// Every binding in this keymap, for the help view's keybinding dump.
    pub fn bindings(&self) -> impl Iterator<Item = (&KeySpec, &Request)> {
        self.bindings.iter()
    }
}

/// Process-wide keymap + run-request registry (component B).
///
/// Lookup order for a keypress in view `kind`: run requests bound in
/// `kind`'s keymap, run requests bound in `generic`, `kind`'s static
/// bindings, then `generic`'s static bindings.
#[derive(Debug, Default)]
pub struct KeymapRegistry {
    maps: HashMap<String, Keymap>,
    run_requests: HashMap<(String, KeySpec), RunRequest>,
}

impl KeymapRegistry {
    pub fn new() -> Self {
        Self {
            maps: HashMap::new(),
            run_requests: HashMap::new(),
        }
    }

    pub fn keymap_mut(&mut self, name: &str) -> &mut Keymap {
        self.maps
            .entry(name.to_string())
            .or_insert_with(|| Keymap::new(name))
    }

    pub fn bind(&mut self, keymap: &str, key: KeySpec, req: Request) {
        trace!(target: "keymap", keymap, ?key, ?req, "bind");
        self.keymap_mut(keymap).bind(key, req);
    }

    /// Register a run request, honoring `force` against accidental
    /// duplicate-binding overwrite by later non-forced `bind`s.
    pub fn bind_run_request(&mut self, rr: RunRequest) {
        let slot = (rr.keymap.clone(), rr.key.clone());
        if let Some(existing) = self.run_requests.get(&slot) {
            if existing.flags.force && !rr.flags.force {
                debug!(target: "keymap", keymap = %rr.keymap, "run request binding protected by force flag, ignoring overwrite");
                return;
            }
        }
        self.run_requests.insert(slot, rr);
    }

    pub fn run_request(&self, keymap: &str, key: &KeySpec) -> Option<&RunRequest> {
        self.run_requests
            .get(&(keymap.to_string(), key.clone()))
            .or_else(|| self.run_requests.get(&(GENERIC_KEYMAP.to_string(), key.clone())))
    }

    /// Resolve a keypress for view keymap `kind`, falling back to `generic`.
    pub fn lookup(&self, kind: &str, key: &KeySpec) -> Option<Request> {
        if let Some(map) = self.maps.get(kind) {
            if let Some(r) = map.lookup(key) {
                return Some(r);
            }
        }
        if kind != GENERIC_KEYMAP {
            if let Some(map) = self.maps.get(GENERIC_KEYMAP) {
                if let Some(r) = map.lookup(key) {
                    return Some(r);
                }
            }
        }
        None
    }

    /// All keymap names with at least one binding (used by the help view).
    pub fn keymap_names(&self) -> SmallVec<[&str; 16]> {
        self.maps.keys().map(String::as_str).collect()
    }

    /// Look up a named keymap, for the help view's keybinding dump.
    pub fn keymap(&self, name: &str) -> Option<&Keymap> {
        self.maps.get(name)
    }
}

/// Register tig's built-in bindings. Callers install these before loading
/// any rc file, so a later `bind` statement for the same keyspec simply
/// overwrites the default (`Keymap::bind` is last-write-wins).
pub fn install_defaults(reg: &mut KeymapRegistry) {
    use Request::*;
    let generic: &[(&str, Request)] = &[
        ("j", MoveDown),
        ("<Down>", MoveDown),
        ("k", MoveUp),
        ("<Up>", MoveUp),
        ("<PageDown>", MovePageDown),
        ("<Ctrl-f>", MovePageDown),
        ("<PageUp>", MovePageUp),
        ("<Ctrl-b>", MovePageUp),
        ("g", MoveFirstLine),
        ("G", MoveLastLine),
        ("<Tab>", ViewNext),
        ("<Enter>", Enter),
        ("n", FindNext),
        ("N", FindPrev),
        ("/", Search),
        ("?", SearchBack),
        ("q", Back),
        ("Q", Quit),
        ("<Ctrl-l>", ScreenRedraw),
        ("o", Options),
        ("e", Edit),
        (":", Prompt),
        ("h", ViewHelp),
        ("<Ctrl-c>", StopLoading),
        ("<Ctrl-g>", ViewStatus),
        ("<Ctrl-v>", OpenSplit),
        ("<Ctrl-w>", ViewNext),
    ];
    for (spec, req) in generic {
        if let Some(k) = KeySpec::parse(spec) {
            reg.bind(GENERIC_KEYMAP, k, *req);
        } else {
            warn!(target: "keymap", spec, "failed to parse built-in keyspec");
        }
    }

    let main: &[(&str, Request)] = &[
        ("C", ViewDiff),
        ("<Ctrl-s>", ViewStatus),
        ("S", ViewStatus),
        ("D", ViewDiff),
    ];
    for (spec, req) in main {
        reg.bind("main", KeySpec::parse(spec).unwrap(), *req);
    }

    let status: &[(&str, Request)] = &[
        ("u", StageUpdate),
        ("1", StageUpdateLine),
        ("!", StatusRevert),
        ("<Tab>", StageNextHunk),
        ("M", StatusMergeRecord),
        ("c", ViewStage),
    ];
    for (spec, req) in status {
        reg.bind("status", KeySpec::parse(spec).unwrap(), *req);
    }

    let diff: &[(&str, Request)] = &[
        ("u", StageUpdate),
        ("1", StageUpdateLine),
        ("!", StatusRevert),
        ("V", TraceOrigin),
        ("<Tab>", StageNextHunk),
    ];
    for (spec, req) in diff {
        reg.bind("stage", KeySpec::parse(spec).unwrap(), *req);
        reg.bind("diff", KeySpec::parse(spec).unwrap(), *req);
    }

    let blame: &[(&str, Request)] = &[("p", Parent)];
    for (spec, req) in blame {
        reg.bind("blame", KeySpec::parse(spec).unwrap(), *req);
    }

    let tree: &[(&str, Request)] = &[("<Ctrl-o>", Back)];
    for (spec, req) in tree {
        reg.bind("tree", KeySpec::parse(spec).unwrap(), *req);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literal_and_named_keyspecs() {
        assert_eq!(KeySpec::parse("g"), Some(KeySpec::plain('g')));
        assert_eq!(
            KeySpec::parse("<Enter>"),
            Some(KeySpec::named(NamedKey::Enter))
        );
        assert_eq!(KeySpec::parse("<Tab>"), Some(KeySpec::named(NamedKey::Tab)));
        assert_eq!(KeySpec::parse("<F5>"), Some(KeySpec::named(NamedKey::F(5))));
        assert_eq!(KeySpec::parse("<F13>"), None);
    }

    #[test]
    fn ctrl_keyspec_sets_mod_mask() {
        let spec = KeySpec::parse("<Ctrl-x>").unwrap();
        assert_eq!(spec.token, KeyToken::Char('x'));
        assert_eq!(spec.mods, ModMask::CTRL);
    }

    #[test]
    fn esc_keyspec_composes_alt_over_base() {
        let spec = KeySpec::parse("<Esc-x>").unwrap();
        assert_eq!(spec.token, KeyToken::Char('x'));
        assert!(spec.mods.contains(ModMask::ALT));
    }

    #[test]
    fn generic_fallback_used_when_view_map_misses() {
        let mut reg = KeymapRegistry::new();
        reg.bind(GENERIC_KEYMAP, KeySpec::plain('q'), Request::Back);
        assert_eq!(reg.lookup("main", &KeySpec::plain('q')), Some(Request::Back));
    }

    #[test]
    fn view_specific_binding_shadows_generic() {
        let mut reg = KeymapRegistry::new();
        reg.bind(GENERIC_KEYMAP, KeySpec::plain('q'), Request::Back);
        reg.bind("main", KeySpec::plain('q'), Request::Quit);
        assert_eq!(reg.lookup("main", &KeySpec::plain('q')), Some(Request::Quit));
    }

    #[test]
    fn run_request_flag_parsing() {
        let (flags, rest) = RunRequestFlags::parse("!git gc");
        assert!(flags.foreground);
        assert_eq!(rest, "git gc");

        let (flags, rest) = RunRequestFlags::parse("@git fetch");
        assert!(flags.background);
        assert_eq!(rest, "git fetch");

        let (flags, rest) = RunRequestFlags::parse("?git push");
        assert!(flags.confirm);
        assert_eq!(rest, "git push");

        let (flags, rest) = RunRequestFlags::parse("git status");
        assert!(flags.foreground, "bare command defaults to foreground");
        assert_eq!(rest, "git status");
    }

    #[test]
    fn force_run_request_resists_overwrite() {
        let mut reg = KeymapRegistry::new();
        let key = KeySpec::plain('g');
        reg.bind_run_request(RunRequest {
            keymap: "main".into(),
            key: key.clone(),
            argv_template: vec!["git".into(), "gc".into()],
            flags: RunRequestFlags {
                force: true,
                foreground: true,
                ..Default::default()
            },
        });
        reg.bind_run_request(RunRequest {
            keymap: "main".into(),
            key: key.clone(),
            argv_template: vec!["git".into(), "fetch".into()],
            flags: RunRequestFlags {
                foreground: true,
                ..Default::default()
            },
        });
        let rr = reg.run_request("main", &key).unwrap();
        assert_eq!(rr.argv_template, vec!["git", "gc"]);
    }

    #[test]
    fn bind_run_request_overwrites_by_default() {
        let mut reg = KeymapRegistry::new();
        let key = KeySpec::plain('g');
        reg.bind_run_request(RunRequest {
            keymap: "main".into(),
            key: key.clone(),
            argv_template: vec!["git".into(), "gc".into()],
            flags: RunRequestFlags {
                foreground: true,
                ..Default::default()
            },
        });
        reg.bind_run_request(RunRequest {
            keymap: "main".into(),
            key: key.clone(),
            argv_template: vec!["git".into(), "fetch".into()],
            flags: RunRequestFlags {
                foreground: true,
                ..Default::default()
            },
        });
        let rr = reg.run_request("main", &key).unwrap();
        assert_eq!(rr.argv_template, vec!["git", "fetch"]);
    }
}
