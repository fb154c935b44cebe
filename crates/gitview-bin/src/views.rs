//! View-registry wiring: one `core-git` handler per `ViewKind`, registered
//! once at startup, plus the help view's keybinding dump.

use core_events::{KeyToken, ModMask, NamedKey};
use core_git::{BlameOps, BlobOps, BranchOps, DiffOps, LogOps, MainOps, PagerOps, StageOps, StashOps, StatusOps, TreeOps};
use core_keymap::KeymapRegistry;
use core_view::{ViewKind, ViewRegistry};
use std::path::PathBuf;

pub fn build_registry(screen_width: u16, screen_height: u16, initial: ViewKind, git_dir: PathBuf, keymaps: &KeymapRegistry) -> ViewRegistry {
    let mut registry = ViewRegistry::new(screen_width, screen_height, initial);
    registry.register_handler(Box::new(MainOps::new()));
    registry.register_handler(Box::new(DiffOps::new()));
    registry.register_handler(Box::new(LogOps::new()));
    registry.register_handler(Box::new(StatusOps::new(git_dir)));
    registry.register_handler(Box::new(StageOps::new()));
    registry.register_handler(Box::new(TreeOps::new()));
    registry.register_handler(Box::new(BlobOps::new()));
    registry.register_handler(Box::new(BlameOps::new()));
    registry.register_handler(Box::new(BranchOps::new()));
    registry.register_handler(Box::new(StashOps::new()));
    registry.register_handler(Box::new(PagerOps::pager()));
    registry.register_handler(Box::new(PagerOps::help(help_text(keymaps))));
    registry
}

fn key_spec_label(token: KeyToken, mods: ModMask) -> String {
    let base = match token {
        KeyToken::Char(' ') => "Space".to_string(),
        KeyToken::Char(c) => c.to_string(),
        KeyToken::Named(NamedKey::Enter) => "Enter".to_string(),
        KeyToken::Named(NamedKey::Esc) => "Esc".to_string(),
        KeyToken::Named(NamedKey::Backspace) => "Backspace".to_string(),
        KeyToken::Named(NamedKey::Tab) => "Tab".to_string(),
        KeyToken::Named(NamedKey::Up) => "Up".to_string(),
        KeyToken::Named(NamedKey::Down) => "Down".to_string(),
        KeyToken::Named(NamedKey::Left) => "Left".to_string(),
        KeyToken::Named(NamedKey::Right) => "Right".to_string(),
        KeyToken::Named(NamedKey::Home) => "Home".to_string(),
        KeyToken::Named(NamedKey::End) => "End".to_string(),
        KeyToken::Named(NamedKey::PageUp) => "PageUp".to_string(),
        KeyToken::Named(NamedKey::PageDown) => "PageDown".to_string(),
        KeyToken::Named(NamedKey::Insert) => "Insert".to_string(),
        KeyToken::Named(NamedKey::Delete) => "Delete".to_string(),
        KeyToken::Named(NamedKey::F(n)) => format!("F{n}"),
    };
    if mods.contains(ModMask::CTRL) {
        format!("<Ctrl-{base}>")
    } else if mods.contains(ModMask::ALT) {
        format!("<Esc-{base}>")
    } else if base.chars().count() == 1 {
        base
    } else {
        format!("<{base}>")
    }
}

/// Render every installed keymap's bindings as the pre-formatted line list
/// `PagerOps::help` displays, grouped by keymap name.
fn help_text(keymaps: &KeymapRegistry) -> Vec<String> {
    let mut out = vec!["Default key bindings".to_string(), String::new()];
    let mut names: Vec<&str> = keymaps.keymap_names().into_iter().collect();
    names.sort_unstable();
    for name in names {
        let Some(map) = keymaps.keymap(name) else { continue };
        out.push(format!("[{name}]"));
        let mut rows: Vec<(String, String)> =
            map.bindings().map(|(key, req)| (key_spec_label(key.token, key.mods), format!("{req:?}"))).collect();
        rows.sort_unstable();
        for (key, req) in rows {
            out.push(format!("    {key:<12} {req}"));
        }
        out.push(String::new());
    }
    out
}
