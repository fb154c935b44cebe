//! Prompt input, selection menu, and the top-level `:` command (§4.L).
//!
//! Unlike the main event loop's single-key-then-redraw-everything cadence,
//! a prompt is modal: once opened it owns the bottom row and reads key by
//! key until the user commits or cancels, the same nested-loop shape tig's
//! own prompt takes. Keeping that loop local to this module (rather than
//! threading prompt state through `app`'s per-tick dispatch) is what keeps
//! the call site a single blocking function call.

use anyhow::Result;
use core_events::{KeyToken, ModMask, NamedKey};
use core_input::{TermEvent, poll_event};
use core_keymap::KeySpec;
use crossterm::{cursor::MoveTo, execute, queue, style::Print, terminal::{Clear, ClearType}};
use std::io::{Write, stdout};
use std::time::Duration;

/// What a prompt's per-key handler wants done with the key that was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Apply the default editing behavior (append/backspace/enter/escape).
    Ok,
    /// Ignore this key entirely; keep prompting.
    Skip,
    /// Stop editing and accept the buffer as-is, as if Enter were pressed.
    Stop,
    /// Abort the prompt with no result, as if Esc were pressed.
    Cancel,
}

fn default_handler(_key: KeyToken, _mods: ModMask, _buffer: &str) -> KeyAction {
    KeyAction::Ok
}

/// Read a line at the bottom row, prefixed by `prompt`. `handler` previews
/// each keystroke before the default editing behavior runs; pass
/// [`default_handler`] (via `prompt_input`'s default) for plain text entry.
pub fn prompt_input(prompt: &str, row: u16, width: u16) -> Result<Option<String>> {
    prompt_input_with(prompt, row, width, default_handler)
}

pub fn prompt_input_with<F>(prompt: &str, row: u16, width: u16, mut handler: F) -> Result<Option<String>>
where
    F: FnMut(KeyToken, ModMask, &str) -> KeyAction,
{
    let mut buffer = String::new();
    loop {
        draw_line(row, width, &format!("{prompt}{buffer}"))?;
        let Some(TermEvent::Key { token, mods }) = poll_event(Duration::from_millis(200))? else { continue };
        match handler(token, mods, &buffer) {
            KeyAction::Cancel => return Ok(None),
            KeyAction::Stop => return Ok(Some(buffer)),
            KeyAction::Skip => continue,
            KeyAction::Ok => match token {
                KeyToken::Named(NamedKey::Enter) => return Ok(Some(buffer)),
                KeyToken::Named(NamedKey::Esc) => return Ok(None),
                KeyToken::Named(NamedKey::Backspace) => {
                    buffer.pop();
                }
                KeyToken::Char(c) if !mods.contains(ModMask::CTRL) && !mods.contains(ModMask::ALT) => {
                    buffer.push(c);
                }
                _ => {}
            },
        }
    }
}

/// One selectable row of a [`prompt_menu`]: an optional hotkey and its label.
pub struct MenuItem {
    pub hotkey: Option<char>,
    pub text: String,
}

/// `<prompt> (i of n) [hotkey] text`, arrow keys move the selection, a
/// hotkey selects immediately, Enter commits, Esc cancels.
pub fn prompt_menu(prompt: &str, items: &[MenuItem], mut selected: usize, row: u16, width: u16) -> Result<Option<usize>> {
    if items.is_empty() {
        return Ok(None);
    }
    selected = selected.min(items.len() - 1);
    loop {
        let item = &items[selected];
        let hotkey = item.hotkey.map(|c| format!("[{c}] ")).unwrap_or_default();
        let line = format!("{prompt} ({} of {}) {hotkey}{}", selected + 1, items.len(), item.text);
        draw_line(row, width, &line)?;
        let Some(TermEvent::Key { token, .. }) = poll_event(Duration::from_millis(200))? else { continue };
        match token {
            KeyToken::Named(NamedKey::Up) => selected = selected.saturating_sub(1),
            KeyToken::Named(NamedKey::Down) => selected = (selected + 1).min(items.len() - 1),
            KeyToken::Named(NamedKey::Enter) => return Ok(Some(selected)),
            KeyToken::Named(NamedKey::Esc) => return Ok(None),
            KeyToken::Char(c) => {
                if let Some(idx) = items.iter().position(|i| i.hotkey == Some(c)) {
                    return Ok(Some(idx));
                }
            }
            _ => {}
        }
    }
}

/// `prompt_input` restricted to a y/Y/n/N answer.
pub fn prompt_yesno(prompt: &str, row: u16, width: u16) -> Result<bool> {
    let answer = prompt_input_with(&format!("{prompt} "), row, width, |key, _mods, _buf| match key {
        KeyToken::Char('y') | KeyToken::Char('Y') => KeyAction::Stop,
        KeyToken::Char('n') | KeyToken::Char('N') => KeyAction::Cancel,
        KeyToken::Named(NamedKey::Enter) | KeyToken::Named(NamedKey::Esc) => KeyAction::Cancel,
        _ => KeyAction::Skip,
    })?;
    Ok(answer.is_some())
}

fn draw_line(row: u16, width: u16, text: &str) -> Result<()> {
    let mut out = stdout();
    queue!(out, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
    let truncated: String = text.chars().take(width as usize).collect();
    queue!(out, Print(truncated))?;
    out.flush()?;
    Ok(())
}

/// What the top-level `:` command resolves to; `app` executes it since only
/// it owns the registry, options, and current view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColonCommand {
    JumpLine(usize),
    JumpCommit(String),
    Key(KeySpec),
    Shell(String),
    Statement(String),
}

/// Parse one `:` command line per §4.L: a bare integer jumps to that line,
/// a commit-id-shaped token searches for it, a single character is looked
/// up in the current view's keymap, a leading `!` opens a subprocess in the
/// pager, and anything else is a `set`/`color`/`bind`/`source` statement.
pub fn parse_colon_command(line: &str) -> ColonCommand {
    let trimmed = line.trim();
    if let Ok(n) = trimmed.parse::<usize>() {
        return ColonCommand::JumpLine(n);
    }
    if is_commit_id_prefix(trimmed) {
        return ColonCommand::JumpCommit(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix('!') {
        return ColonCommand::Shell(rest.to_string());
    }
    if trimmed.chars().count() == 1 {
        if let Some(spec) = KeySpec::parse(trimmed) {
            return ColonCommand::Key(spec);
        }
    }
    ColonCommand::Statement(trimmed.to_string())
}

fn is_commit_id_prefix(s: &str) -> bool {
    (4..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// Briefly leave the alternate screen's input mode, run `execute!` on raw
/// stdout once — used by callers that draw the status line outside a
/// [`core_screen::writer::Writer`] frame, e.g. while a prompt is modal.
pub fn clear_prompt_row(row: u16) -> Result<()> {
    execute!(stdout(), MoveTo(0, row), Clear(ClearType::CurrentLine))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_line_parses_as_jump_line() {
        assert_eq!(parse_colon_command("42"), ColonCommand::JumpLine(42));
    }

    #[test]
    fn hex_token_parses_as_jump_commit() {
        assert_eq!(parse_colon_command("deadbeef"), ColonCommand::JumpCommit("deadbeef".to_string()));
    }

    #[test]
    fn bang_prefix_parses_as_shell() {
        assert_eq!(parse_colon_command("!git gc"), ColonCommand::Shell("git gc".to_string()));
    }

    #[test]
    fn single_char_parses_as_key() {
        assert_eq!(parse_colon_command("g"), ColonCommand::Key(KeySpec::plain('g')));
    }

    #[test]
    fn set_statement_falls_through_to_statement() {
        assert_eq!(parse_colon_command("set tab-size = 4"), ColonCommand::Statement("set tab-size = 4".to_string()));
    }
}
