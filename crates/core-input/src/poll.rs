//! Synchronous terminal input poll, the single-threaded event loop's only
//! source of keypresses (§5 "poll the terminal with `nodelay` enabled iff
//! any pipe is still loading").
//!
//! Unlike `core-process`'s reader threads there is nothing to background
//! here: crossterm's `poll`/`read` pair already returns promptly, so one
//! call per event-loop tick is all the main loop needs.

use crate::key_token::map_key_event;
use core_events::{KeyToken, ModMask};
use crossterm::event::{self, Event as CEvent, KeyEventKind as CKind};
use std::time::Duration;

/// One terminal input the event loop can act on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    Key { token: KeyToken, mods: ModMask },
    Resize(u16, u16),
    CtrlC,
}

/// Block up to `timeout` waiting for one input event, returning `None` if
/// nothing arrived (the caller's cue to drain subprocess pipes again).
/// `timeout` of zero still performs one non-blocking poll.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<TermEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    loop {
        match event::read()? {
            CEvent::Key(key) => {
                if !matches!(key.kind, CKind::Press | CKind::Repeat) {
                    // crossterm only reports release events when the
                    // terminal opted into the kitty keyboard protocol,
                    // which this backend never enables; skip defensively.
                    if !event::poll(Duration::from_millis(0))? {
                        return Ok(None);
                    }
                    continue;
                }
                if matches!(key.code, crossterm::event::KeyCode::Char('c'))
                    && key.modifiers.contains(crossterm::event::KeyModifiers::CONTROL)
                {
                    return Ok(Some(TermEvent::CtrlC));
                }
                if let Some(parts) = map_key_event(&key) {
                    return Ok(Some(TermEvent::Key { token: parts.token, mods: parts.mods }));
                }
                if !event::poll(Duration::from_millis(0))? {
                    return Ok(None);
                }
            }
            CEvent::Resize(w, h) => return Ok(Some(TermEvent::Resize(w, h))),
            _ => {
                if !event::poll(Duration::from_millis(0))? {
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_event_is_copy_and_comparable() {
        let a = TermEvent::Resize(80, 24);
        let b = a;
        assert_eq!(a, b);
    }
}
