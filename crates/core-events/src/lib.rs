//! Key-token vocabulary shared between the keymap registry and the
//! terminal input layer (component B's wire format).
//!
//! A read-only browser never composes text, so the token set stops at
//! "which key, which modifiers" -- there is no paste, IME composition, or
//! mouse-drag payload to model here; `core-input` reads a crossterm event
//! straight into one of these per keypress.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ModMask: u8 {
        const CTRL  = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const SHIFT = 0b0000_0100;
        const META  = 0b0000_1000;
        const SUPER = 0b0001_0000;
    }
}

/// Keys with no direct `char` representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Enter,
    Esc,
    Backspace,
    Tab,
    F(u8),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
}

/// One keypress, already separated from its modifier bits. `Char` covers
/// every printable key (including `Ctrl`-chord letters, since `Ctrl-d` and
/// `d` share a base token and differ only in `mods`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Named(NamedKey),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_mask_combines_bits() {
        let combo = ModMask::CTRL | ModMask::SHIFT;
        assert!(combo.contains(ModMask::CTRL));
        assert!(combo.contains(ModMask::SHIFT));
        assert!(!combo.contains(ModMask::ALT));
    }

    #[test]
    fn key_tokens_are_hashable_and_comparable() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(KeyToken::Char('a'));
        set.insert(KeyToken::Named(NamedKey::Enter));
        assert!(set.contains(&KeyToken::Char('a')));
        assert!(!set.contains(&KeyToken::Char('b')));
    }
}
