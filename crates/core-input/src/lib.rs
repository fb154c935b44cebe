//! Terminal input: translates crossterm key/resize events into the
//! [`core_events::KeyToken`]/[`core_events::ModMask`] pairs `core-keymap`
//! binds against.
//!
//! §5's single-threaded cooperative loop polls this module once per tick
//! with a timeout chosen by the caller (zero while any view is loading, a
//! short blocking wait otherwise) rather than backgrounding input on its
//! own thread, so there is no shutdown handshake or channel to manage here.

mod key_token;
mod poll;

pub use poll::{TermEvent, poll_event};
